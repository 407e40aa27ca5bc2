use log::info;

use crate::common::models::BatteryParameters;
use crate::config::{load_config, Config};
use crate::dispatcher::Dispatcher;
use crate::errors::SchedulingError;
use crate::logging::setup_logger;
use crate::providers::{HistoryProvider, PvProvider, TariffProvider, WeatherProvider};

/// Holds the configured collaborators a tick needs: the four provider
/// adapters (out of scope themselves; this crate only consumes their
/// trait objects), the battery calibration, and the dispatcher that
/// offloads each solve.
pub struct Mgr {
    pub tariff: Box<dyn TariffProvider + Send + Sync>,
    pub pv: Box<dyn PvProvider + Send + Sync>,
    pub weather: Box<dyn WeatherProvider + Send + Sync>,
    pub history: Box<dyn HistoryProvider + Send + Sync>,
    pub battery: BatteryParameters,
    pub dispatcher: Dispatcher,
}

impl Mgr {
    pub fn new(
        battery: BatteryParameters,
        tariff: Box<dyn TariffProvider + Send + Sync>,
        pv: Box<dyn PvProvider + Send + Sync>,
        weather: Box<dyn WeatherProvider + Send + Sync>,
        history: Box<dyn HistoryProvider + Send + Sync>,
    ) -> Self {
        Mgr {
            tariff,
            pv,
            weather,
            history,
            battery,
            dispatcher: Dispatcher::new(),
        }
    }
}

/// Loads configuration and sets up logging. Provider wiring is left to
/// the caller since the adapters themselves are out of scope here.
///
/// # Arguments
///
/// * `config_path` - path to the configuration file
pub fn init(config_path: &str) -> Result<Config, SchedulingError> {
    let config = load_config(config_path)?;

    setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;

    info!("starting battery period optimizer version: {}", env!("CARGO_PKG_VERSION"));

    Ok(config)
}
