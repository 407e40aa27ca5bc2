use std::fs;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::common::models::BatteryParameters;

/// Errors raised while loading or validating configuration. Fatal: the
/// core refuses to run until reconfigured.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// Non-positive capacity, negative power limits, or `soc_grid_pct`
    /// outside `{1, 5, 10, 25}` (spec.md §7).
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Config {
    pub battery: BatteryParameters,
    pub general: General,
}

const ALLOWED_SOC_GRID_PCT: [f64; 4] = [1.0, 5.0, 10.0, 25.0];

/// Loads the configuration file, parses it, and validates the battery
/// parameters per spec.md §7 before handing it back to the caller.
///
/// # Arguments
///
/// * `config_path` - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml_str = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_string(),
        source,
    })?;

    let config: Config = toml::from_str(&toml_str).map_err(|source| ConfigError::Parse {
        path: config_path.to_string(),
        source,
    })?;

    validate(&config.battery)?;

    Ok(config)
}

fn validate(battery: &BatteryParameters) -> Result<(), ConfigError> {
    if battery.capacity_kwh <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "capacity_kwh must be positive, got {}",
            battery.capacity_kwh
        )));
    }
    if battery.max_charge_kw < 0.0 || battery.max_discharge_kw < 0.0 {
        return Err(ConfigError::Invalid(
            "max_charge_kw and max_discharge_kw must not be negative".to_string(),
        ));
    }
    if battery.inverter_limit_kw < 0.0 {
        return Err(ConfigError::Invalid("inverter_limit_kw must not be negative".to_string()));
    }
    if !ALLOWED_SOC_GRID_PCT.contains(&battery.soc_grid_pct) {
        return Err(ConfigError::Invalid(format!(
            "soc_grid_pct must be one of {ALLOWED_SOC_GRID_PCT:?}, got {}",
            battery.soc_grid_pct
        )));
    }
    if battery.soc_min_pct >= battery.soc_max_pct {
        return Err(ConfigError::Invalid(format!(
            "soc_min_pct ({}) must be less than soc_max_pct ({})",
            battery.soc_min_pct, battery.soc_max_pct
        )));
    }

    Ok(())
}
