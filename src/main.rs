use std::env;

use chrono::TimeDelta;
use log::error;
use rayon::ThreadPoolBuilder;

use battery_period_optimizer::common::models::LoadHistorySample;
use battery_period_optimizer::errors::SchedulingError;
use battery_period_optimizer::initialization::{init, Mgr};
use battery_period_optimizer::providers::fixture::{
    FixtureHistoryProvider, FixturePvProvider, FixtureTariffProvider, FixtureWeatherProvider,
};
use battery_period_optimizer::tariff_aligner::TariffInterval;
use battery_period_optimizer::worker;

const LOAD_ENTITY_ID: &str = "sensor.house_energy_total";

/// Thin binary entry point. The supervisory loop that re-triggers this
/// every five minutes, and the real tariff/PV/weather/history adapters,
/// are out of scope for this crate -- this wires fixture providers for a
/// single illustrative tick.
#[tokio::main]
async fn main() -> Result<(), SchedulingError> {
    ThreadPoolBuilder::new()
        .num_threads(2)
        .build_global()
        .map_err(|e| SchedulingError(e.to_string()))?;

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .iter()
        .find(|p| p.starts_with("--config="))
        .map(|p| p.split_once('=').expect("config argument should be well-formed").1)
        .unwrap_or("config.toml");

    let config = init(config_path)?;

    let day_start = chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc();

    let mgr = Mgr::new(
        config.battery,
        Box::new(FixtureTariffProvider {
            import: vec![TariffInterval {
                period_start: day_start,
                period_end: day_start + TimeDelta::days(1),
                per_kwh: 10.0,
            }],
            export: vec![TariffInterval {
                period_start: day_start,
                period_end: day_start + TimeDelta::days(1),
                per_kwh: 5.0,
            }],
        }),
        Box::new(FixturePvProvider { estimates: vec![] }),
        Box::new(FixtureWeatherProvider {
            temperatures: vec![(day_start, 10.0)],
        }),
        Box::new(FixtureHistoryProvider {
            samples: synthetic_flat_history(day_start),
        }),
    );

    match worker::run(&mgr, day_start, 50.0, LOAD_ENTITY_ID).await {
        Ok(tick) => {
            println!("{:?} limit={:.2}kW", tick.action.state, tick.action.limit_kw);
            Ok(())
        }
        Err(e) => {
            error!("tick failed: {}", e);
            Err(e)
        }
    }
}

/// A steady 1kWh/5min cumulative meter series over five days, used only so
/// the illustrative tick above has something to forecast from.
fn synthetic_flat_history(day_start: chrono::DateTime<chrono::Utc>) -> Vec<LoadHistorySample> {
    let start = day_start - TimeDelta::days(5);
    (0..(5 * 288))
        .map(|i| LoadHistorySample {
            entity_id: LOAD_ENTITY_ID.to_string(),
            state: (i as f64 * 0.1).to_string(),
            last_changed: start + TimeDelta::minutes(5 * i as i64),
        })
        .collect()
}
