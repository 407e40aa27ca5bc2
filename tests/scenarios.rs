use chrono::{Timelike, TimeDelta, Utc};

use battery_period_optimizer::action_mapper::LogicalState;
use battery_period_optimizer::common::models::{BatteryParameters, LoadHistorySample};
use battery_period_optimizer::initialization::Mgr;
use battery_period_optimizer::providers::fixture::{
    FixtureHistoryProvider, FixturePvProvider, FixtureTariffProvider, FixtureWeatherProvider,
};
use battery_period_optimizer::pv_aligner::PvEstimate;
use battery_period_optimizer::tariff_aligner::TariffInterval;
use battery_period_optimizer::worker;

const ENTITY: &str = "sensor.house_energy_total";

fn day_start() -> chrono::DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

fn flat_interval(per_kwh: f64, day_start: chrono::DateTime<Utc>) -> TariffInterval {
    TariffInterval {
        period_start: day_start,
        period_end: day_start + TimeDelta::days(1),
        per_kwh,
    }
}

/// Flat history with a constant average load, in kWh per 5-minute slot.
fn flat_load_history(day_start: chrono::DateTime<Utc>, kwh_per_slot: f64) -> Vec<LoadHistorySample> {
    let start = day_start - TimeDelta::days(5);
    (0..(5 * 288))
        .map(|i| LoadHistorySample {
            entity_id: ENTITY.to_string(),
            state: (i as f64 * kwh_per_slot).to_string(),
            last_changed: start + TimeDelta::minutes(5 * i as i64),
        })
        .collect()
}

/// History with a single hour-of-day drawing `peak_kw` and every other hour
/// drawing `base_kw`, repeated identically across all 5 days so the Load
/// Predictor's per-slot bucket actually learns a peak at that hour instead
/// of averaging it away.
fn hourly_peak_load_history(
    day_start: chrono::DateTime<Utc>,
    peak_hour: u32,
    peak_kw: f64,
    base_kw: f64,
) -> Vec<LoadHistorySample> {
    let start = day_start - TimeDelta::days(5);
    let mut cumulative_kwh = 0.0;
    (0..(5 * 288))
        .map(|i| {
            let t = start + TimeDelta::minutes(5 * i as i64);
            let kw = if t.hour() == peak_hour { peak_kw } else { base_kw };
            cumulative_kwh += kw / 12.0;
            LoadHistorySample {
                entity_id: ENTITY.to_string(),
                state: cumulative_kwh.to_string(),
                last_changed: t,
            }
        })
        .collect()
}

fn mgr(
    battery: BatteryParameters,
    import: Vec<TariffInterval>,
    export: Vec<TariffInterval>,
    pv: Vec<PvEstimate>,
    history: Vec<LoadHistorySample>,
    day_start: chrono::DateTime<Utc>,
) -> Mgr {
    Mgr::new(
        battery,
        Box::new(FixtureTariffProvider { import, export }),
        Box::new(FixturePvProvider { estimates: pv }),
        Box::new(FixtureWeatherProvider {
            temperatures: vec![(day_start, 15.0)],
        }),
        Box::new(FixtureHistoryProvider { samples: history }),
    )
}

#[tokio::test]
async fn flat_cheap_day_holds_soc_flat_and_idles() {
    let day_start = day_start();
    let battery = BatteryParameters::default();
    // 1 kW load == 1/12 kWh per 5-minute slot.
    let history = flat_load_history(day_start, 1.0 / 12.0);

    let mgr = mgr(
        battery,
        vec![flat_interval(10.0, day_start)],
        vec![flat_interval(5.0, day_start)],
        vec![],
        history,
        day_start,
    );

    let tick = worker::run(&mgr, day_start, 50.0, ENTITY).await.unwrap();
    assert_eq!(tick.action.state, LogicalState::Idle);
}

#[tokio::test]
async fn cheap_then_expensive_charges_first() {
    let day_start = day_start();
    let battery = BatteryParameters::default();
    let history = flat_load_history(day_start, 1.0 / 12.0);

    let mut import = Vec::new();
    for hour in 0..24 {
        let rate = if hour < 6 { 5.0 } else { 40.0 };
        import.push(TariffInterval {
            period_start: day_start + TimeDelta::hours(hour),
            period_end: day_start + TimeDelta::hours(hour + 1),
            per_kwh: rate,
        });
    }
    let export = vec![flat_interval(10.0, day_start)];

    let mgr = mgr(battery, import, export, vec![], history, day_start);

    let tick = worker::run(&mgr, day_start, 20.0, ENTITY).await.unwrap();
    assert_eq!(tick.action.state, LogicalState::ChargeGrid);
}

#[tokio::test]
async fn negative_export_trap_never_charges_from_grid_during_cheap_morning() {
    let day_start = day_start();
    let battery = BatteryParameters::default();
    let history = flat_load_history(day_start, 0.5 / 12.0);

    let mut import = Vec::new();
    let mut export = Vec::new();
    for hour in 0..24 {
        let (import_rate, export_rate) = if hour < 6 {
            (20.0, 2.0)
        } else if hour < 9 {
            (20.0, -50.0)
        } else {
            (20.0, 2.0)
        };
        import.push(TariffInterval {
            period_start: day_start + TimeDelta::hours(hour),
            period_end: day_start + TimeDelta::hours(hour + 1),
            per_kwh: import_rate,
        });
        export.push(TariffInterval {
            period_start: day_start + TimeDelta::hours(hour),
            period_end: day_start + TimeDelta::hours(hour + 1),
            per_kwh: export_rate,
        });
    }

    // Solar excess during the negative-export window (hours 6-9): 4kW PV, 0.5kW load.
    let mut pv = Vec::new();
    for half_hour in 0..48 {
        let hour = half_hour / 2;
        let energy_kwh = if (6..9).contains(&hour) { 2.0 } else { 0.0 };
        pv.push(PvEstimate {
            period_end: day_start + TimeDelta::minutes(30 * (half_hour + 1)),
            energy_kwh,
        });
    }

    let mgr = mgr(battery, import, export, pv, history, day_start);

    let tick = worker::run(&mgr, day_start, 60.0, ENTITY).await.unwrap();
    assert_ne!(tick.action.state, LogicalState::ChargeGrid);
}

#[tokio::test]
async fn solar_excess_with_positive_export_charges_from_solar() {
    let day_start = day_start();
    let battery = BatteryParameters::default();
    let history = flat_load_history(day_start, 1.0 / 12.0);

    let import = vec![flat_interval(30.0, day_start)];
    let export = vec![flat_interval(15.0, day_start)];

    // Solar excess in the first six hours, so block 0 is the surplus block.
    let mut pv = Vec::new();
    for half_hour in 0..48 {
        let hour = half_hour / 2;
        let energy_kwh = if hour < 6 { 2.5 } else { 0.0 };
        pv.push(PvEstimate {
            period_end: day_start + TimeDelta::minutes(30 * (half_hour + 1)),
            energy_kwh,
        });
    }

    let mgr = mgr(battery, import, export, pv, history, day_start);

    let tick = worker::run(&mgr, day_start, 80.0, ENTITY).await.unwrap();
    assert_eq!(tick.action.state, LogicalState::ChargeSolar);
}

#[tokio::test]
async fn full_battery_negative_export_spike_opens_headroom_by_discharging() {
    let day_start = day_start();
    let battery = BatteryParameters::default();
    let history = flat_load_history(day_start, 1.0 / 12.0);

    let import = vec![flat_interval(20.0, day_start)];
    let mut export = Vec::new();
    for hour in 0..24 {
        let rate = if hour == 10 { -10.0 } else { 5.0 };
        export.push(TariffInterval {
            period_start: day_start + TimeDelta::hours(hour),
            period_end: day_start + TimeDelta::hours(hour + 1),
            per_kwh: rate,
        });
    }

    let mut pv = Vec::new();
    for half_hour in 0..48 {
        let hour = half_hour / 2;
        let energy_kwh = if (8..14).contains(&hour) { 2.0 } else { 0.0 };
        pv.push(PvEstimate {
            period_end: day_start + TimeDelta::minutes(30 * (half_hour + 1)),
            energy_kwh,
        });
    }

    let mgr = mgr(battery, import, export, pv, history, day_start);

    let tick = worker::run(&mgr, day_start, 100.0, ENTITY).await.unwrap();
    // At 100% SoC with nowhere left to absorb solar, the solver must open
    // headroom by discharging rather than trying to charge further.
    assert_ne!(tick.action.state, LogicalState::ChargeGrid);
    assert_ne!(tick.action.state, LogicalState::ChargeSolar);
}

#[tokio::test]
async fn peak_reservation_holds_or_tops_up_before_the_expensive_hour() {
    let day_start = day_start();
    // The tick's own 24h window starts at 13:00 today: 5 cheap hours
    // (13:00-18:00) followed by the 18:00-19:00 peak, matching spec.md §8
    // scenario 6 ("preceded by 5 hours at 12c/kWh").
    let tick_start = day_start + TimeDelta::hours(13);
    let battery = BatteryParameters::default();

    let mut import = Vec::new();
    let mut export = Vec::new();
    for offset in 0..24 {
        let rate = if offset == 5 { 60.0 } else { 12.0 };
        import.push(TariffInterval {
            period_start: tick_start + TimeDelta::hours(offset),
            period_end: tick_start + TimeDelta::hours(offset + 1),
            per_kwh: rate,
        });
        export.push(TariffInterval {
            period_start: tick_start + TimeDelta::hours(offset),
            period_end: tick_start + TimeDelta::hours(offset + 1),
            per_kwh: 2.0,
        });
    }

    // Load is 1kW outside the peak hour, 3kW during it (18:00-19:00),
    // consistently across all 5 history days so the predictor's hour-18
    // bucket actually learns the spike instead of averaging it into a flat
    // forecast.
    let history = hourly_peak_load_history(day_start, 18, 3.0, 1.0);

    let mgr = mgr(battery, import, export, vec![], history, day_start);

    // Starting SoC is deliberately low: at 27kWh capacity, anything above
    // roughly 11% already holds the 3kWh the peak hour needs, and the
    // optimizer would correctly idle rather than cycle the battery for no
    // gain. Starting near empty makes topping up before the peak actually
    // the cheaper policy (12c/kWh charge now vs. 60c/kWh import during the
    // peak), so the reservation behavior this test targets is the one the
    // solver is actually forced to exercise.
    let tick = worker::run(&mgr, tick_start, 5.0, ENTITY).await.unwrap();
    assert!(matches!(
        tick.action.state,
        LogicalState::Preserve | LogicalState::ChargeGrid
    ));
}
