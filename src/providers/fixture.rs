//! In-memory provider implementations backed by fixed data, used by this
//! crate's own tests and available to anything embedding the crate before
//! a real adapter is wired up.

use chrono::{DateTime, Utc};

use crate::common::models::LoadHistorySample;
use crate::providers::errors::ProviderError;
use crate::providers::{HistoryProvider, PvProvider, TariffProvider, WeatherProvider};
use crate::pv_aligner::PvEstimate;
use crate::tariff_aligner::TariffInterval;

pub struct FixtureTariffProvider {
    pub import: Vec<TariffInterval>,
    pub export: Vec<TariffInterval>,
}

impl TariffProvider for FixtureTariffProvider {
    fn import_intervals(&self, _day_start: DateTime<Utc>) -> Result<Vec<TariffInterval>, ProviderError> {
        if self.import.is_empty() {
            return Err(ProviderError::NoData("fixture-tariff-import"));
        }
        Ok(self.import.clone())
    }

    fn export_intervals(&self, _day_start: DateTime<Utc>) -> Result<Vec<TariffInterval>, ProviderError> {
        if self.export.is_empty() {
            return Err(ProviderError::NoData("fixture-tariff-export"));
        }
        Ok(self.export.clone())
    }
}

pub struct FixturePvProvider {
    pub estimates: Vec<PvEstimate>,
}

impl PvProvider for FixturePvProvider {
    fn estimates(&self, _day_start: DateTime<Utc>) -> Result<Vec<PvEstimate>, ProviderError> {
        Ok(self.estimates.clone())
    }
}

pub struct FixtureWeatherProvider {
    pub temperatures: Vec<(DateTime<Utc>, f64)>,
}

impl WeatherProvider for FixtureWeatherProvider {
    fn temperatures(&self, _day_start: DateTime<Utc>) -> Result<Vec<(DateTime<Utc>, f64)>, ProviderError> {
        Ok(self.temperatures.clone())
    }
}

pub struct FixtureHistoryProvider {
    pub samples: Vec<LoadHistorySample>,
}

impl HistoryProvider for FixtureHistoryProvider {
    fn samples(&self, entity_id: &str, since: DateTime<Utc>) -> Result<Vec<LoadHistorySample>, ProviderError> {
        let filtered: Vec<LoadHistorySample> = self
            .samples
            .iter()
            .filter(|s| s.entity_id == entity_id && s.last_changed >= since)
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Err(ProviderError::NoData("fixture-history"));
        }
        Ok(filtered)
    }
}
