//! Storage boundary of the engine.
//!
//! The engine reads price series and confidence history through
//! [`Repository`] and hands finished results back to it. Schema,
//! durability and retries belong to the implementation.

use crate::core::error::RepositoryError;
use crate::core::instrument::InstrumentId;
use crate::core::price_series::PriceSeries;
use crate::core::records::{ConfidenceHistoryRecord, VaRResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub trait Repository {
    /// Price history of an instrument. `NotFound` if none was ever recorded.
    fn load_price_series(&self, instrument_id: &InstrumentId) -> Result<PriceSeries, RepositoryError>;

    fn load_confidence_history(
        &self,
        instrument_id: &InstrumentId,
    ) -> Result<Vec<ConfidenceHistoryRecord>, RepositoryError>;

    fn list_known_instruments(&self) -> Result<Vec<InstrumentId>, RepositoryError>;

    /// Whether any result or confidence record exists for any instrument.
    fn has_any_history(&self) -> Result<bool, RepositoryError>;

    fn save_result(&mut self, result: &VaRResult) -> Result<(), RepositoryError>;

    fn save_confidence_record(
        &mut self,
        instrument_id: &InstrumentId,
        confidence_level: f64,
    ) -> Result<(), RepositoryError>;
}

/// A persisted [`VaRResult`] with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    #[serde(flatten)]
    pub result: VaRResult,
    pub recorded_at: DateTime<Utc>,
}

/// Map-backed repository. Serializes to a JSON snapshot for the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryRepository {
    prices: BTreeMap<InstrumentId, PriceSeries>,
    confidence_history: Vec<ConfidenceHistoryRecord>,
    results: Vec<StoredResult>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the price history of an instrument.
    pub fn insert_prices(&mut self, instrument_id: InstrumentId, series: PriceSeries) {
        self.prices.insert(instrument_id, series);
    }

    pub fn with_prices(mut self, instrument_id: impl Into<InstrumentId>, series: PriceSeries) -> Self {
        self.insert_prices(instrument_id.into(), series);
        self
    }

    pub fn results(&self) -> &[StoredResult] {
        &self.results
    }

    pub fn results_for<'a>(
        &'a self,
        instrument_id: &'a InstrumentId,
    ) -> impl Iterator<Item = &'a VaRResult> + 'a {
        self.results
            .iter()
            .map(|s| &s.result)
            .filter(move |r| &r.instrument_id == instrument_id)
    }

    pub fn confidence_history(&self) -> &[ConfidenceHistoryRecord] {
        &self.confidence_history
    }
}

impl Repository for InMemoryRepository {
    fn load_price_series(&self, instrument_id: &InstrumentId) -> Result<PriceSeries, RepositoryError> {
        self.prices
            .get(instrument_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(instrument_id.clone()))
    }

    fn load_confidence_history(
        &self,
        instrument_id: &InstrumentId,
    ) -> Result<Vec<ConfidenceHistoryRecord>, RepositoryError> {
        Ok(self
            .confidence_history
            .iter()
            .filter(|r| &r.instrument_id == instrument_id)
            .cloned()
            .collect())
    }

    fn list_known_instruments(&self) -> Result<Vec<InstrumentId>, RepositoryError> {
        Ok(self.prices.keys().cloned().collect())
    }

    fn has_any_history(&self) -> Result<bool, RepositoryError> {
        Ok(!self.results.is_empty() || !self.confidence_history.is_empty())
    }

    fn save_result(&mut self, result: &VaRResult) -> Result<(), RepositoryError> {
        self.results.push(StoredResult {
            result: result.clone(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    fn save_confidence_record(
        &mut self,
        instrument_id: &InstrumentId,
        confidence_level: f64,
    ) -> Result<(), RepositoryError> {
        self.confidence_history
            .push(ConfidenceHistoryRecord::new(instrument_id.clone(), confidence_level));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes).unwrap()
    }

    #[test]
    fn test_unknown_instrument_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.load_price_series(&InstrumentId::new("NABIL")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn test_history_filters_by_instrument() {
        let mut repo = InMemoryRepository::new();
        repo.save_confidence_record(&InstrumentId::new("NABIL"), 0.91).unwrap();
        repo.save_confidence_record(&InstrumentId::new("NICA"), 0.97).unwrap();

        let history = repo.load_confidence_history(&InstrumentId::new("NABIL")).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].confidence_level, 0.91);
        assert!(repo.has_any_history().unwrap());
    }

    #[test]
    fn test_lists_instruments_in_order() {
        let repo = InMemoryRepository::new()
            .with_prices("NICA", series(&[1.0, 2.0]))
            .with_prices("ADBL", series(&[3.0, 4.0]));
        let ids = repo.list_known_instruments().unwrap();
        assert_eq!(ids, vec![InstrumentId::new("ADBL"), InstrumentId::new("NICA")]);
        assert!(!repo.has_any_history().unwrap());
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", series(&[500.0, 505.0, 498.0]));
        repo.save_confidence_record(&InstrumentId::new("NABIL"), 0.93).unwrap();

        let json = serde_json::to_string(&repo).unwrap();
        let restored: InMemoryRepository = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.load_price_series(&InstrumentId::new("NABIL")).unwrap().len(),
            3
        );
        assert_eq!(restored.confidence_history().len(), 1);
    }
}
