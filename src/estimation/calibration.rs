//! Confidence level calibration from previously recorded runs.

use crate::core::instrument::InstrumentId;
use crate::core::records::ConfidenceHistoryRecord;
use log::debug;

/// Confidence level used when an instrument has no recorded history.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Derives the confidence level for an instrument from its history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrator {
    default_confidence: f64,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_LEVEL)
    }
}

impl Calibrator {
    pub fn new(default_confidence: f64) -> Self {
        Self { default_confidence }
    }

    pub fn default_confidence(&self) -> f64 {
        self.default_confidence
    }

    /// Mean of the recorded confidence levels for `instrument_id`, or the
    /// default when none exist. Records of other instruments are ignored.
    pub fn calibrate(
        &self,
        instrument_id: &InstrumentId,
        history: &[ConfidenceHistoryRecord],
    ) -> f64 {
        let (sum, count) = history
            .iter()
            .filter(|r| &r.instrument_id == instrument_id)
            .fold((0.0, 0usize), |(sum, count), r| {
                (sum + r.confidence_level, count + 1)
            });

        if count == 0 {
            debug!(
                "no confidence history for {}, using default {}",
                instrument_id, self.default_confidence
            );
            return self.default_confidence;
        }
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn records(id: &str, levels: &[f64]) -> Vec<ConfidenceHistoryRecord> {
        levels
            .iter()
            .map(|&c| ConfidenceHistoryRecord::new(InstrumentId::new(id), c))
            .collect()
    }

    #[test]
    fn test_mean_of_history() {
        let calibrator = Calibrator::new(0.975);
        let history = records("NABIL", &[0.90, 0.95, 1.00]);
        assert_relative_eq!(
            calibrator.calibrate(&InstrumentId::new("NABIL"), &history),
            0.95,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_empty_history_uses_default() {
        let calibrator = Calibrator::new(0.975);
        assert_eq!(calibrator.calibrate(&InstrumentId::new("NABIL"), &[]), 0.975);
        assert_eq!(
            Calibrator::default().calibrate(&InstrumentId::new("NABIL"), &[]),
            DEFAULT_CONFIDENCE_LEVEL
        );
    }

    #[test]
    fn test_other_instruments_are_ignored() {
        let calibrator = Calibrator::new(0.975);
        let mut history = records("NICA", &[0.91, 0.92]);
        assert_eq!(calibrator.calibrate(&InstrumentId::new("NABIL"), &history), 0.975);

        history.extend(records("NABIL", &[0.99]));
        assert_relative_eq!(
            calibrator.calibrate(&InstrumentId::new("NABIL"), &history),
            0.99
        );
    }
}
