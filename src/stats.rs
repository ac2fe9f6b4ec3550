use serde::Serialize;

use crate::errors::BenchError;

/// Samples from one measured target plus the statistics derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResult {
    /// Elapsed milliseconds per trial, in run order.
    pub samples: Vec<f64>,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

impl TrialResult {
    pub fn from_samples(samples: Vec<f64>) -> Result<Self, BenchError> {
        if samples.is_empty() {
            return Err(BenchError::EmptySamples);
        }

        let sum: f64 = samples.iter().sum();
        let average = sum / samples.len() as f64;
        let minimum = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(TrialResult {
            samples,
            average,
            minimum,
            maximum,
        })
    }
}

/// Percentage by which `candidate_avg` beats `baseline_avg`.
///
/// Positive means the candidate is faster. Returns `None` when the baseline
/// average is zero or not finite.
pub fn improvement_percent(baseline_avg: f64, candidate_avg: f64) -> Option<f64> {
    if baseline_avg == 0.0 || !baseline_avg.is_finite() || !candidate_avg.is_finite() {
        return None;
    }
    Some((baseline_avg - candidate_avg) / baseline_avg * 100.0)
}

/// Two-decimal rendering used for every reported duration and percentage.
pub fn format_ms(value: f64) -> String {
    format!("{:.2}", value)
}
