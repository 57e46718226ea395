//! Timing statistics for the measurement phase.

/// Mean and standard deviation of a sample set, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Population mean, rounded to 2 decimals.
    pub mean: f64,
    /// Population standard deviation (denominator N), rounded to 2 decimals.
    pub std_dev: f64,
}

/// Reduce timing samples to mean and population standard deviation.
///
/// Returns `None` for an empty sample set; averaging nothing is a caller bug,
/// not a zero.
pub fn statistics(samples: &[f64]) -> Option<Stats> {
    if samples.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    Some(Stats {
        mean: round2(mean),
        std_dev: round2(variance.sqrt()),
    })
}

/// Round to 2 decimal places for presentation stability.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
