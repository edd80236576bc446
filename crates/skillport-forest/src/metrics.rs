//! Goodness-of-fit metrics.

use crate::error::ForestError;
use ndarray::ArrayView1;

/// Coefficient of determination, R² = 1 − SS_res / SS_tot.
///
/// When the observed values are constant (SS_tot = 0) the score is 1 for a
/// perfect prediction and 0 otherwise.
pub fn r2_score(
    observed: ArrayView1<'_, f64>,
    predicted: ArrayView1<'_, f64>,
) -> Result<f64, ForestError> {
    if observed.len() != predicted.len() {
        return Err(ForestError::ShapeMismatch {
            rows: predicted.len(),
            targets: observed.len(),
        });
    }
    let Some(mean) = observed.mean() else {
        return Err(ForestError::InsufficientData {
            required: 1,
            actual: 0,
        });
    };

    let ss_res: f64 = observed
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
