//! Interpolation helpers shared by the scoring and benchmark engines.

/// Map `value` linearly so that `worst` lands on 0 and `best` on 100, then clamp.
///
/// Works in either direction: pass `best < worst` when lower values are healthier.
/// Callers must not pass `worst == best`; parameter validation rules that out.
pub fn interpolate_score(value: f64, worst: f64, best: f64) -> f64 {
    ((value - worst) / (best - worst) * 100.0).clamp(0.0, 100.0)
}

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
