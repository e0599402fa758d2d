//! Summary statistics used by the extractor. Empty inputs yield 0.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population variance; fewer than two samples yield 0.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sq: Vec<f64> = values.iter().map(|x| (x - m) * (x - m)).collect();
    mean(&sq)
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Gaps between consecutive entries.
pub fn intervals(values: &[i64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1].saturating_sub(w[0]) as f64).collect()
}

/// Round to `places` decimals; non-finite input becomes 0.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places);
    let r = (value * factor).round() / factor;
    // avoid serializing -0.0
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
