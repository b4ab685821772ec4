//! Small numeric helpers shared by the detectors.

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Ordinary least-squares slope of `values` against their sample index
/// (0, 1, 2, ...). Zero for fewer than two values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let Some(y_mean) = mean(values) else {
        return 0.0;
    };

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (dx.mul_add(y - y_mean, num), dx.mul_add(dx, den))
        });

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
