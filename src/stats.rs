// Small statistics helpers over sample windows; empty input yields 0.0
use statrs::statistics::Statistics;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    Statistics::mean(values.iter())
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    Statistics::population_std_dev(values.iter())
}

pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Coefficient of variation; 0.0 when the mean is zero.
pub fn variability(values: &[f64]) -> f64 {
    let average = mean(values);
    if values.len() < 2 || average == 0.0 {
        return 0.0;
    }
    std_dev(values) / average.abs()
}
