/// Shannon entropy `H = -Σ pᵢ ln pᵢ` of a non-negative distribution.
///
/// Zero entries contribute nothing. An all-zero distribution has entropy 0.
pub fn shannon_index(values: &[f64]) -> f64 {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    -values
        .iter()
        .filter(|v| **v > 0.0)
        .map(|v| {
            let p = v / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Shannon entropy normalized by `ln(days)`.
///
/// Returns `None` when `days <= 1`, where the normalizer is zero or undefined.
pub fn evenness(values: &[f64], days: usize) -> Option<f64> {
    if days <= 1 {
        return None;
    }
    Some(shannon_index(values) / (days as f64).ln())
}
