//! Form input coercion - bad numbers become 0 instead of being rejected

/// Parse a count field (sets, reps, seconds). Anything unparseable is 0.
pub fn coerce_count(raw: &str) -> u32 {
    let raw = raw.trim();
    raw.parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v.trunc().min(u32::MAX as f64) as u32)
        })
        .unwrap_or(0)
}

/// Parse an optional weight field. Empty means "no weight", garbage means 0.
pub fn coerce_weight(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0))
}

/// clap value parser that never fails, following the form semantics
pub fn count_arg(raw: &str) -> Result<u32, String> {
    Ok(coerce_count(raw))
}

pub fn weight_arg(raw: &str) -> Result<f64, String> {
    Ok(coerce_weight(raw).unwrap_or(0.0))
}
