// src/process/utils.rs

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) Parse a numeric cell as the source pages print them.
///
/// Accepts grouping spaces (`"4 312"`, including non-breaking ones), a decimal
/// comma (`"4312,6"`) and comma thousands separators next to a decimal point
/// (`"4,312.6"`). Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s: String = clean_str(raw)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if s.is_empty() {
        return None;
    }
    let s = match (s.contains(','), s.contains('.')) {
        (true, false) => s.replace(',', "."),
        (true, true) => s.replace(',', ""),
        _ => s,
    };
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 3) Coerce a parsed value to an hourly load: non-negative, rounded half away
/// from zero.
pub fn to_load(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let rounded = value.round();
    if rounded > u64::MAX as f64 {
        return None;
    }
    Some(rounded as u64)
}
