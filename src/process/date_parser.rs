use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::DateKey;

static DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").expect("DD.MM.YYYY pattern"));

/// Strict parse of `"DD.MM.YYYY"` into a key. The day must exist in the
/// calendar (`31.02.2024` is rejected).
pub fn parse_dmy(s: &str) -> Option<DateKey> {
    let caps = DMY.captures(s.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let key = DateKey::new(year, month, day);
    key.to_naive_date().map(|_| key)
}

pub fn format_dmy(key: &DateKey) -> String {
    format!("{:02}.{:02}.{:04}", key.day, key.month, key.year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_format_only() {
        assert_eq!(parse_dmy("15.03.2024"), Some(DateKey::new(2024, 3, 15)));
        assert_eq!(parse_dmy(" 01.01.2026 "), Some(DateKey::new(2026, 1, 1)));
        assert_eq!(parse_dmy("2024-03-15"), None);
        assert_eq!(parse_dmy("15.3.2024"), None);
        assert_eq!(parse_dmy("15.03.24"), None);
        assert_eq!(parse_dmy("31.02.2024"), None);
        assert_eq!(parse_dmy("15.03.2024 00:00"), None);
    }

    #[test]
    fn format_is_inverse_of_parse() {
        let key = DateKey::new(2024, 3, 5);
        assert_eq!(format_dmy(&key), "05.03.2024");
        assert_eq!(parse_dmy(&format_dmy(&key)), Some(key));
    }
}
