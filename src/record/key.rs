// src/record/key.rs

use chrono::{Datelike, NaiveDate};
use std::{cmp::Ordering, fmt};

use super::DailyRecord;

/// `(year, month, day)` of a daily record: the uniqueness and ordering key of
/// the master record. Field order makes the derived `Ord` chronological.
///
/// Calendar days only. The grid operator's local day is taken as-is, there is
/// no time-of-day or timezone component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateKey {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// `None` when the key does not name a real calendar day (possible for
    /// rows read back from a hand-edited master file).
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(d: NaiveDate) -> Self {
        Self::new(d.year(), d.month(), d.day())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

pub fn date_key(record: &DailyRecord) -> DateKey {
    record.key()
}

pub fn compare_keys(a: &DateKey, b: &DateKey) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_chronologically() {
        let a = DateKey::new(2023, 12, 31);
        let b = DateKey::new(2024, 1, 1);
        let c = DateKey::new(2024, 1, 2);
        assert_eq!(compare_keys(&a, &b), Ordering::Less);
        assert_eq!(compare_keys(&c, &b), Ordering::Greater);
        assert_eq!(compare_keys(&b, &b), Ordering::Equal);

        // month before day, regardless of magnitude
        assert!(DateKey::new(2024, 2, 1) > DateKey::new(2024, 1, 31));
    }

    #[test]
    fn converts_from_naive_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let key = DateKey::from(d);
        assert_eq!(key, DateKey::new(2024, 3, 15));
        assert_eq!(key.to_naive_date(), Some(d));
        assert_eq!(key.to_string(), "2024-03-15");
        assert_eq!(DateKey::new(2023, 2, 30).to_naive_date(), None);
    }
}
