// src/record/mod.rs

pub mod key;

pub use key::{compare_keys, date_key, DateKey};

/// Number of hourly values per day.
pub const HOURS: usize = 24;

/// Column labels of the persisted master: `Year, Month, Day, 1..24`.
pub fn master_columns() -> Vec<String> {
    ["Year", "Month", "Day"]
        .iter()
        .map(|s| s.to_string())
        .chain((1..=HOURS).map(|h| h.to_string()))
        .collect()
}

/// One calendar day of the forecast grid.
///
/// `hours[0]` is hour 1, `hours[23]` is hour 24. A `None` hour is an
/// explicitly missing value, never a zero. Records produced by the normalizer
/// are always complete; gaps can only come from an existing master file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hours: [Option<u64>; HOURS],
}

impl DailyRecord {
    pub fn new(key: DateKey, hours: [Option<u64>; HOURS]) -> Self {
        Self {
            year: key.year,
            month: key.month,
            day: key.day,
            hours,
        }
    }

    /// A record with all 24 hours present.
    pub fn complete(key: DateKey, hours: [u64; HOURS]) -> Self {
        Self::new(key, hours.map(Some))
    }

    pub fn key(&self) -> DateKey {
        DateKey::new(self.year, self.month, self.day)
    }

    /// Value for 1-based `hour`; `None` if absent or out of range.
    pub fn hour(&self, hour: usize) -> Option<u64> {
        hour.checked_sub(1)
            .and_then(|i| self.hours.get(i))
            .copied()
            .flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.hours.iter().all(Option::is_some)
    }
}

/// Daily records ordered by strictly increasing `DateKey`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<DailyRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by key and collapse duplicate keys. The last occurrence of a key in
    /// `records` wins.
    pub fn from_records(records: Vec<DailyRecord>) -> Self {
        let mut records = records;
        // stable: equal keys keep their input order
        records.sort_by_key(DailyRecord::key);

        let mut out: Vec<DailyRecord> = Vec::with_capacity(records.len());
        for rec in records {
            match out.last_mut() {
                Some(prev) if prev.key() == rec.key() => *prev = rec,
                _ => out.push(rec),
            }
        }
        Self { records: out }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<DailyRecord> {
        self.records
    }

    pub fn get(&self, key: &DateKey) -> Option<&DailyRecord> {
        self.records
            .binary_search_by(|r| compare_keys(&r.key(), key))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn first_key(&self) -> Option<DateKey> {
        self.records.first().map(DailyRecord::key)
    }

    pub fn last_key(&self) -> Option<DateKey> {
        self.records.last().map(DailyRecord::key)
    }
}

impl FromIterator<DailyRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = DailyRecord>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

impl IntoIterator for RecordSet {
    type Item = DailyRecord;
    type IntoIter = std::vec::IntoIter<DailyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a DailyRecord;
    type IntoIter = std::slice::Iter<'a, DailyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
