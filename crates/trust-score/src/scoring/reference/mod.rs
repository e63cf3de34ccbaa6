mod parser;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::domain::{PolicyNumber, PolicyRecord};

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read policy reference data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid policy reference data: {0}")]
    Csv(#[from] csv::Error),
}

/// Immutable policy table plus the epoch used for day-offset features.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    records: Vec<PolicyRecord>,
    index: HashMap<PolicyNumber, usize>,
    min_bind_date: Option<NaiveDate>,
}

impl ReferenceStore {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let records = parser::parse_records(reader)?;
        Ok(Self::from_records(records))
    }

    /// Index records in source order. The first row carrying a policy number wins.
    pub fn from_records(records: Vec<PolicyRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        let mut duplicates = 0usize;

        for (position, record) in records.iter().enumerate() {
            if record.policy_number.is_empty() {
                continue;
            }
            if index.contains_key(&record.policy_number) {
                duplicates += 1;
                continue;
            }
            index.insert(record.policy_number.clone(), position);
        }

        let min_bind_date = records
            .iter()
            .filter_map(|record| record.policy_bind_date)
            .min();
        let unparsed = records
            .iter()
            .filter(|record| record.policy_bind_date.is_none())
            .count();

        if unparsed > 0 {
            warn!(unparsed, "policy rows without a usable bind date");
        }
        if duplicates > 0 {
            warn!(duplicates, "duplicate policy numbers ignored; first row wins");
        }
        info!(
            rows = records.len(),
            policies = index.len(),
            min_bind_date = ?min_bind_date,
            "policy reference data loaded"
        );

        Self {
            records,
            index,
            min_bind_date,
        }
    }

    pub fn lookup(&self, policy_number: &PolicyNumber) -> Option<&PolicyRecord> {
        self.index
            .get(policy_number)
            .and_then(|position| self.records.get(*position))
    }

    /// Earliest parsed bind date; zero point for every day-offset feature.
    pub fn min_bind_date(&self) -> Option<NaiveDate> {
        self.min_bind_date
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PolicyRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn parse_bind_date_accepts_common_layouts() {
        assert_eq!(parser::parse_bind_date("2014-10-17"), Some(date(2014, 10, 17)));
        assert_eq!(parser::parse_bind_date("2014/10/17"), Some(date(2014, 10, 17)));
        assert_eq!(parser::parse_bind_date("10/17/2014"), Some(date(2014, 10, 17)));
        assert_eq!(
            parser::parse_bind_date("2014-10-17 00:00:00"),
            Some(date(2014, 10, 17))
        );
        assert_eq!(
            parser::parse_bind_date("2014-10-17T08:30:00+02:00"),
            Some(date(2014, 10, 17))
        );
        assert!(parser::parse_bind_date("  ").is_none());
        assert!(parser::parse_bind_date("sometime in 2014").is_none());
    }

    #[test]
    fn epoch_is_minimum_of_parsed_dates() {
        let csv = "policy_number,policy_bind_date,policy_state\n\
521585,2014-10-17,OH\n\
342868,2006-06-27,IN\n\
687698,not-a-date,OH\n\
227811,1990-05-25,IL\n";
        let store = ReferenceStore::from_reader(Cursor::new(csv)).expect("loads");

        assert_eq!(store.len(), 4);
        assert_eq!(store.min_bind_date(), Some(date(1990, 5, 25)));

        let unparsed = store
            .lookup(&PolicyNumber::new("687698"))
            .expect("row kept despite bad date");
        assert!(unparsed.policy_bind_date.is_none());
    }

    #[test]
    fn duplicate_policy_numbers_resolve_to_first_row() {
        let csv = "policy_number,policy_bind_date\n\
P-100,2020-01-10\n\
P-100,2021-03-04\n";
        let store = ReferenceStore::from_reader(Cursor::new(csv)).expect("loads");

        let record = store.lookup(&PolicyNumber::new("P-100")).expect("present");
        assert_eq!(record.policy_bind_date, Some(date(2020, 1, 10)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn lookup_is_exact_after_trimming() {
        let csv = "policy_number,policy_bind_date\n  P-7  ,2020-01-10\n";
        let store = ReferenceStore::from_reader(Cursor::new(csv)).expect("loads");

        assert!(store.lookup(&PolicyNumber::new("P-7")).is_some());
        assert!(store.lookup(&PolicyNumber::new("p-7")).is_none());
        assert!(store.lookup(&PolicyNumber::new("P-70")).is_none());
        assert!(store.lookup(&PolicyNumber::new(" P-7 ")).is_none());
    }

    #[test]
    fn epoch_is_absent_when_no_date_parses() {
        let csv = "policy_number,policy_bind_date\nP-1,\nP-2,garbage\n";
        let store = ReferenceStore::from_reader(Cursor::new(csv)).expect("loads");

        assert_eq!(store.len(), 2);
        assert!(store.min_bind_date().is_none());
    }

    #[test]
    fn missing_bind_date_column_is_rejected() {
        let csv = "policy_number,policy_state\nP-1,OH\n";
        match ReferenceStore::from_reader(Cursor::new(csv)) {
            Err(ReferenceDataError::Csv(_)) => {}
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn from_path_propagates_io_errors() {
        match ReferenceStore::from_path("./does-not-exist.csv") {
            Err(ReferenceDataError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
