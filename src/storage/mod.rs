//! Append-only persistence of saved meals

pub mod csv_store;

pub use csv_store::CsvLedgerStore;

use crate::nutrition::{DailyLedger, Meal, NutritionTotals};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed record on line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One line of the ledger: a saved meal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealRecord {
    pub timestamp: NaiveDateTime,
    pub dish_count: u32,
    pub totals: NutritionTotals,
}

impl MealRecord {
    pub fn from_meal(meal: &Meal, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            dish_count: meal.dish_count(),
            totals: meal.totals(),
        }
    }
}

/// Backing store for saved meals. Written only by the save and ledger-reset paths.
pub trait LedgerStore {
    fn append(&mut self, record: &MealRecord) -> Result<(), StorageError>;

    fn records(&self) -> Result<Vec<MealRecord>, StorageError>;

    /// Drops every record, leaving an empty but usable store.
    fn reset(&mut self) -> Result<(), StorageError>;

    fn load_day(&self, date: NaiveDate) -> Result<DailyLedger, StorageError> {
        Ok(DailyLedger::rebuild(date, &self.records()?))
    }
}

/// In-memory store for host runs and tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    records: Vec<MealRecord>,
    fail_writes: bool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MealRecord>) -> Self {
        Self {
            records,
            fail_writes: false,
        }
    }

    /// Makes subsequent appends and resets fail, to exercise the on-screen failure path.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append(&mut self, record: &MealRecord) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }
        self.records.push(*record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<MealRecord>, StorageError> {
        Ok(self.records.clone())
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }
        self.records.clear();
        Ok(())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn append(&mut self, record: &MealRecord) -> Result<(), StorageError> {
        (**self).append(record)
    }

    fn records(&self) -> Result<Vec<MealRecord>, StorageError> {
        (**self).records()
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        (**self).reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_memory_store_load_day() {
        let mut store = MemoryLedgerStore::new();
        let totals = NutritionTotals::from_macros(200.0, 20.0, 10.0, 5.0);
        store.append(&MealRecord { timestamp: at(9), dish_count: 1, totals }).unwrap();
        store.append(&MealRecord { timestamp: at(14), dish_count: 2, totals }).unwrap();

        let ledger = store.load_day(at(0).date()).unwrap();
        assert_eq!(ledger.meal_count(), 2);
        assert_eq!(ledger.totals().weight_g, 400.0);

        store.reset().unwrap();
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_failing_store_reports_error() {
        let mut store = MemoryLedgerStore::new();
        store.set_fail_writes(true);
        let record = MealRecord { timestamp: at(9), dish_count: 1, totals: NutritionTotals::ZERO };
        assert!(matches!(store.append(&record), Err(StorageError::Unavailable(_))));
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_csv_error_message_is_not_prefixed_twice() {
        let mut reader = csv::ReaderBuilder::new().from_reader("a,b\n1\n".as_bytes());
        let err = reader.records().find_map(Result::err).unwrap();
        let message = StorageError::from(err).to_string();
        assert_eq!(message.matches("CSV error").count(), 1, "{}", message);
    }
}
