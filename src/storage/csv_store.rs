//! Semicolon-separated ledger file, one row per saved meal.
//! On the appliance the path points into the SD card's FAT mount.

use super::{LedgerStore, MealRecord, StorageError};
use crate::nutrition::NutritionTotals;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    date: String,
    time: String,
    carb: f32,
    carb_r: f32,
    fat: f32,
    fat_r: f32,
    protein: f32,
    protein_r: f32,
    kcal: f32,
    weight: f32,
    dishes: u32,
}

impl From<&MealRecord> for LedgerRow {
    fn from(record: &MealRecord) -> Self {
        let t = record.totals;
        let rations = t.rations();
        Self {
            date: record.timestamp.format(DATE_FORMAT).to_string(),
            time: record.timestamp.format(TIME_FORMAT).to_string(),
            carb: t.carb_g,
            carb_r: rations.carb,
            fat: t.fat_g,
            fat_r: rations.fat,
            protein: t.protein_g,
            protein_r: rations.protein,
            kcal: t.kcal,
            weight: t.weight_g,
            dishes: record.dish_count,
        }
    }
}

impl LedgerRow {
    fn into_record(self, line: u64) -> Result<MealRecord, StorageError> {
        let malformed = |reason: String| StorageError::Malformed { line, reason };
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| malformed(format!("date '{}': {}", self.date, e)))?;
        let time = NaiveTime::parse_from_str(&self.time, TIME_FORMAT)
            .map_err(|e| malformed(format!("time '{}': {}", self.time, e)))?;

        // Rations are derived, so only the gram values are read back.
        Ok(MealRecord {
            timestamp: NaiveDateTime::new(date, time),
            dish_count: self.dishes,
            totals: NutritionTotals {
                weight_g: self.weight,
                carb_g: self.carb,
                protein_g: self.protein,
                fat_g: self.fat,
                kcal: self.kcal,
            },
        })
    }
}

pub struct CsvLedgerStore {
    path: PathBuf,
}

impl CsvLedgerStore {
    /// Opens the ledger at `path`, creating it with a header if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !store.path.exists() {
            info!("📒 Creating ledger file {}", store.path.display());
            store.write_header()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&self) -> Result<(), StorageError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(&self.path)?;
        writer.write_record([
            "date", "time", "carb", "carb_r", "fat", "fat_r", "protein", "protein_r", "kcal",
            "weight", "dishes",
        ])?;
        writer.flush()?;
        Ok(())
    }
}

fn ends_with_newline(path: &Path) -> Result<bool, StorageError> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl LedgerStore for CsvLedgerStore {
    fn append(&mut self, record: &MealRecord) -> Result<(), StorageError> {
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        if needs_header {
            self.write_header()?;
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        if !ends_with_newline(&self.path)? {
            // A torn last row must not swallow this one
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);
        writer.serialize(LedgerRow::from(record))?;
        writer.flush()?;

        debug!("Appended meal record {} to {}", record.timestamp, self.path.display());
        Ok(())
    }

    fn records(&self) -> Result<Vec<MealRecord>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("📒 Skipping unreadable ledger row: {}", e);
                    continue;
                }
            };
            let line = row.position().map_or(0, |p| p.line());
            let parsed = row
                .deserialize::<LedgerRow>(Some(&headers))
                .map_err(StorageError::from)
                .and_then(|r| r.into_record(line));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!("📒 Skipping ledger line {}: {}", line, e),
            }
        }
        Ok(records)
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.write_header()?;
        info!("🗑️ Ledger {} cleared", self.path.display());
        Ok(())
    }
}
