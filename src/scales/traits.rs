//! Load-cell abstraction
//!
//! The workflow only ever sees grams; drivers own calibration and wiring.

use crate::types::ScaleSample;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use thiserror::Error;

/// Latest sample from the sampling tick. A newer sample replaces an unread one.
pub type ScaleSampleSignal = Signal<CriticalSectionRawMutex, ScaleSample>;

#[derive(Debug, Error)]
pub enum LoadCellError {
    #[error("load cell not ready")]
    NotReady,
    #[error("load cell hardware error: {0}")]
    Hardware(String),
}

pub trait LoadCell {
    /// Gross weight in grams, relative to the power-on zero.
    fn read_grams(&mut self) -> Result<f32, LoadCellError>;
}

/// Replays a fixed series of readings, holding the last one. Used for host runs.
#[derive(Debug, Clone)]
pub struct ScriptedLoadCell {
    readings: Vec<f32>,
    position: usize,
}

impl ScriptedLoadCell {
    pub fn new(readings: Vec<f32>) -> Self {
        Self {
            readings,
            position: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.readings.len()
    }
}

impl LoadCell for ScriptedLoadCell {
    fn read_grams(&mut self) -> Result<f32, LoadCellError> {
        let reading = self
            .readings
            .get(self.position)
            .or_else(|| self.readings.last())
            .copied()
            .ok_or(LoadCellError::NotReady)?;
        self.position += 1;
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_cell_holds_last_reading() {
        let mut cell = ScriptedLoadCell::new(vec![0.0, 150.0]);
        assert_eq!(cell.read_grams().unwrap(), 0.0);
        assert_eq!(cell.read_grams().unwrap(), 150.0);
        assert!(cell.is_finished());
        assert_eq!(cell.read_grams().unwrap(), 150.0);
    }

    #[test]
    fn test_empty_script_is_not_ready() {
        let mut cell = ScriptedLoadCell::new(Vec::new());
        assert!(matches!(cell.read_grams(), Err(LoadCellError::NotReady)));
    }
}
