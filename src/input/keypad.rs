//! GPIO scanning for the front keypad and the 4x5 food-group matrix

use super::buttons::{record_press, ButtonPress, ScanPresses};
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use log::info;
use thiserror::Error;

pub const MATRIX_ROWS: usize = 4;
pub const MATRIX_COLS: usize = 5;

#[derive(Debug, Error)]
pub enum KeypadError {
    #[error("GPIO error: {0}")]
    Gpio(String),
}

pub struct ButtonScanner {
    keypad: [PinDriver<'static, AnyIOPin, Input>; 5],
    rows: [PinDriver<'static, AnyOutputPin, Output>; MATRIX_ROWS],
    cols: [PinDriver<'static, AnyIOPin, Input>; MATRIX_COLS],
    keypad_down: [bool; 5],
    matrix_down: [[bool; MATRIX_COLS]; MATRIX_ROWS],
}

fn input(pin: AnyIOPin) -> Result<PinDriver<'static, AnyIOPin, Input>, KeypadError> {
    let mut driver = PinDriver::input(pin).map_err(|e| KeypadError::Gpio(format!("{:?}", e)))?;
    driver
        .set_pull(Pull::Up)
        .map_err(|e| KeypadError::Gpio(format!("pull-up: {:?}", e)))?;
    Ok(driver)
}

fn output(pin: AnyOutputPin) -> Result<PinDriver<'static, AnyOutputPin, Output>, KeypadError> {
    let mut driver = PinDriver::output(pin).map_err(|e| KeypadError::Gpio(format!("{:?}", e)))?;
    driver
        .set_high()
        .map_err(|e| KeypadError::Gpio(format!("idle high: {:?}", e)))?;
    Ok(driver)
}

impl ButtonScanner {
    /// Keypad pins are active low; matrix rows are driven low one at a time.
    pub fn new(
        keypad: [AnyIOPin; 5],
        rows: [AnyOutputPin; MATRIX_ROWS],
        cols: [AnyIOPin; MATRIX_COLS],
    ) -> Result<Self, KeypadError> {
        let [k1, k2, k3, k4, k5] = keypad;
        let [r1, r2, r3, r4] = rows;
        let [c1, c2, c3, c4, c5] = cols;

        let scanner = Self {
            keypad: [input(k1)?, input(k2)?, input(k3)?, input(k4)?, input(k5)?],
            rows: [output(r1)?, output(r2)?, output(r3)?, output(r4)?],
            cols: [input(c1)?, input(c2)?, input(c3)?, input(c4)?, input(c5)?],
            keypad_down: [false; 5],
            matrix_down: [[false; MATRIX_COLS]; MATRIX_ROWS],
        };
        info!("🔘 Button scanner ready: 5 keys, {}x{} matrix", MATRIX_ROWS, MATRIX_COLS);
        Ok(scanner)
    }

    /// Reports buttons that went down since the previous scan.
    pub fn scan(&mut self) -> Result<ScanPresses, KeypadError> {
        let mut pressed = ScanPresses::new();

        for (i, pin) in self.keypad.iter().enumerate() {
            let down = pin.is_low();
            if down && !self.keypad_down[i] {
                if let Some(press) = ButtonPress::keypad(i as u8 + 1) {
                    record_press(&mut pressed, press);
                }
            }
            self.keypad_down[i] = down;
        }

        for row in 0..MATRIX_ROWS {
            self.rows[row]
                .set_low()
                .map_err(|e| KeypadError::Gpio(format!("row {} low: {:?}", row, e)))?;
            for col in 0..MATRIX_COLS {
                let down = self.cols[col].is_low();
                if down && !self.matrix_down[row][col] {
                    let id = (row * MATRIX_COLS + col) as u8 + 1;
                    if let Some(press) = ButtonPress::matrix(id) {
                        record_press(&mut pressed, press);
                    }
                }
                self.matrix_down[row][col] = down;
            }
            self.rows[row]
                .set_high()
                .map_err(|e| KeypadError::Gpio(format!("row {} high: {:?}", row, e)))?;
        }

        Ok(pressed)
    }
}
