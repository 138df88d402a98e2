//! HX711 load-cell amplifier, bit-banged over two GPIOs (channel A, gain 128)

use super::traits::{LoadCell, LoadCellError};
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver};
use log::info;

const TARE_SAMPLES: u32 = 10;
const READY_ATTEMPTS: u32 = 2_000;

pub struct Hx711 {
    data: PinDriver<'static, AnyIOPin, Input>,
    clock: PinDriver<'static, AnyOutputPin, Output>,
    zero_counts: i32,
    counts_per_gram: f32,
}

impl Hx711 {
    pub fn new(data: AnyIOPin, clock: AnyOutputPin, counts_per_gram: f32) -> Result<Self, LoadCellError> {
        let data = PinDriver::input(data).map_err(|e| LoadCellError::Hardware(format!("DOUT: {:?}", e)))?;
        let mut clock =
            PinDriver::output(clock).map_err(|e| LoadCellError::Hardware(format!("SCK: {:?}", e)))?;
        clock
            .set_low()
            .map_err(|e| LoadCellError::Hardware(format!("SCK low: {:?}", e)))?;

        let mut cell = Self {
            data,
            clock,
            zero_counts: 0,
            counts_per_gram,
        };
        cell.zero()?;
        Ok(cell)
    }

    /// Averages a few conversions and takes them as the power-on zero.
    fn zero(&mut self) -> Result<(), LoadCellError> {
        let mut sum: i64 = 0;
        let mut taken = 0;
        let mut attempts = 0;
        while taken < TARE_SAMPLES {
            attempts += 1;
            if attempts > READY_ATTEMPTS {
                return Err(LoadCellError::Hardware("no conversion from HX711".into()));
            }
            match self.read_counts() {
                Ok(counts) => {
                    sum += counts as i64;
                    taken += 1;
                }
                Err(LoadCellError::NotReady) => Ets::delay_us(1000),
                Err(e) => return Err(e),
            }
        }
        self.zero_counts = (sum / TARE_SAMPLES as i64) as i32;
        info!("⚖️ HX711 zeroed at {} counts", self.zero_counts);
        Ok(())
    }

    fn pulse(&mut self) -> Result<(), LoadCellError> {
        self.clock
            .set_high()
            .map_err(|e| LoadCellError::Hardware(format!("SCK high: {:?}", e)))?;
        Ets::delay_us(1);
        self.clock
            .set_low()
            .map_err(|e| LoadCellError::Hardware(format!("SCK low: {:?}", e)))?;
        Ets::delay_us(1);
        Ok(())
    }

    fn read_counts(&mut self) -> Result<i32, LoadCellError> {
        // DOUT goes low when a conversion is ready
        if self.data.is_high() {
            return Err(LoadCellError::NotReady);
        }

        let mut value: u32 = 0;
        for _ in 0..24 {
            self.pulse()?;
            value = (value << 1) | self.data.is_high() as u32;
        }
        // 25th pulse selects channel A, gain 128 for the next conversion
        self.pulse()?;

        // Sign-extend the 24-bit two's complement value
        Ok(((value << 8) as i32) >> 8)
    }
}

impl LoadCell for Hx711 {
    fn read_grams(&mut self) -> Result<f32, LoadCellError> {
        let counts = self.read_counts()?;
        Ok((counts - self.zero_counts) as f32 / self.counts_per_gram)
    }
}
