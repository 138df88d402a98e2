//! SH1106 panel over I2C

use super::display::{DisplayError, Panel};
use esp_idf_svc::hal::{
    gpio::{InputPin, OutputPin},
    i2c::{I2c, I2cConfig, I2cDriver},
    peripheral::Peripheral,
    prelude::*,
};
use log::info;
use sh1106::{interface::I2cInterface, mode::GraphicsMode, Builder};

pub type Sh1106Panel<I2C> = GraphicsMode<I2cInterface<I2C>>;

impl<I2C, E> Panel for Sh1106Panel<I2C>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = E> + embedded_hal::blocking::i2c::WriteRead<Error = E>,
    E: std::fmt::Debug,
{
    fn clear_panel(&mut self) {
        self.clear();
    }

    fn flush_panel(&mut self) -> Result<(), DisplayError> {
        self.flush()
            .map_err(|e| DisplayError::Flush(format!("{:?}", e)))
    }
}

/// Brings up the panel on the given I2C bus and pins.
pub fn create_panel(
    i2c: impl Peripheral<P = impl I2c> + 'static,
    sda: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
    scl: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
) -> Result<Sh1106Panel<I2cDriver<'static>>, DisplayError> {
    info!("Setting up I2C for SH1106 display");

    let config = I2cConfig::new().baudrate(400.kHz().into());
    let driver = I2cDriver::new(i2c, sda, scl, &config)
        .map_err(|e| DisplayError::Init(format!("I2C: {:?}", e)))?;

    let mut display: Sh1106Panel<_> = Builder::new().connect_i2c(driver).into();
    display
        .init()
        .map_err(|e| DisplayError::Init(format!("{:?}", e)))?;
    display.clear();
    display
        .flush()
        .map_err(|e| DisplayError::Flush(format!("{:?}", e)))?;

    info!("✅ SH1106 display initialized");
    Ok(display)
}
