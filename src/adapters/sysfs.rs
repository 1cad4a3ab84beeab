//! Linux sysfs GPIO pins (Raspberry Pi).
//!
//! [`SysfsPin`] exports a pin on construction, unexports it on drop, and
//! implements the `embedded-hal` digital traits so the generic adapters in
//! [`super::hardware`] can drive it.

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use log::{error, info};
use sysfs_gpio::{Direction, Pin};

/// Error wrapper so sysfs failures satisfy `embedded_hal::digital::Error`.
#[derive(Debug)]
pub struct SysfsError(pub sysfs_gpio::Error);

impl digital::Error for SysfsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl core::fmt::Display for SysfsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sysfs gpio: {}", self.0)
    }
}

impl std::error::Error for SysfsError {}

/// An exported sysfs GPIO line.
pub struct SysfsPin {
    pin: Pin,
}

impl SysfsPin {
    /// Export `number` as an output, driven LOW.
    pub fn output(number: u64) -> Result<Self, SysfsError> {
        Self::export(number, Direction::Low)
    }

    /// Export `number` as an input.
    pub fn input(number: u64) -> Result<Self, SysfsError> {
        Self::export(number, Direction::In)
    }

    fn export(number: u64, direction: Direction) -> Result<Self, SysfsError> {
        let pin = Pin::new(number);
        pin.export().map_err(SysfsError)?;
        // Claim before configuring so a failure below still unexports.
        let claimed = Self { pin };
        claimed.pin.set_direction(direction).map_err(SysfsError)?;
        info!("gpio{number}: exported ({direction:?})");
        Ok(claimed)
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = self.pin.unexport() {
            error!("Could not unexport pin {}: {}", self.pin.get_pin(), e);
        }
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsError;
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.get_value().map_err(SysfsError)? != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.get_value().map_err(SysfsError)? == 0)
    }
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(0).map_err(SysfsError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(1).map_err(SysfsError)
    }
}
