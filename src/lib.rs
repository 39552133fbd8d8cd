//! Driver for the MAX17048/MAX17049 ModelGauge battery fuel gauges.
//!
//! Every accessor performs a fresh register transaction, nothing is cached.
//! Setters of bit fields read the 16-bit register, replace the field and write
//! the register back, leaving the other fields untouched.
//!
//! The blocking API works over `embedded_hal::i2c::I2c`. Every operation has
//! an `_async` counterpart for `embedded_hal_async::i2c::I2c`.
//!
//! ```rust
//! # use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
//! use max1704x::{Config, Max1704x};
//!
//! # let expectations = [
//! #     Transaction::write_read(0x36, vec![0x08], vec![0x00, 0x12]),
//! #     Transaction::write_read(0x36, vec![0x02], vec![0x9C, 0x40]),
//! #     Transaction::write_read(0x36, vec![0x04], vec![0x32, 0x80]),
//! # ];
//! # let i2c = Mock::new(&expectations);
//! let mut fuel_gauge = Max1704x::connect(i2c, Config::default()).unwrap();
//!
//! assert_eq!(fuel_gauge.cell_voltage().unwrap(), 3.125);
//! assert_eq!(fuel_gauge.state_of_charge().unwrap(), 50.5);
//! # fuel_gauge.release().done();
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate logger;

use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
use enumset::{EnumSet, EnumSetType};

mod asynch;
mod blocking;
pub mod ll;
pub mod units;

/// Address of the device unless configured otherwise.
pub const DEFAULT_ADDRESS: u8 = 0x36;

/// Writing this to the command register triggers a power-on reset.
pub const RESET_COMMAND: u16 = 0x5400;

const RESET_INDICATOR_CLEAR_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus transaction failed.
    I2c(E),
    /// The VERSION register does not identify a MAX1704x.
    UnknownDevice(u16),
    /// Not a 7-bit I2C address.
    InvalidAddress(u8),
    /// The requested value does not fit the register field.
    OutOfRange,
    /// The device did not accept a write after repeated attempts.
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit I2C address.
    pub address: u8,

    /// Read the VERSION register when connecting and reject unknown devices.
    pub verify_version: bool,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            verify_version: true,
        }
    }

    pub const fn with_address(self, address: u8) -> Self {
        Self { address, ..self }
    }

    pub const fn with_version_check(self, verify_version: bool) -> Self {
        Self {
            verify_version,
            ..self
        }
    }

    fn validate<E>(&self) -> Result<(), Error<E>> {
        if self.address > 0x7F {
            return Err(Error::InvalidAddress(self.address));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Alert flags of the STATUS register.
#[derive(Debug, EnumSetType)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alert {
    /// The device powered up or was reset and needs configuration.
    ResetIndicator,
    /// VCELL went above `VALRT.MAX`.
    VoltageHigh,
    /// VCELL went below `VALRT.MIN`.
    VoltageLow,
    /// The battery was removed or swapped.
    VoltageReset,
    /// SOC crossed the empty alert threshold.
    SocLow,
    /// SOC changed by at least 1%, if enabled.
    SocChange,
}

/// Returns whether `version` identifies a MAX17048 or MAX17049.
///
/// ```rust
/// # use max1704x::is_supported_version;
/// assert!(is_supported_version(0x0010));
/// assert!(is_supported_version(0x0012));
/// assert!(!is_supported_version(0x0020));
/// assert!(!is_supported_version(0xFFFF));
/// ```
pub const fn is_supported_version(version: u16) -> bool {
    version & 0xFFF0 == 0x0010
}

fn alerts_from_bits(bits: u8) -> EnumSet<Alert> {
    EnumSet::from_u8_truncated(bits)
}

/// The device resets while the reset command is being written, so it may not
/// acknowledge the data bytes.
fn is_reset_nack(error: &impl embedded_hal::i2c::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data | NoAcknowledgeSource::Unknown)
    )
}

pub struct Max1704x<I> {
    iface: ll::Max1704xI2cInterface<I>,
}

impl<I> Max1704x<I> {
    /// Creates a driver without talking to the device. Use `connect` to check
    /// that the device is present.
    pub const fn new(i2c: I, config: Config) -> Self {
        Self {
            iface: ll::Max1704xI2cInterface {
                i2c,
                address: config.address,
            },
        }
    }

    pub fn address(&self) -> u8 {
        self.iface.address
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.iface.i2c
    }

    pub fn release(self) -> I {
        self.iface.i2c
    }
}
