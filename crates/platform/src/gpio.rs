//! GPIO level type and embedded-hal pin helpers
//!
//! Pins themselves are `embedded_hal::digital` types; this module adds the
//! level enum used by the timed-wait primitive and error mapping helpers.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::Error;

/// Pin level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLevel {
    /// Low (logic 0)
    Low,
    /// High (logic 1)
    High,
}

impl PinLevel {
    /// The opposite level.
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinLevel> for bool {
    fn from(value: PinLevel) -> Self {
        matches!(value, PinLevel::High)
    }
}

/// Read the level of an input pin, mapping HAL errors to [`Error::Io`].
pub fn read_level<P: InputPin>(pin: &mut P) -> Result<PinLevel, Error> {
    pin.is_high().map(PinLevel::from).map_err(|_| Error::Io)
}

/// Drive an output pin, mapping HAL errors to [`Error::Io`].
pub fn write_level<P: OutputPin>(pin: &mut P, level: PinLevel) -> Result<(), Error> {
    match level {
        PinLevel::High => pin.set_high(),
        PinLevel::Low => pin.set_low(),
    }
    .map_err(|_| Error::Io)
}
