//! Hobby servo on a 50 Hz PWM channel.
//!
//! The high pulse within each 20 ms period sets the horn angle:
//!
//! | Angle | Pulse |
//! |-------|-------|
//! | −90° | 0.5 ms |
//! | 0° | 1.5 ms |
//! | +90° | 2.5 ms |

use common::registry::Named;
use embedded_hal::pwm::SetDutyCycle;
use platform::{Error, Result};

/// PWM period the channel is configured for.
pub const PERIOD_US: u16 = 20_000;
/// Pulse width at 0°.
pub const CENTER_PULSE_US: u16 = 1_500;
/// Largest deflection either side of centre.
pub const MAX_ANGLE: i8 = 90;

/// Servos on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoName {
    /// Sensor turret.
    Servo1,
}

/// Servo driven by one PWM channel whose period is [`PERIOD_US`].
pub struct Servo<W> {
    name: ServoName,
    pwm: W,
    angle: i8,
    running: bool,
}

impl<W: SetDutyCycle> Servo<W> {
    /// Servo on `pwm`, stopped at 0°.
    pub fn new(name: ServoName, pwm: W) -> Self {
        Self {
            name,
            pwm,
            angle: 0,
            running: false,
        }
    }

    /// Hold the output low until [`Servo::start`].
    pub fn init(&mut self) -> Result<()> {
        self.stop()
    }

    /// Turn to `angle` degrees. While stopped the angle is only remembered.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] outside ±[`MAX_ANGLE`].
    pub fn set_angle(&mut self, angle: i8) -> Result<()> {
        let pulse = pulse_us(angle)?;
        if self.running {
            self.apply(pulse)?;
        }
        self.angle = angle;
        platform::debug!("servo angle {}", angle);
        Ok(())
    }

    /// Start emitting pulses for the current angle.
    pub fn start(&mut self) -> Result<()> {
        self.apply(pulse_us(self.angle)?)?;
        self.running = true;
        Ok(())
    }

    /// Stop pulsing; the horn is no longer held.
    pub fn stop(&mut self) -> Result<()> {
        self.pwm.set_duty_cycle_fully_off().map_err(|_| Error::Io)?;
        self.running = false;
        Ok(())
    }

    /// Last commanded angle.
    pub fn angle(&self) -> i8 {
        self.angle
    }

    /// `true` while pulses are emitted.
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn apply(&mut self, pulse: u16) -> Result<()> {
        self.pwm
            .set_duty_cycle_fraction(pulse, PERIOD_US)
            .map_err(|_| Error::Io)
    }
}

impl<W> Named for Servo<W> {
    type Name = ServoName;

    fn name(&self) -> ServoName {
        self.name
    }
}

/// High time for `angle`: `1500 + angle × 1000 / 90` µs.
///
/// # Errors
///
/// [`Error::InvalidArgument`] outside ±[`MAX_ANGLE`].
pub fn pulse_us(angle: i8) -> Result<u16> {
    if !(-MAX_ANGLE..=MAX_ANGLE).contains(&angle) {
        return Err(Error::InvalidArgument);
    }
    let offset = i32::from(angle).saturating_mul(1000) / 90;
    i32::from(CENTER_PULSE_US)
        .checked_add(offset)
        .and_then(|pulse| u16::try_from(pulse).ok())
        .ok_or(Error::InvalidArgument)
}
