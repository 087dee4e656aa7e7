//! DC motor on an H-bridge.
//!
//! `in1`/`in2` select the direction, the PWM duty sets the speed.
//!
//! | in1 | in2 | Motion |
//! |-----|-----|--------|
//! | 0 | 0 | stop (coast) |
//! | 1 | 0 | forward |
//! | 0 | 1 | backward |

use common::registry::Named;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use platform::gpio::write_level;
use platform::{Error, PinLevel, Result};

/// Highest accepted speed, in percent of full duty.
pub const MAX_SPEED: u8 = 100;

/// Drive motors, one per wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorName {
    /// Front left wheel.
    HeadLeft,
    /// Front right wheel.
    HeadRight,
    /// Rear left wheel.
    TailLeft,
    /// Rear right wheel.
    TailRight,
}

/// Current motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorStatus {
    /// Bridge released.
    Stopped,
    /// Driving forward.
    Forward,
    /// Driving backward.
    Backward,
}

/// DC motor on an H-bridge.
pub struct Motor<A, B, W> {
    name: MotorName,
    in1: A,
    in2: B,
    pwm: W,
    status: MotorStatus,
    speed: u8,
}

impl<A, B, W> Motor<A, B, W>
where
    A: OutputPin,
    B: OutputPin,
    W: SetDutyCycle,
{
    /// Motor on bridge inputs `in1`/`in2` with speed set by `pwm`.
    pub fn new(name: MotorName, in1: A, in2: B, pwm: W) -> Self {
        Self {
            name,
            in1,
            in2,
            pwm,
            status: MotorStatus::Stopped,
            speed: 0,
        }
    }

    /// Put the bridge in the stopped state.
    pub fn init(&mut self) -> Result<()> {
        self.stop()
    }

    /// Release both bridge inputs and zero the duty.
    pub fn stop(&mut self) -> Result<()> {
        self.drive(PinLevel::Low, PinLevel::Low, 0)?;
        self.status = MotorStatus::Stopped;
        Ok(())
    }

    /// Spin forward at `speed` percent.
    pub fn forward(&mut self, speed: u8) -> Result<()> {
        self.drive(PinLevel::High, PinLevel::Low, speed)?;
        self.status = MotorStatus::Forward;
        Ok(())
    }

    /// Spin backward at `speed` percent.
    pub fn backward(&mut self, speed: u8) -> Result<()> {
        self.drive(PinLevel::Low, PinLevel::High, speed)?;
        self.status = MotorStatus::Backward;
        Ok(())
    }

    /// Current motion.
    pub fn status(&self) -> MotorStatus {
        self.status
    }

    /// Last commanded speed, in percent.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    fn drive(&mut self, in1: PinLevel, in2: PinLevel, speed: u8) -> Result<()> {
        if speed > MAX_SPEED {
            return Err(Error::InvalidArgument);
        }
        self.pwm.set_duty_cycle_percent(speed).map_err(|_| Error::Io)?;
        write_level(&mut self.in1, in1)?;
        write_level(&mut self.in2, in2)?;
        self.speed = speed;
        platform::debug!("motor speed {}%", speed);
        Ok(())
    }
}

impl<A, B, W> Named for Motor<A, B, W> {
    type Name = MotorName;

    fn name(&self) -> MotorName {
        self.name
    }
}
