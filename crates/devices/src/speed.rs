//! Wheel speed from an encoder disc (40 slots per revolution).

use core::sync::atomic::{AtomicU32, Ordering};

use common::registry::Named;
use platform::{elapsed, CounterTimer, Result};

const PULSES_PER_REV: f32 = 40.0;

/// Speed sensors, one per wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedName {
    /// Front left wheel encoder.
    HeadLeft,
    /// Front right wheel encoder.
    HeadRight,
    /// Rear left wheel encoder.
    TailLeft,
    /// Rear right wheel encoder.
    TailRight,
}

/// Encoder pulses counted by the EXTI interrupt.
pub struct PulseCounter {
    pulses: AtomicU32,
}

impl PulseCounter {
    /// Counter at zero.
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// EXTI callback.
    pub fn on_pulse(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    fn take(&self) -> u32 {
        self.pulses.swap(0, Ordering::Relaxed)
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Revolutions per second of one wheel, measured against a millisecond
/// tick.
pub struct SpeedSensor<'a, T> {
    name: SpeedName,
    pulses: &'a PulseCounter,
    timer: T,
    last_tick: u32,
}

impl<'a, T: CounterTimer> SpeedSensor<'a, T> {
    /// Sensor reading `pulses`, timed by a millisecond `timer`.
    pub fn new(name: SpeedName, pulses: &'a PulseCounter, timer: T) -> Self {
        Self {
            name,
            pulses,
            timer,
            last_tick: 0,
        }
    }

    /// Start the millisecond tick if needed and zero the measurement.
    pub fn init(&mut self) -> Result<()> {
        if !self.timer.is_running()? {
            self.timer.set_period_us(1000)?;
            self.timer.start()?;
        }
        self.pulses.take();
        self.last_tick = self.timer.count()?;
        Ok(())
    }

    /// Average speed since the previous call, in revolutions per second.
    ///
    /// Returns 0.0 when no time has passed.
    #[allow(clippy::cast_precision_loss)] // pulse and ms counts stay far below 2^24
    pub fn speed(&mut self) -> Result<f32> {
        let now = self.timer.count()?;
        let elapsed_ms = elapsed(self.last_tick, now, self.timer.max_count());
        let pulses = self.pulses.take();
        self.last_tick = now;
        if elapsed_ms == 0 {
            return Ok(0.0);
        }
        Ok(pulses as f32 * 1000.0 / PULSES_PER_REV / elapsed_ms as f32)
    }
}

impl<T> Named for SpeedSensor<'_, T> {
    type Name = SpeedName;

    fn name(&self) -> SpeedName {
        self.name
    }
}
