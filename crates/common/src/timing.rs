//! Busy-poll timing on a hardware counter.
//!
//! There is no scheduler to yield to, so every wait here spins on a
//! [`CounterTimer`] and measures time by wrapping subtraction. Timeouts are
//! the expected outcome of a wait; counter and pin failures propagate
//! immediately.

use embedded_hal::digital::InputPin;
use platform::gpio::read_level;
use platform::{elapsed, CounterTimer, Error, PinLevel, Result};

/// Spin for `count` periods of `unit_us` microseconds on `timer`.
///
/// The counter is reconfigured, restarted from zero and stopped again when
/// the delay completes. Intended for a wide (32-bit) counter reserved for
/// delays.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `unit_us` is zero, or if `count` ticks
/// do not fit the counter once it restarts from zero. In that case the
/// timer is left untouched.
pub fn delay<T: CounterTimer>(timer: &mut T, unit_us: u32, count: u32) -> Result<()> {
    let max = timer.max_count();
    if unit_us == 0 || count > max {
        return Err(Error::InvalidArgument);
    }

    if timer.is_running()? {
        timer.stop()?;
    }
    timer.set_period_us(unit_us)?;
    timer.start()?;

    let start = timer.count()?;
    while elapsed(start, timer.count()?, max) < count {}

    timer.stop()
}

/// Spin for `us` microseconds.
pub fn delay_us<T: CounterTimer>(timer: &mut T, us: u32) -> Result<()> {
    delay(timer, 1, us)
}

/// Spin for `ms` milliseconds.
pub fn delay_ms<T: CounterTimer>(timer: &mut T, ms: u32) -> Result<()> {
    delay(timer, 1000, ms)
}

/// Spin for `s` seconds. Needs a counter whose period can be set to 1 s.
pub fn delay_s<T: CounterTimer>(timer: &mut T, s: u32) -> Result<()> {
    delay(timer, 1_000_000, s)
}

/// Spin until `pin` reads `target`, returning the ticks it took.
///
/// `timer` must already be running; only the low 16 bits of its count are
/// used, so waits must stay well under one 16-bit period.
///
/// # Errors
///
/// [`Error::TimedOut`] once `timeout` ticks pass without the level being
/// seen; [`Error::Io`] if the pin cannot be read.
#[allow(clippy::cast_possible_truncation)] // Safety: deliberate 16-bit truncation of the tick register
pub fn wait_until_pin_is<P, T>(
    pin: &mut P,
    timer: &T,
    target: PinLevel,
    timeout: u16,
) -> Result<u16>
where
    P: InputPin,
    T: CounterTimer,
{
    let first = timer.count()? as u16;
    loop {
        let level = read_level(pin)?;
        let now = timer.count()? as u16;
        let taken = now.wrapping_sub(first);
        if level == target {
            return Ok(taken);
        }
        if taken >= timeout {
            return Err(Error::TimedOut);
        }
    }
}
