//! Hardware counter abstraction
//!
//! A [`CounterTimer`] is a free-running counter that advances once per
//! configured period. It serves both as the millisecond tick source (period
//! 1000 µs) and as the microsecond register counter used by bit-banged
//! protocols.

use crate::Result;

/// Free-running hardware counter.
pub trait CounterTimer {
    /// Whether the counter is currently advancing.
    fn is_running(&self) -> Result<bool>;

    /// Reset the count to zero and start counting.
    fn start(&mut self) -> Result<()>;

    /// Stop counting. The count register keeps its value.
    fn stop(&mut self) -> Result<()>;

    /// Configure the counter to advance once every `us` microseconds.
    fn set_period_us(&mut self, us: u32) -> Result<()>;

    /// Current value of the count register.
    fn count(&self) -> Result<u32>;

    /// Largest value the count register can hold before wrapping to zero.
    ///
    /// `0xFFFF` for 16-bit timers, `0xFFFF_FFFF` for TIM2/TIM5.
    fn max_count(&self) -> u32 {
        u32::MAX
    }
}

impl<T: CounterTimer + ?Sized> CounterTimer for &mut T {
    fn is_running(&self) -> Result<bool> {
        (**self).is_running()
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn set_period_us(&mut self, us: u32) -> Result<()> {
        (**self).set_period_us(us)
    }

    fn count(&self) -> Result<u32> {
        (**self).count()
    }

    fn max_count(&self) -> u32 {
        (**self).max_count()
    }
}

/// Ticks elapsed from `start` to `now` on a counter that wraps after `max`.
///
/// Wraparound-safe as long as less than one full counter period has passed:
/// both operands are truncated to the counter width before subtracting.
#[must_use]
pub const fn elapsed(start: u32, now: u32, max: u32) -> u32 {
    now.wrapping_sub(start) & max
}
