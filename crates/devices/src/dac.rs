//! Analog output: a held level or a DMA-streamed waveform.
//!
//! In wave mode a trigger timer paces the DMA, one sample per timer period.
//! Either mode must be [`Dac::reset`] before switching to the other.

use common::registry::Named;
use platform::{CounterTimer, DacDriver, Error, Result};

/// Largest 12-bit output code.
pub const MAX_CODE: u16 = 0x0FFF;

/// Analog outputs on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacName {
    /// LED brightness.
    Light,
}

/// What the output is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacMode {
    /// Disabled.
    Idle,
    /// Holding one level.
    Point,
    /// Streaming a waveform.
    Wave,
}

/// One DAC channel with its trigger timer.
pub struct Dac<D, T> {
    name: DacName,
    driver: D,
    trigger: T,
    mode: DacMode,
}

impl<D, T> Dac<D, T>
where
    D: DacDriver,
    T: CounterTimer,
{
    /// Channel on `driver`, paced by `trigger` in wave mode.
    pub fn new(name: DacName, driver: D, trigger: T) -> Self {
        Self {
            name,
            driver,
            trigger,
            mode: DacMode::Idle,
        }
    }

    /// Stop the trigger timer and leave the output idle.
    pub fn init(&mut self) -> Result<()> {
        if self.trigger.is_running()? {
            self.trigger.stop()?;
        }
        self.mode = DacMode::Idle;
        Ok(())
    }

    /// Hold the output at `code`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] above [`MAX_CODE`]; [`Error::Busy`]
    /// unless idle.
    pub fn set_point(&mut self, code: u16) -> Result<()> {
        if code > MAX_CODE {
            return Err(Error::InvalidArgument);
        }
        self.ensure_idle()?;
        self.driver.set_value(code)?;
        self.driver.start()?;
        self.mode = DacMode::Point;
        Ok(())
    }

    /// Loop `points`, advancing one sample every `refresh_us`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty waveform, a zero refresh
    /// interval or a sample above [`MAX_CODE`]; [`Error::Busy`] unless idle.
    pub fn set_wave(&mut self, points: &'static [u16], refresh_us: u32) -> Result<()> {
        if points.is_empty() || refresh_us == 0 || points.iter().any(|&p| p > MAX_CODE) {
            return Err(Error::InvalidArgument);
        }
        self.ensure_idle()?;
        self.trigger.set_period_us(refresh_us)?;
        self.driver.start_wave(points)?;
        self.trigger.start()?;
        self.mode = DacMode::Wave;
        platform::debug!("dac wave: {} points every {} us", points.len(), refresh_us);
        Ok(())
    }

    /// Stop whatever is running and return to idle.
    pub fn reset(&mut self) -> Result<()> {
        match self.mode {
            DacMode::Idle => {}
            DacMode::Point => self.driver.stop()?,
            DacMode::Wave => {
                self.trigger.stop()?;
                self.driver.stop_wave()?;
            }
        }
        self.mode = DacMode::Idle;
        Ok(())
    }

    /// Current mode.
    pub fn mode(&self) -> DacMode {
        self.mode
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.mode {
            DacMode::Idle => Ok(()),
            _ => Err(Error::Busy),
        }
    }
}

impl<D, T> Named for Dac<D, T> {
    type Name = DacName;

    fn name(&self) -> DacName {
        self.name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{MockDac, SimClock, SimTimer};

    static RAMP: [u16; 4] = [0, 1024, 2048, 4095];

    fn dac() -> Dac<MockDac, SimTimer> {
        let mut dac = Dac::new(DacName::Light, MockDac::default(), SimTimer::new(SimClock::new()));
        dac.init().unwrap();
        dac
    }

    #[test]
    fn point_holds_the_level_until_reset() {
        let mut dac = dac();
        dac.set_point(2000).unwrap();
        assert_eq!(dac.mode(), DacMode::Point);
        assert_eq!(dac.driver.value, 2000);
        assert!(dac.driver.enabled);

        dac.reset().unwrap();
        assert_eq!(dac.mode(), DacMode::Idle);
        assert!(!dac.driver.enabled);
    }

    #[test]
    fn wave_paces_dma_with_the_trigger_timer() {
        let mut dac = dac();
        dac.set_wave(&RAMP, 20_000).unwrap();
        assert_eq!(dac.mode(), DacMode::Wave);
        assert_eq!(dac.driver.wave, Some(&RAMP[..]));
        assert_eq!(dac.trigger.period_us(), 20_000);
        assert!(dac.trigger.is_running().unwrap());

        dac.reset().unwrap();
        assert!(!dac.trigger.is_running().unwrap());
        assert_eq!(dac.driver.wave, None);
    }

    #[test]
    fn switching_modes_needs_a_reset() {
        let mut dac = dac();
        dac.set_point(10).unwrap();
        assert_eq!(dac.set_wave(&RAMP, 100), Err(Error::Busy));
        assert_eq!(dac.set_point(20), Err(Error::Busy));
        assert_eq!(dac.driver.value, 10);
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        static TOO_HIGH: [u16; 2] = [0, 0x1000];
        let mut dac = dac();
        assert_eq!(dac.set_point(0x1000), Err(Error::InvalidArgument));
        assert_eq!(dac.set_wave(&TOO_HIGH, 100), Err(Error::InvalidArgument));
        assert_eq!(dac.set_wave(&[], 100), Err(Error::InvalidArgument));
        assert_eq!(dac.set_wave(&RAMP, 0), Err(Error::InvalidArgument));
        assert_eq!(dac.mode(), DacMode::Idle);
    }
}
