//! Analog inputs sampled by a polled ADC.

use common::registry::Named;
use platform::{AdcDriver, Error, Result, SampleTime};

/// Longest wait for one conversion.
const CONVERSION_TIMEOUT_MS: u32 = 100;

/// Analog inputs on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcName {
    /// Photoresistor divider.
    Light,
    /// Battery voltage divider.
    Power,
}

/// One ADC channel.
pub struct Adc<D> {
    name: AdcName,
    driver: D,
    channel: u8,
    sample_time: SampleTime,
}

impl<D: AdcDriver> Adc<D> {
    /// Input on `channel` of `driver`.
    pub fn new(name: AdcName, driver: D, channel: u8, sample_time: SampleTime) -> Self {
        Self {
            name,
            driver,
            channel,
            sample_time,
        }
    }

    /// Leave the converter stopped.
    pub fn init(&mut self) -> Result<()> {
        self.driver.stop()
    }

    /// Fill `out` with consecutive conversions.
    ///
    /// The converter is stopped again whether or not every conversion
    /// succeeded.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty `out`; [`Error::TimedOut`]
    /// if a conversion does not finish in time.
    pub fn read(&mut self, out: &mut [u16]) -> Result<()> {
        if out.is_empty() {
            return Err(Error::InvalidArgument);
        }
        self.driver.configure_channel(self.channel, self.sample_time)?;
        self.driver.start()?;
        let sampled = self.sample(out);
        let stopped = self.driver.stop();
        sampled?;
        stopped
    }

    /// Single conversion.
    pub fn read_one(&mut self) -> Result<u16> {
        let mut value = [0u16];
        self.read(&mut value)?;
        let [sample] = value;
        Ok(sample)
    }

    fn sample(&mut self, out: &mut [u16]) -> Result<()> {
        for slot in out.iter_mut() {
            self.driver.poll(CONVERSION_TIMEOUT_MS)?;
            *slot = self.driver.value()?;
        }
        Ok(())
    }
}

impl<D> Named for Adc<D> {
    type Name = AdcName;

    fn name(&self) -> AdcName {
        self.name
    }
}
