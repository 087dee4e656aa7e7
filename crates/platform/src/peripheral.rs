//! Peripheral abstraction layer
//!
//! Byte-stream contracts between the device layer and the raw UART driver,
//! and between the modem and whatever carries its bytes. The analog and
//! calendar drivers below are thin register-level seams for the ADC, DAC
//! and RTC devices.

use crate::Result;

/// Byte stream to a co-processor.
///
/// Supplied by the serial device; consumed by the AT-command modem.
pub trait Transport {
    /// Send every byte of `data`, returning once the hardware has taken it.
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Copy up to `buffer.len()` already-received bytes into `buffer`.
    ///
    /// Never blocks: returns `Ok(0)` when nothing is pending.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Discard every pending received byte.
    fn clear_receive_buffer(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize> {
        (**self).receive(buffer)
    }

    fn clear_receive_buffer(&mut self) -> Result<()> {
        (**self).clear_receive_buffer()
    }
}

/// Interrupt-mode UART driver.
///
/// Completion is reported back through the serial device's interrupt
/// callbacks (`on_transmit_complete`, `on_byte_received`), not through this
/// trait.
pub trait UartDriver {
    /// Start an interrupt-driven transmit of `data`.
    ///
    /// `data` must stay valid until the transmit-complete interrupt fires;
    /// the serial device guarantees this by waiting for completion and
    /// aborting the transfer when the wait times out.
    fn start_transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Cancel an in-flight transmit. No transmit-complete interrupt follows.
    fn abort_transmit(&mut self) -> Result<()>;

    /// Arm single-byte interrupt reception.
    fn start_receive(&mut self) -> Result<()>;

    /// Cancel any armed reception.
    fn abort_receive(&mut self) -> Result<()>;
}

/// ADC input channel sampling time, in ADC clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum SampleTime {
    Cycles3,
    Cycles15,
    Cycles28,
    Cycles56,
    Cycles84,
    Cycles112,
    Cycles144,
    Cycles480,
}

/// Polled single-channel ADC.
pub trait AdcDriver {
    /// Route `channel` to the converter as its only conversion.
    fn configure_channel(&mut self, channel: u8, sample_time: SampleTime) -> Result<()>;

    /// Start continuous conversion.
    fn start(&mut self) -> Result<()>;

    /// Wait up to `timeout_ms` for the next conversion to finish.
    fn poll(&mut self, timeout_ms: u32) -> Result<()>;

    /// Result of the last finished conversion.
    fn value(&mut self) -> Result<u16>;

    /// Stop converting.
    fn stop(&mut self) -> Result<()>;
}

/// One DAC output channel, 12-bit right-aligned.
pub trait DacDriver {
    /// Latch `value` into the output register.
    fn set_value(&mut self, value: u16) -> Result<()>;

    /// Enable the output.
    fn start(&mut self) -> Result<()>;

    /// Disable the output.
    fn stop(&mut self) -> Result<()>;

    /// Stream `points` by DMA, one sample per trigger-timer update, looping.
    ///
    /// The DMA reads `points` until [`DacDriver::stop_wave`], hence
    /// `'static`.
    fn start_wave(&mut self, points: &'static [u16]) -> Result<()>;

    /// Stop the DMA stream and disable the output.
    fn stop_wave(&mut self) -> Result<()>;
}

/// Calendar date and wall-clock time as kept by the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Years since 2000.
    pub year: u8,
    /// 1–12.
    pub month: u8,
    /// 1–31.
    pub day: u8,
    /// 1 (Monday) – 7 (Sunday).
    pub weekday: u8,
    /// 0–23.
    pub hour: u8,
    /// 0–59.
    pub minute: u8,
    /// 0–59.
    pub second: u8,
}

/// Battery-backed real-time clock with backup registers.
pub trait RtcDriver {
    /// Current date and time.
    fn date_time(&mut self) -> Result<DateTime>;

    /// Set the calendar.
    fn set_date_time(&mut self, date_time: &DateTime) -> Result<()>;

    /// Read backup register `index`.
    fn backup_register(&mut self, index: u8) -> Result<u32>;

    /// Write backup register `index`.
    fn set_backup_register(&mut self, index: u8, value: u32) -> Result<()>;
}
