//! Battery-backed real-time clock.
//!
//! Backup register 0 records that the calendar has been set, so a warm
//! reset (or a reset with the backup battery fitted) keeps the running time
//! instead of reloading the default.

use common::registry::Named;
use platform::{DateTime, Error, Result, RtcDriver};

/// Backup register holding [`CALENDAR_SET`].
const CALENDAR_FLAG_REGISTER: u8 = 0;
/// Value of the flag register once the calendar is valid.
pub const CALENDAR_SET: u32 = 0x1234;

/// Real-time clocks on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcName {
    /// On-chip RTC.
    Rtc1,
}

/// Calendar on an [`RtcDriver`].
pub struct Rtc<D> {
    name: RtcName,
    driver: D,
}

impl<D: RtcDriver> Rtc<D> {
    /// Clock on `driver`.
    pub fn new(name: RtcName, driver: D) -> Self {
        Self { name, driver }
    }

    /// Load `default` unless the calendar was already set.
    pub fn init(&mut self, default: &DateTime) -> Result<()> {
        if self.driver.backup_register(CALENDAR_FLAG_REGISTER)? == CALENDAR_SET {
            return Ok(());
        }
        platform::info!("rtc calendar not set, loading default");
        self.set_date_time(default)
    }

    /// Current date and time.
    pub fn date_time(&mut self) -> Result<DateTime> {
        self.driver.date_time()
    }

    /// Set the calendar and mark it valid.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if any field is out of range.
    pub fn set_date_time(&mut self, date_time: &DateTime) -> Result<()> {
        if !is_valid(date_time) {
            return Err(Error::InvalidArgument);
        }
        self.driver.set_date_time(date_time)?;
        self.driver
            .set_backup_register(CALENDAR_FLAG_REGISTER, CALENDAR_SET)
    }
}

impl<D> Named for Rtc<D> {
    type Name = RtcName;

    fn name(&self) -> RtcName {
        self.name
    }
}

fn is_valid(dt: &DateTime) -> bool {
    dt.year <= 99
        && (1..=12).contains(&dt.month)
        && (1..=31).contains(&dt.day)
        && (1..=7).contains(&dt.weekday)
        && dt.hour < 24
        && dt.minute < 60
        && dt.second < 60
}
