//! Seven-sensor reflective line tracker.
//!
//! Sensor 0 is leftmost. A sensor reads high while it sees the line.

use common::registry::Named;
use embedded_hal::digital::InputPin;
use platform::gpio::read_level;
use platform::{PinLevel, Result};

/// Number of sensors on the tracker board.
pub const SENSOR_COUNT: usize = 7;

/// Line trackers on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerName {
    /// Line sensor bar under the chassis.
    Tracker1,
}

/// Reflective line sensors, index 0 leftmost.
pub struct Tracker<P> {
    name: TrackerName,
    sensors: [P; SENSOR_COUNT],
}

impl<P: InputPin> Tracker<P> {
    /// Tracker over `sensors`, leftmost first.
    pub fn new(name: TrackerName, sensors: [P; SENSOR_COUNT]) -> Self {
        Self { name, sensors }
    }

    /// Bit `i` set when sensor `i` sees the line.
    pub fn read_mask(&mut self) -> Result<u8> {
        let mut mask = 0u8;
        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            if read_level(sensor)? == PinLevel::High {
                mask |= 1 << i;
            }
        }
        Ok(mask)
    }

    /// Position of the line's centre, 0 (left) to 6 (right), or `None` when
    /// no sensor sees it.
    pub fn line_center(&mut self) -> Result<Option<u8>> {
        Ok(center_of(self.read_mask()?))
    }
}

impl<P> Named for Tracker<P> {
    type Name = TrackerName;

    fn name(&self) -> TrackerName {
        self.name
    }
}

/// Midpoint of the outermost set bits of `mask`.
#[allow(clippy::cast_possible_truncation)] // Safety: bit indices of a u8 are < 8
fn center_of(mask: u8) -> Option<u8> {
    if mask == 0 {
        return None;
    }
    let left = mask.trailing_zeros() as u8;
    let right = 7u8.saturating_sub(mask.leading_zeros() as u8);
    Some(left.saturating_add(right.saturating_sub(left) / 2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn sensors(levels: [State; SENSOR_COUNT]) -> [PinMock; SENSOR_COUNT] {
        levels.map(|s| PinMock::new(&[Transaction::get(s)]))
    }

    #[test]
    fn reports_centre_of_the_line() {
        use State::{High as H, Low as L};
        let mut tracker = Tracker::new(TrackerName::Tracker1, sensors([L, L, H, H, H, L, L]));
        assert_eq!(tracker.line_center().unwrap(), Some(3));
        for s in &mut tracker.sensors {
            s.done();
        }
    }

    #[test]
    fn no_line_is_none() {
        let mut tracker = Tracker::new(TrackerName::Tracker1, sensors([State::Low; SENSOR_COUNT]));
        assert_eq!(tracker.line_center().unwrap(), None);
        for s in &mut tracker.sensors {
            s.done();
        }
    }

    #[test]
    fn centre_uses_outermost_sensors() {
        assert_eq!(center_of(0b000_0001), Some(0));
        assert_eq!(center_of(0b100_0000), Some(6));
        assert_eq!(center_of(0b100_0001), Some(3));
        assert_eq!(center_of(0b000_0110), Some(1));
    }
}
