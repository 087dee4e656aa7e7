//! HC-SR04 ultrasonic ranger.
//!
//! A 10 µs trigger pulse fires a burst; the echo line then stays high for
//! the round-trip time of flight. Distance in mm is `echo_us × 343 / 2000`
//! (speed of sound 343 m/s, halved for the round trip).

use common::registry::Named;
use common::timing::wait_until_pin_is;
use embedded_hal::digital::{InputPin, OutputPin};
use platform::gpio::write_level;
use platform::{elapsed, CounterTimer, PinLevel, Result};

const TRIGGER_US: u32 = 10;
/// Longest wait for the echo to start after the trigger.
const ECHO_START_TIMEOUT_US: u16 = 5_000;
/// Longest echo (no obstacle in range).
const ECHO_MAX_US: u16 = 38_000;

/// Ultrasonic rangers on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UltrasonicName {
    /// Forward-facing ranger.
    Front,
}

/// HC-SR04 on a trigger output and an echo input, timed by a 1 µs counter.
pub struct Ultrasonic<Tr, E, T> {
    name: UltrasonicName,
    trig: Tr,
    echo: E,
    timer: T,
}

impl<Tr, E, T> Ultrasonic<Tr, E, T>
where
    Tr: OutputPin,
    E: InputPin,
    T: CounterTimer,
{
    /// Ranger on `trig`/`echo`, timed by a dedicated `timer`.
    pub fn new(name: UltrasonicName, trig: Tr, echo: E, timer: T) -> Self {
        Self {
            name,
            trig,
            echo,
            timer,
        }
    }

    /// Idle the trigger and start the microsecond counter.
    pub fn init(&mut self) -> Result<()> {
        if self.timer.is_running()? {
            self.timer.stop()?;
        }
        self.timer.set_period_us(1)?;
        self.timer.start()?;
        write_level(&mut self.trig, PinLevel::Low)
    }

    /// Measure the distance to the nearest obstacle, in millimetres.
    ///
    /// # Errors
    ///
    /// [`Error::TimedOut`](platform::Error::TimedOut) if the echo never
    /// starts or exceeds the sensor's range.
    pub fn read_mm(&mut self) -> Result<u32> {
        write_level(&mut self.trig, PinLevel::High)?;
        let max = self.timer.max_count();
        let start = self.timer.count()?;
        while elapsed(start, self.timer.count()?, max) < TRIGGER_US {}
        write_level(&mut self.trig, PinLevel::Low)?;

        wait_until_pin_is(&mut self.echo, &self.timer, PinLevel::High, ECHO_START_TIMEOUT_US)?;
        let echo_us = wait_until_pin_is(&mut self.echo, &self.timer, PinLevel::Low, ECHO_MAX_US)?;
        Ok(distance_mm(echo_us))
    }
}

impl<Tr, E, T> Named for Ultrasonic<Tr, E, T> {
    type Name = UltrasonicName;

    fn name(&self) -> UltrasonicName {
        self.name
    }
}

/// Millimetres for an echo of `echo_us`.
pub fn distance_mm(echo_us: u16) -> u32 {
    // u16 × 343 fits u32
    u32::from(echo_us).saturating_mul(343) / 2000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{Arm, SimClock, SimTimer, WaveformPin};
    use platform::Error;

    fn ranger(clock: &SimClock) -> (Ultrasonic<WaveformPin, WaveformPin, SimTimer>, WaveformPin, WaveformPin) {
        let trig = WaveformPin::new(clock.clone(), PinLevel::Low);
        let echo = WaveformPin::new(clock.clone(), PinLevel::Low);
        let mut sonar = Ultrasonic::new(
            UltrasonicName::Front,
            trig.clone(),
            echo.clone(),
            SimTimer::with_max_count(clock.clone(), 0xFFFF),
        );
        sonar.init().unwrap();
        (sonar, trig, echo)
    }

    #[test]
    fn echo_width_converts_to_millimetres() {
        let clock = SimClock::new();
        let (mut sonar, trig, echo) = ranger(&clock);
        echo.arm(Arm::OnFirstRead, &[(200, PinLevel::Low), (580, PinLevel::High)]);

        let mm = sonar.read_mm().unwrap();
        assert!((98..=100).contains(&mm), "got {mm} mm");
        assert_eq!(
            trig.writes(),
            vec![PinLevel::Low, PinLevel::High, PinLevel::Low]
        );
    }

    #[test]
    fn missing_echo_times_out() {
        let clock = SimClock::new();
        let (mut sonar, _trig, _echo) = ranger(&clock);
        assert_eq!(sonar.read_mm(), Err(Error::TimedOut));
    }

    #[test]
    fn conversion_matches_speed_of_sound() {
        assert_eq!(distance_mm(0), 0);
        assert_eq!(distance_mm(2000), 343);
        assert_eq!(distance_mm(5831), 1000);
    }
}
