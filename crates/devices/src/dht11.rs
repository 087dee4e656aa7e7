//! DHT11 humidity/temperature sensor.
//!
//! Single-wire, bit-banged protocol. The host pulls the line low for 20 ms,
//! releases it, and the sensor answers with a low/high handshake followed
//! by 40 bits. Each bit starts low and its high phase encodes the value:
//! ~27 µs for 0, ~70 µs for 1, MSB first.
//!
//! ```text
//! host:   ‾‾‾|___ 20 ms ___|‾‾
//! sensor:                     |_80_|‾80‾|_50_|‾27/70‾|_50_|‾…‾| … |_50_|‾‾
//! ```

use common::registry::Named;
use common::timing::{delay_ms, wait_until_pin_is};
use embedded_hal::digital::{InputPin, OutputPin};
use platform::gpio::write_level;
use platform::{CounterTimer, Error, PinLevel, Result};

const START_PULSE_MS: u32 = 20;
const HANDSHAKE_TIMEOUT_US: u16 = 100;
const BIT_TIMEOUT_US: u16 = 100;
const RELEASE_TIMEOUT_US: u16 = 60;
/// High phases at least this long are a 1.
const ONE_THRESHOLD_US: u16 = 50;

/// DHT11 sensors on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dht11Name {
    /// Humidity/temperature sensor.
    Sensor1,
}

/// One validated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dht11Reading {
    /// Relative humidity, integer part (%).
    pub humidity: u8,
    /// Relative humidity, decimal part.
    pub humidity_decimal: u8,
    /// Temperature, integer part (°C).
    pub temperature: u8,
    /// Temperature, decimal part.
    pub temperature_decimal: u8,
}

impl Dht11Reading {
    fn from_frame(frame: [u8; 5]) -> Result<Self> {
        let [h, hd, t, td, checksum] = frame;
        let sum = h.wrapping_add(hd).wrapping_add(t).wrapping_add(td);
        if sum != checksum {
            return Err(Error::Io);
        }
        Ok(Self {
            humidity: h,
            humidity_decimal: hd,
            temperature: t,
            temperature_decimal: td,
        })
    }
}

/// DHT11 on an open-drain `pin`, timed by a 1 µs `timer`.
pub struct Dht11<P, T> {
    name: Dht11Name,
    pin: P,
    timer: T,
}

impl<P, T> Dht11<P, T>
where
    P: InputPin + OutputPin,
    T: CounterTimer,
{
    /// Sensor on an open-drain data `pin`, timed by a 1 µs `timer`.
    pub fn new(name: Dht11Name, pin: P, timer: T) -> Self {
        Self { name, pin, timer }
    }

    /// Start the microsecond counter and release the bus.
    pub fn init(&mut self) -> Result<()> {
        if self.timer.is_running()? {
            self.timer.stop()?;
        }
        self.timer.set_period_us(1)?;
        self.timer.start()?;
        write_level(&mut self.pin, PinLevel::High)
    }

    /// Take one measurement.
    ///
    /// `delay_timer` times the 20 ms start pulse (the shared delay counter).
    ///
    /// # Errors
    ///
    /// [`Error::TimedOut`] if the sensor stops answering; [`Error::Io`] on a
    /// checksum mismatch.
    pub fn read<D: CounterTimer>(&mut self, delay_timer: &mut D) -> Result<Dht11Reading> {
        write_level(&mut self.pin, PinLevel::Low)?;
        delay_ms(delay_timer, START_PULSE_MS)?;
        write_level(&mut self.pin, PinLevel::High)?;

        self.wait(PinLevel::Low, HANDSHAKE_TIMEOUT_US)?;
        self.wait(PinLevel::High, HANDSHAKE_TIMEOUT_US)?;
        self.wait(PinLevel::Low, HANDSHAKE_TIMEOUT_US)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for bit in (0..8).rev() {
                self.wait(PinLevel::High, BIT_TIMEOUT_US)?;
                let high_us = self.wait(PinLevel::Low, BIT_TIMEOUT_US)?;
                if high_us >= ONE_THRESHOLD_US {
                    *byte |= 1 << bit;
                }
            }
        }

        self.wait(PinLevel::High, RELEASE_TIMEOUT_US)?;

        let reading = Dht11Reading::from_frame(frame);
        if reading.is_err() {
            platform::warn!("dht11 checksum mismatch");
        }
        reading
    }

    fn wait(&mut self, level: PinLevel, timeout_us: u16) -> Result<u16> {
        wait_until_pin_is(&mut self.pin, &self.timer, level, timeout_us)
    }
}

impl<P, T> Named for Dht11<P, T> {
    type Name = Dht11Name;

    fn name(&self) -> Dht11Name {
        self.name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{Arm, SimClock, SimTimer, WaveformPin};

    /// Sensor answer to a start pulse, as (µs, level) segments.
    fn answer(frame: [u8; 5]) -> Vec<(u64, PinLevel)> {
        let mut wave = vec![
            (20, PinLevel::High),
            (80, PinLevel::Low),
            (80, PinLevel::High),
        ];
        for byte in frame {
            for bit in (0..8).rev() {
                wave.push((50, PinLevel::Low));
                let high = if byte & (1 << bit) != 0 { 70 } else { 27 };
                wave.push((high, PinLevel::High));
            }
        }
        wave.push((50, PinLevel::Low));
        wave
    }

    fn sensor(clock: &SimClock) -> (Dht11<WaveformPin, SimTimer>, WaveformPin) {
        let pin = WaveformPin::new(clock.clone(), PinLevel::High);
        let mut dht = Dht11::new(
            Dht11Name::Sensor1,
            pin.clone(),
            SimTimer::with_max_count(clock.clone(), 0xFFFF),
        );
        dht.init().unwrap();
        (dht, pin)
    }

    #[test]
    fn decodes_a_valid_frame() {
        let clock = SimClock::new();
        let (mut dht, pin) = sensor(&clock);
        pin.arm(Arm::OnWrite(PinLevel::High), &answer([55, 0, 24, 3, 82]));

        let mut delay = SimTimer::new(clock);
        let reading = dht.read(&mut delay).unwrap();
        assert_eq!(
            reading,
            Dht11Reading {
                humidity: 55,
                humidity_decimal: 0,
                temperature: 24,
                temperature_decimal: 3,
            }
        );
        assert_eq!(
            pin.writes(),
            vec![PinLevel::High, PinLevel::Low, PinLevel::High]
        );
    }

    #[test]
    fn checksum_mismatch_is_io_error() {
        let clock = SimClock::new();
        let (mut dht, pin) = sensor(&clock);
        pin.arm(Arm::OnWrite(PinLevel::High), &answer([55, 0, 24, 3, 99]));

        let mut delay = SimTimer::new(clock);
        assert_eq!(dht.read(&mut delay), Err(Error::Io));
    }

    #[test]
    fn silent_sensor_times_out() {
        let clock = SimClock::new();
        let (mut dht, _pin) = sensor(&clock);
        let mut delay = SimTimer::new(clock);
        assert_eq!(dht.read(&mut delay), Err(Error::TimedOut));
    }
}
