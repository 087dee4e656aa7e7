//! Named digital lines (LEDs, discrete inputs).

use common::registry::Named;
use embedded_hal::digital::{InputPin, OutputPin};
use platform::gpio::{read_level, write_level};
use platform::{PinLevel, Result};

/// GPIO lines on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioName {
    /// Status LED 1.
    Led1,
    /// Status LED 2.
    Led2,
    /// Status LED 3.
    Led3,
    /// Status LED 4.
    Led4,
    /// Push button 1.
    Key1,
    /// Push button 2.
    Key2,
    /// Push button 3.
    Key3,
    /// Push button 4.
    Key4,
}

/// A named digital line.
pub struct GpioLine<P> {
    name: GpioName,
    pin: P,
}

impl<P> GpioLine<P> {
    /// Line named `name` on `pin`.
    pub fn new(name: GpioName, pin: P) -> Self {
        Self { name, pin }
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> GpioLine<P> {
    /// Current level of the line.
    pub fn read(&mut self) -> Result<PinLevel> {
        read_level(&mut self.pin)
    }
}

impl<P: OutputPin> GpioLine<P> {
    /// Drive the line.
    pub fn write(&mut self, level: PinLevel) -> Result<()> {
        write_level(&mut self.pin, level)
    }
}

impl<P: InputPin + OutputPin> GpioLine<P> {
    /// Drive the line to the opposite of its current level.
    pub fn toggle(&mut self) -> Result<PinLevel> {
        let next = self.read()?.inverted();
        self.write(next)?;
        Ok(next)
    }
}

impl<P> Named for GpioLine<P> {
    type Name = GpioName;

    fn name(&self) -> GpioName {
        self.name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use common::registry::{Node, Registry};
    use core::cell::RefCell;
    use platform::mocks::{SimClock, WaveformPin};

    #[test]
    fn toggle_flips_the_line() {
        let pin = WaveformPin::new(SimClock::new(), PinLevel::Low);
        let mut led = GpioLine::new(GpioName::Led1, pin.clone());
        assert_eq!(led.toggle().unwrap(), PinLevel::High);
        assert_eq!(led.read().unwrap(), PinLevel::High);
        assert_eq!(led.toggle().unwrap(), PinLevel::Low);
        assert_eq!(pin.writes(), vec![PinLevel::High, PinLevel::Low]);
    }

    #[test]
    fn lines_are_found_by_name() {
        let clock = SimClock::new();
        let led1 = RefCell::new(GpioLine::new(GpioName::Led1, WaveformPin::new(clock.clone(), PinLevel::Low)));
        let led2 = RefCell::new(GpioLine::new(GpioName::Led2, WaveformPin::new(clock, PinLevel::Low)));
        let (n1, n2) = (
            Node::with_name(GpioName::Led1, &led1),
            Node::with_name(GpioName::Led2, &led2),
        );
        let lines = Registry::new();
        lines.register(&n1).unwrap();
        lines.register(&n2).unwrap();

        let line = lines.find_by_name(GpioName::Led2).unwrap();
        line.borrow_mut().write(PinLevel::High).unwrap();
        assert_eq!(led2.borrow_mut().read().unwrap(), PinLevel::High);
        assert!(lines.find_by_name(GpioName::Key1).is_err());
    }
}
