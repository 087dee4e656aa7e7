//! Device layer for the robot test rig
//!
//! Stateful, protocol-aware devices built on the `platform` contracts and the
//! `common` primitives. Every device carries an enumerated name and can be
//! registered in a [`common::Registry`] for lookup at init.
//!
//! # Interrupt split
//!
//! Devices fed by interrupts keep their ISR-side state in a separate,
//! `&self`-accessible holder (`SerialState`, `KeyQueue`, `IrEdges`,
//! `PulseCounter`) that lives in a `static`. The interrupt glue calls the
//! holder's callback; the main loop owns the device and reads through it.
//!
//! | Device | Module | Protocol |
//! |--------|--------|----------|
//! | Serial port | [`serial`] | interrupt-mode UART, [`platform::Transport`] |
//! | GPIO line | [`gpio`] | digital read/write |
//! | Keyboard | [`keyboard`] | active-low EXTI keys |
//! | DHT11 | [`dht11`] | single-wire bit-banged, pulse width |
//! | IR receiver | [`irda`] | NEC remote, edge timestamps |
//! | Ultrasonic | [`ultrasonic`] | HC-SR04 trigger/echo |
//! | Line tracker | [`tracker`] | 7 reflective sensors |
//! | Speed sensor | [`speed`] | encoder pulse counting |
//! | DC motor | [`motor`] | H-bridge + PWM |
//! | Servo | [`servo`] | 50 Hz PWM pulse width |
//! | Analog input | [`adc`] | polled conversions |
//! | Analog output | [`dac`] | held level or timer-paced DMA wave |
//! | Real-time clock | [`rtc`] | calendar + backup register |
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]

pub mod adc;
pub mod dac;
pub mod dht11;
pub mod gpio;
pub mod irda;
pub mod keyboard;
pub mod motor;
pub mod rtc;
pub mod serial;
pub mod servo;
pub mod speed;
pub mod tracker;
pub mod ultrasonic;

pub use adc::{Adc, AdcName};
pub use dac::{Dac, DacMode, DacName};
pub use dht11::{Dht11, Dht11Name, Dht11Reading};
pub use gpio::{GpioLine, GpioName};
pub use irda::{IrEdges, IrName, IrReceiver, RemoteKey};
pub use keyboard::{KeyQueue, Keyboard, KeyboardName};
pub use motor::{Motor, MotorName, MotorStatus};
pub use rtc::{Rtc, RtcName};
pub use serial::{SerialName, SerialPort, SerialState};
pub use servo::{Servo, ServoName};
pub use speed::{PulseCounter, SpeedName, SpeedSensor};
pub use tracker::{Tracker, TrackerName};
pub use ultrasonic::{Ultrasonic, UltrasonicName};
