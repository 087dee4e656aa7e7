//! Hardware Abstraction Layer (HAL) contracts for the robot test rig
//!
//! This crate provides the trait-based seams every other crate builds on,
//! enabling development and testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Modem / application layer (wireless)
//!         ↓
//! Device layer (devices: serial, DHT11, IR, ultrasonic, ...)
//!         ↓
//! Core primitives (common: registry, ring buffer, timed wait)
//!         ↓
//! Platform HAL (this crate - traits, errors, config)
//!         ↓
//! Hardware Layer (STM32F4 HAL drivers)
//! ```
//!
//! # Contracts
//!
//! - [`Transport`] - byte stream to a co-processor (USART)
//! - [`UartDriver`] - interrupt-mode raw UART driver
//! - [`AdcDriver`], [`DacDriver`], [`RtcDriver`] - polled analog and calendar
//!   peripherals
//! - [`CounterTimer`] - free-running hardware counter / tick source
//! - [`PinLevel`] - digital level; pins themselves use `embedded_hal::digital`
//!
//! # Features
//!
//! - `std`: host mocks in [`mocks`] (for testing)
//! - `defmt`: `defmt::Format` derives and defmt-backed logging
//! - `tracing`: tracing-backed logging for host simulation

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod config;
pub mod error;
pub mod gpio;
pub mod log;
pub mod peripheral;
pub mod timer;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use error::{Error, Result};
pub use gpio::PinLevel;
pub use peripheral::{AdcDriver, DacDriver, DateTime, RtcDriver, SampleTime, Transport, UartDriver};
pub use timer::{elapsed, CounterTimer};
