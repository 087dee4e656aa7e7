//! Wi-Fi/Bluetooth co-processor driven by text AT commands over a serial
//! [`Transport`](platform::Transport).
//!
//! - [`at`] - command encoding and the terminal-response matcher
//! - [`window`] - bounded receive window and caller output sink
//! - [`session`] - one command/response exchange with a deadline
//! - [`connections`] - port ↔ ConID table
//! - [`modem`] - the device: join an access point, open/use/close sockets
//!
//! This crate is `no_std` by default; it only uses `core` + `heapless`.

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]

pub mod at;
pub mod connections;
pub mod modem;
pub mod session;
pub mod window;

pub use at::{AtCommand, Disposition, Pattern, ReceiveMode, SocketKind};
pub use connections::ConnectionTable;
pub use modem::{Modem, ModemConfig, ModemName, Reply};
pub use session::Session;
pub use window::{OutputSink, OverflowPolicy, Window};
