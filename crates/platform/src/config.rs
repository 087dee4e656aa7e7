//! Firmware configuration and constants
//!
//! Central buffer sizes, timeouts and protocol bounds used across the
//! workspace. Every layer references these constants rather than hardcoding
//! values.

// ── Serial ──────────────────────────────────────────────────────────────────

/// Receive ring capacity of every serial port, in bytes.
pub const SERIAL_RX_BUFFER_SIZE: usize = 255;

/// Longest wait for the transmit-complete interrupt.
pub const TX_COMPLETE_TIMEOUT_MS: u32 = 1000;

// ── Input devices ───────────────────────────────────────────────────────────

/// Pending key presses held by the keyboard before new ones are dropped.
pub const KEYBOARD_BUFFER_SIZE: usize = 50;

/// IR edge timestamp ring capacity in bytes (256 × `u32`).
pub const IR_EDGE_BUFFER_SIZE: usize = 256 * 4;

/// IR receiver tick period. The NEC protocol's smallest unit is 560 µs, so
/// 10 µs resolution is ample.
pub const IR_TICK_US: u32 = 10;

/// Longest wait for the next IR edge, in IR ticks (1 s).
pub const IR_EDGE_TIMEOUT_TICKS: u32 = 100_000;

// ── AT-command modem ────────────────────────────────────────────────────────

/// Receive window of one AT-command exchange, in bytes.
pub const AT_WINDOW_SIZE: usize = 100;

/// Rows in the port ↔ ConID table.
pub const AT_CONNECTION_CAPACITY: usize = 10;

/// Upper bound of a formatted command line, terminator included.
pub const AT_COMMAND_MAX_LEN: usize = 100;

/// Default deadline for a command's terminal response.
pub const AT_COMMAND_TIMEOUT_MS: u32 = 1000;

/// Deadline for `+EVENT:WIFI_GOT_IP` after the join command is acknowledged.
pub const AT_WIFI_JOIN_TIMEOUT_MS: u32 = 15_000;

/// Deadline for a socket connect to report its ConID.
pub const AT_SOCKET_CONNECT_TIMEOUT_MS: u32 = 5000;

/// Scratch space for reply text that precedes `OK` (socket read payloads).
pub const AT_REPLY_BUFFER_SIZE: usize = 256;
