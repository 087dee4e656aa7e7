//! Core primitives shared by every device module
//!
//! - [`registry`] - intrusive device registry with lookup by name
//! - [`ring_buffer`] - SPSC byte ring between interrupt handlers and the
//!   polling main loop
//! - [`timing`] - busy-poll delay and pin-level wait on a hardware counter
//! - [`parse`] - decimal field parsing for text protocol replies
//!
//! None of these allocate, log or retry; they return [`platform::Error`]
//! values and leave recovery to the caller.
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]

pub mod parse;
pub mod registry;
pub mod ring_buffer;
pub mod timing;

pub use registry::{Named, Node, Registry};
pub use ring_buffer::RingBuffer;
