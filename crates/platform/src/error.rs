//! Error taxonomy shared by every layer.
//!
//! Nothing below the application layer retries on its own; each variant
//! tells the caller which recovery is sensible.

/// Errors returned by HAL contracts, core primitives, devices and the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Null/zero/out-of-range input. A caller bug; never retried.
    #[error("invalid argument")]
    InvalidArgument,
    /// Registry lookup miss.
    #[error("device not found")]
    NotFound,
    /// A hardware transaction is already in flight.
    #[error("peripheral busy")]
    Busy,
    /// A hardware transaction failed, or a bit-banged frame failed validation.
    #[error("I/O error")]
    Io,
    /// A bounded wait expired. Always recoverable.
    #[error("operation timed out")]
    TimedOut,
    /// Ring buffer write rejected; the buffer is unchanged.
    #[error("ring buffer full")]
    BufferFull,
    /// Output truncated, bounded buffer exhausted, or a fixed table is full.
    #[error("overflow")]
    Overflow,
    /// The connection table already has a row for this port.
    #[error("entry already exists")]
    AlreadyExists,
    /// No connection is registered for this port.
    #[error("not connected")]
    NotConnected,
    /// The modem answered `ERROR`/`Unknown cmd`, or a reply failed to parse.
    #[error("protocol error")]
    Protocol,
}

/// Result alias used across the workspace.
pub type Result<T> = core::result::Result<T, Error>;
