//! Port ↔ ConID table.
//!
//! Callers address sockets by the port they opened them on; the module
//! addresses them by the connection ID it assigned. Rows are added once a
//! connect succeeds and removed when the socket is deleted.

use heapless::LinearMap;
use platform::config::AT_CONNECTION_CAPACITY;
use platform::{Error, Result};

/// Fixed-capacity map from caller port to module ConID.
pub struct ConnectionTable<const N: usize = AT_CONNECTION_CAPACITY> {
    rows: LinearMap<u16, u32, N>,
}

impl<const N: usize> ConnectionTable<N> {
    /// Empty table.
    pub const fn new() -> Self {
        Self {
            rows: LinearMap::new(),
        }
    }

    /// Record that `port` is served by `con_id`.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] if `port` already has a row;
    /// [`Error::Overflow`] if every row is taken.
    pub fn add(&mut self, port: u16, con_id: u32) -> Result<()> {
        if self.rows.contains_key(&port) {
            return Err(Error::AlreadyExists);
        }
        self.rows
            .insert(port, con_id)
            .map_err(|_| Error::Overflow)?;
        Ok(())
    }

    /// ConID serving `port`.
    pub fn find(&self, port: u16) -> Option<u32> {
        self.rows.get(&port).copied()
    }

    /// Remove the row for `port`, if any. Removing an absent port is not an
    /// error.
    pub fn delete(&mut self, port: u16) -> Option<u32> {
        self.rows.remove(&port)
    }

    /// Whether `port` has a row.
    pub fn contains(&self, port: u16) -> bool {
        self.rows.contains_key(&port)
    }

    /// `true` when no row is free.
    pub fn is_full(&self) -> bool {
        self.rows.len() >= N
    }

    /// Rows in use.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when no socket is open.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<const N: usize> Default for ConnectionTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
