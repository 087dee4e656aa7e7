//! Const-generic, statically allocated byte ring buffer.
//!
//! `RingBuffer<N>` moves bytes from an interrupt handler (producer) to the
//! polling main loop (consumer). Storage is exactly `N` bytes; a separate
//! occupancy count tells "empty" from "full" when both cursors coincide.
//!
//! # Constraints
//!
//! - `N` must be non-zero (checked at compile time).
//! - Writes are all-or-nothing: a write larger than the free space fails
//!   with [`Error::BufferFull`] and leaves the buffer untouched.
//! - Reads never fail for lack of data; they return fewer bytes.
//! - Not interrupt-safe by itself. Share it with an ISR through a
//!   `critical_section::Mutex<RefCell<_>>`, with exactly one producer and
//!   one consumer.

use platform::{Error, Result};

/// A fixed-capacity circular byte queue.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    /// Index of the next byte to read.
    read: usize,
    /// Index of the next slot to write.
    write: usize,
    /// Number of bytes currently held.
    len: usize,
}

impl<const N: usize> RingBuffer<N> {
    const NON_ZERO: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Create an empty ring buffer.
    ///
    /// `const` so ring buffers can be placed in `static`s.
    pub const fn new() -> Self {
        let () = Self::NON_ZERO;
        Self {
            buf: [0u8; N],
            read: 0,
            write: 0,
            len: 0,
        }
    }

    /// Append all of `data`.
    ///
    /// A write that straddles the end of the backing array is split into one
    /// copy up to the tail and one from index 0.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`] if `data` does not fit in the free space. The
    /// buffer is unchanged on error.
    #[allow(clippy::indexing_slicing)] // Safety: write < N; first <= N - write; rest <= free < N
    #[allow(clippy::arithmetic_side_effects)] // Safety: data.len() <= free() so len + data.len() <= N
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.free() {
            return Err(Error::BufferFull);
        }
        let first = data.len().min(N - self.write);
        let (head, rest) = data.split_at(first);
        self.buf[self.write..self.write + first].copy_from_slice(head);
        self.buf[..rest.len()].copy_from_slice(rest);
        self.write = (self.write + data.len()) % N;
        self.len += data.len();
        Ok(())
    }

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`] when no space is left.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    /// Move up to `out.len()` bytes into `out`, oldest first.
    ///
    /// Returns the number of bytes copied: `min(out.len(), self.len())`.
    #[allow(clippy::indexing_slicing)] // Safety: read < N; first <= N - read; rest < n <= len
    #[allow(clippy::arithmetic_side_effects)] // Safety: n <= len, so len - n cannot underflow
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        let first = n.min(N - self.read);
        let (head, rest) = out[..n].split_at_mut(first);
        head.copy_from_slice(&self.buf[self.read..self.read + first]);
        rest.copy_from_slice(&self.buf[..rest.len()]);
        self.read = (self.read + n) % N;
        self.len -= n;
        n
    }

    /// Remove the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read(&mut byte) == 1).then_some(byte[0])
    }

    /// Reset to empty. The backing bytes are left as they were.
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
        self.len = 0;
    }

    /// Bytes available to read.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Bytes that can still be written.
    #[allow(clippy::arithmetic_side_effects)] // Safety: len <= N invariant
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Maximum number of bytes the buffer can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// `true` when no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when the buffer is completely full.
    pub fn is_full(&self) -> bool {
        self.len == N
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let rb = RingBuffer::<8>::new();
        assert!(rb.is_empty());
        assert_eq!(rb.capacity(), 8);
        assert_eq!(rb.free(), 8);
    }

    #[test]
    fn write_wraps_across_the_tail() {
        let mut rb = RingBuffer::<8>::new();
        rb.write(&[1, 2, 3, 4, 5, 6]).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(rb.read(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);

        rb.write(&[7, 8, 9, 10, 11, 12]).unwrap();
        assert!(rb.is_full());

        let mut out = [0u8; 8];
        assert_eq!(rb.read(&mut out), 8);
        assert_eq!(out, [5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(rb.is_empty());
    }

    #[test]
    fn full_buffer_rejects_one_more_byte() {
        let mut rb = RingBuffer::<4>::new();
        rb.write(&[1, 2, 3, 4]).unwrap();
        assert_eq!(rb.push(5), Err(Error::BufferFull));

        let mut out = [0u8; 4];
        assert_eq!(rb.read(&mut out), 4);
        assert_eq!(rb.read(&mut out), 0);
    }

    #[test]
    fn oversized_write_leaves_buffer_unchanged() {
        let mut rb = RingBuffer::<4>::new();
        rb.write(&[1, 2]).unwrap();
        assert_eq!(rb.write(&[3, 4, 5]), Err(Error::BufferFull));
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.pop(), Some(1));
        assert_eq!(rb.pop(), Some(2));
        assert_eq!(rb.pop(), None);
    }

    #[test]
    fn clear_resets_cursors() {
        let mut rb = RingBuffer::<4>::new();
        rb.write(&[1, 2, 3]).unwrap();
        rb.clear();
        assert!(rb.is_empty());
        rb.write(&[9, 9, 9, 9]).unwrap();
        assert!(rb.is_full());
    }

    #[test]
    fn short_read_returns_available_count() {
        let mut rb = RingBuffer::<8>::new();
        rb.write(b"ab").unwrap();
        let mut out = [0u8; 5];
        assert_eq!(rb.read(&mut out), 2);
        assert_eq!(&out[..2], b"ab");
    }
}
