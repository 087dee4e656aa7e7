//! Bounded receive window and the caller's output sink.
//!
//! Bytes for one exchange accumulate in a [`Window`]. When it fills before
//! any terminal marker appears, the [`OverflowPolicy`] decides whether the
//! exchange fails or the oldest bytes move out to the [`OutputSink`].

use core::ops::Range;

/// What to do when the receive window fills without a terminal marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Emit all but the last `longest marker − 1` bytes to the output sink
    /// and keep receiving.
    #[default]
    Slide,
    /// End the exchange with [`Error::Overflow`](platform::Error::Overflow).
    Reject,
}

/// Caller-supplied buffer collecting reply payload.
///
/// Appends never fail: bytes that do not fit are dropped and the sink is
/// marked truncated.
pub struct OutputSink<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> OutputSink<'a> {
    /// Empty sink writing into `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    /// Sink with no room, for exchanges whose payload is irrelevant.
    pub fn discard() -> OutputSink<'static> {
        OutputSink {
            buf: &mut [],
            len: 0,
            truncated: false,
        }
    }

    /// Append as much of `bytes` as fits.
    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let room = self.buf.len().saturating_sub(self.len);
        let n = room.min(bytes.len());
        if n < bytes.len() {
            self.truncated = true;
        }
        // len + n <= buf.len()
        let end = self.len.saturating_add(n);
        if let (Some(dst), Some(src)) = (self.buf.get_mut(self.len..end), bytes.get(..n)) {
            dst.copy_from_slice(src);
            self.len = end;
        }
    }

    /// Bytes collected so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` before anything is collected.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any appended byte was dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Collected bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.get(..self.len).unwrap_or_default()
    }
}

/// Fixed-capacity byte window, filled from the front.
pub struct Window<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> Window<N> {
    const NON_ZERO: () = assert!(N > 0, "receive window needs room for at least one byte");

    /// Empty window.
    pub const fn new() -> Self {
        let () = Self::NON_ZERO;
        Self { buf: [0; N], len: 0 }
    }

    /// Forget every received byte.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Bytes received.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` before anything is received.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when there is no room to receive into.
    pub fn is_full(&self) -> bool {
        self.len >= N
    }

    /// Received bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.buf.get(..self.len).unwrap_or_default()
    }

    /// Bytes in `range`, or nothing if it lies outside the filled part.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        self.as_slice().get(range).unwrap_or_default()
    }

    /// Unfilled space to receive into; [`commit`](Self::commit) what was
    /// written.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        self.buf.get_mut(self.len..).unwrap_or_default()
    }

    /// Account for `n` bytes written into [`spare_mut`](Self::spare_mut).
    pub fn commit(&mut self, n: usize) {
        self.len = self.len.saturating_add(n).min(N);
    }

    /// Emit all but the last `keep` bytes to `sink` and move the kept tail
    /// to the front.
    ///
    /// At least one byte is always emitted from a non-empty window, so a
    /// full window always regains space.
    pub fn slide(&mut self, keep: usize, sink: &mut OutputSink<'_>) {
        let keep = keep.min(self.len.saturating_sub(1));
        // keep < len
        let emit = self.len.saturating_sub(keep);
        sink.append(self.slice(0..emit));
        self.consume(emit);
    }

    /// Drop the first `n` bytes, keeping whatever follows for the next
    /// exchange.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len = self.len.saturating_sub(n);
    }
}

impl<const N: usize> Default for Window<N> {
    fn default() -> Self {
        Self::new()
    }
}
