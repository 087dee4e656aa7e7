//! One AT-command exchange.
//!
//! ```text
//! send ──► awaiting ──► matched (Success | Fail | Unknown)
//!             │  ▲
//!             │  └── receive more / slide the window
//!             ├────► timed out
//!             └────► overflowed (Reject policy)
//! ```
//!
//! Each wait polls the transport without blocking and rescans the whole
//! window whenever bytes arrive. Bytes after a match stay in the window, so
//! a second wait in the same session (e.g. `+EVENT:WIFI_GOT_IP` after `OK`)
//! sees anything that arrived together with the first marker.

use platform::config::AT_WINDOW_SIZE;
use platform::{elapsed, CounterTimer, Error, Result, Transport};

use crate::at::{match_window, tail_len, Disposition, Pattern};
use crate::window::{OutputSink, OverflowPolicy, Window};

/// A command/response exchange over `transport`, timed by a millisecond
/// `clock`.
pub struct Session<'a, Tr, T, const N: usize = AT_WINDOW_SIZE> {
    transport: &'a mut Tr,
    clock: &'a T,
    window: Window<N>,
    policy: OverflowPolicy,
}

impl<'a, Tr, T, const N: usize> Session<'a, Tr, T, N>
where
    Tr: Transport,
    T: CounterTimer,
{
    /// Exchange over `transport` with an empty window.
    pub fn new(transport: &'a mut Tr, clock: &'a T, policy: OverflowPolicy) -> Self {
        Self {
            transport,
            clock,
            window: Window::new(),
            policy,
        }
    }

    /// Drop stale input and transmit a command line.
    pub fn send(&mut self, command: &[u8]) -> Result<()> {
        if command.is_empty() {
            return Err(Error::InvalidArgument);
        }
        self.transport.clear_receive_buffer()?;
        self.window.clear();
        self.transport.transmit(command)?;
        platform::debug!("at >> {}", printable(command));
        Ok(())
    }

    /// Transmit raw bytes mid-exchange, keeping whatever was received.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.transport.transmit(data)
    }

    /// Receive until one of `patterns` matches or `timeout_ms` passes.
    ///
    /// Payload designated by the matching pattern goes to `sink`, along
    /// with anything slid out of a full window.
    ///
    /// # Errors
    ///
    /// [`Error::TimedOut`] when no marker arrives in time;
    /// [`Error::Overflow`] when the window fills under
    /// [`OverflowPolicy::Reject`]; transport errors as returned.
    pub fn wait_for(
        &mut self,
        patterns: &[Pattern],
        timeout_ms: u32,
        sink: &mut OutputSink<'_>,
    ) -> Result<Disposition> {
        let max = self.clock.max_count();
        let start = self.clock.count()?;
        let mut unscanned = !self.window.is_empty();

        loop {
            if unscanned {
                if let Some(found) = match_window(self.window.as_slice(), patterns) {
                    sink.append(self.window.slice(found.payload.clone()));
                    if found.disposition == Disposition::Unknown {
                        platform::warn!(
                            "at << unknown command: {}",
                            printable(self.window.slice(found.payload.clone()))
                        );
                    }
                    self.window.consume(found.end);
                    return Ok(found.disposition);
                }
                unscanned = false;
            }

            if elapsed(start, self.clock.count()?, max) >= timeout_ms {
                return Err(Error::TimedOut);
            }

            if self.window.is_full() {
                match self.policy {
                    OverflowPolicy::Reject => return Err(Error::Overflow),
                    OverflowPolicy::Slide => self.window.slide(tail_len(patterns), sink),
                }
            }

            let received = self.transport.receive(self.window.spare_mut())?;
            if received > 0 {
                self.window.commit(received);
                unscanned = true;
            }
        }
    }

    /// Bytes received after the last match.
    pub fn leftover(&self) -> &[u8] {
        self.window.as_slice()
    }
}

/// Command or reply text for logs.
pub(crate) fn printable(bytes: &[u8]) -> &str {
    core::str::from_utf8(bytes).map_or("<binary>", str::trim_end)
}
