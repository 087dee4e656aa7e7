//! NEC infrared remote receiver.
//!
//! The demodulator output drives an EXTI line. Every edge interrupt stamps
//! the IR counter (10 µs per tick) into [`IrEdges`]; [`IrReceiver::read`]
//! decodes frames from the stamps afterwards.
//!
//! # Frame
//!
//! | Part | Mark | Space |
//! |------|------|-------|
//! | Leader | 9 ms | 4.5 ms (data) or 2.25 ms (repeat) |
//! | Bit 0 | 560 µs | 560 µs |
//! | Bit 1 | 560 µs | 1690 µs |
//!
//! 32 data bits follow the leader, LSB first: address, inverted address,
//! command, inverted command. A repeat frame carries no data and means
//! "the last command again".

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use common::registry::Named;
use common::RingBuffer;
use critical_section::Mutex;
use platform::config::{IR_EDGE_BUFFER_SIZE, IR_EDGE_TIMEOUT_TICKS, IR_TICK_US};
use platform::{elapsed, CounterTimer, Error, Result};

// Durations in IR ticks.
const LEADER_MARK: u32 = 900;
const LEADER_SPACE: u32 = 450;
const REPEAT_SPACE: u32 = 225;
const BIT_MARK: u32 = 56;
const ZERO_SPACE: u32 = 56;
const ONE_SPACE: u32 = 169;

/// IR receivers on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrName {
    /// 38 kHz IR receiver.
    Receiver1,
}

/// Keys of the bundled 21-key remote, by command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RemoteKey {
    Power = 0x45,
    Menu = 0x47,
    Test = 0x44,
    Plus = 0x40,
    Return = 0x43,
    Previous = 0x07,
    PlayPause = 0x15,
    Next = 0x09,
    Num0 = 0x16,
    Minus = 0x19,
    Cancel = 0x0D,
    Num1 = 0x0C,
    Num2 = 0x18,
    Num3 = 0x5E,
    Num4 = 0x08,
    Num5 = 0x1C,
    Num6 = 0x5A,
    Num7 = 0x42,
    Num8 = 0x52,
    Num9 = 0x4A,
}

impl RemoteKey {
    /// Key for a decoded command code.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x45 => Self::Power,
            0x47 => Self::Menu,
            0x44 => Self::Test,
            0x40 => Self::Plus,
            0x43 => Self::Return,
            0x07 => Self::Previous,
            0x15 => Self::PlayPause,
            0x09 => Self::Next,
            0x16 => Self::Num0,
            0x19 => Self::Minus,
            0x0D => Self::Cancel,
            0x0C => Self::Num1,
            0x18 => Self::Num2,
            0x5E => Self::Num3,
            0x08 => Self::Num4,
            0x1C => Self::Num5,
            0x5A => Self::Num6,
            0x42 => Self::Num7,
            0x52 => Self::Num8,
            0x4A => Self::Num9,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// IrEdges — shared with the EXTI interrupt
// ---------------------------------------------------------------------------

/// Edge timestamps, stored as little-endian `u32` ticks.
pub struct IrEdges<const N: usize = IR_EDGE_BUFFER_SIZE> {
    ring: Mutex<RefCell<RingBuffer<N>>>,
    dropped: AtomicU32,
}

impl<const N: usize> IrEdges<N> {
    const WHOLE_TICKS: () = assert!(N % 4 == 0, "edge buffer must hold whole u32 ticks");

    /// Empty edge log.
    pub const fn new() -> Self {
        let () = Self::WHOLE_TICKS;
        Self {
            ring: Mutex::new(RefCell::new(RingBuffer::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// EXTI callback: stamp the edge with the IR counter.
    pub fn on_edge<T: CounterTimer + ?Sized>(&self, timer: &T) -> Result<()> {
        self.record(timer.count()?);
        Ok(())
    }

    /// Store one edge tick.
    pub fn record(&self, tick: u32) {
        let stored =
            critical_section::with(|cs| self.ring.borrow_ref_mut(cs).write(&tick.to_le_bytes()));
        if stored.is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Edges lost because the buffer was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Forget every stored edge.
    pub fn clear(&self) {
        critical_section::with(|cs| self.ring.borrow_ref_mut(cs).clear());
    }

    fn pop(&self) -> Option<u32> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            let mut bytes = [0u8; 4];
            (ring.len() >= bytes.len() && ring.read(&mut bytes) == bytes.len())
                .then(|| u32::from_le_bytes(bytes))
        })
    }
}

impl<const N: usize> Default for IrEdges<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// IrReceiver — decoder
// ---------------------------------------------------------------------------

/// NEC decoder over an edge buffer and the IR counter.
pub struct IrReceiver<'a, T, const N: usize = IR_EDGE_BUFFER_SIZE> {
    name: IrName,
    edges: &'a IrEdges<N>,
    timer: &'a T,
    last_command: u8,
}

impl<'a, T: CounterTimer, const N: usize> IrReceiver<'a, T, N> {
    /// Receiver decoding `edges`, timed by the running 10 µs `timer`.
    pub fn new(name: IrName, edges: &'a IrEdges<N>, timer: &'a T) -> Self {
        Self {
            name,
            edges,
            timer,
            last_command: 0,
        }
    }

    /// Set the IR counter to 10 µs ticks and start it.
    pub fn configure_timer(timer: &mut T) -> Result<()> {
        if timer.is_running()? {
            timer.stop()?;
        }
        timer.set_period_us(IR_TICK_US)?;
        timer.start()
    }

    /// Decode the next command.
    ///
    /// Edges before a valid leader are skipped. A repeat frame returns the
    /// last decoded command.
    ///
    /// # Errors
    ///
    /// [`Error::TimedOut`] if no edge arrives within a second;
    /// [`Error::Io`] on a malformed bit or a failed complement check.
    pub fn read(&mut self) -> Result<u8> {
        let mut last = self.next_edge()?;
        loop {
            let edge = self.next_edge()?;
            let mark = self.ticks(last, edge);
            last = edge;
            if !near(mark, LEADER_MARK, 10) {
                continue;
            }

            let edge = self.next_edge()?;
            let space = self.ticks(last, edge);
            last = edge;
            if near(space, LEADER_SPACE, 10) {
                return self.read_data(last);
            }
            if near(space, REPEAT_SPACE, 10) {
                platform::trace!("ir repeat");
                return Ok(self.last_command);
            }
        }
    }

    fn read_data(&mut self, mut last: u32) -> Result<u8> {
        let mut frame = [0u8; 4];
        for byte in &mut frame {
            for bit in 0..8 {
                let edge = self.next_edge()?;
                let mark = self.ticks(last, edge);
                let next = self.next_edge()?;
                let space = self.ticks(edge, next);
                last = next;

                if !near(mark, BIT_MARK, 20) {
                    return Err(Error::Io);
                }
                if near(space, ONE_SPACE, 20) {
                    *byte |= 1 << bit;
                } else if !near(space, ZERO_SPACE, 20) {
                    return Err(Error::Io);
                }
            }
        }

        let [address, address_inv, command, command_inv] = frame;
        if address != !address_inv || command != !command_inv {
            platform::debug!("ir frame failed complement check");
            return Err(Error::Io);
        }
        platform::debug!("ir command {} from address {}", command, address);
        self.last_command = command;
        Ok(command)
    }

    fn ticks(&self, from: u32, to: u32) -> u32 {
        elapsed(from, to, self.timer.max_count())
    }

    fn next_edge(&self) -> Result<u32> {
        let max = self.timer.max_count();
        let mut prev = self.timer.count()?;
        let mut waited: u32 = 0;
        loop {
            if let Some(tick) = self.edges.pop() {
                return Ok(tick);
            }
            // Accumulate so narrow counters can still measure the full timeout.
            let now = self.timer.count()?;
            waited = waited.saturating_add(elapsed(prev, now, max));
            prev = now;
            if waited >= IR_EDGE_TIMEOUT_TICKS {
                return Err(Error::TimedOut);
            }
        }
    }
}

impl<T, const N: usize> Named for IrReceiver<'_, T, N> {
    type Name = IrName;

    fn name(&self) -> IrName {
        self.name
    }
}

/// `value` within `nominal ± nominal / divisor`.
fn near(value: u32, nominal: u32, divisor: u32) -> bool {
    let margin = nominal.checked_div(divisor).unwrap_or(0);
    value >= nominal.saturating_sub(margin) && value <= nominal.saturating_add(margin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{SimClock, SimTimer};

    /// Record a full NEC frame starting at `start`; returns the last tick.
    fn frame(edges: &IrEdges<1024>, start: u32, address: u8, command: u8) -> u32 {
        let mut t = start;
        edges.record(t);
        t += LEADER_MARK;
        edges.record(t);
        t += LEADER_SPACE;
        edges.record(t);
        for byte in [address, !address, command, !command] {
            for bit in 0..8 {
                t += BIT_MARK;
                edges.record(t);
                t += if byte & (1 << bit) != 0 { ONE_SPACE } else { ZERO_SPACE };
                edges.record(t);
            }
        }
        t
    }

    #[test]
    fn decodes_command_and_repeat() {
        let edges = IrEdges::<1024>::new();
        let timer = SimTimer::running(SimClock::new(), IR_TICK_US);
        let mut rx = IrReceiver::new(IrName::Receiver1, &edges, &timer);

        let end = frame(&edges, 1000, 0x00, RemoteKey::PlayPause as u8);
        assert_eq!(rx.read().unwrap(), 0x15);
        assert_eq!(RemoteKey::from_code(0x15), Some(RemoteKey::PlayPause));

        // Repeat: leader mark + short space.
        let t = end + 4000;
        edges.record(t);
        edges.record(t + 905);
        edges.record(t + 905 + 220);
        assert_eq!(rx.read().unwrap(), 0x15);
    }

    #[test]
    fn noise_before_the_leader_is_skipped() {
        let edges = IrEdges::<1024>::new();
        let timer = SimTimer::running(SimClock::new(), IR_TICK_US);
        let mut rx = IrReceiver::new(IrName::Receiver1, &edges, &timer);

        edges.record(100);
        frame(&edges, 500, 0x00, RemoteKey::Num7 as u8);
        assert_eq!(rx.read().unwrap(), 0x42);
    }

    #[test]
    fn complement_mismatch_is_io_error() {
        let edges = IrEdges::<1024>::new();
        let timer = SimTimer::running(SimClock::new(), IR_TICK_US);
        let mut rx = IrReceiver::new(IrName::Receiver1, &edges, &timer);

        let mut t = 0;
        edges.record(t);
        t += LEADER_MARK;
        edges.record(t);
        t += LEADER_SPACE;
        edges.record(t);
        // All 32 bits zero: address 0 vs inverted copy 0.
        for _ in 0..32 {
            t += BIT_MARK;
            edges.record(t);
            t += ZERO_SPACE;
            edges.record(t);
        }
        assert_eq!(rx.read(), Err(Error::Io));
    }

    #[test]
    fn silence_times_out() {
        let edges = IrEdges::<1024>::new();
        let clock = SimClock::with_step(100);
        let mut timer = SimTimer::with_max_count(clock.clone(), 0xFFFF);
        IrReceiver::<SimTimer>::configure_timer(&mut timer).unwrap();
        let mut rx = IrReceiver::new(IrName::Receiver1, &edges, &timer);

        assert_eq!(rx.read(), Err(Error::TimedOut));
        assert!(clock.now_us() >= 1_000_000);
    }

    #[test]
    fn edges_are_stamped_from_the_counter() {
        let edges = IrEdges::<16>::new();
        let clock = SimClock::new();
        let timer = SimTimer::running(clock.clone(), IR_TICK_US);
        clock.advance(995);
        edges.on_edge(&timer).unwrap();
        assert_eq!(edges.pop(), Some(99));
        assert_eq!(edges.pop(), None);
    }

    #[test]
    fn tolerance_window() {
        assert!(near(900, LEADER_MARK, 10));
        assert!(near(810, LEADER_MARK, 10));
        assert!(near(990, LEADER_MARK, 10));
        assert!(!near(991, LEADER_MARK, 10));
        assert!(!near(44, BIT_MARK, 20));
    }
}
