//! Interrupt-driven serial port.
//!
//! Reception is armed one byte at a time; every receive-complete interrupt
//! pushes the byte into [`SerialState`]'s ring and re-arms. The main loop
//! drains the ring through [`SerialPort`]'s [`Transport`] implementation.
//!
//! Transmission is single-flight: the port starts an interrupt transfer and
//! spins until the transmit-complete interrupt clears the in-flight flag. A
//! transfer that misses its deadline is aborted before the flag is cleared.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use common::registry::Named;
use common::RingBuffer;
use critical_section::Mutex;
use platform::config::{SERIAL_RX_BUFFER_SIZE, TX_COMPLETE_TIMEOUT_MS};
use platform::{elapsed, CounterTimer, Error, Result, Transport, UartDriver};

/// Serial ports on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialName {
    /// Debug console.
    Debug,
    /// Link to the Wi-Fi/Bluetooth co-processor.
    Wireless,
}

// ---------------------------------------------------------------------------
// SerialState — shared with the UART interrupt
// ---------------------------------------------------------------------------

/// Interrupt-side state of one serial port.
///
/// Lives in a `static`; both the UART interrupt and the owning
/// [`SerialPort`] access it through `&self`.
pub struct SerialState<const N: usize = SERIAL_RX_BUFFER_SIZE> {
    rx: Mutex<RefCell<RingBuffer<N>>>,
    transmitting: AtomicBool,
    dropped: AtomicU32,
}

impl<const N: usize> SerialState<N> {
    /// Empty state.
    pub const fn new() -> Self {
        Self {
            rx: Mutex::new(RefCell::new(RingBuffer::new())),
            transmitting: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
        }
    }

    /// Receive-complete interrupt: store `byte` and re-arm reception.
    ///
    /// A byte arriving while the ring is full is dropped and counted;
    /// reception stays armed either way.
    pub fn on_byte_received<D: UartDriver + ?Sized>(&self, byte: u8, driver: &mut D) -> Result<()> {
        let stored = critical_section::with(|cs| self.rx.borrow_ref_mut(cs).push(byte));
        if stored.is_err() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            platform::warn!("serial rx ring full, {} bytes dropped", total);
        }
        driver.start_receive()
    }

    /// Transmit-complete interrupt.
    pub fn on_transmit_complete(&self) {
        self.transmitting.store(false, Ordering::Release);
    }

    /// `true` while a transmit is in flight.
    pub fn is_transmitting(&self) -> bool {
        self.transmitting.load(Ordering::Acquire)
    }

    /// Bytes discarded because the ring was full.
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Bytes waiting to be read.
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.rx.borrow_ref(cs).len())
    }

    fn read(&self, out: &mut [u8]) -> usize {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).read(out))
    }

    fn clear(&self) {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).clear());
    }
}

impl<const N: usize> Default for SerialState<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SerialPort — main-loop side
// ---------------------------------------------------------------------------

/// Serial port owned by the main loop.
///
/// `timer` is the millisecond tick source used for the transmit deadline.
pub struct SerialPort<'a, D, T, const N: usize = SERIAL_RX_BUFFER_SIZE> {
    name: SerialName,
    driver: D,
    timer: T,
    state: &'a SerialState<N>,
    tx_timeout_ms: u32,
}

impl<'a, D, T, const N: usize> SerialPort<'a, D, T, N>
where
    D: UartDriver,
    T: CounterTimer,
{
    /// Port over `driver`, sharing `state` with the UART interrupt.
    pub fn new(name: SerialName, driver: D, timer: T, state: &'a SerialState<N>) -> Self {
        Self {
            name,
            driver,
            timer,
            state,
            tx_timeout_ms: TX_COMPLETE_TIMEOUT_MS,
        }
    }

    /// Override the transmit-complete deadline.
    #[must_use]
    pub fn with_tx_timeout_ms(mut self, ms: u32) -> Self {
        self.tx_timeout_ms = ms;
        self
    }

    /// Drop anything buffered and (re-)arm reception.
    pub fn init(&mut self) -> Result<()> {
        self.state.clear();
        self.driver.abort_receive()?;
        self.driver.start_receive()?;
        platform::debug!("serial port initialised");
        Ok(())
    }

    fn wait_transmit_complete(&mut self) -> Result<()> {
        let max = self.timer.max_count();
        let start = self.timer.count()?;
        loop {
            if !self.state.is_transmitting() {
                return Ok(());
            }
            if elapsed(start, self.timer.count()?, max) >= self.tx_timeout_ms {
                // The flag stays set if the abort fails, so later transmits
                // report Busy instead of overlapping the stuck transfer.
                self.driver.abort_transmit()?;
                self.state.on_transmit_complete();
                platform::warn!("serial transmit timed out, transfer aborted");
                return Err(Error::TimedOut);
            }
        }
    }
}

impl<D, T, const N: usize> Transport for SerialPort<'_, D, T, N>
where
    D: UartDriver,
    T: CounterTimer,
{
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if self.state.transmitting.swap(true, Ordering::AcqRel) {
            return Err(Error::Busy);
        }
        if let Err(e) = self.driver.start_transmit(data) {
            self.state.on_transmit_complete();
            return Err(e);
        }
        self.wait_transmit_complete()
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize> {
        Ok(self.state.read(buffer))
    }

    fn clear_receive_buffer(&mut self) -> Result<()> {
        self.state.clear();
        Ok(())
    }
}

impl<D, T, const N: usize> Named for SerialPort<'_, D, T, N> {
    type Name = SerialName;

    fn name(&self) -> SerialName {
        self.name
    }
}
