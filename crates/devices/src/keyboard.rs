//! Matrix-free keyboard: one active-low input per key.
//!
//! Each key's EXTI interrupt calls [`Keyboard::on_exti`], which samples the
//! key and queues its index when pressed. The main loop pops keys from the
//! shared [`KeyQueue`].

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use common::registry::Named;
use common::RingBuffer;
use critical_section::Mutex;
use embedded_hal::digital::InputPin;
use platform::config::KEYBOARD_BUFFER_SIZE;
use platform::gpio::read_level;
use platform::{Error, PinLevel, Result};

/// Keyboards on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyboardName {
    /// The four-key user keypad.
    Keypad,
}

/// Pending key presses, shared between the EXTI handler and the main loop.
pub struct KeyQueue<const N: usize = KEYBOARD_BUFFER_SIZE> {
    keys: Mutex<RefCell<RingBuffer<N>>>,
    dropped: AtomicU32,
}

impl<const N: usize> KeyQueue<N> {
    /// Empty queue.
    pub const fn new() -> Self {
        Self {
            keys: Mutex::new(RefCell::new(RingBuffer::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Oldest pending key index.
    pub fn pop(&self) -> Option<u8> {
        critical_section::with(|cs| self.keys.borrow_ref_mut(cs).pop())
    }

    /// Presses lost because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, key: u8) {
        let stored = critical_section::with(|cs| self.keys.borrow_ref_mut(cs).push(key));
        if stored.is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            platform::warn!("key queue full, key {} dropped", key);
        }
    }
}

impl<const N: usize> Default for KeyQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// `K` active-low keys feeding a [`KeyQueue`].
pub struct Keyboard<'a, P, const K: usize, const N: usize = KEYBOARD_BUFFER_SIZE> {
    name: KeyboardName,
    keys: [P; K],
    queue: &'a KeyQueue<N>,
}

impl<'a, P: InputPin, const K: usize, const N: usize> Keyboard<'a, P, K, N> {
    /// Keyboard over active-low `keys`, reporting presses into `queue`.
    pub fn new(name: KeyboardName, keys: [P; K], queue: &'a KeyQueue<N>) -> Self {
        Self { name, keys, queue }
    }

    /// EXTI callback for key `key`: queue it if it reads pressed (low).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an index without a key;
    /// [`Error::Io`] if the pin cannot be read.
    pub fn on_exti(&mut self, key: usize) -> Result<()> {
        let pin = self.keys.get_mut(key).ok_or(Error::InvalidArgument)?;
        if read_level(pin)? == PinLevel::High {
            return Ok(());
        }
        let index = u8::try_from(key).map_err(|_| Error::InvalidArgument)?;
        self.queue.push(index);
        Ok(())
    }

    /// Oldest pending key, or `None`.
    pub fn read(&self) -> Option<u8> {
        self.queue.pop()
    }
}

impl<P, const K: usize, const N: usize> Named for Keyboard<'_, P, K, N> {
    type Name = KeyboardName;

    fn name(&self) -> KeyboardName {
        self.name
    }
}
