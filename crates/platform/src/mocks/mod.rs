//! Mock implementations for testing
//!
//! This module provides simulated time, pins, timers and transports so the
//! core primitives, devices and the modem can be exercised on the host.
//!
//! All simulated peripherals share one [`SimClock`]. Time only moves when a
//! [`SimTimer`] count is read (or [`SimClock::advance`] is called), so every
//! busy-poll loop in the firmware makes progress in simulation exactly as it
//! does against a free-running hardware counter.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects)] // host-only simulation arithmetic
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_possible_truncation)]
#![allow(missing_docs)]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::peripheral::{AdcDriver, DacDriver, DateTime, RtcDriver, SampleTime};
use crate::{CounterTimer, Error, PinLevel, Result, Transport};

// ---------------------------------------------------------------------------
// Simulated time
// ---------------------------------------------------------------------------

/// Shared simulated wall clock in microseconds.
///
/// Clones share the same time. Each [`SimClock::poll`] advances time by the
/// configured step.
#[derive(Clone)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
    step_us: u64,
}

impl SimClock {
    /// Clock starting at 0 µs, advancing 1 µs per poll.
    pub fn new() -> Self {
        Self::with_step(1)
    }

    /// Clock advancing `step_us` per poll.
    pub fn with_step(step_us: u64) -> Self {
        Self {
            now_us: Rc::new(Cell::new(0)),
            step_us,
        }
    }

    /// Current simulated time.
    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    /// Move time forward.
    pub fn advance(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }

    /// Advance by one step and return the new time.
    pub fn poll(&self) -> u64 {
        self.advance(self.step_us);
        self.now_us()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SimTimer
// ---------------------------------------------------------------------------

/// Counter timer driven by a [`SimClock`].
pub struct SimTimer {
    clock: SimClock,
    period_us: u32,
    max_count: u32,
    running: bool,
    started_at_us: u64,
    base_count: u32,
    frozen_count: u32,
    starts: Cell<u32>,
}

impl SimTimer {
    /// 32-bit counter with a 1 µs period, stopped.
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            period_us: 1,
            max_count: u32::MAX,
            running: false,
            started_at_us: 0,
            base_count: 0,
            frozen_count: 0,
            starts: Cell::new(0),
        }
    }

    /// Counter that wraps after `max_count` (e.g. `0xFFFF`).
    pub fn with_max_count(clock: SimClock, max_count: u32) -> Self {
        Self {
            max_count,
            ..Self::new(clock)
        }
    }

    /// Already running with the given period.
    pub fn running(clock: SimClock, period_us: u32) -> Self {
        let mut timer = Self::new(clock);
        timer.period_us = period_us;
        timer.running = true;
        timer.started_at_us = timer.clock.now_us();
        timer
    }

    /// Make the count register start from `count` instead of zero, to
    /// exercise wraparound.
    pub fn preload(&mut self, count: u32) {
        self.base_count = count;
        self.frozen_count = count;
        self.started_at_us = self.clock.now_us();
    }

    /// Configured period.
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Number of `start()` calls.
    pub fn start_count(&self) -> u32 {
        self.starts.get()
    }

    fn ticks_since_start(&self, now_us: u64) -> u32 {
        let periods = (now_us - self.started_at_us) / u64::from(self.period_us.max(1));
        (u64::from(self.base_count) + periods) as u32 & self.max_count
    }
}

impl CounterTimer for SimTimer {
    fn is_running(&self) -> Result<bool> {
        Ok(self.running)
    }

    fn start(&mut self) -> Result<()> {
        self.starts.set(self.starts.get() + 1);
        self.running = true;
        self.base_count = 0;
        self.started_at_us = self.clock.now_us();
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.running {
            self.frozen_count = self.ticks_since_start(self.clock.now_us());
        }
        self.running = false;
        Ok(())
    }

    fn set_period_us(&mut self, us: u32) -> Result<()> {
        if us == 0 {
            return Err(Error::InvalidArgument);
        }
        self.period_us = us;
        Ok(())
    }

    fn count(&self) -> Result<u32> {
        if self.running {
            Ok(self.ticks_since_start(self.clock.poll()))
        } else {
            Ok(self.frozen_count)
        }
    }

    fn max_count(&self) -> u32 {
        self.max_count
    }
}

// ---------------------------------------------------------------------------
// WaveformPin
// ---------------------------------------------------------------------------

/// When a [`WaveformPin`] starts playing its waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arm {
    /// When firmware drives the pin to this level.
    OnWrite(PinLevel),
    /// On the first read.
    OnFirstRead,
}

struct WaveformState {
    idle: PinLevel,
    written: Option<PinLevel>,
    arm: Option<Arm>,
    segments: Vec<(u64, PinLevel)>,
    started_at_us: Option<u64>,
    writes: Vec<PinLevel>,
}

/// Pin whose level follows a scripted waveform in simulated time.
///
/// Clones share the same line. Also usable as an output: writes are
/// recorded and, until the waveform starts, read back.
#[derive(Clone)]
pub struct WaveformPin {
    clock: SimClock,
    state: Rc<RefCell<WaveformState>>,
}

impl WaveformPin {
    /// Line resting at `idle` with no waveform.
    pub fn new(clock: SimClock, idle: PinLevel) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(WaveformState {
                idle,
                written: None,
                arm: None,
                segments: Vec::new(),
                started_at_us: None,
                writes: Vec::new(),
            })),
        }
    }

    /// Play `segments` (duration µs, level) once `arm` happens; the line
    /// returns to idle afterwards.
    pub fn arm(&self, arm: Arm, segments: &[(u64, PinLevel)]) {
        let mut state = self.state.borrow_mut();
        state.arm = Some(arm);
        state.segments = segments.to_vec();
        state.started_at_us = None;
    }

    /// Every level written by firmware, in order.
    pub fn writes(&self) -> Vec<PinLevel> {
        self.state.borrow().writes.clone()
    }

    fn level(&self) -> PinLevel {
        let now = self.clock.now_us();
        let mut state = self.state.borrow_mut();
        if state.started_at_us.is_none() && state.arm == Some(Arm::OnFirstRead) {
            state.started_at_us = Some(now);
        }
        match state.started_at_us {
            Some(start) => {
                let mut offset = now - start;
                for &(duration, level) in &state.segments {
                    if offset < duration {
                        return level;
                    }
                    offset -= duration;
                }
                state.idle
            }
            None => state.written.unwrap_or(state.idle),
        }
    }

    fn write(&self, level: PinLevel) {
        let now = self.clock.now_us();
        let mut state = self.state.borrow_mut();
        state.writes.push(level);
        state.written = Some(level);
        if state.started_at_us.is_none() && state.arm == Some(Arm::OnWrite(level)) {
            state.started_at_us = Some(now);
        }
    }
}

impl ErrorType for WaveformPin {
    type Error = Infallible;
}

impl InputPin for WaveformPin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.level() == PinLevel::High)
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.level() == PinLevel::Low)
    }
}

impl OutputPin for WaveformPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(PinLevel::Low);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(PinLevel::High);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

struct Rule {
    prefix: Vec<u8>,
    replies: Vec<(u64, Vec<u8>)>,
}

/// Byte transport that records what firmware sends and answers commands
/// with scheduled replies.
pub struct ScriptedTransport {
    clock: SimClock,
    sent: Vec<u8>,
    transmits: Vec<Vec<u8>>,
    incoming: VecDeque<(u64, VecDeque<u8>)>,
    rules: Vec<Rule>,
    chunk: usize,
}

impl ScriptedTransport {
    /// Transport delivering at most one byte per `receive` call.
    pub fn new(clock: SimClock) -> Self {
        Self::with_chunk(clock, 1)
    }

    /// Transport delivering at most `chunk` bytes per `receive` call.
    pub fn with_chunk(clock: SimClock, chunk: usize) -> Self {
        Self {
            clock,
            sent: Vec::new(),
            transmits: Vec::new(),
            incoming: VecDeque::new(),
            rules: Vec::new(),
            chunk: chunk.max(1),
        }
    }

    /// Make `bytes` available immediately.
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.push_incoming_after(0, bytes);
    }

    /// Make `bytes` available `delay_us` from now.
    pub fn push_incoming_after(&mut self, delay_us: u64, bytes: &[u8]) {
        let due = self.clock.now_us() + delay_us;
        self.incoming.push_back((due, bytes.iter().copied().collect()));
    }

    /// Whenever a transmit starts with `prefix`, schedule each
    /// `(delay_us, bytes)` reply relative to the transmit.
    pub fn on_command(&mut self, prefix: &[u8], replies: &[(u64, &[u8])]) {
        self.rules.push(Rule {
            prefix: prefix.to_vec(),
            replies: replies.iter().map(|(d, b)| (*d, b.to_vec())).collect(),
        });
    }

    /// Every byte transmitted so far.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Each `transmit` call's bytes.
    pub fn transmits(&self) -> &[Vec<u8>] {
        &self.transmits
    }

    /// Bytes scheduled but not yet received.
    pub fn pending_len(&self) -> usize {
        self.incoming.iter().map(|(_, b)| b.len()).sum()
    }
}

impl Transport for ScriptedTransport {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.sent.extend_from_slice(data);
        self.transmits.push(data.to_vec());
        let now = self.clock.now_us();
        let mut scheduled = Vec::new();
        for rule in &self.rules {
            if data.starts_with(&rule.prefix) {
                for (delay, bytes) in &rule.replies {
                    scheduled.push((now + delay, bytes.iter().copied().collect::<VecDeque<u8>>()));
                }
            }
        }
        for entry in scheduled {
            let at = self.incoming.partition_point(|(due, _)| *due <= entry.0);
            self.incoming.insert(at, entry);
        }
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let now = self.clock.now_us();
        let limit = buffer.len().min(self.chunk);
        let mut n = 0;
        while n < limit {
            let Some((due, bytes)) = self.incoming.front_mut() else {
                break;
            };
            if *due > now {
                break;
            }
            match bytes.pop_front() {
                Some(b) => {
                    buffer[n] = b;
                    n += 1;
                }
                None => {
                    self.incoming.pop_front();
                }
            }
        }
        if self.incoming.front().is_some_and(|(_, b)| b.is_empty()) {
            self.incoming.pop_front();
        }
        Ok(n)
    }

    fn clear_receive_buffer(&mut self) -> Result<()> {
        let now = self.clock.now_us();
        self.incoming.retain(|(due, _)| *due > now);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockPwm
// ---------------------------------------------------------------------------

/// PWM channel recording the last duty cycle.
pub struct MockPwm {
    max_duty: u16,
    duty: u16,
}

impl MockPwm {
    /// Channel with the given maximum duty.
    pub fn new(max_duty: u16) -> Self {
        Self { max_duty, duty: 0 }
    }

    /// Last duty written.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl embedded_hal::pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockAdc / MockDac / MockRtc
// ---------------------------------------------------------------------------

/// ADC returning queued conversion results.
///
/// `poll` times out once the queue is empty.
#[derive(Default)]
pub struct MockAdc {
    samples: VecDeque<u16>,
    pub channel: Option<(u8, SampleTime)>,
    pub running: bool,
    pub starts: u32,
}

impl MockAdc {
    pub fn with_samples(samples: &[u16]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl AdcDriver for MockAdc {
    fn configure_channel(&mut self, channel: u8, sample_time: SampleTime) -> Result<()> {
        self.channel = Some((channel, sample_time));
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.starts += 1;
        self.running = true;
        Ok(())
    }

    fn poll(&mut self, _timeout_ms: u32) -> Result<()> {
        if !self.running || self.samples.is_empty() {
            return Err(Error::TimedOut);
        }
        Ok(())
    }

    fn value(&mut self) -> Result<u16> {
        self.samples.pop_front().ok_or(Error::Io)
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }
}

/// DAC channel recording what it was told to output.
#[derive(Default)]
pub struct MockDac {
    pub value: u16,
    pub enabled: bool,
    pub wave: Option<&'static [u16]>,
}

impl DacDriver for MockDac {
    fn set_value(&mut self, value: u16) -> Result<()> {
        self.value = value;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.enabled = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.enabled = false;
        Ok(())
    }

    fn start_wave(&mut self, points: &'static [u16]) -> Result<()> {
        self.wave = Some(points);
        self.enabled = true;
        Ok(())
    }

    fn stop_wave(&mut self) -> Result<()> {
        self.wave = None;
        self.enabled = false;
        Ok(())
    }
}

/// RTC holding its calendar and backup registers in memory.
#[derive(Default)]
pub struct MockRtc {
    pub now: DateTime,
    pub backup: [u32; 20],
    pub calendar_writes: u32,
}

impl RtcDriver for MockRtc {
    fn date_time(&mut self) -> Result<DateTime> {
        Ok(self.now)
    }

    fn set_date_time(&mut self, date_time: &DateTime) -> Result<()> {
        self.now = *date_time;
        self.calendar_writes += 1;
        Ok(())
    }

    fn backup_register(&mut self, index: u8) -> Result<u32> {
        self.backup.get(usize::from(index)).copied().ok_or(Error::InvalidArgument)
    }

    fn set_backup_register(&mut self, index: u8, value: u32) -> Result<()> {
        let slot = self.backup.get_mut(usize::from(index)).ok_or(Error::InvalidArgument)?;
        *slot = value;
        Ok(())
    }
}
