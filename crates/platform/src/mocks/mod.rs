//! Mock implementations for testing
//!
//! [`MockWire`] emulates the pins between two I2S/TDM ports (or one port
//! looped back onto itself) on the host. Every call to
//! [`SerialAudioPort::wait_for_completion`] on a port attached to the wire
//! completes one DMA period: each receive lane gets the peer's active
//! transmit half, delayed by the lane latency, and all running ports see
//! their TX and RX completion flags raised.
//!
//! Faults for negative tests:
//! - [`MockWire::set_latency`]: words of delay on a lane (0..=[`MOCK_MAX_LATENCY`])
//! - [`MockWire::stall_lane`], [`MockWire::stall_lane_from`]: receive DMA stops
//!   updating its target, so the half keeps stale data while completions continue
//! - [`MockWire::inject_bit_flip`]: one received word corrupted in one period
//! - [`MockWire::hang`]: port never completes again
//! - [`MockWire::set_receive_shaper`]: per-word receive transform (padding emulation)

#![cfg(any(test, feature = "std"))]

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use thiserror_no_std::Error;

use crate::audio::{Direction, SerialAudioPort};
use crate::audio_config::{DataFormat, FormatError, TransferConfig};
use crate::completion::TransferCompletion;
use crate::dma::{BufferHalf, PingPongBuffer};

/// Largest lane latency the wire can model, in words.
pub const MOCK_MAX_LATENCY: usize = 256;

/// Per-word receive transform: `(sender format, index in tx half, word) -> word`.
pub type ReceiveShaper = fn(&DataFormat, usize, u32) -> u32;

/// Which port of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEnd {
    /// First port (I2S0 in the reference wiring).
    A,
    /// Second port (I2S1).
    B,
}

impl WireEnd {
    /// The opposite port.
    pub const fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Where each port's receive data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A port receives what it transmits (SDOUT tied to SDIN).
    SelfLoopback,
    /// A receives B's transmit stream and B receives A's.
    Crossed,
}

impl Route {
    const fn source(self, receiver: WireEnd) -> WireEnd {
        match self {
            Self::SelfLoopback => receiver,
            Self::Crossed => receiver.peer(),
        }
    }
}

/// A single corrupted receive word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFlip {
    /// Wire period in which to corrupt (1 = first completed period).
    pub period: u32,
    /// Word index inside the received half.
    pub index: usize,
    /// Bit to invert (0..32).
    pub bit: u32,
}

/// Errors reported by [`MockSerialPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockPortError {
    /// Transfer operation before `configure_transfer`.
    #[error("port not configured")]
    NotConfigured,
    /// Configuration change while the port is running.
    #[error("port is running")]
    Running,
    /// Waiting on a port that was never started.
    #[error("port is not running")]
    NotRunning,
    /// Format rejected by validation.
    #[error("invalid data format: {0}")]
    InvalidFormat(FormatError),
    /// Requested half size does not fit the mock's buffers.
    #[error("transfer of {words} words per half exceeds capacity {capacity}")]
    TransferTooLarge {
        /// Requested words per half.
        words: usize,
        /// Mock capacity per half.
        capacity: usize,
    },
    /// Slice length differs from the configured half size.
    #[error("buffer length {got} does not match half size {expected}")]
    BufferSizeMismatch {
        /// Configured words per half.
        expected: usize,
        /// Caller's slice length.
        got: usize,
    },
    /// Word index past the end of the half.
    #[error("word index {0} out of range")]
    IndexOutOfRange(usize),
}

struct Endpoint<const N: usize> {
    tx: PingPongBuffer<N>,
    rx: PingPongBuffer<N>,
    format: Option<DataFormat>,
    words: usize,
    running: bool,
    hung: bool,
    periods_seen: u32,
}

impl<const N: usize> Endpoint<N> {
    const fn new() -> Self {
        Self {
            tx: PingPongBuffer::new(),
            rx: PingPongBuffer::new(),
            format: None,
            words: 0,
            running: false,
            hung: false,
            periods_seen: 0,
        }
    }
}

struct Lane {
    latency: usize,
    carry: [u32; MOCK_MAX_LATENCY],
    stalled_from: Option<u32>,
    flip: Option<BitFlip>,
}

impl Lane {
    const fn new() -> Self {
        Self {
            latency: 0,
            carry: [0; MOCK_MAX_LATENCY],
            stalled_from: None,
            flip: None,
        }
    }
}

struct WireState<const N: usize> {
    ends: [Endpoint<N>; 2],
    /// `lanes[i]` feeds the receiver of end `i`.
    lanes: [Lane; 2],
    route: Route,
    period: u32,
    shaper: Option<ReceiveShaper>,
}

impl<const N: usize> WireState<N> {
    fn end(&self, end: WireEnd) -> &Endpoint<N> {
        match end {
            WireEnd::A => &self.ends[0],
            WireEnd::B => &self.ends[1],
        }
    }

    fn end_mut(&mut self, end: WireEnd) -> &mut Endpoint<N> {
        match end {
            WireEnd::A => &mut self.ends[0],
            WireEnd::B => &mut self.ends[1],
        }
    }

    fn lane_mut(&mut self, receiver: WireEnd) -> &mut Lane {
        match receiver {
            WireEnd::A => &mut self.lanes[0],
            WireEnd::B => &mut self.lanes[1],
        }
    }

    /// Move one DMA period across every lane and complete both halves of
    /// every running port. A stalled lane leaves its receive half untouched.
    #[allow(clippy::indexing_slicing)] // Safety: words <= N and lat <= min(words, MOCK_MAX_LATENCY), checked below
    #[allow(clippy::arithmetic_side_effects)] // Safety: lat <= words, so words - lat never underflows
    fn advance(&mut self, done: &[TransferCompletion<NoopRawMutex>; 2]) {
        self.period = self.period.wrapping_add(1);
        let period = self.period;

        for receiver in [WireEnd::A, WireEnd::B] {
            let source = self.route.source(receiver);
            let (words, rx_active) = {
                let dst = self.end(receiver);
                if !dst.running {
                    continue;
                }
                (dst.words.min(N), dst.rx.active())
            };
            if self.lanes[receiver.index()]
                .stalled_from
                .is_some_and(|from| period >= from)
            {
                continue;
            }

            let mut sent = [0u32; N];
            let src = self.end(source);
            if src.running {
                let tx = src.tx.half(src.tx.active());
                let src_words = src.words.min(words);
                sent[..src_words].copy_from_slice(&tx[..src_words]);
                if let (Some(shape), Some(format)) = (self.shaper, src.format.as_ref()) {
                    for (i, word) in sent[..src_words].iter_mut().enumerate() {
                        *word = shape(format, i, *word);
                    }
                }
            }

            let lane = self.lane_mut(receiver);
            let lat = lane.latency.min(words).min(MOCK_MAX_LATENCY);
            let mut delivered = [0u32; N];
            delivered[..lat].copy_from_slice(&lane.carry[..lat]);
            delivered[lat..words].copy_from_slice(&sent[..words - lat]);
            lane.carry[..lat].copy_from_slice(&sent[words - lat..words]);
            if let Some(flip) = lane.flip {
                if flip.period == period && flip.index < words {
                    delivered[flip.index] ^= 1u32.wrapping_shl(flip.bit);
                    lane.flip = None;
                }
            }

            let dst = self.end_mut(receiver);
            dst.rx.half_mut(rx_active)[..words].copy_from_slice(&delivered[..words]);
        }

        for end in [WireEnd::A, WireEnd::B] {
            let ep = self.end_mut(end);
            if ep.running && !ep.hung {
                ep.tx.complete();
                ep.rx.complete();
                let flags = &done[end.index()];
                flags.notify(Direction::Tx);
                flags.notify(Direction::Rx);
            }
        }
    }
}

/// Host model of the serial-audio wiring between up to two ports.
///
/// `N` is the per-half capacity in words; each port may configure any
/// `words_per_half` up to `N`.
pub struct MockWire<const N: usize> {
    state: RefCell<WireState<N>>,
    done: [TransferCompletion<NoopRawMutex>; 2],
}

impl<const N: usize> MockWire<N> {
    fn with_route(route: Route) -> Self {
        Self {
            state: RefCell::new(WireState {
                ends: [Endpoint::new(), Endpoint::new()],
                lanes: [Lane::new(), Lane::new()],
                route,
                period: 0,
                shaper: None,
            }),
            done: [TransferCompletion::new(), TransferCompletion::new()],
        }
    }

    /// One port whose transmit output is wired to its own receive input.
    pub fn self_loopback() -> Self {
        Self::with_route(Route::SelfLoopback)
    }

    /// Two ports with crossed data lines (A.out → B.in, B.out → A.in).
    pub fn crossed() -> Self {
        Self::with_route(Route::Crossed)
    }

    /// Port handle for one end of the wire.
    pub fn port(&self, end: WireEnd) -> MockSerialPort<'_, N> {
        MockSerialPort { wire: self, end }
    }

    /// Delay the lane feeding `receiver` by `words` (clamped to [`MOCK_MAX_LATENCY`]).
    pub fn set_latency(&self, receiver: WireEnd, words: usize) {
        self.state.borrow_mut().lane_mut(receiver).latency = words.min(MOCK_MAX_LATENCY);
    }

    /// From the next period on, the receive half of `receiver` stops being
    /// written. Completions still fire, so the port hands out stale data.
    pub fn stall_lane(&self, receiver: WireEnd) {
        let next = self.period().wrapping_add(1);
        self.stall_lane_from(receiver, next);
    }

    /// Like [`stall_lane`](Self::stall_lane), starting at wire period `period`
    /// (1 = first completed period).
    pub fn stall_lane_from(&self, receiver: WireEnd, period: u32) {
        self.state.borrow_mut().lane_mut(receiver).stalled_from = Some(period);
    }

    /// Corrupt one word received by `receiver`.
    pub fn inject_bit_flip(&self, receiver: WireEnd, flip: BitFlip) {
        self.state.borrow_mut().lane_mut(receiver).flip = Some(flip);
    }

    /// `end` stops raising completion flags; its next wait never returns.
    /// Reconfiguring the port does not clear this.
    pub fn hang(&self, end: WireEnd) {
        self.state.borrow_mut().end_mut(end).hung = true;
    }

    /// Apply `shaper` to every word on its way across the wire.
    pub fn set_receive_shaper(&self, shaper: Option<ReceiveShaper>) {
        self.state.borrow_mut().shaper = shaper;
    }

    /// Periods completed so far.
    pub fn period(&self) -> u32 {
        self.state.borrow().period
    }

    /// `true` while `end` is started.
    pub fn is_running(&self, end: WireEnd) -> bool {
        self.state.borrow().end(end).running
    }

    /// Copy of the transmit half `half` of `end` (test inspection).
    pub fn tx_snapshot(&self, end: WireEnd, half: BufferHalf) -> [u32; N] {
        *self.state.borrow().end(end).tx.half(half)
    }
}

/// One port attached to a [`MockWire`].
pub struct MockSerialPort<'w, const N: usize> {
    wire: &'w MockWire<N>,
    end: WireEnd,
}

impl<const N: usize> MockSerialPort<'_, N> {
    /// Which end of the wire this port is.
    pub fn end(&self) -> WireEnd {
        self.end
    }

    fn configured_words(&self) -> Result<usize, MockPortError> {
        let state = self.wire.state.borrow();
        let ep = state.end(self.end);
        if ep.format.is_none() {
            return Err(MockPortError::NotConfigured);
        }
        Ok(ep.words)
    }
}

impl<const N: usize> SerialAudioPort for MockSerialPort<'_, N> {
    type Error = MockPortError;

    fn configure_transfer(
        &mut self,
        format: &DataFormat,
        transfer: TransferConfig,
    ) -> Result<(), Self::Error> {
        format.validate().map_err(MockPortError::InvalidFormat)?;
        if transfer.words_per_half == 0 || transfer.words_per_half > N {
            return Err(MockPortError::TransferTooLarge {
                words: transfer.words_per_half,
                capacity: N,
            });
        }
        let mut state = self.wire.state.borrow_mut();
        let ep = state.end_mut(self.end);
        if ep.running {
            return Err(MockPortError::Running);
        }
        ep.tx.reset();
        ep.rx.reset();
        ep.format = Some(*format);
        ep.words = transfer.words_per_half;
        let lane = state.lane_mut(self.end);
        lane.carry = [0; MOCK_MAX_LATENCY];
        Ok(())
    }

    fn load_tx(&mut self, half: BufferHalf, words: &[u32]) -> Result<(), Self::Error> {
        let expected = self.configured_words()?;
        if words.len() != expected {
            return Err(MockPortError::BufferSizeMismatch {
                expected,
                got: words.len(),
            });
        }
        let mut state = self.wire.state.borrow_mut();
        let dst = state
            .end_mut(self.end)
            .tx
            .half_mut(half)
            .get_mut(..expected)
            .ok_or(MockPortError::TransferTooLarge {
                words: expected,
                capacity: N,
            })?;
        dst.copy_from_slice(words);
        Ok(())
    }

    fn write_tx_word(
        &mut self,
        half: BufferHalf,
        index: usize,
        word: u32,
    ) -> Result<(), Self::Error> {
        let words = self.configured_words()?;
        if index >= words {
            return Err(MockPortError::IndexOutOfRange(index));
        }
        let mut state = self.wire.state.borrow_mut();
        let slot = state
            .end_mut(self.end)
            .tx
            .half_mut(half)
            .get_mut(index)
            .ok_or(MockPortError::IndexOutOfRange(index))?;
        *slot = word;
        Ok(())
    }

    fn start_transfer(&mut self) -> Result<(), Self::Error> {
        self.configured_words()?;
        let mut state = self.wire.state.borrow_mut();
        let period = state.period;
        let ep = state.end_mut(self.end);
        ep.running = true;
        ep.periods_seen = period;
        self.wire.done[self.end.index()].reset();
        Ok(())
    }

    fn stop_transfer(&mut self) -> Result<(), Self::Error> {
        self.wire.state.borrow_mut().end_mut(self.end).running = false;
        Ok(())
    }

    async fn wait_for_completion(&mut self) -> Result<(), Self::Error> {
        let hung = {
            let mut state = self.wire.state.borrow_mut();
            let (running, hung, seen) = {
                let ep = state.end(self.end);
                (ep.running, ep.hung, ep.periods_seen)
            };
            if !running {
                return Err(MockPortError::NotRunning);
            }
            if !hung {
                if seen == state.period {
                    state.advance(&self.wire.done);
                }
                let ep = state.end_mut(self.end);
                ep.periods_seen = ep.periods_seen.wrapping_add(1);
            }
            hung
        };
        if hung {
            core::future::pending::<()>().await;
        }
        self.wire.done[self.end.index()].wait_both().await;
        Ok(())
    }

    fn get_completed_buffer(&self, direction: Direction) -> Option<BufferHalf> {
        let state = self.wire.state.borrow();
        let ep = state.end(self.end);
        match direction {
            Direction::Tx => ep.tx.completed(),
            Direction::Rx => ep.rx.completed(),
        }
    }

    fn read_rx(&self, half: BufferHalf, out: &mut [u32]) -> Result<usize, Self::Error> {
        let words = self.configured_words()?;
        let state = self.wire.state.borrow();
        let src = state.end(self.end).rx.half(half);
        match (out.get_mut(..words), src.get(..words)) {
            (Some(dst), Some(src)) => {
                dst.copy_from_slice(src);
                Ok(words)
            }
            _ => Err(MockPortError::BufferSizeMismatch {
                expected: words,
                got: out.len(),
            }),
        }
    }
}
