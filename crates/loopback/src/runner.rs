//! Ping-pong loopback test loop
//!
//! Drives one or two [`SerialAudioPort`]s through repeated DMA periods and
//! verifies every completed receive half against a shadow copy of what the
//! peer transmitted in that half.
//!
//! Per period:
//!
//! 1. wait for TX and RX completion on every port (bounded by a timeout);
//! 2. resolve the completed halves;
//! 3. stamp a fresh marker word into the middle of every live TX half;
//! 4. verify each receive half against the peer's shadow copy;
//! 5. copy the new markers into the shadow copies.
//!
//! The shadow copies are updated *after* verification because the half that
//! just completed was sent before step 3 ran.

use embassy_futures::join::join;
use embassy_time::{with_timeout, Duration};
use platform::config::{
    banner, APP_NAME, APP_VERSION, DEFAULT_COMPLETION_TIMEOUT_MS, DEFAULT_ITERATIONS,
};
use platform::{
    BufferHalf, DataFormat, Direction, FormatError, PortRole, SerialAudioPort, TransferConfig,
};
use thiserror_no_std::Error;

use crate::layout::FrameLayout;
use crate::log::{log_debug, log_error, log_info};
use crate::pattern::{marker_word, PatternFill, PatternKind};
use crate::verifier::{Alignment, Verifier, VerifierConfig, VerifyError};

/// Most formats a single [`LoopbackRunner::run_suite`] call reports on.
pub const MAX_SUITE_FORMATS: usize = 8;

const HALVES: [BufferHalf; 2] = [BufferHalf::Ping, BufferHalf::Pong];

/// Which stream a verification covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Path {
    /// First port's transmit, received by the second port.
    AToB,
    /// Second port's transmit, received by the first port.
    BToA,
    /// A port's transmit, received by itself.
    SelfLoop,
}

impl core::fmt::Display for Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::AToB => "A->B",
            Self::BToA => "B->A",
            Self::SelfLoop => "self",
        })
    }
}

/// Test-loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackConfig {
    /// Passing periods required before a run counts as passed.
    pub iterations: u32,
    /// Transmit buffer contents.
    pub pattern: PatternKind,
    /// Verifier tuning.
    pub verifier: VerifierConfig,
    /// Longest wait for one period's completions.
    pub completion_timeout_ms: u64,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            pattern: PatternKind::default(),
            verifier: VerifierConfig::default(),
            completion_timeout_ms: DEFAULT_COMPLETION_TIMEOUT_MS,
        }
    }
}

/// Loop failures. `E` is the port's error type.
#[derive(Debug, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopbackError<E: core::fmt::Debug> {
    /// The port driver failed.
    #[error("port error: {0:?}")]
    Port(E),
    /// The data format cannot be programmed.
    #[error("invalid data format: {0}")]
    InvalidFormat(FormatError),
    /// The format has no usable frame layout.
    #[error("invalid frame layout: {0}")]
    Layout(VerifyError),
    /// The half size does not fit the runner's buffers.
    #[error("{words} words per half does not fit 2..={capacity}")]
    BufferCapacity {
        /// Requested words per half.
        words: usize,
        /// Runner capacity per half.
        capacity: usize,
    },
    /// A period did not complete in time.
    #[error("iteration {iteration}: transfer did not complete")]
    Timeout {
        /// 1-based iteration.
        iteration: u32,
    },
    /// A port signalled completion but reports no completed half.
    #[error("iteration {iteration}: no completed buffer")]
    NoCompletedBuffer {
        /// 1-based iteration.
        iteration: u32,
    },
    /// The port returned fewer receive words than one half holds.
    #[error("iteration {iteration}: read {got} of {expected} receive words")]
    ShortRead {
        /// 1-based iteration.
        iteration: u32,
        /// Words per half.
        expected: usize,
        /// Words the port copied.
        got: usize,
    },
    /// Received data did not match.
    #[error("iteration {iteration} FAILED on {path}: {error}")]
    Verify {
        /// 1-based iteration.
        iteration: u32,
        /// Stream that failed.
        path: Path,
        /// What the verifier found.
        error: VerifyError,
    },
}

/// Outcome of a passing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunSummary {
    /// Iterations that passed.
    pub iterations: u32,
    /// Last alignment of the A→B (or self-loop) stream.
    pub forward: Option<Alignment>,
    /// Last alignment of the B→A stream (duplex runs only).
    pub reverse: Option<Alignment>,
}

/// One entry of a suite run.
#[derive(Debug)]
pub struct FormatReport<E: core::fmt::Debug> {
    /// Position in the suite.
    pub index: usize,
    /// Format under test.
    pub format: DataFormat,
    /// Run result.
    pub outcome: Result<RunSummary, LoopbackError<E>>,
}

impl<E: core::fmt::Debug> FormatReport<E> {
    /// `true` when the format passed every iteration.
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

struct Completed {
    rx: BufferHalf,
    tx: BufferHalf,
}

fn completed<P: SerialAudioPort>(
    port: &P,
    iteration: u32,
) -> Result<Completed, LoopbackError<P::Error>> {
    let missing = LoopbackError::NoCompletedBuffer { iteration };
    let rx = port.get_completed_buffer(Direction::Rx);
    let tx = port.get_completed_buffer(Direction::Tx);
    match (rx, tx) {
        (Some(rx), Some(tx)) => Ok(Completed { rx, tx }),
        _ => Err(missing),
    }
}

fn peer_role(role: PortRole) -> PortRole {
    match role {
        PortRole::Master => PortRole::Slave,
        PortRole::Slave => PortRole::Master,
    }
}

/// Loopback test loop with room for `N` words per half.
///
/// Holds the transmit shadow copies (ping and pong for each of two ports)
/// and one receive scratch half.
pub struct LoopbackRunner<const N: usize> {
    config: LoopbackConfig,
    shadow: [[[u32; N]; 2]; 2],
    rx: [u32; N],
}

impl<const N: usize> LoopbackRunner<N> {
    /// Runner with zeroed buffers.
    pub const fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            shadow: [[[0; N]; 2]; 2],
            rx: [0; N],
        }
    }

    /// Settings in use.
    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Shadow copy of transmit half `half` of port `port` (0 or 1).
    pub fn shadow(&self, port: usize, half: BufferHalf) -> Option<&[u32; N]> {
        self.shadow.get(port)?.get(half.index())
    }

    fn prepare<E: core::fmt::Debug>(
        &self,
        format: &DataFormat,
        transfer: TransferConfig,
    ) -> Result<Verifier, LoopbackError<E>> {
        format.validate().map_err(|err| {
            log_error!("invalid data format: {}", err);
            LoopbackError::InvalidFormat(err)
        })?;
        let words = transfer.words_per_half;
        if !(2..=N).contains(&words) {
            return Err(LoopbackError::BufferCapacity { words, capacity: N });
        }
        self.verifier_for(&FrameLayout::from_format(format))
    }

    fn verifier_for<E: core::fmt::Debug>(
        &self,
        layout: &FrameLayout,
    ) -> Result<Verifier, LoopbackError<E>> {
        Verifier::new(layout, self.config.verifier).map_err(LoopbackError::Layout)
    }

    #[allow(clippy::indexing_slicing)] // Safety: port < 2 at every call site; words <= N checked in prepare()
    fn shadow_words(&self, port: usize, half: BufferHalf, words: usize) -> &[u32] {
        &self.shadow[port][half.index()][..words]
    }

    #[allow(clippy::indexing_slicing)] // Safety: port < 2 at every call site; words <= N checked in prepare()
    fn load_port<P: SerialAudioPort>(
        &mut self,
        port: &mut P,
        index: usize,
        fill: &mut PatternFill,
        words: usize,
    ) -> Result<(), LoopbackError<P::Error>> {
        for half in HALVES {
            let shadow = &mut self.shadow[index][half.index()][..words];
            fill.fill(half, shadow);
            port.load_tx(half, shadow).map_err(LoopbackError::Port)?;
        }
        Ok(())
    }

    fn stamp_markers<P: SerialAudioPort>(
        port: &mut P,
        index: usize,
        iteration: u32,
        mid: usize,
    ) -> Result<(), LoopbackError<P::Error>> {
        #[allow(clippy::cast_possible_truncation)] // index is 0 or 1
        let port_id = index as u32;
        for half in HALVES {
            port.write_tx_word(half, mid, marker_word(iteration, port_id, half))
                .map_err(LoopbackError::Port)?;
        }
        Ok(())
    }

    #[allow(clippy::indexing_slicing)] // Safety: port < 2 at every call site; mid < words <= N
    fn commit_markers(&mut self, index: usize, iteration: u32, mid: usize) {
        #[allow(clippy::cast_possible_truncation)] // index is 0 or 1
        let port_id = index as u32;
        for half in HALVES {
            self.shadow[index][half.index()][mid] = marker_word(iteration, port_id, half);
        }
    }

    /// Read the completed receive half of `receiver` and check it against
    /// the shadow copy of `sender`'s completed transmit half.
    #[allow(clippy::indexing_slicing)] // Safety: words <= N checked in prepare()
    #[allow(clippy::too_many_arguments)]
    fn verify_path<P: SerialAudioPort>(
        &mut self,
        verifier: &Verifier,
        iteration: u32,
        receiver: &P,
        rx_half: BufferHalf,
        sender: usize,
        tx_half: BufferHalf,
        words: usize,
    ) -> Result<Result<Alignment, VerifyError>, LoopbackError<P::Error>> {
        let got = receiver
            .read_rx(rx_half, &mut self.rx[..words])
            .map_err(LoopbackError::Port)?;
        if got != words {
            log_error!("Iteration {}: short receive read, {} of {} words", iteration, got, words);
            return Err(LoopbackError::ShortRead {
                iteration,
                expected: words,
                got,
            });
        }
        Ok(verifier.check(&self.rx[..words], self.shadow_words(sender, tx_half, words), words))
    }

    /// Two ports with crossed data lines. `a` takes `transfer.role`, `b`
    /// the opposite role; the slave is started first.
    ///
    /// Transfers are stopped before returning, pass or fail.
    pub async fn run_duplex<P: SerialAudioPort>(
        &mut self,
        a: &mut P,
        b: &mut P,
        format: &DataFormat,
        transfer: TransferConfig,
    ) -> Result<RunSummary, LoopbackError<P::Error>> {
        let verifier = self.prepare::<P::Error>(format, transfer)?;
        let words = transfer.words_per_half;
        let b_transfer = TransferConfig {
            role: peer_role(transfer.role),
            ..transfer
        };

        a.configure_transfer(format, transfer).map_err(LoopbackError::Port)?;
        b.configure_transfer(format, b_transfer).map_err(LoopbackError::Port)?;

        let mut fill = PatternFill::new(self.config.pattern);
        self.load_port(a, 0, &mut fill, words)?;
        self.load_port(b, 1, &mut fill, words)?;

        let started = if transfer.role == PortRole::Master {
            b.start_transfer().and_then(|()| a.start_transfer())
        } else {
            a.start_transfer().and_then(|()| b.start_transfer())
        };

        let outcome = match started {
            Ok(()) => self.drive_duplex(&verifier, a, b, words).await,
            Err(err) => Err(LoopbackError::Port(err)),
        };
        let stop_a = a.stop_transfer();
        let stop_b = b.stop_transfer();
        let summary = outcome?;
        stop_a.map_err(LoopbackError::Port)?;
        stop_b.map_err(LoopbackError::Port)?;
        Ok(summary)
    }

    async fn drive_duplex<P: SerialAudioPort>(
        &mut self,
        verifier: &Verifier,
        a: &mut P,
        b: &mut P,
        words: usize,
    ) -> Result<RunSummary, LoopbackError<P::Error>> {
        let timeout = Duration::from_millis(self.config.completion_timeout_ms);
        let mid = words / 2;
        let mut summary = RunSummary::default();

        for iteration in 1..=self.config.iterations {
            let (done_a, done_b) =
                with_timeout(timeout, join(a.wait_for_completion(), b.wait_for_completion()))
                    .await
                    .map_err(|_| {
                        log_error!("Iteration {} timed out waiting for DMA completion", iteration);
                        LoopbackError::Timeout { iteration }
                    })?;
            done_a.map_err(LoopbackError::Port)?;
            done_b.map_err(LoopbackError::Port)?;

            let halves_a = completed(a, iteration)?;
            let halves_b = completed(b, iteration)?;

            Self::stamp_markers(a, 0, iteration, mid)?;
            Self::stamp_markers(b, 1, iteration, mid)?;

            let forward = self.verify_path(verifier, iteration, b, halves_b.rx, 0, halves_a.tx, words)?;
            let reverse = self.verify_path(verifier, iteration, a, halves_a.rx, 1, halves_b.tx, words)?;

            self.commit_markers(0, iteration, mid);
            self.commit_markers(1, iteration, mid);

            match (forward, reverse) {
                (Ok(fwd), Ok(rev)) => {
                    log_info!("Loopback Iteration {} PASSED!", iteration);
                    log_debug!("offsets: A->B {}, B->A {}", fwd.offset, rev.offset);
                    summary.iterations = iteration;
                    summary.forward = Some(fwd);
                    summary.reverse = Some(rev);
                }
                (Err(error), _) => {
                    log_error!("---ERROR--- Loopback Iteration {} FAILED!", iteration);
                    return Err(LoopbackError::Verify {
                        iteration,
                        path: Path::AToB,
                        error,
                    });
                }
                (_, Err(error)) => {
                    log_error!("---ERROR--- Loopback Iteration {} FAILED!", iteration);
                    return Err(LoopbackError::Verify {
                        iteration,
                        path: Path::BToA,
                        error,
                    });
                }
            }
        }
        Ok(summary)
    }

    /// One port whose output is looped to its own input.
    ///
    /// The transfer is stopped before returning, pass or fail.
    pub async fn run_self<P: SerialAudioPort>(
        &mut self,
        port: &mut P,
        format: &DataFormat,
        transfer: TransferConfig,
    ) -> Result<RunSummary, LoopbackError<P::Error>> {
        let verifier = self.prepare::<P::Error>(format, transfer)?;
        let words = transfer.words_per_half;

        port.configure_transfer(format, transfer).map_err(LoopbackError::Port)?;
        let mut fill = PatternFill::new(self.config.pattern);
        self.load_port(port, 0, &mut fill, words)?;

        let outcome = match port.start_transfer() {
            Ok(()) => self.drive_self(&verifier, port, words).await,
            Err(err) => Err(LoopbackError::Port(err)),
        };
        let stopped = port.stop_transfer();
        let summary = outcome?;
        stopped.map_err(LoopbackError::Port)?;
        Ok(summary)
    }

    async fn drive_self<P: SerialAudioPort>(
        &mut self,
        verifier: &Verifier,
        port: &mut P,
        words: usize,
    ) -> Result<RunSummary, LoopbackError<P::Error>> {
        let timeout = Duration::from_millis(self.config.completion_timeout_ms);
        let mid = words / 2;
        let mut summary = RunSummary::default();

        for iteration in 1..=self.config.iterations {
            with_timeout(timeout, port.wait_for_completion())
                .await
                .map_err(|_| {
                    log_error!("Iteration {} timed out waiting for DMA completion", iteration);
                    LoopbackError::Timeout { iteration }
                })?
                .map_err(LoopbackError::Port)?;

            let halves = completed(port, iteration)?;
            Self::stamp_markers(port, 0, iteration, mid)?;
            let result = self.verify_path(verifier, iteration, port, halves.rx, 0, halves.tx, words)?;
            self.commit_markers(0, iteration, mid);

            match result {
                Ok(alignment) => {
                    log_info!("Loopback Iteration {} PASSED!", iteration);
                    summary.iterations = iteration;
                    summary.forward = Some(alignment);
                }
                Err(error) => {
                    log_error!("---ERROR--- Loopback Iteration {} FAILED!", iteration);
                    return Err(LoopbackError::Verify {
                        iteration,
                        path: Path::SelfLoop,
                        error,
                    });
                }
            }
        }
        Ok(summary)
    }

    /// [`run_duplex`](Self::run_duplex) over each format in turn, carrying on
    /// after failures. At most [`MAX_SUITE_FORMATS`] formats are run.
    pub async fn run_suite<P: SerialAudioPort>(
        &mut self,
        a: &mut P,
        b: &mut P,
        formats: &[DataFormat],
        transfer: TransferConfig,
    ) -> heapless::Vec<FormatReport<P::Error>, MAX_SUITE_FORMATS> {
        log_info!(
            "{} v{} - {}: {} formats",
            APP_NAME,
            APP_VERSION,
            banner(),
            formats.len().min(MAX_SUITE_FORMATS)
        );
        let mut reports = heapless::Vec::new();
        for (index, format) in formats.iter().take(MAX_SUITE_FORMATS).enumerate() {
            log_info!("Loopback Test with Configuration {}...", index);
            let outcome = self.run_duplex(a, b, format, transfer).await;
            let report = FormatReport {
                index,
                format: *format,
                outcome,
            };
            if reports.push(report).is_err() {
                break;
            }
        }
        log_info!("Ran to End!");
        reports
    }
}
