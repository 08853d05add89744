//! Full-duplex sample stream verifier
//!
//! Decides whether a receive buffer reproduces a transmit buffer:
//!
//! 1. derive the comparison masks from the frame layout ([`MaskTable`]);
//! 2. find the offset `k` where `rx[k] == tx[0] & mask(0)` and
//!    `rx[k + 1] == tx[1] & mask(1)`, for `k` up to the search bound, at
//!    every byte offset when samples are packed;
//! 3. require `rx[k + i] == tx[i] & mask(i)` for every `i` in `2..n` whose
//!    receive index is still inside the buffer.
//!
//! Receive words are compared as delivered. The receiver zeroes padding
//! bits, so only the transmit side is masked.

use platform::config::DEFAULT_MAX_SEARCH_OFFSET;
use thiserror_no_std::Error;

use crate::layout::{FrameLayout, LayoutError};
use crate::log::{log_debug, log_error, log_warn};
use crate::mask::MaskTable;
use crate::word_view::WordView;

const ALIGNED: [u8; 1] = [0];
const ANY_BYTE: [u8; 4] = [0, 1, 2, 3];

/// How to pick among several positions that match the two-word prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignmentPolicy {
    /// The first prefix match is the alignment; a body mismatch fails.
    #[default]
    FirstMatch,
    /// Try prefix matches in order until one passes the body comparison.
    /// Guards against a false prefix match ahead of the true offset.
    Exhaustive,
}

/// Verifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VerifierConfig {
    /// Largest receive offset searched for the first transmit word.
    pub max_search_offset: usize,
    /// Prefix-match policy.
    pub policy: AlignmentPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_search_offset: DEFAULT_MAX_SEARCH_OFFSET,
            policy: AlignmentPolicy::FirstMatch,
        }
    }
}

/// Where the transmit stream was found in the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alignment {
    /// Receive word index of transmit word 0.
    pub offset: usize,
    /// Byte offset inside the receive words (non-zero only for packed layouts).
    pub byte_offset: u8,
    /// Search positions stepped over before the match.
    pub search_steps: usize,
    /// Body words compared.
    pub compared: usize,
    /// Body words skipped because they fell past the receive buffer.
    pub skipped_tail: usize,
    /// Prefix matches tried, including the accepted one.
    pub candidates: usize,
}

/// Verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerifyError {
    /// Sample width outside {8, 16, 24, 32}.
    #[error("invalid sample length: {0} bits")]
    UnsupportedWidth(u32),
    /// Frame layout with no channels.
    #[error("frame has no channels")]
    EmptyFrame,
    /// `n < 2`, or a buffer shorter than `n`.
    #[error("buffers too short: n = {n}, rx = {rx_len}, tx = {tx_len}")]
    BufferTooShort {
        /// Words to verify.
        n: usize,
        /// Receive buffer length.
        rx_len: usize,
        /// Transmit buffer length.
        tx_len: usize,
    },
    /// No two-word prefix match within the search bound.
    #[error("did not find the beginning word in RX buffer ({searched} positions, bound {max_offset})")]
    AlignmentNotFound {
        /// Receive positions examined.
        searched: usize,
        /// Configured search bound.
        max_offset: usize,
    },
    /// A body word differs after alignment.
    #[error("tx word {index} (rx word {rx_index}): expected {expected:#010x}, got {actual:#010x}")]
    Mismatch {
        /// Transmit word index.
        index: usize,
        /// Receive word index (`index + offset`).
        rx_index: usize,
        /// Masked transmit word.
        expected: u32,
        /// Received word.
        actual: u32,
    },
}

impl From<LayoutError> for VerifyError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::UnsupportedWidth(bits) => Self::UnsupportedWidth(bits),
            LayoutError::EmptyFrame => Self::EmptyFrame,
        }
    }
}

struct BodyStats {
    compared: usize,
    skipped_tail: usize,
}

/// Verifier bound to one frame layout.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    masks: MaskTable,
    config: VerifierConfig,
}

impl Verifier {
    /// Derive the masks for `layout`.
    ///
    /// # Errors
    ///
    /// Configuration errors from the layout ([`VerifyError::EmptyFrame`]).
    pub fn new(layout: &FrameLayout, config: VerifierConfig) -> Result<Self, VerifyError> {
        let masks = MaskTable::derive(layout).map_err(|err| {
            log_error!("invalid frame layout: {}", err);
            VerifyError::from(err)
        })?;
        Ok(Self { masks, config })
    }

    /// Masks in use.
    pub fn masks(&self) -> &MaskTable {
        &self.masks
    }

    /// Tuning in use.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Check the first `n` words of `tx` against `rx`.
    ///
    /// # Errors
    ///
    /// [`VerifyError::BufferTooShort`], [`VerifyError::AlignmentNotFound`]
    /// or the [`VerifyError::Mismatch`] that rejected the alignment (the
    /// first one tried under [`AlignmentPolicy::Exhaustive`]).
    pub fn check(&self, rx: &[u32], tx: &[u32], n: usize) -> Result<Alignment, VerifyError> {
        let too_short = VerifyError::BufferTooShort {
            n,
            rx_len: rx.len(),
            tx_len: tx.len(),
        };
        if n < 2 || rx.len() < n {
            return Err(too_short);
        }
        let tx = tx.get(..n).ok_or(too_short)?;
        let (first, second) = match tx {
            [a, b, ..] => (a & self.masks.mask_for(0), b & self.masks.mask_for(1)),
            _ => return Err(too_short),
        };

        let offsets: &[u8] = if self.masks.is_packed() {
            &ANY_BYTE
        } else {
            &ALIGNED
        };
        let max_offset = self.config.max_search_offset;
        let mut searched = 0usize;
        let mut candidates = 0usize;
        let mut rejected: Option<VerifyError> = None;

        for k in 0..=max_offset {
            let next = k.saturating_add(1);
            if next >= rx.len() {
                break;
            }
            searched = next;
            for &byte_offset in offsets {
                let view = WordView::new(rx, byte_offset);
                if view.get(k) != Some(first) || view.get(next) != Some(second) {
                    continue;
                }
                candidates = candidates.saturating_add(1);
                match self.compare_body(&view, tx, k) {
                    Ok(stats) => {
                        log_debug!(
                            "aligned at word {} byte {} ({} compared, {} past end)",
                            k,
                            byte_offset,
                            stats.compared,
                            stats.skipped_tail
                        );
                        return Ok(Alignment {
                            offset: k,
                            byte_offset,
                            search_steps: k,
                            compared: stats.compared,
                            skipped_tail: stats.skipped_tail,
                            candidates,
                        });
                    }
                    Err(err) => {
                        if self.config.policy == AlignmentPolicy::FirstMatch {
                            log_warn!("{}", err);
                            return Err(err);
                        }
                        rejected.get_or_insert(err);
                    }
                }
            }
        }

        if let Some(err) = rejected {
            log_warn!("{} ({} prefix candidates rejected)", err, candidates);
            return Err(err);
        }
        log_error!("Did not find the beginning word in RX buffer!");
        Err(VerifyError::AlignmentNotFound {
            searched,
            max_offset,
        })
    }

    fn compare_body(&self, rx: &WordView<'_>, tx: &[u32], k: usize) -> Result<BodyStats, VerifyError> {
        let mut stats = BodyStats {
            compared: 0,
            skipped_tail: 0,
        };
        for (index, &word) in tx.iter().enumerate().skip(2) {
            let Some(rx_index) = index.checked_add(k) else {
                stats.skipped_tail = stats.skipped_tail.saturating_add(1);
                continue;
            };
            let Some(actual) = rx.get(rx_index) else {
                stats.skipped_tail = stats.skipped_tail.saturating_add(1);
                continue;
            };
            let expected = word & self.masks.mask_for(index);
            if actual != expected {
                return Err(VerifyError::Mismatch {
                    index,
                    rx_index,
                    expected,
                    actual,
                });
            }
            stats.compared = stats.compared.saturating_add(1);
        }
        Ok(stats)
    }
}

/// `true` when `rx` reproduces the first `n` words of `tx` under `layout`,
/// using the default search bound and first-match alignment.
///
/// Failures are logged; use [`Verifier::check`] for the reason.
pub fn verify(rx: &[u32], tx: &[u32], n: usize, layout: &FrameLayout) -> bool {
    Verifier::new(layout, VerifierConfig::default())
        .and_then(|verifier| verifier.check(rx, tx, n))
        .is_ok()
}
