//! I2S/TDM full-duplex loopback verification
//!
//! Checks that a serial-audio receiver reproduced what a transmitter sent,
//! allowing for an unknown pipeline delay between the two DMA streams and
//! for the padding bits each sample width leaves in its 32-bit word.
//!
//! - [`layout`] - frame layout (phase, channels, widths) taken from a [`platform::DataFormat`]
//! - [`mask`] - per-word comparison masks derived from the layout
//! - [`word_view`] - receive buffer re-read at a byte offset (packed samples)
//! - [`verifier`] - alignment search and body comparison
//! - [`pattern`] - transmit test patterns and per-iteration markers
//! - [`runner`] - the ping-pong test loop over [`platform::SerialAudioPort`]s
//!
//! # Example
//!
//! ```
//! use loopback::{layout::FrameLayout, verify};
//! use platform::SampleWidth;
//!
//! let layout = FrameLayout::single(2, SampleWidth::Bits32);
//! let tx: [u32; 8] = core::array::from_fn(|i| 0x1000 + i as u32);
//! let mut rx = [0u32; 11];
//! rx[3..].copy_from_slice(&tx);
//! assert!(verify(&rx, &tx, tx.len(), &layout));
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![allow(async_fn_in_trait)]

mod log;

pub mod layout;
pub mod mask;
pub mod pattern;
pub mod runner;
pub mod verifier;
pub mod word_view;

pub use layout::{FrameLayout, LayoutError};
pub use mask::MaskTable;
pub use pattern::{marker_word, PatternFill, PatternKind};
pub use runner::{
    FormatReport, LoopbackConfig, LoopbackError, LoopbackRunner, Path, RunSummary,
    MAX_SUITE_FORMATS,
};
pub use verifier::{verify, Alignment, AlignmentPolicy, Verifier, VerifierConfig, VerifyError};
pub use word_view::WordView;
