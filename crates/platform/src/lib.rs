//! Hardware Abstraction Layer (HAL) for serial-audio loopback testing
//!
//! This crate provides trait-based abstractions for the I2S/TDM transfer
//! subsystem, so the loopback verifier and its test loop run unchanged on
//! hardware and on the host.
//!
//! # Architecture Layers
//!
//! ```text
//! Test application (loopback runner)
//!         ↓
//! Verifier (loopback crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Vendor I2S/DMA driver
//! ```
//!
//! # Building Blocks
//!
//! - [`SerialAudioPort`] - configure, start, and drain one I2S/TDM port
//! - [`DataFormat`] - phase / channel / width record programmed into the port
//! - [`PingPongBuffer`] - double-buffered DMA target with completed-half query
//! - [`TransferCompletion`] - interrupt → task completion signalling
//! - [`audio_types`] - sample-width newtypes
//!
//! # Features
//!
//! - `std`: host mocks ([`mocks`]) for downstream tests
//! - `defmt`: `defmt::Format` derives on all public types
//!
//! # Example
//!
//! ```no_run
//! use platform::{Direction, SerialAudioPort};
//!
//! async fn drain<P: SerialAudioPort>(port: &mut P, out: &mut [u32]) -> Result<usize, P::Error> {
//!     port.wait_for_completion().await?;
//!     match port.get_completed_buffer(Direction::Rx) {
//!         Some(half) => port.read_rx(half, out),
//!         None => Ok(0),
//!     }
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names and hex masks in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod audio;
pub mod audio_config;
pub mod audio_types;
pub mod completion;
pub mod config;
pub mod dma;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export the port trait and its vocabulary
pub use audio::{Direction, SerialAudioPort};
pub use audio_config::{DataFormat, DataPhase, FormatError, Justification, PortRole, TransferConfig};
pub use audio_types::{OutOfRangeError, SampleWidth, UnsupportedWidthError};

// Re-export DMA and completion types
pub use completion::{IsrCompletion, TransferCompletion};
pub use dma::{BufferHalf, PingPongBuffer};
