//! Transfer-completion signalling
//!
//! The I2S/DMA interrupt raises one flag per direction when a ping-pong half
//! completes. The test task waits until both flags of a port are up, then
//! clears them. [`TransferCompletion`] models that pair of flags with Embassy
//! signals so the waiting task sleeps instead of spinning.
//!
//! # ISR usage
//!
//! ```ignore
//! static PORT0_DONE: IsrCompletion = IsrCompletion::new();
//!
//! #[interrupt]
//! fn I2S0() {
//!     // ... clear hardware status ...
//!     PORT0_DONE.notify(Direction::Rx);
//!     PORT0_DONE.notify(Direction::Tx);
//! }
//! ```

use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::signal::Signal;

use crate::audio::Direction;

/// Per-port completion flags, one per direction.
pub struct TransferCompletion<M: RawMutex> {
    tx: Signal<M, ()>,
    rx: Signal<M, ()>,
}

/// Completion flags shareable between an interrupt handler and a task.
pub type IsrCompletion = TransferCompletion<CriticalSectionRawMutex>;

impl<M: RawMutex> Default for TransferCompletion<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> TransferCompletion<M> {
    /// Both flags down.
    pub const fn new() -> Self {
        Self {
            tx: Signal::new(),
            rx: Signal::new(),
        }
    }

    fn flag(&self, direction: Direction) -> &Signal<M, ()> {
        match direction {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        }
    }

    /// Raise the flag for `direction` (interrupt side).
    pub fn notify(&self, direction: Direction) {
        self.flag(direction).signal(());
    }

    /// `true` if the flag for `direction` is up and not yet consumed.
    pub fn is_pending(&self, direction: Direction) -> bool {
        self.flag(direction).signaled()
    }

    /// Wait for the flag for `direction` and consume it.
    pub async fn wait(&self, direction: Direction) {
        self.flag(direction).wait().await;
    }

    /// Wait until both the TX and RX flags are up, consuming both.
    pub async fn wait_both(&self) {
        join(self.tx.wait(), self.rx.wait()).await;
    }

    /// Drop any pending flags (used when a transfer is restarted).
    pub fn reset(&self) {
        self.tx.reset();
        self.rx.reset();
    }
}
