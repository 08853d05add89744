//! Serial-audio port abstraction

use crate::audio_config::{DataFormat, TransferConfig};
use crate::dma::BufferHalf;

/// Transfer direction of a full-duplex port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Transmit (memory → wire).
    Tx,
    /// Receive (wire → memory).
    Rx,
}

/// One full-duplex I2S/TDM port with ping-pong DMA in both directions.
///
/// Call order for a loopback run:
///
/// 1. [`configure_transfer`](Self::configure_transfer)
/// 2. [`load_tx`](Self::load_tx) for both halves
/// 3. [`start_transfer`](Self::start_transfer) (slave before master)
/// 4. per period: [`wait_for_completion`](Self::wait_for_completion), then
///    [`get_completed_buffer`](Self::get_completed_buffer) per direction
/// 5. [`stop_transfer`](Self::stop_transfer)
pub trait SerialAudioPort {
    /// Error type
    type Error: core::fmt::Debug;

    /// Program the data format and DMA sizing. The port must be stopped.
    fn configure_transfer(
        &mut self,
        format: &DataFormat,
        transfer: TransferConfig,
    ) -> Result<(), Self::Error>;

    /// Fill one transmit half. `words` must be exactly one half long.
    fn load_tx(&mut self, half: BufferHalf, words: &[u32]) -> Result<(), Self::Error>;

    /// Overwrite one word of a transmit half (used for per-period markers).
    fn write_tx_word(
        &mut self,
        half: BufferHalf,
        index: usize,
        word: u32,
    ) -> Result<(), Self::Error>;

    /// Start clocks and DMA in both directions.
    fn start_transfer(&mut self) -> Result<(), Self::Error>;

    /// Stop clocks and DMA. Stopping an idle port is not an error.
    fn stop_transfer(&mut self) -> Result<(), Self::Error>;

    /// Wait until both the transmit and the receive half of the current
    /// period have completed, then clear the completion flags.
    fn wait_for_completion(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Half most recently completed in `direction`, `None` before the first
    /// completion.
    fn get_completed_buffer(&self, direction: Direction) -> Option<BufferHalf>;

    /// Copy one receive half into `out`. Returns the number of words copied.
    fn read_rx(&self, half: BufferHalf, out: &mut [u32]) -> Result<usize, Self::Error>;
}
