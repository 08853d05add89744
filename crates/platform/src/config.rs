//! Loopback test constants
//!
//! Central values shared by the platform layer and the loopback test loop.
//! Buffer sizing lives on [`TransferConfig`](crate::TransferConfig).

/// The application name
pub const APP_NAME: &str = "I2S Loopback";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Furthest receive-buffer position searched for the first transmitted word.
pub const DEFAULT_MAX_SEARCH_OFFSET: usize = 200;

/// Passing iterations required per data format.
pub const DEFAULT_ITERATIONS: u32 = 10;

/// How long one DMA period may take before the run is declared hung.
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 1000;

/// Start-up banner
pub const fn banner() -> &'static str {
    "I2S Full Duplex Loopback Test"
}
