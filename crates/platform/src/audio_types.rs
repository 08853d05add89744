//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common configuration errors:
//! - `SampleWidth`: only the 8/16/24/32-bit widths the I2S block supports
//! - `OutOfRangeError`: shared error for range-checked counts

use thiserror_no_std::Error;

// ── Error types ──────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

/// Error returned when a raw bit count is not a supported sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("unsupported sample width: {0} bits (expected 8, 16, 24 or 32)")]
pub struct UnsupportedWidthError(pub u32);

// ── SampleWidth ──────────────────────────────────────────────────────────────

/// Sample (or channel slot) width in bits.
///
/// The I2S/TDM block only moves 8, 16, 24 and 32-bit samples; any other
/// width is a configuration error caught by [`SampleWidth::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SampleWidth {
    /// 8-bit samples, four per 32-bit DMA word.
    Bits8 = 8,
    /// 16-bit samples, two per 32-bit DMA word.
    Bits16 = 16,
    /// 24-bit samples in a 32-bit DMA word.
    Bits24 = 24,
    /// Full 32-bit samples.
    Bits32 = 32,
}

impl SampleWidth {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// `true` when several samples share one 32-bit DMA word (8 and 16 bits).
    ///
    /// Packed data can start at any byte inside a word, so the receive
    /// buffer has to be searched at every byte offset.
    #[must_use]
    pub const fn is_sub_word(self) -> bool {
        matches!(self, Self::Bits8 | Self::Bits16)
    }
}

impl TryFrom<u32> for SampleWidth {
    type Error = UnsupportedWidthError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Bits8),
            16 => Ok(Self::Bits16),
            24 => Ok(Self::Bits24),
            32 => Ok(Self::Bits32),
            other => Err(UnsupportedWidthError(other)),
        }
    }
}

impl From<SampleWidth> for u32 {
    fn from(width: SampleWidth) -> Self {
        width.bits()
    }
}
