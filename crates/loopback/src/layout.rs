//! Frame layout as seen by the verifier
//!
//! Only the fields that decide how 32-bit words are masked survive from the
//! full [`DataFormat`]: the phase mode, the channel count of each phase and
//! the sample width of each phase.

use platform::{DataFormat, DataPhase, SampleWidth};
use thiserror_no_std::Error;

/// Layout configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// A sample width other than 8, 16, 24 or 32 bits.
    #[error("invalid sample length: {0} bits")]
    UnsupportedWidth(u32),
    /// A frame with no channels.
    #[error("frame has no channels")]
    EmptyFrame,
}

/// Phase mode, channel counts and sample widths of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameLayout {
    /// Single or dual phase.
    pub phase: DataPhase,
    /// Channels in phase 1.
    pub channels_phase1: u8,
    /// Channels in phase 2. Ignored for [`DataPhase::Single`].
    pub channels_phase2: u8,
    /// Sample width of phase 1.
    pub width_phase1: SampleWidth,
    /// Sample width of phase 2. Ignored for [`DataPhase::Single`].
    pub width_phase2: SampleWidth,
}

impl FrameLayout {
    /// Single-phase frame of `channels` samples of one width.
    pub const fn single(channels: u8, width: SampleWidth) -> Self {
        Self {
            phase: DataPhase::Single,
            channels_phase1: channels,
            channels_phase2: 0,
            width_phase1: width,
            width_phase2: width,
        }
    }

    /// Dual-phase frame: `ch1` samples of `w1`, then `ch2` samples of `w2`.
    pub const fn dual(ch1: u8, w1: SampleWidth, ch2: u8, w2: SampleWidth) -> Self {
        Self {
            phase: DataPhase::Dual,
            channels_phase1: ch1,
            channels_phase2: ch2,
            width_phase1: w1,
            width_phase2: w2,
        }
    }

    /// Build a layout from raw register-style values.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnsupportedWidth`] for a width outside {8, 16, 24, 32}
    /// (phase 2 is only checked for dual-phase frames), and
    /// [`LayoutError::EmptyFrame`] for a dual-phase frame of two different
    /// widths with no channels. Channel counts only matter in that case.
    pub fn from_raw(
        phase: DataPhase,
        ch1: u8,
        ch2: u8,
        width1_bits: u32,
        width2_bits: u32,
    ) -> Result<Self, LayoutError> {
        let w1 = SampleWidth::try_from(width1_bits)
            .map_err(|e| LayoutError::UnsupportedWidth(e.0))?;
        let layout = match phase {
            DataPhase::Single => Self::single(ch1, w1),
            DataPhase::Dual => {
                let w2 = SampleWidth::try_from(width2_bits)
                    .map_err(|e| LayoutError::UnsupportedWidth(e.0))?;
                Self::dual(ch1, w1, ch2, w2)
            }
        };
        if !layout.has_uniform_width() && layout.frame_len() == 0 {
            return Err(LayoutError::EmptyFrame);
        }
        Ok(layout)
    }

    /// Layout of the words a port configured with `format` moves.
    pub fn from_format(format: &DataFormat) -> Self {
        match format.phase {
            DataPhase::Single => Self::single(format.channels_phase1, format.sample_len_phase1),
            DataPhase::Dual => Self::dual(
                format.channels_phase1,
                format.sample_len_phase1,
                format.channels_phase2,
                format.sample_len_phase2,
            ),
        }
    }

    /// Words per frame.
    pub fn frame_len(&self) -> usize {
        match self.phase {
            DataPhase::Single => usize::from(self.channels_phase1),
            DataPhase::Dual => {
                usize::from(self.channels_phase1).saturating_add(usize::from(self.channels_phase2))
            }
        }
    }

    /// `true` when both phases move the same sample width (or there is only one).
    pub fn has_uniform_width(&self) -> bool {
        self.phase == DataPhase::Single || self.width_phase1 == self.width_phase2
    }
}

impl From<&DataFormat> for FrameLayout {
    fn from(format: &DataFormat) -> Self {
        Self::from_format(format)
    }
}
