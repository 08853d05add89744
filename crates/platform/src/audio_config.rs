//! Serial-audio (I2S/TDM) transfer configuration.
//!
//! Defines the data-format record that is programmed into the I2S block and
//! handed, unchanged, to the loopback verifier.
//!
//! # Frame layout
//!
//! A frame is one or two *phases*. Each phase has its own channel count,
//! channel (slot) length and sample length:
//!
//! ```text
//! Single: | ch0 | ch1 | ... | chN-1 |                      one width
//! Dual:   | ph1 ch0 .. ph1 chA-1 | ph2 ch0 .. ph2 chB-1 |  two widths
//! ```
//!
//! Each channel occupies one 32-bit DMA word unless the samples are packed
//! (8/16-bit), in which case several samples share a word.
//!
//! # Presets
//!
//! | Preset | Phase | Channels | Slot bits | Sample bits |
//! |--------|-------|----------|-----------|-------------|
//! | [`DataFormat::i2s_stereo_24bit`] | single | 2 | 32 | 24 |
//! | `tdm_presets()[0]` | single | 8 | 32 | 24 |
//! | `tdm_presets()[1]` | dual | 4 + 4 | 32 / 32 | 24 / 16 |
//! | `tdm_presets()[2]` | dual | 4 + 4 | 32 / 24 | 32 / 24 |
//! | `tdm_presets()[3]` | dual | 4 + 4 | 32 / 16 | 32 / 16 |

use thiserror_no_std::Error;

use crate::audio_types::{OutOfRangeError, SampleWidth};

/// Largest channel count a single phase may carry (TDM slot limit).
pub const MAX_CHANNELS_PER_PHASE: u8 = 16;

/// Number of TDM presets exercised by the loopback suite.
pub const TDM_PRESET_COUNT: usize = 4;

/// Frame phase configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataPhase {
    /// One phase: every channel uses the phase-1 widths.
    Single,
    /// Two alternating phases with independent channel counts and widths.
    Dual,
}

/// Sample justification inside its channel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Justification {
    /// MSB aligned to the start of the slot.
    Left,
    /// LSB aligned to the end of the slot.
    Right,
}

/// Clock role of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortRole {
    /// Drives bit clock and frame sync.
    Master,
    /// Follows the master's clocks; must be started first.
    Slave,
}

/// Reasons a [`DataFormat`] cannot be programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Phase 1 has no channels.
    #[error("phase 1 has no channels")]
    NoChannels,
    /// Dual-phase frame with an empty second phase.
    #[error("dual-phase frame with no phase-2 channels")]
    EmptySecondPhase,
    /// A phase carries more channels than the TDM block supports.
    #[error("too many channels in one phase: {0}")]
    TooManyChannels(OutOfRangeError),
    /// A sample is wider than the slot it travels in.
    #[error("phase {phase}: sample wider than its channel slot")]
    SampleWiderThanSlot {
        /// 1 or 2.
        phase: u8,
    },
}

/// I2S/TDM data-format record.
///
/// Mirrors the fields programmed into the I2S block. The loopback verifier
/// consumes `phase`, the channel counts and the sample lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFormat {
    /// Single or dual phase frame.
    pub phase: DataPhase,
    /// Bit-clock delay between frame sync and the first data bit.
    pub data_delay: u8,
    /// Channels in phase 1.
    pub channels_phase1: u8,
    /// Channels in phase 2 (ignored for [`DataPhase::Single`]).
    pub channels_phase2: u8,
    /// Sample justification in the slot.
    pub justification: Justification,
    /// Channel slot length for phase 1.
    pub channel_len_phase1: SampleWidth,
    /// Channel slot length for phase 2.
    pub channel_len_phase2: SampleWidth,
    /// Sample length for phase 1.
    pub sample_len_phase1: SampleWidth,
    /// Sample length for phase 2.
    pub sample_len_phase2: SampleWidth,
}

impl DataFormat {
    /// Stereo I2S, 24-bit samples in 32-bit slots (I2S loopback reference).
    pub const fn i2s_stereo_24bit() -> Self {
        Self {
            phase: DataPhase::Single,
            data_delay: 1,
            channels_phase1: 2,
            channels_phase2: 2,
            justification: Justification::Left,
            channel_len_phase1: SampleWidth::Bits32,
            channel_len_phase2: SampleWidth::Bits32,
            sample_len_phase1: SampleWidth::Bits24,
            sample_len_phase2: SampleWidth::Bits24,
        }
    }

    /// The four TDM configurations exercised by the loopback suite.
    pub const fn tdm_presets() -> [Self; TDM_PRESET_COUNT] {
        let base = Self {
            phase: DataPhase::Dual,
            data_delay: 1,
            channels_phase1: 4,
            channels_phase2: 4,
            justification: Justification::Left,
            channel_len_phase1: SampleWidth::Bits32,
            channel_len_phase2: SampleWidth::Bits32,
            sample_len_phase1: SampleWidth::Bits24,
            sample_len_phase2: SampleWidth::Bits16,
        };
        [
            Self {
                phase: DataPhase::Single,
                channels_phase1: 8,
                channels_phase2: 0,
                sample_len_phase2: SampleWidth::Bits24,
                ..base
            },
            base,
            Self {
                channel_len_phase2: SampleWidth::Bits24,
                sample_len_phase1: SampleWidth::Bits32,
                sample_len_phase2: SampleWidth::Bits24,
                ..base
            },
            Self {
                channel_len_phase2: SampleWidth::Bits16,
                sample_len_phase1: SampleWidth::Bits32,
                sample_len_phase2: SampleWidth::Bits16,
                ..base
            },
        ]
    }

    /// Channels in one frame (both phases for dual-phase formats).
    pub fn frame_channels(&self) -> u8 {
        match self.phase {
            DataPhase::Single => self.channels_phase1,
            DataPhase::Dual => self.channels_phase1.saturating_add(self.channels_phase2),
        }
    }

    /// Check the record before it is programmed into a port.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] naming the first inconsistency found.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.channels_phase1 == 0 {
            return Err(FormatError::NoChannels);
        }
        check_channel_count(self.channels_phase1)?;
        if self.sample_len_phase1 > self.channel_len_phase1 {
            return Err(FormatError::SampleWiderThanSlot { phase: 1 });
        }
        if self.phase == DataPhase::Dual {
            if self.channels_phase2 == 0 {
                return Err(FormatError::EmptySecondPhase);
            }
            check_channel_count(self.channels_phase2)?;
            if self.sample_len_phase2 > self.channel_len_phase2 {
                return Err(FormatError::SampleWiderThanSlot { phase: 2 });
            }
        }
        Ok(())
    }
}

impl Default for DataFormat {
    fn default() -> Self {
        Self::i2s_stereo_24bit()
    }
}

fn check_channel_count(channels: u8) -> Result<(), FormatError> {
    if channels > MAX_CHANNELS_PER_PHASE {
        Err(FormatError::TooManyChannels(OutOfRangeError {
            value: u32::from(channels),
            min: 1,
            max: u32::from(MAX_CHANNELS_PER_PHASE),
        }))
    } else {
        Ok(())
    }
}

/// DMA transfer sizing for one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    /// 32-bit words in each ping-pong half, per direction.
    pub words_per_half: usize,
    /// Clock role of the port.
    pub role: PortRole,
}

impl TransferConfig {
    /// I2S loopback sizing: 256 words per half.
    pub const I2S_WORDS_PER_HALF: usize = 256;

    /// TDM loopback sizing: 4096 − 32 words per half (DMA threshold padding).
    pub const TDM_WORDS_PER_HALF: usize = 4096 - 32;

    /// Transfer of `words_per_half` words per half for the given role.
    pub const fn new(words_per_half: usize, role: PortRole) -> Self {
        Self {
            words_per_half,
            role,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new(Self::I2S_WORDS_PER_HALF, PortRole::Master)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn i2s_preset_is_single_phase_24_in_32() {
        let fmt = DataFormat::i2s_stereo_24bit();
        assert_eq!(fmt.phase, DataPhase::Single);
        assert_eq!(fmt.sample_len_phase1, SampleWidth::Bits24);
        assert_eq!(fmt.channel_len_phase1, SampleWidth::Bits32);
        assert_eq!(fmt.frame_channels(), 2);
        fmt.validate().expect("reference I2S format must be valid");
    }

    #[test]
    fn all_tdm_presets_validate() {
        for (i, fmt) in DataFormat::tdm_presets().iter().enumerate() {
            assert!(fmt.validate().is_ok(), "TDM preset {i} must validate");
            assert_eq!(fmt.frame_channels(), 8, "TDM preset {i} carries 8 channels");
        }
    }

    #[test]
    fn tdm_dual_presets_cover_three_width_pairs() {
        let presets = DataFormat::tdm_presets();
        let pairs: [(u32, u32); 3] = core::array::from_fn(|i| {
            let fmt = presets[i + 1];
            (fmt.sample_len_phase1.bits(), fmt.sample_len_phase2.bits())
        });
        assert_eq!(pairs, [(24, 16), (32, 24), (32, 16)]);
    }

    #[test]
    fn sample_wider_than_slot_is_rejected() {
        let fmt = DataFormat {
            channel_len_phase1: SampleWidth::Bits16,
            sample_len_phase1: SampleWidth::Bits24,
            ..DataFormat::i2s_stereo_24bit()
        };
        assert_eq!(
            fmt.validate(),
            Err(FormatError::SampleWiderThanSlot { phase: 1 })
        );
    }

    #[test]
    fn dual_phase_without_second_phase_channels_is_rejected() {
        let fmt = DataFormat {
            channels_phase2: 0,
            ..DataFormat::tdm_presets()[1]
        };
        assert_eq!(fmt.validate(), Err(FormatError::EmptySecondPhase));
    }

    #[test]
    fn single_phase_ignores_second_phase_fields() {
        // Preset 0 leaves channels_phase2 at 0; single phase must not care.
        let fmt = DataFormat::tdm_presets()[0];
        assert_eq!(fmt.channels_phase2, 0);
        assert!(fmt.validate().is_ok());
    }

    #[test]
    fn too_many_channels_reports_range() {
        let fmt = DataFormat {
            channels_phase1: 17,
            ..DataFormat::i2s_stereo_24bit()
        };
        match fmt.validate() {
            Err(FormatError::TooManyChannels(err)) => {
                assert_eq!(err.value, 17);
                assert_eq!(err.max, 16);
            }
            other => panic!("expected TooManyChannels, got {other:?}"),
        }
    }

    #[test]
    fn transfer_sizes_match_reference_examples() {
        assert_eq!(TransferConfig::I2S_WORDS_PER_HALF, 256);
        assert_eq!(TransferConfig::TDM_WORDS_PER_HALF, 4064);
        assert_eq!(TransferConfig::default().role, PortRole::Master);
    }
}
