//! Comparison masks per word
//!
//! The receiver only reproduces the sample bits of each word. Which bits
//! those are depends on the phase mode and the width pairing:
//!
//! | Layout | Phase 1 mask | Phase 2 mask | Packed |
//! |--------|--------------|--------------|--------|
//! | single, or dual with equal widths | 24 → `0x00FF_FFFF`, else `0xFFFF_FFFF` | same | 8/16 |
//! | dual 16 + 8 (either order) | `0xFFFF_FFFF` | same | yes |
//! | dual, one phase 32-bit | left-aligned: 32 / 24 / 16 / 8 → `FFFFFFFF` / `FFFFFF00` / `FFFF0000` / `FF000000` | same rule | no |
//! | dual, otherwise | 24-bit container: 24 / 16 / 8 → `00FFFFFF` / `00FFFF00` / `00FF0000` | same rule | no |
//!
//! Packed layouts carry several samples per word, so the stream may start
//! at any byte inside a word.

use platform::{DataFormat, SampleWidth};

use crate::layout::{FrameLayout, LayoutError};

/// Masks and packing derived from a [`FrameLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MaskTable {
    phase1: u32,
    phase2: u32,
    per_phase: bool,
    packed: bool,
    channels_phase1: usize,
    frame_len: usize,
}

const fn left_aligned_in_32(width: SampleWidth) -> u32 {
    match width {
        SampleWidth::Bits32 => 0xFFFF_FFFF,
        SampleWidth::Bits24 => 0xFFFF_FF00,
        SampleWidth::Bits16 => 0xFFFF_0000,
        SampleWidth::Bits8 => 0xFF00_0000,
    }
}

const fn left_aligned_in_24(width: SampleWidth) -> u32 {
    match width {
        // A 32-bit phase always takes the other table; keep it total.
        SampleWidth::Bits32 => 0xFFFF_FFFF,
        SampleWidth::Bits24 => 0x00FF_FFFF,
        SampleWidth::Bits16 => 0x00FF_FF00,
        SampleWidth::Bits8 => 0x00FF_0000,
    }
}

impl MaskTable {
    /// Derive the masks for `layout`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::EmptyFrame`] when the two phases need different masks
    /// but the frame has no channels to alternate over. Channel counts are
    /// not consulted otherwise.
    pub fn derive(layout: &FrameLayout) -> Result<Self, LayoutError> {
        let frame_len = layout.frame_len();
        let channels_phase1 = usize::from(layout.channels_phase1);
        let w1 = layout.width_phase1;
        let w2 = layout.width_phase2;

        let uniform = |mask: u32, packed: bool| Self {
            phase1: mask,
            phase2: mask,
            per_phase: false,
            packed,
            channels_phase1,
            frame_len,
        };

        if layout.has_uniform_width() {
            let mask = if w1 == SampleWidth::Bits24 {
                0x00FF_FFFF
            } else {
                0xFFFF_FFFF
            };
            return Ok(uniform(mask, w1.is_sub_word()));
        }

        match (w1, w2) {
            (SampleWidth::Bits16, SampleWidth::Bits8) | (SampleWidth::Bits8, SampleWidth::Bits16) => {
                Ok(uniform(0xFFFF_FFFF, true))
            }
            _ => {
                if frame_len == 0 {
                    return Err(LayoutError::EmptyFrame);
                }
                let table: fn(SampleWidth) -> u32 = if w1 == SampleWidth::Bits32 || w2 == SampleWidth::Bits32 {
                    left_aligned_in_32
                } else {
                    left_aligned_in_24
                };
                Ok(Self {
                    phase1: table(w1),
                    phase2: table(w2),
                    per_phase: true,
                    packed: false,
                    channels_phase1,
                    frame_len,
                })
            }
        }
    }

    /// Mask for transmit word `index`.
    ///
    /// With per-phase masks, word `i` belongs to phase 1 when
    /// `i % (ch1 + ch2) < ch1`.
    #[allow(clippy::arithmetic_side_effects)] // Safety: per_phase implies frame_len > 0, checked in derive()
    pub fn mask_for(&self, index: usize) -> u32 {
        if !self.per_phase || index % self.frame_len < self.channels_phase1 {
            self.phase1
        } else {
            self.phase2
        }
    }

    /// `true` when samples are packed below word size and the receive
    /// stream must be searched at every byte offset.
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// `true` when the two phases use different masks.
    pub fn is_per_phase(&self) -> bool {
        self.per_phase
    }

    /// Phase 1 and phase 2 masks (equal unless [`is_per_phase`](Self::is_per_phase)).
    pub fn phase_masks(&self) -> (u32, u32) {
        (self.phase1, self.phase2)
    }
}

/// A transmitted word as the receiver of `format` delivers it: bits outside
/// the sample mask read back as zero.
///
/// Signature matches `platform::mocks::ReceiveShaper`, so it can be plugged
/// straight into the host wire model.
pub fn strip_padding(format: &DataFormat, index: usize, word: u32) -> u32 {
    match MaskTable::derive(&FrameLayout::from_format(format)) {
        Ok(masks) => word & masks.mask_for(index),
        Err(_) => word,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use SampleWidth::{Bits16, Bits24, Bits32, Bits8};

    fn dual(w1: SampleWidth, w2: SampleWidth) -> MaskTable {
        MaskTable::derive(&FrameLayout::dual(4, w1, 4, w2)).unwrap()
    }

    #[test]
    fn single_phase_masks() {
        let m = MaskTable::derive(&FrameLayout::single(2, Bits24)).unwrap();
        assert_eq!(m.phase_masks(), (0x00FF_FFFF, 0x00FF_FFFF));
        assert!(!m.is_packed());

        let m = MaskTable::derive(&FrameLayout::single(2, Bits32)).unwrap();
        assert_eq!(m.mask_for(7), 0xFFFF_FFFF);

        for w in [Bits8, Bits16] {
            let m = MaskTable::derive(&FrameLayout::single(2, w)).unwrap();
            assert!(m.is_packed());
            assert_eq!(m.mask_for(0), 0xFFFF_FFFF);
        }
    }

    #[test]
    fn dual_equal_widths_behave_like_single() {
        let m = dual(Bits24, Bits24);
        assert!(!m.is_per_phase());
        assert_eq!(m.mask_for(5), 0x00FF_FFFF);
    }

    #[test]
    fn dual_16_and_8_is_packed_full_word() {
        for (a, b) in [(Bits16, Bits8), (Bits8, Bits16)] {
            let m = dual(a, b);
            assert!(m.is_packed());
            assert!(!m.is_per_phase());
            assert_eq!(m.phase_masks(), (0xFFFF_FFFF, 0xFFFF_FFFF));
        }
    }

    #[test]
    fn dual_with_32_bit_phase_uses_left_aligned_masks() {
        assert_eq!(dual(Bits32, Bits24).phase_masks(), (0xFFFF_FFFF, 0xFFFF_FF00));
        assert_eq!(dual(Bits32, Bits16).phase_masks(), (0xFFFF_FFFF, 0xFFFF_0000));
        assert_eq!(dual(Bits8, Bits32).phase_masks(), (0xFF00_0000, 0xFFFF_FFFF));
    }

    #[test]
    fn dual_without_32_bit_phase_uses_24_bit_container() {
        assert_eq!(dual(Bits24, Bits16).phase_masks(), (0x00FF_FFFF, 0x00FF_FF00));
        assert_eq!(dual(Bits8, Bits24).phase_masks(), (0x00FF_0000, 0x00FF_FFFF));
    }

    #[test]
    fn uniform_masks_ignore_channel_counts() {
        let m = MaskTable::derive(&FrameLayout::single(0, Bits24)).unwrap();
        assert_eq!(m.mask_for(9), 0x00FF_FFFF);
        let m = MaskTable::derive(&FrameLayout::dual(0, Bits16, 0, Bits16)).unwrap();
        assert!(m.is_packed());
        assert_eq!(m.mask_for(3), 0xFFFF_FFFF);
        assert!(MaskTable::derive(&FrameLayout::dual(0, Bits16, 0, Bits8)).is_ok());
    }

    #[test]
    fn per_phase_masks_need_channels() {
        assert_eq!(
            MaskTable::derive(&FrameLayout::dual(0, Bits32, 0, Bits16)),
            Err(LayoutError::EmptyFrame)
        );
        let m = MaskTable::derive(&FrameLayout::dual(0, Bits32, 2, Bits16)).unwrap();
        assert_eq!(m.mask_for(0), 0xFFFF_0000);
    }

    #[test]
    fn phase_rule_follows_channel_counts() {
        let m = MaskTable::derive(&FrameLayout::dual(3, Bits32, 2, Bits16)).unwrap();
        let masks: [u32; 10] = core::array::from_fn(|i| m.mask_for(i));
        let (p1, p2) = (0xFFFF_FFFF, 0xFFFF_0000);
        assert_eq!(masks, [p1, p1, p1, p2, p2, p1, p1, p1, p2, p2]);
    }

    #[test]
    fn strip_padding_clears_bits_outside_sample() {
        let fmt = DataFormat::i2s_stereo_24bit();
        assert_eq!(strip_padding(&fmt, 0, 0xAB12_3456), 0x0012_3456);

        let fmt = DataFormat::tdm_presets()[3];
        assert_eq!(strip_padding(&fmt, 0, 0x1234_5678), 0x1234_5678);
        assert_eq!(strip_padding(&fmt, 4, 0x1234_5678), 0x1234_0000);
    }
}
