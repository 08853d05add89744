//! Receive buffer re-read at a byte offset
//!
//! Packed 8/16-bit samples can start at any byte of a 32-bit DMA word. The
//! buffer is little-endian, so the word that starts `o` bytes into word `j`
//! is the high bytes of `w[j]` followed by the low bytes of `w[j + 1]`:
//!
//! ```text
//!  byte:   0  1  2  3 | 4  5  6  7
//!  word:   ---w[j]--- | --w[j+1]--
//!  o = 1:     [  word j at 1  ]
//! ```
//!
//! At offset 0 the view is the buffer itself. At offsets 1..=3 it is one
//! word shorter, because the last word would read past the buffer.

/// Word-granular view of `words` starting `byte_offset` bytes in.
#[derive(Debug, Clone, Copy)]
pub struct WordView<'a> {
    words: &'a [u32],
    byte_offset: u8,
}

impl<'a> WordView<'a> {
    /// View at `byte_offset` (taken modulo 4).
    pub fn new(words: &'a [u32], byte_offset: u8) -> Self {
        Self {
            words,
            byte_offset: byte_offset & 0b11,
        }
    }

    /// Byte offset into the first word (0..=3).
    pub fn byte_offset(&self) -> u8 {
        self.byte_offset
    }

    /// Whole words readable through the view.
    pub fn len(&self) -> usize {
        if self.byte_offset == 0 {
            self.words.len()
        } else {
            self.words.len().saturating_sub(1)
        }
    }

    /// `true` when no whole word is readable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Word `index` of the view, `None` past the end.
    pub fn get(&self, index: usize) -> Option<u32> {
        let lo = *self.words.get(index)?;
        if self.byte_offset == 0 {
            return Some(lo);
        }
        let hi = *self.words.get(index.checked_add(1)?)?;
        let shift = u32::from(self.byte_offset).wrapping_mul(8);
        Some(lo.wrapping_shr(shift) | hi.wrapping_shl(32_u32.wrapping_sub(shift)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    /// Reference: rebuild the word from the little-endian byte stream.
    fn from_bytes(words: &[u32], byte_offset: usize, index: usize) -> u32 {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let start = index * 4 + byte_offset;
        u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap())
    }

    #[test]
    fn offset_zero_is_identity() {
        let words = [1, 2, 3];
        let view = WordView::new(&words, 0);
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(2), Some(3));
        assert_eq!(view.get(3), None);
    }

    #[test]
    fn shifted_views_match_byte_stream() {
        let words = [0x4433_2211, 0x8877_6655, 0xCCBB_AA99];
        for offset in 1..4u8 {
            let view = WordView::new(&words, offset);
            assert_eq!(view.len(), 2);
            for i in 0..view.len() {
                assert_eq!(
                    view.get(i),
                    Some(from_bytes(&words, usize::from(offset), i)),
                    "offset {offset} word {i}"
                );
            }
            assert_eq!(view.get(2), None);
        }
        assert_eq!(WordView::new(&words, 1).get(0), Some(0x5544_3322));
    }

    #[test]
    fn offset_wraps_modulo_four() {
        let words = [0xAABB_CCDD, 0x1122_3344];
        assert_eq!(WordView::new(&words, 4).byte_offset(), 0);
        assert_eq!(WordView::new(&words, 6).get(0), Some(0x3344_AABB));
    }

    #[test]
    fn empty_views() {
        assert!(WordView::new(&[], 0).is_empty());
        assert!(WordView::new(&[7], 2).is_empty());
    }
}
