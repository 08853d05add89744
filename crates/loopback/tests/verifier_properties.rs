//! Property tests for the loopback verifier.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]

use loopback::{
    verify, AlignmentPolicy, FrameLayout, MaskTable, Verifier, VerifierConfig, VerifyError,
};
use platform::{DataFormat, SampleWidth};
use proptest::prelude::*;

fn width() -> impl Strategy<Value = SampleWidth> {
    prop_oneof![
        Just(SampleWidth::Bits8),
        Just(SampleWidth::Bits16),
        Just(SampleWidth::Bits24),
        Just(SampleWidth::Bits32),
    ]
}

fn layout() -> impl Strategy<Value = FrameLayout> {
    prop_oneof![
        (1u8..=8, width()).prop_map(|(ch, w)| FrameLayout::single(ch, w)),
        (1u8..=4, width(), 1u8..=4, width())
            .prop_map(|(ch1, w1, ch2, w2)| FrameLayout::dual(ch1, w1, ch2, w2)),
    ]
}

/// What an ideal receiver delivers for `tx`.
fn received(layout: &FrameLayout, tx: &[u32]) -> Vec<u32> {
    let masks = MaskTable::derive(layout).unwrap();
    tx.iter()
        .enumerate()
        .map(|(i, &w)| w & masks.mask_for(i))
        .collect()
}

fn verifier(layout: &FrameLayout) -> Verifier {
    Verifier::new(layout, VerifierConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn undelayed_stream_aligns_at_zero(
        layout in layout(),
        tx in prop::collection::vec(any::<u32>(), 2..96),
    ) {
        let rx = received(&layout, &tx);
        let alignment = verifier(&layout).check(&rx, &tx, tx.len()).unwrap();
        prop_assert_eq!(alignment.offset, 0);
        prop_assert_eq!(alignment.byte_offset, 0);
        prop_assert_eq!(alignment.compared, tx.len() - 2);
        prop_assert_eq!(alignment.skipped_tail, 0);
    }

    #[test]
    fn delayed_stream_is_found_at_its_delay(
        layout in layout(),
        tx in prop::collection::vec(any::<u32>(), 8..64),
        garbage in prop::collection::vec(any::<u32>(), 0..=200),
    ) {
        let mut rx = garbage.clone();
        rx.extend(received(&layout, &tx));
        let first = rx[garbage.len()];
        prop_assume!(!garbage.contains(&first));

        let alignment = verifier(&layout).check(&rx, &tx, tx.len()).unwrap();
        prop_assert_eq!(alignment.offset, garbage.len());
        prop_assert_eq!(alignment.search_steps, garbage.len());
        prop_assert!(verify(&rx, &tx, tx.len(), &layout));
    }

    #[test]
    fn any_body_bit_flip_is_reported(
        tx in prop::collection::vec(any::<u32>(), 8..64),
        delay in 0usize..50,
        at in 2usize..8,
        bit in 0u32..32,
    ) {
        prop_assume!(tx[0] != 0);
        let layout = FrameLayout::single(2, SampleWidth::Bits32);
        let mut rx = vec![0u32; delay];
        rx.extend_from_slice(&tx);
        rx[delay + at] ^= 1 << bit;

        let err = verifier(&layout).check(&rx, &tx, tx.len()).unwrap_err();
        prop_assert_eq!(err, VerifyError::Mismatch {
            index: at,
            rx_index: at + delay,
            expected: tx[at],
            actual: tx[at] ^ (1 << bit),
        });
    }

    #[test]
    fn transmit_padding_bits_are_ignored(
        layout in layout(),
        tx in prop::collection::vec(any::<u32>(), 2..64),
        noise in any::<u32>(),
    ) {
        let masks = MaskTable::derive(&layout).unwrap();
        let rx = received(&layout, &tx);
        let noisy: Vec<u32> = tx
            .iter()
            .enumerate()
            .map(|(i, &w)| w ^ (noise & !masks.mask_for(i)))
            .collect();
        prop_assert!(verifier(&layout).check(&rx, &noisy, tx.len()).is_ok());
    }

    #[test]
    fn delay_past_search_bound_is_not_found(
        tx in prop::collection::vec(any::<u32>(), 4..32),
        bound in 0usize..20,
        beyond in 1usize..10,
    ) {
        prop_assume!(tx[0] != 0);
        let layout = FrameLayout::single(2, SampleWidth::Bits32);
        let mut rx = vec![0u32; bound + beyond];
        rx.extend_from_slice(&tx);
        let config = VerifierConfig { max_search_offset: bound, policy: AlignmentPolicy::FirstMatch };

        let err = Verifier::new(&layout, config).unwrap().check(&rx, &tx, tx.len()).unwrap_err();
        prop_assert_eq!(err, VerifyError::AlignmentNotFound { searched: bound + 1, max_offset: bound });
    }

    #[test]
    fn packed_stream_is_found_at_any_byte(
        tx in prop::collection::vec(any::<u32>(), 8..48),
        words in 0usize..20,
        bytes in 1usize..4,
    ) {
        let layout = FrameLayout::single(2, SampleWidth::Bits16);
        let mut stream = vec![0xA5u8; words * 4 + bytes];
        stream.extend(tx.iter().flat_map(|w| w.to_le_bytes()));
        stream.resize(stream.len().next_multiple_of(4), 0);
        let rx: Vec<u32> = stream
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        prop_assume!(tx[0] != 0xA5A5_A5A5);

        let alignment = verifier(&layout).check(&rx, &tx, tx.len()).unwrap();
        prop_assert_eq!(alignment.offset, words);
        prop_assert_eq!(usize::from(alignment.byte_offset), bytes);
        prop_assert_eq!(alignment.compared, tx.len() - 2);
    }
}

#[test]
fn stereo_24_bit_with_five_word_delay() {
    let layout = FrameLayout::from_format(&DataFormat::i2s_stereo_24bit());
    let n = 256;
    let tx: Vec<u32> = (0..n as u32).map(|i| i | 0x00AB_0000).collect();
    let rx: Vec<u32> = (0..n)
        .map(|j| {
            if j < 5 {
                j as u32 | 0x00CD_0000
            } else {
                tx[j - 5]
            }
        })
        .collect();

    let alignment = verifier(&layout).check(&rx, &tx, n).unwrap();
    assert_eq!(alignment.offset, 5);
    assert_eq!(alignment.compared, 249);
    assert_eq!(alignment.skipped_tail, 5);
    assert!(verify(&rx, &tx, n, &layout));
}

#[test]
fn dual_32_16_ignores_phase_two_low_half() {
    let layout = FrameLayout::from_format(&DataFormat::tdm_presets()[3]);
    let tx: Vec<u32> = (0..64u32).map(|i| 0x0101_0101u32.wrapping_mul(i + 1)).collect();
    let mut rx = received(&layout, &tx);

    // Word 5 is phase 2 (channels 4..8 of the 8-word frame).
    let mut tx_noisy = tx.clone();
    tx_noisy[5] ^= 1 << 3;
    assert!(verifier(&layout).check(&rx, &tx_noisy, tx.len()).is_ok());

    rx[5] ^= 1 << 20;
    let err = verifier(&layout).check(&rx, &tx, tx.len()).unwrap_err();
    assert!(matches!(err, VerifyError::Mismatch { index: 5, rx_index: 5, .. }));
}
