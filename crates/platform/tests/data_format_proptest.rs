//! Property-based tests for data-format validation and sample widths.

use platform::{DataFormat, DataPhase, FormatError, Justification, SampleWidth};

fn width(idx: u8) -> SampleWidth {
    match idx % 4 {
        0 => SampleWidth::Bits8,
        1 => SampleWidth::Bits16,
        2 => SampleWidth::Bits24,
        _ => SampleWidth::Bits32,
    }
}

fn format(dual: bool, ch1: u8, ch2: u8, w: [u8; 4]) -> DataFormat {
    DataFormat {
        phase: if dual { DataPhase::Dual } else { DataPhase::Single },
        data_delay: 1,
        channels_phase1: ch1,
        channels_phase2: ch2,
        justification: Justification::Left,
        channel_len_phase1: width(w[0]),
        channel_len_phase2: width(w[1]),
        sample_len_phase1: width(w[2]),
        sample_len_phase2: width(w[3]),
    }
}

proptest::proptest! {
    /// validate() accepts exactly the formats whose samples fit their slots.
    #[test]
    fn validate_agrees_with_field_rules(
        dual in proptest::bool::ANY,
        ch1 in 0u8..=20,
        ch2 in 0u8..=20,
        w in proptest::array::uniform4(0u8..4),
    ) {
        let fmt = format(dual, ch1, ch2, w);
        let phase1_ok = (1..=16).contains(&ch1) && fmt.sample_len_phase1 <= fmt.channel_len_phase1;
        let phase2_ok = !dual
            || ((1..=16).contains(&ch2) && fmt.sample_len_phase2 <= fmt.channel_len_phase2);
        assert_eq!(fmt.validate().is_ok(), phase1_ok && phase2_ok, "format {:?}", fmt);
    }

    /// Frame channel count is phase 1 alone for single phase, the sum for dual.
    #[test]
    fn frame_channels_follow_phase(dual in proptest::bool::ANY, ch1 in 1u8..=16, ch2 in 1u8..=16) {
        let fmt = format(dual, ch1, ch2, [3, 3, 2, 2]);
        let expected = if dual { ch1 + ch2 } else { ch1 };
        assert_eq!(fmt.frame_channels(), expected);
    }

    /// Any u32 either maps to a width with the same bit count or is rejected.
    #[test]
    fn sample_width_try_from_is_exact(bits in 0u32..=64) {
        match SampleWidth::try_from(bits) {
            Ok(w) => assert_eq!(w.bits(), bits),
            Err(e) => assert_eq!(e.0, bits),
        }
    }
}

#[test]
fn zero_channels_is_reported_before_width_problems() {
    let fmt = format(false, 0, 0, [0, 0, 3, 3]);
    assert_eq!(fmt.validate(), Err(FormatError::NoChannels));
}
