//! Transmit test patterns and per-iteration markers

use platform::BufferHalf;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0x853C_49E6_748F_EA9B;

/// Ramp tag for ping halves (`(i & 0xFF) | RAMP_PING_TAG`).
pub const RAMP_PING_TAG: u32 = 0x00AB_0000;

/// Ramp tag for pong halves.
pub const RAMP_PONG_TAG: u32 = 0x00CD_0000;

/// Transmit buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternKind {
    /// Pseudo-random words from a seeded small PRNG.
    Random {
        /// Generator seed; the same seed gives the same buffers.
        seed: u64,
    },
    /// `(i & 0xFF)` tagged with a per-half constant. Easy to read in a dump.
    Ramp,
}

impl Default for PatternKind {
    fn default() -> Self {
        Self::Random { seed: DEFAULT_SEED }
    }
}

/// Fills transmit halves according to a [`PatternKind`].
pub struct PatternFill {
    kind: PatternKind,
    rng: SmallRng,
}

impl PatternFill {
    /// Start a fill sequence; a random pattern is reseeded here.
    pub fn new(kind: PatternKind) -> Self {
        let seed = match kind {
            PatternKind::Random { seed } => seed,
            PatternKind::Ramp => DEFAULT_SEED,
        };
        Self {
            kind,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Fill `words` as transmit half `half`.
    pub fn fill(&mut self, half: BufferHalf, words: &mut [u32]) {
        match self.kind {
            PatternKind::Random { .. } => {
                for word in words.iter_mut() {
                    *word = self.rng.next_u32();
                }
            }
            PatternKind::Ramp => {
                let tag = match half {
                    BufferHalf::Ping => RAMP_PING_TAG,
                    BufferHalf::Pong => RAMP_PONG_TAG,
                };
                for (i, word) in words.iter_mut().enumerate() {
                    #[allow(clippy::cast_possible_truncation)] // masked to 8 bits first
                    let low = (i & 0xFF) as u32;
                    *word = low | tag;
                }
            }
        }
    }
}

/// Word written at index `n / 2` of a transmit half after each completion,
/// so stale data left in a receive half from an earlier pass cannot match.
///
/// `port` is 0 for the first port and 1 for the second; ping and pong halves
/// get distinct values: `(iteration + port + 2 * half) << 16`.
pub fn marker_word(iteration: u32, port: u32, half: BufferHalf) -> u32 {
    let half_step = match half {
        BufferHalf::Ping => 0,
        BufferHalf::Pong => 2,
    };
    iteration
        .wrapping_add(port)
        .wrapping_add(half_step)
        .wrapping_shl(16)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn ramp_tags_halves() {
        let mut fill = PatternFill::new(PatternKind::Ramp);
        let mut ping = [0u32; 300];
        let mut pong = [0u32; 4];
        fill.fill(BufferHalf::Ping, &mut ping);
        fill.fill(BufferHalf::Pong, &mut pong);
        assert_eq!(ping[0], 0x00AB_0000);
        assert_eq!(ping[255], 0x00AB_00FF);
        assert_eq!(ping[256], 0x00AB_0000);
        assert_eq!(pong, [0x00CD_0000, 0x00CD_0001, 0x00CD_0002, 0x00CD_0003]);
    }

    #[test]
    fn random_is_reproducible_per_seed() {
        let mut a = [0u32; 16];
        let mut b = [0u32; 16];
        PatternFill::new(PatternKind::Random { seed: 7 }).fill(BufferHalf::Ping, &mut a);
        PatternFill::new(PatternKind::Random { seed: 7 }).fill(BufferHalf::Ping, &mut b);
        assert_eq!(a, b);

        PatternFill::new(PatternKind::Random { seed: 8 }).fill(BufferHalf::Ping, &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn random_fill_follows_seeded_small_rng() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let expected: [u32; 8] = core::array::from_fn(|_| rng.next_u32());
        let mut words = [0u32; 8];
        PatternFill::new(PatternKind::default()).fill(BufferHalf::Pong, &mut words);
        assert_eq!(words, expected);
    }

    #[test]
    fn zero_seed_does_not_stick() {
        let mut words = [0u32; 8];
        PatternFill::new(PatternKind::Random { seed: 0 }).fill(BufferHalf::Ping, &mut words);
        assert_ne!(words, [0; 8]);
    }

    #[test]
    fn consecutive_random_halves_differ() {
        let mut fill = PatternFill::new(PatternKind::default());
        let mut ping = [0u32; 16];
        let mut pong = [0u32; 16];
        fill.fill(BufferHalf::Ping, &mut ping);
        fill.fill(BufferHalf::Pong, &mut pong);
        assert_ne!(ping, pong);
    }

    #[test]
    fn markers_are_distinct_per_port_and_half() {
        let t = 5;
        let markers = [
            marker_word(t, 0, BufferHalf::Ping),
            marker_word(t, 1, BufferHalf::Ping),
            marker_word(t, 0, BufferHalf::Pong),
            marker_word(t, 1, BufferHalf::Pong),
        ];
        assert_eq!(markers, [5 << 16, 6 << 16, 7 << 16, 8 << 16]);
    }
}
