//! Ping-pong DMA buffer abstraction
//!
//! The I2S block streams through two equal halves per direction. While the
//! DMA engine works on the *active* half, software owns the other one. Each
//! half-transfer interrupt hands the active half over to software as the
//! *completed* half and moves the engine on to the other half.
//!
//! ```text
//!   period p      period p+1     period p+2
//!  ┌────────┐    ┌────────┐    ┌────────┐
//!  │  Ping  │ →  │  Pong  │ →  │  Ping  │   active (DMA)
//!  └────────┘    └────────┘    └────────┘
//!                  Ping           Pong        completed (software)
//! ```

/// One half of a ping-pong buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferHalf {
    /// First half.
    Ping,
    /// Second half.
    Pong,
}

impl BufferHalf {
    /// The other half.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Ping => Self::Pong,
            Self::Pong => Self::Ping,
        }
    }

    /// 0 for ping, 1 for pong.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ping => 0,
            Self::Pong => 1,
        }
    }
}

/// Two-half DMA buffer of `N` 32-bit words per half.
///
/// `complete()` is what the half-transfer interrupt does: it records the
/// active half as completed and advances the DMA engine to the other half.
pub struct PingPongBuffer<const N: usize> {
    halves: [[u32; N]; 2],
    active: BufferHalf,
    completed: Option<BufferHalf>,
}

impl<const N: usize> Default for PingPongBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PingPongBuffer<N> {
    /// Words per half.
    pub const WORDS_PER_HALF: usize = N;

    /// Zero-filled buffer with the DMA engine on the ping half.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            halves: [[0; N]; 2],
            active: BufferHalf::Ping,
            completed: None,
        }
    }

    /// Half the DMA engine is currently working on.
    pub fn active(&self) -> BufferHalf {
        self.active
    }

    /// Most recently completed half, or `None` before the first completion.
    pub fn completed(&self) -> Option<BufferHalf> {
        self.completed
    }

    /// Hand the active half to software and move on to the other half.
    ///
    /// Returns the half that just completed.
    pub fn complete(&mut self) -> BufferHalf {
        let done = self.active;
        self.completed = Some(done);
        self.active = done.other();
        done
    }

    /// Read access to one half.
    pub fn half(&self, half: BufferHalf) -> &[u32; N] {
        match half {
            BufferHalf::Ping => &self.halves[0],
            BufferHalf::Pong => &self.halves[1],
        }
    }

    /// Write access to one half.
    pub fn half_mut(&mut self, half: BufferHalf) -> &mut [u32; N] {
        match half {
            BufferHalf::Ping => &mut self.halves[0],
            BufferHalf::Pong => &mut self.halves[1],
        }
    }

    /// Zero both halves and rewind to the ping half.
    pub fn reset(&mut self) {
        self.halves = [[0; N]; 2];
        self.active = BufferHalf::Ping;
        self.completed = None;
    }
}
