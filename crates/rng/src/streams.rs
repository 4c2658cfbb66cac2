//! Lehmer multi-stream generator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generator modulus, the Mersenne prime 2^31 - 1.
pub const MODULUS: i64 = 2_147_483_647;

/// Generator multiplier.
pub const MULTIPLIER: i64 = 48_271;

/// Number of independent streams.
pub const STREAMS: usize = 256;

/// Multiplier jumping from one stream's initial state to the next.
pub const JUMP_MULTIPLIER: i64 = 22_925;

/// Seed used when a zero master seed is planted.
pub const DEFAULT_SEED: i64 = 123_456_789;

const Q: i64 = MODULUS / MULTIPLIER;
const R: i64 = MODULUS % MULTIPLIER;
const JUMP_Q: i64 = MODULUS / JUMP_MULTIPLIER;
const JUMP_R: i64 = MODULUS % JUMP_MULTIPLIER;

/// Stream index. Every `u8` names a valid stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamId(pub u8);

impl StreamId {
    /// The stream `offset` positions further on, wrapping at 256.
    pub fn offset(self, offset: u8) -> Self {
        StreamId(self.0.wrapping_add(offset))
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream({})", self.0)
    }
}

/// Multiply-mod step using Schrage's method so nothing overflows 32 bits.
fn schrage(state: i64, a: i64, q: i64, r: i64) -> i64 {
    let t = a * (state % q) - r * (state / q);
    if t > 0 {
        t
    } else {
        t + MODULUS
    }
}

/// States of all 256 streams.
#[derive(Clone, PartialEq, Eq)]
pub struct RandomStreams {
    seeds: [i64; STREAMS],
}

impl RandomStreams {
    /// Create the streams and plant `seed`.
    pub fn new(seed: u64) -> Self {
        let mut streams = Self {
            seeds: [0; STREAMS],
        };
        streams.plant(seed);
        streams
    }

    /// Derive every stream state from one master seed.
    ///
    /// Stream 0 starts at `seed mod (2^31 - 1)` (or [`DEFAULT_SEED`] when that
    /// is zero); stream `j` starts at stream `j - 1`'s state times
    /// [`JUMP_MULTIPLIER`].
    pub fn plant(&mut self, seed: u64) {
        let reduced = (seed % MODULUS as u64) as i64;
        self.seeds[0] = if reduced == 0 { DEFAULT_SEED } else { reduced };
        for j in 1..STREAMS {
            self.seeds[j] = schrage(self.seeds[j - 1], JUMP_MULTIPLIER, JUMP_Q, JUMP_R);
        }
    }

    /// Borrow the handle for one stream.
    pub fn stream(&mut self, id: StreamId) -> Stream<'_> {
        Stream {
            state: &mut self.seeds[id.0 as usize],
        }
    }

    /// Current state of a stream.
    pub fn seed(&self, id: StreamId) -> u64 {
        self.seeds[id.0 as usize] as u64
    }

    /// Overwrite one stream's state. Out-of-range values are reduced.
    pub fn put_seed(&mut self, id: StreamId, seed: u64) {
        let reduced = (seed % MODULUS as u64) as i64;
        self.seeds[id.0 as usize] = if reduced == 0 { DEFAULT_SEED } else { reduced };
    }
}

impl Default for RandomStreams {
    fn default() -> Self {
        Self::new(DEFAULT_SEED as u64)
    }
}

impl fmt::Debug for RandomStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomStreams")
            .field("stream0", &self.seeds[0])
            .field("streams", &STREAMS)
            .finish()
    }
}

/// Exclusive handle on a single stream.
///
/// All variate generators are methods on this handle (see `variates.rs`).
pub struct Stream<'a> {
    state: &'a mut i64,
}

impl Stream<'_> {
    /// Next uniform draw in the open interval `(0, 1)`.
    pub fn random(&mut self) -> f64 {
        *self.state = schrage(*self.state, MULTIPLIER, Q, R);
        *self.state as f64 / MODULUS as f64
    }

    /// Current state without advancing.
    pub fn state(&self) -> u64 {
        *self.state as u64
    }
}
