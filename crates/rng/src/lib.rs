//! Stream-partitioned random variates.
//!
//! A single Lehmer generator (modulus 2^31 - 1, multiplier 48271) is cut
//! into 256 non-overlapping streams by jumping ahead with a fixed
//! multiplier. Every draw goes through an explicit [`Stream`] handle
//! borrowed from [`RandomStreams`], so a station can only consume the
//! stream it names and drawing on one stream never disturbs another.
//!
//! # Example
//!
//! ```
//! use queuesim_rng::{RandomStreams, StreamId};
//!
//! let mut streams = RandomStreams::new(42);
//! let service = streams.stream(StreamId(3)).exponential(2.0);
//! assert!(service > 0.0);
//! ```

mod pareto;
mod sampler;
mod streams;
mod variates;

pub use pareto::{BoundedPareto, BoundedParetoFitter, FittedPareto};
pub use sampler::ServiceSampler;
pub use streams::{
    RandomStreams, Stream, StreamId, DEFAULT_SEED, JUMP_MULTIPLIER, MODULUS, MULTIPLIER, STREAMS,
};
