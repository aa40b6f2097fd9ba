// Geo normalization — place lookup, canonical keys and deterministic jitter.

pub mod jitter;
pub mod normalizer;
pub mod places;
pub mod traits;
