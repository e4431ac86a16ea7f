//! Distribution statistics
//!
//! Pure, synchronous computation over already-collected replica counts.
//! Nothing here performs I/O or holds locks, so every type is safe to share
//! across threads once built.

mod distribution;
pub mod summary;

#[cfg(test)]
mod properties;

pub use distribution::{DistributionStatistics, UnusedNodePolicy};
