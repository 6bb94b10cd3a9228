//! Rank comparison between two SERP result sets
//!
//! A [`RankedResultSet`] maps each result URL to its 1-based rank on a
//! single results page. [`compare_rankings`] diffs two such sets (the
//! normal search vs the `filter=0` variant) into a per-URL [`RankDelta`].

mod compare;
mod types;

pub use compare::compare_rankings;
pub use types::{DROPPED_SENTINEL, ENTERED_SENTINEL, RankDelta, RankedResultSet};
