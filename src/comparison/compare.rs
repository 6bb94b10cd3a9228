//! The rank comparison algorithm

use std::collections::BTreeMap;

use super::types::{RankDelta, RankedResultSet};

/// Compare two ranked result sets and classify how each URL moved.
///
/// For a URL present in both sets the delta is the variant rank minus the
/// baseline rank; a negative value means the URL improved in the variant.
/// URLs present in only one set map to [`RankDelta::Dropped`] (baseline
/// only) or [`RankDelta::Entered`] (variant only).
///
/// The result's key set is the union of both input key sets; no URL is
/// silently dropped. Pure and deterministic, never mutates its inputs, and
/// total over well-formed inputs: empty sets on either side simply yield
/// all-sentinel entries.
#[must_use]
pub fn compare_rankings(
    baseline: &RankedResultSet,
    variant: &RankedResultSet,
) -> BTreeMap<String, RankDelta> {
    let mut delta = BTreeMap::new();

    for (url, baseline_rank) in baseline.iter() {
        let change = match variant.rank_of(url) {
            Some(variant_rank) => {
                RankDelta::Shift(i64::from(variant_rank) - i64::from(baseline_rank))
            }
            None => RankDelta::Dropped,
        };
        delta.insert(url.to_string(), change);
    }

    for (url, _) in variant.iter() {
        delta.entry(url.to_string()).or_insert(RankDelta::Entered);
    }

    delta
}
