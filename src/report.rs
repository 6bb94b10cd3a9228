//! Comparison report assembly and presentation rows

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::comparison::{RankDelta, RankedResultSet};
use crate::request::{SerpRequest, SearchVariant};

/// Outcome of one full comparison: both rankings plus the per-URL delta
///
/// The delta is oriented baseline → variant: for a URL in both sets it is
/// the filter-off rank minus the normal rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(flatten)]
    pub request: SerpRequest,
    /// Ranking from the plain search
    pub normal: RankedResultSet,
    /// Ranking from the `filter=0` search
    pub filter_off: RankedResultSet,
    /// Per-URL rank change, keyed by the union of both rankings
    pub delta: BTreeMap<String, RankDelta>,
}

/// One line of the rendered comparison table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub rank: u32,
    pub url: String,
    pub change: RankDelta,
}

impl ComparisonReport {
    /// Rows for one variant's column, in page-appearance order.
    ///
    /// Every URL in a variant's ranking has a delta entry (the delta key
    /// set is the union of both rankings), so the lookup cannot miss; a
    /// missing entry would mean the report was assembled inconsistently
    /// and defaults to the variant's own sentinel.
    #[must_use]
    pub fn rows(&self, variant: SearchVariant) -> Vec<ReportRow> {
        let (set, fallback) = match variant {
            SearchVariant::Normal => (&self.normal, RankDelta::Dropped),
            SearchVariant::FilterOff => (&self.filter_off, RankDelta::Entered),
        };

        set.by_rank()
            .into_iter()
            .map(|(url, rank)| ReportRow {
                rank,
                url: url.to_string(),
                change: self.delta.get(url).copied().unwrap_or(fallback),
            })
            .collect()
    }

    /// Pretty-printed JSON in the original service's wire shape
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::compare_rankings;

    fn report() -> ComparisonReport {
        let normal = RankedResultSet::from_entries([("u1", 1), ("u2", 2), ("u3", 3)]).unwrap();
        let filter_off = RankedResultSet::from_entries([("u1", 2), ("u3", 1), ("u4", 4)]).unwrap();
        let delta = compare_rankings(&normal, &filter_off);
        ComparisonReport {
            request: SerpRequest::new("rust"),
            normal,
            filter_off,
            delta,
        }
    }

    #[test]
    fn normal_rows_are_rank_ordered_with_deltas() {
        let rows = report().rows(SearchVariant::Normal);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].url, "u1");
        assert_eq!(rows[0].change, RankDelta::Shift(1));
        assert_eq!(rows[1].url, "u2");
        assert_eq!(rows[1].change, RankDelta::Dropped);
        assert_eq!(rows[2].url, "u3");
        assert_eq!(rows[2].change, RankDelta::Shift(-2));
    }

    #[test]
    fn filter_off_rows_include_newly_ranked_urls() {
        let rows = report().rows(SearchVariant::FilterOff);
        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 4]);
        assert_eq!(rows[2].url, "u4");
        assert_eq!(rows[2].change, RankDelta::Entered);
    }

    #[test]
    fn json_shape_matches_wire_format() {
        let json: serde_json::Value =
            serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["query"], "rust");
        assert_eq!(json["num"], 10);
        assert_eq!(json["normal"]["u1"], 1);
        assert_eq!(json["filter_off"]["u3"], 1);
        assert_eq!(json["delta"]["u1"], 1);
        assert_eq!(json["delta"]["u2"], "OUT");
        assert_eq!(json["delta"]["u4"], "IN");
    }
}
