//! Data structures for ranked result sets and rank deltas

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::{SerpError, SerpResult};

/// JSON sentinel for a URL present only in the baseline set
pub const DROPPED_SENTINEL: &str = "OUT";

/// JSON sentinel for a URL present only in the variant set
pub const ENTERED_SENTINEL: &str = "IN";

/// Ranked result URLs extracted from a single results page.
///
/// Maps each result URL to its 1-based rank in page-appearance order.
/// Ranks are unique within the set and may be a dense or sparse subset
/// of the positive integers. Immutable once built; produced once per
/// extractor call and scoped to a single query/variant pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedResultSet {
    ranks: HashMap<String, u32>,
}

impl RankedResultSet {
    /// Create an empty result set (a valid page with zero results)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a result set from (url, rank) entries.
    ///
    /// Rejects rank 0 and duplicate URLs - both violate the data model
    /// and always indicate an extractor bug upstream.
    pub fn from_entries<I, S>(entries: I) -> SerpResult<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut ranks = HashMap::new();
        for (url, rank) in entries {
            let url = url.into();
            if rank == 0 {
                return Err(SerpError::InvalidInput(format!(
                    "Rank must be 1-based, got 0 for '{url}'"
                )));
            }
            if ranks.insert(url.clone(), rank).is_some() {
                return Err(SerpError::InvalidInput(format!(
                    "Duplicate URL in result set: '{url}'"
                )));
            }
        }
        Ok(Self { ranks })
    }

    /// Rank of a URL, if present
    #[must_use]
    pub fn rank_of(&self, url: &str) -> Option<u32> {
        self.ranks.get(url).copied()
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.ranks.contains_key(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Iterate over (url, rank) pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.ranks.iter().map(|(url, &rank)| (url.as_str(), rank))
    }

    /// Entries sorted by ascending rank (page-appearance order)
    #[must_use]
    pub fn by_rank(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|&(_, rank)| rank);
        entries
    }
}

impl<'de> Deserialize<'de> for RankedResultSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ranks = HashMap::<String, u32>::deserialize(deserializer)?;
        Self::from_entries(ranks).map_err(de::Error::custom)
    }
}

/// How a URL's rank changed between two result sets.
///
/// Modeled as a tagged variant rather than mixing integers and string
/// sentinels in one field. The JSON form keeps the original wire shape:
/// a bare integer for [`Shift`](RankDelta::Shift), `"OUT"` / `"IN"` for
/// the sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDelta {
    /// Present in both sets: variant rank minus baseline rank.
    /// Negative means the URL improved (moved toward rank 1) in the variant.
    Shift(i64),
    /// Present only in the baseline set ("OUT")
    Dropped,
    /// Present only in the variant set ("IN")
    Entered,
}

impl RankDelta {
    /// Human-readable label matching the original report wording
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Shift(0) => "No change".to_string(),
            Self::Shift(d) if *d < 0 => format!("Gained {}", d.abs()),
            Self::Shift(d) => format!("Lost {d}"),
            Self::Dropped => DROPPED_SENTINEL.to_string(),
            Self::Entered => ENTERED_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for RankDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.label())
    }
}

impl Serialize for RankDelta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Shift(delta) => serializer.serialize_i64(*delta),
            Self::Dropped => serializer.serialize_str(DROPPED_SENTINEL),
            Self::Entered => serializer.serialize_str(ENTERED_SENTINEL),
        }
    }
}

struct RankDeltaVisitor;

impl Visitor<'_> for RankDeltaVisitor {
    type Value = RankDelta;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an integer delta or one of \"{DROPPED_SENTINEL}\", \"{ENTERED_SENTINEL}\"")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(RankDelta::Shift(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .map(RankDelta::Shift)
            .map_err(|_| E::custom(format!("rank delta out of range: {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match value {
            DROPPED_SENTINEL => Ok(RankDelta::Dropped),
            ENTERED_SENTINEL => Ok(RankDelta::Entered),
            other => Err(E::custom(format!("unknown rank delta sentinel: '{other}'"))),
        }
    }
}

impl<'de> Deserialize<'de> for RankDelta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RankDeltaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_entries_rejects_zero_rank() {
        let err = RankedResultSet::from_entries([("https://a.example/", 0)]).unwrap_err();
        assert!(matches!(err, SerpError::InvalidInput(_)));
    }

    #[test]
    fn from_entries_rejects_duplicate_url() {
        let err = RankedResultSet::from_entries([
            ("https://a.example/", 1),
            ("https://a.example/", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, SerpError::InvalidInput(_)));
    }

    #[test]
    fn by_rank_sorts_in_page_order() {
        let set = RankedResultSet::from_entries([
            ("https://c.example/", 3),
            ("https://a.example/", 1),
            ("https://b.example/", 2),
        ])
        .unwrap();
        let urls: Vec<&str> = set.by_rank().into_iter().map(|(url, _)| url).collect();
        assert_eq!(urls, ["https://a.example/", "https://b.example/", "https://c.example/"]);
    }

    #[test]
    fn delta_labels_match_report_wording() {
        assert_eq!(RankDelta::Shift(-2).label(), "Gained 2");
        assert_eq!(RankDelta::Shift(1).label(), "Lost 1");
        assert_eq!(RankDelta::Shift(0).label(), "No change");
        assert_eq!(RankDelta::Dropped.label(), "OUT");
        assert_eq!(RankDelta::Entered.label(), "IN");
    }

    #[test]
    fn delta_serializes_to_original_wire_shape() {
        assert_eq!(serde_json::to_value(RankDelta::Shift(-3)).unwrap(), serde_json::json!(-3));
        assert_eq!(serde_json::to_value(RankDelta::Dropped).unwrap(), serde_json::json!("OUT"));
        assert_eq!(serde_json::to_value(RankDelta::Entered).unwrap(), serde_json::json!("IN"));
    }

    #[test]
    fn delta_round_trips_through_json() {
        for delta in [RankDelta::Shift(4), RankDelta::Shift(0), RankDelta::Dropped, RankDelta::Entered] {
            let json = serde_json::to_string(&delta).unwrap();
            let parsed: RankDelta = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, delta);
        }
    }
}
