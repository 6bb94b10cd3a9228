//! End-to-end comparison pipeline
//!
//! Validates the request, fetches both URL variants concurrently under a
//! per-fetch deadline, then diffs the two rankings.

use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::comparison::{RankedResultSet, compare_rankings};
use crate::error::{SerpError, SerpResult};
use crate::extractor::RankExtractor;
use crate::report::ComparisonReport;
use crate::request::{SerpRequest, SearchVariant};

/// Overall deadline per variant fetch, covering retries (seconds).
/// A hung fetch surfaces [`SerpError::Timeout`] instead of stalling the
/// whole comparison.
pub const FETCH_TIMEOUT_SECS: u64 = 45;

/// Run one full comparison: two fetches, one diff.
///
/// The two extractions are independent (no shared mutable state, no
/// ordering requirement) and run concurrently; the comparison waits for
/// both. Invalid parameters are rejected before any fetch starts.
pub async fn compare_serps<E: RankExtractor>(
    extractor: &E,
    request: &SerpRequest,
) -> SerpResult<ComparisonReport> {
    request.validate()?;

    let normal_url = request.search_url(SearchVariant::Normal)?;
    let filter_off_url = request.search_url(SearchVariant::FilterOff)?;

    info!(
        "Comparing SERP rankings for '{}' (hl={}, gl={}, num={})",
        request.query.trim(),
        request.hl,
        request.gl,
        request.num
    );

    let (normal, filter_off) = tokio::try_join!(
        fetch_with_deadline(extractor, &normal_url, SearchVariant::Normal),
        fetch_with_deadline(extractor, &filter_off_url, SearchVariant::FilterOff),
    )?;

    info!(
        "Fetched {} normal and {} filter=0 results, computing delta",
        normal.len(),
        filter_off.len()
    );

    let delta = compare_rankings(&normal, &filter_off);

    Ok(ComparisonReport {
        request: request.clone(),
        normal,
        filter_off,
        delta,
    })
}

async fn fetch_with_deadline<E: RankExtractor>(
    extractor: &E,
    serp_url: &Url,
    variant: SearchVariant,
) -> SerpResult<RankedResultSet> {
    match tokio::time::timeout(
        Duration::from_secs(FETCH_TIMEOUT_SECS),
        extractor.extract(serp_url),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "{} fetch exceeded the {}s deadline",
                variant.label(),
                FETCH_TIMEOUT_SECS
            );
            Err(SerpError::Timeout {
                secs: FETCH_TIMEOUT_SECS,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::RankDelta;
    use std::future::Future;

    /// Extractor returning canned rankings, keyed off the filter=0 flag
    struct StubExtractor {
        normal: RankedResultSet,
        filter_off: RankedResultSet,
    }

    impl RankExtractor for StubExtractor {
        fn extract(
            &self,
            serp_url: &Url,
        ) -> impl Future<Output = SerpResult<RankedResultSet>> + Send {
            let filter_off = serp_url
                .query_pairs()
                .any(|(k, v)| k == "filter" && v == "0");
            let set = if filter_off {
                self.filter_off.clone()
            } else {
                self.normal.clone()
            };
            async move { Ok(set) }
        }
    }

    /// Extractor that never resolves, for deadline coverage
    struct HangingExtractor;

    impl RankExtractor for HangingExtractor {
        fn extract(
            &self,
            _serp_url: &Url,
        ) -> impl Future<Output = SerpResult<RankedResultSet>> + Send {
            std::future::pending()
        }
    }

    #[tokio::test]
    async fn pipeline_routes_variants_and_diffs() {
        let extractor = StubExtractor {
            normal: RankedResultSet::from_entries([("u1", 1), ("u2", 2)]).unwrap(),
            filter_off: RankedResultSet::from_entries([("u1", 2), ("u3", 1)]).unwrap(),
        };

        let report = compare_serps(&extractor, &SerpRequest::new("rust"))
            .await
            .unwrap();

        assert_eq!(report.normal.rank_of("u1"), Some(1));
        assert_eq!(report.filter_off.rank_of("u3"), Some(1));
        assert_eq!(report.delta["u1"], RankDelta::Shift(1));
        assert_eq!(report.delta["u2"], RankDelta::Dropped);
        assert_eq!(report.delta["u3"], RankDelta::Entered);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_any_fetch() {
        struct PanickingExtractor;
        impl RankExtractor for PanickingExtractor {
            fn extract(
                &self,
                _serp_url: &Url,
            ) -> impl Future<Output = SerpResult<RankedResultSet>> + Send {
                async { panic!("extractor must not be invoked for invalid input") }
            }
        }

        let err = compare_serps(&PanickingExtractor, &SerpRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, SerpError::InvalidInput(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_surfaces_timeout() {
        let err = compare_serps(&HangingExtractor, &SerpRequest::new("rust"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SerpError::Timeout {
                secs: FETCH_TIMEOUT_SECS
            }
        ));
    }
}
