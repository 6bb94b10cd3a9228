//! End-to-end pipeline tests through the public API, using a stub
//! extractor so no browser is involved

use std::future::Future;

use serpdelta::{
    RankDelta, RankExtractor, RankedResultSet, SearchVariant, SerpRequest, SerpResult,
    compare_serps,
};
use url::Url;

struct FixedExtractor {
    normal: RankedResultSet,
    filter_off: RankedResultSet,
}

impl RankExtractor for FixedExtractor {
    fn extract(&self, serp_url: &Url) -> impl Future<Output = SerpResult<RankedResultSet>> + Send {
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

fn fixture() -> FixedExtractor {
    FixedExtractor {
        normal: RankedResultSet::from_entries([
            ("https://a.example/", 1),
            ("https://b.example/", 2),
            ("https://c.example/", 3),
        ])
        .unwrap(),
        filter_off: RankedResultSet::from_entries([
            ("https://a.example/", 2),
            ("https://c.example/", 1),
            ("https://d.example/", 4),
        ])
        .unwrap(),
    }
}

#[tokio::test]
async fn report_carries_both_rankings_and_the_delta() {
    let report = compare_serps(&fixture(), &SerpRequest::new("espresso"))
        .await
        .unwrap();

    assert_eq!(report.delta.len(), 4);
    assert_eq!(report.delta["https://a.example/"], RankDelta::Shift(1));
    assert_eq!(report.delta["https://b.example/"], RankDelta::Dropped);
    assert_eq!(report.delta["https://c.example/"], RankDelta::Shift(-2));
    assert_eq!(report.delta["https://d.example/"], RankDelta::Entered);
}

#[tokio::test]
async fn report_rows_follow_page_order_per_variant() {
    let report = compare_serps(&fixture(), &SerpRequest::new("espresso"))
        .await
        .unwrap();

    let normal_urls: Vec<String> = report
        .rows(SearchVariant::Normal)
        .into_iter()
        .map(|row| row.url)
        .collect();
    assert_eq!(
        normal_urls,
        ["https://a.example/", "https://b.example/", "https://c.example/"]
    );

    let filter_off_urls: Vec<String> = report
        .rows(SearchVariant::FilterOff)
        .into_iter()
        .map(|row| row.url)
        .collect();
    assert_eq!(
        filter_off_urls,
        ["https://c.example/", "https://a.example/", "https://d.example/"]
    );
}

#[tokio::test]
async fn json_report_keeps_the_original_wire_shape() {
    let report = compare_serps(&fixture(), &SerpRequest::new("espresso"))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["query"], "espresso");
    assert_eq!(json["normal"]["https://a.example/"], 1);
    assert_eq!(json["filter_off"]["https://d.example/"], 4);
    assert_eq!(json["delta"]["https://b.example/"], "OUT");
    assert_eq!(json["delta"]["https://d.example/"], "IN");
    assert_eq!(json["delta"]["https://c.example/"], -2);
}
