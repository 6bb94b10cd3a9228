use serpdelta::{BrowserExtractor, BrowserManager, SerpRequest, compare_serps};

#[tokio::test]
#[ignore] // Requires browser installation and network access to Google
async fn live_comparison_produces_union_delta() {
    let extractor = BrowserExtractor::new(BrowserManager::new());

    let report = compare_serps(&extractor, &SerpRequest::new("rust programming"))
        .await
        .unwrap();

    assert!(!report.normal.is_empty());
    for (url, _) in report.normal.iter() {
        assert!(report.delta.contains_key(url));
    }
    for (url, _) in report.filter_off.iter() {
        assert!(report.delta.contains_key(url));
    }

    extractor.shutdown().await.unwrap();
}
