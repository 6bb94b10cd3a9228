//! SERP rank extraction using browser automation
//!
//! Renders a Google results page in a shared chromiumoxide browser and
//! reads out the ranked result URLs. The [`RankExtractor`] trait is the
//! seam between the comparison pipeline and the rendering engine, so the
//! comparator and its tests never depend on a real browser.

mod browser;
mod manager;
mod page;
mod stealth;

pub use browser::{
    BrowserWrapper, CHROME_USER_AGENT, download_managed_browser, find_browser_executable,
    launch_browser,
};
pub use manager::BrowserManager;
pub use page::{
    MAX_RETRIES, PageGuard, SEARCH_RESULT_SELECTOR, SEARCH_RESULTS_WAIT_TIMEOUT,
    extract_ranked_results, load_serp, retry_with_backoff,
};

use anyhow::{Context, anyhow};
use std::future::Future;
use tracing::info;
use url::Url;

use crate::comparison::RankedResultSet;
use crate::error::{SerpError, SerpResult};

/// Capability to turn a search URL into a ranked URL set.
///
/// The one production implementation is [`BrowserExtractor`]; tests supply
/// stubs returning fixed sets.
pub trait RankExtractor {
    /// Fetch the page at `serp_url` and return its ranked result URLs.
    ///
    /// Fails with [`SerpError::Fetch`] if the page cannot be retrieved or
    /// no results can be located within a bounded wait.
    fn extract(&self, serp_url: &Url) -> impl Future<Output = SerpResult<RankedResultSet>> + Send;
}

/// Rank extractor backed by a shared headless browser
///
/// Each extraction opens a fresh page (clean stealth injection state),
/// loads the SERP, extracts the ranking, and closes the page. Transient
/// failures retry with backoff; browser crashes and CAPTCHAs fail fast.
#[derive(Clone)]
pub struct BrowserExtractor {
    manager: BrowserManager,
}

impl BrowserExtractor {
    #[must_use]
    pub fn new(manager: BrowserManager) -> Self {
        Self { manager }
    }

    /// The underlying browser manager, for explicit shutdown
    #[must_use]
    pub fn manager(&self) -> &BrowserManager {
        &self.manager
    }

    /// Close the shared browser and remove its temp profile
    pub async fn shutdown(&self) -> SerpResult<()> {
        self.manager
            .shutdown()
            .await
            .map_err(|e| SerpError::Browser(format!("{e:#}")))
    }
}

impl RankExtractor for BrowserExtractor {
    fn extract(&self, serp_url: &Url) -> impl Future<Output = SerpResult<RankedResultSet>> + Send {
        async move {
            let shared = self
                .manager
                .get_or_launch()
                .await
                .map_err(|e| SerpError::Browser(format!("{e:#}")))?;

            // Fresh page per attempt; PageGuard closes it on every exit path
            let results = retry_with_backoff(
                || {
                    let shared = shared.clone();
                    let serp_url = serp_url.clone();
                    async move {
                        let page = {
                            // Lock only to open the page; the page carries its
                            // own CDP session, so concurrent extractions can
                            // share the browser
                            let guard = shared.lock().await;
                            let wrapper = guard
                                .as_ref()
                                .ok_or_else(|| anyhow!("Browser not running"))?;
                            wrapper
                                .browser()
                                .new_page("about:blank")
                                .await
                                .context("Failed to create blank page")?
                        };
                        let page_guard = PageGuard::new(page, format!("serp:{serp_url}"));

                        load_serp(&page_guard, &serp_url).await?;
                        extract_ranked_results(&page_guard).await
                    }
                },
                MAX_RETRIES,
            )
            .await?;

            info!(
                "Extraction completed with {} ranked results for {}",
                results.len(),
                serp_url
            );
            Ok(results)
        }
    }
}
