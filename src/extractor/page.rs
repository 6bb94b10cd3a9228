//! SERP navigation and DOM extraction
//!
//! Drives a single page: navigate to the constructed Google URL, wait for
//! the organic results to render, and read them out as a ranked URL set.

use anyhow::{Context, Result, anyhow};
use chromiumoxide::page::Page;
use rand::Rng;
use std::collections::HashSet;
use std::ops::Deref;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::comparison::RankedResultSet;

use super::stealth;

/// CSS selector for organic result containers on the Google SERP
pub const SEARCH_RESULT_SELECTOR: &str = "div.g";

/// CSS selector for the result title inside a container
pub const TITLE_SELECTOR: &str = "h3";

/// CSS selector for the result link inside a container
pub const LINK_SELECTOR: &str = "a";

/// Maximum time to wait for search results to render (seconds)
pub const SEARCH_RESULTS_WAIT_TIMEOUT: u64 = 10;

/// Maximum number of retry attempts per fetch
pub const MAX_RETRIES: u32 = 2;

/// Guard that closes its page on every exit path
///
/// `Page::close()` is async and Drop is not, so Drop spawns the close onto
/// the runtime. Keeps one error path from leaking a renderer per attempt.
pub struct PageGuard {
    page: Option<Page>,
    label: String,
}

impl PageGuard {
    pub fn new(page: Page, label: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            label: label.into(),
        }
    }
}

impl Deref for PageGuard {
    type Target = Page;

    fn deref(&self) -> &Page {
        // Invariant: page is Some until Drop
        self.page.as_ref().expect("page taken before drop")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let label = std::mem::take(&mut self.label);
            tokio::spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("Failed to close page for {label}: {e}");
                }
            });
        }
    }
}

/// Navigate a blank page to the SERP URL and wait for results to render.
///
/// Stealth injection happens BEFORE navigation; Google renders organic
/// results via JavaScript after the HTTP response lands, so navigation
/// completing is not enough - the DOM is polled for the result selector.
pub async fn load_serp(page: &Page, serp_url: &Url) -> Result<()> {
    match tokio::time::timeout(
        Duration::from_secs(5),
        stealth::apply_stealth_measures(page),
    )
    .await
    {
        Ok(Ok(())) => info!("Stealth injection complete"),
        Ok(Err(e)) => warn!("Stealth injection failed: {}", e),
        Err(_) => warn!("Stealth injection timeout"),
    }

    info!("Navigating to Google SERP: {}", serp_url);
    page.goto(serp_url.as_str())
        .await
        .context("Failed to navigate to Google")?;

    page.wait_for_navigation()
        .await
        .context("Failed to wait for initial page load")?;

    wait_for_results(page).await
}

/// Poll the DOM until result containers appear, bounded by
/// [`SEARCH_RESULTS_WAIT_TIMEOUT`]
async fn wait_for_results(page: &Page) -> Result<()> {
    let timeout_duration = Duration::from_secs(SEARCH_RESULTS_WAIT_TIMEOUT);
    let poll_interval = Duration::from_millis(200);
    let start = Instant::now();

    info!("Waiting for search results to appear in DOM");
    loop {
        if page.find_element(SEARCH_RESULT_SELECTOR).await.is_ok() {
            debug!(
                "Search results appeared after {:.2}s",
                start.elapsed().as_secs_f64()
            );
            return Ok(());
        }

        if start.elapsed() >= timeout_duration {
            let url = current_url(page).await;
            if is_blocked_url(&url) {
                return Err(anyhow!(
                    "Google presented a CAPTCHA or consent page ({url}). \
                     Try again later or from a different network."
                ));
            }
            return Err(anyhow!(
                "Timeout waiting for search results. Page URL: {url}. \
                 Selector '{SEARCH_RESULT_SELECTOR}' not found after {timeout_duration:?}"
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Extract the ranked result URLs from a rendered SERP.
///
/// Each organic container that carries both a title and an href yields one
/// entry at its 1-based page position. Containers without a title or link
/// (ads, knowledge panels) keep their position but contribute no entry, so
/// ranks can be a sparse subset. A duplicate href keeps its first (best)
/// rank to preserve the uniqueness invariant.
pub async fn extract_ranked_results(page: &Page) -> Result<RankedResultSet> {
    let containers = page
        .find_elements(SEARCH_RESULT_SELECTOR)
        .await
        .context("Failed to find search result containers")?;

    info!("Found {} result containers", containers.len());

    if containers.is_empty() {
        let url = current_url(page).await;
        if is_blocked_url(&url) {
            return Err(anyhow!(
                "Google CAPTCHA or consent page detected ({url}). No results available."
            ));
        }
        return Err(anyhow!(
            "No search results found. This may indicate:\n\
             - Google DOM structure changed (selector '{SEARCH_RESULT_SELECTOR}' stale)\n\
             - Network or connection issues\n\
             - Zero results for this query\n\
             Current URL: {url}"
        ));
    }

    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (index, container) in containers.into_iter().enumerate() {
        let rank = u32::try_from(index + 1).context("Result rank overflowed u32")?;

        // Title required: containers without an h3 are ads or panels
        if container.find_element(TITLE_SELECTOR).await.is_err() {
            debug!("Skipping container at position {rank}: no title element");
            continue;
        }

        let Ok(link) = container.find_element(LINK_SELECTOR).await else {
            debug!("Skipping container at position {rank}: no link element");
            continue;
        };
        let href = link
            .attribute("href")
            .await
            .with_context(|| format!("Failed to get href attribute at position {rank}"))?;
        let Some(href) = href else {
            debug!("Skipping container at position {rank}: empty href");
            continue;
        };

        if !is_result_url(&href) {
            debug!("Skipping non-result href at position {rank}: {href}");
            continue;
        }

        if !seen.insert(href.clone()) {
            debug!("Duplicate href at position {rank}, keeping first rank: {href}");
            continue;
        }

        entries.push((href, rank));
    }

    RankedResultSet::from_entries(entries)
        .map_err(|e| anyhow!("Extracted entries violated the result-set invariant: {e}"))
}

/// Only absolute http(s) links count as results; Google internal links
/// and javascript hrefs do not
fn is_result_url(href: &str) -> bool {
    match Url::parse(href) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed
                    .host_str()
                    .is_some_and(|host| host != "www.google.com" && host != "google.com")
        }
        Err(_) => false,
    }
}

fn is_blocked_url(url: &str) -> bool {
    url.contains("/sorry/") || url.contains("captcha") || url.contains("consent.google")
}

async fn current_url(page: &Page) -> String {
    match page.url().await {
        Ok(Some(url)) => url,
        _ => "about:blank".to_string(),
    }
}

/// Classify errors into retryable vs permanent failures.
///
/// Browser-state errors (closed pages, dead sessions) and CAPTCHAs fail
/// fast; timeouts and network hiccups retry; unknown errors retry
/// conservatively.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("browser closed")
        || error_str.contains("browser disconnected")
        || error_str.contains("page closed")
        || error_str.contains("target closed")
        || error_str.contains("session not found")
        || error_str.contains("session closed")
        || error_str.contains("no response from the chromium instance")
        || error_str.contains("channel")
        || error_str.contains("websocket")
        || error_str.contains("captcha")
        || error_str.contains("consent")
    {
        return false;
    }

    if error_str.contains("timeout")
        || error_str.contains("timed out")
        || error_str.contains("network")
        || error_str.contains("connection refused")
        || error_str.contains("connection reset")
        || error_str.contains("rate limit")
        || error_str.contains("429")
    {
        return true;
    }

    true
}

/// Retry an operation with exponential backoff and error classification
pub async fn retry_with_backoff<F, Fut, T>(f: F, max_retries: u32) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable_error(&e) {
                    warn!("Non-retryable error encountered, failing fast: {:?}", e);
                    return Err(e);
                }

                if retries >= max_retries {
                    warn!("Max retries ({}) exceeded: {:?}", max_retries, e);
                    return Err(e);
                }

                let delay = 2u64.pow(retries) * 1000 + rand::rng().random_range(0..1000);
                warn!(
                    "Retryable error, attempt {}/{}, retrying in {}ms: {:?}",
                    retries + 1,
                    max_retries,
                    delay,
                    e
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                retries += 1;
            }
        }
    }
}
