//! Shared browser lifecycle manager
//!
//! One lazily-launched chromiumoxide browser shared by all extractions.
//! The browser is launched on first use (~2-3s) and reused afterwards;
//! a failed health check triggers cleanup and relaunch.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::browser::{BrowserWrapper, launch_browser};

/// Manager for the shared browser instance used by SERP extractions
///
/// # Lifecycle
/// - Browser NOT launched on manager creation (lazy initialization)
/// - First `get_or_launch()` call launches the browser
/// - Subsequent calls return the existing browser after a health check
/// - `shutdown()` explicitly closes the browser and removes its profile
///
/// # Thread safety
/// `Arc<Mutex<Option<BrowserWrapper>>>` for async-safe access. Callers lock
/// only long enough to open a page; pages carry their own CDP sessions, so
/// two extractions can drive the same browser concurrently.
#[derive(Clone)]
pub struct BrowserManager {
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    headless: bool,
}

impl BrowserManager {
    /// Create a manager that will launch a headless browser on first use
    #[must_use]
    pub fn new() -> Self {
        Self::with_headless(true)
    }

    /// Create a manager with explicit headless control (headed mode is
    /// useful when debugging consent pages and CAPTCHAs)
    #[must_use]
    pub fn with_headless(headless: bool) -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            headless,
        }
    }

    /// Get or launch the shared browser, with health check and recovery.
    ///
    /// If a browser exists its liveness is verified via the `version()` CDP
    /// command; a crashed browser is cleaned up and a fresh one launched in
    /// its place.
    pub async fn get_or_launch(&self) -> Result<Arc<Mutex<Option<BrowserWrapper>>>> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    debug!("Browser health check passed, reusing existing browser");
                    drop(guard);
                    return Ok(self.browser.clone());
                }
                Err(e) => {
                    warn!("Browser health check failed: {}. Triggering recovery...", e);
                    if let Some(mut crashed) = guard.take() {
                        // Best-effort, the process may already be gone
                        let _ = crashed.browser_mut().close().await;
                        let _ = crashed.browser_mut().wait().await;
                        crashed.cleanup_temp_dir();
                    }
                    info!("Crashed browser cleaned up, launching new instance");
                }
            }
        }

        info!("Launching browser (first use or after recovery)");
        let (browser, handler, user_data_dir) = launch_browser(self.headless).await?;
        *guard = Some(BrowserWrapper::new(browser, handler, user_data_dir));
        drop(guard);

        Ok(self.browser.clone())
    }

    /// Shut down the browser if running. Safe to call more than once.
    ///
    /// `BrowserWrapper::drop()` only aborts the handler task; the Chrome
    /// process must be closed and waited on explicitly here so the temp
    /// profile can be removed afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down SERP extraction browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            wrapper.cleanup_temp_dir();

            drop(wrapper);
        }

        Ok(())
    }
}

impl Default for BrowserManager {
    fn default() -> Self {
        Self::new()
    }
}
