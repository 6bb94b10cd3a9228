//! Compare Google SERP rankings with and without duplicate filtering.
//!
//! Google's `filter=0` search parameter disables near-duplicate result
//! suppression. This crate fetches the same query under both URL variants,
//! extracts the ranked result URLs from each rendered page, and computes
//! the per-URL rank delta so suppressed or reordered results become
//! visible.
//!
//! ```no_run
//! use serpdelta::{BrowserExtractor, BrowserManager, SerpRequest, compare_serps};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let extractor = BrowserExtractor::new(BrowserManager::new());
//!     let report = compare_serps(&extractor, &SerpRequest::new("rust async")).await?;
//!     for (url, delta) in &report.delta {
//!         println!("{delta:>10}  {url}");
//!     }
//!     extractor.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod comparison;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use comparison::{RankDelta, RankedResultSet, compare_rankings};
pub use error::{SerpError, SerpResult};
pub use extractor::{BrowserExtractor, BrowserManager, RankExtractor};
pub use orchestrator::{FETCH_TIMEOUT_SECS, compare_serps};
pub use report::{ComparisonReport, ReportRow};
pub use request::{SearchVariant, SerpRequest};
