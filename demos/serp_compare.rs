//! SERP comparison demo
//!
//! Runs two comparisons against a live browser to show browser reuse
//! between runs.
//!
//! Usage:
//!   cargo run --example serp_compare

use serpdelta::{BrowserExtractor, BrowserManager, SearchVariant, SerpRequest, compare_serps};
use std::io::Write;
use std::time::Instant;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
                .add_directive("chromiumoxide::handler=off".parse()?)
                .add_directive("chromiumoxide::conn=off".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let extractor = BrowserExtractor::new(BrowserManager::new());
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    for (test, query) in [(1, "rust async programming"), (2, "tokio tutorial")] {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        writeln!(&mut stdout, "\n=== Comparison {test}: '{query}' ===")?;
        stdout.reset()?;

        let start = Instant::now();
        match compare_serps(&extractor, &SerpRequest::new(query)).await {
            Ok(report) => {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                writeln!(
                    &mut stdout,
                    "Completed in {:.2}s ({} normal / {} filter=0 results)",
                    start.elapsed().as_secs_f64(),
                    report.normal.len(),
                    report.filter_off.len()
                )?;
                stdout.reset()?;

                for row in report.rows(SearchVariant::Normal) {
                    writeln!(
                        &mut stdout,
                        "  {:>3}. {:<10}  {}",
                        row.rank,
                        row.change.label(),
                        row.url
                    )?;
                }
            }
            Err(e) => {
                let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                writeln!(
                    &mut stderr,
                    "Comparison failed after {:.2}s: {e}",
                    start.elapsed().as_secs_f64()
                )?;
                stderr.reset()?;
                extractor.shutdown().await?;
                return Err(e.into());
            }
        }
    }

    // Second run reuses the already-launched browser and should be faster
    extractor.shutdown().await?;
    Ok(())
}
