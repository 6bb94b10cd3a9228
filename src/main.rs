//! serpdelta CLI
//!
//! Runs one SERP comparison and prints a two-column rank table (or JSON)
//! showing which results Google's duplicate filter suppresses or reorders.

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use serpdelta::{
    BrowserExtractor, BrowserManager, ComparisonReport, RankDelta, SearchVariant, SerpRequest,
    compare_serps,
};

#[derive(Parser, Debug)]
#[command(
    name = "serpdelta",
    about = "Compare Google SERP rankings with and without duplicate filtering (filter=0)"
)]
struct Cli {
    /// Search query
    query: String,

    /// Interface language code (Google hl parameter)
    #[arg(long, default_value = "en")]
    hl: String,

    /// Region code (Google gl parameter)
    #[arg(long, default_value = "US")]
    gl: String,

    /// Number of results to request per page
    #[arg(long, default_value_t = 10)]
    num: u32,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Run the browser with a visible window (useful for consent pages)
    #[arg(long)]
    no_headless: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let request = SerpRequest {
        query: cli.query,
        hl: cli.hl,
        gl: cli.gl,
        num: cli.num,
    };

    let extractor = BrowserExtractor::new(BrowserManager::with_headless(!cli.no_headless));

    let start = Instant::now();
    let outcome = compare_serps(&extractor, &request).await;

    // Always close Chrome, even on a failed comparison
    if let Err(e) = extractor.shutdown().await {
        eprintln!("Warning: browser shutdown failed: {e}");
    }

    match outcome {
        Ok(report) => {
            if cli.json {
                match report.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Failed to serialize report: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else if let Err(e) = print_report(&report, start.elapsed().as_secs_f64()) {
                eprintln!("Failed to write report: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("serpdelta: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
                .add_directive("chromiumoxide::handler=off".parse().expect("static directive"))
                .add_directive("chromiumoxide::conn=off".parse().expect("static directive")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn print_report(report: &ComparisonReport, elapsed_secs: f64) -> anyhow::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(
        &mut stdout,
        "\nSERP comparison for '{}' (hl={}, gl={}, num={}) in {:.1}s\n",
        report.request.query.trim(),
        report.request.hl,
        report.request.gl,
        report.request.num,
        elapsed_secs
    )?;
    stdout.reset()?;

    print_column(&mut stdout, report, SearchVariant::Normal)?;
    print_column(&mut stdout, report, SearchVariant::FilterOff)?;

    Ok(())
}

fn print_column(
    stdout: &mut StandardStream,
    report: &ComparisonReport,
    variant: SearchVariant,
) -> anyhow::Result<()> {
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(stdout, "=== {} ===", variant.label())?;
    stdout.reset()?;

    let rows = report.rows(variant);
    if rows.is_empty() {
        writeln!(stdout, "  (no results)")?;
    }

    for row in rows {
        write!(stdout, "  {:>3}. ", row.rank)?;

        stdout.set_color(ColorSpec::new().set_fg(Some(delta_color(row.change))))?;
        write!(stdout, "{:<10}", row.change.label())?;
        stdout.reset()?;

        writeln!(stdout, "  {}", row.url)?;
    }
    writeln!(stdout)?;

    Ok(())
}

/// Color scheme carried over from the original report: green gained,
/// red lost, orange-ish OUT, blue IN
fn delta_color(delta: RankDelta) -> Color {
    match delta {
        RankDelta::Shift(d) if d < 0 => Color::Green,
        RankDelta::Shift(d) if d > 0 => Color::Red,
        RankDelta::Shift(_) => Color::White,
        RankDelta::Dropped => Color::Yellow,
        RankDelta::Entered => Color::Blue,
    }
}
