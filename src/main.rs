use anyhow::Context;
use clap::Parser;
use gridtally::config::{BookSource, Config, EstimateMode};
use gridtally::engine::{run_analysis, EventStats, ImbalanceAnalyzer};
use gridtally::report::write_lead_report_file;
use gridtally::sink::CsvSink;
use gridtally::source::JsonlSource;
use std::path::PathBuf;

/// Summarize per-broker demand, wholesale trading, and imbalance costs from
/// a simulation event stream.
#[derive(Debug, Parser)]
#[command(name = "gridtally", version, about)]
struct Cli {
    /// Event stream to analyze (JSON lines, one event per line).
    input: PathBuf,

    /// Output CSV file.
    output: PathBuf,

    /// Reproduce the legacy per-broker estimate (asks only, price x imbalance).
    #[arg(long)]
    legacy_est: bool,

    /// Estimate per-broker clearing cost from the previous timeslot's book.
    #[arg(long)]
    use_prev_book: bool,

    /// Also write per-lead-time market activity to this file.
    #[arg(long, value_name = "PATH")]
    lead_report: Option<PathBuf>,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let sink = CsvSink::create(&cli.output)
        .with_context(|| format!("cannot open output file {}", cli.output.display()))?;
    let mut source = JsonlSource::open(&cli.input)
        .with_context(|| format!("cannot open input stream {}", cli.input.display()))?;

    let config = Config::new()
        .with_estimate_mode(if cli.legacy_est {
            EstimateMode::Legacy
        } else {
            EstimateMode::Marginal
        })
        .with_book_source(if cli.use_prev_book {
            BookSource::Previous
        } else {
            BookSource::Current
        })
        .with_lead_activity(cli.lead_report.is_some());

    let mut analyzer = ImbalanceAnalyzer::new(config, sink);
    let mut stats = EventStats::new();
    let dispatched = run_analysis(&mut source, &mut analyzer, &mut stats)
        .context("event stream processing failed")?;

    if source.unknown_kinds() > 0 {
        tracing::warn!(
            skipped = source.unknown_kinds(),
            "stream contained event kinds this analyzer does not know"
        );
    }
    tracing::info!(
        events = dispatched,
        rows = analyzer.rows_emitted(),
        output = %cli.output.display(),
        "done"
    );

    if let Some(path) = &cli.lead_report {
        write_lead_report_file(path, analyzer.lead_activity(), analyzer.sim_start())
            .with_context(|| format!("cannot write lead report {}", path.display()))?;
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("gridtally: {:#}", e);
        std::process::exit(1);
    }
}
