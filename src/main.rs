use anyhow::{Context, Result};
use creditrisk::{run_pipeline, table, PipelineConfig};
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() > 2 {
        eprintln!("Usage: creditrisk [INPUT] [CONFIG_JSON]");
        std::process::exit(2);
    }
    let config = PipelineConfig::from_args(args).context("loading configuration")?;
    info!(?config, "startup");

    // ─── 3) run ──────────────────────────────────────────────────────
    let report = run_pipeline(&config)
        .with_context(|| format!("credit risk pipeline failed for {}", config.input.display()))?;

    // ─── 4) report ───────────────────────────────────────────────────
    println!("{}", table::preview(&report.derived, config.preview_rows)?);
    println!(
        "({}, {})",
        report.derived.num_rows(),
        report.derived.num_columns()
    );
    println!(
        "Optimized data saved to '{}'.",
        report.table_output.display()
    );

    println!("Correlation Matrix:");
    let matrix = report.correlations.to_record_batch()?;
    println!("{}", table::preview(&matrix, matrix.num_rows())?);
    println!(
        "Correlation matrix saved to '{}'.",
        report.correlation_output.display()
    );

    info!("all done");
    Ok(())
}
