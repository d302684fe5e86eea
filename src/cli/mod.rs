//! CLI argument parsing and command dispatch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use datagen_core::{
    ConsumerError, EmitterBuilder, EmitterHandle, EmitterOptions, ProducerError, Record,
    StatsSummary, StopOutcome,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Slowest rate the CLI will run at
const MIN_THROUGHPUT: i64 = 1;

#[derive(Parser)]
#[command(name = "datagen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Emit records until the limit is reached or Ctrl+C is pressed
    Run(RunArgs),
}

/// Where emitted records go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sink {
    /// One JSON document per line on stdout
    Stdout,
    /// Drop every record; useful for measuring raw throughput
    Discard,
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Path to a JSON options file
    #[arg(short, long, env = "DATAGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    pub max_records: Option<u64>,

    /// Target records per second; values below 1 run at 1
    #[arg(short, long, allow_hyphen_values = true)]
    pub throughput: Option<i64>,

    /// Seconds between progress reports; 0 disables them
    #[arg(long)]
    pub reporting_interval_secs: Option<u64>,

    /// Seconds to wait for the emitter to stop on Ctrl+C
    #[arg(long)]
    pub stop_timeout_secs: Option<u64>,

    /// JSON value carried by every record
    #[arg(long, default_value = "{}")]
    pub value: String,

    /// Destination for emitted records
    #[arg(long, value_enum, default_value_t = Sink::Stdout)]
    pub sink: Sink,
}

impl Cli {
    /// Dispatch the selected command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run(args).await,
        }
    }
}

impl RunArgs {
    /// Options file first, then flag overrides
    fn options(&self) -> Result<EmitterOptions> {
        let mut options = match &self.config {
            Some(path) => EmitterOptions::from_json_file(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?,
            None => EmitterOptions::default(),
        };

        if let Some(limit) = self.max_records {
            options = options.with_iteration_limit(limit);
        }
        if let Some(rate) = self.throughput {
            options = options.with_target_rate(rate);
        }
        if let Some(secs) = self.reporting_interval_secs {
            options = options.with_reporting_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = self.stop_timeout_secs {
            options = options.with_stop_timeout(Duration::from_secs(secs));
        }

        if options.target_rate < MIN_THROUGHPUT {
            tracing::warn!(
                requested = options.target_rate,
                "Throughput below {} record/sec, using {}",
                MIN_THROUGHPUT,
                MIN_THROUGHPUT
            );
            options = options.with_target_rate(MIN_THROUGHPUT);
        }

        Ok(options)
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let options = args.options()?;
    let value: serde_json::Value =
        serde_json::from_str(&args.value).context("--value is not valid JSON")?;

    let mut seq = 0u64;
    let producer = move || {
        let record = Record::new(seq, value.clone());
        seq += 1;
        Ok::<_, ProducerError>(record)
    };

    let builder = EmitterBuilder::new("datagen")
        .options(options)
        .producer(producer);
    let emitter = match args.sink {
        Sink::Stdout => {
            let mut out = std::io::stdout();
            builder.consumer(move |record: Record| -> Result<(), ConsumerError> {
                serde_json::to_writer(&mut out, &record)?;
                out.write_all(b"\n")?;
                Ok(())
            })
        }
        Sink::Discard => builder.consumer(|_record: Record| Ok::<_, ConsumerError>(())),
    }
    .build()?;

    let handle = emitter.handle();
    let task = tokio::task::spawn_blocking(move || emitter.run());
    let stopper = tokio::spawn(stop_on_ctrl_c(handle));

    let summary = task.await.context("emitter task panicked")??;
    stopper.abort();

    report(&summary);
    Ok(())
}

async fn stop_on_ctrl_c(handle: EmitterHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Received Ctrl+C, stopping emitter");

    match tokio::task::spawn_blocking(move || handle.stop()).await {
        Ok(StopOutcome::TimedOut) => tracing::warn!("Emitter still finishing its last record"),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Stop task panicked"),
    }
}

fn report(summary: &StatsSummary) {
    if summary.is_empty() {
        return;
    }
    tracing::info!(
        count = summary.count,
        total_bytes = summary.total_bytes,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Run finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        match cli.command {
            Commands::Run(args) => args,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let options = run_args(&["datagen", "run", "-n", "10", "--throughput", "250"])
            .options()
            .unwrap();

        assert_eq!(options.iteration_limit, Some(10));
        assert_eq!(options.target_rate, 250);
        assert_eq!(options.stop_timeout, EmitterOptions::DEFAULT_STOP_TIMEOUT);
    }

    #[test]
    fn test_throughput_is_clamped_to_one() {
        let zero = run_args(&["datagen", "run", "--throughput", "0"]).options().unwrap();
        assert_eq!(zero.target_rate, 1);

        let negative = run_args(&["datagen", "run", "--throughput", "-1"]).options().unwrap();
        assert_eq!(negative.target_rate, 1);
    }

    #[test]
    fn test_sink_defaults_to_stdout() {
        let args = run_args(&["datagen", "run"]);
        assert_eq!(args.sink, Sink::Stdout);
        assert_eq!(args.value, "{}");
    }
}
