//! oxide-script CLI
//!
//! Command-line tool for running large SQL scripts against a flaky database.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_script::prelude::*;

/// Run large multi-statement SQL scripts, archiving and retrying failures.
#[derive(Parser)]
#[command(name = "oxide-script")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// JSON configuration file. Command-line options override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, filter and execute a script, archiving and retrying failures.
    Run {
        /// Script file.
        script: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Show the statements a script would execute, without connecting.
    Split {
        /// Script file.
        script: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Retry an archive batch left by an earlier run.
    Retry {
        /// Archive batch directory.
        archive: PathBuf,

        /// Label for new archive batches (defaults to the directory name).
        #[arg(short, long)]
        label: Option<String>,

        #[command(flatten)]
        options: RunOptions,
    },
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
struct RunOptions {
    /// Maximum retry rounds over archived failures.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Maximum attempts per statement when the connection drops.
    #[arg(long)]
    reconnect_attempts: Option<u32>,

    /// Directory archive batches are written under.
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// Exclude statements starting with this prefix (repeatable, replaces
    /// the defaults).
    #[arg(long = "exclude", value_name = "PREFIX")]
    exclude: Vec<String>,

    /// Execute every statement, excluding nothing.
    #[arg(long)]
    no_filter: bool,

    /// Apply the exclusions again in retry rounds.
    #[arg(long)]
    reapply_filter: bool,

    /// Write archive files one at a time.
    #[arg(long)]
    sequential_archive: bool,

    /// Report failures without archiving or retrying them.
    #[arg(long)]
    no_archive: bool,

    /// Split on this character instead of scanning.
    #[arg(long)]
    delimiter: Option<char>,

    /// Remove this substring from every statement (repeatable).
    #[arg(long = "strip", value_name = "PATTERN")]
    strip: Vec<String>,
}

impl RunOptions {
    fn apply(self, config: &mut RunnerConfig) {
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(reconnect_attempts) = self.reconnect_attempts {
            config.reconnect_attempts = reconnect_attempts;
        }
        if let Some(archive_root) = self.archive_root {
            config.archive_root = archive_root;
        }
        if !self.exclude.is_empty() {
            config.excluded_prefixes = self.exclude;
        }
        if self.no_filter {
            config.excluded_prefixes.clear();
        }
        if self.reapply_filter {
            config.reapply_filter_on_retry = true;
        }
        if self.sequential_archive {
            config.archive_mode = ArchiveMode::Sequential;
        }
        if self.no_archive {
            config.archive_failures = false;
        }
        if let Some(delimiter) = self.delimiter {
            config.split_mode = SplitMode::Delimiter { delimiter };
        }
        if !self.strip.is_empty() {
            config.strip_patterns = self.strip;
        }
    }
}

fn load_config(path: Option<&Path>, options: RunOptions) -> anyhow::Result<RunnerConfig> {
    let mut config = match path {
        Some(path) => RunnerConfig::from_json_file(path)?,
        None => RunnerConfig::default(),
    };
    options.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// Prints what a run managed before it was aborted.
fn print_outcome(outcome: &ExecutionOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("Succeeded: {}", outcome.succeeded);
        println!("Failed (not archived):");
        for statement in &outcome.failed {
            println!("[{}] {}", statement.ordinal, statement.text);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Split { script, options } => {
            let config = load_config(cli.config.as_deref(), options)?;
            let script = RawScript::from_path(&script)?;
            let prepared = prepare(&script, &config);

            if cli.json {
                let statements: Vec<_> = prepared
                    .statements
                    .iter()
                    .map(|s| serde_json::json!({ "ordinal": s.ordinal, "text": s.text }))
                    .collect();
                let output = serde_json::json!({
                    "source": script.label(),
                    "split": prepared.split,
                    "filtered": prepared.filtered,
                    "stripped": prepared.stripped,
                    "statements": statements,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for statement in &prepared.statements {
                    println!("[{}] {}", statement.ordinal, statement.text);
                }
                info!(
                    "{} statements, {} excluded, {} stripped",
                    prepared.split, prepared.filtered, prepared.stripped
                );
            }
        }

        Commands::Run { script, options } => {
            let config = load_config(cli.config.as_deref(), options)?;
            let script = RawScript::from_path(&script)?;

            let session = SqliteSession::connect(&cli.database).await?;
            let mut runner = ScriptRunner::new(session, config);
            let summary = match runner.run(&script).await {
                Ok(summary) => summary,
                Err(err) => {
                    if let ScriptError::Aborted { outcome, .. } = &err {
                        print_outcome(outcome, cli.json)?;
                    }
                    return Err(err.into());
                }
            };
            runner.into_connection().disconnect().await?;

            print_summary(&summary, cli.json)?;
        }

        Commands::Retry {
            archive,
            label,
            options,
        } => {
            let config = load_config(cli.config.as_deref(), options)?;
            let batch = ArchiveBatch::open(&archive)?;
            let label = label.unwrap_or_else(|| {
                archive
                    .file_name()
                    .map_or_else(|| "retry".to_string(), |n| n.to_string_lossy().into_owned())
            });
            info!(
                "Retrying {} archived statements from {}",
                batch.len(),
                archive.display()
            );

            let session = SqliteSession::connect(&cli.database).await?;
            let mut runner = ScriptRunner::new(session, config);
            let summary = runner.retry_archive(batch, &label).await?;
            runner.into_connection().disconnect().await?;

            print_summary(&summary, cli.json)?;
        }
    }

    Ok(())
}
