use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use zooscraper::{
    error::PipelineError,
    process::{self, extract::ExtractOptions, progress::GroupProgress, RunSummary},
    table::{read_csv, write_table, Table},
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extract and cross-validate camera-trap annotation exports"
)]
struct Cli {
    /// Print run counters as JSON on stdout once the output is written
    #[arg(long, global = true)]
    summary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode annotation cells into the 9-column extracted table
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Consolidate duplicate annotations per filename and add habitat labels
    Validate {
        #[arg(short, long)]
        input: PathBuf,
        /// Defaults to rewriting the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract, validate and label in one pass
    Run {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// 1-based data row to start from
    #[arg(long)]
    start_row: Option<usize>,
    /// Exact, case-sensitive workflow_name to keep
    #[arg(long, env = "ZOOSCRAPER_WORKFLOW_NAME")]
    workflow_name: Option<String>,
}

impl FilterArgs {
    fn options(self) -> Result<ExtractOptions, PipelineError> {
        ExtractOptions::new(self.start_row, self.workflow_name)
    }
}

type StageResult = Result<(Table, RunSummary), PipelineError>;

/// Run a stage on the blocking pool while an async task renders its progress.
async fn run_stage<F>(job: F) -> Result<(Table, RunSummary)>
where
    F: FnOnce(&watch::Sender<GroupProgress>) -> StageResult + Send + 'static,
{
    let (tx, mut rx) = watch::channel(GroupProgress::default());

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "processing file {pos}/{len} [{bar:40}]",
    )?);

    let observer = tokio::spawn({
        let bar = bar.clone();
        async move {
            while rx.changed().await.is_ok() {
                let p = *rx.borrow_and_update();
                bar.set_length(p.total as u64);
                bar.set_position(p.current as u64);
            }
        }
    });

    // the sender drops with the job, which ends the observer loop
    let result = tokio::task::spawn_blocking(move || job(&tx))
        .await
        .context("pipeline task failed")?;
    let _ = observer.await;
    bar.finish_and_clear();

    Ok(result?)
}

fn load(input: &Path) -> Result<Table> {
    let table = read_csv(input)?;
    info!(path = %input.display(), rows = table.len(), "loaded input");
    Ok(table)
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    // ─── 2) check parameters, load, transform ────────────────────────
    let (output, (table, summary)) = match cli.command {
        Command::Extract {
            input,
            output,
            filter,
        } => {
            let opts = filter.options()?;
            let output = output.ok_or(PipelineError::NoDestinationSelected)?;
            let source = load(&input)?;
            let result = run_stage(move |_| process::run_extract(&source, &opts)).await?;
            (output, result)
        }
        Command::Validate { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            let sheet = load(&input)?;
            let result = run_stage(move |tx| process::run_validate(sheet, tx)).await?;
            (output, result)
        }
        Command::Run {
            input,
            output,
            filter,
        } => {
            let opts = filter.options()?;
            let output = output.ok_or(PipelineError::NoDestinationSelected)?;
            let source = load(&input)?;
            let result = run_stage(move |tx| process::run_all(&source, &opts, tx)).await?;
            (output, result)
        }
    };

    // ─── 3) write the result once, in full ───────────────────────────
    write_table(&table, &output)?;

    if cli.summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    info!(path = %output.display(), "all done");
    Ok(())
}
