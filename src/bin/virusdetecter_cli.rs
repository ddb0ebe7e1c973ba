use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;

use virusdetecter_rs::config::{DEFAULT_MIN_PERCENT, DEFAULT_THREADS};
use virusdetecter_rs::{run_pipeline_with, PipelineConfig, PipelineError, Stage, ToolPaths};

/// Classify paired reads with kraken2, keep abundant viral species, split
/// reads per taxon, then assemble (SPAdes) and align (blastn) each taxon.
#[derive(Parser, Debug)]
#[command(name = "virusdetecter-rs", version, about)]
struct Args {
    /// Forward reads
    #[arg(value_name = "READS_1")]
    reads_1: PathBuf,

    /// Reverse reads
    #[arg(value_name = "READS_2")]
    reads_2: PathBuf,

    /// Minimum relative abundance of a species among classified species
    /// (values <= 0 fall back to the default)
    #[arg(short = 'p', long = "min-percent", default_value_t = DEFAULT_MIN_PERCENT, allow_negative_numbers = true)]
    min_percent: f64,

    /// Number of threads for kraken2 and SPAdes
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Path to the kraken2 viral database
    #[arg(short = 'd', long = "kraken-db", env = "VIRUSDETECTER_KRAKEN_DB")]
    kraken_db: PathBuf,

    /// Output directory (defaults to the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// kraken2 executable
    #[arg(long, env = "VIRUSDETECTER_KRAKEN2", default_value = "kraken2")]
    kraken2_bin: PathBuf,

    /// SPAdes executable
    #[arg(long, env = "VIRUSDETECTER_SPADES", default_value = "spades.py")]
    spades_bin: PathBuf,

    /// blastn executable
    #[arg(long, env = "VIRUSDETECTER_BLASTN", default_value = "blastn")]
    blastn_bin: PathBuf,
}

fn spinner(color: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&format!("{{spinner:.{color}}} {{msg}}"))
    {
        spinner.set_style(style);
    }
    spinner
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let output_dir = match args.output {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: cannot determine current directory: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let config = PipelineConfig {
        reads_1: args.reads_1,
        reads_2: args.reads_2,
        kraken_db: args.kraken_db,
        output_dir,
        threads: args.threads,
        min_percent: args.min_percent,
        tools: ToolPaths {
            kraken2: args.kraken2_bin,
            spades: args.spades_bin,
            blastn: args.blastn_bin,
        },
    };

    let colors = ["blue", "green", "yellow", "magenta", "cyan"];
    let mut current: Option<ProgressBar> = None;

    let result = run_pipeline_with(&config, |stage: Stage| {
        if let Some(prev) = current.take() {
            prev.finish();
        }
        let idx = Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0);
        let bar = spinner(colors[idx % colors.len()]);
        bar.set_message(stage.describe());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        current = Some(bar);
    });

    if let Some(bar) = current.take() {
        bar.finish();
    }

    match result {
        Ok(summary) => {
            let done = spinner("cyan");
            done.finish_with_message(format!(
                "All done! {} taxa selected, {} assembled, {} aligned.",
                summary.selected_taxa.len(),
                summary.assemblies,
                summary.alignments
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code_for(&e)
        }
    }
}

/// A failing tool's own exit status is passed through.
fn exit_code_for(err: &PipelineError) -> ExitCode {
    match err {
        PipelineError::ToolFailed { status, .. } => status
            .code()
            .and_then(|c| u8::try_from(c).ok())
            .filter(|c| *c != 0)
            .map(ExitCode::from)
            .unwrap_or(ExitCode::FAILURE),
        _ => ExitCode::FAILURE,
    }
}
