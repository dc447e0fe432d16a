use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use discoeval::{Encoding, EvalParams, ExportFormat, Report, evaluate_files};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "discoeval",
    version,
    about = "EVALB-style scoring of discontinuous constituency trees in export format"
)]
struct Cli {
    /// Gold (key) treebank
    #[arg(short, long, visible_alias = "key")]
    gold: PathBuf,

    /// Parser output (answer) to score
    #[arg(short, long, visible_alias = "answer")]
    test: PathBuf,

    /// EVALB-style parameter file
    #[arg(short, long)]
    param: Option<PathBuf>,

    /// Ignore labels when matching brackets
    #[arg(short, long, default_value_t = false)]
    unlabeled: bool,

    /// Only score sentences with at most this many terminals
    #[arg(short, long)]
    cutoff: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = EncodingArg::Utf8)]
    encoding: EncodingArg,

    /// Force an export format version instead of reading #FORMAT
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Print only the summary
    #[arg(long, default_value_t = false)]
    no_sentences: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EncodingArg {
    Utf8,
    Latin1,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Latin1 => Encoding::Latin1,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    V3,
    V4,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::V3 => ExportFormat::V3,
            FormatArg::V4 => ExportFormat::V4,
        }
    }
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "evaluation failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut params = match &cli.param {
        Some(path) => EvalParams::from_file(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => EvalParams::default(),
    };
    if cli.unlabeled {
        params = params.with_labeled(false);
    }
    if let Some(cutoff) = cli.cutoff {
        params = params.with_cutoff_len(cutoff);
    }

    let evaluation = evaluate_files(
        &cli.gold,
        &cli.test,
        &params,
        cli.encoding.into(),
        cli.format.map(ExportFormat::from),
    )
    .with_context(|| {
        format!(
            "failed to evaluate {} against {}",
            cli.test.display(),
            cli.gold.display()
        )
    })?;

    let report = Report::new(&evaluation).with_sentences(!cli.no_sentences);
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{report}").context("failed to write report")?;
    stdout.flush().context("failed to write report")?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
