//! Clap argument definitions for the `tfidf` CLI.

use std::{path::PathBuf, process::ExitCode};

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "tfidf", version)]
#[command(about = "TF-IDF scores and top-N term frequencies over a directory of documents")]
pub struct Cli {
    /// Log verbosity (-v for progress, -vv for engine details)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `tfidf run`.
#[derive(Args, Debug, Clone)]
pub struct RunCommand {
    /// <INPUT_DIR> <OUTPUT_BASE> [TOP_N]
    #[arg(value_name = "ARGS", required = true, num_args = 2..=3)]
    pub args: Vec<String>,

    /// Reduce partitions per stage [default: 1]
    #[arg(long)]
    pub reduce_tasks: Option<usize>,

    /// Worker threads, 0 for one per core [default: 0]
    #[arg(long)]
    pub threads: Option<usize>,

    /// Attempts per task before its stage fails [default: 4]
    #[arg(long)]
    pub max_attempts: Option<usize>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `tfidf init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.tfidf.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `tfidf` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the five-stage pipeline
    #[command(after_help = "\
ARGUMENTS:
  tfidf run <INPUT_DIR> <OUTPUT_BASE>           top-N from configuration
  tfidf run <INPUT_DIR> <OUTPUT_BASE> <TOP_N>
  tfidf run <INPUT_DIR> <TOP_N> <OUTPUT_BASE>   accepted too

  A third argument that is not an integer is ignored with a warning.

OUTPUTS:
  <OUTPUT_BASE>/step1/tfraw*      term  document  count
  <OUTPUT_BASE>/step1/doctotal*   document  total
  <OUTPUT_BASE>/step2_tf/         term  document  tf
  <OUTPUT_BASE>/step3_idf/        term  idf
  <OUTPUT_BASE>/step4_tfidf/      document  term  tfidf
  <OUTPUT_BASE>/top<N>_freq/      document  rank  term  frequency

EXIT CODES:
  0     success
  1     usage or configuration error
  2-6   stage 1-5 failed")]
    Run(RunCommand),

    /// Initialize tfidf configuration in current directory
    Init(InitCommand),

    /// Show effective configuration settings
    Config,
}

/// The top-N position of `run`'s positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopNArg {
    /// Only input and output were given.
    Absent,
    /// An integer was given.
    Given(usize),
    /// A third argument was given but is not an integer.
    Invalid(String),
}

impl TopNArg {
    /// The explicit top-N value, if one was given.
    pub fn value(&self) -> Option<usize> {
        match self {
            Self::Given(n) => Some(*n),
            Self::Absent | Self::Invalid(_) => None,
        }
    }
}

/// Input, output and top-N resolved from `run`'s positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    /// Directory of input documents.
    pub input_dir: PathBuf,
    /// Output base directory.
    pub output_base: PathBuf,
    /// Top-N argument.
    pub top_n: TopNArg,
}

/// Resolves `run`'s positional arguments, accepting both argument orders.
///
/// With three arguments, an integer in the last position is the top-N; otherwise an
/// integer in the middle position is, and the last argument is the output base. If
/// neither is an integer the third argument is reported as invalid. Returns `None`
/// for fewer than two arguments.
pub fn resolve_positional(args: &[String]) -> Option<RunTarget> {
    let [input, rest @ ..] = args else {
        return None;
    };
    let (output, top_n) = match rest {
        [output] => (output, TopNArg::Absent),
        [middle, last, ..] => match (parse_top_n(last), parse_top_n(middle)) {
            (Some(n), _) => (middle, TopNArg::Given(n)),
            (None, Some(n)) => (last, TopNArg::Given(n)),
            (None, None) => (middle, TopNArg::Invalid(last.clone())),
        },
        [] => return None,
    };
    Some(RunTarget {
        input_dir: PathBuf::from(input),
        output_base: PathBuf::from(output),
        top_n,
    })
}

/// Parses a top-N argument, tolerating surrounding whitespace.
fn parse_top_n(arg: &str) -> Option<usize> {
    arg.trim().parse().ok()
}

/// Parses CLI arguments.
///
/// Help and version requests exit immediately. Usage errors are printed and mapped to
/// exit code 1, keeping codes 2 and up for stage failures.
pub fn parse_cli() -> Result<Cli, ExitCode> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprint!("{e}");
            Err(ExitCode::FAILURE)
        }
    }
}
