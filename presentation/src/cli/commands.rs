//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use xpcs_domain::{BatchRange, Model, OutputFormat};

/// Output format accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Human-readable console output
    Text,
    /// JSON output
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(value: OutputArg) -> Self {
        match value {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for xpcs-hypothesis
#[derive(Parser, Debug)]
#[command(name = "xpcs-hypothesis")]
#[command(author, version, about = "Draft and check XPCS experiment hypotheses")]
#[command(long_about = r#"
xpcs-hypothesis helps plan X-ray Photon Correlation Spectroscopy experiments.

It checks hypotheses against a beamline capability profile (APS 8-ID-I by
default), drafts new ones grounded in a local knowledge base, answers
questions about XPCS, and harvests the papers behind a citation list.

Configuration files are loaded from (in priority order):
1. XPCS_* environment variables (nested keys with __)
2. --config <path>     Explicit config file
3. ./xpcs.toml         Project-level config
4. ~/.config/xpcs-hypothesis/config.toml   Global config

Example:
  xpcs-hypothesis evaluate hypotheses/colloid_glass.toml
  xpcs-hypothesis draft "aging of a metallic glass below Tg"
  xpcs-hypothesis harvest citations.txt --range 101-115
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Output format (overrides `[output] format`)
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// The command-line format wins over the configured one.
    pub fn output_format(&self, configured: Option<OutputFormat>) -> OutputFormat {
        self.output
            .map(OutputFormat::from)
            .or(configured)
            .unwrap_or_default()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a hypothesis file against the instrument profile
    Evaluate(EvaluateArgs),
    /// Draft a hypothesis from a rough experiment idea
    Draft(DraftArgs),
    /// Ask a question answered from the knowledge base
    Ask(AskArgs),
    /// Interactive chat
    Chat(ChatArgs),
    /// Search the knowledge base (no LLM)
    Search(SearchArgs),
    /// Download the papers behind a citation list
    Harvest(HarvestArgs),
    /// Show the active instrument profile
    Instrument(InstrumentArgs),
    /// Show configuration sources and validation issues
    Config,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Hypothesis TOML file
    pub file: PathBuf,

    /// Instrument profile TOML (defaults to the configured profile)
    #[arg(long, value_name = "FILE")]
    pub instrument: Option<PathBuf>,

    /// Ask the LLM to explain the report
    #[arg(long)]
    pub narrative: bool,

    /// Model for the narrative
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<Model>,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    /// The experiment idea
    #[arg(required = true, num_args = 1..)]
    pub idea: Vec<String>,

    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<Model>,

    /// Number of knowledge chunks to ground the draft on
    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,

    /// Write the drafted hypothesis to this TOML file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub instrument: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<Model>,

    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<Model>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,
}

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Text file with one citation per line
    pub file: PathBuf,

    /// 1-based inclusive batch, e.g. 101-115
    #[arg(long, value_name = "A-B")]
    pub range: Option<BatchRange>,

    /// Where PDFs, notes and the batch log are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InstrumentArgs {
    #[arg(long, value_name = "FILE")]
    pub instrument: Option<PathBuf>,
}

/// Join a multi-word positional argument back into one string.
pub fn joined(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}
