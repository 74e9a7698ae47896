//! CLI argument structs for all subcommands.

use clap::{Args, Parser, ValueEnum};

use callers::analysis::{AnalysisOptions, Attribution, ClassifyOptions, Query, RiskKind};
use callers::model::{LoadOptions, ProjectOptions};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per result
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

/// Tear-off label filter for `tearoff --only`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFilter {
    TearoffSafe,
    TearoffUnsafe,
    BareCallback,
}

impl From<RiskFilter> for RiskKind {
    fn from(filter: RiskFilter) -> Self {
        match filter {
            RiskFilter::TearoffSafe => RiskKind::TearoffSafe,
            RiskFilter::TearoffUnsafe => RiskKind::TearoffUnsafe,
            RiskFilter::BareCallback => RiskKind::BareCallback,
        }
    }
}

/// Options shared by every subcommand: which project to load and which method to analyze.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Name of the class declaring the method
    pub class: String,

    /// Method name
    pub method: String,

    /// Root directory of the TypeScript project
    #[arg(short, long, default_value = ".")]
    pub dir: String,

    /// Source file extensions, comma-separated
    #[arg(short, long, default_value = "ts,tsx,mts,cts")]
    pub ext: String,

    /// Only load files whose path below --dir matches this regex
    #[arg(long)]
    pub include: Option<String>,

    /// Prefer the declaration whose file path contains this substring
    #[arg(long)]
    pub file_hint: Option<String>,

    /// Number of parallel parser threads (0 = auto)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level for stderr output when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Emit stderr logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl TargetArgs {
    pub fn query(&self) -> Query {
        let query = Query::new(self.class.as_str(), self.method.as_str());
        match &self.file_hint {
            Some(hint) => query.with_file_hint(hint.as_str()),
            None => query,
        }
    }

    pub fn load_options(&self, project: ProjectOptions) -> LoadOptions {
        LoadOptions {
            dir: self.dir.clone(),
            ext: self.ext.clone(),
            include: self.include.clone(),
            threads: self.threads,
            project,
        }
    }
}

#[derive(Parser, Debug)]
pub struct FindArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Keep only call sites whose invocation resolves into the equivalence set
    #[arg(long, env = "STRICT")]
    pub strict: bool,

    /// Omit `super.m()` call sites
    #[arg(long, env = "SKIP_SUPER")]
    pub skip_super: bool,

    /// Only report calls through a receiver typed as the class itself
    #[arg(long)]
    pub exact_receiver: bool,

    /// Do not report name matches on receivers of unknown type
    #[arg(long)]
    pub no_lenient: bool,

    /// Also label tear-off risk for every extraction of the method
    #[arg(long)]
    pub tearoff: bool,
}

impl FindArgs {
    pub fn project_options(&self) -> ProjectOptions {
        ProjectOptions { lenient_receivers: !self.no_lenient }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            classify: ClassifyOptions {
                skip_super: self.skip_super,
                attribution: if self.exact_receiver { Attribution::ExactReceiver } else { Attribution::Polymorphic },
            },
            strict: self.strict,
            tearoff: self.tearoff,
        }
    }
}

#[derive(Parser, Debug)]
pub struct EquivArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Parser, Debug)]
pub struct TearoffArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show only labels of this kind
    #[arg(long, value_enum)]
    pub only: Option<RiskFilter>,
}
