//! CLI layer: argument parsing, command dispatch, and subcommand implementations.

pub mod args;

pub use args::*;

use std::fmt::Write as _;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use callers::analysis::{
    analyze, assess_tearoff_risk, build_equivalence_set, resolve, uses_implicit_receiver, AnalysisReport,
    MemberInfo, RiskKind, RiskLabel,
};
use callers::model::{load_project, TsProject};
use callers::{AnalysisError, SourceModel};

// ─── CLI ─────────────────────────────────────────────────────────────

/// Find every call site of a TypeScript method, through base classes and implemented interfaces
#[derive(Parser, Debug)]
#[command(name = "callers", version, about, after_help = "\
Run 'callers <COMMAND> --help' for detailed options and examples.\n\
Common options: -d <DIR> (project root), -e <EXT> (extensions), -f json (JSON output)")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// List call sites of CLASS.METHOD and of every equivalent member
    Find(FindArgs),

    /// Show the equivalence set: overridden base methods and implemented interface members
    Equiv(EquivArgs),

    /// Label every place the method is torn off from its receiver
    Tearoff(TearoffArgs),
}

impl Commands {
    pub fn target(&self) -> &TargetArgs {
        match self {
            Commands::Find(args) => &args.target,
            Commands::Equiv(args) => &args.target,
            Commands::Tearoff(args) => &args.target,
        }
    }
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();
    let target = cli.command.target();
    init_logging(&target.log_level, target.log_json);

    let result = match &cli.command {
        Commands::Find(args) => find_output(args),
        Commands::Equiv(args) => equiv_output(args),
        Commands::Tearoff(args) => tearoff_output(args),
    };

    match result {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins; otherwise `--log-level`. Logs go to stderr so stdout stays parseable.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let _ = if json { builder.json().try_init() } else { builder.try_init() };
}

fn load(target: &TargetArgs, project: callers::ProjectOptions) -> Result<TsProject, AnalysisError> {
    if target.ext.split(',').all(|e| e.trim().is_empty()) {
        return Err(AnalysisError::InvalidArgs("--ext must name at least one extension".to_string()));
    }
    load_project(&target.load_options(project))
}

// ─── find ───────────────────────────────────────────────────────────

pub(crate) fn find_output(args: &FindArgs) -> Result<String, AnalysisError> {
    let start = Instant::now();
    let project = load(&args.target, args.project_options())?;
    let report = analyze(&project, &args.target.query(), &args.analysis_options())?;

    eprintln!(
        "[find] {} call site(s) of {}.{} across {} equivalent member(s), {} files ({:.1}ms)",
        report.call_sites.len(),
        report.target.type_name,
        report.target.member,
        report.equivalence.len(),
        project.units().len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    match args.target.format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&report)?)),
        OutputFormat::Text => Ok(render_find_text(&report)),
    }
}

fn render_find_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for site in &report.call_sites {
        let _ = writeln!(
            out,
            "{}:{}:{}: [{}] {}: {}",
            site.path,
            site.line,
            site.column,
            site.label,
            site.caller.as_deref().unwrap_or("<top-level>"),
            site.text.trim()
        );
    }
    if let Some(summary) = &report.verification {
        let _ = writeln!(out, "verified: {} kept, {} discarded", summary.kept, summary.discarded);
    }
    if !report.tearoff_risks.is_empty() {
        out.push_str("tear-offs:\n");
        out.push_str(&render_risks_text(&report.tearoff_risks));
    }
    out
}

// ─── equiv ──────────────────────────────────────────────────────────

pub(crate) fn equiv_output(args: &EquivArgs) -> Result<String, AnalysisError> {
    let project = load(&args.target, Default::default())?;
    let decl = resolve(&project, &args.target.query())?;
    let set = build_equivalence_set(&project, decl);

    let members: Vec<MemberInfo> =
        set.symbols().iter().filter_map(|&s| MemberInfo::of_symbol(&project, s)).collect();
    let visited: Vec<&str> = set.visited_interfaces().iter().map(|&t| project.type_info(t).name.as_str()).collect();

    match args.target.format {
        OutputFormat::Json => {
            let value = json!({
                "target": MemberInfo::of(&project, decl),
                "equivalence": members,
                "visited_interfaces": visited,
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for m in &members {
                let _ = writeln!(
                    out,
                    "{} {}.{}{} [{}] {}:{}",
                    m.type_kind,
                    m.type_name,
                    m.member,
                    if m.is_static { " static" } else { "" },
                    m.kind,
                    m.path,
                    m.line
                );
            }
            if !visited.is_empty() {
                let _ = writeln!(out, "interfaces visited: {}", visited.join(", "));
            }
            Ok(out)
        }
    }
}

// ─── tearoff ────────────────────────────────────────────────────────

fn render_risks_text(labels: &[RiskLabel]) -> String {
    let mut out = String::new();
    for label in labels {
        let _ = writeln!(
            out,
            "{}:{}:{}: [{}] {} ({}{}): {}",
            label.path,
            label.line,
            label.column,
            label.kind,
            label.binding,
            label.usage.as_str(),
            if label.bound { ", bound" } else { "" },
            label.text.trim()
        );
    }
    out
}

pub(crate) fn tearoff_output(args: &TearoffArgs) -> Result<String, AnalysisError> {
    let only = args.only.map(RiskKind::from);
    let project = load(&args.target, Default::default())?;
    let decl = resolve(&project, &args.target.query())?;
    let set = build_equivalence_set(&project, decl);
    let implicit = uses_implicit_receiver(&project, decl);

    let labels: Vec<RiskLabel> = assess_tearoff_risk(&project, decl, &set)
        .into_iter()
        .filter(|l| only.is_none_or(|kind| l.kind == kind))
        .collect();

    eprintln!(
        "[tearoff] {} label(s); method {} its receiver",
        labels.len(),
        if implicit { "reads" } else { "does not read" }
    );

    match args.target.format {
        OutputFormat::Json => {
            let value = json!({
                "target": MemberInfo::of(&project, decl),
                "uses_implicit_receiver": implicit,
                "labels": labels,
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
        }
        OutputFormat::Text => Ok(render_risks_text(&labels)),
    }
}
