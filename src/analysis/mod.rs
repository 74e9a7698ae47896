//! Call-site discovery over a [`SourceModel`]: resolve the target method, build
//! its equivalence set, classify references, then optionally verify and assess
//! tear-off risk.

mod classifier;
mod equivalence;
mod resolver;
mod tearoff;
mod verifier;

pub use classifier::{classify, Attribution, CallLabel, CallSite, ClassifyOptions, InvocationPattern};
pub use equivalence::{build_equivalence_set, equivalence_declarations, EquivalenceSet};
pub use resolver::{resolve, IMPL_DIR_MARKER};
pub use tearoff::{assess_tearoff_risk, uses_implicit_receiver, RiskKind, RiskLabel, TearoffUsage};
pub use verifier::{verify, verify_with_outcome, VerificationSummary, VerifyOutcome};

use serde::Serialize;
use tracing::info;

use crate::error::AnalysisError;
use crate::model::{DeclId, SourceModel, SymbolId};

/// Which method to analyze.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub class_name: String,
    pub method_name: String,
    /// Preferred when several types share `class_name`: substring of the unit path.
    pub file_hint: Option<String>,
}

impl Query {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), method_name: method_name.into(), file_hint: None }
    }

    pub fn with_file_hint(mut self, hint: impl Into<String>) -> Self {
        self.file_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    pub classify: ClassifyOptions,
    /// Run the strict verifier over the classified call sites.
    pub strict: bool,
    /// Run the tear-off risk reasoner.
    pub tearoff: bool,
}

/// Where a declaration lives, for presentation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_kind: &'static str,
    pub member: String,
    pub kind: &'static str,
    pub is_static: bool,
    pub path: String,
    pub line: u32,
    pub signature: String,
}

impl MemberInfo {
    pub fn of<M: SourceModel + ?Sized>(model: &M, decl: DeclId) -> Self {
        let d = model.declaration(decl);
        let ty = model.type_info(d.owner);
        Self {
            type_name: ty.name.clone(),
            type_kind: ty.kind.as_str(),
            member: d.name.clone(),
            kind: d.kind.as_str(),
            is_static: d.is_static,
            path: model.unit(d.location.unit).path.clone(),
            line: d.location.line,
            signature: d.signature.clone(),
        }
    }

    /// Describe a symbol by its first declaration.
    pub fn of_symbol<M: SourceModel + ?Sized>(model: &M, symbol: SymbolId) -> Option<Self> {
        model.symbol_declarations(symbol).first().map(|&d| Self::of(model, d))
    }
}

#[derive(Serialize, Debug)]
pub struct AnalysisReport<'a> {
    pub target: MemberInfo,
    pub equivalence: Vec<MemberInfo>,
    pub call_sites: Vec<CallSite<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tearoff_risks: Vec<RiskLabel>,
}

/// Run the whole pipeline for one query.
pub fn analyze<'a, M: SourceModel + ?Sized>(
    model: &'a M,
    query: &Query,
    options: &AnalysisOptions,
) -> Result<AnalysisReport<'a>, AnalysisError> {
    let decl = resolve(model, query)?;
    let set = build_equivalence_set(model, decl);
    let mut call_sites = classify(model, &set, &options.classify);

    let verification = if options.strict {
        let outcome = verify_with_outcome(model, call_sites, &equivalence_declarations(model, &set));
        let summary = outcome.summary();
        call_sites = outcome.kept;
        Some(summary)
    } else {
        None
    };

    let tearoff_risks = if options.tearoff {
        assess_tearoff_risk(model, decl, &set)
    } else {
        Vec::new()
    };

    info!(
        class = %query.class_name,
        method = %query.method_name,
        equivalence = set.len(),
        call_sites = call_sites.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        target: MemberInfo::of(model, decl),
        equivalence: set.symbols().iter().filter_map(|&s| MemberInfo::of_symbol(model, s)).collect(),
        call_sites,
        verification,
        tearoff_risks,
    })
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
