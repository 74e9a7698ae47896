//! Strict verifier: re-resolves each invocation by static typing and keeps only
//! call sites that land on a declaration of the equivalence set.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace};

use crate::model::{DeclId, SourceModel};

use super::CallSite;

#[derive(Debug, Clone)]
pub struct VerifyOutcome<'a> {
    pub kept: Vec<CallSite<'a>>,
    /// Sites whose invocation resolved elsewhere or not at all.
    pub discarded: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationSummary {
    pub kept: usize,
    pub discarded: usize,
}

impl VerifyOutcome<'_> {
    pub fn summary(&self) -> VerificationSummary {
        VerificationSummary { kept: self.kept.len(), discarded: self.discarded }
    }
}

/// Filter `call_sites` to those whose invocation resolves into `decls`.
pub fn verify<'a, M: SourceModel + ?Sized>(
    model: &M,
    call_sites: Vec<CallSite<'a>>,
    decls: &HashSet<DeclId>,
) -> Vec<CallSite<'a>> {
    verify_with_outcome(model, call_sites, decls).kept
}

pub fn verify_with_outcome<'a, M: SourceModel + ?Sized>(
    model: &M,
    call_sites: Vec<CallSite<'a>>,
    decls: &HashSet<DeclId>,
) -> VerifyOutcome<'a> {
    let total = call_sites.len();
    let kept: Vec<CallSite<'a>> = call_sites
        .into_iter()
        .filter(|site| match model.resolve_call_signature(site.unit, site.invocation) {
            Some(decl) if decls.contains(&decl) => true,
            resolved => {
                trace!(
                    path = site.path,
                    line = site.line,
                    resolved = ?resolved,
                    "Discarding call site that does not resolve into the equivalence set"
                );
                false
            }
        })
        .collect();
    let discarded = total - kept.len();
    debug!(kept = kept.len(), discarded, "Verified call sites");
    VerifyOutcome { kept, discarded }
}
