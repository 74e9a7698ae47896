//! Tear-off risk reasoner: flags places where the method is extracted from its
//! receiver and later called without one.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;
use tree_sitter::Node;

use crate::model::{DeclId, Reference, SourceModel, SourceUnit, UnitId};

use super::classifier::{access_of, invoking_call, unwrapped_parent};
use super::EquivalenceSet;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RiskKind {
    TearoffSafe,
    TearoffUnsafe,
    BareCallback,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TearoffSafe => "tearoff-safe",
            Self::TearoffUnsafe => "tearoff-unsafe",
            Self::BareCallback => "bare-callback",
        }
    }
}

impl std::fmt::Display for RiskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the extracted function value is used at the labelled site.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TearoffUsage {
    /// `fn(…)`
    Invoked,
    /// `other(fn)`
    Argument,
    /// `other(obj.m)` without an intermediate binding
    InlineArgument,
}

impl TearoffUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoked => "invoked",
            Self::Argument => "argument",
            Self::InlineArgument => "inline-argument",
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RiskLabel {
    pub path: String,
    pub line: u32,
    pub column: u32,
    /// Alias name, or the extracted expression for inline arguments.
    pub binding: String,
    pub kind: RiskKind,
    pub usage: TearoffUsage,
    pub bound: bool,
    pub text: String,
    #[serde(skip)]
    pub unit: UnitId,
    #[serde(skip)]
    pub offset: usize,
}

/// Nested constructs that rebind the receiver; a scan for `this` stops at them.
fn rebinds_receiver(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration"
            | "class"
            | "class_declaration"
            | "abstract_class_declaration"
            | "method_definition"
    )
}

fn scan_for_receiver(body: Node) -> bool {
    let mut stack: Vec<Node> = (0..body.child_count()).filter_map(|i| body.child(i)).collect();
    while let Some(node) = stack.pop() {
        match node.kind() {
            "this" | "super" => return true,
            kind if rebinds_receiver(kind) => continue,
            _ => {}
        }
        stack.extend((0..node.child_count()).filter_map(|i| node.child(i)));
    }
    false
}

/// Whether the body of `decl` reads `this` or `super`. Computed once per declaration.
///
/// Arrow-function fields capture the receiver when the instance is built, so
/// extracting them is always safe.
pub fn uses_implicit_receiver<M: SourceModel + ?Sized>(model: &M, decl: DeclId) -> bool {
    let declaration = model.declaration(decl);
    declaration.implicit_receiver_or_init(|| {
        if declaration.lexical_receiver {
            return false;
        }
        let Some(span) = declaration.body else { return false };
        model
            .unit(declaration.location.unit)
            .node_at(span)
            .is_some_and(scan_for_receiver)
    })
}

fn label(bound: bool, implicit: bool, usage: TearoffUsage) -> RiskKind {
    match usage {
        TearoffUsage::Invoked if bound || !implicit => RiskKind::TearoffSafe,
        TearoffUsage::Invoked => RiskKind::TearoffUnsafe,
        _ if !bound && implicit => RiskKind::BareCallback,
        _ => RiskKind::TearoffSafe,
    }
}

/// `expr` passed directly in an argument list.
fn is_call_argument(expr: Node) -> bool {
    unwrapped_parent(expr).is_some_and(|(_, parent)| {
        parent.kind() == "arguments" && parent.parent().is_some_and(|p| p.kind() == "call_expression")
    })
}

/// `obj.m` or `obj.m.bind(x)` passed as an argument: `(extracted expression, bound)`.
fn inline_argument<'a>(unit: &SourceUnit, access: Node<'a>) -> Option<(Node<'a>, bool)> {
    if is_call_argument(access) {
        return Some((access, false));
    }
    let (wrapped, outer) = unwrapped_parent(access)?;
    let is_bind = outer.kind() == "member_expression"
        && outer.child_by_field_name("object").map(|o| o.id()) == Some(wrapped.id())
        && outer.child_by_field_name("property").is_some_and(|p| unit.text(p) == "bind");
    if !is_bind {
        return None;
    }
    let bind_call = invoking_call(outer)?;
    is_call_argument(bind_call).then_some((bind_call, true))
}

fn risk_for<M: SourceModel + ?Sized>(model: &M, reference: &Reference, implicit: bool) -> Option<RiskLabel> {
    let unit = model.unit(reference.unit);
    let (site, binding, bound, usage) = match reference.alias {
        Some(alias) => {
            let usage = if invoking_call(reference.node).is_some() {
                TearoffUsage::Invoked
            } else if is_call_argument(reference.node) {
                TearoffUsage::Argument
            } else {
                return None;
            };
            (reference.node, unit.text(alias.name).to_string(), alias.bound, usage)
        }
        None => {
            let access = access_of(reference.node)?;
            let (extracted, bound) = inline_argument(unit, access)?;
            (extracted, unit.text(access).to_string(), bound, TearoffUsage::InlineArgument)
        }
    };

    let pos = site.start_position();
    let line = pos.row as u32 + 1;
    Some(RiskLabel {
        path: unit.path.clone(),
        line,
        column: pos.column as u32 + 1,
        binding,
        kind: label(bound, implicit, usage),
        usage,
        bound,
        text: unit.line_text(line).to_string(),
        unit: reference.unit,
        offset: site.start_byte(),
    })
}

/// Label every use of a tear-off of `decl`'s method reached through `set`.
pub fn assess_tearoff_risk<M: SourceModel + ?Sized>(model: &M, decl: DeclId, set: &EquivalenceSet) -> Vec<RiskLabel> {
    let implicit = uses_implicit_receiver(model, decl);
    let mut seen: HashSet<(UnitId, usize)> = HashSet::new();
    let mut labels = Vec::new();

    for &symbol in set.symbols() {
        for &d in model.symbol_declarations(symbol) {
            if !model.is_reference_findable(d) {
                continue;
            }
            for reference in model.find_references(d) {
                let Some(label) = risk_for(model, &reference, implicit) else { continue };
                if seen.insert((label.unit, label.offset)) {
                    labels.push(label);
                }
            }
        }
    }

    labels.sort_by(|a, b| a.path.cmp(&b.path).then(a.offset.cmp(&b.offset)));
    debug!(
        method = %model.declaration(decl).name,
        implicit_receiver = implicit,
        labels = labels.len(),
        "Assessed tear-off risk"
    );
    labels
}
