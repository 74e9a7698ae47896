//! Reference classifier: turns references to equivalence-set members into
//! labelled call sites.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;
use tree_sitter::Node;

use crate::model::{Reference, SourceModel, SourceUnit, SymbolId, UnitId};

use super::EquivalenceSet;

/// How an invocation reaches the method. Exactly one per call site.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CallLabel {
    Direct,
    Optional,
    Tearoff,
    Super,
}

impl CallLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Optional => "optional",
            Self::Tearoff => "tearoff",
            Self::Super => "super",
        }
    }
}

impl std::fmt::Display for CallLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural shape of an invocation around a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPattern {
    /// `recv.m(…)`, `recv?.m(…)`, `recv.m?.(…)`
    NameCallee,
    /// `fn(…)` through a local alias
    DirectIdentifier,
    /// `recv.m.call(…)`, `recv.m.apply(…)`, `fn.call(…)`
    TearoffApplication,
}

/// Which equivalence-set members a call site may be reached through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attribution {
    /// Every member of the set: calls through a supertype count for every implementer.
    #[default]
    Polymorphic,
    /// Only typed references to the origin symbol itself.
    ExactReceiver,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    /// Drop `super.m()` call sites.
    pub skip_super: bool,
    pub attribution: Attribution,
}

/// One reference that participates in an invocation.
#[derive(Serialize, Debug, Clone)]
pub struct CallSite<'a> {
    pub path: &'a str,
    /// 1-based
    pub line: u32,
    /// 1-based
    pub column: u32,
    pub label: CallLabel,
    /// Enclosing `Type.method` or function name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    pub text: &'a str,
    pub receiver_resolved: bool,
    #[serde(skip)]
    pub unit: UnitId,
    /// Start byte of the invocation expression.
    #[serde(skip)]
    pub offset: usize,
    #[serde(skip)]
    pub invocation: Node<'a>,
    #[serde(skip)]
    pub symbol: SymbolId,
}

/// Call expression whose callee is `expr`, looking through parentheses and `!`.
pub(crate) fn invoking_call(expr: Node) -> Option<Node> {
    let mut current = expr;
    let mut parent = current.parent()?;
    while matches!(parent.kind(), "parenthesized_expression" | "non_null_expression") {
        current = parent;
        parent = parent.parent()?;
    }
    let is_callee = parent.kind() == "call_expression"
        && parent.child_by_field_name("function").map(|f| f.id()) == Some(current.id());
    is_callee.then_some(parent)
}

/// Parent of `expr` once wrapper expressions are skipped, with the outermost wrapper.
pub(crate) fn unwrapped_parent(expr: Node) -> Option<(Node, Node)> {
    let mut current = expr;
    let mut parent = current.parent()?;
    while matches!(parent.kind(), "parenthesized_expression" | "non_null_expression") {
        current = parent;
        parent = parent.parent()?;
    }
    Some((current, parent))
}

/// The member access a reference node names, if it is a property name.
pub(crate) fn access_of(node: Node) -> Option<Node> {
    if !matches!(node.kind(), "property_identifier" | "private_property_identifier") {
        return None;
    }
    node.parent().filter(|p| p.kind() == "member_expression")
}

#[derive(Debug, Clone, Copy)]
struct Invocation<'a> {
    pattern: InvocationPattern,
    call: Node<'a>,
    /// `recv.m` for member patterns, the identifier for alias patterns.
    access: Node<'a>,
}

/// Try the three invocation shapes in order.
fn match_invocation<'a>(unit: &SourceUnit, node: Node<'a>) -> Option<Invocation<'a>> {
    let access = access_of(node);
    if let Some(access) = access {
        if let Some(call) = invoking_call(access) {
            return Some(Invocation { pattern: InvocationPattern::NameCallee, call, access });
        }
    }
    if node.kind() == "identifier" {
        if let Some(call) = invoking_call(node) {
            return Some(Invocation { pattern: InvocationPattern::DirectIdentifier, call, access: node });
        }
    }

    let applied = match access {
        Some(access) => access,
        None if node.kind() == "identifier" => node,
        None => return None,
    };
    let (wrapped, outer) = unwrapped_parent(applied)?;
    if outer.kind() != "member_expression"
        || outer.child_by_field_name("object").map(|o| o.id()) != Some(wrapped.id())
    {
        return None;
    }
    let property = outer.child_by_field_name("property")?;
    if !matches!(unit.text(property), "call" | "apply") {
        return None;
    }
    let call = invoking_call(outer)?;
    Some(Invocation { pattern: InvocationPattern::TearoffApplication, call, access: applied })
}

/// `a?.m` carries an `optional_chain` child; `a.m?.()` carries a bare `?.` token on the call.
fn has_optional_chain(node: Node) -> bool {
    (0..node.child_count()).any(|i| node.child(i).is_some_and(|c| matches!(c.kind(), "optional_chain" | "?.")))
}

fn label_for(invocation: &Invocation) -> CallLabel {
    let receiver_is_super = invocation.access.kind() == "member_expression"
        && invocation.access.child_by_field_name("object").is_some_and(|o| o.kind() == "super");
    if receiver_is_super {
        return CallLabel::Super;
    }
    match invocation.pattern {
        InvocationPattern::TearoffApplication => CallLabel::Tearoff,
        InvocationPattern::NameCallee
            if has_optional_chain(invocation.access) || has_optional_chain(invocation.call) =>
        {
            CallLabel::Optional
        }
        _ => CallLabel::Direct,
    }
}

/// Name of the method or function whose body contains `node`.
pub(crate) fn enclosing_caller(unit: &SourceUnit, node: Node) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "method_definition" | "public_field_definition" => {
                let name = unit.text(n.child_by_field_name("name")?);
                let owner = n
                    .parent()
                    .and_then(|body| body.parent())
                    .and_then(|class| class.child_by_field_name("name"))
                    .map(|class_name| unit.text(class_name));
                return Some(match owner {
                    Some(owner) => format!("{owner}.{name}"),
                    None => name.to_string(),
                });
            }
            "function_declaration" | "generator_function_declaration" => {
                return n.child_by_field_name("name").map(|name| unit.text(name).to_string());
            }
            _ => {}
        }
        current = n.parent();
    }
    None
}

fn call_site<'a, M: SourceModel + ?Sized>(
    model: &'a M,
    reference: &Reference<'a>,
    invocation: &Invocation<'a>,
    symbol: SymbolId,
) -> CallSite<'a> {
    let unit = model.unit(reference.unit);
    let pos = reference.node.start_position();
    let line = pos.row as u32 + 1;
    CallSite {
        path: unit.path.as_str(),
        line,
        column: pos.column as u32 + 1,
        label: label_for(invocation),
        caller: enclosing_caller(unit, invocation.call),
        text: unit.line_text(line),
        receiver_resolved: reference.resolved,
        unit: reference.unit,
        offset: invocation.call.start_byte(),
        invocation: invocation.call,
        symbol,
    }
}

/// Classify every reference to every member of `set`.
///
/// Call sites are unique per invocation span and sorted by path then offset.
/// Chained calls share a start offset; the inner (shorter) one sorts first.
pub fn classify<'a, M: SourceModel + ?Sized>(
    model: &'a M,
    set: &EquivalenceSet,
    options: &ClassifyOptions,
) -> Vec<CallSite<'a>> {
    let mut seen: HashSet<(UnitId, usize, usize)> = HashSet::new();
    let mut sites = Vec::new();
    let mut non_calls = 0usize;

    for &symbol in set.symbols() {
        if options.attribution == Attribution::ExactReceiver && symbol != set.origin() {
            continue;
        }
        for &decl in model.symbol_declarations(symbol) {
            if !model.is_reference_findable(decl) {
                let d = model.declaration(decl);
                debug!(
                    owner = model.enclosing_type_name(decl),
                    member = %d.name,
                    line = d.location.line,
                    "Skipping declaration that is not reference-findable"
                );
                continue;
            }
            for reference in model.find_references(decl) {
                if options.attribution == Attribution::ExactReceiver && !reference.resolved {
                    continue;
                }
                let unit = model.unit(reference.unit);
                let Some(invocation) = match_invocation(unit, reference.node) else {
                    non_calls += 1;
                    continue;
                };
                if !seen.insert((reference.unit, invocation.call.start_byte(), invocation.call.end_byte())) {
                    continue;
                }
                let site = call_site(model, &reference, &invocation, symbol);
                if options.skip_super && site.label == CallLabel::Super {
                    continue;
                }
                sites.push(site);
            }
        }
    }

    sites.sort_by(|a, b| {
        a.path
            .cmp(b.path)
            .then(a.offset.cmp(&b.offset))
            .then(a.invocation.end_byte().cmp(&b.invocation.end_byte()))
    });
    debug!(call_sites = sites.len(), non_calls, symbols = set.len(), "Classified references");
    sites
}
