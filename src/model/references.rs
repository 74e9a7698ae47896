//! Reference finding and call-signature resolution for `TsProject`.

use tracing::trace;
use tree_sitter::Node;

use super::checker::{bind_receiver, named_children, pattern_element, resolve_binding, skip_wrappers, MemberTarget, Ty};
use super::project::TsProject;
use super::types::*;

/// Nodes that bound the region where a local alias can be used.
fn is_alias_scope(kind: &str) -> bool {
    matches!(
        kind,
        "statement_block"
            | "program"
            | "for_statement"
            | "for_in_statement"
            | "arrow_function"
            | "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition"
    )
}

impl TsProject {
    pub(crate) fn collect_references(&self, decl: DeclId) -> Vec<Reference<'_>> {
        let target = self.decl_symbol[decl.index()];
        let name = self.decls[decl.index()].name.as_str();
        let mut refs = Vec::new();

        for unit in &self.units {
            if !unit.source.contains(name) {
                continue;
            }
            let before = refs.len();
            let mut stack = vec![unit.root()];
            while let Some(node) = stack.pop() {
                match node.kind() {
                    "property_identifier" | "private_property_identifier" if unit.text(node) == name => {
                        self.member_reference(unit, node, target, &mut refs);
                    }
                    "object_pattern" => self.destructured_reference(unit, node, name, target, &mut refs),
                    _ => {}
                }
                for i in (0..node.child_count()).rev() {
                    if let Some(child) = node.child(i) {
                        stack.push(child);
                    }
                }
            }
            if refs.len() > before {
                trace!(path = %unit.path, name, count = refs.len() - before, "References in unit");
            }
        }

        refs.sort_by_key(|r| (r.unit, r.node.start_byte(), r.node.end_byte()));
        refs.dedup_by_key(|r| (r.unit, r.node.id()));
        refs
    }

    /// `recv.name`: a reference when the access resolves to `target`, or, with
    /// lenient receivers, when the receiver type is unknown.
    fn member_reference<'a>(&'a self, unit: &'a SourceUnit, property: Node<'a>, target: SymbolId, refs: &mut Vec<Reference<'a>>) {
        let Some(access) = property.parent() else { return };
        if access.kind() != "member_expression"
            || access.child_by_field_name("property").map(|p| p.id()) != Some(property.id())
        {
            return;
        }
        let resolved = match self.member_target(unit, access, 0) {
            MemberTarget::Resolved(symbol) if symbol == target => true,
            MemberTarget::Unknown if self.options.lenient_receivers => false,
            _ => return,
        };
        refs.push(Reference { unit: unit.id, node: property, resolved, alias: None });

        if let Some(alias) = alias_binding(unit, access) {
            self.push_alias_uses(unit, alias, resolved, refs);
        }
    }

    /// `const { name } = holder` / `const { name: local } = holder`.
    fn destructured_reference<'a>(
        &'a self,
        unit: &'a SourceUnit,
        pattern: Node<'a>,
        name: &str,
        target: SymbolId,
        refs: &mut Vec<Reference<'a>>,
    ) {
        let Some(declarator) = pattern.parent() else { return };
        if declarator.kind() != "variable_declarator"
            || declarator.child_by_field_name("name").map(|n| n.id()) != Some(pattern.id())
        {
            return;
        }
        let Some(holder) = declarator.child_by_field_name("value") else { return };

        for element in named_children(pattern) {
            let Some((key, local)) = pattern_element(element) else { continue };
            if unit.text(key) != name {
                continue;
            }
            let found = match self.infer_expr(unit, holder, 0) {
                Ty::Instance(ty) => self.lookup_member(ty, name, false),
                Ty::Static(ty) => self.lookup_member(ty, name, true),
                Ty::Unknown if self.options.lenient_receivers => {
                    refs.push(Reference { unit: unit.id, node: key, resolved: false, alias: None });
                    self.push_alias_uses(unit, AliasBinding { name: local, bound: false }, false, refs);
                    continue;
                }
                _ => None,
            };
            if found == Some(target) {
                refs.push(Reference { unit: unit.id, node: key, resolved: true, alias: None });
                self.push_alias_uses(unit, AliasBinding { name: local, bound: false }, true, refs);
            }
        }
    }

    /// Every identifier in the alias's scope that binds back to it.
    fn push_alias_uses<'a>(&'a self, unit: &'a SourceUnit, alias: AliasBinding<'a>, resolved: bool, refs: &mut Vec<Reference<'a>>) {
        let mut scope = alias.name.parent();
        while let Some(n) = scope {
            if is_alias_scope(n.kind()) {
                break;
            }
            scope = n.parent();
        }
        let Some(scope) = scope else { return };
        let alias_name = unit.text(alias.name);

        let mut stack = vec![scope];
        while let Some(node) = stack.pop() {
            if node.kind() == "identifier" && node.id() != alias.name.id() && unit.text(node) == alias_name {
                if resolve_binding(unit, node).is_some_and(|b| b.name.id() == alias.name.id()) {
                    refs.push(Reference { unit: unit.id, node, resolved, alias: Some(alias) });
                }
            }
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
    }

    /// Typed resolution of an invocation's callee. No lenient fallback.
    pub(crate) fn resolve_invocation(&self, unit: &SourceUnit, call: Node<'_>) -> Option<DeclId> {
        if call.kind() != "call_expression" {
            return None;
        }
        let callee = skip_wrappers(call.child_by_field_name("function")?);
        let symbol = self
            .resolve_function_value(unit, callee, 0)
            .or_else(|| self.applied_function(unit, callee, 0))?;
        let decls = &self.symbols[symbol.index()].decls;
        decls
            .iter()
            .copied()
            .find(|d| self.decls[d.index()].kind == DeclKind::Concrete)
            .or_else(|| decls.first().copied())
    }
}

/// Local binding initialized by the property read `access`, looking through
/// parentheses and a `.bind(…)` wrapper.
fn alias_binding<'a>(unit: &SourceUnit, access: Node<'a>) -> Option<AliasBinding<'a>> {
    let mut value = access;
    let mut parent = climb_wrappers(&mut value)?;
    let mut bound = false;

    if parent.kind() == "member_expression" && bind_receiver(unit, parent).map(|o| o.id()) == Some(value.id()) {
        let call = parent.parent()?;
        if call.kind() != "call_expression" || call.child_by_field_name("function").map(|f| f.id()) != Some(parent.id()) {
            return None;
        }
        bound = true;
        value = call;
        parent = climb_wrappers(&mut value)?;
    }

    let name = match parent.kind() {
        "variable_declarator" => parent.child_by_field_name("name")?,
        "required_parameter" | "optional_parameter" => parent.child_by_field_name("pattern")?,
        _ => return None,
    };
    let is_initializer = parent.child_by_field_name("value").map(|v| v.id()) == Some(value.id());
    (is_initializer && name.kind() == "identifier").then_some(AliasBinding { name, bound })
}

/// Move `value` up through `( … )`, `x!` and `x as T`; returns the first other parent.
fn climb_wrappers<'a>(value: &mut Node<'a>) -> Option<Node<'a>> {
    let mut parent = value.parent()?;
    while matches!(parent.kind(), "parenthesized_expression" | "non_null_expression" | "as_expression" | "satisfies_expression") {
        *value = parent;
        parent = parent.parent()?;
    }
    Some(parent)
}
