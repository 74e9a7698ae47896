//! Expression typing over the syntax tree.
//!
//! Enough of a checker to answer "which project type is this receiver?" for
//! member accesses: lexical bindings, annotations, generic constraints,
//! constructor calls, field types and method return types. Anything it cannot
//! type is `Ty::Unknown`; anything typed as a non-project value (builtins,
//! literals, functions) is `Ty::Opaque` and never matches a project member.

use tree_sitter::Node;

use super::parser_typescript::{find_child_by_kind, has_child_kind};
use super::project::TsProject;
use super::types::*;

/// Global objects and builtin types whose members are never project members.
pub(crate) const BUILTIN_RECEIVER_TYPES: &[&str] = &[
    // Core
    "Promise", "Array", "Map", "Set", "Object", "String", "Number", "Boolean",
    "Date", "RegExp", "Error", "Symbol", "BigInt", "Function",
    // Static namespaces
    "Math", "JSON", "Reflect", "Proxy", "Intl",
    // Typed arrays
    "Int8Array", "Uint8Array", "Uint8ClampedArray", "Int16Array", "Uint16Array",
    "Int32Array", "Uint32Array", "Float32Array", "Float64Array",
    "BigInt64Array", "BigUint64Array",
    // Buffers
    "ArrayBuffer", "SharedArrayBuffer", "DataView",
    // Collections
    "WeakMap", "WeakSet", "WeakRef", "FinalizationRegistry",
    "ReadonlyArray", "ReadonlyMap", "ReadonlySet", "Record", "Partial", "Readonly",
    // Browser / Node globals
    "console", "window", "document", "globalThis", "navigator", "localStorage",
    "sessionStorage", "setTimeout", "setInterval", "fetch", "process",
    // Iterators / Generators
    "Iterator", "Generator", "AsyncGenerator", "AsyncIterator", "Iterable", "PromiseLike",
    // Errors
    "TypeError", "RangeError", "ReferenceError", "SyntaxError", "URIError", "EvalError",
];

const MAX_INFER_DEPTH: u32 = 12;

pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTIN_RECEIVER_TYPES.contains(&name)
}

/// Static type of an expression, as far as the checker can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ty {
    /// Instance of a project class or interface.
    Instance(TypeId),
    /// The class object itself (`Foo.create()`).
    Static(TypeId),
    /// Known, but not a project type.
    Opaque,
    Unknown,
}

/// What a member access `recv.name` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberTarget {
    Resolved(SymbolId),
    /// Receiver type unknown.
    Unknown,
    /// Receiver typed, but it has no such project member.
    Missing,
}

/// A local name and the construct that introduced it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<'a> {
    pub name: Node<'a>,
    pub kind: BindingKind<'a>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum BindingKind<'a> {
    /// `const name: T = value`
    Variable { declarator: Node<'a> },
    /// `const { key: name } = holder`
    Destructured { holder: Node<'a>, key: Node<'a> },
    /// `required_parameter` / `optional_parameter`, or a bare arrow parameter.
    Parameter { param: Node<'a> },
    /// `for (const name of source)`
    Iterated { source: Node<'a> },
    Function { decl: Node<'a> },
    Other,
}

pub(crate) fn named_children<'a>(node: Node<'a>) -> impl Iterator<Item = Node<'a>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

/// Strip `( … )`, `x!` and `x satisfies T` wrappers.
pub(crate) fn skip_wrappers(mut node: Node) -> Node {
    while matches!(node.kind(), "parenthesized_expression" | "non_null_expression" | "satisfies_expression") {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration"
            | "arrow_function"
            | "method_definition"
    )
}

// ─── Lexical bindings ────────────────────────────────────────────────

/// Find the binding an identifier refers to by walking enclosing scopes.
pub(crate) fn resolve_binding<'a>(unit: &SourceUnit, ident: Node<'a>) -> Option<Binding<'a>> {
    let name = unit.text(ident);
    let mut current = ident.parent();
    while let Some(scope) = current {
        if let Some(binding) = binding_in_scope(unit, scope, name) {
            return Some(binding);
        }
        current = scope.parent();
    }
    None
}

fn binding_in_scope<'a>(unit: &SourceUnit, scope: Node<'a>, name: &str) -> Option<Binding<'a>> {
    match scope.kind() {
        "program" | "statement_block" | "switch_case" | "switch_default" | "class_static_block" => {
            named_children(scope).find_map(|stmt| statement_binding(unit, stmt, name))
        }
        "for_statement" => scope
            .child_by_field_name("initializer")
            .and_then(|init| declaration_binding(unit, init, name)),
        "for_in_statement" => {
            let left = scope.child_by_field_name("left")?;
            if left.kind() == "identifier" && unit.text(left) == name && has_child_kind(scope, "of") {
                let source = scope.child_by_field_name("right")?;
                return Some(Binding { name: left, kind: BindingKind::Iterated { source } });
            }
            None
        }
        "catch_clause" => {
            let param = scope.child_by_field_name("parameter")?;
            (param.kind() == "identifier" && unit.text(param) == name)
                .then_some(Binding { name: param, kind: BindingKind::Other })
        }
        kind if is_function_like(kind) => parameter_binding(unit, scope, name),
        _ => None,
    }
}

fn statement_binding<'a>(unit: &SourceUnit, stmt: Node<'a>, name: &str) -> Option<Binding<'a>> {
    match stmt.kind() {
        "lexical_declaration" | "variable_declaration" => declaration_binding(unit, stmt, name),
        "export_statement" => stmt
            .child_by_field_name("declaration")
            .and_then(|decl| statement_binding(unit, decl, name)),
        "function_declaration" | "generator_function_declaration" => {
            let name_node = stmt.child_by_field_name("name")?;
            (unit.text(name_node) == name)
                .then_some(Binding { name: name_node, kind: BindingKind::Function { decl: stmt } })
        }
        _ => None,
    }
}

fn declaration_binding<'a>(unit: &SourceUnit, decl: Node<'a>, name: &str) -> Option<Binding<'a>> {
    if !matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
        return None;
    }
    for declarator in named_children(decl) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(pattern) = declarator.child_by_field_name("name") else { continue };
        match pattern.kind() {
            "identifier" if unit.text(pattern) == name => {
                return Some(Binding { name: pattern, kind: BindingKind::Variable { declarator } });
            }
            "object_pattern" => {
                if let Some(binding) = pattern_binding(unit, pattern, declarator, name) {
                    return Some(binding);
                }
            }
            _ => {}
        }
    }
    None
}

/// Binding introduced by one element of `const { … } = holder`.
fn pattern_binding<'a>(unit: &SourceUnit, pattern: Node<'a>, declarator: Node<'a>, name: &str) -> Option<Binding<'a>> {
    for element in named_children(pattern) {
        let Some((key, name_node)) = pattern_element(element) else { continue };
        if unit.text(name_node) != name {
            continue;
        }
        let kind = match declarator.child_by_field_name("value") {
            Some(holder) => BindingKind::Destructured { holder, key },
            None => BindingKind::Other,
        };
        return Some(Binding { name: name_node, kind });
    }
    None
}

/// `(key, bound name)` of an object-pattern element.
pub(crate) fn pattern_element(element: Node) -> Option<(Node, Node)> {
    match element.kind() {
        "shorthand_property_identifier_pattern" => Some((element, element)),
        "pair_pattern" => {
            let key = element.child_by_field_name("key")?;
            let value = element.child_by_field_name("value")?;
            (key.kind() == "property_identifier" && value.kind() == "identifier").then_some((key, value))
        }
        "object_assignment_pattern" => {
            let left = element.child_by_field_name("left")?;
            (left.kind() == "shorthand_property_identifier_pattern").then_some((left, left))
        }
        _ => None,
    }
}

fn parameter_binding<'a>(unit: &SourceUnit, function: Node<'a>, name: &str) -> Option<Binding<'a>> {
    if let Some(param) = function.child_by_field_name("parameter") {
        if param.kind() == "identifier" && unit.text(param) == name {
            return Some(Binding { name: param, kind: BindingKind::Parameter { param } });
        }
    }
    let params = function.child_by_field_name("parameters")?;
    named_children(params)
        .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
        .find_map(|param| {
            let pattern = param.child_by_field_name("pattern")?;
            (pattern.kind() == "identifier" && unit.text(pattern) == name)
                .then_some(Binding { name: pattern, kind: BindingKind::Parameter { param } })
        })
}

// ─── Typing ──────────────────────────────────────────────────────────

impl TsProject {
    /// Type of a value expression.
    pub(crate) fn infer_expr(&self, unit: &SourceUnit, node: Node, depth: u32) -> Ty {
        if depth > MAX_INFER_DEPTH {
            return Ty::Unknown;
        }
        match node.kind() {
            "this" => match self.enclosing_class(unit, node) {
                Some((ty, true)) => Ty::Static(ty),
                Some((ty, false)) => Ty::Instance(ty),
                None => Ty::Unknown,
            },
            "super" => match self.enclosing_class(unit, node) {
                Some((ty, is_static)) => match self.types[ty.index()].extends.first() {
                    Some(&base) if is_static => Ty::Static(base),
                    Some(&base) => Ty::Instance(base),
                    None => Ty::Opaque,
                },
                None => Ty::Unknown,
            },
            "identifier" => self.identifier_type(unit, node, depth),
            "new_expression" => match node.child_by_field_name("constructor") {
                Some(ctor) => match self.infer_expr(unit, ctor, depth + 1) {
                    Ty::Static(ty) => Ty::Instance(ty),
                    Ty::Unknown => Ty::Unknown,
                    _ => Ty::Opaque,
                },
                None => Ty::Unknown,
            },
            "member_expression" => {
                let (Some(object), Some(property)) =
                    (node.child_by_field_name("object"), node.child_by_field_name("property"))
                else {
                    return Ty::Unknown;
                };
                match self.infer_expr(unit, object, depth + 1) {
                    Ty::Instance(ty) => self.member_value_type(ty, unit.text(property), false, depth),
                    Ty::Static(ty) => self.member_value_type(ty, unit.text(property), true, depth),
                    other => other,
                }
            }
            "call_expression" => self.call_return_type(unit, node, depth),
            "await_expression" => match node.named_child(0) {
                Some(inner) => self.awaited_type(unit, inner, depth + 1),
                None => Ty::Unknown,
            },
            "as_expression" => match node.named_child(1) {
                Some(target) => self.type_from_annotation(unit, target, depth + 1),
                None => node.named_child(0).map_or(Ty::Unknown, |e| self.infer_expr(unit, e, depth + 1)),
            },
            "parenthesized_expression" | "non_null_expression" | "satisfies_expression" => {
                node.named_child(0).map_or(Ty::Unknown, |e| self.infer_expr(unit, e, depth + 1))
            }
            "ternary_expression" => {
                let branches = (node.child_by_field_name("consequence"), node.child_by_field_name("alternative"));
                match branches {
                    (Some(a), Some(b)) => {
                        let ta = self.infer_expr(unit, a, depth + 1);
                        if ta == self.infer_expr(unit, b, depth + 1) { ta } else { Ty::Unknown }
                    }
                    _ => Ty::Unknown,
                }
            }
            "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined"
            | "regex" | "array" | "object" | "arrow_function" | "function_expression" | "function"
            | "class" => Ty::Opaque,
            _ => Ty::Unknown,
        }
    }

    /// Class whose member body contains `node`, and whether that member is static.
    /// `None` when a non-arrow function rebinds the receiver on the way up.
    pub(crate) fn enclosing_class(&self, unit: &SourceUnit, node: Node) -> Option<(TypeId, bool)> {
        let mut current = node.parent();
        while let Some(n) = current {
            match n.kind() {
                "function_declaration" | "function_expression" | "function" | "generator_function"
                | "generator_function_declaration" => return None,
                "method_definition" | "public_field_definition" | "class_static_block" => {
                    let is_static = n.kind() == "class_static_block" || has_child_kind(n, "static");
                    let body = n.parent().filter(|b| b.kind() == "class_body")?;
                    let class = body.parent()?;
                    return self.type_declared_at(unit.id, class).map(|ty| (ty, is_static));
                }
                _ => {}
            }
            current = n.parent();
        }
        None
    }

    fn identifier_type(&self, unit: &SourceUnit, ident: Node, depth: u32) -> Ty {
        let name = unit.text(ident);
        if name == "undefined" {
            return Ty::Opaque;
        }
        if let Some(binding) = resolve_binding(unit, ident) {
            return self.binding_type(unit, binding, depth);
        }
        match self.resolve_type_name(unit.id, name) {
            Some(ty) if self.types[ty.index()].kind == TypeKind::Class => Ty::Static(ty),
            Some(_) => Ty::Unknown,
            None if is_builtin(name) => Ty::Opaque,
            None => Ty::Unknown,
        }
    }

    pub(crate) fn binding_type(&self, unit: &SourceUnit, binding: Binding, depth: u32) -> Ty {
        match binding.kind {
            BindingKind::Variable { declarator: holder } | BindingKind::Parameter { param: holder } => {
                if let Some(annotation) = holder.child_by_field_name("type") {
                    self.type_from_annotation(unit, annotation, depth + 1)
                } else if let Some(value) = holder.child_by_field_name("value") {
                    self.infer_expr(unit, value, depth + 1)
                } else {
                    Ty::Unknown
                }
            }
            BindingKind::Destructured { holder, key } => match self.infer_expr(unit, holder, depth + 1) {
                Ty::Instance(ty) => self.member_value_type(ty, unit.text(key), false, depth),
                Ty::Static(ty) => self.member_value_type(ty, unit.text(key), true, depth),
                other => other,
            },
            BindingKind::Iterated { source } => self.element_type(unit, source, depth + 1),
            BindingKind::Function { .. } => Ty::Opaque,
            BindingKind::Other => Ty::Unknown,
        }
    }

    /// What `recv.name` refers to, given the receiver expression's static type.
    pub(crate) fn member_target(&self, unit: &SourceUnit, access: Node, depth: u32) -> MemberTarget {
        let (Some(object), Some(property)) =
            (access.child_by_field_name("object"), access.child_by_field_name("property"))
        else {
            return MemberTarget::Unknown;
        };
        let name = unit.text(property);
        let found = match self.infer_expr(unit, object, depth + 1) {
            Ty::Instance(ty) => self.lookup_member(ty, name, false),
            Ty::Static(ty) => self.lookup_member(ty, name, true),
            Ty::Opaque => None,
            Ty::Unknown => return MemberTarget::Unknown,
        };
        found.map_or(MemberTarget::Missing, MemberTarget::Resolved)
    }

    fn member_value_type(&self, ty: TypeId, name: &str, is_static: bool, depth: u32) -> Ty {
        match self.lookup_member(ty, name, is_static) {
            Some(symbol) => self.symbol_value_type(symbol, depth + 1),
            None => Ty::Unknown,
        }
    }

    /// Type of reading a member as a value: callables are functions, fields
    /// take their annotation or initializer.
    fn symbol_value_type(&self, symbol: SymbolId, depth: u32) -> Ty {
        let Some(decl) = self.symbols[symbol.index()].decls.first().map(|d| &self.decls[d.index()]) else {
            return Ty::Unknown;
        };
        if decl.kind.is_callable() {
            return Ty::Opaque;
        }
        let unit = &self.units[decl.location.unit.index()];
        if let Some(node) = decl.type_node.and_then(|span| unit.node_at(span)) {
            return self.type_from_annotation(unit, node, depth + 1);
        }
        match decl.value.and_then(|span| unit.node_at(span)) {
            Some(value) => self.infer_expr(unit, value, depth + 1),
            None => Ty::Unknown,
        }
    }

    /// Declared return type of a callable member.
    fn symbol_return_type(&self, symbol: SymbolId, depth: u32) -> Ty {
        for &id in &self.symbols[symbol.index()].decls {
            let decl = &self.decls[id.index()];
            let unit = &self.units[decl.location.unit.index()];
            let Some(node) = decl.type_node.and_then(|span| unit.node_at(span)) else { continue };
            let returned = match node.kind() {
                "function_type" => node.child_by_field_name("return_type"),
                _ if decl.kind.is_callable() => Some(node),
                _ => None,
            };
            if let Some(returned) = returned {
                return self.type_from_annotation(unit, returned, depth + 1);
            }
        }
        Ty::Unknown
    }

    fn call_return_type(&self, unit: &SourceUnit, call: Node, depth: u32) -> Ty {
        let Some(callee) = call.child_by_field_name("function").map(skip_wrappers) else {
            return Ty::Unknown;
        };
        match callee.kind() {
            "member_expression" => match self.member_target(unit, callee, depth + 1) {
                MemberTarget::Resolved(symbol) => self.symbol_return_type(symbol, depth),
                _ => match self.applied_function(unit, callee, depth) {
                    Some(symbol) => self.symbol_return_type(symbol, depth),
                    None => Ty::Unknown,
                },
            },
            "identifier" => match resolve_binding(unit, callee).map(|b| b.kind) {
                Some(BindingKind::Function { decl }) => match decl.child_by_field_name("return_type") {
                    Some(rt) => self.type_from_annotation(unit, rt, depth + 1),
                    None => Ty::Unknown,
                },
                _ => match self.resolve_function_value(unit, callee, depth + 1) {
                    Some(symbol) => self.symbol_return_type(symbol, depth),
                    None => Ty::Unknown,
                },
            },
            _ => Ty::Unknown,
        }
    }

    /// `await call()` where the call is declared to return `Promise<T>` is `T`.
    fn awaited_type(&self, unit: &SourceUnit, inner: Node, depth: u32) -> Ty {
        let inner = skip_wrappers(inner);
        if inner.kind() == "call_expression" {
            if let Some((decl_unit, rt)) = self.call_return_node(unit, inner, depth) {
                if let Some(arg) = promise_argument(decl_unit, rt) {
                    return self.type_from_annotation(decl_unit, arg, depth + 1);
                }
            }
        }
        match self.infer_expr(unit, inner, depth + 1) {
            Ty::Opaque => Ty::Unknown,
            other => other,
        }
    }

    fn call_return_node(&self, unit: &SourceUnit, call: Node, depth: u32) -> Option<(&SourceUnit, Node<'_>)> {
        let callee = skip_wrappers(call.child_by_field_name("function")?);
        let symbol = match callee.kind() {
            "member_expression" => match self.member_target(unit, callee, depth + 1) {
                MemberTarget::Resolved(symbol) => symbol,
                _ => return None,
            },
            _ => return None,
        };
        self.symbols[symbol.index()].decls.iter().find_map(|&id| {
            let decl = &self.decls[id.index()];
            let decl_unit = &self.units[decl.location.unit.index()];
            let node = decl.type_node.and_then(|span| decl_unit.node_at(span))?;
            (decl.kind.is_callable() && node.kind() != "function_type").then_some((decl_unit, node))
        })
    }

    /// Element type for `for … of source`.
    fn element_type(&self, unit: &SourceUnit, source: Node, depth: u32) -> Ty {
        let Some((decl_unit, annotation)) = self.declared_type_node(unit, skip_wrappers(source), depth) else {
            return Ty::Unknown;
        };
        let annotation = match annotation.kind() {
            "type_annotation" | "readonly_type" => match annotation.named_child(0) {
                Some(inner) => inner,
                None => return Ty::Unknown,
            },
            _ => annotation,
        };
        let element = match annotation.kind() {
            "array_type" => annotation.named_child(0),
            "generic_type" => {
                let name = annotation.child_by_field_name("name").map(|n| decl_unit.text(n));
                match name {
                    Some("Array" | "ReadonlyArray" | "Set" | "ReadonlySet" | "Iterable") => annotation
                        .child_by_field_name("type_arguments")
                        .and_then(|args| args.named_child(0)),
                    _ => None,
                }
            }
            _ => None,
        };
        match element {
            Some(element) => self.type_from_annotation(decl_unit, element, depth + 1),
            None => Ty::Unknown,
        }
    }

    /// Annotation written for an identifier's binding or a member's declaration.
    fn declared_type_node<'a>(&'a self, unit: &'a SourceUnit, expr: Node<'a>, depth: u32) -> Option<(&'a SourceUnit, Node<'a>)> {
        match expr.kind() {
            "identifier" => match resolve_binding(unit, expr)?.kind {
                BindingKind::Variable { declarator: holder } | BindingKind::Parameter { param: holder } => {
                    holder.child_by_field_name("type").map(|t| (unit, t))
                }
                _ => None,
            },
            "member_expression" => match self.member_target(unit, expr, depth + 1) {
                MemberTarget::Resolved(symbol) => {
                    let decl = &self.decls[self.symbols[symbol.index()].decls.first()?.index()];
                    let decl_unit = &self.units[decl.location.unit.index()];
                    decl.type_node.and_then(|span| decl_unit.node_at(span)).map(|n| (decl_unit, n))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Type denoted by a type annotation node.
    pub(crate) fn type_from_annotation(&self, unit: &SourceUnit, node: Node, depth: u32) -> Ty {
        if depth > MAX_INFER_DEPTH {
            return Ty::Unknown;
        }
        match node.kind() {
            "type_annotation" | "parenthesized_type" => {
                node.named_child(0).map_or(Ty::Unknown, |inner| self.type_from_annotation(unit, inner, depth + 1))
            }
            "type_identifier" => {
                let name = unit.text(node);
                match type_parameter_constraint(unit, node, name) {
                    Some(Some(constraint)) => self.type_from_annotation(unit, constraint, depth + 1),
                    Some(None) => Ty::Unknown,
                    None => self.named_type(unit, name),
                }
            }
            "generic_type" => match node.child_by_field_name("name").or_else(|| node.named_child(0)) {
                Some(name) if name.kind() == "nested_type_identifier" => self.type_from_annotation(unit, name, depth + 1),
                Some(name) => self.named_type(unit, unit.text(name)),
                None => Ty::Unknown,
            },
            "nested_type_identifier" => match (0..node.named_child_count()).rev().find_map(|i| node.named_child(i)) {
                Some(last) => self.named_type(unit, unit.text(last)),
                None => Ty::Unknown,
            },
            "union_type" => {
                let mut members = Vec::new();
                flatten_union(unit, node, &mut members);
                match members.as_slice() {
                    [single] => self.type_from_annotation(unit, *single, depth + 1),
                    _ => Ty::Unknown,
                }
            }
            "predefined_type" if matches!(unit.text(node), "any" | "unknown") => Ty::Unknown,
            "predefined_type" | "literal_type" | "array_type" | "tuple_type" | "function_type"
            | "object_type" | "template_literal_type" | "constructor_type" | "readonly_type" => Ty::Opaque,
            _ => Ty::Unknown,
        }
    }

    fn named_type(&self, unit: &SourceUnit, name: &str) -> Ty {
        match self.resolve_type_name(unit.id, name) {
            Some(ty) => Ty::Instance(ty),
            None if is_builtin(name) => Ty::Opaque,
            None => Ty::Unknown,
        }
    }

    // ─── Function values ─────────────────────────────────────────────

    /// Member a function-valued expression denotes: `obj.m`, `obj.m.bind(x)`,
    /// or a local bound to either.
    pub(crate) fn resolve_function_value(&self, unit: &SourceUnit, expr: Node, depth: u32) -> Option<SymbolId> {
        if depth > MAX_INFER_DEPTH {
            return None;
        }
        let expr = skip_wrappers(expr);
        match expr.kind() {
            "member_expression" => match self.member_target(unit, expr, depth + 1) {
                MemberTarget::Resolved(symbol) => Some(symbol),
                _ => None,
            },
            "call_expression" => {
                let callee = skip_wrappers(expr.child_by_field_name("function")?);
                let object = bind_receiver(unit, callee)?;
                self.resolve_function_value(unit, object, depth + 1)
            }
            "identifier" => match resolve_binding(unit, expr)?.kind {
                BindingKind::Variable { declarator: holder } | BindingKind::Parameter { param: holder } => {
                    if holder.child_by_field_name("type").is_some_and(|t| !is_function_annotation(t)) {
                        return None;
                    }
                    let value = holder.child_by_field_name("value")?;
                    self.resolve_function_value(unit, value, depth + 1)
                }
                BindingKind::Destructured { holder, key } => {
                    let name = unit.text(key);
                    match self.infer_expr(unit, holder, depth + 1) {
                        Ty::Instance(ty) => self.lookup_member(ty, name, false),
                        Ty::Static(ty) => self.lookup_member(ty, name, true),
                        _ => None,
                    }
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// For `f.call(…)` / `f.apply(…)` callees, the member `f` denotes.
    pub(crate) fn applied_function(&self, unit: &SourceUnit, callee: Node, depth: u32) -> Option<SymbolId> {
        if callee.kind() != "member_expression" {
            return None;
        }
        let property = callee.child_by_field_name("property")?;
        if !matches!(unit.text(property), "call" | "apply") {
            return None;
        }
        self.resolve_function_value(unit, callee.child_by_field_name("object")?, depth + 1)
    }
}

/// `x.bind` as a callee: returns `x`.
pub(crate) fn bind_receiver<'a>(unit: &SourceUnit, callee: Node<'a>) -> Option<Node<'a>> {
    if callee.kind() != "member_expression" {
        return None;
    }
    let property = callee.child_by_field_name("property")?;
    (unit.text(property) == "bind").then_some(())?;
    callee.child_by_field_name("object")
}

fn is_function_annotation(annotation: Node) -> bool {
    let inner = match annotation.kind() {
        "type_annotation" => annotation.named_child(0),
        _ => Some(annotation),
    };
    inner.is_some_and(|t| t.kind() == "function_type")
}

/// `Promise<T>` → `T`.
fn promise_argument<'a>(unit: &SourceUnit, node: Node<'a>) -> Option<Node<'a>> {
    if node.kind() != "generic_type" {
        return None;
    }
    let name = node.child_by_field_name("name")?;
    if !matches!(unit.text(name), "Promise" | "PromiseLike") {
        return None;
    }
    node.child_by_field_name("type_arguments")?.named_child(0)
}

fn flatten_union<'a>(unit: &SourceUnit, node: Node<'a>, out: &mut Vec<Node<'a>>) {
    for member in named_children(node) {
        match member.kind() {
            "union_type" => flatten_union(unit, member, out),
            "predefined_type" | "literal_type" if matches!(unit.text(member), "null" | "undefined" | "void") => {}
            _ => out.push(member),
        }
    }
}

/// Looks `name` up among the type parameters in scope at `node`.
/// `Some(Some(c))`: a type parameter constrained by `c`; `Some(None)`: unconstrained.
fn type_parameter_constraint<'a>(unit: &SourceUnit, node: Node<'a>, name: &str) -> Option<Option<Node<'a>>> {
    let mut current = node.parent();
    while let Some(n) = current {
        let params = n
            .child_by_field_name("type_parameters")
            .or_else(|| find_child_by_kind(n, "type_parameters"));
        if let Some(params) = params {
            for param in named_children(params) {
                let Some(param_name) = param.child_by_field_name("name") else { continue };
                if unit.text(param_name) != name {
                    continue;
                }
                let constraint = param
                    .child_by_field_name("constraint")
                    .or_else(|| find_child_by_kind(param, "constraint"))
                    .and_then(|c| c.named_child(0));
                return Some(constraint);
            }
        }
        current = n.parent();
    }
    None
}
