//! TypeScript AST walk using tree-sitter: extracts classes, interfaces and their members.

use super::types::*;

/// A class or interface found in one unit, before ids are assigned.
#[derive(Debug)]
pub(crate) struct RawType {
    pub name: String,
    pub kind: TypeKind,
    pub exported: bool,
    pub ambient: bool,
    pub line: u32,
    pub span: Span,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub members: Vec<RawMember>,
}

#[derive(Debug)]
pub(crate) struct RawMember {
    pub name: String,
    pub kind: DeclKind,
    pub is_static: bool,
    pub location: Location,
    pub signature: String,
    pub body: Option<Span>,
    pub type_node: Option<Span>,
    pub value: Option<Span>,
    pub lexical_receiver: bool,
}

// ─── Main entry point ───────────────────────────────────────────────

pub(crate) fn collect_unit_types(unit: &SourceUnit) -> Vec<RawType> {
    let mut types = Vec::new();
    walk_typescript_node_collecting(unit.root(), unit, unit.declaration_file, &mut types);
    types
}

// ─── AST walking ────────────────────────────────────────────────────

fn walk_typescript_node_collecting(
    node: tree_sitter::Node,
    unit: &SourceUnit,
    ambient: bool,
    types: &mut Vec<RawType>,
) {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" => {
            if let Some(def) = extract_ts_class(node, unit, ambient) {
                types.push(def);
            }
            // Classes declared inside method bodies are still collected below
        }
        "interface_declaration" => {
            if let Some(def) = extract_ts_interface(node, unit, ambient) {
                types.push(def);
            }
            return;
        }
        "ambient_declaration" => {
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    walk_typescript_node_collecting(child, unit, true, types);
                }
            }
            return;
        }
        _ => {}
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_typescript_node_collecting(child, unit, ambient, types);
        }
    }
}

// ─── Helper utilities ───────────────────────────────────────────────

pub(crate) fn find_child_by_kind<'a>(node: tree_sitter::Node<'a>, kind: &str) -> Option<tree_sitter::Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                return Some(child);
            }
        }
    }
    None
}

pub(crate) fn has_child_kind(node: tree_sitter::Node, kind: &str) -> bool {
    find_child_by_kind(node, kind).is_some()
}

/// Check if a node is exported (its parent is an export_statement).
fn is_exported(node: tree_sitter::Node) -> bool {
    node.parent().is_some_and(|p| p.kind() == "export_statement")
}

/// Member name from a `_property_name` node. Computed names are skipped.
pub(crate) fn property_name(node: tree_sitter::Node, unit: &SourceUnit) -> Option<String> {
    match node.kind() {
        "property_identifier" | "private_property_identifier" | "number" => {
            Some(unit.text(node).to_string())
        }
        "string" => {
            let text = unit.text(node);
            Some(text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string())
        }
        _ => None,
    }
}

/// Inner type of a `type_annotation` (`: Foo` → `Foo`).
fn annotation_type(annotation: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if annotation.kind() != "type_annotation" {
        return Some(annotation);
    }
    annotation.named_child(0)
}

/// Last simple name of a heritage/type reference: `ns.Base` → `Base`, `Repo<T>` → `Repo`.
fn type_reference_name(node: tree_sitter::Node, unit: &SourceUnit) -> Option<String> {
    match node.kind() {
        "identifier" | "type_identifier" => Some(unit.text(node).to_string()),
        "member_expression" => node.child_by_field_name("property").map(|p| unit.text(p).to_string()),
        "nested_type_identifier" => {
            let last = (0..node.named_child_count()).rev().find_map(|i| node.named_child(i))?;
            Some(unit.text(last).to_string())
        }
        "generic_type" => {
            let name = node.child_by_field_name("name").or_else(|| node.named_child(0))?;
            type_reference_name(name, unit)
        }
        _ => None,
    }
}

/// Collect names from an `extends_clause`, `implements_clause` or `extends_type_clause`.
fn heritage_names(clause: tree_sitter::Node, unit: &SourceUnit, out: &mut Vec<String>) {
    for i in 0..clause.named_child_count() {
        let Some(child) = clause.named_child(i) else { continue };
        match child.kind() {
            "type_arguments" => {}
            // Mixin composition: `extends Timestamped(Base)` walks the composed bases
            "call_expression" => {
                if let Some(args) = child.child_by_field_name("arguments") {
                    for j in 0..args.named_child_count() {
                        if let Some(name) = args.named_child(j).and_then(|a| type_reference_name(a, unit)) {
                            out.push(name);
                        }
                    }
                }
            }
            _ => {
                if let Some(name) = type_reference_name(child, unit) {
                    out.push(name);
                }
            }
        }
    }
}

/// Build a signature for a function/method-like declaration.
fn build_function_signature(
    name: &str,
    params: Option<&str>,
    return_type: Option<&str>,
    prefix_modifiers: &[&str],
) -> String {
    let mut sig = String::new();
    for m in prefix_modifiers {
        sig.push_str(m);
        sig.push(' ');
    }
    sig.push_str(name);
    sig.push_str(params.unwrap_or("()"));
    if let Some(rt) = return_type {
        sig.push_str(": ");
        sig.push_str(rt);
    }
    sig.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn prefix_modifiers(node: tree_sitter::Node) -> Vec<&'static str> {
    let mut modifiers = Vec::new();
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            match child.kind() {
                "static" => modifiers.push("static"),
                "async" => modifiers.push("async"),
                "abstract" => modifiers.push("abstract"),
                "get" => modifiers.push("get"),
                "set" => modifiers.push("set"),
                _ => {}
            }
        }
    }
    modifiers
}

// ─── Type extraction ────────────────────────────────────────────────

fn extract_ts_class(node: tree_sitter::Node, unit: &SourceUnit, ambient: bool) -> Option<RawType> {
    let name_node = node.child_by_field_name("name")?;
    let mut extends = Vec::new();
    let mut implements = Vec::new();
    if let Some(heritage) = find_child_by_kind(node, "class_heritage") {
        for i in 0..heritage.child_count() {
            let Some(clause) = heritage.child(i) else { continue };
            match clause.kind() {
                "extends_clause" => heritage_names(clause, unit, &mut extends),
                "implements_clause" => heritage_names(clause, unit, &mut implements),
                _ => {}
            }
        }
    }

    let mut members = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        for i in 0..body.child_count() {
            let Some(child) = body.child(i) else { continue };
            match child.kind() {
                "method_definition" => extract_ts_method_def(child, unit, &mut members),
                "method_signature" => members.extend(extract_ts_signature(child, unit, DeclKind::Signature)),
                "abstract_method_signature" => members.extend(extract_ts_signature(child, unit, DeclKind::Abstract)),
                "public_field_definition" => members.extend(extract_ts_field_def(child, unit)),
                _ => {}
            }
        }
    }

    Some(RawType {
        name: unit.text(name_node).to_string(),
        kind: TypeKind::Class,
        exported: is_exported(node),
        ambient,
        line: node.start_position().row as u32 + 1,
        span: Span::of(node),
        extends,
        implements,
        members,
    })
}

fn extract_ts_interface(node: tree_sitter::Node, unit: &SourceUnit, ambient: bool) -> Option<RawType> {
    let name_node = node.child_by_field_name("name")?;
    let mut extends = Vec::new();
    if let Some(clause) = find_child_by_kind(node, "extends_type_clause") {
        heritage_names(clause, unit, &mut extends);
    }

    let mut members = Vec::new();
    let body = node.child_by_field_name("body")
        .or_else(|| find_child_by_kind(node, "interface_body"))
        .or_else(|| find_child_by_kind(node, "object_type"));
    if let Some(body) = body {
        for i in 0..body.child_count() {
            let Some(child) = body.child(i) else { continue };
            match child.kind() {
                "method_signature" => members.extend(extract_ts_signature(child, unit, DeclKind::Signature)),
                "property_signature" => members.extend(extract_ts_property_signature(child, unit)),
                _ => {}
            }
        }
    }

    Some(RawType {
        name: unit.text(name_node).to_string(),
        kind: TypeKind::Interface,
        exported: is_exported(node),
        ambient,
        line: node.start_position().row as u32 + 1,
        span: Span::of(node),
        extends,
        implements: Vec::new(),
        members,
    })
}

// ─── Member extraction ──────────────────────────────────────────────

fn extract_ts_method_def(node: tree_sitter::Node, unit: &SourceUnit, members: &mut Vec<RawMember>) {
    let Some(name_node) = node.child_by_field_name("name") else { return };
    let Some(name) = property_name(name_node, unit) else { return };

    if name == "constructor" {
        extract_parameter_properties(node, unit, members);
        return;
    }

    let modifiers = prefix_modifiers(node);
    let is_accessor = modifiers.iter().any(|m| *m == "get" || *m == "set");
    let params = node.child_by_field_name("parameters").map(|p| unit.text(p));
    let return_type = node.child_by_field_name("return_type").and_then(annotation_type);
    let signature = build_function_signature(
        &name,
        params,
        return_type.map(|t| unit.text(t)),
        &modifiers,
    );

    members.push(RawMember {
        name,
        kind: if is_accessor { DeclKind::Field } else { DeclKind::Concrete },
        is_static: has_child_kind(node, "static"),
        location: Location::of(unit.id, name_node),
        signature,
        body: node.child_by_field_name("body").map(Span::of),
        type_node: return_type.map(Span::of),
        value: None,
        lexical_receiver: false,
    });
}

/// `constructor(private readonly repo: Repo)` declares the field `repo`.
fn extract_parameter_properties(ctor: tree_sitter::Node, unit: &SourceUnit, members: &mut Vec<RawMember>) {
    let Some(params) = ctor.child_by_field_name("parameters") else { return };
    for i in 0..params.named_child_count() {
        let Some(param) = params.named_child(i) else { continue };
        if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
            continue;
        }
        let is_property = has_child_kind(param, "accessibility_modifier")
            || has_child_kind(param, "readonly")
            || has_child_kind(param, "override_modifier");
        if !is_property {
            continue;
        }
        let Some(pattern) = param.child_by_field_name("pattern") else { continue };
        if pattern.kind() != "identifier" {
            continue;
        }
        let name = unit.text(pattern).to_string();
        let type_node = param.child_by_field_name("type").and_then(annotation_type);
        members.push(RawMember {
            signature: unit.text(param).split_whitespace().collect::<Vec<_>>().join(" "),
            name,
            kind: DeclKind::Field,
            is_static: false,
            location: Location::of(unit.id, pattern),
            body: None,
            type_node: type_node.map(Span::of),
            value: None,
            lexical_receiver: false,
        });
    }
}

fn extract_ts_signature(node: tree_sitter::Node, unit: &SourceUnit, kind: DeclKind) -> Option<RawMember> {
    let name_node = node.child_by_field_name("name")
        .or_else(|| find_child_by_kind(node, "property_identifier"))?;
    let name = property_name(name_node, unit)?;
    let modifiers = prefix_modifiers(node);
    let params = node.child_by_field_name("parameters").map(|p| unit.text(p));
    let return_type = node.child_by_field_name("return_type").and_then(annotation_type);
    let signature = build_function_signature(&name, params, return_type.map(|t| unit.text(t)), &modifiers);

    Some(RawMember {
        name,
        kind,
        is_static: has_child_kind(node, "static"),
        location: Location::of(unit.id, name_node),
        signature,
        body: None,
        type_node: return_type.map(Span::of),
        value: None,
        lexical_receiver: false,
    })
}

fn extract_ts_field_def(node: tree_sitter::Node, unit: &SourceUnit) -> Option<RawMember> {
    let name_node = node.child_by_field_name("name")
        .or_else(|| find_child_by_kind(node, "property_identifier"))?;
    let name = property_name(name_node, unit)?;
    let type_node = node.child_by_field_name("type").and_then(annotation_type);
    let value = node.child_by_field_name("value");

    let (kind, body, lexical_receiver) = match value.map(|v| v.kind()) {
        Some("arrow_function") => (DeclKind::Concrete, value.map(Span::of), true),
        Some("function_expression") | Some("function") => (DeclKind::Concrete, value.map(Span::of), false),
        _ if type_node.is_some_and(|t| t.kind() == "function_type") => (DeclKind::FunctionProperty, None, false),
        _ => (DeclKind::Field, None, false),
    };

    let signature = match type_node {
        Some(t) => format!("{}: {}", name, unit.text(t)),
        None => name.clone(),
    };

    Some(RawMember {
        name,
        kind,
        is_static: has_child_kind(node, "static"),
        location: Location::of(unit.id, name_node),
        signature,
        body,
        type_node: type_node.map(Span::of),
        value: value.map(Span::of),
        lexical_receiver,
    })
}

fn extract_ts_property_signature(node: tree_sitter::Node, unit: &SourceUnit) -> Option<RawMember> {
    let name_node = node.child_by_field_name("name")
        .or_else(|| find_child_by_kind(node, "property_identifier"))?;
    let name = property_name(name_node, unit)?;
    let type_node = node.child_by_field_name("type").and_then(annotation_type);
    let kind = if type_node.is_some_and(|t| t.kind() == "function_type") {
        DeclKind::FunctionProperty
    } else {
        DeclKind::Field
    };
    let signature = match type_node {
        Some(t) => format!("{}: {}", name, unit.text(t)),
        None => name.clone(),
    };

    Some(RawMember {
        name,
        kind,
        is_static: false,
        location: Location::of(unit.id, name_node),
        signature,
        body: None,
        type_node: type_node.map(Span::of),
        value: None,
        lexical_receiver: false,
    })
}
