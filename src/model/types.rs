//! Core data types for the source model: ids, declarations, types, units, references.

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

// ─── Ids ─────────────────────────────────────────────────────────────

/// Index of a source unit. Units are numbered in lexicographic path order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

/// Index of a class or interface. Interfaces merged within one unit share an id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Index of a single member declaration, assigned in discovery order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Opaque handle for one named member of one type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ─── Spans and locations ─────────────────────────────────────────────

/// Byte range of a syntax node plus its kind, so the node can be found again
/// in the unit's tree without holding a borrow on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: &'static str,
}

impl Span {
    pub fn of(node: Node) -> Self {
        Self { start: node.start_byte(), end: node.end_byte(), kind: node.kind() }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    #[serde(skip)]
    pub unit: UnitId,
    /// 1-based
    pub line: u32,
    /// 1-based, in bytes
    pub column: u32,
    #[serde(skip)]
    pub start: usize,
}

impl Location {
    pub fn of(unit: UnitId, node: Node) -> Self {
        let pos = node.start_position();
        Self {
            unit,
            line: pos.row as u32 + 1,
            column: pos.column as u32 + 1,
            start: node.start_byte(),
        }
    }
}

// ─── Declarations ────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// Method with a body, or a class field initialized with a function.
    Concrete,
    /// `abstract m(): void;`
    Abstract,
    /// Interface method signature or class overload signature.
    Signature,
    /// Property whose declared type is a function type.
    FunctionProperty,
    /// Any other property, field or accessor.
    Field,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concrete => "concrete",
            Self::Abstract => "abstract",
            Self::Signature => "signature",
            Self::FunctionProperty => "functionProperty",
            Self::Field => "field",
        }
    }

    /// Whether the member can stand for a method in an equivalence set.
    pub fn is_callable(&self) -> bool {
        !matches!(self, Self::Field)
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One member definition inside a class or interface.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub owner: TypeId,
    pub name: String,
    pub kind: DeclKind,
    pub is_static: bool,
    /// Inside `declare ...` or a `.d.ts` unit.
    pub ambient: bool,
    pub location: Location,
    pub signature: String,
    /// Method body, or the function value of a field.
    pub body: Option<Span>,
    /// Declared type of a field, or return type of a method.
    pub type_node: Option<Span>,
    /// Field initializer.
    pub value: Option<Span>,
    /// Arrow-function field: `this` is captured when the instance is built.
    pub lexical_receiver: bool,
    implicit_receiver: OnceCell<bool>,
}

impl Declaration {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: DeclId,
        owner: TypeId,
        name: String,
        kind: DeclKind,
        is_static: bool,
        ambient: bool,
        location: Location,
        signature: String,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            kind,
            is_static,
            ambient,
            location,
            signature,
            body: None,
            type_node: None,
            value: None,
            lexical_receiver: false,
            implicit_receiver: OnceCell::new(),
        }
    }

    /// Cached "body references the implicit receiver" flag; `scan` runs at most once.
    pub fn implicit_receiver_or_init(&self, scan: impl FnOnce() -> bool) -> bool {
        *self.implicit_receiver.get_or_init(scan)
    }
}

// ─── Types and symbols ───────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub unit: UnitId,
    pub exported: bool,
    pub ambient: bool,
    pub line: u32,
    /// Declaration nodes (several for merged interfaces).
    pub spans: Vec<Span>,
    /// Class: base classes (one, or several through mixin calls). Interface: extended interfaces.
    pub extends: Vec<TypeId>,
    /// Class `implements` list; empty for interfaces.
    pub implements: Vec<TypeId>,
    pub members: Vec<SymbolId>,
    pub(crate) extends_names: Vec<String>,
    pub(crate) implements_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MemberSymbol {
    pub id: SymbolId,
    pub owner: TypeId,
    pub name: String,
    pub is_static: bool,
    pub decls: Vec<DeclId>,
}

// ─── Source units ────────────────────────────────────────────────────

/// One parsed source file.
pub struct SourceUnit {
    pub id: UnitId,
    pub path: String,
    /// `path` relative to the project root; the same as `path` for in-memory sources.
    pub rel_path: String,
    pub source: String,
    pub tree: Tree,
    /// `.d.ts` file: everything in it is ambient.
    pub declaration_file: bool,
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("bytes", &self.source.len())
            .finish()
    }
}

impl SourceUnit {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Text of a 1-based line, trimmed.
    pub fn line_text(&self, line: u32) -> &str {
        self.source
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .map(str::trim)
            .unwrap_or("")
    }

    /// Find the node recorded by `span`, descending only into children that cover it.
    pub fn node_at(&self, span: Span) -> Option<Node<'_>> {
        let mut node = self.root();
        'descend: loop {
            if node.start_byte() == span.start && node.end_byte() == span.end && node.kind() == span.kind {
                return Some(node);
            }
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    if child.start_byte() <= span.start && child.end_byte() >= span.end && child.end_byte() > child.start_byte() {
                        node = child;
                        continue 'descend;
                    }
                }
            }
            return None;
        }
    }
}

// ─── References ──────────────────────────────────────────────────────

/// Local binding through which a member is referenced by a bare identifier.
#[derive(Debug, Clone, Copy)]
pub struct AliasBinding<'a> {
    /// Name node that introduced the binding.
    pub name: Node<'a>,
    /// Initializer wrapped in `.bind(...)`.
    pub bound: bool,
}

/// One syntactic occurrence resolving to a member symbol.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    pub unit: UnitId,
    /// `property_identifier` of a member access, pattern name of a destructuring,
    /// or `identifier` use of a local alias.
    pub node: Node<'a>,
    /// False when the receiver type was unknown and the access matched by name only.
    pub resolved: bool,
    pub alias: Option<AliasBinding<'a>>,
}
