//! Source model: syntax trees plus the symbol facilities the analysis consumes.
//!
//! The analysis only talks to [`SourceModel`]. [`TsProject`] implements it for
//! TypeScript/TSX sources parsed with tree-sitter.

mod types;
mod parser_typescript;
mod project;
mod checker;
mod references;
mod loader;

pub use types::*;
pub use project::{ProjectOptions, TsProject};
pub use loader::{load_project, LoadOptions};

use tree_sitter::Node;

/// Read-only view of one loaded source snapshot.
///
/// Ids are dense indices; every id handed out by a model is valid for that model.
pub trait SourceModel {
    /// All source units in lexicographic path order.
    fn units(&self) -> &[SourceUnit];

    fn unit(&self, id: UnitId) -> &SourceUnit {
        &self.units()[id.index()]
    }

    /// Every callable member declaration, in discovery order.
    fn method_declarations(&self) -> Vec<DeclId>;

    fn declaration(&self, id: DeclId) -> &Declaration;

    fn type_info(&self, id: TypeId) -> &TypeInfo;

    fn enclosing_type_name(&self, decl: DeclId) -> &str {
        &self.type_info(self.declaration(decl).owner).name
    }

    fn symbol_of(&self, decl: DeclId) -> SymbolId;

    fn symbol_declarations(&self, symbol: SymbolId) -> &[DeclId];

    /// Base classes of a class (several only through mixin composition).
    fn base_types(&self, ty: TypeId) -> &[TypeId];

    /// Interfaces a type declares conformance to: `implements` for classes,
    /// `extends` for interfaces.
    fn implemented_interfaces(&self, ty: TypeId) -> &[TypeId];

    /// Interfaces an interface extends. A class used in an `implements`
    /// clause contributes its own `implements` list.
    fn base_interfaces(&self, iface: TypeId) -> &[TypeId];

    /// Member declared directly on `ty` (no inheritance).
    fn member_by_name(&self, ty: TypeId, name: &str, is_static: bool) -> Option<SymbolId>;

    /// Every syntactic reference to the symbol that `decl` belongs to.
    fn find_references<'a>(&'a self, decl: DeclId) -> Vec<Reference<'a>>;

    /// Declaration the invocation resolves to by static typing alone.
    fn resolve_call_signature(&self, unit: UnitId, call: Node<'_>) -> Option<DeclId>;

    /// Ambient declarations are not searched for references.
    fn is_reference_findable(&self, decl: DeclId) -> bool;
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
