//! Equivalence set builder: every member symbol that is "the same virtual method".

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::model::{DeclId, SourceModel, SymbolId, TypeId};

/// Ordered set of member symbols, origin first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceSet {
    origin: SymbolId,
    origin_decl: DeclId,
    symbols: Vec<SymbolId>,
    visited_interfaces: Vec<TypeId>,
}

impl EquivalenceSet {
    fn new(origin_decl: DeclId, origin: SymbolId) -> Self {
        Self { origin, origin_decl, symbols: vec![origin], visited_interfaces: Vec::new() }
    }

    fn insert(&mut self, symbol: SymbolId) -> bool {
        if self.symbols.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    pub fn origin(&self) -> SymbolId {
        self.origin
    }

    pub fn origin_decl(&self) -> DeclId {
        self.origin_decl
    }

    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.symbols.contains(&symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Interfaces visited by the interface walk, each once, in visit order.
    pub fn visited_interfaces(&self) -> &[TypeId] {
        &self.visited_interfaces
    }
}

fn is_callable_symbol<M: SourceModel + ?Sized>(model: &M, symbol: SymbolId) -> bool {
    model
        .symbol_declarations(symbol)
        .iter()
        .any(|&d| model.declaration(d).kind.is_callable())
}

pub fn build_equivalence_set<M: SourceModel + ?Sized>(model: &M, decl: DeclId) -> EquivalenceSet {
    let declaration = model.declaration(decl);
    let name = declaration.name.as_str();
    let is_static = declaration.is_static;
    let mut set = EquivalenceSet::new(decl, model.symbol_of(decl));

    // Base-class walk. Mixin composition gives several base edges. A base that
    // does not declare the member inherits it from further up, so the walk
    // passes through it; a same-named non-callable member ends the path.
    let mut roots = vec![declaration.owner];
    let mut seen_types: HashSet<TypeId> = HashSet::from([declaration.owner]);
    let mut frontier = vec![declaration.owner];
    while let Some(ty) = frontier.pop() {
        for &base in model.base_types(ty) {
            if !seen_types.insert(base) {
                continue;
            }
            if let Some(symbol) = model.member_by_name(base, name, is_static) {
                if !is_callable_symbol(model, symbol) {
                    continue;
                }
                set.insert(symbol);
            }
            roots.push(base);
            frontier.push(base);
        }
    }

    if !is_static {
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut queue: VecDeque<TypeId> = roots
            .iter()
            .flat_map(|&ty| model.implemented_interfaces(ty).iter().copied())
            .collect();
        while let Some(iface) = queue.pop_front() {
            if !visited.insert(iface) {
                continue;
            }
            set.visited_interfaces.push(iface);
            if let Some(symbol) = model.member_by_name(iface, name, false) {
                if is_callable_symbol(model, symbol) {
                    set.insert(symbol);
                }
            }
            queue.extend(model.base_interfaces(iface).iter().copied());
        }
    }

    debug!(
        method = name,
        owner = model.enclosing_type_name(decl),
        symbols = set.len(),
        interfaces = set.visited_interfaces.len(),
        "Built equivalence set"
    );
    set
}

/// Every declaration of every symbol in the set.
pub fn equivalence_declarations<M: SourceModel + ?Sized>(model: &M, set: &EquivalenceSet) -> HashSet<DeclId> {
    set.symbols()
        .iter()
        .flat_map(|&s| model.symbol_declarations(s).iter().copied())
        .collect()
}
