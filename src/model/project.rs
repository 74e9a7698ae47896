//! `TsProject`: declaration tables over a set of parsed TypeScript units.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;
use tree_sitter::Node;

use super::parser_typescript::collect_unit_types;
use super::types::*;
use super::SourceModel;
use crate::error::AnalysisError;

/// Provider behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct ProjectOptions {
    /// Report member accesses whose receiver type is unknown when the member
    /// name matches. These references carry `resolved = false`.
    pub lenient_receivers: bool,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self { lenient_receivers: true }
    }
}

pub struct TsProject {
    pub(crate) units: Vec<SourceUnit>,
    pub(crate) types: Vec<TypeInfo>,
    pub(crate) decls: Vec<Declaration>,
    pub(crate) symbols: Vec<MemberSymbol>,
    pub(crate) decl_symbol: Vec<SymbolId>,
    pub(crate) options: ProjectOptions,
    type_names: HashMap<String, Vec<TypeId>>,
    type_at: HashMap<(UnitId, usize), TypeId>,
    instance_members: Vec<HashMap<String, SymbolId>>,
    static_members: Vec<HashMap<String, SymbolId>>,
}

impl std::fmt::Debug for TsProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsProject")
            .field("units", &self.units.len())
            .field("types", &self.types.len())
            .field("declarations", &self.decls.len())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

// ─── Construction ────────────────────────────────────────────────────

impl TsProject {
    /// Build the tables. Units are re-sorted by path and renumbered, which
    /// makes discovery order independent of how they were loaded.
    pub fn new(mut units: Vec<SourceUnit>, options: ProjectOptions) -> Self {
        units.sort_by(|a, b| a.path.cmp(&b.path));
        for (i, unit) in units.iter_mut().enumerate() {
            unit.id = UnitId(i as u32);
        }

        let mut project = TsProject {
            units: Vec::new(),
            types: Vec::new(),
            decls: Vec::new(),
            symbols: Vec::new(),
            decl_symbol: Vec::new(),
            options,
            type_names: HashMap::new(),
            type_at: HashMap::new(),
            instance_members: Vec::new(),
            static_members: Vec::new(),
        };

        for unit in &units {
            project.collect_unit(unit);
        }
        project.units = units;
        project.resolve_heritage();

        debug!(
            units = project.units.len(),
            types = project.types.len(),
            declarations = project.decls.len(),
            symbols = project.symbols.len(),
            "Source model built"
        );
        project
    }

    /// Parse in-memory sources. Paths ending in `.tsx` use the TSX grammar.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, AnalysisError> {
        Self::from_sources_with(sources, ProjectOptions::default())
    }

    pub fn from_sources_with(sources: &[(&str, &str)], options: ProjectOptions) -> Result<Self, AnalysisError> {
        let mut ts_parser = super::loader::new_parser(false)?;
        let mut tsx_parser = super::loader::new_parser(true)?;
        let mut units = Vec::with_capacity(sources.len());
        for (path, source) in sources {
            let parser = if path.ends_with(".tsx") { &mut tsx_parser } else { &mut ts_parser };
            if let Some(unit) = super::loader::parse_unit(parser, path, source.to_string()) {
                units.push(unit);
            }
        }
        Ok(Self::new(units, options))
    }

    fn collect_unit(&mut self, unit: &SourceUnit) {
        let mut merged_interfaces: HashMap<String, TypeId> = HashMap::new();

        for raw in collect_unit_types(unit) {
            let existing = match raw.kind {
                TypeKind::Interface => merged_interfaces.get(&raw.name).copied(),
                TypeKind::Class => None,
            };
            let ty = match existing {
                Some(ty) => {
                    let info = &mut self.types[ty.index()];
                    info.spans.push(raw.span);
                    info.exported |= raw.exported;
                    info.extends_names.extend(raw.extends);
                    ty
                }
                None => {
                    let ty = TypeId(self.types.len() as u32);
                    self.types.push(TypeInfo {
                        id: ty,
                        name: raw.name.clone(),
                        kind: raw.kind,
                        unit: unit.id,
                        exported: raw.exported,
                        ambient: raw.ambient,
                        line: raw.line,
                        spans: vec![raw.span],
                        extends: Vec::new(),
                        implements: Vec::new(),
                        members: Vec::new(),
                        extends_names: raw.extends,
                        implements_names: raw.implements,
                    });
                    self.instance_members.push(HashMap::new());
                    self.static_members.push(HashMap::new());
                    self.type_names.entry(raw.name.clone()).or_default().push(ty);
                    if raw.kind == TypeKind::Interface {
                        merged_interfaces.insert(raw.name.clone(), ty);
                    }
                    ty
                }
            };
            self.type_at.insert((unit.id, raw.span.start), ty);

            for member in raw.members {
                let id = DeclId(self.decls.len() as u32);
                let table = if member.is_static {
                    &mut self.static_members[ty.index()]
                } else {
                    &mut self.instance_members[ty.index()]
                };
                let symbol = match table.get(&member.name) {
                    Some(&symbol) => symbol,
                    None => {
                        let symbol = SymbolId(self.symbols.len() as u32);
                        table.insert(member.name.clone(), symbol);
                        self.symbols.push(MemberSymbol {
                            id: symbol,
                            owner: ty,
                            name: member.name.clone(),
                            is_static: member.is_static,
                            decls: Vec::new(),
                        });
                        self.types[ty.index()].members.push(symbol);
                        symbol
                    }
                };
                self.symbols[symbol.index()].decls.push(id);
                self.decl_symbol.push(symbol);

                let mut decl = Declaration::new(
                    id,
                    ty,
                    member.name,
                    member.kind,
                    member.is_static,
                    raw.ambient,
                    member.location,
                    member.signature,
                );
                decl.body = member.body;
                decl.type_node = member.type_node;
                decl.value = member.value;
                decl.lexical_receiver = member.lexical_receiver;
                self.decls.push(decl);
            }
        }
    }

    fn resolve_heritage(&mut self) {
        for i in 0..self.types.len() {
            let unit = self.types[i].unit;
            let own = self.types[i].id;
            let extends: Vec<TypeId> = self.types[i].extends_names.iter()
                .filter_map(|name| self.resolve_type_name(unit, name))
                .filter(|&t| t != own)
                .collect();
            let implements: Vec<TypeId> = self.types[i].implements_names.iter()
                .filter_map(|name| self.resolve_type_name(unit, name))
                .filter(|&t| t != own)
                .collect();
            self.types[i].extends = dedup_preserving_order(extends);
            self.types[i].implements = dedup_preserving_order(implements);
        }
    }
}

fn dedup_preserving_order(ids: Vec<TypeId>) -> Vec<TypeId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|t| seen.insert(*t)).collect()
}

// ─── Lookups ─────────────────────────────────────────────────────────

impl TsProject {
    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn options(&self) -> ProjectOptions {
        self.options
    }

    /// Resolve a type name as seen from `unit`: a type declared in the same
    /// unit wins, then an exported type, then the first in discovery order.
    pub fn resolve_type_name(&self, unit: UnitId, name: &str) -> Option<TypeId> {
        let candidates = self.type_names.get(name)?;
        candidates.iter().copied().find(|t| self.types[t.index()].unit == unit)
            .or_else(|| candidates.iter().copied().find(|t| self.types[t.index()].exported))
            .or_else(|| candidates.first().copied())
    }

    /// Type declared by a class/interface declaration node.
    pub fn type_declared_at(&self, unit: UnitId, node: Node) -> Option<TypeId> {
        self.type_at.get(&(unit, node.start_byte())).copied()
    }

    /// Member lookup as the type checker sees it: own members, the base-class
    /// chain, then interfaces breadth-first.
    pub fn lookup_member(&self, ty: TypeId, name: &str, is_static: bool) -> Option<SymbolId> {
        let mut visited = HashSet::new();
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            if !visited.insert(t) {
                break;
            }
            if let Some(symbol) = self.member_by_name(t, name, is_static) {
                return Some(symbol);
            }
            chain.push(t);
            let info = &self.types[t.index()];
            current = match info.kind {
                TypeKind::Class => info.extends.first().copied(),
                TypeKind::Interface => None,
            };
        }
        if is_static {
            return None;
        }

        let mut queue = VecDeque::new();
        for t in chain {
            let info = &self.types[t.index()];
            match info.kind {
                TypeKind::Class => {
                    queue.extend(info.extends.iter().skip(1).copied());
                    queue.extend(info.implements.iter().copied());
                }
                TypeKind::Interface => queue.extend(info.extends.iter().copied()),
            }
        }
        while let Some(t) = queue.pop_front() {
            if !visited.insert(t) {
                continue;
            }
            if let Some(symbol) = self.member_by_name(t, name, false) {
                return Some(symbol);
            }
            let info = &self.types[t.index()];
            queue.extend(info.extends.iter().copied());
            queue.extend(info.implements.iter().copied());
        }
        None
    }
}

// ─── SourceModel ─────────────────────────────────────────────────────

impl SourceModel for TsProject {
    fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    fn method_declarations(&self) -> Vec<DeclId> {
        self.decls.iter()
            .filter(|d| d.kind.is_callable())
            .map(|d| d.id)
            .collect()
    }

    fn declaration(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    fn type_info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.index()]
    }

    fn symbol_of(&self, decl: DeclId) -> SymbolId {
        self.decl_symbol[decl.index()]
    }

    fn symbol_declarations(&self, symbol: SymbolId) -> &[DeclId] {
        &self.symbols[symbol.index()].decls
    }

    fn base_types(&self, ty: TypeId) -> &[TypeId] {
        let info = &self.types[ty.index()];
        match info.kind {
            TypeKind::Class => &info.extends,
            TypeKind::Interface => &[],
        }
    }

    fn implemented_interfaces(&self, ty: TypeId) -> &[TypeId] {
        let info = &self.types[ty.index()];
        match info.kind {
            TypeKind::Class => &info.implements,
            TypeKind::Interface => &info.extends,
        }
    }

    fn base_interfaces(&self, iface: TypeId) -> &[TypeId] {
        self.implemented_interfaces(iface)
    }

    fn member_by_name(&self, ty: TypeId, name: &str, is_static: bool) -> Option<SymbolId> {
        let table = if is_static { &self.static_members } else { &self.instance_members };
        table.get(ty.index()).and_then(|m| m.get(name)).copied()
    }

    fn find_references<'a>(&'a self, decl: DeclId) -> Vec<Reference<'a>> {
        self.collect_references(decl)
    }

    fn resolve_call_signature(&self, unit: UnitId, call: Node<'_>) -> Option<DeclId> {
        self.resolve_invocation(&self.units[unit.index()], call)
    }

    fn is_reference_findable(&self, decl: DeclId) -> bool {
        !self.decls[decl.index()].ambient
    }
}
