use super::*;

fn project(sources: &[(&str, &str)]) -> TsProject {
    TsProject::from_sources(sources).unwrap()
}

fn type_named(p: &TsProject, name: &str) -> TypeId {
    p.types().iter().find(|t| t.name == name).map(|t| t.id).unwrap()
}

fn method(p: &TsProject, class: &str, name: &str) -> DeclId {
    p.declarations()
        .iter()
        .find(|d| d.name == name && p.type_info(d.owner).name == class)
        .map(|d| d.id)
        .unwrap()
}

/// (line, resolved, via alias) for every reference to `class.name`.
fn refs(p: &TsProject, class: &str, name: &str) -> Vec<(u32, bool, bool)> {
    p.find_references(method(p, class, name))
        .iter()
        .map(|r| (r.node.start_position().row as u32 + 1, r.resolved, r.alias.is_some()))
        .collect()
}

fn first_call<'a>(unit: &'a SourceUnit, line: u32) -> tree_sitter::Node<'a> {
    let mut stack = vec![unit.root()];
    let mut found = None;
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" && node.start_position().row as u32 + 1 == line {
            if found.is_none_or(|f: tree_sitter::Node| node.start_byte() < f.start_byte()) {
                found = Some(node);
            }
        }
        for i in 0..node.child_count() {
            stack.push(node.child(i).unwrap());
        }
    }
    found.unwrap()
}

// ─── Declarations ────────────────────────────────────────────────────

#[test]
fn test_collects_classes_interfaces_and_members() {
    let p = project(&[(
        "src/svc.ts",
        r#"
export interface IService {
    run(id: string): Promise<void>;
    onDone: () => void;
    name: string;
}

export abstract class Base implements IService {
    abstract run(id: string): Promise<void>;
    onDone = () => {};
    name = "base";
    static create(): Base { return null!; }
    get label(): string { return this.name; }
}
"#,
    )]);

    let iface = type_named(&p, "IService");
    let base = type_named(&p, "Base");
    assert_eq!(p.type_info(iface).kind, TypeKind::Interface);
    assert_eq!(p.type_info(base).kind, TypeKind::Class);
    assert_eq!(p.implemented_interfaces(base), &[iface]);
    assert!(p.type_info(base).exported);

    let kinds: Vec<(&str, DeclKind, bool)> = p
        .declarations()
        .iter()
        .map(|d| (d.name.as_str(), d.kind, d.is_static))
        .collect();
    assert!(kinds.contains(&("run", DeclKind::Signature, false)));
    assert!(kinds.contains(&("onDone", DeclKind::FunctionProperty, false)));
    assert!(kinds.contains(&("name", DeclKind::Field, false)));
    assert!(kinds.contains(&("run", DeclKind::Abstract, false)));
    assert!(kinds.contains(&("onDone", DeclKind::Concrete, false)));
    assert!(kinds.contains(&("create", DeclKind::Concrete, true)));
    assert!(kinds.contains(&("label", DeclKind::Field, false)));

    let arrow = p.declarations().iter().find(|d| d.name == "onDone" && d.kind == DeclKind::Concrete).unwrap();
    assert!(arrow.lexical_receiver);
}

#[test]
fn test_overloads_share_one_symbol() {
    let p = project(&[(
        "a.ts",
        r#"
class Parser {
    parse(text: string): number;
    parse(text: string, radix: number): number;
    parse(text: string, radix?: number): number { return 0; }
}
"#,
    )]);
    let decls: Vec<&Declaration> = p.declarations().iter().filter(|d| d.name == "parse").collect();
    assert_eq!(decls.len(), 3);
    let symbol = p.symbol_of(decls[0].id);
    assert!(decls.iter().all(|d| p.symbol_of(d.id) == symbol));
    assert_eq!(p.symbol_declarations(symbol).len(), 3);
    assert_eq!(p.method_declarations().len(), 3);
}

#[test]
fn test_interfaces_merge_within_unit_only() {
    let p = project(&[
        ("a.ts", "interface Shape { area(): number; }\ninterface Shape { perimeter(): number; }\n"),
        ("b.ts", "interface Shape { volume(): number; }\n"),
    ]);
    let shapes: Vec<&TypeInfo> = p.types().iter().filter(|t| t.name == "Shape").collect();
    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes[0].spans.len(), 2);
    assert!(p.member_by_name(shapes[0].id, "area", false).is_some());
    assert!(p.member_by_name(shapes[0].id, "perimeter", false).is_some());
    assert!(p.member_by_name(shapes[0].id, "volume", false).is_none());
}

#[test]
fn test_constructor_parameter_properties() {
    let p = project(&[(
        "a.ts",
        "class Repo { find() {} }\nclass Svc { constructor(private readonly repo: Repo, plain: number) {} }\n",
    )]);
    let svc = type_named(&p, "Svc");
    assert!(p.member_by_name(svc, "repo", false).is_some());
    assert!(p.member_by_name(svc, "plain", false).is_none());
}

#[test]
fn test_units_sorted_and_type_resolution_prefers_same_unit() {
    let p = project(&[
        ("z/late.ts", "export class Dup { m() {} }\nclass User extends Dup {}\n"),
        ("a/early.ts", "export class Dup { m() {} }\n"),
    ]);
    assert_eq!(p.units()[0].path, "a/early.ts");
    let user = type_named(&p, "User");
    let base = p.base_types(user)[0];
    assert_eq!(p.type_info(base).unit, UnitId(1));
}

#[test]
fn test_mixin_heritage_walks_composed_bases() {
    let p = project(&[(
        "a.ts",
        "class Base { m() {} }\nclass Mixed extends Timestamped(Base) { m() {} }\n",
    )]);
    let mixed = type_named(&p, "Mixed");
    let base = type_named(&p, "Base");
    assert_eq!(p.base_types(mixed), &[base]);
}

#[test]
fn test_ambient_declarations_not_findable() {
    let p = project(&[("a.ts", "declare class Ext { run(): void; }\nclass Local { run() {} }\n")]);
    let ext = method(&p, "Ext", "run");
    let local = method(&p, "Local", "run");
    assert!(!p.is_reference_findable(ext));
    assert!(p.is_reference_findable(local));
}

#[test]
fn test_lookup_member_walks_class_chain_then_interfaces() {
    let p = project(&[(
        "a.ts",
        r#"
interface I { m(): void; }
interface J extends I {}
class Base { b() {} }
class C extends Base implements J {}
"#,
    )]);
    let c = type_named(&p, "C");
    let base_b = p.symbol_of(method(&p, "Base", "b"));
    let i_m = p.symbol_of(method(&p, "I", "m"));
    assert_eq!(p.lookup_member(c, "b", false), Some(base_b));
    assert_eq!(p.lookup_member(c, "m", false), Some(i_m));
    assert_eq!(p.lookup_member(c, "missing", false), None);
}

#[test]
fn test_lookup_member_terminates_on_cycles() {
    let p = project(&[("a.ts", "interface A extends B {}\ninterface B extends A {}\nclass C implements A {}\n")]);
    let c = type_named(&p, "C");
    assert_eq!(p.lookup_member(c, "m", false), None);
}

// ─── References ──────────────────────────────────────────────────────

const VENDORS: &str = r#"
class A {
    getVendorData() { return 1; }
    selfCall() { return this.getVendorData(); }
}
class B {
    getVendorData() { return 2; }
    selfCall() { return this.getVendorData(); }
    cross() {
        const a = new A();
        return a.getVendorData();
    }
}
function external(a: A) {
    a.getVendorData();
}
"#;

#[test]
fn test_references_follow_receiver_types() {
    let p = project(&[("vendors.ts", VENDORS)]);
    assert_eq!(refs(&p, "A", "getVendorData"), vec![(4, true, false), (11, true, false), (15, true, false)]);
    assert_eq!(refs(&p, "B", "getVendorData"), vec![(8, true, false)]);
}

#[test]
fn test_lenient_receivers_reported_unresolved() {
    let src = "class A { run() {} }\nfunction f(x) { x.run(); }\n";
    let lenient = project(&[("a.ts", src)]);
    assert_eq!(refs(&lenient, "A", "run"), vec![(2, false, false)]);

    let strict = TsProject::from_sources_with(&[("a.ts", src)], ProjectOptions { lenient_receivers: false }).unwrap();
    assert!(refs(&strict, "A", "run").is_empty());
}

#[test]
fn test_any_and_unknown_annotations_are_lenient() {
    let src = "class A { run() {} }\nfunction f(x: any, y: unknown, z: string, w) {\n    x.run();\n    y.run();\n    z.run();\n    w.run();\n}\n";
    let lenient = project(&[("a.ts", src)]);
    assert_eq!(refs(&lenient, "A", "run"), vec![(3, false, false), (4, false, false), (6, false, false)]);

    let strict = TsProject::from_sources_with(&[("a.ts", src)], ProjectOptions { lenient_receivers: false }).unwrap();
    assert!(refs(&strict, "A", "run").is_empty());
}

#[test]
fn test_builtin_receivers_never_match() {
    let p = project(&[(
        "a.ts",
        r#"
class Store { has(k: string) {} push(x: string) {} log(x: string) {} }
function f(m: Map<string, number>, arr: string[]) {
    m.has("a");
    console.log("x");
    [1, 2].push(3);
    arr.push("x");
    "abc".has;
}
"#,
    )]);
    assert!(refs(&p, "Store", "has").is_empty());
    assert!(refs(&p, "Store", "push").is_empty());
    assert!(refs(&p, "Store", "log").is_empty());
}

#[test]
fn test_generic_constraint_resolves_to_interface_member() {
    let p = project(&[(
        "a.ts",
        r#"
interface I { m(): void; }
interface J extends I {}
class C implements J { m() {} }
function call<T extends I>(cm: T) {
    cm.m();
}
"#,
    )]);
    assert_eq!(refs(&p, "I", "m"), vec![(6, true, false)]);
    assert!(refs(&p, "C", "m").is_empty());
}

#[test]
fn test_alias_uses_are_references() {
    let p = project(&[(
        "a.ts",
        r#"
class Svc { load() { return this; } }
function f(obj: Svc) {
    const fn = obj.load;
    fn.call(obj);
    const bound = obj.load.bind(obj);
    bound();
    const { load } = obj;
    load();
}
"#,
    )]);
    let found = refs(&p, "Svc", "load");
    assert_eq!(
        found,
        vec![
            (4, true, false),
            (5, true, true),
            (6, true, false),
            (7, true, true),
            (8, true, false),
            (9, true, true),
        ]
    );

    let decl = method(&p, "Svc", "load");
    let all = p.find_references(decl);
    let bound_use = all.iter().find(|r| r.node.start_position().row == 6).unwrap();
    assert!(bound_use.alias.unwrap().bound);
    let naked_use = all.iter().find(|r| r.node.start_position().row == 4).unwrap();
    assert!(!naked_use.alias.unwrap().bound);
}

#[test]
fn test_shadowed_alias_not_reported() {
    let p = project(&[(
        "a.ts",
        r#"
class Svc { load() {} }
function f(obj: Svc) {
    const fn = obj.load;
    {
        const fn = () => 1;
        fn();
    }
}
"#,
    )]);
    assert_eq!(refs(&p, "Svc", "load"), vec![(4, true, false)]);
}

#[test]
fn test_field_and_return_types_flow_through_chains() {
    let p = project(&[(
        "a.ts",
        r#"
class Repo { save() {} }
class Factory { build(): Repo { return new Repo(); } }
class Svc {
    private repo: Repo;
    constructor(private readonly factory: Factory) {}
    run() {
        this.repo.save();
        this.factory.build().save();
        (this.repo as Repo).save();
        this.repo!.save();
    }
}
"#,
    )]);
    assert_eq!(
        refs(&p, "Repo", "save"),
        vec![(8, true, false), (9, true, false), (10, true, false), (11, true, false)]
    );
}

#[test]
fn test_this_in_nested_function_is_unknown() {
    let p = project(&[(
        "a.ts",
        r#"
class A {
    m() {}
    run() {
        const arrow = () => this.m();
        function inner() { this.m(); }
    }
}
"#,
    )]);
    assert_eq!(refs(&p, "A", "m"), vec![(5, true, false), (6, false, false)]);
}

// ─── Call-signature resolution ───────────────────────────────────────

#[test]
fn test_resolve_call_signature() {
    let p = project(&[(
        "a.ts",
        r#"
class Svc { load() {} }
function f(obj: Svc, x) {
    obj.load();
    obj.load.call(obj);
    const fn = obj.load;
    fn();
    x.load();
}
"#,
    )]);
    let unit = &p.units()[0];
    let load = method(&p, "Svc", "load");
    assert_eq!(p.resolve_call_signature(unit.id, first_call(unit, 4)), Some(load));
    assert_eq!(p.resolve_call_signature(unit.id, first_call(unit, 5)), Some(load));
    assert_eq!(p.resolve_call_signature(unit.id, first_call(unit, 7)), Some(load));
    assert_eq!(p.resolve_call_signature(unit.id, first_call(unit, 8)), None);
}

#[test]
fn test_resolve_call_signature_prefers_implementation_over_overloads() {
    let p = project(&[(
        "a.ts",
        r#"
class P {
    parse(a: string): void;
    parse(a: string, b?: number): void {}
}
new P().parse("x");
"#,
    )]);
    let unit = &p.units()[0];
    let implementation = p.declarations().iter().find(|d| d.kind == DeclKind::Concrete).unwrap().id;
    assert_eq!(p.resolve_call_signature(unit.id, first_call(unit, 6)), Some(implementation));
}
