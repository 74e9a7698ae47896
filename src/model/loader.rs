//! Source loading: gitignore-aware directory walk, then parallel tree-sitter parsing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use ignore::WalkBuilder;
use regex::Regex;
use tracing::{debug, info, warn};

use super::project::{ProjectOptions, TsProject};
use super::types::*;
use super::SourceModel;
use crate::error::AnalysisError;
use crate::{clean_path, read_file_lossy};

/// Which files to load and how to build the model.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub dir: String,
    /// Comma-separated extensions, e.g. `ts,tsx`.
    pub ext: String,
    /// Only paths matching this regex, relative to `dir`, are loaded.
    pub include: Option<String>,
    /// 0 = available parallelism.
    pub threads: usize,
    pub project: ProjectOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            ext: "ts,tsx,mts,cts".to_string(),
            include: None,
            threads: 0,
            project: ProjectOptions::default(),
        }
    }
}

pub(crate) fn new_parser(tsx: bool) -> Result<tree_sitter::Parser, AnalysisError> {
    let mut parser = tree_sitter::Parser::new();
    let language = if tsx {
        tree_sitter_typescript::LANGUAGE_TSX
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT
    };
    parser
        .set_language(&language.into())
        .map_err(|e| AnalysisError::Grammar(e.to_string()))?;
    Ok(parser)
}

/// Parse one file. The unit id is provisional; `TsProject::new` renumbers.
pub(crate) fn parse_unit(parser: &mut tree_sitter::Parser, path: &str, source: String) -> Option<SourceUnit> {
    let tree = parser.parse(&source, None)?;
    Some(SourceUnit {
        id: UnitId(0),
        path: path.to_string(),
        rel_path: path.to_string(),
        declaration_file: path.ends_with(".d.ts"),
        source,
        tree,
    })
}

/// `path` below `root`, without the leading separator.
fn relative_to<'a>(root: &str, path: &'a str) -> &'a str {
    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

fn uses_tsx_grammar(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsx"))
}

/// Walk `opts.dir`, parse every matching file and build the model.
pub fn load_project(opts: &LoadOptions) -> Result<TsProject, AnalysisError> {
    let dir = std::fs::canonicalize(&opts.dir).map_err(|_| AnalysisError::DirNotFound(opts.dir.clone()))?;
    if !dir.is_dir() {
        return Err(AnalysisError::DirNotFound(opts.dir.clone()));
    }
    let include = opts
        .include
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| AnalysisError::InvalidRegex { pattern: pattern.to_string(), source })
        })
        .transpose()?;

    let root = clean_path(&dir.to_string_lossy()).replace('\\', "/");
    let start = Instant::now();
    let files = collect_files(&dir, &root, opts, include.as_ref());
    info!(dir = %root, files = files.len(), "Found source files");

    let mut units = parse_files(&files, opts.threads)?;
    for unit in &mut units {
        unit.rel_path = relative_to(&root, &unit.path).to_string();
    }
    let project = TsProject::new(units, opts.project);
    info!(
        units = project.units().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Project loaded"
    );
    Ok(project)
}

fn collect_files(dir: &Path, root: &str, opts: &LoadOptions, include: Option<&Regex>) -> Vec<String> {
    let extensions: Vec<String> = opts
        .ext
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut walker = WalkBuilder::new(dir);
    walker.hidden(false).git_ignore(true);
    walker.filter_entry(|entry| entry.file_name() != "node_modules");
    if opts.threads > 0 {
        walker.threads(opts.threads);
    }

    let all_files: Mutex<Vec<String>> = Mutex::new(Vec::new());
    walker.build_parallel().run(|| {
        Box::new(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => return ignore::WalkState::Continue,
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return ignore::WalkState::Continue;
            }
            let path = entry.path();
            let ext_match = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
            if !ext_match {
                return ignore::WalkState::Continue;
            }
            let clean = clean_path(&path.to_string_lossy()).replace('\\', "/");
            if include.is_some_and(|re| !re.is_match(relative_to(root, &clean))) {
                return ignore::WalkState::Continue;
            }
            all_files.lock().unwrap_or_else(|e| e.into_inner()).push(clean);
            ignore::WalkState::Continue
        })
    });

    let mut files = all_files.into_inner().unwrap_or_else(|e| e.into_inner());
    files.sort();
    files
}

fn parse_files(files: &[String], threads: usize) -> Result<Vec<SourceUnit>, AnalysisError> {
    // Grammar problems surface here rather than inside the workers
    new_parser(false)?;

    let num_threads = if threads > 0 {
        threads
    } else {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    };
    let chunk_size = files.len().div_ceil(num_threads).max(1);
    debug!(threads = num_threads, chunk_size, "Parsing source files");

    let results: Vec<(Vec<SourceUnit>, usize)> = std::thread::scope(|s| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    let mut ts_parser: Option<tree_sitter::Parser> = None;
                    let mut tsx_parser: Option<tree_sitter::Parser> = None;
                    let mut units = Vec::with_capacity(chunk.len());
                    let mut errors = 0usize;

                    for path in chunk {
                        let (content, was_lossy) = match read_file_lossy(&PathBuf::from(path)) {
                            Ok(r) => r,
                            Err(e) => {
                                warn!(path = %path, error = %e, "Failed to read source file");
                                errors += 1;
                                continue;
                            }
                        };
                        if was_lossy {
                            warn!(path = %path, "File contains non-UTF8 bytes (lossy conversion applied)");
                        }
                        let slot = if uses_tsx_grammar(path) { &mut tsx_parser } else { &mut ts_parser };
                        if slot.is_none() {
                            *slot = new_parser(uses_tsx_grammar(path)).ok();
                        }
                        let Some(parser) = slot.as_mut() else {
                            errors += 1;
                            continue;
                        };
                        match parse_unit(parser, path, content) {
                            Some(unit) => units.push(unit),
                            None => {
                                warn!(path = %path, "Parser produced no tree");
                                errors += 1;
                            }
                        }
                    }
                    (units, errors)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    warn!("Worker thread panicked while parsing sources");
                    (Vec::new(), 0)
                })
            })
            .collect()
    });

    let mut units = Vec::with_capacity(files.len());
    let mut errors = 0usize;
    for (chunk_units, chunk_errors) in results {
        units.extend(chunk_units);
        errors += chunk_errors;
    }
    if errors > 0 {
        warn!(errors, "Some source files could not be loaded");
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_project_sorts_units_and_filters_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/b.ts", "export class B { run() {} }\n");
        write(tmp.path(), "src/a.ts", "export class A { run() {} }\n");
        write(tmp.path(), "src/readme.md", "# not code\n");
        write(tmp.path(), "node_modules/lib/index.ts", "export class Lib { run() {} }\n");

        let opts = LoadOptions { dir: tmp.path().to_string_lossy().to_string(), threads: 2, ..Default::default() };
        let project = load_project(&opts).unwrap();
        let paths: Vec<&str> = project.units().iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("src/a.ts"));
        assert!(paths[1].ends_with("src/b.ts"));
        assert_eq!(project.units()[0].id, UnitId(0));
    }

    #[test]
    fn test_load_project_include_regex() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/impl/a.ts", "export class A { run() {} }\n");
        write(tmp.path(), "src/other/b.ts", "export class B { run() {} }\n");

        let opts = LoadOptions {
            dir: tmp.path().to_string_lossy().to_string(),
            include: Some("/impl/".to_string()),
            ..Default::default()
        };
        let project = load_project(&opts).unwrap();
        assert_eq!(project.units().len(), 1);
        assert!(project.units()[0].path.contains("/impl/"));
    }

    #[test]
    fn test_paths_above_root_do_not_affect_matching() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("impl").join("repo");
        write(&root, "src/a/svc.ts", "class Svc { run() {} }\n");
        write(&root, "src/b/svc.ts", "export class Svc { run() {} }\n");
        write(&root, "test/svc.ts", "class Other { run() {} }\n");

        let opts = LoadOptions { dir: root.to_string_lossy().to_string(), ..Default::default() };
        let project = load_project(&opts).unwrap();
        let rel: Vec<&str> = project.units().iter().map(|u| u.rel_path.as_str()).collect();
        assert_eq!(rel, vec!["src/a/svc.ts", "src/b/svc.ts", "test/svc.ts"]);

        // `/impl/` sits above the root, so the exported type wins
        let decl = crate::analysis::resolve(&project, &crate::analysis::Query::new("Svc", "run")).unwrap();
        assert_eq!(project.unit(project.declaration(decl).location.unit).rel_path, "src/b/svc.ts");

        let opts = LoadOptions { include: Some("^src/".to_string()), ..opts };
        let project = load_project(&opts).unwrap();
        assert_eq!(project.units().len(), 2);
    }

    #[test]
    fn test_load_project_declaration_files_are_ambient() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "types.d.ts", "declare class Ext { run(): void; }\n");
        let opts = LoadOptions { dir: tmp.path().to_string_lossy().to_string(), ..Default::default() };
        let project = load_project(&opts).unwrap();
        assert!(project.units()[0].declaration_file);
        assert!(project.declarations().iter().all(|d| d.ambient));
    }

    #[test]
    fn test_load_project_missing_dir() {
        let opts = LoadOptions { dir: "/definitely/not/here/xyz".to_string(), ..Default::default() };
        let err = load_project(&opts).unwrap_err();
        assert!(matches!(err, AnalysisError::DirNotFound(_)));
    }

    #[test]
    fn test_load_project_invalid_include() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = LoadOptions {
            dir: tmp.path().to_string_lossy().to_string(),
            include: Some("[broken".to_string()),
            ..Default::default()
        };
        assert!(matches!(load_project(&opts).unwrap_err(), AnalysisError::InvalidRegex { .. }));
    }
}
