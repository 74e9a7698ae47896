//! Declaration resolver: picks the one concrete method a (class, method) query names.

use tracing::debug;

use crate::error::AnalysisError;
use crate::model::{DeclId, DeclKind, SourceModel};

use super::Query;

/// Conventional implementation-directory marker used by the tie-break.
pub const IMPL_DIR_MARKER: &str = "/impl/";

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve `query` to a concrete method declaration.
///
/// Candidates are concrete methods named `method_name` declared directly in a
/// type named `class_name`. Ties break on, in order: the file hint, the
/// `/impl/` directory marker, an exported enclosing type, discovery order.
pub fn resolve<M: SourceModel + ?Sized>(model: &M, query: &Query) -> Result<DeclId, AnalysisError> {
    let class = query.class_name.trim();
    let method = query.method_name.trim();
    if class.is_empty() {
        return Err(AnalysisError::config("class name must not be empty"));
    }
    if method.is_empty() {
        return Err(AnalysisError::config("method name must not be empty"));
    }

    let candidates: Vec<DeclId> = model
        .method_declarations()
        .into_iter()
        .filter(|&id| {
            let decl = model.declaration(id);
            decl.kind == DeclKind::Concrete && decl.name == method && model.enclosing_type_name(id) == class
        })
        .collect();

    let Some(&first) = candidates.first() else {
        return Err(AnalysisError::not_found(class, method));
    };

    // Matched below the project root so directories above it never count.
    let path_of = |id: DeclId| format!("/{}", normalize(&model.unit(model.declaration(id).location.unit).rel_path));

    let by_hint = query
        .file_hint
        .as_deref()
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .and_then(|hint| {
            let hint = normalize(hint);
            candidates.iter().copied().find(|&id| path_of(id).contains(&hint))
        });
    let chosen = by_hint
        .or_else(|| candidates.iter().copied().find(|&id| path_of(id).contains(IMPL_DIR_MARKER)))
        .or_else(|| candidates.iter().copied().find(|&id| model.type_info(model.declaration(id).owner).exported))
        .unwrap_or(first);

    debug!(
        class,
        method,
        candidates = candidates.len(),
        path = %model.unit(model.declaration(chosen).location.unit).path,
        line = model.declaration(chosen).location.line,
        "Resolved target declaration"
    );
    Ok(chosen)
}
