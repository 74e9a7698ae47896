//! # callers: Semantic Call-Site Discovery for TypeScript
//!
//! Given a class and one of its methods, finds every place in a TypeScript
//! project that invokes that exact method: through the class itself, through
//! base classes it overrides, or through interfaces it implements. Same-named
//! methods of unrelated types are never reported.
//!
//! ## Library usage
//!
//! ```
//! use callers::analysis::{analyze, AnalysisOptions, Query};
//! use callers::model::TsProject;
//!
//! let project = TsProject::from_sources(&[(
//!     "svc.ts",
//!     "class Svc { run() {} }\nfunction main(s: Svc) { s.run(); }\n",
//! )])
//! .unwrap();
//! let report = analyze(&project, &Query::new("Svc", "run"), &AnalysisOptions::default()).unwrap();
//! assert_eq!(report.call_sites.len(), 1);
//! assert_eq!(report.call_sites[0].caller.as_deref(), Some("main"));
//! ```

pub mod analysis;
pub mod error;
pub mod model;

pub use analysis::{analyze, AnalysisOptions, AnalysisReport, Query};
pub use error::AnalysisError;
pub use model::{load_project, LoadOptions, ProjectOptions, SourceModel, TsProject};

/// Strip the `\\?\` extended-length path prefix that Windows canonicalize adds.
#[must_use]
pub fn clean_path(p: &str) -> String {
    p.strip_prefix(r"\\?\").unwrap_or(p).to_string()
}

/// Read a file as a String, using lossy UTF-8 conversion for non-UTF8 files.
/// Returns `(content, was_lossy)` where `was_lossy` is true if replacement characters
/// were inserted.
pub fn read_file_lossy(path: &std::path::Path) -> std::io::Result<(String, bool)> {
    let raw = std::fs::read(path)?;
    match String::from_utf8(raw) {
        Ok(s) => Ok((s, false)),
        Err(e) => Ok((String::from_utf8_lossy(e.as_bytes()).into_owned(), true)),
    }
}


// ─── Property-based tests (proptest) ─────────────────────────────────
