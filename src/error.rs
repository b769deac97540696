//! Error and diagnostic types.
//!
//! [`Error`] aborts the analysis pass it occurs in. [`Diagnostic`] records a
//! recoverable problem; the tree is still produced.

use crate::model::{Extent, Kind};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed extents: {first} partially overlaps {second}")]
    MalformedExtent { first: Extent, second: Extent },

    #[error("duplicate {kind} declaration at {extent}")]
    DuplicateExtent { kind: Kind, extent: Extent },

    #[error("merge reached `{path}` without its parent `{parent}`")]
    MissingParentInvariant { path: String, parent: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A non-fatal condition found while building or merging trees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// The analyzer reported a kind tag this crate does not model.
    #[error("unknown declaration kind `{tag}` for `{name}` at {extent}")]
    UnknownKind {
        tag: String,
        name: String,
        extent: Extent,
    },
    /// No declaration precedes or follows the comment in any scope.
    #[error("comment at offset {offset} has no target, attached to root: {}", preview(.text))]
    OrphanComment { offset: usize, text: String },
    /// Same path, unrelated kinds. The newer node was dropped.
    #[error("`{path}` is already a {existing}, dropping incoming {dropped}")]
    IncompatibleMerge {
        path: String,
        existing: Kind,
        dropped: Kind,
    },
}

/// First line of a comment, shortened for log output.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() > 40 {
        let cut: String = line.chars().take(40).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// Join a qualified path for messages and flat keys.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "::".to_string()
    } else {
        path.join("::")
    }
}
