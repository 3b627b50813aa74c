//! Error types for deck and inventory operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::rules::ValidationIssue;

/// Unified error type for deck library and spares inventory operations.
///
/// Resolver failures are deliberately not represented here: a failed card
/// lookup is collected as a warning by the caller and never aborts a batch.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Target deck file already exists and no overwrite was requested.
    #[error("Deck already exists: {}", .0.display())]
    DeckExists(PathBuf),

    #[error("Deck not found: {}", .0.display())]
    DeckNotFound(PathBuf),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The import source contained no card entries.
    #[error("No cards provided to import")]
    EmptyImport,

    /// A box-to-box move requested more copies than the source row holds.
    /// The inventory file is left untouched when this is raised.
    #[error("Cannot move {requested} x '{name}' from box '{from_box}': only {available} present")]
    InsufficientCount {
        name: String,
        from_box: String,
        requested: u32,
        available: u32,
    },

    /// An imported deck violated the configured Commander rules. The
    /// just-written file has already been deleted when this is returned.
    #[error("Deck violates Commander rules ({} issue(s)):\n{}", .0.len(), list_issues(.0))]
    RuleViolations(Vec<ValidationIssue>),

    #[error("Unsupported price source: {0}")]
    UnsupportedSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Valuation cache could not be serialized.
    #[error("Cache error: {0}")]
    Cache(#[from] serde_json::Error),
}

fn list_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result alias for deck and inventory operations
pub type Result<T> = std::result::Result<T, DeckError>;
