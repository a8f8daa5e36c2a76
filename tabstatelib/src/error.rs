//! Error types for tabstatelib

use thiserror::Error;

/// Errors that can occur while configuring a table.
///
/// Every variant is raised synchronously while columns or the table are being
/// built. Failures inside plugin transforms are not represented here: a
/// transform that panics unwinds straight through the pipeline to whoever
/// triggered the recomputation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A data column has neither an explicit id nor a field-path accessor
    #[error("A column id or string accessor is required")]
    MissingColumnId,

    /// Two data columns resolve to the same id
    #[error("Duplicate column ids not allowed: \"{0}\"")]
    DuplicateColumnId(String),

    /// Invalid glob pattern
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Configuration refers to a column id that is not in the column tree
    #[error("unknown column id: \"{0}\"")]
    UnknownColumn(String),

    /// A sort key could not be parsed from text
    #[error("invalid sort key '{0}': expected `id`, `id:asc` or `id:desc`")]
    InvalidSortKey(String),

    /// Two plugins registered under the same name
    #[error("plugin name already registered: \"{0}\"")]
    DuplicatePlugin(String),
}
