use thiserror::Error;

/// Core error type shared across synthscope crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A dataset has no columns or no rows.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),
    /// Real and synthetic column names differ.
    #[error(
        "schema mismatch: missing in synthetic [{}], extra in synthetic [{}]",
        missing.join(", "),
        extra.join(", ")
    )]
    SchemaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    /// The dataset violates structural invariants (ragged or duplicate columns).
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}

/// Convenience alias for results returned by synthscope crates.
pub type Result<T> = std::result::Result<T, Error>;
