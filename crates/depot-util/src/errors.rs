use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depot operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepotError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No repository or version satisfies a request.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Malformed version range, or a floor above its ceiling.
    #[error("Invalid version range '{input}': {reason}")]
    #[diagnostic(help("Ranges look like [1.0,2.0), (1.0,2.0] or a bare floor version such as 1.0"))]
    InvalidRange { input: String, reason: String },

    /// Malformed version, scope or descriptor input.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A write was attempted on a repository that does not accept writes.
    #[error("Repository '{name}' is read-only")]
    ReadOnlyRepository { name: String },

    /// The request itself is inconsistent (for example EXACT with a range).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The repository does not offer this capability.
    #[error("Repository '{repository}' does not support {operation}")]
    Unsupported {
        repository: String,
        operation: String,
    },

    /// A dependency could not be fetched during a resolution walk.
    #[error("Failed to resolve {coordinate} (via {}): {reason}", .chain.join(" -> "))]
    #[diagnostic(help("The chain lists every coordinate from the root down to the failing one"))]
    ResolutionFailure {
        coordinate: String,
        chain: Vec<String>,
        reason: String,
    },

    /// Output could not be serialized (e.g. `--json`).
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Network request, download or fetch timeout.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Invalid or unreadable configuration (e.g. depot.toml).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your depot.toml for syntax errors"))]
    Config { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type DepotResult<T> = miette::Result<T>;

/// Whether a report carries a [`DepotError::NotFound`].
pub fn is_not_found(report: &miette::Report) -> bool {
    matches!(
        report.downcast_ref::<DepotError>(),
        Some(DepotError::NotFound { .. })
    )
}
