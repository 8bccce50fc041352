/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
///
/// The variants fall into three recovery classes the engine cares about:
/// transport (model unreachable — degrade and keep talking), persistence
/// (store unreadable/unwritable — halt the affected memory cycle, never
/// fake an empty history), and validation (malformed model output or bad
/// input — deterministic fallback plus a visible warning).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable discriminant for log fields and CLI warnings.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::Pool(_) => "pool",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Io(_) => "io",
            AppError::Serde(_) => "serde",
            AppError::Transport(_) => "transport",
            AppError::Internal(_) => "internal",
        }
    }

    /// True for failures of the language-model transport. These degrade
    /// in place (random speaker, unchanged memory, placeholder summary)
    /// and never abort the session.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// True for failures of the durable stores. A failed read must never
    /// be treated as "no memory yet".
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Pool(_) | AppError::Io(_)
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}
