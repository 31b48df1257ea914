use thiserror::Error;

/// Errors raised while configuring or loading the localization engine.
///
/// Request-time operations never return these; they only surface while the
/// route table is built or resource bundles are loaded at startup.
#[derive(Debug, Error)]
pub enum LocalizationError {
    /// A route template references a constraint key with no registered constraint
    #[error("route template '{template}' uses unknown constraint '{constraint}'")]
    UnknownConstraint { template: String, constraint: String },

    /// A route template could not be parsed
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// No resource bundle exists for a culture or any of its parents
    #[error("no '{resource}' resources found for culture '{culture}'")]
    MissingResources { resource: String, culture: String },

    #[error("failed to read resources: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse resource bundle: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LocalizationError>;
