//! Error types for the IIS agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} '{identity}' could not be found at the host")]
    NotFound { kind: EntityKind, identity: String },

    #[error("PowerShell execution failed: {0}")]
    Execution(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a missing-entity error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn not_found(kind: EntityKind, identity: impl ToString) -> Self {
        Error::NotFound {
            kind,
            identity: identity.to_string(),
        }
    }
}

/// The kinds of IIS objects managed by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    ApplicationPool,
    WebSite,
    WebApplication,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::ApplicationPool => write!(f, "application pool"),
            EntityKind::WebSite => write!(f, "web site"),
            EntityKind::WebApplication => write!(f, "web application"),
        }
    }
}
