use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used across the compiler crates.
pub type CompileResult<T> = Result<T, CompileError>;

/// Position of a problem inside a protocol document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub document: PathBuf,
    pub frame: Option<String>,
    pub field: Option<String>,
}

impl Location {
    pub fn document(path: impl AsRef<Path>) -> Self {
        Self {
            document: path.as_ref().to_path_buf(),
            frame: None,
            field: None,
        }
    }

    pub fn frame(&self, name: &str) -> Self {
        Self {
            document: self.document.clone(),
            frame: Some(name.to_string()),
            field: None,
        }
    }

    pub fn field(&self, name: &str) -> Self {
        Self {
            document: self.document.clone(),
            frame: self.frame.clone(),
            field: Some(name.to_string()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document.display())?;
        if let Some(frame) = &self.frame {
            write!(f, ", frame '{}'", frame)?;
        }
        if let Some(field) = &self.field {
            write!(f, ", field '{}'", field)?;
        }
        Ok(())
    }
}

/// Every failure the compiler can report.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed document or a missing/invalid required element.
    #[error("{location}: {message}")]
    Schema { location: Location, message: String },

    /// Field type is not a member of the type registry.
    #[error("{location}: unknown type '{type_name}'")]
    UnknownType { location: Location, type_name: String },

    /// Health check carries the wrong combination of values for its kind.
    #[error("{location}: health check #{index}: {reason}")]
    HealthCheck {
        location: Location,
        index: usize,
        reason: String,
    },

    /// Two different owners synthesize the same C symbol.
    #[error("symbol '{symbol}' is produced by both {first} and {second}")]
    NameCollision {
        symbol: String,
        first: String,
        second: String,
    },

    /// Unknown template or a failure while rendering an artifact.
    #[error("failed to render '{artifact}': {reason}")]
    Render { artifact: String, reason: String },

    /// Read or write failure outside the core.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid compiler configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CompileError {
    pub fn schema(location: &Location, message: impl Into<String>) -> Self {
        CompileError::Schema {
            location: location.clone(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /* Location the error points at, when it belongs to a single document */
    pub fn location(&self) -> Option<&Location> {
        match self {
            CompileError::Schema { location, .. }
            | CompileError::UnknownType { location, .. }
            | CompileError::HealthCheck { location, .. } => Some(location),
            _ => None,
        }
    }
}
