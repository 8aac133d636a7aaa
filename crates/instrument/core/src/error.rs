use thiserror::Error;

/// Errors raised while building the inputs of a generation run.
///
/// Planning and synthesis never fail; everything here originates while
/// parsing rules or resolving the Type Model, and aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("expected pattern:prefix, got '{raw}'")]
    MalformedRule { raw: String },

    #[error("expected valid regex pattern, got '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to resolve type {name}: {reason}")]
    TypeResolution { name: String, reason: String },
}

impl Error {
    pub fn type_resolution(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeResolution {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
