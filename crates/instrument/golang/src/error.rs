use std::path::PathBuf;
use thiserror::Error;

/// A lexer or parser failure at a position in one file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GoError {
    #[error("{}:{}", path.display(), source)]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no Go files in {}", .0.display())]
    NoGoFiles(PathBuf),

    #[error("found packages {first} and {second} in {}", dir.display())]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },

    #[error("malformed go.mod at {}: {message}", path.display())]
    Module { path: PathBuf, message: String },

    /// A type whose declaration is outside what the loader can see.
    #[error("cannot resolve {name}: {reason}")]
    Unresolved { name: String, reason: String },

    #[error("no such interface {name}")]
    UnknownInterface { name: String },

    #[error("{} already exists (use --force to overwrite)", path.display())]
    OutputExists { path: PathBuf },

    #[error(transparent)]
    Core(#[from] instrument_core::Error),
}

impl GoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn type_resolution(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Core(instrument_core::Error::type_resolution(name, reason))
    }
}

pub type Result<T> = std::result::Result<T, GoError>;
