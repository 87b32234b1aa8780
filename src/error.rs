//! @ai:module:intent Define error types for the docstring checker
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for everything outside the pure analyzer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to load Python grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// @ai:intent Line a file-level diagnostic should anchor to for this error
    /// @ai:effects pure
    pub fn line(&self) -> usize {
        match self {
            Error::Parse { line, .. } => *line,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
