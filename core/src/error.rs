use std::io;
use thiserror::Error;

/// Everything that can go wrong before the first step is taken.
///
/// All variants are fatal: the run is aborted and nothing is retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("input ended at line {line}, expected value for `{field}`")]
    MissingValue { line: usize, field: &'static str },
    #[error("invalid value for `{field}`: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid parameters: {0}")]
    InvalidParameter(String),
    #[error("restart file must contain {expected} lines, found {found}")]
    RestartLineCount { expected: usize, found: usize },
    #[error("malformed restart line {line}: {content:?}")]
    RestartLine { line: usize, content: String },
    #[error("state expects {expected} atoms, snapshot has {found}")]
    AtomCount { expected: usize, found: usize },
}

impl ConfigError {
    pub fn io(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
