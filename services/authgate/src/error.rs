//! Command-line errors

use thiserror::Error;

/// Problems with argument values that clap cannot check on its own. Failures
/// while running a command are reported through `anyhow` with context.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
}

/// Result alias using CLI Error
pub type Result<T> = std::result::Result<T, Error>;
