//! Types shared across the authgate crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
