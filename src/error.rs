//! Configuration errors.
//!
//! Errors raised by a transform never pass through this type: the mapper hands
//! them back to the caller exactly as the transform produced them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid budget - {0}, at least one transform must be allowed to run")]
    InvalidBudget(usize),

    #[error("Missing env - {0} is not set")]
    MissingEnv(String),

    #[error("Env parse error - {key}={value:?} is not a positive integer")]
    ParseEnv { key: String, value: String },
}
