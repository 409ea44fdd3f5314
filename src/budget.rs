//! Concurrency budget of a mapping operation.

use std::env::{self, VarError};
use std::fmt;
use std::num::NonZeroUsize;

use tracing::{error, info};

use crate::error::{Error, Result};

/// Maximum number of transforms allowed to be in flight at the same time.
///
/// A `Budget` is always at least 1, so an operation built from one can
/// always make progress. Zero is rejected when the budget is created,
/// before anything gets dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Budget(NonZeroUsize);

impl Budget {
    /// Allows exactly one transform at a time.
    pub const SEQUENTIAL: Budget = Budget(NonZeroUsize::MIN);

    /// Validates `max_concurrent` and wraps it.
    ///
    /// ```rust
    /// use futures_asyncmap::{Budget, Error};
    ///
    /// assert_eq!(Budget::new(4).unwrap().get(), 4);
    /// assert_eq!(Budget::new(0), Err(Error::InvalidBudget(0)));
    /// ```
    pub fn new(max_concurrent: usize) -> Result<Self> {
        NonZeroUsize::new(max_concurrent)
            .map(Budget)
            .ok_or(Error::InvalidBudget(max_concurrent))
    }

    /// Reads the budget from the environment variable `key`.
    pub fn from_env(key: &str) -> Result<Self> {
        info!(key, "Reading concurrency budget from env");
        match Self::read_env(key)? {
            Some(value) => Self::parse_env(key, &value),
            None => {
                error!(key, "Concurrency budget is not set in env");
                Err(Error::MissingEnv(key.to_string()))
            }
        }
    }

    /// Like [`Budget::from_env`], but an unset variable yields `default`.
    /// A variable that is set but malformed is still an error.
    pub fn from_env_or(key: &str, default: Budget) -> Result<Self> {
        match Self::read_env(key)? {
            Some(value) => Self::parse_env(key, &value),
            None => {
                info!(key, %default, "Concurrency budget not set in env, using default");
                Ok(default)
            }
        }
    }

    /// `None` only when the variable is unset; a value that is not valid
    /// unicode is a parse error.
    fn read_env(key: &str) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(raw)) => {
                let value = raw.to_string_lossy().into_owned();
                error!(key, value, "Concurrency budget in env is not valid unicode");
                Err(Error::ParseEnv {
                    key: key.to_string(),
                    value,
                })
            }
        }
    }

    fn parse_env(key: &str, value: &str) -> Result<Self> {
        let max_concurrent = value.trim().parse::<usize>().map_err(|_| {
            error!(key, value, "Invalid concurrency budget in env");
            Error::ParseEnv {
                key: key.to_string(),
                value: value.to_string(),
            }
        })?;
        Self::new(max_concurrent)
    }

    /// Maximum number of transforms in flight.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for Budget {
    type Error = Error;

    fn try_from(max_concurrent: usize) -> Result<Self> {
        Self::new(max_concurrent)
    }
}

impl From<NonZeroUsize> for Budget {
    fn from(max_concurrent: NonZeroUsize) -> Self {
        Budget(max_concurrent)
    }
}

impl From<Budget> for usize {
    fn from(budget: Budget) -> Self {
        budget.get()
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
