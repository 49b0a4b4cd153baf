//! Error types for the datefinder ecosystem.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in datefinder operations.
#[derive(Error, Debug)]
pub enum DateFinderError {
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid month {month}/{year}")]
    InvalidMonth { month: u32, year: i32 },

    #[error("Name cannot be empty")]
    InvalidName,

    #[error("Date {date} cannot be selected: {reason}")]
    InvalidSelection { date: NaiveDate, reason: String },

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store '{0}' not found in PATH")]
    StoreNotInstalled(String),

    #[error("Store request timed out after {0}s")]
    StoreTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for datefinder operations.
pub type DateFinderResult<T> = Result<T, DateFinderError>;
