//! Configuration errors
//!
//! Every variant names the offending field so a bad tuning file can be fixed
//! without guessing. These are fatal at initialization and never retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Range whose minimum exceeds its maximum
    #[error("{field}: inverted range [{min}, {max}]")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    /// Value that must be strictly positive
    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    /// Value that must not be negative
    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f32 },

    /// Value outside the interval the simulation can handle
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// NaN or infinite tuning value
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    /// Integer range that is inverted or starts below its floor
    #[error("{field}: invalid count range [{min}, {max}]")]
    InvalidCount {
        field: &'static str,
        min: u32,
        max: u32,
    },

    /// Tuning document is not valid JSON for the config schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Tuning file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
