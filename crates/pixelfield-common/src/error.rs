//! Error types for Pixelfield.

use thiserror::Error;

/// Top-level error type for Pixelfield operations.
#[derive(Debug, Error)]
pub enum PixelfieldError {
    /// Color parsing errors
    #[error("Color error: {0}")]
    Color(#[from] ColorError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced when parsing a color token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// The token is neither `#rrggbb` nor `rgb(r,g,b)`
    #[error("unrecognized color format: {0:?}")]
    UnknownFormat(String),

    /// A channel could not be parsed or is out of range
    #[error("invalid color channel {channel:?} in {input:?}")]
    InvalidChannel {
        /// The offending channel text
        channel: String,
        /// The full input
        input: String,
    },
}

/// Result type alias for Pixelfield operations.
pub type PixelfieldResult<T> = Result<T, PixelfieldError>;
