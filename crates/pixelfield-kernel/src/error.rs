//! Grid errors.

use pixelfield_common::CellId;
use thiserror::Error;

/// Errors returned by grid operations that address cells by id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// No cell has this id
    #[error("unknown cell {0}")]
    UnknownCell(CellId),

    /// The population is still being built
    #[error("population is still building")]
    Building,
}

/// Result type alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;
