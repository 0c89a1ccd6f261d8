//! ID types for cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a grid cell.
///
/// Identifiers are owner-defined strings; the grid generates `particle-<n>`
/// (1-based) for the cells it builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Creates an identifier from any string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates the identifier for the cell at `index` (0-based) of a build.
    #[must_use]
    pub fn particle(index: usize) -> Self {
        Self(format!("particle-{}", index + 1))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for CellId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_ids_are_one_based() {
        assert_eq!(CellId::particle(0).as_str(), "particle-1");
        assert_eq!(CellId::particle(99).as_str(), "particle-100");
    }

    #[test]
    fn test_display_matches_inner() {
        let id = CellId::new("pixel-3-4");
        assert_eq!(id.to_string(), "pixel-3-4");
        assert_eq!(CellId::from("pixel-3-4"), id);
    }
}
