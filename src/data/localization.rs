//! Quadrature localizations: how integration-point values sit inside a cell.
//!
//! A localization names an integration scheme for one element kind. Cell
//! fields behave like one-point schemes at the cell center; ELNO fields
//! synthesize a scheme with one point per cell node. Offset arrays built
//! per (support, localization) are keyed by [`LocalizationKey`] so fields
//! sharing a scheme share one array.

use crate::topology::element::ElementKind;

/// One named integration scheme.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Localization {
    name: String,
    kind: ElementKind,
    points: usize,
}

impl Localization {
    pub fn new(name: impl Into<String>, kind: ElementKind, points: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            points: points.max(1),
        }
    }

    /// Synthetic one-point scheme for cell-centered data.
    pub fn center(kind: ElementKind) -> Self {
        Self::new("center", kind, 1)
    }

    /// Synthetic per-node scheme for ELNO data.
    pub fn elno(kind: ElementKind) -> Self {
        Self::new("elno", kind, kind.node_count())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Integration points per cell.
    pub fn points(&self) -> usize {
        self.points
    }

    pub fn key(&self) -> LocalizationKey {
        LocalizationKey {
            name: self.name.clone(),
            points: self.points,
        }
    }
}

/// Cache key for quadrature offset arrays.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalizationKey {
    pub name: String,
    pub points: usize,
}
