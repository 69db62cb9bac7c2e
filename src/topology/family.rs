//! Family tags and user-facing selection groups.
//!
//! Every element of a group carries exactly one family tag; families with
//! the same meaning are unioned into named groups exposed for selection.
//! Both are created during metadata load and immutable afterward.

use crate::topology::element::Domain;
use crate::topology::ids::FamilyId;

/// One partition tag of an element group.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    pub domain: Domain,
    /// Names of the selection groups this family belongs to.
    pub groups: Vec<String>,
}

impl Family {
    pub fn new(id: FamilyId, name: impl Into<String>, domain: Domain) -> Self {
        Self {
            id,
            name: name.into(),
            domain,
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }
}

/// A named union of families, the unit users toggle in selection UIs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Group {
    pub name: String,
    pub families: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, families: &[&str]) -> Self {
        Self {
            name: name.into(),
            families: families.iter().map(|f| f.to_string()).collect(),
        }
    }
}
