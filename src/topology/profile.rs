//! Profiles: sparse, ordered index subsets of one element group.
//!
//! A profile is a strictly increasing, 1-based list of element indices.
//! `None` at the use sites denotes "all elements". Profiles are decoded
//! lazily, validated once, and never change afterward.

use once_cell::sync::OnceCell;

use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::topology::ids::ProfileId;

/// One named sparse subset, valid for exactly one element group.
#[derive(Debug)]
pub struct Profile {
    name: String,
    indices: OnceCell<Vec<usize>>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indices: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based, strictly increasing index list, decoding it on first
    /// access.
    ///
    /// # Errors
    /// `ProfileNotSorted` when the decoded list is not strictly increasing
    /// or contains a zero; decode errors pass through.
    pub fn indices(&self, source: &dyn SupportSource) -> Result<&[usize], MeshSupportError> {
        let ids = self.indices.get_or_try_init(|| {
            let ids = source.read_profile_indices(&self.name)?;
            let mut previous = 0usize;
            for (position, &value) in ids.iter().enumerate() {
                if value <= previous {
                    return Err(MeshSupportError::ProfileNotSorted {
                        name: self.name.clone(),
                        value,
                        position,
                    });
                }
                previous = value;
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    /// Number of entries, decoding on first access.
    pub fn len(&self, source: &dyn SupportSource) -> Result<usize, MeshSupportError> {
        Ok(self.indices(source)?.len())
    }

    /// Position of 1-based element index `value` within the profile.
    ///
    /// Profiles are strictly increasing, so a binary search suffices.
    pub fn position_of(
        &self,
        source: &dyn SupportSource,
        value: usize,
    ) -> Result<Option<usize>, MeshSupportError> {
        Ok(self.indices(source)?.binary_search(&value).ok())
    }
}

/// Arena of profiles addressed by [`ProfileId`].
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a profile by name, returning the existing handle when the
    /// name is already known.
    pub fn intern(&mut self, name: &str) -> ProfileId {
        if let Some(pos) = self.profiles.iter().position(|p| p.name() == name) {
            return ProfileId::from_index(pos);
        }
        self.profiles.push(Profile::new(name));
        ProfileId::from_index(self.profiles.len() - 1)
    }

    /// Handle of a registered profile, if any.
    pub fn lookup(&self, name: &str) -> Option<ProfileId> {
        self.profiles
            .iter()
            .position(|p| p.name() == name)
            .map(ProfileId::from_index)
    }

    pub fn get(&self, id: ProfileId) -> Result<&Profile, MeshSupportError> {
        self.profiles
            .get(id.index())
            .ok_or(MeshSupportError::UnknownProfile(id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemorySource;

    #[test]
    fn intern_is_idempotent() {
        let mut store = ProfileStore::new();
        let a = store.intern("left");
        let b = store.intern("right");
        let a2 = store.intern("left");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("right"), Some(b));
        assert_eq!(store.lookup("missing"), None);
    }

    #[test]
    fn decode_validates_strict_order() {
        let mut src = MemorySource::new();
        src.add_profile("p", &[1, 3, 3, 7]);
        let profile = Profile::new("p");
        let err = profile.indices(&src).unwrap_err();
        assert!(matches!(
            err,
            MeshSupportError::ProfileNotSorted { value: 3, position: 2, .. }
        ));
    }

    #[test]
    fn zero_index_rejected() {
        let mut src = MemorySource::new();
        src.add_profile("p", &[0, 1, 2]);
        let profile = Profile::new("p");
        assert!(profile.indices(&src).is_err());
    }

    #[test]
    fn binary_position_lookup() {
        let mut src = MemorySource::new();
        src.add_profile("p", &[2, 3, 4, 7, 8]);
        let profile = Profile::new("p");
        assert_eq!(profile.position_of(&src, 4).unwrap(), Some(2));
        assert_eq!(profile.position_of(&src, 5).unwrap(), None);
        assert_eq!(profile.len(&src).unwrap(), 5);
    }
}
