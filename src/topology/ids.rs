//! Strong, zero-cost handles for catalog entities.
//!
//! Supports and profiles live in arenas and are addressed by integer
//! handles; every cross-reference in the crate is a non-owning handle
//! lookup into an arena. Handles wrap a `NonZeroU32` so that 0 stays
//! reserved as an invalid/sentinel value and `Option<Handle>` costs
//! nothing.

use std::fmt;
use std::num::NonZeroU32;

use crate::mesh_error::MeshSupportError;

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Creates a handle from a raw 1-based value.
            ///
            /// # Errors
            /// Returns `Err(InvalidHandle)` if `raw == 0`.
            #[inline]
            pub fn new(raw: u32) -> Result<Self, MeshSupportError> {
                NonZeroU32::new(raw)
                    .map($name)
                    .ok_or(MeshSupportError::InvalidHandle)
            }

            /// Handle for the arena slot at `index` (0-based).
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                // The arena grows one entry at a time, so index + 1 fits u32
                // long before the arena itself becomes unrepresentable.
                $name(NonZeroU32::new(index as u32 + 1).expect("index + 1 is non-zero"))
            }

            /// The raw 1-based value of this handle.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0.get()
            }

            /// The 0-based arena slot this handle addresses.
            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0.get() as usize - 1
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.get())
            }
        }
    };
}

arena_handle!(
    /// Handle of one `Support` in the catalog arena.
    SupportId
);

arena_handle!(
    /// Handle of one `Profile` in the profile store.
    ProfileId
);

/// Raw family tag value, one per element.
///
/// `0` is the conventional default family: element groups without an
/// explicit tag array belong to it wholesale.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct FamilyId(pub i64);

impl FamilyId {
    /// The implicit family assigned when no tag array is stored.
    pub const DEFAULT: FamilyId = FamilyId(0);

    /// The raw tag value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FamilyId").field(&self.0).finish()
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertions that handles stay pointer-friendly.
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(SupportId, u32);
    assert_eq_size!(Option<SupportId>, u32);
    assert_eq_size!(ProfileId, u32);
    assert_eq_size!(FamilyId, i64);
}
