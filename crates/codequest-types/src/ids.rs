//! Type-safe identifiers.
//!
//! Users are identified by UUID v7 (time-ordered) wrapped in a newtype so
//! they cannot be mixed with other UUIDs. Levels are identified by their
//! dense 1-based position inside a technology track.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for the local player profile.
    UserId
}

/// Position of a level inside its technology track.
///
/// Level ids are dense and 1-based: a track with `N` levels uses ids
/// `1..=N`, and the id doubles as the level's sequence number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct LevelId(pub u32);

impl LevelId {
    /// The first level of every track.
    pub const FIRST: Self = Self(1);

    /// Return the raw 1-based number.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the following level id, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Zero-based position of this level in its track's level list.
    ///
    /// Returns `None` for the (invalid) id 0.
    pub fn index(self) -> Option<usize> {
        let zero_based = self.0.checked_sub(1)?;
        usize::try_from(zero_based).ok()
    }
}

impl core::fmt::Display for LevelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LevelId {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_are_unique() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn level_id_index_is_zero_based() {
        assert_eq!(LevelId::FIRST.index(), Some(0));
        assert_eq!(LevelId(7).index(), Some(6));
        assert_eq!(LevelId(0).index(), None);
    }

    #[test]
    fn level_id_next_stops_at_overflow() {
        assert_eq!(LevelId(1).next(), Some(LevelId(2)));
        assert_eq!(LevelId(u32::MAX).next(), None);
    }

    #[test]
    fn level_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&LevelId(3)).unwrap_or_default();
        assert_eq!(json, "3");
    }
}
