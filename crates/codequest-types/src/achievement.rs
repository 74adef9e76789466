//! Achievement definitions declared alongside each technology's levels.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A badge awarded once when its requirement is first met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Achievement {
    /// Stable identifier, e.g. `sql-ach-001`. Unique within the catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description of what earns it.
    pub description: String,
    /// Badge glyph.
    pub emoji: String,
    /// Bonus XP granted on unlock.
    pub xp_reward: u32,
    /// Condition over the technology's completion record.
    pub requirement: Requirement,
}

/// What must be completed for an achievement to unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Requirement {
    /// At least `count` levels of the technology.
    LevelsCompleted {
        /// Minimum number of completed levels.
        count: u32,
    },
    /// Every level in the named category.
    ///
    /// A category with no levels never unlocks.
    CategoryCompleted {
        /// Category name as written on the levels.
        category: String,
    },
    /// Every level of the technology.
    AllLevels,
}
