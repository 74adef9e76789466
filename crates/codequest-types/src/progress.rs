//! The durable progress document and its parts.
//!
//! [`ProgressRecord`] is persisted as one camelCase JSON document. Every
//! field defaults when missing so older or hand-edited files still load.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Technology;
use crate::ids::{LevelId, UserId};

// ---------------------------------------------------------------------------
// Completion record
// ---------------------------------------------------------------------------

/// Set of completed level ids for one technology.
///
/// Grows monotonically: there is no way to remove an id once inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct CompletionRecord(BTreeSet<LevelId>);

impl CompletionRecord {
    /// Empty record.
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add `id`. Returns `true` when it was not already present.
    pub fn insert(&mut self, id: LevelId) -> bool {
        self.0.insert(id)
    }

    /// Whether `id` has been completed.
    pub fn contains(&self, id: LevelId) -> bool {
        self.0.contains(&id)
    }

    /// Number of completed levels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been completed yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Completed ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<LevelId> for CompletionRecord {
    fn from_iter<I: IntoIterator<Item = LevelId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Profile and streak
// ---------------------------------------------------------------------------

/// The local player's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Profile identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Single-glyph avatar.
    pub avatar: String,
    /// Player level, starting at 1.
    pub level: u32,
    /// XP earned towards the next player level.
    pub current_xp: u32,
    /// XP needed to reach the next player level.
    pub next_level_xp: u32,
    /// Lifetime XP.
    pub total_xp: u64,
    /// Date the profile was created.
    pub joined_on: NaiveDate,
    /// Last time XP was awarded.
    pub last_active: DateTime<Utc>,
}

impl Default for UserProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: "Player".to_owned(),
            avatar: "P".to_owned(),
            level: 1,
            current_xp: 0,
            next_level_xp: 1000,
            total_xp: 0,
            joined_on: now.date_naive(),
            last_active: now,
        }
    }
}

/// Consecutive-day completion streak.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LearningStreak {
    /// Days in the running streak.
    pub current: u32,
    /// Best streak ever reached.
    pub longest: u32,
    /// Calendar day of the most recent completion.
    pub last_completed_on: Option<NaiveDate>,
    /// First day of the running streak.
    pub started_on: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Achievements and attempts
// ---------------------------------------------------------------------------

/// An achievement the player has earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UnlockedAchievement {
    /// Achievement id from the catalog.
    pub id: String,
    /// Track that declared it.
    pub technology: Technology,
    /// When it was unlocked.
    pub unlocked_at: DateTime<Utc>,
}

/// Submission history for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct QuestionAttempt {
    /// Track of the level.
    pub technology: Technology,
    /// The level.
    pub level_id: LevelId,
    /// At least one submission was made.
    pub attempted: bool,
    /// The level has been completed.
    pub completed: bool,
    /// Completed without any earlier rejected submission.
    pub correct_on_first_try: bool,
    /// Time of the latest submission.
    pub last_attempted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Completion events
// ---------------------------------------------------------------------------

/// A level completed for the first time in a session.
///
/// Produced by the progression controller and applied to the durable record
/// by the caller. The controller never writes storage itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCompleted {
    /// Track of the level.
    pub technology: Technology,
    /// The completed level.
    pub level_id: LevelId,
    /// XP the level awards.
    pub xp_reward: u32,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ProgressRecord {
    /// Completed levels, keyed by technology.
    pub completed_levels: BTreeMap<Technology, CompletionRecord>,
    /// Player profile and XP.
    pub profile: UserProfile,
    /// Daily streak.
    pub streak: LearningStreak,
    /// Earned achievements in unlock order.
    pub achievements: Vec<UnlockedAchievement>,
    /// Per-level submission history.
    pub attempts: Vec<QuestionAttempt>,
}

impl ProgressRecord {
    /// Completion record for `technology`, empty when none is stored.
    pub fn completed(&self, technology: Technology) -> CompletionRecord {
        self.completed_levels
            .get(&technology)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the achievement `id` has already been earned.
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    /// Total completed levels across all technologies.
    pub fn total_completed(&self) -> usize {
        self.completed_levels.values().map(CompletionRecord::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_record_insert_is_idempotent() {
        let mut record = CompletionRecord::new();
        assert!(record.insert(LevelId(2)));
        assert!(!record.insert(LevelId(2)));
        assert_eq!(record.len(), 1);
        assert!(record.contains(LevelId(2)));
    }

    #[test]
    fn missing_fields_default() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"completedLevels":{"css":[1,2]}}"#).unwrap_or_default();
        let css = record.completed(Technology::Css);
        assert_eq!(css.iter().collect::<Vec<_>>(), vec![LevelId(1), LevelId(2)]);
        assert!(record.completed(Technology::Sql).is_empty());
        assert_eq!(record.profile.level, 1);
        assert_eq!(record.streak.current, 0);
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let record = ProgressRecord::default();
        let json = serde_json::to_value(&record).unwrap_or_default();
        assert!(json.get("completedLevels").is_some());
        assert!(json["profile"].get("nextLevelXp").is_some());
        assert!(json["streak"].get("lastCompletedOn").is_some());
    }
}
