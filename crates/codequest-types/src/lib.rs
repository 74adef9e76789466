//! Shared type definitions for CodeQuest.
//!
//! Every crate in the workspace speaks in these types, and they flow to
//! `TypeScript` via `ts-rs` for a web front end.
//!
//! # Modules
//!
//! - [`ids`] -- Player and level identifiers
//! - [`enums`] -- Technologies, difficulties and feedback
//! - [`level`] -- Levels and their simulated starting environments
//! - [`achievement`] -- Achievement definitions and requirements
//! - [`progress`] -- The durable progress document

pub mod achievement;
pub mod enums;
pub mod ids;
pub mod level;
pub mod progress;

pub use achievement::{Achievement, Requirement};
pub use enums::{ContainerStatus, Difficulty, EntryKind, Feedback, Technology, UnknownTechnology};
pub use ids::{LevelId, UserId};
pub use level::{
    Cell, Container, Declaration, EnvironmentSnapshot, FileEntry, FileSystemSnapshot, Image,
    LearningMaterial, Level, RegistrySnapshot, StyleRule, StylesheetSnapshot, TableSnapshot,
};
pub use progress::{
    CompletionRecord, LearningStreak, LevelCompleted, ProgressRecord, QuestionAttempt,
    UnlockedAchievement, UserProfile,
};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // Types marked #[ts(export)] write their bindings to `bindings/`
        // relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::LevelId::export_all();

        let _ = crate::enums::Technology::export_all();
        let _ = crate::enums::Difficulty::export_all();
        let _ = crate::enums::EntryKind::export_all();
        let _ = crate::enums::ContainerStatus::export_all();
        let _ = crate::enums::Feedback::export_all();

        let _ = crate::level::Level::export_all();
        let _ = crate::level::EnvironmentSnapshot::export_all();
        let _ = crate::achievement::Achievement::export_all();

        let _ = crate::progress::ProgressRecord::export_all();
    }
}
