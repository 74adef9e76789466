//! Player progress for CodeQuest: persistence, XP, streaks, achievements
//! and the dashboard views built on top of them.
//!
//! # Modules
//!
//! - [`store`] -- The [`ProgressStore`] seam with a JSON file and an
//!   in-memory implementation
//! - [`book`] -- [`ProgressBook`], which applies completion events to the
//!   record
//! - [`dashboard`] -- Stats, per-technology progress and the leaderboard
//! - [`error`] -- Store error types
//!
//! # Design Principles
//!
//! - The progress document only grows: completed levels are never removed
//!   and achievements unlock once.
//! - Loading never fails. Saving reports errors so the caller can warn the
//!   player and keep playing.

pub mod book;
pub mod dashboard;
pub mod error;
pub mod store;

pub use book::{CompletionReport, ProgressBook, XpCurve};
pub use dashboard::{DashboardStats, LeaderboardEntry, Rival, SkillProgress};
pub use error::StoreError;
pub use store::{JsonFileStore, MemoryStore, ProgressStore};
