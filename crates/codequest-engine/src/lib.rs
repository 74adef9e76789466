//! Answer matching, world simulation and level progression for CodeQuest.
//!
//! This crate owns the play loop of a single track: present a level, run
//! the learner's input through a simulated environment, compare it against
//! the accepted solutions, celebrate, and advance.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `codequest.yaml` into
//!   strongly-typed structs.
//! - [`matcher`] -- Normalization and the [`SolutionChecker`] seam with its
//!   default [`LiteralChecker`].
//! - [`simulator`] -- Per-technology world-state simulators.
//! - [`session`] -- The level-progression controller.
//!
//! [`SolutionChecker`]: matcher::SolutionChecker
//! [`LiteralChecker`]: matcher::LiteralChecker

pub mod config;
pub mod matcher;
pub mod session;
pub mod simulator;

pub use config::AppConfig;
pub use matcher::{LiteralChecker, SolutionChecker, is_accepted, normalize};
pub use session::{Phase, Session, SubmitOutcome, TranscriptEntry};
pub use simulator::{CommandOutcome, World};
