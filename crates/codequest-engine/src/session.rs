//! Level-progression controller for one technology.
//!
//! A [`Session`] owns the in-memory state of a game: the current level, the
//! learner's input, feedback, hint and concept visibility, and a mutable
//! [`World`] seeded from the level's snapshot. It moves through three
//! phases:
//!
//! - [`Phase::Presenting`] -- waiting for a submission on a level.
//! - [`Phase::Celebrating`] -- an accepted answer is on screen; the session
//!   advances once its deadline passes.
//! - [`Phase::Complete`] -- the last level has been passed.
//!
//! # Design Principles
//!
//! - The session never touches storage. The only durable effect of a
//!   submission is the [`LevelCompleted`] it returns, which the caller
//!   applies to the progress record.
//! - Time is passed in. The session holds a deadline, never a timer, so
//!   dropping it cancels any pending advance.

use std::time::{Duration, Instant};

use codequest_catalog::{CatalogError, Track};
use codequest_types::{
    CompletionRecord, EnvironmentSnapshot, Feedback, Level, LevelCompleted, LevelId, Technology,
};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::matcher::SolutionChecker;
use crate::simulator::{CommandOutcome, World};

/// Feedback shown for a rejected submission.
pub const REJECTED_MESSAGE: &str = "❌ Not quite right. Try again!";

/// Where a session is in its level sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a submission on this level.
    Presenting(LevelId),

    /// The level was just solved; advance at `deadline`.
    Celebrating {
        /// The solved level.
        level: LevelId,
        /// When to move on.
        deadline: Instant,
    },

    /// Every level has been passed. Nothing is pending.
    Complete,
}

/// What a call to [`Session::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The answer matched. `award` is set only on a first completion.
    Accepted {
        /// Completion to persist, if the level was not already complete.
        award: Option<LevelCompleted>,
    },
    /// The answer did not match.
    Rejected,
    /// The session was not presenting a level.
    Ignored,
}

/// One submitted line and what the simulator printed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// The submitted line.
    pub input: String,
    /// Simulator output.
    pub output: CommandOutcome,
}

/// A game in progress on one track.
pub struct Session {
    /// The track being played.
    track: Track,

    /// Levels of this track completed so far, including this session's.
    completed: CompletionRecord,

    /// Acceptance rule.
    checker: Box<dyn SolutionChecker>,

    /// Pause between an accepted answer and the next level.
    delay: Duration,

    /// Current phase.
    phase: Phase,

    /// The level on screen. Stays on the last level once complete.
    level: Level,

    /// Raw input line.
    input: String,

    /// Result of the most recent submission.
    feedback: Option<Feedback>,

    /// Whether the hint is shown.
    hint_visible: bool,

    /// Whether the concept note is shown.
    concept_visible: bool,

    /// Simulated environment for the current level.
    world: World,

    /// Submissions made on the current level.
    transcript: Vec<TranscriptEntry>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("technology", &self.track.technology())
            .field("phase", &self.phase)
            .field("level", &self.level.id)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session on `track`.
    ///
    /// The first level shown is the lowest one not in `completed`, or level
    /// 1 when every level is already complete.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LevelNotFound`] if the track has no levels.
    pub fn new(
        track: Track,
        completed: CompletionRecord,
        checker: Box<dyn SolutionChecker>,
        config: &SessionConfig,
    ) -> Result<Self, CatalogError> {
        let start = track
            .levels()
            .iter()
            .map(|l| l.id)
            .find(|id| !completed.contains(*id))
            .unwrap_or(LevelId::FIRST);
        let level = track.level(start)?.clone();
        let world = World::from_snapshot(&level.environment);

        debug!(
            technology = %track.technology(),
            start = %start,
            completed = completed.len(),
            "session started"
        );

        Ok(Self {
            track,
            completed,
            checker,
            delay: config.celebration_delay(),
            phase: Phase::Presenting(start),
            level,
            input: String::new(),
            feedback: None,
            hint_visible: false,
            concept_visible: false,
            world,
            transcript: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Technology of the track.
    pub const fn technology(&self) -> Technology {
        self.track.technology()
    }

    /// The track being played.
    pub const fn track(&self) -> &Track {
        &self.track
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The level on screen.
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Current raw input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Feedback from the last submission, if any.
    pub const fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Whether the hint is shown.
    pub const fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// Whether the concept note is shown.
    pub const fn concept_visible(&self) -> bool {
        self.concept_visible
    }

    /// Completed levels, including any completed in this session.
    pub const fn completed(&self) -> &CompletionRecord {
        &self.completed
    }

    /// Current simulated environment.
    pub fn environment(&self) -> EnvironmentSnapshot {
        self.world.snapshot()
    }

    /// Submissions made on the current level.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// When the pending advance fires, if one is pending.
    pub const fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Celebrating { deadline, .. } => Some(deadline),
            Phase::Presenting(_) | Phase::Complete => None,
        }
    }

    /// Whether every level has been passed.
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Replace the input line.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Show or hide the hint.
    pub const fn toggle_hint(&mut self) {
        self.hint_visible = !self.hint_visible;
    }

    /// Show or hide the concept note.
    pub const fn toggle_concept(&mut self) {
        self.concept_visible = !self.concept_visible;
    }

    /// Submit the current input.
    ///
    /// The input is first run through the simulator so the environment
    /// reflects it, then checked against the level's solutions. Only a
    /// first completion of a level yields an award.
    pub fn submit(&mut self, now: Instant) -> SubmitOutcome {
        let Phase::Presenting(id) = self.phase else {
            debug!(phase = ?self.phase, "submission ignored outside presenting phase");
            return SubmitOutcome::Ignored;
        };

        let input = self.input.trim().to_owned();
        if !input.is_empty() {
            let output = self.world.apply(&input);
            self.transcript.push(TranscriptEntry {
                input: input.clone(),
                output,
            });
        }

        let accepted = self.checker.check(&input, &self.level.solutions);
        debug!(
            technology = %self.technology(),
            level = %id,
            accepted,
            "submission checked"
        );

        if !accepted {
            self.feedback = Some(Feedback::Error(REJECTED_MESSAGE.to_owned()));
            return SubmitOutcome::Rejected;
        }

        let first_time = self.completed.insert(id);
        let award = first_time.then(|| LevelCompleted {
            technology: self.technology(),
            level_id: id,
            xp_reward: self.level.xp_reward,
        });
        let message = if first_time {
            format!("🎉 Perfect! +{} XP", self.level.xp_reward)
        } else {
            "🎉 Perfect! (already completed, no XP this time)".to_owned()
        };
        self.feedback = Some(Feedback::Success(message));
        self.phase = Phase::Celebrating {
            level: id,
            deadline: now.checked_add(self.delay).unwrap_or(now),
        };

        info!(
            technology = %self.technology(),
            level = %id,
            first_time,
            "level solved"
        );
        SubmitOutcome::Accepted { award }
    }

    /// Advance if the celebration deadline has passed. Returns whether the
    /// phase changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Phase::Celebrating { level, deadline } = self.phase else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let next = level.next().and_then(|id| self.track.level(id).ok().cloned());
        match next {
            Some(next) => {
                debug!(technology = %self.technology(), level = %next.id, "advancing");
                self.load(next);
            }
            None => {
                info!(technology = %self.technology(), "track complete");
                self.phase = Phase::Complete;
            }
        }
        true
    }

    /// Clear input and feedback and reseed the environment.
    ///
    /// A pending advance is cancelled and the current level is presented
    /// again. A complete session stays complete.
    pub fn reset(&mut self) {
        self.input.clear();
        self.feedback = None;
        self.transcript.clear();
        self.world = World::from_snapshot(&self.level.environment);
        if let Phase::Celebrating { level, .. } = self.phase {
            self.phase = Phase::Presenting(level);
        }
    }

    /// Jump to level `id`, cancelling any pending advance.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LevelNotFound`] if `id` is outside the track.
    pub fn select_level(&mut self, id: LevelId) -> Result<(), CatalogError> {
        let level = self.track.level(id)?.clone();
        self.load(level);
        Ok(())
    }

    /// Present `level` with fresh per-level state.
    fn load(&mut self, level: Level) {
        self.phase = Phase::Presenting(level.id);
        self.world = World::from_snapshot(&level.environment);
        self.level = level;
        self.input.clear();
        self.feedback = None;
        self.hint_visible = false;
        self.concept_visible = false;
        self.transcript.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codequest_catalog::Catalog;

    use super::*;
    use crate::matcher::LiteralChecker;

    fn session(technology: Technology, completed: &[u32]) -> Session {
        let track = Catalog::builtin().unwrap().track(technology).unwrap().clone();
        let record = completed.iter().copied().map(LevelId).collect();
        Session::new(
            track,
            record,
            Box::new(LiteralChecker),
            &SessionConfig {
                celebration_delay_ms: 2000,
            },
        )
        .unwrap()
    }

    #[test]
    fn starts_at_lowest_incomplete_level() {
        assert_eq!(session(Technology::Css, &[]).phase(), Phase::Presenting(LevelId(1)));
        assert_eq!(session(Technology::Css, &[1, 2]).phase(), Phase::Presenting(LevelId(3)));
        assert_eq!(session(Technology::Css, &[1, 3]).phase(), Phase::Presenting(LevelId(2)));
    }

    #[test]
    fn fully_completed_track_restarts_at_level_one() {
        let all: Vec<u32> = (1..=10).collect();
        assert_eq!(session(Technology::Sql, &all).phase(), Phase::Presenting(LevelId(1)));
    }

    #[test]
    fn rejected_answer_keeps_level() {
        let mut s = session(Technology::Sql, &[]);
        s.set_input("SELECT name FROM employees");
        assert_eq!(s.submit(Instant::now()), SubmitOutcome::Rejected);
        assert_eq!(s.phase(), Phase::Presenting(LevelId(1)));
        assert_eq!(s.feedback(), Some(&Feedback::Error(REJECTED_MESSAGE.to_owned())));
        assert!(s.completed().is_empty());
        assert_eq!(s.transcript().len(), 1);
    }

    #[test]
    fn accepted_answer_celebrates_then_advances() {
        let mut s = session(Technology::Sql, &[]);
        let now = Instant::now();
        s.set_input("select * from employees");
        let outcome = s.submit(now);
        assert_eq!(
            outcome,
            SubmitOutcome::Accepted {
                award: Some(LevelCompleted {
                    technology: Technology::Sql,
                    level_id: LevelId(1),
                    xp_reward: 100,
                })
            }
        );
        assert_eq!(s.deadline(), Some(now + Duration::from_secs(2)));

        assert!(!s.poll(now + Duration::from_secs(1)));
        assert!(s.poll(now + Duration::from_secs(2)));
        assert_eq!(s.phase(), Phase::Presenting(LevelId(2)));
        assert_eq!(s.input(), "");
        assert_eq!(s.feedback(), None);
    }

    #[test]
    fn submissions_while_celebrating_are_ignored() {
        let mut s = session(Technology::Sql, &[]);
        let now = Instant::now();
        s.set_input("SELECT * FROM employees");
        s.submit(now);
        assert_eq!(s.submit(now), SubmitOutcome::Ignored);
    }

    #[test]
    fn repeat_completion_has_no_award() {
        let mut s = session(Technology::Sql, &[1]);
        s.select_level(LevelId(1)).unwrap();
        s.set_input("SELECT * FROM employees");
        assert_eq!(s.submit(Instant::now()), SubmitOutcome::Accepted { award: None });
        assert_eq!(s.completed().len(), 1);
    }

    #[test]
    fn reset_cancels_pending_advance() {
        let mut s = session(Technology::Sql, &[]);
        let now = Instant::now();
        s.toggle_hint();
        s.set_input("SELECT * FROM employees");
        s.submit(now);
        s.reset();
        assert_eq!(s.phase(), Phase::Presenting(LevelId(1)));
        assert_eq!(s.deadline(), None);
        assert!(s.hint_visible());
        assert!(!s.poll(now + Duration::from_secs(10)));
        assert!(s.completed().contains(LevelId(1)));
    }

    #[test]
    fn select_level_out_of_range_fails() {
        let mut s = session(Technology::Sql, &[]);
        assert!(matches!(
            s.select_level(LevelId(11)),
            Err(CatalogError::LevelNotFound { index: 11, .. })
        ));
        assert!(matches!(
            s.select_level(LevelId(0)),
            Err(CatalogError::LevelNotFound { .. })
        ));
        s.select_level(LevelId(10)).unwrap();
        assert_eq!(s.level().id, LevelId(10));
    }

    #[test]
    fn last_level_leads_to_complete() {
        let mut s = session(Technology::Sql, &[]);
        s.select_level(LevelId(10)).unwrap();
        let answer = s.level().solutions[0].clone();
        let now = Instant::now();
        s.set_input(answer);
        s.submit(now);
        assert!(s.poll(now + Duration::from_secs(2)));
        assert!(s.is_complete());
        assert_eq!(s.deadline(), None);

        s.reset();
        assert!(s.is_complete());
    }

    #[test]
    fn toggles_flip_and_reset_on_level_change() {
        let mut s = session(Technology::Linux, &[]);
        s.toggle_hint();
        s.toggle_concept();
        assert!(s.hint_visible() && s.concept_visible());
        s.select_level(LevelId(2)).unwrap();
        assert!(!s.hint_visible() && !s.concept_visible());
    }

    #[test]
    fn submission_updates_environment() {
        let mut s = session(Technology::Linux, &[]);
        s.select_level(LevelId(3)).unwrap();
        s.set_input("mkdir projects");
        s.submit(Instant::now());
        let EnvironmentSnapshot::FileSystem(fs) = s.environment() else {
            panic!("expected a file system");
        };
        assert!(fs.entries.iter().any(|e| e.name == "projects"));
    }
}
