//! Applying gameplay events to the progress document.
//!
//! [`ProgressBook`] wraps a [`ProgressRecord`] and is the only place it is
//! mutated during play. A completion event goes through four steps in
//! order:
//!
//! 1. insert the level into the technology's completion set,
//! 2. record the attempt,
//! 3. on a first completion only, grant XP and advance the streak,
//! 4. unlock any achievements whose requirement is now met.
//!
//! Replaying an event is harmless: the completion set does not change, no
//! XP is granted and no achievement unlocks twice.

use chrono::{DateTime, Local, NaiveDate, Utc};
use codequest_catalog::Track;
use codequest_types::{
    Achievement, CompletionRecord, LevelCompleted, LevelId, ProgressRecord, QuestionAttempt,
    Requirement, Technology, UnlockedAchievement,
};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// XP curve
// ---------------------------------------------------------------------------

/// XP needed to leave each player level: `base + step * (level - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpCurve {
    base: u32,
    step: u32,
}

impl XpCurve {
    /// A curve starting at `base` XP and growing by `step` per level.
    pub const fn new(base: u32, step: u32) -> Self {
        Self { base, step }
    }

    /// XP required to go from `level` to `level + 1`. Never zero.
    pub const fn required_for(self, level: u32) -> u32 {
        let extra = self.step.saturating_mul(level.saturating_sub(1));
        let required = self.base.saturating_add(extra);
        if required == 0 { 1 } else { required }
    }
}

impl Default for XpCurve {
    fn default() -> Self {
        Self::new(1000, 250)
    }
}

// ---------------------------------------------------------------------------
// Completion report
// ---------------------------------------------------------------------------

/// What a completion event changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReport {
    /// The level was not in the completion set before.
    pub first_completion: bool,
    /// XP granted for the level plus any achievement bonuses.
    pub xp_gained: u64,
    /// Player levels gained.
    pub levels_gained: u32,
    /// Player level after the event.
    pub player_level: u32,
    /// Current streak length after the event.
    pub streak: u32,
    /// Achievements unlocked by this event.
    pub unlocked: Vec<Achievement>,
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// The progress document plus the rules for changing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBook {
    record: ProgressRecord,
    curve: XpCurve,
}

impl ProgressBook {
    /// Wrap a loaded record.
    pub const fn new(record: ProgressRecord, curve: XpCurve) -> Self {
        Self { record, curve }
    }

    /// The current document.
    pub const fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Completed levels for one technology.
    pub fn completed(&self, technology: Technology) -> CompletionRecord {
        self.record.completed(technology)
    }

    /// No level completed, no XP earned and no achievement unlocked.
    pub fn is_fresh(&self) -> bool {
        self.record.total_completed() == 0
            && self.record.profile.total_xp == 0
            && self.record.achievements.is_empty()
    }

    /// Set the player's display name and avatar.
    pub fn set_identity(&mut self, name: &str, avatar: &str) {
        name.clone_into(&mut self.record.profile.name);
        avatar.clone_into(&mut self.record.profile.avatar);
        self.record.profile.next_level_xp = self.curve.required_for(self.record.profile.level);
    }

    /// Apply a completion event from a session playing `track`.
    pub fn apply(
        &mut self,
        event: LevelCompleted,
        track: &Track,
        now: DateTime<Local>,
    ) -> CompletionReport {
        let at = now.with_timezone(&Utc);
        let first_completion = self
            .record
            .completed_levels
            .entry(event.technology)
            .or_default()
            .insert(event.level_id);
        self.record_attempt(event.technology, event.level_id, true, at);
        self.record.profile.last_active = at;

        let mut report = CompletionReport {
            first_completion,
            ..CompletionReport::default()
        };

        if first_completion {
            report.levels_gained = self.award_xp(event.xp_reward);
            report.xp_gained = u64::from(event.xp_reward);
            self.advance_streak(now.date_naive());
            info!(
                technology = %event.technology,
                level = %event.level_id,
                xp = event.xp_reward,
                streak = self.record.streak.current,
                "level completed"
            );
        } else {
            debug!(
                technology = %event.technology,
                level = %event.level_id,
                "level already completed, no XP"
            );
        }

        if track.technology() == event.technology {
            for achievement in self.newly_met(track) {
                let gained = self.award_xp(achievement.xp_reward);
                report.levels_gained = report.levels_gained.saturating_add(gained);
                report.xp_gained = report
                    .xp_gained
                    .saturating_add(u64::from(achievement.xp_reward));
                self.record.achievements.push(UnlockedAchievement {
                    id: achievement.id.clone(),
                    technology: event.technology,
                    unlocked_at: at,
                });
                info!(
                    achievement = %achievement.id,
                    name = %achievement.name,
                    xp = achievement.xp_reward,
                    "achievement unlocked"
                );
                report.unlocked.push(achievement);
            }
        }

        report.player_level = self.record.profile.level;
        report.streak = self.record.streak.current;
        report
    }

    /// Record a rejected answer for `level`.
    pub fn record_rejection(&mut self, technology: Technology, level: LevelId, now: DateTime<Local>) {
        let at = now.with_timezone(&Utc);
        self.record_attempt(technology, level, false, at);
        self.record.profile.last_active = at;
        debug!(technology = %technology, level = %level, "answer rejected");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn record_attempt(
        &mut self,
        technology: Technology,
        level_id: LevelId,
        completed: bool,
        at: DateTime<Utc>,
    ) {
        let existing = self
            .record
            .attempts
            .iter_mut()
            .find(|a| a.technology == technology && a.level_id == level_id);
        match existing {
            Some(attempt) => {
                if completed && !attempt.completed {
                    attempt.completed = true;
                    attempt.correct_on_first_try = false;
                }
                attempt.last_attempted_at = at;
            }
            None => self.record.attempts.push(QuestionAttempt {
                technology,
                level_id,
                attempted: true,
                completed,
                correct_on_first_try: completed,
                last_attempted_at: at,
            }),
        }
    }

    /// Add XP and roll over player levels. Returns levels gained.
    fn award_xp(&mut self, xp: u32) -> u32 {
        let profile = &mut self.record.profile;
        profile.total_xp = profile.total_xp.saturating_add(u64::from(xp));
        profile.current_xp = profile.current_xp.saturating_add(xp);
        if profile.next_level_xp == 0 {
            profile.next_level_xp = self.curve.required_for(profile.level);
        }

        let mut gained = 0_u32;
        while profile.current_xp >= profile.next_level_xp {
            profile.current_xp = profile.current_xp.saturating_sub(profile.next_level_xp);
            profile.level = profile.level.saturating_add(1);
            profile.next_level_xp = self.curve.required_for(profile.level);
            gained = gained.saturating_add(1);
        }
        if gained > 0 {
            info!(level = profile.level, "player level up");
        }
        gained
    }

    fn advance_streak(&mut self, today: NaiveDate) {
        let streak = &mut self.record.streak;
        match streak.last_completed_on {
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => {
                streak.current = streak.current.saturating_add(1);
            }
            _ => {
                streak.current = 1;
                streak.started_on = Some(today);
            }
        }
        streak.longest = streak.longest.max(streak.current);
        streak.last_completed_on = Some(today);
    }

    /// Achievements of `track` that are met and not yet unlocked.
    fn newly_met(&self, track: &Track) -> Vec<Achievement> {
        let completed = self.record.completed(track.technology());
        track
            .achievements()
            .iter()
            .filter(|a| !self.record.has_achievement(&a.id))
            .filter(|a| requirement_met(&a.requirement, track, &completed))
            .cloned()
            .collect()
    }
}

/// Whether `completed` satisfies `requirement` for `track`.
///
/// A category with no levels is never complete.
pub fn requirement_met(requirement: &Requirement, track: &Track, completed: &CompletionRecord) -> bool {
    match requirement {
        Requirement::LevelsCompleted { count } => {
            usize::try_from(*count).is_ok_and(|needed| completed.len() >= needed)
        }
        Requirement::CategoryCompleted { category } => {
            let mut levels = track.levels_in_category(category).peekable();
            levels.peek().is_some() && levels.all(|l| completed.contains(l.id))
        }
        Requirement::AllLevels => track.levels().iter().all(|l| completed.contains(l.id)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use codequest_catalog::Catalog;

    use super::*;

    fn css() -> Track {
        Catalog::builtin()
            .unwrap()
            .track(Technology::Css)
            .unwrap()
            .clone()
    }

    fn day(d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, d, 12, 0, 0).single().unwrap()
    }

    fn event(track: &Track, id: u32) -> LevelCompleted {
        let level = track.level(LevelId(id)).unwrap();
        LevelCompleted {
            technology: track.technology(),
            level_id: level.id,
            xp_reward: level.xp_reward,
        }
    }

    #[test]
    fn curve_grows_linearly() {
        let curve = XpCurve::default();
        assert_eq!(curve.required_for(1), 1000);
        assert_eq!(curve.required_for(2), 1250);
        assert_eq!(curve.required_for(5), 2000);
        assert_eq!(XpCurve::new(0, 0).required_for(1), 1);
    }

    #[test]
    fn first_completion_grants_xp_and_first_achievement() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        let first = event(&track, 1);
        let report = book.apply(first, &track, day(1));

        assert!(report.first_completion);
        let bonus: u32 = report.unlocked.iter().map(|a| a.xp_reward).sum();
        assert_eq!(report.xp_gained, u64::from(first.xp_reward + bonus));
        assert!(report.unlocked.iter().any(|a| a.id == "css-ach-001"));
        assert_eq!(book.record().profile.total_xp, report.xp_gained);
        assert!(book.completed(Technology::Css).contains(LevelId(1)));
        assert_eq!(report.streak, 1);
    }

    #[test]
    fn replay_grants_nothing() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        book.apply(event(&track, 1), &track, day(1));
        let before = book.record().profile.total_xp;

        let report = book.apply(event(&track, 1), &track, day(1));
        assert!(!report.first_completion);
        assert_eq!(report.xp_gained, 0);
        assert!(report.unlocked.is_empty());
        assert_eq!(book.record().profile.total_xp, before);
        assert_eq!(book.record().achievements.len(), 1);
        assert_eq!(book.completed(Technology::Css).len(), 1);
    }

    #[test]
    fn category_achievement_needs_every_level_in_it() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        let colors: Vec<u32> = track.levels_in_category("Colors").map(|l| l.id.get()).collect();
        assert!(colors.len() > 1);

        let (last, rest) = colors.split_last().unwrap();
        for id in rest {
            book.apply(event(&track, *id), &track, day(1));
        }
        assert!(!book.record().has_achievement("css-ach-002"));

        let report = book.apply(event(&track, *last), &track, day(1));
        assert!(report.unlocked.iter().any(|a| a.id == "css-ach-002"));
    }

    #[test]
    fn completing_every_level_unlocks_everything() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        for level in track.levels() {
            book.apply(event(&track, level.id.get()), &track, day(1));
        }
        for achievement in track.achievements() {
            assert!(book.record().has_achievement(&achievement.id), "{}", achievement.id);
        }
        let level_xp: u64 = track.total_xp();
        let bonus_xp: u64 = track.achievements().iter().map(|a| u64::from(a.xp_reward)).sum();
        assert_eq!(book.record().profile.total_xp, level_xp + bonus_xp);
        assert!(book.record().profile.level > 1);
    }

    #[test]
    fn level_up_carries_remainder() {
        let mut record = ProgressRecord::default();
        record.profile.next_level_xp = 100;
        let mut book = ProgressBook::new(record, XpCurve::new(100, 50));
        assert_eq!(book.award_xp(130), 1);
        let profile = &book.record().profile;
        assert_eq!(profile.level, 2);
        assert_eq!(profile.current_xp, 30);
        assert_eq!(profile.next_level_xp, 150);

        assert_eq!(book.award_xp(400), 2);
        let profile = &book.record().profile;
        assert_eq!(profile.level, 4);
        assert_eq!(profile.current_xp, 30);
        assert_eq!(profile.next_level_xp, 250);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        book.apply(event(&track, 1), &track, day(1));
        book.apply(event(&track, 2), &track, day(1));
        assert_eq!(book.record().streak.current, 1);

        book.apply(event(&track, 3), &track, day(2));
        book.apply(event(&track, 4), &track, day(3));
        assert_eq!(book.record().streak.current, 3);

        book.apply(event(&track, 5), &track, day(6));
        let streak = &book.record().streak;
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.started_on, Some(day(6).date_naive()));
    }

    #[test]
    fn attempts_track_first_try() {
        let track = css();
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        book.apply(event(&track, 1), &track, day(1));
        book.record_rejection(Technology::Css, LevelId(2), day(1));
        book.apply(event(&track, 2), &track, day(1));

        let attempts = &book.record().attempts;
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].completed && attempts[0].correct_on_first_try);
        assert!(attempts[1].completed && !attempts[1].correct_on_first_try);
    }

    #[test]
    fn fresh_book_accepts_identity() {
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::new(500, 100));
        assert!(book.is_fresh());
        book.set_identity("Ferris", "F");
        assert_eq!(book.record().profile.name, "Ferris");
        assert_eq!(book.record().profile.next_level_xp, 500);
    }
}
