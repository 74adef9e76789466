//! Read-only views over a [`ProgressRecord`] for the dashboard screen.

use codequest_catalog::Catalog;
use codequest_types::{Achievement, ProgressRecord, Technology, UnlockedAchievement};

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Levels completed across every technology.
    pub challenges_completed: usize,
    /// Levels in the whole catalog.
    pub challenges_total: usize,
    /// Technologies whose every level is completed.
    pub skills_mastered: usize,
    /// Player level.
    pub level: u32,
    /// XP into the current player level.
    pub current_xp: u32,
    /// XP needed to leave the current player level.
    pub next_level_xp: u32,
    /// Lifetime XP.
    pub total_xp: u64,
    /// Current streak in days.
    pub streak: u32,
    /// Best streak in days.
    pub longest_streak: u32,
    /// Achievements unlocked.
    pub achievements_unlocked: usize,
    /// Achievements declared by the catalog.
    pub achievements_total: usize,
}

/// Completion of one technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillProgress {
    /// Technology.
    pub technology: Technology,
    /// Levels completed.
    pub completed: usize,
    /// Levels in the track.
    pub total: usize,
    /// Whole-number percentage, `0..=100`.
    pub percent: u8,
}

impl SkillProgress {
    /// Every level of the track is completed.
    pub const fn is_mastered(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// A fixed leaderboard competitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rival {
    /// Display name.
    pub name: String,
    /// Short avatar text.
    pub avatar: String,
    /// Lifetime XP.
    pub total_xp: u64,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Display name.
    pub name: String,
    /// Short avatar text.
    pub avatar: String,
    /// Lifetime XP.
    pub total_xp: u64,
    /// The row is the local player.
    pub is_player: bool,
}

/// Per-technology completion in catalog order.
pub fn skill_progress(record: &ProgressRecord, catalog: &Catalog) -> Vec<SkillProgress> {
    catalog
        .technologies()
        .map(|technology| {
            let total = catalog.count(technology);
            let completed = catalog.track(technology).map_or(0, |track| {
                let done = record.completed(technology);
                track.levels().iter().filter(|l| done.contains(l.id)).count()
            });
            SkillProgress {
                technology,
                completed,
                total,
                percent: percent(completed, total),
            }
        })
        .collect()
}

/// Headline numbers for the dashboard.
pub fn stats(record: &ProgressRecord, catalog: &Catalog) -> DashboardStats {
    let skills = skill_progress(record, catalog);
    let achievements_total = catalog
        .technologies()
        .filter_map(|t| catalog.track(t).ok())
        .map(|t| t.achievements().len())
        .sum();
    DashboardStats {
        challenges_completed: skills.iter().map(|s| s.completed).sum(),
        challenges_total: catalog.total_levels(),
        skills_mastered: skills.iter().filter(|s| s.is_mastered()).count(),
        level: record.profile.level,
        current_xp: record.profile.current_xp,
        next_level_xp: record.profile.next_level_xp,
        total_xp: record.profile.total_xp,
        streak: record.streak.current,
        longest_streak: record.streak.longest,
        achievements_unlocked: record.achievements.len(),
        achievements_total,
    }
}

/// Unlocked achievements with their definitions, most recent first.
///
/// Unlocks whose definition is no longer in the catalog are skipped.
pub fn unlocked_achievements<'a>(
    record: &'a ProgressRecord,
    catalog: &'a Catalog,
) -> Vec<(&'a Achievement, &'a UnlockedAchievement)> {
    let mut unlocked: Vec<_> = record
        .achievements
        .iter()
        .filter_map(|u| {
            let track = catalog.track(u.technology).ok()?;
            let definition = track.achievements().iter().find(|a| a.id == u.id)?;
            Some((definition, u))
        })
        .collect();
    unlocked.sort_by(|a, b| b.1.unlocked_at.cmp(&a.1.unlocked_at));
    unlocked
}

/// The player ranked among `rivals` by lifetime XP.
///
/// Ties keep the player above the rival.
pub fn leaderboard(record: &ProgressRecord, rivals: &[Rival]) -> Vec<LeaderboardEntry> {
    let player = LeaderboardEntry {
        rank: 0,
        name: record.profile.name.clone(),
        avatar: record.profile.avatar.clone(),
        total_xp: record.profile.total_xp,
        is_player: true,
    };
    let mut entries: Vec<LeaderboardEntry> = std::iter::once(player)
        .chain(rivals.iter().map(|r| LeaderboardEntry {
            rank: 0,
            name: r.name.clone(),
            avatar: r.avatar.clone(),
            total_xp: r.total_xp,
            is_player: false,
        }))
        .collect();
    entries.sort_by(|a, b| b.total_xp.cmp(&a.total_xp));
    for (rank, entry) in (1_usize..).zip(entries.iter_mut()) {
        entry.rank = rank;
    }
    entries
}

fn percent(completed: usize, total: usize) -> u8 {
    completed
        .saturating_mul(100)
        .checked_div(total)
        .and_then(|p| u8::try_from(p.min(100)).ok())
        .unwrap_or(0)
}
