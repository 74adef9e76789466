//! Plain-text views for the terminal.
//!
//! Every function here is pure: it takes state and returns the text to
//! print. The shell decides when to print it.

use codequest_catalog::{Catalog, Track};
use codequest_engine::simulator::css::format_rule;
use codequest_engine::simulator::sql::render_table;
use codequest_engine::{Phase, Session, TranscriptEntry};
use codequest_progress::dashboard::{self, LeaderboardEntry};
use codequest_progress::{CompletionReport, Rival};
use codequest_types::{
    EntryKind, EnvironmentSnapshot, Feedback, FileSystemSnapshot, ProgressRecord,
    RegistrySnapshot, StylesheetSnapshot, Technology,
};

/// Width of the XP bar in cells.
const BAR_WIDTH: u32 = 20;

/// Level buttons per row in the level selector.
const GRID_COLUMNS: usize = 5;

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

/// The home dashboard.
pub fn home(record: &ProgressRecord, catalog: &Catalog, rivals: &[Rival]) -> String {
    let stats = dashboard::stats(record, catalog);
    let profile = &record.profile;
    let mut lines = vec![
        "══════════════ CodeQuest ══════════════".to_owned(),
        format!(
            "{} ({}) · Level {} · {}/{} XP {}",
            profile.name,
            profile.avatar,
            stats.level,
            stats.current_xp,
            stats.next_level_xp,
            xp_bar(stats.current_xp, stats.next_level_xp),
        ),
        format!(
            "🔥 Streak {} (best {}) · {} XP total",
            days(stats.streak),
            stats.longest_streak,
            stats.total_xp
        ),
        format!(
            "Challenges {}/{} · Skills mastered {}/{} · Achievements {}/{}",
            stats.challenges_completed,
            stats.challenges_total,
            stats.skills_mastered,
            catalog.technologies().count(),
            stats.achievements_unlocked,
            stats.achievements_total,
        ),
        String::new(),
        "Tracks".to_owned(),
    ];

    for (number, skill) in (1_usize..).zip(dashboard::skill_progress(record, catalog)) {
        let mark = if skill.is_mastered() { " ✓" } else { "" };
        lines.push(format!(
            "  {number}. {} {:<20} {:>3}/{:<3} {:>3}%{mark}",
            skill.technology.icon(),
            skill.technology.display_name(),
            skill.completed,
            skill.total,
            skill.percent,
        ));
    }

    let unlocked = dashboard::unlocked_achievements(record, catalog);
    if !unlocked.is_empty() {
        lines.push(String::new());
        lines.push("Achievements".to_owned());
        for (achievement, _) in unlocked {
            lines.push(format!(
                "  {} {}: {}",
                achievement.emoji, achievement.name, achievement.description
            ));
        }
    }

    lines.push(String::new());
    lines.push("Leaderboard".to_owned());
    lines.extend(dashboard::leaderboard(record, rivals).iter().map(leaderboard_row));

    lines.push(String::new());
    lines.push(
        "Pick a track by name or number, `:learn <track>` to read up, `:quit` to leave.".to_owned(),
    );
    lines.push(prompt("home"));
    lines.join("\n")
}

fn leaderboard_row(entry: &LeaderboardEntry) -> String {
    let marker = if entry.is_player { "▶" } else { " " };
    format!(
        "  {marker}{}. {} ({}) {} XP",
        entry.rank, entry.name, entry.avatar, entry.total_xp
    )
}

/// `[████░░░░]` filled in proportion to `current / next`.
pub fn xp_bar(current: u32, next: u32) -> String {
    let filled = current
        .saturating_mul(BAR_WIDTH)
        .checked_div(next)
        .unwrap_or(0)
        .min(BAR_WIDTH);
    let empty = BAR_WIDTH.saturating_sub(filled);
    format!(
        "[{}{}]",
        "█".repeat(usize::try_from(filled).unwrap_or(0)),
        "░".repeat(usize::try_from(empty).unwrap_or(0))
    )
}

fn days(n: u32) -> String {
    if n == 1 {
        "1 day".to_owned()
    } else {
        format!("{n} days")
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// The current level: header, task, environment and revealed notes.
pub fn level(session: &Session) -> String {
    let level = session.level();
    let technology = session.technology();
    let mut lines = vec![
        format!(
            "{} {} · Level {}/{} · {} · {} · +{} XP",
            technology.icon(),
            technology.display_name(),
            level.id,
            session.track().count(),
            level.difficulty,
            level.category,
            level.xp_reward,
        ),
        format!("▸ {}", level.title),
        level.task.clone(),
        String::new(),
        environment(&session.environment()),
    ];
    if session.hint_visible() {
        lines.push(String::new());
        lines.push(format!("💡 Hint: {}", level.hint));
    }
    if session.concept_visible() {
        lines.push(String::new());
        lines.push(format!("📘 Concept: {}", level.concept));
    }
    lines.push(String::new());
    lines.push("Meta: :hint :concept :reset :levels :level <n> :learn :back :quit".to_owned());
    lines.push(prompt(technology.input_label()));
    lines.join("\n")
}

/// A preview of a simulated environment.
pub fn environment(snapshot: &EnvironmentSnapshot) -> String {
    match snapshot {
        EnvironmentSnapshot::Table(table) => format!(
            "Table `{}`\n{}",
            table.name,
            render_table(&table.columns, &table.rows)
        ),
        EnvironmentSnapshot::FileSystem(fs) => file_system(fs),
        EnvironmentSnapshot::Stylesheet(sheet) => stylesheet(sheet),
        EnvironmentSnapshot::Registry(registry) => registry_view(registry),
    }
}

fn file_system(fs: &FileSystemSnapshot) -> String {
    let mut lines = vec![format!("📁 {}", fs.current_path)];
    for entry in &fs.entries {
        let suffix = match entry.kind {
            EntryKind::Folder => "/",
            EntryKind::File => "",
        };
        lines.push(format!(
            "  {} {:>6} {}{suffix}",
            entry.permissions, entry.size, entry.name
        ));
    }
    lines.join("\n")
}

fn stylesheet(sheet: &StylesheetSnapshot) -> String {
    let mut lines = vec![format!("Preview: {}", sheet.element)];
    if sheet.rules.is_empty() {
        lines.push("  (no styles applied)".to_owned());
    }
    lines.extend(sheet.rules.iter().map(|r| format!("  {}", format_rule(r))));
    lines.join("\n")
}

fn registry_view(registry: &RegistrySnapshot) -> String {
    let mut lines = vec!["Containers".to_owned()];
    if registry.containers.is_empty() {
        lines.push("  (none)".to_owned());
    }
    for c in &registry.containers {
        let status = c.status.to_string();
        lines.push(format!("  {:<12} {:<16} {status:<8} {}", c.name, c.image, c.ports));
    }
    lines.push("Images".to_owned());
    if registry.images.is_empty() {
        lines.push("  (none)".to_owned());
    }
    for image in &registry.images {
        lines.push(format!("  {:<28} {}", image.reference(), image.size));
    }
    if !registry.volumes.is_empty() {
        lines.push(format!("Volumes: {}", registry.volumes.join(", ")));
    }
    if !registry.networks.is_empty() {
        lines.push(format!("Networks: {}", registry.networks.join(", ")));
    }
    lines.join("\n")
}

/// Simulator output for the last submission followed by its verdict.
pub fn submission(entry: Option<&TranscriptEntry>, feedback: Option<&Feedback>) -> String {
    let mut lines = Vec::new();
    if let Some(entry) = entry.filter(|e| !e.output.display.is_empty()) {
        lines.push(entry.output.display.clone());
    }
    if let Some(feedback) = feedback {
        lines.push(feedback.message().to_owned());
    }
    lines.join("\n")
}

/// What a completion changed on the player's profile.
pub fn report(report: &CompletionReport) -> String {
    let mut lines = Vec::new();
    for achievement in &report.unlocked {
        lines.push(format!(
            "🏅 Achievement unlocked: {} {} (+{} XP)",
            achievement.emoji, achievement.name, achievement.xp_reward
        ));
    }
    if report.levels_gained > 0 {
        lines.push(format!("⬆️  Level up! You are now level {}", report.player_level));
    }
    if report.first_completion {
        lines.push(format!("🔥 Streak: {}", days(report.streak)));
    }
    lines.join("\n")
}

/// Level selector with completed and current markers.
pub fn level_grid(session: &Session) -> String {
    let current = match session.phase() {
        Phase::Presenting(id) | Phase::Celebrating { level: id, .. } => Some(id),
        Phase::Complete => None,
    };
    let cells: Vec<String> = session
        .track()
        .levels()
        .iter()
        .map(|l| {
            let mark = if Some(l.id) == current {
                '▶'
            } else if session.completed().contains(l.id) {
                '✓'
            } else {
                ' '
            };
            format!("[{mark}{:>3}]", l.id.get())
        })
        .collect();
    let mut lines = vec![format!(
        "{} levels (✓ completed, ▶ current)",
        session.technology().display_name()
    )];
    lines.extend(cells.chunks(GRID_COLUMNS).map(|row| row.join(" ")));
    lines.push("Jump with `:level <n>`.".to_owned());
    lines.join("\n")
}

/// Shown once the last level has been passed.
pub fn track_complete(session: &Session) -> String {
    format!(
        "🏆 You finished {}! `:level <n>` to replay a level, `:back` for the dashboard.",
        session.technology().display_name()
    )
}

/// The reading list for a track.
pub fn materials(track: &Track) -> String {
    let technology = track.technology();
    if track.materials().is_empty() {
        return format!("No reading material for {} yet.", technology.display_name());
    }
    let mut lines = vec![format!("📚 {} reading list", technology.display_name())];
    for material in track.materials() {
        lines.push(String::new());
        lines.push(format!(
            "• {} ({}, {})",
            material.title, material.difficulty, material.category
        ));
        lines.push(format!("  {}", material.description));
        if !material.prerequisites.is_empty() {
            lines.push(format!("  Read first: {}", material.prerequisites.join(", ")));
        }
        lines.extend(material.content.lines().map(|l| format!("  {l}")));
    }
    lines.join("\n")
}

/// The list of tracks for `:learn` with no argument at home.
pub fn learn_usage() -> String {
    let keys: Vec<&str> = Technology::ALL.iter().map(|t| t.key()).collect();
    format!("Usage: :learn <{}>", keys.join("|"))
}

fn prompt(label: &str) -> String {
    format!("{label}> ")
}
