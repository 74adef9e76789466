//! One technology's levels, materials and achievements.
//!
//! Catalog files are deserialized into [`RawTrack`] first and then validated
//! into a [`Track`]. Only validated tracks are ever handed to callers.

use std::collections::BTreeSet;

use codequest_types::{
    Achievement, Difficulty, EnvironmentSnapshot, LearningMaterial, Level, LevelId, Technology,
};
use serde::Deserialize;

use crate::error::CatalogError;

/// A validated, read-only track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    technology: Technology,
    levels: Vec<Level>,
    materials: Vec<LearningMaterial>,
    achievements: Vec<Achievement>,
}

impl Track {
    /// Validate the parts of a track.
    ///
    /// Level ids must run `1..=N` in order, every level needs at least one
    /// non-blank solution, a positive XP reward and an environment of the
    /// track's technology. Achievement ids must be unique.
    pub fn new(
        technology: Technology,
        levels: Vec<Level>,
        materials: Vec<LearningMaterial>,
        achievements: Vec<Achievement>,
    ) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::EmptyTrack(technology));
        }

        let mut expected = LevelId::FIRST;
        for level in &levels {
            if level.id != expected {
                return Err(CatalogError::NonDenseIds {
                    technology,
                    position: expected.get(),
                    found: level.id.get(),
                });
            }
            validate_level(technology, level)?;
            expected = expected.next().unwrap_or(expected);
        }

        let mut seen = BTreeSet::new();
        for achievement in &achievements {
            if !seen.insert(achievement.id.as_str()) {
                return Err(CatalogError::DuplicateAchievement(achievement.id.clone()));
            }
        }

        Ok(Self {
            technology,
            levels,
            materials,
            achievements,
        })
    }

    /// The technology this track teaches.
    pub const fn technology(&self) -> Technology {
        self.technology
    }

    /// Levels in order; `levels()[i]` has id `i + 1`.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of levels.
    pub fn count(&self) -> usize {
        self.levels.len()
    }

    /// Level with the given 1-based id.
    pub fn level(&self, id: LevelId) -> Result<&Level, CatalogError> {
        id.index()
            .and_then(|i| self.levels.get(i))
            .ok_or(CatalogError::LevelNotFound {
                technology: self.technology,
                index: id.get(),
                count: self.levels.len(),
            })
    }

    /// Id of the last level.
    pub fn last_id(&self) -> LevelId {
        self.levels.last().map_or(LevelId::FIRST, |l| l.id)
    }

    /// Accompanying reading material.
    pub fn materials(&self) -> &[LearningMaterial] {
        &self.materials
    }

    /// Achievements declared for this track.
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// Levels belonging to `category`.
    pub fn levels_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Level> {
        self.levels.iter().filter(move |l| l.category == category)
    }

    /// Sum of every level's XP reward.
    pub fn total_xp(&self) -> u64 {
        self.levels.iter().map(|l| u64::from(l.xp_reward)).sum()
    }
}

fn validate_level(technology: Technology, level: &Level) -> Result<(), CatalogError> {
    let id = level.id.get();
    if !level.solutions.iter().any(|s| !s.trim().is_empty()) {
        return Err(CatalogError::NoSolution {
            technology,
            level: id,
        });
    }
    if level.xp_reward == 0 {
        return Err(CatalogError::ZeroXp {
            technology,
            level: id,
        });
    }
    let found = level.environment.technology();
    if found != technology {
        return Err(CatalogError::EnvironmentMismatch {
            technology,
            level: id,
            found,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File shape
// ---------------------------------------------------------------------------

/// A catalog file as written on disk.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTrack {
    pub technology: Technology,
    pub levels: Vec<RawLevel>,
    #[serde(default)]
    pub materials: Vec<LearningMaterial>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// A level as written on disk; `solution` may be one string or a list.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLevel {
    id: u32,
    title: String,
    task: String,
    hint: String,
    concept: String,
    solution: OneOrMany,
    difficulty: Difficulty,
    category: String,
    xp_reward: u32,
    environment: EnvironmentSnapshot,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<RawLevel> for Level {
    fn from(raw: RawLevel) -> Self {
        let solutions = match raw.solution {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        };
        Self {
            id: LevelId(raw.id),
            title: raw.title,
            task: raw.task,
            hint: raw.hint,
            concept: raw.concept,
            solutions,
            difficulty: raw.difficulty,
            category: raw.category,
            xp_reward: raw.xp_reward,
            environment: raw.environment,
        }
    }
}

impl RawTrack {
    /// Parse a catalog file that is expected to describe `expected`.
    pub(crate) fn parse(expected: Technology, yaml: &str) -> Result<Self, CatalogError> {
        let raw: Self = serde_yml::from_str(yaml).map_err(|source| CatalogError::Yaml {
            technology: expected,
            source,
        })?;
        if raw.technology != expected {
            return Err(CatalogError::TechnologyMismatch {
                expected,
                found: raw.technology,
            });
        }
        Ok(raw)
    }

    /// Validate into a [`Track`].
    pub(crate) fn into_track(self) -> Result<Track, CatalogError> {
        let levels = self.levels.into_iter().map(Level::from).collect();
        Track::new(self.technology, levels, self.materials, self.achievements)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codequest_types::{RegistrySnapshot, TableSnapshot};

    use super::*;

    fn table_level(id: u32) -> Level {
        Level {
            id: LevelId(id),
            title: format!("Level {id}"),
            task: "task".to_owned(),
            hint: "hint".to_owned(),
            concept: "concept".to_owned(),
            solutions: vec!["SELECT * FROM employees".to_owned()],
            difficulty: Difficulty::Beginner,
            category: "SELECT".to_owned(),
            xp_reward: 100,
            environment: EnvironmentSnapshot::Table(TableSnapshot {
                name: "employees".to_owned(),
                columns: vec!["id".to_owned()],
                rows: Vec::new(),
            }),
        }
    }

    #[test]
    fn accepts_dense_ids() {
        let track = Track::new(
            Technology::Sql,
            vec![table_level(1), table_level(2)],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(track.count(), 2);
        assert_eq!(track.last_id(), LevelId(2));
        assert_eq!(track.total_xp(), 200);
    }

    #[test]
    fn rejects_gap_in_ids() {
        let result = Track::new(
            Technology::Sql,
            vec![table_level(1), table_level(3)],
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(CatalogError::NonDenseIds { position: 2, found: 3, .. })
        ));
    }

    #[test]
    fn rejects_empty_track() {
        let result = Track::new(Technology::Css, Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(CatalogError::EmptyTrack(Technology::Css))));
    }

    #[test]
    fn rejects_blank_solutions() {
        let mut level = table_level(1);
        level.solutions = vec!["   ".to_owned()];
        let result = Track::new(Technology::Sql, vec![level], Vec::new(), Vec::new());
        assert!(matches!(result, Err(CatalogError::NoSolution { level: 1, .. })));
    }

    #[test]
    fn rejects_zero_xp() {
        let mut level = table_level(1);
        level.xp_reward = 0;
        let result = Track::new(Technology::Sql, vec![level], Vec::new(), Vec::new());
        assert!(matches!(result, Err(CatalogError::ZeroXp { .. })));
    }

    #[test]
    fn rejects_foreign_environment() {
        let mut level = table_level(1);
        level.environment = EnvironmentSnapshot::Registry(RegistrySnapshot::default());
        let result = Track::new(Technology::Sql, vec![level], Vec::new(), Vec::new());
        assert!(matches!(
            result,
            Err(CatalogError::EnvironmentMismatch { found: Technology::Docker, .. })
        ));
    }

    #[test]
    fn level_lookup_is_one_based() {
        let track = Track::new(Technology::Sql, vec![table_level(1)], Vec::new(), Vec::new())
            .unwrap();
        assert_eq!(track.level(LevelId(1)).unwrap().id, LevelId(1));
        assert!(matches!(
            track.level(LevelId(0)),
            Err(CatalogError::LevelNotFound { index: 0, count: 1, .. })
        ));
        assert!(track.level(LevelId(2)).is_err());
    }

    #[test]
    fn solution_may_be_a_single_string() {
        let yaml = r"
technology: sql
levels:
  - id: 1
    title: t
    task: t
    hint: h
    concept: c
    solution: SELECT 1
    difficulty: beginner
    category: SELECT
    xp_reward: 10
    environment: { kind: table, columns: [id], rows: [[1]] }
";
        let track = RawTrack::parse(Technology::Sql, yaml)
            .and_then(RawTrack::into_track)
            .unwrap();
        assert_eq!(track.levels()[0].solutions, vec!["SELECT 1".to_owned()]);
    }

    #[test]
    fn file_must_declare_expected_technology() {
        let yaml = "technology: css\nlevels: []\n";
        assert!(matches!(
            RawTrack::parse(Technology::Sql, yaml),
            Err(CatalogError::TechnologyMismatch { found: Technology::Css, .. })
        ));
    }
}
