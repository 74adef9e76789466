//! The read-only level registry, keyed by technology.

use std::collections::BTreeMap;
use std::path::Path;

use codequest_types::{Level, LevelId, Technology};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::track::{RawTrack, Track};

const SQL_YAML: &str = include_str!("../catalog/sql.yaml");
const LINUX_YAML: &str = include_str!("../catalog/linux.yaml");
const CSS_YAML: &str = include_str!("../catalog/css.yaml");
const DOCKER_YAML: &str = include_str!("../catalog/docker.yaml");

/// Embedded catalog source for `technology`.
const fn builtin_source(technology: Technology) -> &'static str {
    match technology {
        Technology::Sql => SQL_YAML,
        Technology::Linux => LINUX_YAML,
        Technology::Css => CSS_YAML,
        Technology::Docker => DOCKER_YAML,
    }
}

/// Every track the application knows, loaded once at startup.
///
/// Levels are never mutated after load. Sessions borrow a [`Track`] rather
/// than reaching for process-wide level data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tracks: BTreeMap<Technology, Track>,
}

impl Catalog {
    /// Load the four tracks compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let tracks = Technology::ALL
            .into_iter()
            .map(|tech| RawTrack::parse(tech, builtin_source(tech))?.into_track())
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = Self::from_tracks(tracks);
        info!(levels = catalog.total_levels(), "loaded builtin catalog");
        Ok(catalog)
    }

    /// Load `<technology>.yaml` files from `dir`.
    ///
    /// Technologies without a file in `dir` fall back to the builtin track.
    pub fn from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut tracks = Vec::with_capacity(Technology::ALL.len());
        for tech in Technology::ALL {
            let path = dir.join(format!("{}.yaml", tech.key()));
            let source = if path.is_file() {
                debug!(technology = %tech, path = %path.display(), "loading catalog file");
                std::fs::read_to_string(&path)?
            } else {
                debug!(technology = %tech, "no catalog file, using builtin track");
                builtin_source(tech).to_owned()
            };
            tracks.push(RawTrack::parse(tech, &source)?.into_track()?);
        }
        let catalog = Self::from_tracks(tracks);
        info!(
            dir = %dir.display(),
            levels = catalog.total_levels(),
            "loaded catalog directory"
        );
        Ok(catalog)
    }

    /// Build a registry from already-validated tracks.
    ///
    /// A later track for the same technology replaces an earlier one.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        Self {
            tracks: tracks.into_iter().map(|t| (t.technology(), t)).collect(),
        }
    }

    /// The track for `technology`.
    pub fn track(&self, technology: Technology) -> Result<&Track, CatalogError> {
        self.tracks
            .get(&technology)
            .ok_or(CatalogError::TrackNotFound(technology))
    }

    /// Level `index` (1-based) of `technology`.
    pub fn get_level(&self, technology: Technology, index: u32) -> Result<&Level, CatalogError> {
        match self.tracks.get(&technology) {
            Some(track) => track.level(LevelId(index)),
            None => Err(CatalogError::LevelNotFound {
                technology,
                index,
                count: 0,
            }),
        }
    }

    /// Number of levels in `technology`; zero when the track is absent.
    pub fn count(&self, technology: Technology) -> usize {
        self.tracks.get(&technology).map_or(0, Track::count)
    }

    /// Technologies present, in home-screen order.
    pub fn technologies(&self) -> impl Iterator<Item = Technology> + '_ {
        self.tracks.keys().copied()
    }

    /// Levels across every track.
    pub fn total_levels(&self) -> usize {
        self.tracks.values().map(Track::count).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_counts_match_tracks() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.count(Technology::Sql), 10);
        assert_eq!(catalog.count(Technology::Linux), 15);
        assert_eq!(catalog.count(Technology::Css), 15);
        assert_eq!(catalog.count(Technology::Docker), 15);
        assert_eq!(catalog.total_levels(), 55);
    }

    #[test]
    fn get_level_rejects_out_of_range() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.get_level(Technology::Sql, 1).is_ok());
        assert!(catalog.get_level(Technology::Sql, 10).is_ok());
        assert!(matches!(
            catalog.get_level(Technology::Sql, 0),
            Err(CatalogError::LevelNotFound { index: 0, count: 10, .. })
        ));
        assert!(matches!(
            catalog.get_level(Technology::Sql, 11),
            Err(CatalogError::LevelNotFound { index: 11, .. })
        ));
    }

    #[test]
    fn docker_level_two_accepts_run_command() {
        let catalog = Catalog::builtin().unwrap();
        let level = catalog.get_level(Technology::Docker, 2).unwrap();
        assert!(
            level
                .solutions
                .iter()
                .any(|s| s == "docker run -d --name web -p 8080:80 nginx")
        );
    }

    #[test]
    fn achievement_ids_are_unique_across_tracks() {
        let catalog = Catalog::builtin().unwrap();
        let mut ids: Vec<&str> = Technology::ALL
            .into_iter()
            .flat_map(|t| catalog.track(t).unwrap().achievements())
            .map(|a| a.id.as_str())
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn empty_registry_reports_missing_track() {
        let catalog = Catalog::from_tracks(Vec::new());
        assert_eq!(catalog.count(Technology::Css), 0);
        assert!(matches!(
            catalog.track(Technology::Css),
            Err(CatalogError::TrackNotFound(Technology::Css))
        ));
    }
}
