//! Error types for the `codequest-catalog` crate.

use codequest_types::Technology;

/// Errors raised while loading, validating or querying a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A catalog file could not be read from disk.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A catalog file is not valid YAML or does not match the catalog shape.
    #[error("failed to parse {technology} catalog: {source}")]
    Yaml {
        /// Track being parsed.
        technology: Technology,
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// A file named for one technology declares another.
    #[error("catalog file for {expected} declares technology {found}")]
    TechnologyMismatch {
        /// Technology implied by the file name.
        expected: Technology,
        /// Technology written in the file.
        found: Technology,
    },

    /// The catalog has no track for the technology.
    #[error("no {0} track in catalog")]
    TrackNotFound(Technology),

    /// A track declares no levels.
    #[error("{0} track has no levels")]
    EmptyTrack(Technology),

    /// Level ids are not the dense sequence `1..=N`.
    #[error("{technology} level at position {position} has id {found}")]
    NonDenseIds {
        /// Track being validated.
        technology: Technology,
        /// Expected 1-based position.
        position: u32,
        /// Id actually found at that position.
        found: u32,
    },

    /// A level has no usable solution.
    #[error("{technology} level {level} has no non-blank solution")]
    NoSolution {
        /// Track being validated.
        technology: Technology,
        /// Offending level id.
        level: u32,
    },

    /// A level awards no XP.
    #[error("{technology} level {level} has a zero xp reward")]
    ZeroXp {
        /// Track being validated.
        technology: Technology,
        /// Offending level id.
        level: u32,
    },

    /// A level's environment belongs to another technology.
    #[error("{technology} level {level} has a {found} environment")]
    EnvironmentMismatch {
        /// Track being validated.
        technology: Technology,
        /// Offending level id.
        level: u32,
        /// Technology the environment snapshot belongs to.
        found: Technology,
    },

    /// Two achievements share an id.
    #[error("duplicate achievement id: {0}")]
    DuplicateAchievement(String),

    /// A requested level index is outside `[1, count]`.
    #[error("{technology} has no level {index} (track has {count})")]
    LevelNotFound {
        /// Track queried.
        technology: Technology,
        /// Requested 1-based index.
        index: u32,
        /// Number of levels in the track.
        count: usize,
    },
}
