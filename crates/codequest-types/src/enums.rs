//! Enumeration types shared across the CodeQuest workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Technology tracks
// ---------------------------------------------------------------------------

/// One of the four tutorial tracks.
///
/// Each technology owns its own level catalog and its own shape of
/// simulated environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Technology {
    /// Database queries against a single `employees` table.
    Sql,
    /// Shell commands against a small home-directory filesystem.
    Linux,
    /// Style rules applied to a preview element.
    Css,
    /// Container, image, volume and network management.
    Docker,
}

impl Technology {
    /// Every technology, in the order the home screen lists them.
    pub const ALL: [Self; 4] = [Self::Sql, Self::Linux, Self::Css, Self::Docker];

    /// Lowercase key used in storage documents and catalog file names.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Linux => "linux",
            Self::Css => "css",
            Self::Docker => "docker",
        }
    }

    /// Human-readable track name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sql => "SQL Mastery",
            Self::Linux => "Linux Command Line",
            Self::Css => "CSS Wizardry",
            Self::Docker => "Docker Containers",
        }
    }

    /// Icon glyph shown next to the track name.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Sql => "🗄️",
            Self::Linux => "💻",
            Self::Css => "🎨",
            Self::Docker => "🐳",
        }
    }

    /// What the input box is called for this track.
    pub const fn input_label(self) -> &'static str {
        match self {
            Self::Sql => "SQL Editor",
            Self::Linux => "Terminal",
            Self::Css => "CSS Editor",
            Self::Docker => "Docker CLI",
        }
    }
}

impl core::fmt::Display for Technology {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when text does not name a known technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTechnology(pub String);

impl core::fmt::Display for UnknownTechnology {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown technology: {}", self.0)
    }
}

impl std::error::Error for UnknownTechnology {}

impl core::str::FromStr for Technology {
    type Err = UnknownTechnology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "linux" | "shell" => Ok(Self::Linux),
            "css" => Ok(Self::Css),
            "docker" => Ok(Self::Docker),
            other => Err(UnknownTechnology(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Level metadata
// ---------------------------------------------------------------------------

/// How hard a level is meant to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Difficulty {
    /// First contact with a concept.
    Beginner,
    /// Combines concepts or uses less common flags.
    Intermediate,
    /// Multi-part constructs.
    Advanced,
}

impl core::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Simulated environment enums
// ---------------------------------------------------------------------------

/// Kind of a simulated filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Folder,
}

/// Lifecycle status of a simulated container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ContainerStatus {
    /// Container is up.
    Running,
    /// Container has stopped.
    Exited,
}

impl core::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Exited => f.write_str("exited"),
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Inline feedback shown under the input box after a submission.
///
/// Absence of feedback is represented as `Option::None` by holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Feedback {
    /// The submission matched an accepted solution.
    Success(String),
    /// The submission was rejected.
    Error(String),
}

impl Feedback {
    /// Whether this is a success message.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technology_parses_case_insensitively() {
        assert_eq!("SQL".parse::<Technology>(), Ok(Technology::Sql));
        assert_eq!(" docker ".parse::<Technology>(), Ok(Technology::Docker));
        assert!("cobol".parse::<Technology>().is_err());
    }

    #[test]
    fn technology_key_round_trips_through_serde() {
        for tech in Technology::ALL {
            let json = serde_json::to_string(&tech).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", tech.key()));
        }
    }

    #[test]
    fn feedback_serializes_adjacently_tagged() {
        let fb = Feedback::Error("nope".to_owned());
        let json = serde_json::to_value(&fb).unwrap_or_default();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
        assert!(!fb.is_success());
    }
}
