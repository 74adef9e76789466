//! Level definitions and the simulated environments they start from.
//!
//! A [`Level`] is immutable once loaded into a catalog. Its
//! [`EnvironmentSnapshot`] is the state the world simulator is seeded with
//! every time the level is entered or reset.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ContainerStatus, Difficulty, EntryKind, Technology};
use crate::ids::LevelId;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// One scripted challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Level {
    /// Dense 1-based position in the track.
    pub id: LevelId,
    /// Short title shown in the level header.
    pub title: String,
    /// What the learner is asked to do.
    pub task: String,
    /// Hint revealed on request.
    pub hint: String,
    /// Background explanation revealed on request.
    pub concept: String,
    /// Accepted answers. Never empty once validated by the catalog.
    pub solutions: Vec<String>,
    /// Intended difficulty.
    pub difficulty: Difficulty,
    /// Topic grouping (e.g. `WHERE`, `Containers`), used by achievements.
    pub category: String,
    /// XP granted the first time the level is completed.
    pub xp_reward: u32,
    /// Starting state of the world simulator.
    pub environment: EnvironmentSnapshot,
}

// ---------------------------------------------------------------------------
// Environment snapshots
// ---------------------------------------------------------------------------

/// Technology-specific starting state for a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EnvironmentSnapshot {
    /// A single database table.
    Table(TableSnapshot),
    /// A working directory listing.
    FileSystem(FileSystemSnapshot),
    /// A preview element and the rules applied to it.
    Stylesheet(StylesheetSnapshot),
    /// Local container engine state.
    Registry(RegistrySnapshot),
}

impl EnvironmentSnapshot {
    /// The technology whose simulator understands this snapshot.
    pub const fn technology(&self) -> Technology {
        match self {
            Self::Table(_) => Technology::Sql,
            Self::FileSystem(_) => Technology::Linux,
            Self::Stylesheet(_) => Technology::Css,
            Self::Registry(_) => Technology::Docker,
        }
    }
}

/// A value in a table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum Cell {
    /// Whole number.
    Integer(i64),
    /// Free text.
    Text(String),
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Rows of one table, column order preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TableSnapshot {
    /// Table name used in `FROM` clauses.
    #[serde(default = "default_table_name")]
    pub name: String,
    /// Column names, in display order.
    pub columns: Vec<String>,
    /// Row values, one per column.
    pub rows: Vec<Vec<Cell>>,
}

fn default_table_name() -> String {
    "employees".to_owned()
}

/// One entry in a simulated directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FileEntry {
    /// Entry name without a path.
    pub name: String,
    /// File or folder.
    pub kind: EntryKind,
    /// `ls -l` style permission string, e.g. `-rw-r--r--`.
    pub permissions: String,
    /// Size in bytes.
    pub size: u64,
}

/// Current directory and its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FileSystemSnapshot {
    /// Absolute path of the working directory.
    pub current_path: String,
    /// Entries of the working directory.
    #[serde(default)]
    pub entries: Vec<FileEntry>,
}

/// A `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Declaration {
    /// Property name, e.g. `color`.
    pub property: String,
    /// Property value, e.g. `purple`.
    pub value: String,
}

/// A selector and its declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StyleRule {
    /// Enclosing at-rule (`@media …`, `@keyframes …`), if any.
    #[serde(default)]
    pub context: Option<String>,
    /// Selector text, e.g. `.box` or `from`.
    pub selector: String,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// The element being styled and the stylesheet applied to it so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StylesheetSnapshot {
    /// Description of the preview element, e.g. `h1 "Hello CodeQuest!"`.
    pub element: String,
    /// Rules already in effect.
    #[serde(default)]
    pub rules: Vec<StyleRule>,
}

/// A simulated container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Image reference, `name:tag`.
    pub image: String,
    /// Running or exited.
    pub status: ContainerStatus,
    /// Published ports, empty when none.
    #[serde(default)]
    pub ports: String,
}

/// A simulated local image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Image {
    /// Repository name.
    pub name: String,
    /// Tag.
    pub tag: String,
    /// Human-readable size, e.g. `133MB`.
    pub size: String,
}

impl Image {
    /// `name:tag` reference.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

/// Containers, images, volumes and networks known to the local engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegistrySnapshot {
    /// Containers, running or exited.
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Locally available images.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Named volumes.
    #[serde(default)]
    pub volumes: Vec<String>,
    /// User-defined networks.
    #[serde(default)]
    pub networks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Learning materials
// ---------------------------------------------------------------------------

/// A short reading that accompanies a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LearningMaterial {
    /// Stable identifier, e.g. `sql-learn-001`.
    pub id: String,
    /// Heading.
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// Body text.
    pub content: String,
    /// Topic grouping, matching level categories where one exists.
    pub category: String,
    /// Intended reader level.
    pub difficulty: Difficulty,
    /// Ids of materials to read first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_its_technology() {
        let snap = EnvironmentSnapshot::Registry(RegistrySnapshot::default());
        assert_eq!(snap.technology(), Technology::Docker);
    }

    #[test]
    fn table_snapshot_defaults_name() {
        let json = r#"{"kind":"table","columns":["id"],"rows":[[1]]}"#;
        let snap: Result<EnvironmentSnapshot, _> = serde_json::from_str(json);
        assert!(matches!(
            snap,
            Ok(EnvironmentSnapshot::Table(TableSnapshot { ref name, .. })) if name == "employees"
        ));
    }

    #[test]
    fn cells_accept_numbers_and_text() {
        let row: Vec<Cell> = serde_json::from_str(r#"[1, "Alice", 75000]"#).unwrap_or_default();
        assert_eq!(
            row,
            vec![
                Cell::Integer(1),
                Cell::Text("Alice".to_owned()),
                Cell::Integer(75_000)
            ]
        );
    }
}
