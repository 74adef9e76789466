//! World-state simulators: the cosmetic environment shown beside the input.
//!
//! Each technology has a small tagged command set produced by a best-effort
//! tokenizer, and an exhaustive dispatch that applies a command to the
//! world. The simulator never decides whether an answer is correct, and
//! unrecognized input is reported as transcript text rather than an error.
//!
//! # Modules
//!
//! - [`sql`] -- A single table that answers `SELECT` and `INSERT`
//! - [`linux`] -- A directory tree and a handful of shell commands
//! - [`css`] -- A stylesheet applied to one preview element
//! - [`docker`] -- Containers, images, volumes and networks

pub mod css;
pub mod docker;
pub mod linux;
pub mod sql;

use codequest_types::{EnvironmentSnapshot, Technology};
use tracing::debug;

pub use css::StylesheetWorld;
pub use docker::RegistryWorld;
pub use linux::FileSystemWorld;
pub use sql::TableWorld;

/// Result of applying one line of input to a world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Transcript shown to the learner. May be empty.
    pub display: String,
    /// Whether the world changed.
    pub mutated: bool,
}

impl CommandOutcome {
    /// Output from a command that left the world unchanged.
    pub fn output(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            mutated: false,
        }
    }

    /// Output from a command that changed the world.
    pub fn changed(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            mutated: true,
        }
    }
}

/// A mutable simulated environment for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum World {
    /// SQL table.
    Table(TableWorld),
    /// Linux directory tree.
    FileSystem(FileSystemWorld),
    /// CSS preview.
    Stylesheet(StylesheetWorld),
    /// Docker engine state.
    Registry(RegistryWorld),
}

impl World {
    /// Build a fresh world from a level's snapshot.
    pub fn from_snapshot(snapshot: &EnvironmentSnapshot) -> Self {
        match snapshot {
            EnvironmentSnapshot::Table(s) => Self::Table(TableWorld::new(s)),
            EnvironmentSnapshot::FileSystem(s) => Self::FileSystem(FileSystemWorld::new(s)),
            EnvironmentSnapshot::Stylesheet(s) => Self::Stylesheet(StylesheetWorld::new(s)),
            EnvironmentSnapshot::Registry(s) => Self::Registry(RegistryWorld::new(s)),
        }
    }

    /// Apply one line of input.
    pub fn apply(&mut self, input: &str) -> CommandOutcome {
        let outcome = match self {
            Self::Table(w) => w.apply(input),
            Self::FileSystem(w) => w.apply(input),
            Self::Stylesheet(w) => w.apply(input),
            Self::Registry(w) => w.apply(input),
        };
        debug!(
            technology = %self.technology(),
            mutated = outcome.mutated,
            "simulator applied command"
        );
        outcome
    }

    /// Which technology this world simulates.
    pub const fn technology(&self) -> Technology {
        match self {
            Self::Table(_) => Technology::Sql,
            Self::FileSystem(_) => Technology::Linux,
            Self::Stylesheet(_) => Technology::Css,
            Self::Registry(_) => Technology::Docker,
        }
    }

    /// Current state as a snapshot, for display.
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        match self {
            Self::Table(w) => EnvironmentSnapshot::Table(w.snapshot()),
            Self::FileSystem(w) => EnvironmentSnapshot::FileSystem(w.snapshot()),
            Self::Stylesheet(w) => EnvironmentSnapshot::Stylesheet(w.snapshot()),
            Self::Registry(w) => EnvironmentSnapshot::Registry(w.snapshot()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Split a command line into words.
///
/// Single and double quotes group words and are removed. A leading `sudo`
/// is dropped. Unterminated quotes run to the end of the line.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }

    if words.first().is_some_and(|w| w == "sudo") {
        words.remove(0);
    }
    words
}

/// Strip a leading `./` from a path argument.
pub fn strip_dot_slash(arg: &str) -> &str {
    arg.strip_prefix("./").unwrap_or(arg)
}
