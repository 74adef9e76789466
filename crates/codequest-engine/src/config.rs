//! Configuration loading and typed config structures for CodeQuest.
//!
//! Configuration lives in an optional `codequest.yaml`. Every section and
//! key has a default, so a missing file or an empty document both yield a
//! working setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CODEQUEST_CONFIG";

/// Environment variable overriding `storage.progress_path`.
pub const PROGRESS_PATH_ENV: &str = "CODEQUEST_PROGRESS_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Level-progression timing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Where progress is persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional custom catalog location.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Defaults for a freshly created profile.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Player level XP curve.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Entries shown alongside the player on the leaderboard.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `CODEQUEST_PROGRESS_PATH` overrides `storage.progress_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path` when given, else from `CODEQUEST_CONFIG`, else from
    /// `./codequest.yaml` if it exists, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        if let Ok(val) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&val));
        }
        let local = Path::new("codequest.yaml");
        if local.is_file() {
            return Self::from_file(local);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(PROGRESS_PATH_ENV) {
            self.storage.progress_path = PathBuf::from(val);
        }
    }
}

/// Level-progression timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Pause between an accepted answer and the next level.
    #[serde(default = "default_celebration_delay_ms")]
    pub celebration_delay_ms: u64,
}

impl SessionConfig {
    /// The celebration delay as a [`Duration`].
    pub const fn celebration_delay(&self) -> Duration {
        Duration::from_millis(self.celebration_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            celebration_delay_ms: default_celebration_delay_ms(),
        }
    }
}

/// Progress persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON progress document.
    #[serde(default = "default_progress_path")]
    pub progress_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_path: default_progress_path(),
        }
    }
}

/// Catalog location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Directory of `<technology>.yaml` files. Builtin tracks when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Defaults for a new profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileConfig {
    /// Display name.
    #[serde(default = "default_profile_name")]
    pub name: String,

    /// Avatar glyph.
    #[serde(default = "default_profile_avatar")]
    pub avatar: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            avatar: default_profile_avatar(),
        }
    }
}

/// Player level XP curve: level `n` needs `base + step * (n - 1)` XP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressionConfig {
    /// XP needed to leave level 1.
    #[serde(default = "default_base_level_xp")]
    pub base_level_xp: u32,

    /// Additional XP needed per level after the first.
    #[serde(default = "default_level_xp_step")]
    pub level_xp_step: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_level_xp: default_base_level_xp(),
            level_xp_step: default_level_xp_step(),
        }
    }
}

/// A fixed leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RivalConfig {
    /// Display name.
    pub name: String,
    /// Avatar glyph.
    #[serde(default)]
    pub avatar: String,
    /// Lifetime XP.
    pub total_xp: u64,
}

/// Leaderboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaderboardConfig {
    /// Entries ranked against the player.
    #[serde(default = "default_rivals")]
    pub rivals: Vec<RivalConfig>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            rivals: default_rivals(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_celebration_delay_ms() -> u64 {
    2000
}

fn default_progress_path() -> PathBuf {
    PathBuf::from(".codequest/progress.json")
}

fn default_profile_name() -> String {
    "Player".to_owned()
}

fn default_profile_avatar() -> String {
    "P".to_owned()
}

const fn default_base_level_xp() -> u32 {
    1000
}

const fn default_level_xp_step() -> u32 {
    250
}

fn default_rivals() -> Vec<RivalConfig> {
    [("Ada", "A", 4200), ("Linus", "L", 2750), ("Grace", "G", 1300)]
        .into_iter()
        .map(|(name, avatar, total_xp)| RivalConfig {
            name: name.to_owned(),
            avatar: avatar.to_owned(),
            total_xp,
        })
        .collect()
}

fn default_log_level() -> String {
    "warn".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.session.celebration_delay(), Duration::from_secs(2));
        assert_eq!(
            config.storage.progress_path,
            PathBuf::from(".codequest/progress.json")
        );
        assert_eq!(config.catalog.dir, None);
        assert_eq!(config.profile.name, "Player");
        assert_eq!(config.progression.base_level_xp, 1000);
        assert_eq!(config.progression.level_xp_step, 250);
        assert_eq!(config.leaderboard.rivals.len(), 3);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = "session:\n  celebration_delay_ms: 50\nprofile:\n  name: Sam\n";
        let mut config: AppConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides_from(|_| None);

        assert_eq!(config.session.celebration_delay_ms, 50);
        assert_eq!(config.profile.name, "Sam");
        assert_eq!(config.profile.avatar, "P");
        assert_eq!(config.progression.base_level_xp, 1000);
    }

    #[test]
    fn parse_rivals() {
        let yaml = r"
leaderboard:
  rivals:
    - name: Kim
      total_xp: 10
";
        let config: AppConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.leaderboard.rivals.len(), 1);
        assert_eq!(config.leaderboard.rivals[0].avatar, "");
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::parse("   \n").unwrap();
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn env_override_replaces_progress_path() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| {
            (key == PROGRESS_PATH_ENV).then(|| "/tmp/elsewhere.json".to_owned())
        });
        assert_eq!(
            config.storage.progress_path,
            PathBuf::from("/tmp/elsewhere.json")
        );
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = AppConfig::parse("session: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codequest.yaml");
        std::fs::write(&path, "logging:\n  level: debug\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
