use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::CritFixError;
use crate::rules::RuleKind;

/// Suffix of the write-once backup written next to each source file
pub const BACKUP_SUFFIX: &str = ".backup_critical";

/// Main configuration structure for critfix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

/// Which rules run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// DateTime.Now -> DateTime.UtcNow
    #[serde(default = "default_timestamp_normalization")]
    pub timestamp_normalization: bool,

    /// Wrap single-line Console.WriteLine calls in #if DEBUG
    #[serde(default)]
    pub debug_guarding: bool,

    /// Inject an ILogger field into controllers that print to the console
    #[serde(default)]
    pub logger_injection: bool,
}

/// When backups are taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Before any rule runs, even if nothing ends up changing
    Always,

    /// Only for files that are about to be rewritten
    OnChange,
}

/// File discovery and backup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Source extensions to process, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// File name suffixes that mark backups or disabled files
    #[serde(default = "default_excluded_suffixes")]
    pub excluded_suffixes: Vec<String>,

    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    #[serde(default = "default_backup_policy")]
    pub backup_policy: BackupPolicy,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

// Default value functions
fn default_timestamp_normalization() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["cs".to_string()]
}

fn default_excluded_suffixes() -> Vec<String> {
    vec![
        BACKUP_SUFFIX.to_string(),
        ".backup".to_string(),
        ".bak".to_string(),
        ".disabled".to_string(),
    ]
}

fn default_backup_suffix() -> String {
    BACKUP_SUFFIX.to_string()
}

fn default_backup_policy() -> BackupPolicy {
    BackupPolicy::Always
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            timestamp_normalization: default_timestamp_normalization(),
            debug_guarding: false,
            logger_injection: false,
        }
    }
}

impl RulesConfig {
    pub fn set(&mut self, kind: RuleKind, enabled: bool) {
        match kind {
            RuleKind::TimestampNormalization => self.timestamp_normalization = enabled,
            RuleKind::DebugGuarding => self.debug_guarding = enabled,
            RuleKind::LoggerInjection => self.logger_injection = enabled,
        }
    }

    pub fn is_enabled(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::TimestampNormalization => self.timestamp_normalization,
            RuleKind::DebugGuarding => self.debug_guarding,
            RuleKind::LoggerInjection => self.logger_injection,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excluded_suffixes: default_excluded_suffixes(),
            backup_suffix: default_backup_suffix(),
            backup_policy: default_backup_policy(),
            recursive: false,
        }
    }
}

impl BatchConfig {
    /// Every suffix that must never be treated as input, including the
    /// configured backup suffix even when the list omits it
    pub fn skip_suffixes(&self) -> Vec<String> {
        let mut suffixes = self.excluded_suffixes.clone();
        if !suffixes.contains(&self.backup_suffix) {
            suffixes.push(self.backup_suffix.clone());
        }
        suffixes
    }

    /// Reject settings under which a backup could land on its own source
    pub fn validate(&self) -> crate::core::error::Result<()> {
        if self.backup_suffix.is_empty() {
            return Err(CritFixError::Config("backup_suffix must not be empty".to_string()));
        }
        if self.backup_suffix.contains(&['/', '\\'][..]) {
            return Err(CritFixError::Config(format!(
                "backup_suffix must not contain a path separator: {}",
                self.backup_suffix
            )));
        }
        if self.extensions.is_empty() {
            return Err(CritFixError::Config("extensions must list at least one extension".to_string()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration.
    ///
    /// **Priority (highest to lowest):**
    /// 1. an explicit `--config` path (must exist)
    /// 2. `./critfix.toml`
    /// 3. `~/.config/critfix/config.toml`
    /// 4. Hardcoded defaults
    ///
    /// The first file found wins as a whole; missing fields take defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("Loading config from: {}", path.display());
            return Self::load_from_file(path);
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            tracing::info!("Loading project config from: {}", project_path.display());
            return Self::load_from_file(&project_path);
        }

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                tracing::info!("Loading global config from: {}", global_path.display());
                return Self::load_from_file(&global_path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the global config path (~/.config/critfix/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("critfix").join("config.toml"))
    }

    /// Get the project config path (./critfix.toml in current directory)
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("critfix.toml")
    }

    /// Create a default config file at the specified path
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(&Config::default())
            .context("Failed to serialize default config")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}
