//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. A missing or
//! unreadable file is never fatal: a warning is logged and compiled defaults
//! are used instead.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CATALYST_ROOT_FOLDER` environment variable
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CATALYST_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "catalyst.db";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional so that partial files keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// LLM completion endpoint settings
    #[serde(default)]
    pub llm: LlmSection,

    /// Speech-to-text settings
    #[serde(default)]
    pub speech: SpeechSection,

    /// Notes export settings
    #[serde(default)]
    pub notes: NotesSection,

    #[serde(default)]
    pub timeouts: TimeoutSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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

/// `[llm]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    /// OpenAI-compatible base URL
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model used by the meeting-to-tickets workflow
    #[serde(default)]
    pub agent_model: Option<String>,
    /// Model used for deliverables (PRD, user stories, ...)
    #[serde(default)]
    pub deliverable_model: Option<String>,
}

/// `[speech]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// `[notes]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Default parent page for exported pages
    #[serde(default)]
    pub parent_page_id: Option<String>,
}

/// `[timeouts]` section, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSection {
    /// Outer wait for a single audio transcription
    #[serde(default = "default_transcription_timeout")]
    pub transcription_secs: u64,
    /// Outer wait for the complete meeting workflow
    #[serde(default = "default_workflow_timeout")]
    pub workflow_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            transcription_secs: default_transcription_timeout(),
            workflow_secs: default_workflow_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_transcription_timeout() -> u64 {
    120
}

fn default_workflow_timeout() -> u64 {
    300
}

/// Compiled defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: DEFAULT_PORT,
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/catalyst
        dirs::data_local_dir()
            .map(|d| d.join("catalyst"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/catalyst"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("catalyst"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/catalyst"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("catalyst"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\catalyst"))
    } else {
        PathBuf::from("./catalyst_data")
    }
}

/// Default TOML location (`~/.config/catalyst/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("catalyst").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load TOML config with graceful degradation
///
/// An explicit path that cannot be read or parsed, or a malformed default
/// file, logs a warning and yields defaults. A missing default file is silent.
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using compiled defaults");
                return TomlConfig::default();
            }
        },
    };

    match read_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; using compiled defaults", e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder from CLI, environment, TOML and defaults
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Value from the loaded TOML config
    pub fn with_toml_root(mut self, path: Option<PathBuf>) -> Self {
        self.toml_root = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder from TOML: {}", path.display());
            return path.clone();
        }

        let path = CompiledDefaults::for_current_platform().root_folder;
        info!(module = %self.module_name, "Root folder (compiled default): {}", path.display());
        path
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 6000

            [llm]
            api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(6000));
        assert_eq!(config.llm.api_key.as_deref(), Some("abc"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.timeouts.workflow_secs, 300);
        assert_eq!(config.timeouts.transcription_secs, 120);
        assert!(config.notes.parent_page_id.is_none());
    }

    #[test]
    fn test_initializer_database_path() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/catalyst-x"));
        assert_eq!(
            init.database_path(),
            PathBuf::from("/tmp/catalyst-x").join(DATABASE_FILE_NAME)
        );
    }
}
