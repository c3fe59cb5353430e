//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::project::{ClarityConfig, OutputFormat};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "clarity.toml";

const DEFAULT_TEST_SEPARATOR_WIDTH: usize = 80;
const DEFAULT_SUITE_BANNER_WIDTH: usize = 100;
const DEFAULT_REPORT_BANNER_WIDTH: usize = 120;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.clarity/config.toml) - lowest priority
/// 2. Project config (clarity.toml) - overrides global
/// 3. Environment variables (CLARITY_*, NO_COLOR) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Effective configuration after merging every source
    pub settings: ClarityConfig,

    /// Directory holding clarity.toml, if one was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Loader reading the global config from `path` instead of the home directory
    pub fn with_global_config(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find clarity.toml, then merges it over
    /// the global config and applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_config, project_root)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ClarityConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.finish(project_config, project_root)
    }

    fn finish(
        &mut self,
        mut project_config: ClarityConfig,
        project_root: Option<PathBuf>,
    ) -> ConfigResult<Config> {
        if let Some(root) = &project_root {
            project_config.resolve_paths(root);
        }

        // Global config is optional; a broken one must not block a run
        let global_config = self.load_global_config().unwrap_or_default();
        let settings = apply_env_overrides(global_config.merge(project_config))?;

        Ok(Config {
            settings,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); the default config when no
    /// clarity.toml exists up to the filesystem root
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ClarityConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ClarityConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ClarityConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.clarity/config.toml
    fn load_global_config(&mut self) -> ConfigResult<ClarityConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = Self::global_config_dir()?.join("config.toml");
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(ClarityConfig::default());
        }

        let mut config = ClarityConfig::load_from_file(&path)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Get the global configuration directory (~/.clarity)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".clarity"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides
///
/// - `CLARITY_NO_COLOR` or `NO_COLOR` (any non-empty value) disables color
/// - `CLARITY_FORMAT` selects `text` or `json`
/// - `CLARITY_LIBRARY_PATH` (platform path list) prepends search paths
fn apply_env_overrides(mut config: ClarityConfig) -> ConfigResult<ClarityConfig> {
    let no_color = ["CLARITY_NO_COLOR", "NO_COLOR"]
        .iter()
        .any(|name| env::var_os(name).is_some_and(|v| !v.is_empty()));
    if no_color {
        config.output_mut().color = Some(false);
    }

    if let Ok(format) = env::var("CLARITY_FORMAT") {
        config.output_mut().format = Some(format.parse()?);
    }

    if let Some(paths) = env::var_os("CLARITY_LIBRARY_PATH") {
        let loader = config.loader_mut();
        let mut search_paths: Vec<PathBuf> = env::split_paths(&paths)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        search_paths.append(&mut loader.search_paths);
        loader.search_paths = search_paths;
    }

    Ok(config)
}

impl Config {
    /// Whether console output is colored (default: true)
    pub fn color(&self) -> bool {
        self.settings
            .output
            .as_ref()
            .and_then(|o| o.color)
            .unwrap_or(true)
    }

    /// Report format (default: text)
    pub fn format(&self) -> OutputFormat {
        self.settings
            .output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }

    /// `(test separator, suite banner, report banner)` widths
    pub fn widths(&self) -> (usize, usize, usize) {
        let printer = self.settings.printer.clone().unwrap_or_default();
        (
            printer
                .test_separator_width
                .unwrap_or(DEFAULT_TEST_SEPARATOR_WIDTH),
            printer
                .suite_banner_width
                .unwrap_or(DEFAULT_SUITE_BANNER_WIDTH),
            printer
                .report_banner_width
                .unwrap_or(DEFAULT_REPORT_BANNER_WIDTH),
        )
    }

    /// Test libraries configured to load on every run
    pub fn libraries(&self) -> &[PathBuf] {
        self.settings
            .loader
            .as_ref()
            .map(|l| l.libraries.as_slice())
            .unwrap_or(&[])
    }

    /// Directories searched for bare library names
    pub fn search_paths(&self) -> &[PathBuf] {
        self.settings
            .loader
            .as_ref()
            .map(|l| l.search_paths.as_slice())
            .unwrap_or(&[])
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a clarity.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::with_global_config(dir.path().join("no-global.toml"))
    }

    #[test]
    fn test_defaults_without_config() {
        let config = Config::default();
        assert!(config.color());
        assert_eq!(config.format(), OutputFormat::Text);
        assert_eq!(config.widths(), (80, 100, 120));
        assert!(config.libraries().is_empty());
        assert!(!config.is_project());
    }

    #[test]
    #[serial]
    fn test_env_disables_color() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[output]\ncolor = true\n");

        env::set_var("CLARITY_NO_COLOR", "1");
        let config = isolated_loader(&temp_dir)
            .load_from_directory(temp_dir.path())
            .unwrap();
        env::remove_var("CLARITY_NO_COLOR");

        assert!(!config.color());
    }

    #[test]
    #[serial]
    fn test_env_format_override() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("CLARITY_FORMAT", "json");
        let config = isolated_loader(&temp_dir)
            .load_from_directory(temp_dir.path())
            .unwrap();
        env::remove_var("CLARITY_FORMAT");

        assert_eq!(config.format(), OutputFormat::Json);
    }

    #[test]
    #[serial]
    fn test_env_invalid_format() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("CLARITY_FORMAT", "yaml");
        let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("CLARITY_FORMAT");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
