//! Project Configuration (clarity.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Narrowest box the console printer can draw
pub const MIN_WIDTH: usize = 3;

/// Configuration from clarity.toml (or the global config file)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClarityConfig {
    /// Report output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,

    /// Console printer layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer: Option<PrinterWidths>,

    /// Test libraries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderConfig>,
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Color PASS/FAIL/SKIPPED (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Report format (default: text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

/// Report format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Bordered console report
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "output.format".to_string(),
                reason: format!("unknown format '{}', expected 'text' or 'json'", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// `[printer]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PrinterWidths {
    /// `=` line before failed tests (default: 80)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_separator_width: Option<usize>,

    /// Suite name banner (default: 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_banner_width: Option<usize>,

    /// Suite report banner (default: 120)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_banner_width: Option<usize>,
}

/// `[loader]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Test libraries loaded on every run, paths or bare library names
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<PathBuf>,

    /// Directories searched for bare library names
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

impl ClarityConfig {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::TomlParseError { error, .. } => ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: PathBuf::new(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(printer) = &self.printer {
            let widths = [
                ("printer.test_separator_width", printer.test_separator_width),
                ("printer.suite_banner_width", printer.suite_banner_width),
                ("printer.report_banner_width", printer.report_banner_width),
            ];
            for (field, width) in widths {
                if let Some(width) = width {
                    if width < MIN_WIDTH {
                        return Err(ConfigError::InvalidValue {
                            field: field.to_string(),
                            reason: format!("width must be at least {}, got {}", MIN_WIDTH, width),
                        });
                    }
                }
            }
        }

        if let Some(loader) = &self.loader {
            if loader.libraries.iter().any(|p| p.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "loader.libraries".to_string(),
                    reason: "library path cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Overlay `other` on top of this configuration.
    ///
    /// Scalar settings set in `other` win; library lists are concatenated
    /// with `other`'s entries first.
    pub fn merge(self, other: ClarityConfig) -> ClarityConfig {
        let output = match (self.output, other.output) {
            (Some(base), Some(over)) => Some(OutputConfig {
                color: over.color.or(base.color),
                format: over.format.or(base.format),
            }),
            (base, over) => over.or(base),
        };

        let printer = match (self.printer, other.printer) {
            (Some(base), Some(over)) => Some(PrinterWidths {
                test_separator_width: over.test_separator_width.or(base.test_separator_width),
                suite_banner_width: over.suite_banner_width.or(base.suite_banner_width),
                report_banner_width: over.report_banner_width.or(base.report_banner_width),
            }),
            (base, over) => over.or(base),
        };

        let loader = match (self.loader, other.loader) {
            (Some(base), Some(mut over)) => {
                over.libraries.extend(base.libraries);
                over.search_paths.extend(base.search_paths);
                Some(over)
            }
            (base, over) => over.or(base),
        };

        ClarityConfig {
            output,
            printer,
            loader,
        }
    }

    pub fn output_mut(&mut self) -> &mut OutputConfig {
        self.output.get_or_insert_with(OutputConfig::default)
    }

    pub fn loader_mut(&mut self) -> &mut LoaderConfig {
        self.loader.get_or_insert_with(LoaderConfig::default)
    }

    /// Resolve relative library and search paths against `root`.
    ///
    /// Bare library names (`math_tests`) stay bare so they go through the
    /// search paths.
    pub fn resolve_paths(&mut self, root: &Path) {
        if let Some(loader) = &mut self.loader {
            for library in &mut loader.libraries {
                let bare = library.components().count() == 1 && library.extension().is_none();
                if library.is_relative() && !bare {
                    *library = root.join(&*library);
                }
            }
            for dir in &mut loader.search_paths {
                if dir.is_relative() {
                    *dir = root.join(&*dir);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ClarityConfig::parse(
            r#"
[output]
color = false
format = "json"

[printer]
suite_banner_width = 60

[loader]
libraries = ["target/debug/libmath_tests.so"]
search_paths = ["target/debug"]
"#,
        )
        .unwrap();

        let output = config.output.unwrap();
        assert_eq!(output.color, Some(false));
        assert_eq!(output.format, Some(OutputFormat::Json));
        assert_eq!(config.printer.unwrap().suite_banner_width, Some(60));
        assert_eq!(config.loader.unwrap().libraries.len(), 1);
    }

    #[test]
    fn test_width_too_small() {
        let err = ClarityConfig::parse("[printer]\nreport_banner_width = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "printer.report_banner_width"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(ClarityConfig::parse("[output]\nformat = \"xml\"\n").is_err());
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = ClarityConfig::parse(
            "[output]\ncolor = false\nformat = \"json\"\n[loader]\nlibraries = [\"a\"]\n",
        )
        .unwrap();
        let over = ClarityConfig::parse("[output]\ncolor = true\n[loader]\nlibraries = [\"b\"]\n")
            .unwrap();

        let merged = base.merge(over);
        let output = merged.output.unwrap();
        assert_eq!(output.color, Some(true));
        assert_eq!(output.format, Some(OutputFormat::Json));
        assert_eq!(
            merged.loader.unwrap().libraries,
            vec![PathBuf::from("b"), PathBuf::from("a")]
        );
    }

    #[test]
    fn test_resolve_paths_keeps_bare_names() {
        let mut config = ClarityConfig::parse(
            "[loader]\nlibraries = [\"math_tests\", \"build/libio_tests.so\", \"/abs/libx.so\"]\n",
        )
        .unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.loader.unwrap().libraries,
            vec![
                PathBuf::from("math_tests"),
                PathBuf::from("/project/build/libio_tests.so"),
                PathBuf::from("/abs/libx.so"),
            ]
        );
    }
}
