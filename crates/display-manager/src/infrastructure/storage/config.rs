//! TOML-based settings persistence for the display negotiator.
//!
//! Reads [`Settings`] from the platform-appropriate settings file:
//! - Windows:  `%APPDATA%\DisplayNegotiator\settings.toml`
//! - Linux:    `~/.config/display-negotiator/settings.toml`
//! - macOS:    `~/Library/Application Support/DisplayNegotiator/settings.toml`
//!
//! Example:
//!
//! ```toml
//! [manager]
//! scaling_mode = "direct"
//! log_level = "debug"
//! ```
//!
//! # Serde default values
//!
//! Every field has a default, so a missing file, a missing `[manager]`
//! section, or a settings file from an older version all load cleanly.

use std::path::{Path, PathBuf};

use display_core::ScalingMode;
use serde::Deserialize;
use thiserror::Error;

/// Error type for settings and topology file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The value could not be serialized to TOML.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub manager: ManagerSettings,
}

/// Negotiation engine settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ManagerSettings {
    /// How logical display scale maps to buffer size: `"post"` or `"direct"`.
    #[serde(default)]
    pub scaling_mode: ScalingMode,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            scaling_mode: ScalingMode::default(),
            log_level: default_log_level(),
        }
    }
}

// ── File I/O ──────────────────────────────────────────────────────────────────

/// Resolves the negotiator's config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the platform config
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the settings file.
pub fn settings_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("settings.toml"))
}

/// Loads settings from the platform settings file.
///
/// # Errors
///
/// See [`load_settings_from`].
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_file_path()?)
}

/// Loads settings from `path`, returning `Settings::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DisplayNegotiator"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("display-negotiator"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DisplayNegotiator")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_uses_post_scaling_and_info() {
        let settings = Settings::default();
        assert_eq!(settings.manager.scaling_mode, ScalingMode::PostScaling);
        assert_eq!(settings.manager.log_level, "info");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").expect("deserialize empty");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_deserialize_direct_scaling() {
        // Arrange
        let toml_str = r#"
[manager]
scaling_mode = "direct"
"#;

        // Act
        let settings: Settings = toml::from_str(toml_str).expect("deserialize");

        // Assert
        assert_eq!(settings.manager.scaling_mode, ScalingMode::DirectScaling);
        // Unspecified fields keep their defaults
        assert_eq!(settings.manager.log_level, "info");
    }

    #[test]
    fn test_deserialize_accepts_long_scaling_mode_alias() {
        let settings: Settings =
            toml::from_str("[manager]\nscaling_mode = \"post_scaling\"\n").expect("deserialize");
        assert_eq!(settings.manager.scaling_mode, ScalingMode::PostScaling);
    }

    #[test]
    fn test_deserialize_unknown_scaling_mode_is_error() {
        let result: Result<Settings, _> = toml::from_str("[manager]\nscaling_mode = \"sideways\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_settings_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_from_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[[[ not valid toml").expect("write");

        let result = load_settings_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_settings_from_file_reads_every_field() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[manager]\nscaling_mode = \"direct\"\nlog_level = \"debug\"\n")
            .expect("write");

        // Act
        let settings = load_settings_from(&path).expect("load");

        // Assert
        assert_eq!(settings.manager.scaling_mode, ScalingMode::DirectScaling);
        assert_eq!(settings.manager.log_level, "debug");
    }

    #[test]
    fn test_platform_config_dir_returns_some_on_this_platform() {
        let result = platform_config_dir();
        #[cfg(target_os = "windows")]
        if std::env::var_os("APPDATA").is_some() {
            assert!(result.is_some());
        }
        #[cfg(target_os = "linux")]
        {
            let has_xdg = std::env::var_os("XDG_CONFIG_HOME").is_some();
            let has_home = std::env::var_os("HOME").is_some();
            if has_xdg || has_home {
                assert!(result.is_some());
            }
        }
        #[cfg(target_os = "macos")]
        if std::env::var_os("HOME").is_some() {
            assert!(result.is_some());
        }
    }

    #[test]
    fn test_settings_file_path_ends_with_settings_toml() {
        if let Ok(path) = settings_file_path() {
            assert!(
                path.ends_with("settings.toml"),
                "settings file must be named settings.toml, got {path:?}"
            );
        }
    }
}
