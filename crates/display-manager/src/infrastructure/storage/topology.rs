//! Topology fixtures: a [`DisplayConfig`] stored as TOML.
//!
//! The backend-private `native` token and the capture `time` are not stored;
//! a loaded fixture is stamped with the load time.
//!
//! ```toml
//! serial = 3
//!
//! [[monitors]]
//! id = { name = "DP-1", edid = [0, 255, 255] }
//! mm = { width = 600, height = 340 }
//!
//! [[monitors.modes]]
//! mode = { width = 2560, height = 1440, rate = 144000 }
//! preferred = true
//! current = true
//!
//! [[logical]]
//! rect = { x = 0, y = 0, width = 2560, height = 1440 }
//! scale = 1.25
//! primary = true
//! monitors = [{ name = "DP-1", edid = [0, 255, 255] }]
//! ```

use std::path::Path;

use display_core::DisplayConfig;

use super::config::ConfigError;

/// Parses a topology fixture from TOML text.
pub fn parse_topology(text: &str) -> Result<DisplayConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Loads a topology fixture from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist) and [`ConfigError::Parse`] if it is not a valid topology.
pub fn load_topology(path: &Path) -> Result<DisplayConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_topology(&text)
}

/// Writes `config` to `path` as TOML.
pub fn save_topology(path: &Path, config: &DisplayConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_core::{ModeInfo, MonitorId};

    const FIXTURE: &str = r#"
serial = 3

[[monitors]]
id = { name = "DP-1", edid = [0, 255, 255] }
mm = { width = 600, height = 340 }

[[monitors.modes]]
mode = { width = 2560, height = 1440, rate = 144000 }
preferred = true
current = true

[[monitors.modes]]
mode = { width = 1920, height = 1080, rate = 60000 }

[[logical]]
rect = { x = 0, y = 0, width = 2560, height = 1440 }
scale = 1.25
primary = true
monitors = [{ name = "DP-1", edid = [0, 255, 255] }]
"#;

    #[test]
    fn test_parse_topology_reads_monitors_and_logical_displays() {
        // Act
        let config = parse_topology(FIXTURE).expect("parse");

        // Assert
        assert_eq!(config.serial, 3);
        let id = MonitorId::new("DP-1", vec![0, 255, 255]);
        let monitor = config.get_monitor(&id).expect("DP-1 present");
        assert_eq!(monitor.modes.len(), 2);
        assert_eq!(monitor.get_current().mode, ModeInfo::new(2560, 1440, 144_000));
        assert_eq!(config.logical[0].scale, 1.25);
        assert!(config.native.is_none());
    }

    #[test]
    fn test_parse_topology_rejects_missing_monitor_id() {
        let result = parse_topology("[[monitors]]\nmm = { width = 1, height = 1 }\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_topology_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_topology(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_save_and_load_topology_round_trip() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("topology.toml");
        let config = parse_topology(FIXTURE).expect("parse");

        // Act
        save_topology(&path, &config).expect("save");
        let loaded = load_topology(&path).expect("load");

        // Assert
        assert!(loaded.is_equal(&config));
    }
}
