use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::color::LevelColorTable;
use crate::monitor::{self, MonitorDescriptor, MonitorSettings};
use crate::overlay::OverlayStyle;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub overlay: OverlayStyle,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub kind: String,
    pub device: Option<String>,
    pub format: Option<String>,
    pub interval_secs: u64,
    pub level_colors: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            kind: monitor::default_monitor().name.to_string(),
            device: None,
            format: None,
            interval_secs: 1,
            level_colors: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

/// Configuration with every name looked up and every mini-syntax parsed.
#[derive(Debug)]
pub struct Settings {
    pub monitor: &'static MonitorDescriptor,
    pub monitor_settings: MonitorSettings,
    pub overlay: OverlayStyle,
    pub interval: Duration,
}

impl Config {
    /// Resolves names and parses level colors. Anything unusable is
    /// reported and replaced by its default.
    pub fn resolve(&self) -> Settings {
        let monitor = monitor::find(&self.monitor.kind).unwrap_or_else(|| {
            let fallback = monitor::default_monitor();
            warn!(
                requested = %self.monitor.kind,
                using = fallback.name,
                "unknown monitor type"
            );
            fallback
        });

        let level_colors = LevelColorTable::parse(&self.monitor.level_colors).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring level colors");
            LevelColorTable::default()
        });

        let mut monitor_settings = MonitorSettings::for_monitor(monitor);
        if let Some(device) = &self.monitor.device {
            monitor_settings.device = Some(device.clone());
        }
        if let Some(format) = &self.monitor.format {
            monitor_settings.format = format.clone();
        }
        monitor_settings.color = self.overlay.color.clone();
        monitor_settings.level_colors = level_colors;

        Settings {
            monitor,
            monitor_settings,
            overlay: self.overlay.clone(),
            interval: Duration::from_secs(self.monitor.interval_secs),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("osdmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorKind;
    use crate::overlay::{HorizontalAnchor, VerticalAnchor};

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.monitor.kind, "clock");
        assert_eq!(config.monitor.interval_secs, 1);
        assert_eq!(config.overlay.color, "green");
        assert_eq!(config.overlay.outline_color, "black");
        assert_eq!(config.overlay.outline_width, 1);
        assert_eq!(config.overlay.vertical, VerticalAnchor::Bottom);
        assert_eq!(config.overlay.horizontal, HorizontalAnchor::Left);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[monitor]
kind = "net"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.kind, "net");
        // Other fields should be defaults
        assert_eq!(config.monitor.interval_secs, 1);
        assert_eq!(config.overlay.color, "green");
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[monitor]
kind = "cpu"
device = "cpu1"
format = "load %.1f"
interval_secs = 5
level_colors = "0 green 50 yellow 90 red"

[overlay]
font = "fixed"
color = "cyan"
outline_width = 0
shadow = 2
vertical = "top"
horizontal = "right"
voffset = 3
hoffset = -1

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.device.as_deref(), Some("cpu1"));
        assert_eq!(config.overlay.vertical, VerticalAnchor::Top);
        assert_eq!(config.overlay.horizontal, HorizontalAnchor::Right);
        assert_eq!(config.overlay.hoffset, -1);
        assert_eq!(config.logging.level, "debug");

        let settings = config.resolve();
        assert_eq!(settings.monitor.kind, MonitorKind::Cpu);
        assert_eq!(settings.monitor_settings.device(), "cpu1");
        assert_eq!(settings.monitor_settings.format, "load %.1f");
        assert_eq!(settings.monitor_settings.color_for(95.0), "red");
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.overlay.shadow, 2);
    }

    #[test]
    fn resolve_uses_monitor_defaults() {
        let mut config = Config::default();
        config.monitor.kind = "DISK".to_string();
        let settings = config.resolve();
        assert_eq!(settings.monitor.kind, MonitorKind::Disk);
        assert_eq!(settings.monitor_settings.device(), "/");
        assert_eq!(settings.monitor_settings.format, "Disk: %U%%, %uB/%tB");
    }

    #[test]
    fn unknown_monitor_falls_back_to_clock() {
        let mut config = Config::default();
        config.monitor.kind = "gpu".to_string();
        assert_eq!(config.resolve().monitor.kind, MonitorKind::Clock);
    }

    #[test]
    fn invalid_level_colors_are_dropped() {
        let mut config = Config::default();
        config.monitor.level_colors = "50 red 10 green".to_string();
        let settings = config.resolve();
        assert!(settings.monitor_settings.level_colors.is_empty());
        assert_eq!(settings.monitor_settings.color_for(75.0), "green");
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.monitor.interval_secs, 1);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("osdmon_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.monitor.kind, "clock");
        let _ = std::fs::remove_file(&temp);
    }
}
