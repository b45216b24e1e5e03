//! Window configuration
//!
//! A `WindowConfig` describes everything needed to open a window. It can be
//! built in code or loaded from `wndkit.toml` found in the standard
//! locations (user config dir, exe dir, working dir).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Point, Size};
use crate::platform::win32::window::BorderStyle;

/// Window configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Logical width in pixels (at 96 DPI)
    pub width: i32,
    /// Logical height in pixels (at 96 DPI)
    pub height: i32,
    /// Top-left position in screen pixels; `None` centers on the primary
    /// monitor's work area
    pub position: Option<Point>,
    /// Frame style
    pub border: BorderStyle,
    /// Show the window immediately after creation
    pub visible: bool,
    /// OS window-class name; windows sharing a name share one registration
    pub class_name: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "wndkit".to_string(),
            width: 800,
            height: 600,
            position: None,
            border: BorderStyle::Sizable,
            visible: true,
            class_name: "WndkitWindow".to_string(),
        }
    }
}

impl WindowConfig {
    /// Configured logical size, clamped to at least 1x1
    pub fn logical_size(&self) -> Size {
        Size::new(self.width, self.height).clamped()
    }

    /// Find wndkit.toml in standard locations
    pub fn find_config_path() -> Option<PathBuf> {
        // Check in order: %APPDATA%/wndkit, exe dir, cwd
        let candidates = [
            dirs::config_dir().map(|p| p.join("wndkit").join("wndkit.toml")),
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("wndkit.toml"))),
            Some(PathBuf::from("wndkit.toml")),
        ];

        candidates.into_iter().flatten().find(|c| c.exists())
    }

    /// Load configuration from the standard locations, defaults if not found
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            Self::load_from_path(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WindowConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "wndkit");
        assert_eq!(config.logical_size(), Size::new(800, 600));
        assert!(config.position.is_none());
        assert_eq!(config.border, BorderStyle::Sizable);
        assert!(config.visible);
    }

    #[test]
    fn test_logical_size_clamps_to_one() {
        let config = WindowConfig {
            width: 0,
            height: -20,
            ..Default::default()
        };
        assert_eq!(config.logical_size(), Size::new(1, 1));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wndkit.toml");

        let config = WindowConfig {
            title: "demo".to_string(),
            width: 1280,
            height: 720,
            position: Some(Point::new(40, 30)),
            border: BorderStyle::Fixed,
            visible: false,
            class_name: "DemoWindow".to_string(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = WindowConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.title, "demo");
        assert_eq!(loaded.width, 1280);
        assert_eq!(loaded.height, 720);
        assert_eq!(loaded.position, Some(Point::new(40, 30)));
        assert_eq!(loaded.border, BorderStyle::Fixed);
        assert!(!loaded.visible);
        assert_eq!(loaded.class_name, "DemoWindow");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WindowConfig::load_from_path(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wndkit.toml");
        std::fs::write(&path, "title = \"partial\"\nwidth = 320\n").unwrap();

        let loaded = WindowConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.title, "partial");
        assert_eq!(loaded.width, 320);
        assert_eq!(loaded.height, 600);
        assert_eq!(loaded.border, BorderStyle::Sizable);
    }
}
