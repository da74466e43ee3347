use std::path::PathBuf;

use crate::canvas::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_CELL_SIZE};
use crate::color::PixelColor;
use crate::log_warn;

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub cell_size: u32,
    /// Pen color at startup
    pub default_color: PixelColor,
    /// Initial state of the "Show All Previous Layers" toggle
    pub show_all_layers: bool,
    /// Starting directory for file dialogs
    pub last_directory: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            default_color: PixelColor::default(),
            show_all_layers: false,
            last_directory: None,
        }
    }
}

impl AppSettings {
    pub(crate) fn settings_path() -> Option<PathBuf> {
        if cfg!(target_os = "linux") {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .ok()?
                .join("pixelfe");
            Some(config_dir.join("pixelfe_settings.cfg"))
        } else {
            // %APPDATA% on Windows, Application Support on macOS
            Some(crate::logger::data_dir().join("PixelFE").join("pixelfe_settings.cfg"))
        }
    }

    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::from_cfg_str(&content)
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(&path, self.to_cfg_string()) {
            log_warn!("Failed to save settings to {}: {}", path.display(), e);
        }
    }

    /// Parse `key = value` lines. Unknown keys and bad values keep the default.
    pub fn from_cfg_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "canvas_width" => {
                    if let Some(v) = parse_size(val) {
                        s.canvas_width = v;
                    }
                }
                "canvas_height" => {
                    if let Some(v) = parse_size(val) {
                        s.canvas_height = v;
                    }
                }
                "cell_size" => {
                    if let Some(v) = parse_size(val) {
                        s.cell_size = v;
                    }
                }
                "default_color" => match PixelColor::parse(val) {
                    Ok(c) => s.default_color = c,
                    Err(e) => log_warn!("Ignoring default_color '{}': {}", val, e),
                },
                "show_all_layers" => s.show_all_layers = val == "true",
                "last_directory" => {
                    s.last_directory = (!val.is_empty()).then(|| PathBuf::from(val));
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_cfg_string(&self) -> String {
        let last_dir = self
            .last_directory
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!(
            "canvas_width = {}\n\
             canvas_height = {}\n\
             cell_size = {}\n\
             default_color = {}\n\
             show_all_layers = {}\n\
             last_directory = {}\n",
            self.canvas_width, self.canvas_height, self.cell_size, self.default_color, self.show_all_layers, last_dir
        )
    }
}

fn parse_size(val: &str) -> Option<u32> {
    val.parse::<u32>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AppSettings::default();
        assert_eq!((s.canvas_width, s.canvas_height, s.cell_size), (800, 600, 20));
        assert_eq!(s.default_color.as_str(), "black");
        assert!(!s.show_all_layers);
    }

    #[test]
    fn test_round_trip() {
        let s = AppSettings {
            canvas_width: 320,
            canvas_height: 240,
            cell_size: 16,
            default_color: PixelColor::parse("#112233").unwrap(),
            show_all_layers: true,
            last_directory: Some(PathBuf::from("/tmp/art")),
        };
        assert_eq!(AppSettings::from_cfg_str(&s.to_cfg_string()), s);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let s = AppSettings::from_cfg_str(
            "cell_size = 0\ncanvas_width = wide\ndefault_color = nope\nmystery = 1\nno equals sign\n",
        );
        assert_eq!(s, AppSettings::default());
    }
}
