//! Game settings
//!
//! JSON file on native, LocalStorage on the web. Missing fields fall back to
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{Canvas, ColorShift};

/// Tunable game parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Stages ===
    /// Tiles per side at stage 1 (4 in the classic game, 2 for an easier start)
    pub initial_grid_size: u32,
    /// Seconds per stage
    pub time_limit_secs: u32,
    /// How long the answer stays highlighted before the retry/exit prompt
    pub reveal_delay_ms: u64,

    // === Layout ===
    /// Gap between tiles (pixels)
    pub tile_spacing: u32,
    /// Drawing area used when the host does not measure one
    pub canvas: Canvas,

    // === Colours ===
    /// How the odd tile differs from the rest
    pub color_shift: ColorShift,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_grid_size: INITIAL_GRID_SIZE,
            time_limit_secs: TIME_LIMIT_SECS,
            reveal_delay_ms: REVEAL_DELAY_MS,

            tile_spacing: TILE_SPACING,
            canvas: Canvas::default(),

            color_shift: ColorShift::default(),
        }
    }
}

impl Settings {
    /// Copy with out-of-range values pulled back into range
    pub fn sanitized(&self) -> Self {
        Self {
            initial_grid_size: self.initial_grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            time_limit_secs: self.time_limit_secs.max(1),
            color_shift: self.color_shift.sanitized(),
            ..self.clone()
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "find_color_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from a JSON file. A missing file means defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::SettingsError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_game() {
        let settings = Settings::default();
        assert_eq!(settings.initial_grid_size, 4);
        assert_eq!(settings.time_limit_secs, 15);
        assert_eq!(settings.reveal_delay_ms, 3000);
        assert_eq!(settings.tile_spacing, 8);
        assert_eq!(settings.color_shift, ColorShift::Darken { factor: 0.8 });
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "initial_grid_size": 2, "color_shift": { "kind": "contrast", "delta": 30 } }"#,
        )
        .unwrap();
        assert_eq!(settings.initial_grid_size, 2);
        assert_eq!(settings.color_shift, ColorShift::Contrast { delta: 30 });
        assert_eq!(settings.time_limit_secs, TIME_LIMIT_SECS);
        assert_eq!(settings.canvas, Canvas::square(DEFAULT_CANVAS_SIDE));
    }

    #[test]
    fn test_sanitized() {
        let settings = Settings {
            initial_grid_size: 0,
            time_limit_secs: 0,
            color_shift: ColorShift::Darken { factor: 1.5 },
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(settings.initial_grid_size, MIN_GRID_SIZE);
        assert_eq!(settings.time_limit_secs, 1);
        assert_eq!(settings.color_shift, ColorShift::default());

        let oversized = Settings {
            initial_grid_size: 200_000_000,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(oversized.initial_grid_size, MAX_GRID_SIZE);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("find-color-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());

        let custom = Settings {
            initial_grid_size: 2,
            reveal_delay_ms: 500,
            ..Settings::default()
        };
        custom.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), custom);

        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(crate::SettingsError::Format(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
