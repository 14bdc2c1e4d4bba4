use std::{path::Path, time::Duration};

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::widget::WidgetKind;

/// File the binary reads tunables from, relative to the working directory.
pub const CONFIG_FILE: &str = "decal_editor.json";

/// Editor tunables. Every field falls back to its default when missing from
/// the config file.
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Side length, in UV units, of a freshly placed stamp.
    pub stamp_size: f32,
    pub min_size_uv: f32,
    /// Size gained per unit of projected NDC drag on a resize handle.
    pub resize_scaling_factor: f32,
    /// UV travelled per unit of projected NDC drag on a move handle.
    pub move_sensitivity: f32,
    pub brush_radius: f32,
    pub brush_strength: f32,
    pub brush_rate_hz: f32,
    pub lattice_segments: u32,
    pub texture_size: u32,
    pub show_brush_strokes: bool,
    /// Widget opened when a stamp is first placed.
    pub default_widget: WidgetKind,
    /// Image loaded as the stamp source at startup.
    pub image_path: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stamp_size: 0.4,
            min_size_uv: 0.01,
            resize_scaling_factor: 3.0,
            move_sensitivity: 0.1,
            brush_radius: 0.2,
            brush_strength: 0.1,
            brush_rate_hz: 60.0,
            lattice_segments: 10,
            texture_size: 1024,
            show_brush_strokes: false,
            default_widget: WidgetKind::Move,
            image_path: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid editor config")
    }

    /// Read `path`, returning `Ok(None)` when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("failed to parse {}", path.display()))
            .map(Some)
    }

    /// Load [`CONFIG_FILE`], logging and falling back to defaults on error.
    pub fn load_or_default() -> Self {
        match Self::load(CONFIG_FILE) {
            Ok(Some(config)) => {
                info!("Loaded editor config from {CONFIG_FILE}");
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("Failed to load editor config: {err:#}");
                Self::default()
            }
        }
    }

    /// Minimum spacing between two applied brush samples.
    pub fn brush_interval(&self) -> Duration {
        if self.brush_rate_hz > 0.0 {
            Duration::from_secs_f32(1.0 / self.brush_rate_hz)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = EditorConfig::from_json(r#"{ "brush_radius": 0.3, "default_widget": "rotate" }"#)
            .unwrap();
        assert_eq!(config.brush_radius, 0.3);
        assert_eq!(config.default_widget, WidgetKind::Rotate);
        assert_eq!(config.stamp_size, 0.4);
        assert_eq!(config.lattice_segments, 10);
        assert!(config.image_path.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorConfig::from_json("{ stamp_size: ").is_err());
        assert!(EditorConfig::from_json(r#"{ "stamp_size": "big" }"#).is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let loaded = EditorConfig::load("definitely/not/a/real/decal_editor.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn brush_interval_follows_rate() {
        let config = EditorConfig::default();
        let interval = config.brush_interval();
        assert!((interval.as_secs_f32() - 1.0 / 60.0).abs() < 1e-6);

        let unlimited = EditorConfig {
            brush_rate_hz: 0.0,
            ..default()
        };
        assert_eq!(unlimited.brush_interval(), Duration::ZERO);
    }
}
