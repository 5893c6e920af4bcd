// ============================================================================
// Watermark settings model — the configuration contract accepted at the
// boundary. Values are clamped by the consumers, never rejected.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::ops::position::WatermarkPosition;

/// Text watermark appearance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TextWatermarkConfig {
    pub text: String,
    pub font_family: String,
    /// Pixel size, > 0.
    pub font_size: f32,
    /// CSS-style weight (100=Thin .. 900=Black).
    pub font_weight: u16,
    pub color: [u8; 3],
    /// Percent, [0, 100].
    pub opacity: f32,
    pub outline_enabled: bool,
    pub outline_color: [u8; 3],
    /// Pixels, >= 1 when the outline is enabled.
    pub outline_width: f32,
}

impl Default for TextWatermarkConfig {
    fn default() -> Self {
        Self {
            text: "© mangamark".to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 24.0,
            font_weight: 400,
            color: [255, 255, 255],
            opacity: 50.0,
            outline_enabled: false,
            outline_color: [0, 0, 0],
            outline_width: 1.0,
        }
    }
}

/// Image watermark appearance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageWatermarkConfig {
    /// Encoded bitmap payload. Decoded into a drawable handle by the caller
    /// (via `io::decode_image`) before rendering.
    #[serde(skip)]
    pub image_data: Vec<u8>,
    /// Uniform scale factor, > 0.
    pub scale: f32,
    /// Percent, [0, 100].
    pub opacity: f32,
    pub tile_enabled: bool,
    /// Gap between tiles, >= 0.
    pub tile_spacing_x: f32,
    pub tile_spacing_y: f32,
}

impl Default for ImageWatermarkConfig {
    fn default() -> Self {
        Self {
            image_data: Vec::new(),
            scale: 1.0,
            opacity: 50.0,
            tile_enabled: false,
            tile_spacing_x: 0.0,
            tile_spacing_y: 0.0,
        }
    }
}

/// The two watermark kinds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatermarkConfig {
    Text(TextWatermarkConfig),
    Image(ImageWatermarkConfig),
}

/// Complete watermark state, owned by the caller. The compositor treats it
/// as an immutable input per render call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatermarkSettings {
    pub config: WatermarkConfig,
    #[serde(default)]
    pub position: WatermarkPosition,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            config: WatermarkConfig::Text(TextWatermarkConfig::default()),
            position: WatermarkPosition::default(),
            enabled: true,
        }
    }
}

impl WatermarkSettings {
    /// Parse settings from a JSON string (CLI settings files, preset payloads).
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid settings JSON: {}", e))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("settings serialize failed: {}", e))
    }

    pub fn opacity(&self) -> f32 {
        match &self.config {
            WatermarkConfig::Text(t) => t.opacity,
            WatermarkConfig::Image(i) => i.opacity,
        }
    }
}

/// Map a percent opacity to a [0, 1] alpha factor. Out-of-range caller
/// values are clamped, never rejected.
pub fn opacity_alpha(opacity_percent: f32) -> f32 {
    (opacity_percent / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::position::PresetPosition;

    #[test]
    fn opacity_is_clamped_not_rejected() {
        assert_eq!(opacity_alpha(50.0), 0.5);
        assert_eq!(opacity_alpha(-20.0), 0.0);
        assert_eq!(opacity_alpha(250.0), 1.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = WatermarkSettings::from_json(
            r#"{"config": {"type": "text", "text": "sample"}}"#,
        )
        .unwrap();
        assert!(s.enabled);
        match s.config {
            WatermarkConfig::Text(t) => {
                assert_eq!(t.text, "sample");
                assert_eq!(t.font_size, 24.0);
            }
            _ => panic!("expected text config"),
        }
        assert_eq!(s.position.preset, PresetPosition::BottomRight);
    }

    #[test]
    fn preset_names_are_kebab_case() {
        let s = WatermarkSettings::from_json(
            r#"{"config": {"type": "image", "scale": 0.5},
                "position": {"preset": "top-left", "rotation": 15.0}}"#,
        )
        .unwrap();
        assert_eq!(s.position.preset, PresetPosition::TopLeft);
        assert_eq!(s.position.rotation, 15.0);
    }

    #[test]
    fn settings_round_trip() {
        let s = WatermarkSettings::default();
        let json = s.to_json().unwrap();
        let back = WatermarkSettings::from_json(&json).unwrap();
        assert_eq!(back.position, s.position);
        assert_eq!(back.enabled, s.enabled);
    }
}
