//! Popup options
//!
//! The recognized options of a popup. Options are plain data that can be
//! loaded from TOML; they become an immutable [`crate::PopupConfig`] once
//! validated together with the item list.

use crate::error::{PopupError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Recognized popup options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    /// Dialog window background, `#RRGGBB` or `#AARRGGBB`
    pub background_color: String,
    /// Header bar background
    pub header_color: String,
    /// Resource name of the close icon
    pub close_icon: String,
    /// Layout resource shown while an image loads
    pub loading_placeholder: Option<String>,
    pub scale_mode: ScaleMode,
    /// Drawable applied to each tab in tab mode
    pub selector_indicator: String,
    pub dialog_style: String,
    /// Thumbnail strip (true) or tab strip (false)
    pub thumb_strip_enabled: bool,
    pub zoom_enabled: bool,
    /// Which strip settles are forwarded near the list edges
    pub edge_settle: EdgeSettlePolicy,
    pub strip: StripLayout,
}

pub const DEFAULT_CLOSE_ICON: &str = "ic_close_white_24dp";
pub const DEFAULT_INDICATOR: &str = "indicator_selector";
pub const DEFAULT_DIALOG_STYLE: &str = "KmPopupDialog";

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            background_color: "#000000".to_string(),
            header_color: "#000000".to_string(),
            close_icon: DEFAULT_CLOSE_ICON.to_string(),
            loading_placeholder: None,
            scale_mode: ScaleMode::FitCenter,
            selector_indicator: DEFAULT_INDICATOR.to_string(),
            dialog_style: DEFAULT_DIALOG_STYLE.to_string(),
            thumb_strip_enabled: true,
            zoom_enabled: false,
            edge_settle: EdgeSettlePolicy::Legacy,
            strip: StripLayout::default(),
        }
    }
}

/// Thumbnail strip geometry, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripLayout {
    pub thumb_width: f32,
    pub spacing: f32,
    /// Extra width on each side of the viewport where thumbs stay realized
    pub cache_margin: f32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            thumb_width: 64.0,
            spacing: 8.0,
            cache_margin: 72.0,
        }
    }
}

/// How the pager renders each image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    #[serde(rename = "fit_center")]
    FitCenter,
    #[serde(rename = "fit_start")]
    FitStart,
    #[serde(rename = "fit_end")]
    FitEnd,
    #[serde(rename = "fit_xy")]
    FitXy,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "center_crop")]
    CenterCrop,
    #[serde(rename = "center_inside")]
    CenterInside,
}

/// Filter applied to strip settles before they reach the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSettlePolicy {
    /// Drop a settle while the first (last) thumb is visible unless the centre
    /// moved towards it
    #[serde(rename = "legacy")]
    Legacy,
    /// Forward every settle whose centre differs from the selection
    #[serde(rename = "nearest_center")]
    NearestCenter,
}

/// ARGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);

    /// Parse `#RRGGBB` (opaque) or `#AARRGGBB`
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| PopupError::Config(format!("Colour must start with '#': {}", s)))?;
        let value = u32::from_str_radix(hex, 16)
            .map_err(|_| PopupError::Config(format!("Invalid colour: {}", s)))?;
        match hex.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(PopupError::Config(format!("Invalid colour length: {}", s))),
        }
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl PopupOptions {
    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = toml::from_str(&content)?;
        tracing::info!("Popup options loaded from {:?}", path);
        Ok(options)
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("Using default popup options");
            Ok(Self::default())
        }
    }

    /// Save options to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Popup options saved to {:?}", path);
        Ok(())
    }

    /// Default options file location
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "PopupGallery", "PopupGallery")
            .map(|dirs| dirs.config_dir().join("popup.toml"))
            .unwrap_or_else(|| PathBuf::from("./popup.toml"))
    }

    /// Check the strip geometry
    pub(crate) fn validate_strip(&self) -> Result<()> {
        let strip = &self.strip;
        if !(strip.thumb_width > 0.0) {
            return Err(PopupError::Config(format!(
                "thumb_width must be positive, got {}",
                strip.thumb_width
            )));
        }
        if strip.spacing < 0.0 || strip.cache_margin < 0.0 {
            return Err(PopupError::Config("strip spacing and cache_margin must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#000000").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("#80FF0000").unwrap().alpha(), 0x80);
        assert_eq!(Color::parse("#12ab34").unwrap().to_string(), "#FF12AB34");
        assert!(Color::parse("000000").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#GGGGGG").is_err());
    }

    #[test]
    fn test_options_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("popup.toml");

        let mut options = PopupOptions::default();
        options.thumb_strip_enabled = false;
        options.scale_mode = ScaleMode::CenterCrop;
        options.save(&path).unwrap();

        let loaded = PopupOptions::load(&path).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let options: PopupOptions = toml::from_str(
            r##"
            zoom_enabled = true
            edge_settle = "nearest_center"

            [strip]
            thumb_width = 96.0
            "##,
        )
        .unwrap();
        assert!(options.zoom_enabled);
        assert!(options.thumb_strip_enabled);
        assert_eq!(options.edge_settle, EdgeSettlePolicy::NearestCenter);
        assert_eq!(options.strip.thumb_width, 96.0);
        assert_eq!(options.strip.spacing, 8.0);
        assert_eq!(options.close_icon, DEFAULT_CLOSE_ICON);
    }

    #[test]
    fn test_load_or_default_missing() {
        let dir = tempfile::tempdir().unwrap();
        let options = PopupOptions::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(options, PopupOptions::default());
    }

    #[test]
    fn test_validate_strip() {
        let mut options = PopupOptions::default();
        assert!(options.validate_strip().is_ok());
        options.strip.thumb_width = 0.0;
        assert!(matches!(options.validate_strip(), Err(PopupError::Config(_))));
    }
}
