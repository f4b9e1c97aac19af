use anyhow::Result;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub blossoms: BlossomConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    /// Command used to open entry urls. Defaults to xdg-open.
    #[serde(default)]
    pub browser: Option<String>,
    /// Path of the catalog document; falls back to data.json in the config
    /// dir, then the working directory.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlossomConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_blossom_count")]
    pub count: usize,
}

fn default_true() -> bool { true }
fn default_blossom_count() -> usize { 25 }

impl Default for BlossomConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            count: default_blossom_count(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_card_height")]
    pub card_height: f32,
    #[serde(default = "Palette::day")]
    pub day: Palette,
    #[serde(default = "Palette::night")]
    pub night: Palette,
}

fn default_width() -> u32 { 900 }
fn default_height() -> u32 { 640 }
fn default_padding() -> f32 { 20.0 }
fn default_spacing() -> f32 { 10.0 }
fn default_border_radius() -> f32 { 12.0 }
fn default_card_height() -> f32 { 92.0 }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            spacing: default_spacing(),
            border_radius: default_border_radius(),
            card_height: default_card_height(),
            day: Palette::day(),
            night: Palette::night(),
        }
    }
}

/// Colors for one of the two modes, as rrggbbaa hex strings. Every field is
/// defaulted, so a palette table may override a single color; omitted fields
/// fall back to the day colors.
#[derive(Deserialize, Debug, Clone)]
pub struct Palette {
    #[serde(default = "day_background")]
    pub background: String,
    #[serde(default = "day_card")]
    pub card: String,
    #[serde(default = "day_border")]
    pub border: String,
    #[serde(default = "day_text")]
    pub text: String,
    #[serde(default = "day_muted")]
    pub muted: String,
    #[serde(default = "day_accent")]
    pub accent: String,
    #[serde(default = "day_selection_background")]
    pub selection_background: String,
    #[serde(default = "day_selection_text")]
    pub selection_text: String,
    #[serde(default = "day_petal")]
    pub petal: String,
}

fn day_background() -> String { "fff5f7ff".to_string() }
fn day_card() -> String { "ffffffff".to_string() }
fn day_border() -> String { "f0c8d4ff".to_string() }
fn day_text() -> String { "463239ff".to_string() }
fn day_muted() -> String { "8c7a80ff".to_string() }
fn day_accent() -> String { "e0528cff".to_string() }
fn day_selection_background() -> String { "ffe0ebff".to_string() }
fn day_selection_text() -> String { "2d1f24ff".to_string() }
fn day_petal() -> String { "ffb7d5ff".to_string() }

impl Palette {
    pub fn day() -> Self {
        Self {
            background: day_background(),
            card: day_card(),
            border: day_border(),
            text: day_text(),
            muted: day_muted(),
            accent: day_accent(),
            selection_background: day_selection_background(),
            selection_text: day_selection_text(),
            petal: day_petal(),
        }
    }

    pub fn night() -> Self {
        Self {
            background: "1e1622ff".to_string(),
            card: "2a2030ff".to_string(),
            border: "4b3a50ff".to_string(),
            text: "e8dce4ff".to_string(),
            muted: "9a8a94ff".to_string(),
            accent: "ff79b0ff".to_string(),
            selection_background: "46314eff".to_string(),
            selection_text: "ffffffff".to_string(),
            petal: "d98cb3ff".to_string(),
        }
    }
}

impl ThemeConfig {
    pub fn palette(&self, night_mode: bool) -> &Palette {
        if night_mode { &self.night } else { &self.day }
    }

    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 8 {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);

        Color::from_rgba8(r, g, b, a)
    }
}

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "hanami", "hanami").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn load_config() -> Result<Config> {
    let config_path = config_dir()
        .map(|d| d.join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.blossoms.enabled);
        assert_eq!(config.blossoms.count, 25);
        assert_eq!(config.theme.width, 900);
        assert!(config.general.browser.is_none());
    }

    #[test]
    fn partial_theme_keeps_other_defaults() {
        let config: Config = toml::from_str(
            "[theme]\nwidth = 1200\n\n[blossoms]\ncount = 40\n",
        )
        .unwrap();
        assert_eq!(config.theme.width, 1200);
        assert_eq!(config.theme.height, 640);
        assert_eq!(config.blossoms.count, 40);
    }

    #[test]
    fn partial_palette_keeps_defaults_for_missing_colors() {
        let config: Config =
            toml::from_str("[theme.day]\naccent = \"ff0000ff\"\n").unwrap();
        assert_eq!(config.theme.day.accent, "ff0000ff");
        assert_eq!(config.theme.day.background, "fff5f7ff");
        // An untouched night table keeps its own colors.
        assert_eq!(config.theme.night.background, "1e1622ff");
    }

    #[test]
    fn parse_color_reads_rrggbbaa() {
        let c = ThemeConfig::parse_color("#ff800040");
        assert_eq!(c, Color::from_rgba8(255, 128, 0, 64));
        // Wrong length falls back to black.
        let c = ThemeConfig::parse_color("fff");
        assert_eq!(c, Color::BLACK);
    }
}
