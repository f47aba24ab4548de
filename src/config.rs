use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::inline::RunDefaults;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

const FALLBACK_HEADING_SIZES: [u32; 5] = [28, 24, 22, 20, 20];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Document,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document_type: DocumentType,
    pub style: Style,
}

/// Resolved style values. Sizes are half-points, spacing is twips.
///
/// Sizes left unset fall back to per-element defaults when rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Style {
    pub title_size: Option<u32>,
    /// Sizes for heading levels 2 and deeper.
    pub heading_sizes: Vec<u32>,
    pub paragraph_size: Option<u32>,
    pub list_item_size: Option<u32>,
    pub blockquote_size: Option<u32>,
    pub code_block_size: Option<u32>,
    pub heading_spacing: u32,
    pub paragraph_spacing: u32,
    pub line_spacing: f32,
    pub heading_alignment: Option<Alignment>,
    pub heading1_alignment: Option<Alignment>,
    pub heading2_alignment: Option<Alignment>,
    pub heading3_alignment: Option<Alignment>,
    pub heading4_alignment: Option<Alignment>,
    pub heading5_alignment: Option<Alignment>,
    pub heading6_alignment: Option<Alignment>,
    pub paragraph_alignment: Option<Alignment>,
    pub blockquote_alignment: Option<Alignment>,
    pub direction: Direction,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            title_size: Some(32),
            heading_sizes: FALLBACK_HEADING_SIZES.to_vec(),
            paragraph_size: Some(24),
            list_item_size: Some(24),
            blockquote_size: Some(24),
            code_block_size: Some(20),
            heading_spacing: 240,
            paragraph_spacing: 240,
            line_spacing: 1.15,
            heading_alignment: None,
            heading1_alignment: None,
            heading2_alignment: None,
            heading3_alignment: None,
            heading4_alignment: None,
            heading5_alignment: None,
            heading6_alignment: None,
            paragraph_alignment: None,
            blockquote_alignment: None,
            direction: Direction::Ltr,
        }
    }
}

impl Style {
    pub fn right_to_left(&self) -> bool {
        self.direction == Direction::Rtl
    }

    /// Run sizing for body text and inline code.
    pub fn run_defaults(&self) -> RunDefaults {
        RunDefaults::from_paragraph_size(self.paragraph_size, self.right_to_left())
    }

    /// Font size for a heading level. Level 1 uses the title size.
    pub fn heading_size(&self, level: u8) -> u32 {
        if level <= 1 {
            return self.title_size.unwrap_or(32);
        }
        let index = usize::from(level - 2);
        self.heading_sizes
            .get(index)
            .or_else(|| FALLBACK_HEADING_SIZES.get(index))
            .copied()
            .unwrap_or(20)
    }

    /// Alignment for a heading level: the level-specific setting, then the
    /// general heading setting, then left.
    pub fn alignment_for_heading(&self, level: u8) -> Alignment {
        let specific = match level {
            1 => self.heading1_alignment,
            2 => self.heading2_alignment,
            3 => self.heading3_alignment,
            4 => self.heading4_alignment,
            5 => self.heading5_alignment,
            6 => self.heading6_alignment,
            _ => None,
        };
        specific
            .or(self.heading_alignment)
            .unwrap_or(Alignment::Left)
    }
}

impl Config {
    /// The bundled defaults from `default_config.toml`.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load config from a TOML file. Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            config_path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            config_path: path.to_path_buf(),
            source,
        })
    }
}
