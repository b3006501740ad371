//! Variant data model
//!
//! `SizeConfig` is one entry of the user-facing `sizes` list; `VariantSpec` is the resolved
//! form the orchestrator works from, with the global defaults already applied.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConfigError;

/// Resize fit strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FitType {
    /// Fill the box, cropping the overflow at the anchor position
    Cover,
    /// Fit within the box and pad to the box at the anchor position
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio
    Fill,
    /// Preserve aspect ratio, result no larger than the box
    Inside,
    /// Preserve aspect ratio, result no smaller than the box
    #[default]
    Outside,
}

impl FromStr for FitType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cover" => Ok(FitType::Cover),
            "contain" => Ok(FitType::Contain),
            "fill" => Ok(FitType::Fill),
            "inside" => Ok(FitType::Inside),
            "outside" => Ok(FitType::Outside),
            _ => Err(ConfigError::InvalidFit(s.to_string())),
        }
    }
}

impl TryFrom<String> for FitType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FitType> for String {
    fn from(value: FitType) -> Self {
        value.to_string()
    }
}

impl Display for FitType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FitType::Cover => write!(f, "cover"),
            FitType::Contain => write!(f, "contain"),
            FitType::Fill => write!(f, "fill"),
            FitType::Inside => write!(f, "inside"),
            FitType::Outside => write!(f, "outside"),
        }
    }
}

/// Anchor used by `cover` cropping and `contain` padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    #[default]
    Centre,
    Top,
    RightTop,
    Right,
    RightBottom,
    Bottom,
    LeftBottom,
    Left,
    LeftTop,
}

impl Position {
    /// Horizontal and vertical weights in `0.0..=1.0` (0 = left/top, 1 = right/bottom).
    pub fn weights(self) -> (f32, f32) {
        match self {
            Position::Centre => (0.5, 0.5),
            Position::Top => (0.5, 0.0),
            Position::RightTop => (1.0, 0.0),
            Position::Right => (1.0, 0.5),
            Position::RightBottom => (1.0, 1.0),
            Position::Bottom => (0.5, 1.0),
            Position::LeftBottom => (0.0, 1.0),
            Position::Left => (0.0, 0.5),
            Position::LeftTop => (0.0, 0.0),
        }
    }
}

impl FromStr for Position {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "centre" | "center" => Ok(Position::Centre),
            "top" | "north" => Ok(Position::Top),
            "right top" | "northeast" => Ok(Position::RightTop),
            "right" | "east" => Ok(Position::Right),
            "right bottom" | "southeast" => Ok(Position::RightBottom),
            "bottom" | "south" => Ok(Position::Bottom),
            "left bottom" | "southwest" => Ok(Position::LeftBottom),
            "left" | "west" => Ok(Position::Left),
            "left top" | "northwest" => Ok(Position::LeftTop),
            _ => Err(ConfigError::InvalidPosition(s.to_string())),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(value: Position) -> Self {
        value.to_string()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Position::Centre => "centre",
            Position::Top => "top",
            Position::RightTop => "right top",
            Position::Right => "right",
            Position::RightBottom => "right bottom",
            Position::Bottom => "bottom",
            Position::LeftBottom => "left bottom",
            Position::Left => "left",
            Position::LeftTop => "left top",
        };
        write!(f, "{}", name)
    }
}

/// Per-size resize overrides as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// One entry of the configured `sizes` list. `{}` means "the original, unsuffixed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub options: SizeOptions,
    #[serde(default, rename = "webP")]
    pub web_p: bool,
}

impl SizeConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_web_p(mut self, web_p: bool) -> Self {
        self.web_p = web_p;
        self
    }
}

/// Resolved resize options for one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResizeOptions {
    pub fit: FitType,
    pub position: Position,
}

/// One requested output variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    /// Filename suffix; `None` is the primary, unsuffixed variant.
    pub label: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resize: ResizeOptions,
    pub produces_web_alternate: bool,
}

impl VariantSpec {
    /// Label reported in results: the suffix, or `original` for the primary variant.
    pub fn variant_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => "original",
        }
    }

    /// Unconstrained variant at the source resolution.
    pub fn original() -> Self {
        Self {
            label: None,
            width: None,
            height: None,
            resize: ResizeOptions::default(),
            produces_web_alternate: false,
        }
    }
}
