//! Caption style types.
//!
//! Keys use camelCase on the wire (`fontSize`, `fontColor`, ...). Every field
//! is optional; omitted fields take the documented defaults.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::job::JobError;

/// Default caption font size in pixels.
pub const DEFAULT_FONT_SIZE: f64 = 60.0;

/// Default caption fill color.
pub const DEFAULT_FONT_COLOR: &str = "white";

/// Accepted caption font sizes.
pub const FONT_SIZE_RANGE: RangeInclusive<f64> = 10.0..=200.0;

/// Caption styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f64,

    /// Fill color: a named color or `#RRGGBB[AA]` / `0xRRGGBB[AA]`,
    /// optionally followed by `@alpha`.
    pub font_color: String,

    /// Vertical placement of the caption block.
    pub position: TextPosition,

    /// Fontconfig family name. Falls back to the configured default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    /// Box color drawn behind each caption line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Vertical caption placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            position: TextPosition::Center,
            font_family: None,
            background_color: None,
        }
    }
}

impl TextStyle {
    /// Check ranges and color syntax.
    pub fn validate(&self) -> Result<(), JobError> {
        if !self.font_size.is_finite() || !FONT_SIZE_RANGE.contains(&self.font_size) {
            return Err(JobError::invalid(format!(
                "fontSize must be between {} and {} (got {})",
                FONT_SIZE_RANGE.start(),
                FONT_SIZE_RANGE.end(),
                self.font_size
            )));
        }

        if !is_valid_color(&self.font_color) {
            return Err(JobError::invalid(format!(
                "fontColor is not a color: {:?}",
                self.font_color
            )));
        }

        if let Some(bg) = &self.background_color {
            if !is_valid_color(bg) {
                return Err(JobError::invalid(format!(
                    "backgroundColor is not a color: {bg:?}"
                )));
            }
        }

        if let Some(family) = &self.font_family {
            if family.trim().is_empty() {
                return Err(JobError::invalid("fontFamily must not be empty"));
            }
        }

        Ok(())
    }
}

impl TextPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Whether `value` is a color ffmpeg's color parser accepts in the subset
/// qtov allows: a name made of ASCII letters, or a 6/8 digit hex literal,
/// either optionally followed by `@alpha` with alpha in `[0, 1]`.
pub fn is_valid_color(value: &str) -> bool {
    let (base, alpha) = match value.split_once('@') {
        Some((base, alpha)) => (base, Some(alpha)),
        None => (value, None),
    };

    if let Some(alpha) = alpha {
        match alpha.parse::<f64>() {
            Ok(a) if (0.0..=1.0).contains(&a) => {}
            _ => return false,
        }
    }

    let hex = base
        .strip_prefix('#')
        .or_else(|| base.strip_prefix("0x"))
        .or_else(|| base.strip_prefix("0X"));

    match hex {
        Some(digits) => {
            matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => !base.is_empty() && base.chars().all(|c| c.is_ascii_alphabetic()),
    }
}
