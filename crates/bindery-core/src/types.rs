// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for page layout.
//
// All lengths are PostScript points (1 in = 72 pt).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BinderyError;

/// Points per inch.
pub const PT_PER_INCH: f64 = 72.0;
/// Points per millimetre, as used when converting margin settings.
pub const PT_PER_MM: f64 = 2.8346;

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A3,
    A4,
    A5,
    B3,
    B4,
    B5,
    Letter,
    Legal,
    Custom { width_pt: f64, height_pt: f64 },
}

impl PaperSize {
    /// Portrait dimensions in points (width, height).
    pub fn dimensions_pt(&self) -> (f64, f64) {
        match self {
            Self::A3 => (841.89, 1190.55),
            Self::A4 => (595.27, 841.89),
            Self::A5 => (419.52, 595.27),
            Self::B3 => (1031.81, 1459.84),
            Self::B4 => (728.50, 1031.81),
            Self::B5 => (515.90, 728.50),
            Self::Letter => (612.00, 792.00),
            Self::Legal => (612.00, 1008.00),
            Self::Custom {
                width_pt,
                height_pt,
            } => (*width_pt, *height_pt),
        }
    }

    /// Sheet dimensions as laid out for `orientation` (width, height).
    pub fn oriented_pt(&self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.dimensions_pt();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Lowercase name accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::A3 => "a3",
            Self::A4 => "a4",
            Self::A5 => "a5",
            Self::B3 => "b3",
            Self::B4 => "b4",
            Self::B5 => "b5",
            Self::Letter => "letter",
            Self::Legal => "legal",
            Self::Custom { .. } => "custom",
        }
    }
}

impl FromStr for PaperSize {
    type Err = BinderyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "b3" => Ok(Self::B3),
            "b4" => Ok(Self::B4),
            "b5" => Ok(Self::B5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            _ => Err(BinderyError::UnknownPaper(s.to_string())),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn is_portrait(&self) -> bool {
        matches!(self, Self::Portrait)
    }
}

/// Number of text columns laid out on one sheet side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Columns {
    One,
    Two,
}

impl Columns {
    pub fn count(&self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

/// Sheet edge reserved for the binding margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingEdge {
    Long,
    Short,
    /// No binding: the binding margin collapses to the outer margin and the
    /// layout behaves as long-edge without punch marks.
    None,
}

impl BindingEdge {
    /// Parse the one-letter code used by the command line and rc file.
    ///
    /// Only the first character is significant (`long`, `l`, `s`, ...).
    pub fn from_code(code: &str) -> Result<Self, BinderyError> {
        match code.chars().next() {
            Some('l') => Ok(Self::Long),
            Some('s') => Ok(Self::Short),
            Some('n') => Ok(Self::None),
            _ => Err(BinderyError::UnknownBindingEdge(code.to_string())),
        }
    }

    /// Whether geometry treats this edge as the long edge.
    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long | Self::None)
    }
}

/// Direction a punch mark points, towards the binding edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Unit that margin settings are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Inch,
}

impl Unit {
    pub fn to_pt(&self, value: f64) -> f64 {
        match self {
            Self::Mm => value * PT_PER_MM,
            Self::Inch => value * PT_PER_INCH,
        }
    }
}

/// Which timestamp the page header shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// The input file's modification time.
    #[default]
    Modified,
    /// The time of conversion.
    Current,
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    /// DSC-conforming PostScript level 3.
    #[serde(rename = "ps")]
    PostScript,
}

impl OutputFormat {
    /// File extension appended to input names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PostScript => "ps",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = BinderyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "ps" | "postscript" => Ok(Self::PostScript),
            _ => Err(BinderyError::invalid("format", s)),
        }
    }
}

/// Slant of the header face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontSlant {
    pub fn is_upright(self) -> bool {
        self == Self::Normal
    }
}

impl FromStr for FontSlant {
    type Err = BinderyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "italic" => Ok(Self::Italic),
            "oblique" => Ok(Self::Oblique),
            _ => Err(BinderyError::invalid("header-slant", s)),
        }
    }
}

/// Weight of the header title face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

impl FromStr for FontWeight {
    type Err = BinderyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "bold" => Ok(Self::Bold),
            _ => Err(BinderyError::invalid("header-weight", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(s)
    }
}
