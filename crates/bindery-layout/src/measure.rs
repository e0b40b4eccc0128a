// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text measurement.
//
// Line folding re-measures growing substrings, so every implementation must
// return identical results for identical input within one run.

use std::path::Path;

use ab_glyph::{Font, FontVec};
use bindery_core::error::{BinderyError, Result};
use tracing::{debug, instrument};

/// Font metrics oracle. A measurer stands for one font face; sizes are in
/// points.
pub trait TextMeasurer {
    /// Advance width of `text`.
    fn text_width(&self, size: f64, text: &str) -> f64;

    fn ascent(&self, size: f64) -> f64;

    /// Descent below the baseline, as a positive length.
    fn descent(&self, size: f64) -> f64;

    fn line_height(&self, size: f64) -> f64 {
        self.ascent(size) + self.descent(size)
    }
}

/// Metrics of the PDF base-14 Courier face: every glyph advances 0.6 em.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourierMetrics;

impl CourierMetrics {
    const ADVANCE: f64 = 0.600;
    const ASCENT: f64 = 0.629;
    const DESCENT: f64 = 0.157;
}

impl TextMeasurer for CourierMetrics {
    fn text_width(&self, size: f64, text: &str) -> f64 {
        text.chars().count() as f64 * Self::ADVANCE * size
    }

    fn ascent(&self, size: f64) -> f64 {
        Self::ASCENT * size
    }

    fn descent(&self, size: f64) -> f64 {
        Self::DESCENT * size
    }
}

/// Metrics read from a TrueType/OpenType font file.
///
/// Advances are summed without kerning; the writers place glyphs the same way.
pub struct TrueTypeMetrics {
    font: FontVec,
    units_per_em: f64,
}

impl TrueTypeMetrics {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_collection(data, 0)
    }

    /// Parse face `index` of a font file or collection.
    pub fn from_collection(data: Vec<u8>, index: u32) -> Result<Self> {
        let font = FontVec::try_from_vec_and_index(data, index)
            .map_err(|err| BinderyError::Font(err.to_string()))?;
        let units_per_em = f64::from(font.units_per_em().unwrap_or(1000.0));
        Ok(Self { font, units_per_em })
    }

    fn scale(&self, size: f64) -> f64 {
        size / self.units_per_em
    }

    /// Glyph index for `c`; 0 (`.notdef`) when the face lacks it.
    pub fn glyph_index(&self, c: char) -> u16 {
        self.font.glyph_id(c).0
    }
}

impl TextMeasurer for TrueTypeMetrics {
    fn text_width(&self, size: f64, text: &str) -> f64 {
        let units: f64 = text
            .chars()
            .map(|c| f64::from(self.font.h_advance_unscaled(self.font.glyph_id(c))))
            .sum();
        units * self.scale(size)
    }

    fn ascent(&self, size: f64) -> f64 {
        f64::from(self.font.ascent_unscaled()) * self.scale(size)
    }

    fn descent(&self, size: f64) -> f64 {
        f64::from(self.font.descent_unscaled()).abs() * self.scale(size)
    }

    fn line_height(&self, size: f64) -> f64 {
        let unscaled = self.font.ascent_unscaled() - self.font.descent_unscaled()
            + self.font.line_gap_unscaled();
        f64::from(unscaled) * self.scale(size)
    }
}

/// Style of a built-in Courier face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourierStyle {
    pub bold: bool,
    pub oblique: bool,
}

impl CourierStyle {
    /// PostScript name of the base-14 face.
    pub fn postscript_name(self) -> &'static str {
        match (self.bold, self.oblique) {
            (false, false) => "Courier",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (true, true) => "Courier-BoldOblique",
        }
    }
}

/// One face used for text: built-in Courier or an embedded font file.
pub enum FontFace {
    Courier(CourierStyle),
    TrueType {
        /// Family name or file path the face was found under.
        name: String,
        /// Raw font file, embedded into the output.
        data: Vec<u8>,
        /// Face index inside a collection.
        index: u32,
        metrics: TrueTypeMetrics,
    },
}

impl FontFace {
    /// Load a font file from disk.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| BinderyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(bytes = data.len(), "loaded font file");
        Self::from_data(path.display().to_string(), data, 0)
            .map_err(|err| BinderyError::Font(format!("{}: {err}", path.display())))
    }

    pub fn from_data(name: impl Into<String>, data: Vec<u8>, index: u32) -> Result<Self> {
        let metrics = TrueTypeMetrics::from_collection(data.clone(), index)?;
        Ok(Self::TrueType {
            name: name.into(),
            data,
            index,
            metrics,
        })
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        match self {
            Self::Courier(_) => &CourierMetrics,
            Self::TrueType { metrics, .. } => metrics,
        }
    }

    /// Font file bytes and face index to embed, if any.
    pub fn embedded(&self) -> Option<(&[u8], u32)> {
        match self {
            Self::Courier(_) => None,
            Self::TrueType { data, index, .. } => Some((data, *index)),
        }
    }

    /// Whether both faces embed the same file face.
    pub fn same_file(&self, other: &FontFace) -> bool {
        match (self.embedded(), other.embedded()) {
            (Some((a, i)), Some((b, j))) => i == j && a == b,
            _ => false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Courier(style) => style.postscript_name(),
            Self::TrueType { name, .. } => name,
        }
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Courier(style) => f.debug_tuple("Courier").field(style).finish(),
            Self::TrueType { name, index, .. } => f
                .debug_struct("TrueType")
                .field("name", name)
                .field("index", index)
                .finish_non_exhaustive(),
        }
    }
}

/// Faces for every text role of a document.
#[derive(Debug)]
pub struct FaceSet {
    pub body: FontFace,
    /// Centred header title.
    pub header_title: FontFace,
    /// Header date and page number.
    pub header_detail: FontFace,
}

impl FaceSet {
    /// Built-in Courier throughout, with a bold title.
    pub fn courier() -> Self {
        Self {
            body: FontFace::Courier(CourierStyle::default()),
            header_title: FontFace::Courier(CourierStyle {
                bold: true,
                oblique: false,
            }),
            header_detail: FontFace::Courier(CourierStyle::default()),
        }
    }

    pub fn measurers(&self) -> MeasurerSet<'_> {
        MeasurerSet {
            body: self.body.measurer(),
            header_title: self.header_title.measurer(),
            header_detail: self.header_detail.measurer(),
        }
    }
}

/// Borrowed measurers per text role.
#[derive(Clone, Copy)]
pub struct MeasurerSet<'a> {
    pub body: &'a dyn TextMeasurer,
    pub header_title: &'a dyn TextMeasurer,
    pub header_detail: &'a dyn TextMeasurer,
}

impl<'a> MeasurerSet<'a> {
    /// Same measurer for every role.
    pub fn uniform(measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            body: measurer,
            header_title: measurer,
            header_detail: measurer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_is_fixed_pitch() {
        let m = CourierMetrics;
        assert_eq!(m.text_width(10.0, "M"), 6.0);
        assert_eq!(m.text_width(10.0, "iiii"), m.text_width(10.0, "MMMM"));
        assert_eq!(m.text_width(10.0, "日本"), 12.0);
        assert_eq!(m.text_width(10.0, ""), 0.0);
    }

    #[test]
    fn courier_vertical_metrics_scale_with_size() {
        let m = CourierMetrics;
        assert!((m.ascent(20.0) - 2.0 * m.ascent(10.0)).abs() < 1e-12);
        assert!(m.descent(10.0) > 0.0);
        assert!((m.line_height(10.0) - (m.ascent(10.0) + m.descent(10.0))).abs() < 1e-12);
    }

    #[test]
    fn measurement_is_deterministic() {
        let m = CourierMetrics;
        let a = m.text_width(9.8, "deterministic");
        let b = m.text_width(9.8, "deterministic");
        assert_eq!(a, b);
    }

    #[test]
    fn garbage_font_file_is_rejected() {
        assert!(matches!(
            TrueTypeMetrics::from_bytes(b"not a font".to_vec()),
            Err(BinderyError::Font(_))
        ));
    }

    #[test]
    fn missing_font_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.ttf");
        assert!(matches!(
            FontFace::from_file(&missing),
            Err(BinderyError::Read { .. })
        ));
    }

    #[test]
    fn courier_faces_embed_nothing() {
        let faces = FaceSet::courier();
        assert!(faces.body.embedded().is_none());
        assert_eq!(faces.header_title.name(), "Courier-Bold");
        assert_eq!(faces.measurers().body.text_width(10.0, "ab"), 12.0);
        assert!(!faces.body.same_file(&faces.header_detail));
    }

    #[test]
    fn courier_style_names() {
        let style = |bold, oblique| CourierStyle { bold, oblique }.postscript_name();
        assert_eq!(style(false, false), "Courier");
        assert_eq!(style(true, true), "Courier-BoldOblique");
        assert_eq!(style(false, true), "Courier-Oblique");
    }

    #[test]
    fn truetype_width_is_the_sum_of_advances() {
        // Kerning pairs like "AV" and "To" must not shrink the measured run.
        let Some(path) = crate::fonts::tests::any_system_font() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let face = FontFace::from_file(&path).unwrap();
        let m = face.measurer();
        for pair in ["AV", "To", "Wa", "LT"] {
            let split: f64 = pair
                .chars()
                .map(|c| m.text_width(12.0, c.encode_utf8(&mut [0; 4])))
                .sum();
            assert!((m.text_width(12.0, pair) - split).abs() < 1e-9, "{pair}");
        }
    }
}
