// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font lookup: turn a configured font (family name or file path) into a face.
//
// Family names are matched against the system font database. A family that
// is not installed falls back to built-in Courier with a warning; a file path
// that cannot be read is an error.

use std::path::Path;

use bindery_core::error::Result;
use bindery_core::{FontSlant, FontWeight, RenderOptions};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use tracing::{debug, info, instrument, warn};

use crate::measure::{CourierStyle, FaceSet, FontFace};

/// Name that always selects the built-in face, with no lookup.
pub const BUILTIN_FAMILY: &str = "Courier";

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Installed families tried, in order, for the generic names.
const SANS_SERIF: [&str; 5] = ["DejaVu Sans", "Liberation Sans", "Noto Sans", "Arial", "Helvetica"];
const SERIF: [&str; 4] = ["DejaVu Serif", "Liberation Serif", "Noto Serif", "Times New Roman"];
const MONOSPACE: [&str; 4] = ["DejaVu Sans Mono", "Liberation Mono", "Noto Sans Mono", "Courier New"];

/// Whether `spec` names a font file rather than a family.
pub fn looks_like_path(spec: &str) -> bool {
    let path = Path::new(spec);
    spec.contains(std::path::MAIN_SEPARATOR)
        || spec.contains('/')
        || path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

pub fn is_builtin(spec: &str) -> bool {
    spec.eq_ignore_ascii_case(BUILTIN_FAMILY)
}

/// Whether resolving `spec` needs the system font database.
pub fn needs_lookup(spec: &str) -> bool {
    !is_builtin(spec) && !looks_like_path(spec)
}

/// Resolves font settings against a font database.
pub struct FontLocator {
    db: Database,
}

impl FontLocator {
    /// Scan the fonts installed on this system.
    #[instrument]
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system font database");
        Self { db }
    }

    /// A locator that knows no families; every name falls back to Courier.
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
        }
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Resolve every text role of a run.
    pub fn faces(&self, render: &RenderOptions) -> Result<FaceSet> {
        let faces = FaceSet {
            body: self.locate(&render.font, FontWeight::Normal, FontSlant::Normal)?,
            header_title: self.locate(
                &render.header_font,
                render.header_weight,
                render.header_slant,
            )?,
            header_detail: self.locate(
                &render.header_font,
                FontWeight::Normal,
                render.header_slant,
            )?,
        };
        info!(
            body = faces.body.name(),
            header = faces.header_title.name(),
            "fonts resolved"
        );
        Ok(faces)
    }

    /// Resolve one font setting in the given style.
    pub fn locate(&self, spec: &str, weight: FontWeight, slant: FontSlant) -> Result<FontFace> {
        let fallback = FontFace::Courier(CourierStyle {
            bold: weight == FontWeight::Bold,
            oblique: !slant.is_upright(),
        });
        if is_builtin(spec) {
            return Ok(fallback);
        }
        if looks_like_path(spec) {
            return FontFace::from_file(Path::new(spec));
        }

        let families = candidate_families(spec);
        let query = Query {
            families: &families,
            weight: match weight {
                FontWeight::Normal => Weight::NORMAL,
                FontWeight::Bold => Weight::BOLD,
            },
            stretch: Stretch::Normal,
            style: match slant {
                FontSlant::Normal => Style::Normal,
                FontSlant::Italic => Style::Italic,
                FontSlant::Oblique => Style::Oblique,
            },
        };

        let Some(id) = self.db.query(&query) else {
            warn!(family = spec, "font family not found, using built-in Courier");
            return Ok(fallback);
        };
        let name = self
            .db
            .face(id)
            .map(|info| info.post_script_name.clone())
            .unwrap_or_else(|| spec.to_string());
        let Some((data, index)) = self.db.with_face_data(id, |data, index| (data.to_vec(), index))
        else {
            warn!(family = spec, "font data unavailable, using built-in Courier");
            return Ok(fallback);
        };
        match FontFace::from_data(name, data, index) {
            Ok(face) => {
                debug!(family = spec, face = face.name(), index, "font family resolved");
                Ok(face)
            }
            Err(err) => {
                warn!(family = spec, error = %err, "font unusable, using built-in Courier");
                Ok(fallback)
            }
        }
    }
}

fn candidate_families(spec: &str) -> Vec<Family<'_>> {
    let (generic, names): (Family<'_>, &[&str]) = match spec.to_ascii_lowercase().as_str() {
        "sans-serif" | "sans" => (Family::SansSerif, &SANS_SERIF[..]),
        "serif" => (Family::Serif, &SERIF[..]),
        "monospace" | "mono" => (Family::Monospace, &MONOSPACE[..]),
        _ => return vec![Family::Name(spec)],
    };
    std::iter::once(generic)
        .chain(names.iter().map(|name| Family::Name(name)))
        .collect()
}
