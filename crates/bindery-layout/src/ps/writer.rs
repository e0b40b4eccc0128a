// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostScript writer: serialise composed sheet sides as DSC-conforming
// PostScript.
//
// Built-in Courier faces are referenced by name. Font files are embedded as
// Type 42 CIDFonts composed with Identity-H, so text is shown as 16-bit glyph
// indices. As with PDF, every y coordinate is flipped against the side height.

use std::fmt::Write as _;

use bindery_core::error::Result;
use bindery_core::{BindingEdge, LayoutConfig};
use tracing::{debug, info, instrument, warn};

use super::sfnt::Sfnt;
use crate::compose::{DrawCommand, FontRole, Rgb, SheetSide};
use crate::measure::{CourierStyle, FaceSet, FontFace, TrueTypeMetrics};
use crate::shapes::{fold_arrow, punch_triangle};

/// Procedures shared by every page.
const PROLOG: &str = "\
/N { newpath moveto } bind def
/L { lineto } bind def
/RGB { setrgbcolor } bind def
/LW { setlinewidth } bind def
/F { selectfont } bind def
";

const HEX_LINE: usize = 72;

/// Resolved font for one text role.
#[derive(Clone)]
enum PsFont<'f> {
    Builtin(&'static str),
    Embedded {
        name: String,
        metrics: &'f TrueTypeMetrics,
    },
}

impl PsFont<'_> {
    fn name(&self) -> &str {
        match self {
            Self::Builtin(name) => name,
            Self::Embedded { name, .. } => name,
        }
    }
}

/// Fonts per role plus the setup code that defines them.
struct FontSet<'f> {
    body: PsFont<'f>,
    header_title: PsFont<'f>,
    header_detail: PsFont<'f>,
    /// Resource definitions for the setup section.
    setup: String,
}

impl<'f> FontSet<'f> {
    fn register(faces: &'f FaceSet) -> Self {
        let mut setup = String::new();
        let mut added: Vec<(&'f FontFace, PsFont<'f>)> = Vec::new();
        let mut font_for = |face: &'f FontFace| -> PsFont<'f> {
            let (style, data, index, metrics) = match face {
                FontFace::Courier(style) => return PsFont::Builtin(style.postscript_name()),
                FontFace::TrueType {
                    data,
                    index,
                    metrics,
                    ..
                } => (CourierStyle::default(), data, *index, metrics),
            };
            if let Some((_, font)) = added.iter().find(|(seen, _)| seen.same_file(face)) {
                return font.clone();
            }
            let sfnt = match Sfnt::extract(data, index) {
                Ok(sfnt) => sfnt,
                Err(err) => {
                    warn!(
                        font = face.name(),
                        error = %err,
                        "cannot embed font in PostScript, using Courier"
                    );
                    return PsFont::Builtin(style.postscript_name());
                }
            };
            let name = format!("BinderyF{}", added.len() + 1);
            setup.push_str(&cid_font_resource(&name, &sfnt));
            debug!(font = face.name(), resource = %name, "embedded Type 42 font");
            let font = PsFont::Embedded { name, metrics };
            added.push((face, font.clone()));
            font
        };
        let body = font_for(&faces.body);
        let header_title = font_for(&faces.header_title);
        let header_detail = font_for(&faces.header_detail);
        Self {
            body,
            header_title,
            header_detail,
            setup,
        }
    }

    fn get(&self, role: FontRole) -> &PsFont<'f> {
        match role {
            FontRole::Body => &self.body,
            FontRole::HeaderTitle => &self.header_title,
            FontRole::HeaderDetail => &self.header_detail,
        }
    }

    fn builtin_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for font in [&self.body, &self.header_title, &self.header_detail] {
            if let PsFont::Builtin(name) = font {
                if !names.contains(name) {
                    names.push(*name);
                }
            }
        }
        names
    }

    fn embeds(&self) -> bool {
        !self.setup.is_empty()
    }
}

/// Turns sheet sides into a PostScript document.
pub struct PsWriter {
    title: String,
    /// Binding edge when printing duplex; `None` for simplex.
    duplex: Option<BindingEdge>,
}

impl PsWriter {
    /// A simplex document.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            duplex: None,
        }
    }

    /// Request duplex printing, tumbling for short-edge binding.
    pub fn duplex(mut self, edge: BindingEdge) -> Self {
        self.duplex = Some(edge);
        self
    }

    pub fn for_layout(title: impl Into<String>, layout: &LayoutConfig) -> Self {
        let writer = Self::new(title);
        if layout.duplex {
            writer.duplex(layout.binding_edge)
        } else {
            writer
        }
    }

    /// Render every side as one PostScript page.
    #[instrument(skip_all, fields(title = %self.title, sides = sides.len()))]
    pub fn render(&self, sides: &[SheetSide], faces: &FaceSet) -> Result<Vec<u8>> {
        let fonts = FontSet::register(faces);
        let width = sides.iter().map(|s| s.width).fold(0.0, f64::max);
        let height = sides.iter().map(|s| s.height).fold(0.0, f64::max);

        let mut out = String::new();
        out.push_str("%!PS-Adobe-3.0\n");
        let _ = writeln!(out, "%%Creator: bindery {}", env!("CARGO_PKG_VERSION"));
        let _ = writeln!(out, "%%Title: {}", ps_string(self.title.as_bytes()));
        let _ = writeln!(out, "%%Pages: {}", sides.len());
        let _ = writeln!(
            out,
            "%%BoundingBox: 0 0 {} {}",
            width.ceil() as i64,
            height.ceil() as i64
        );
        let _ = writeln!(out, "%%DocumentMedia: plain {} {} 0 () ()", num(width), num(height));
        let _ = writeln!(out, "%%LanguageLevel: {}", if fonts.embeds() { 3 } else { 2 });
        for (i, name) in fonts.builtin_names().iter().enumerate() {
            let lead = if i == 0 { "%%DocumentNeededResources:" } else { "%%+" };
            let _ = writeln!(out, "{lead} font {name}");
        }
        if self.duplex.is_some() {
            out.push_str("%%Requirements: duplex\n");
        }
        out.push_str("%%EndComments\n");

        out.push_str("%%BeginProlog\n");
        out.push_str(PROLOG);
        out.push_str("%%EndProlog\n");

        out.push_str("%%BeginSetup\n");
        if let Some(edge) = self.duplex {
            let feature = if edge.is_long() {
                "DuplexNoTumble"
            } else {
                "DuplexTumble"
            };
            let _ = writeln!(out, "%%IncludeFeature: *Duplex {feature}");
        }
        out.push_str(&fonts.setup);
        out.push_str("%%EndSetup\n");

        for (i, side) in sides.iter().enumerate() {
            let _ = writeln!(out, "%%Page: {0} {0}", i + 1);
            let _ = writeln!(
                out,
                "%%PageBoundingBox: 0 0 {} {}",
                side.width.ceil() as i64,
                side.height.ceil() as i64
            );
            out.push_str("save\n");
            for command in &side.commands {
                push_command(&mut out, command, side.height, &fonts);
            }
            out.push_str("restore\nshowpage\n");
        }

        out.push_str("%%Trailer\n%%EOF\n");
        info!(bytes = out.len(), "PostScript rendered");
        Ok(out.into_bytes())
    }
}

// -- Command translation ------------------------------------------------------

fn push_command(out: &mut String, command: &DrawCommand, height: f64, fonts: &FontSet<'_>) {
    let flip = |x: f64, y: f64| format!("{} {}", num(x), num(height - y));

    match command {
        DrawCommand::Text {
            x,
            y,
            size,
            role,
            text,
            color,
        } => {
            let font = fonts.get(*role);
            let shown = match font {
                PsFont::Builtin(_) => {
                    let bytes: Vec<u8> = text
                        .chars()
                        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                        .collect();
                    if !text.is_ascii() {
                        warn_once_non_ascii();
                    }
                    ps_string(&bytes)
                }
                PsFont::Embedded { metrics, .. } => {
                    let glyphs: Vec<u16> = text.chars().map(|c| metrics.glyph_index(c)).collect();
                    glyph_hex(&glyphs)
                }
            };
            let _ = writeln!(
                out,
                "{} RGB /{} {} F {} N {shown} show",
                rgb(*color),
                font.name(),
                num(*size),
                flip(*x, *y),
            );
        }
        DrawCommand::Line {
            x,
            y,
            dx,
            dy,
            width,
            color,
        } => {
            let points = [flip(*x, *y), flip(x + dx, y + dy)];
            stroke(out, &points, false, *width, *color);
        }
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            line_width,
            color,
        } => {
            let corners = [
                flip(*x, *y),
                flip(x + width, *y),
                flip(x + width, y + height),
                flip(*x, y + height),
            ];
            stroke(out, &corners, true, *line_width, *color);
        }
        DrawCommand::PunchMark { direction, x, y } => {
            if let Some(points) = punch_triangle(*direction, *x, *y) {
                let points: Vec<String> = points.iter().map(|&(px, py)| flip(px, py)).collect();
                let _ = write!(out, "{} RGB ", rgb(Rgb::BLACK));
                path(out, &points);
                out.push_str(" closepath fill\n");
            }
        }
        DrawCommand::FoldArrow {
            kind,
            x,
            y,
            edge,
            line_width,
            color,
        } => {
            for segment in fold_arrow(*kind, *x, *y, *edge, *line_width) {
                let points: Vec<String> = segment.iter().map(|&(px, py)| flip(px, py)).collect();
                stroke(out, &points, false, *line_width, *color);
            }
        }
    }
}

fn stroke(out: &mut String, points: &[String], closed: bool, width: f64, color: Rgb) {
    let _ = write!(out, "{} RGB {} LW ", rgb(color), num(width));
    path(out, points);
    if closed {
        out.push_str(" closepath");
    }
    out.push_str(" stroke\n");
}

fn path(out: &mut String, points: &[String]) {
    for (i, point) in points.iter().enumerate() {
        let op = if i == 0 { "N" } else { "L" };
        let _ = write!(out, "{}{point} {op}", if i == 0 { "" } else { " " });
    }
}

/// Type 42 CIDFont resource for `sfnt`, composed into font `name`.
fn cid_font_resource(name: &str, sfnt: &Sfnt) -> String {
    let [llx, lly, urx, ury] = sfnt.bbox;
    let mut out = String::new();
    let _ = writeln!(out, "%%BeginResource: CIDFont {name}-CID");
    out.push_str("20 dict begin\n");
    let _ = writeln!(out, "/CIDFontName /{name}-CID def");
    out.push_str("/CIDFontType 2 def\n");
    out.push_str(
        "/CIDSystemInfo 3 dict dup begin /Registry (Adobe) def /Ordering (Identity) def \
         /Supplement 0 def end def\n",
    );
    out.push_str("/FontType 42 def\n/FontMatrix [1 0 0 1 0 0] def\n/PaintType 0 def\n");
    let _ = writeln!(
        out,
        "/FontBBox [{} {} {} {}] def",
        num(llx),
        num(lly),
        num(urx),
        num(ury)
    );
    let _ = writeln!(out, "/CIDCount {} def", sfnt.glyph_count);
    out.push_str("/GDBytes 2 def\n/CIDMap 0 def\n");
    out.push_str("/CharStrings 1 dict dup begin /.notdef 0 def end def\n");
    out.push_str("/sfnts [\n");
    for chunk in sfnt.strings() {
        hex_string(&mut out, chunk);
    }
    out.push_str("] def\n");
    out.push_str("CIDFontName currentdict end /CIDFont defineresource pop\n");
    out.push_str("%%EndResource\n");
    let _ = writeln!(
        out,
        "/{name} /Identity-H [/{name}-CID /CIDFont findresource] composefont pop"
    );
    out
}

/// One `sfnts` string: the data plus a trailing pad byte.
fn hex_string(out: &mut String, data: &[u8]) {
    out.push('<');
    for (i, byte) in data.iter().chain(std::iter::once(&0u8)).enumerate() {
        if i > 0 && i % (HEX_LINE / 2) == 0 {
            out.push('\n');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out.push_str(">\n");
}

/// Glyph indices as an Identity-H hex string.
fn glyph_hex(glyphs: &[u16]) -> String {
    let mut out = String::with_capacity(glyphs.len() * 4 + 2);
    out.push('<');
    for g in glyphs {
        let _ = write!(out, "{g:04X}");
    }
    out.push('>');
    out
}

/// A PostScript literal string; bytes outside printable ASCII become octal.
fn ps_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push(')');
    out
}

fn rgb(color: Rgb) -> String {
    format!(
        "{} {} {}",
        num(f64::from(color.r)),
        num(f64::from(color.g)),
        num(f64::from(color.b))
    )
}

/// Coordinates to two decimals without trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn warn_once_non_ascii() {
    use std::sync::Once;
    static WARNED: Once = Once::new();
    WARNED.call_once(|| {
        warn!("built-in Courier cannot show non-ASCII text; install the font or pass one with -F");
    });
}
