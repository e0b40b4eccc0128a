// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: serialise composed sheet sides using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. The composer works top-down; PDF user space grows
// upward, so every y coordinate is flipped against the side height here.

use bindery_core::error::{BinderyError, Result};
use printpdf::{
    BuiltinFont, Color, FontId, Line, LinePoint, Mm, Op, PaintMode, ParsedFont, PdfDocument,
    PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Polygon, PolygonRing, Pt, TextItem, WindingOrder,
};
use tracing::{debug, info, instrument, warn};

use crate::compose::{DrawCommand, FontRole, Rgb, SheetSide};
use crate::measure::{CourierStyle, FaceSet, FontFace};
use crate::shapes::{fold_arrow, punch_triangle};

/// Resolved font for one text role.
#[derive(Clone)]
enum PdfFont {
    Builtin(BuiltinFont),
    External(FontId),
}

/// Fonts per role for one document.
struct FontSet {
    body: PdfFont,
    header_title: PdfFont,
    header_detail: PdfFont,
}

impl FontSet {
    /// Register every face with `doc`, embedding each font file once.
    fn register<'f>(
        doc: &mut PdfDocument,
        faces: &'f FaceSet,
        warnings: &mut Vec<PdfWarnMsg>,
    ) -> Result<Self> {
        let mut added: Vec<(&'f FontFace, FontId)> = Vec::new();
        let mut font_for = |face: &'f FontFace| -> Result<PdfFont> {
            let Some((data, index)) = face.embedded() else {
                return Ok(PdfFont::Builtin(builtin(face)));
            };
            if let Some((_, id)) = added.iter().find(|(seen, _)| seen.same_file(face)) {
                return Ok(PdfFont::External(id.clone()));
            }
            let parsed = ParsedFont::from_bytes(data, index as usize, &mut *warnings).ok_or_else(|| {
                BinderyError::Font(format!("{}: font could not be embedded", face.name()))
            })?;
            let id = doc.add_font(&parsed);
            debug!(font = face.name(), "embedded font");
            added.push((face, id.clone()));
            Ok(PdfFont::External(id))
        };
        Ok(Self {
            body: font_for(&faces.body)?,
            header_title: font_for(&faces.header_title)?,
            header_detail: font_for(&faces.header_detail)?,
        })
    }

    fn get(&self, role: FontRole) -> &PdfFont {
        match role {
            FontRole::Body => &self.body,
            FontRole::HeaderTitle => &self.header_title,
            FontRole::HeaderDetail => &self.header_detail,
        }
    }
}

fn builtin(face: &FontFace) -> BuiltinFont {
    let style = match face {
        FontFace::Courier(style) => *style,
        FontFace::TrueType { .. } => CourierStyle::default(),
    };
    match (style.bold, style.oblique) {
        (false, false) => BuiltinFont::Courier,
        (true, false) => BuiltinFont::CourierBold,
        (false, true) => BuiltinFont::CourierOblique,
        (true, true) => BuiltinFont::CourierBoldOblique,
    }
}

/// Turns sheet sides into a PDF byte stream.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Render every side as one PDF page, embedding font files in `faces`.
    #[instrument(skip_all, fields(title = %self.title, sides = sides.len()))]
    pub fn render(&self, sides: &[SheetSide], faces: &FaceSet) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(&self.title);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let fonts = FontSet::register(&mut doc, faces, &mut warnings)?;

        let pages: Vec<PdfPage> = sides
            .iter()
            .map(|side| {
                let mut ops = Vec::with_capacity(side.commands.len() * 4);
                for command in &side.commands {
                    push_command(&mut ops, command, side.height, &fonts);
                }
                PdfPage::new(mm(side.width), mm(side.height), ops)
            })
            .collect();
        doc.with_pages(pages);

        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }
        info!(bytes = output.len(), "PDF rendered");
        Ok(output)
    }
}

// -- Op translation -----------------------------------------------------------

fn push_command(ops: &mut Vec<Op>, command: &DrawCommand, height: f64, fonts: &FontSet) {
    let flip = |x: f64, y: f64| Point {
        x: Pt(x as f32),
        y: Pt((height - y) as f32),
    };

    match command {
        DrawCommand::Text {
            x,
            y,
            size,
            role,
            text,
            color,
        } => {
            let size = Pt(*size as f32);
            let items = vec![TextItem::Text(text.clone())];
            ops.push(Op::StartTextSection);
            ops.push(Op::SetFillColor { col: color_of(*color) });
            ops.push(Op::SetTextCursor { pos: flip(*x, *y) });
            match fonts.get(*role) {
                PdfFont::Builtin(font) => {
                    if !text.is_ascii() {
                        warn_once_non_ascii();
                    }
                    ops.push(Op::SetFontSizeBuiltinFont { size, font: *font });
                    ops.push(Op::WriteTextBuiltinFont { items, font: *font });
                }
                PdfFont::External(font) => {
                    ops.push(Op::SetFontSize {
                        size,
                        font: font.clone(),
                    });
                    ops.push(Op::WriteText {
                        items,
                        font: font.clone(),
                    });
                }
            }
            ops.push(Op::EndTextSection);
        }
        DrawCommand::Line {
            x,
            y,
            dx,
            dy,
            width,
            color,
        } => {
            stroke(ops, &[flip(*x, *y), flip(x + dx, y + dy)], false, *width, *color);
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
            stroke(ops, &corners, true, *line_width, *color);
        }
        DrawCommand::PunchMark { direction, x, y } => {
            if let Some(points) = punch_triangle(*direction, *x, *y) {
                ops.push(Op::SetFillColor {
                    col: color_of(Rgb::BLACK),
                });
                ops.push(Op::DrawPolygon {
                    polygon: Polygon {
                        rings: vec![PolygonRing {
                            points: points
                                .iter()
                                .map(|&(px, py)| corner(flip(px, py)))
                                .collect(),
                        }],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::NonZero,
                    },
                });
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
            for path in fold_arrow(*kind, *x, *y, *edge, *line_width) {
                let points: Vec<Point> = path.iter().map(|&(px, py)| flip(px, py)).collect();
                stroke(ops, &points, false, *line_width, *color);
            }
        }
    }
}

fn stroke(ops: &mut Vec<Op>, points: &[Point], closed: bool, width: f64, color: Rgb) {
    ops.push(Op::SetOutlineColor { col: color_of(color) });
    ops.push(Op::SetOutlineThickness {
        pt: Pt(width as f32),
    });
    ops.push(Op::DrawLine {
        line: Line {
            points: points.iter().copied().map(corner).collect(),
            is_closed: closed,
        },
    });
}

fn corner(p: Point) -> LinePoint {
    LinePoint { p, bezier: false }
}

fn color_of(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
        icc_profile: None,
    })
}

fn mm(pt: f64) -> Mm {
    Mm((pt * 25.4 / 72.0) as f32)
}

fn warn_once_non_ascii() {
    use std::sync::Once;
    static WARNED: Once = Once::new();
    WARNED.call_once(|| {
        warn!("built-in Courier cannot show non-ASCII text; install the font or pass one with -F");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ArrowKind;
    use bindery_core::Direction;

    fn side() -> SheetSide {
        SheetSide {
            width: 595.0,
            height: 842.0,
            commands: vec![
                DrawCommand::Text {
                    x: 72.0,
                    y: 100.0,
                    size: 9.8,
                    role: FontRole::Body,
                    text: "hello".into(),
                    color: Rgb::BLACK,
                },
                DrawCommand::Line {
                    x: 72.0,
                    y: 110.0,
                    dx: 400.0,
                    dy: 0.0,
                    width: 0.1,
                    color: Rgb::BASELINE,
                },
                DrawCommand::PunchMark {
                    direction: Direction::Left,
                    x: 36.0,
                    y: 421.0,
                },
                DrawCommand::FoldArrow {
                    kind: ArrowKind::Return,
                    x: 500.0,
                    y: 95.0,
                    edge: 8.0,
                    line_width: 1.0,
                    color: Rgb::ARROW,
                },
            ],
        }
    }

    #[test]
    fn renders_a_pdf_byte_stream() {
        let bytes = PdfWriter::new("test")
            .render(&[side(), SheetSide::blank(595.0, 842.0)], &FaceSet::courier())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn y_axis_is_flipped() {
        let fonts = FontSet {
            body: PdfFont::Builtin(BuiltinFont::Courier),
            header_title: PdfFont::Builtin(BuiltinFont::CourierBold),
            header_detail: PdfFont::Builtin(BuiltinFont::Courier),
        };
        let mut ops = Vec::new();
        push_command(&mut ops, &side().commands[0], 842.0, &fonts);
        let cursor = ops.iter().find_map(|op| match op {
            Op::SetTextCursor { pos } => Some(pos.y.0),
            _ => None,
        });
        assert_eq!(cursor, Some(742.0));
    }

    #[test]
    fn header_styles_map_to_builtin_courier_faces() {
        let mut doc = PdfDocument::new("t");
        let mut warnings = Vec::new();
        let faces = FaceSet {
            header_title: FontFace::Courier(CourierStyle {
                bold: true,
                oblique: true,
            }),
            ..FaceSet::courier()
        };
        let fonts = FontSet::register(&mut doc, &faces, &mut warnings).unwrap();
        assert!(matches!(
            fonts.get(FontRole::HeaderTitle),
            PdfFont::Builtin(BuiltinFont::CourierBoldOblique)
        ));
        assert!(matches!(
            fonts.get(FontRole::HeaderDetail),
            PdfFont::Builtin(BuiltinFont::Courier)
        ));
    }
}
