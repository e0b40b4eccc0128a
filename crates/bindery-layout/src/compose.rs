// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composition.
//
// Turns one input stream into a list of sheet sides, each a display list of
// `DrawCommand`s in points with y growing down the sheet. Backends only
// translate these commands; every layout decision is made here.

use std::fmt::Write as _;
use std::io::Read;

use bindery_core::error::{BinderyError, Result};
use bindery_core::{Columns, Direction, LayoutConfig, RenderOptions};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use tracing::{debug, info, instrument};

use crate::flow::{FlowLine, LineFlow, LineFlowState};
use crate::geometry::{PageFrame, compute_frame};
use crate::measure::MeasurerSet;
use crate::reader::Utf8Reader;
use crate::shapes::ArrowKind;

// -- Drawing constants --------------------------------------------------------

const LW_THIN_BASELINE: f64 = 0.1;
const LW_THICK_BASELINE: f64 = 1.0;
const LW_VLINE: f64 = 0.4;
const LW_BORDER: f64 = 1.0;
const ARROW_WIDTH: f64 = 1.0;

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const BASELINE: Rgb = Rgb::new(0.6, 0.6, 1.0);
    pub const LINE_NUMBER: Rgb = Rgb::new(0.4, 0.4, 0.4);
    pub const NUMBER_RULE: Rgb = Rgb::new(1.0, 0.6, 0.6);
    pub const ARROW: Rgb = Rgb::new(0.6, 0.6, 1.0);
    pub const BORDER: Rgb = Rgb::new(0.2, 0.2, 0.2);
}

/// Which face a text command is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Body,
    /// Centred header title.
    HeaderTitle,
    /// Header date and page number.
    HeaderDetail,
}

/// One display-list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Text with its baseline starting at `(x, y)`.
    Text {
        x: f64,
        y: f64,
        size: f64,
        role: FontRole,
        text: String,
        color: Rgb,
    },
    /// Stroked segment from `(x, y)` to `(x + dx, y + dy)`.
    Line {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        width: f64,
        color: Rgb,
    },
    /// Stroked rectangle; `(x, y)` is the top-left corner.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
        color: Rgb,
    },
    /// Filled punch-mark triangle centred on `(x, y)`.
    PunchMark { direction: Direction, x: f64, y: f64 },
    /// Fold arrow in the `edge`-sized square with top-left `(x, y)`.
    FoldArrow {
        kind: ArrowKind,
        x: f64,
        y: f64,
        edge: f64,
        line_width: f64,
        color: Rgb,
    },
}

/// One physical side of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSide {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl SheetSide {
    pub fn blank(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }
}

/// Output of composing one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub sides: Vec<SheetSide>,
    /// Page indices used (columns count separately in two-column mode).
    pub pages: u32,
    /// Logical lines read.
    pub lines: u64,
}

/// Per-file header content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Centred title: the header text, or the input name.
    pub title: String,
    /// Pre-formatted date shown on the left.
    pub date: String,
}

/// Format `time` with a strftime-style `format`, rejecting bad specifiers.
pub fn format_header_date<Tz>(format: &str, time: &DateTime<Tz>) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let invalid = || BinderyError::InvalidValue {
        key: "date-format".into(),
        value: format.to_string(),
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut out = String::new();
    write!(out, "{}", time.format_with_items(items.into_iter())).map_err(|_| invalid())?;
    Ok(out)
}

/// Vertical and horizontal positions inside one frame's body.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BodyMetrics {
    inset: f64,
    line_h: f64,
    body_top: f64,
    lines_per_page: usize,
    bottom_base: f64,
    num_right: f64,
    text_left: f64,
    limit: f64,
}

/// Lays out input files onto sheet sides.
pub struct PageComposer<'a> {
    layout: &'a LayoutConfig,
    render: &'a RenderOptions,
    measurers: MeasurerSet<'a>,
}

impl<'a> PageComposer<'a> {
    pub fn new(
        layout: &'a LayoutConfig,
        render: &'a RenderOptions,
        measurers: MeasurerSet<'a>,
    ) -> Self {
        Self {
            layout,
            render,
            measurers,
        }
    }

    /// Compose the whole stream. Even an empty stream yields one page.
    #[instrument(skip_all, fields(title = %header.title))]
    pub fn compose<R: Read>(
        &self,
        reader: &mut Utf8Reader<R>,
        header: &HeaderInfo,
    ) -> Result<ComposedDocument> {
        let flow = LineFlow::new(self.measurers.body, self.render.font_size, self.render.tab_width);
        let mut state = LineFlowState::new();
        let mut sides: Vec<SheetSide> = Vec::new();
        let mut page = 1u32;

        loop {
            let frame = compute_frame(self.layout, page);
            let mut commands = Vec::new();
            let exhausted =
                self.compose_page(&flow, reader, &mut state, &frame, page, header, &mut commands)?;

            // The right column shares the side opened by the left one.
            let shared = self.layout.columns == Columns::Two && page % 2 == 0;
            match sides.last_mut().filter(|_| shared) {
                Some(side) => side.commands.extend(commands),
                None => sides.push(SheetSide {
                    width: self.layout.page_width,
                    height: self.layout.page_height,
                    commands,
                }),
            }

            if exhausted {
                break;
            }
            page += 1;
        }

        let lines = state.next_number() - 1;
        info!(pages = page, sides = sides.len(), lines, "composed document");
        Ok(ComposedDocument {
            sides,
            pages: page,
            lines,
        })
    }

    fn body_metrics(&self, frame: &PageFrame) -> Result<BodyMetrics> {
        let size = self.render.font_size;
        let inset = size;
        let line_h = self.render.line_height();
        let body_top = frame.head_top + self.render.header_band();
        let body_height = self.layout.page_height - (body_top + frame.margin_bottom);
        let lines = (body_height / line_h).floor();
        if lines.is_nan() || lines < 1.0 {
            return Err(BinderyError::Config {
                key: "font-size".into(),
                reason: format!(
                    "a {line_h:.1}pt line does not fit in the {body_height:.1}pt page body"
                ),
            });
        }
        let lines_per_page = lines as usize;
        let bottom_base = body_top + line_h * lines;

        let (num_right, text_left) = if self.render.numbering {
            let body = self.measurers.body;
            let num_right = frame.body_left + inset + body.text_width(size, "000000");
            (num_right, num_right + body.text_width(size, "0"))
        } else {
            (frame.body_left + inset, frame.body_left + inset)
        };
        let limit = frame.body_right - text_left - inset;

        Ok(BodyMetrics {
            inset,
            line_h,
            body_top,
            lines_per_page,
            bottom_base,
            num_right,
            text_left,
            limit,
        })
    }

    /// Draw one page into `out`; returns whether the input is exhausted.
    #[allow(clippy::too_many_arguments)]
    fn compose_page<R: Read>(
        &self,
        flow: &LineFlow<'_>,
        reader: &mut Utf8Reader<R>,
        state: &mut LineFlowState,
        frame: &PageFrame,
        page: u32,
        header: &HeaderInfo,
        out: &mut Vec<DrawCommand>,
    ) -> Result<bool> {
        let m = self.body_metrics(frame)?;
        let r = self.render;

        if r.punch_marks {
            self.punch_mark(frame, out);
        }

        if r.border {
            out.push(DrawCommand::Rect {
                x: frame.body_left,
                y: frame.head_top,
                width: frame.body_width,
                height: self.layout.page_height - frame.margin_bottom - frame.head_top,
                line_width: LW_BORDER,
                color: Rgb::BORDER,
            });
            if r.header {
                out.push(hline(frame, m.body_top, LW_BORDER, Rgb::BORDER));
            }
        }

        if r.header {
            self.header(frame, &m, page, header, out);
        }

        if r.notebook {
            let top = if r.header { m.body_top } else { frame.head_top };
            if r.numbering {
                out.push(DrawCommand::Line {
                    x: m.num_right,
                    y: top,
                    dx: 0.0,
                    dy: m.bottom_base - top + LW_THICK_BASELINE,
                    width: LW_VLINE,
                    color: Rgb::NUMBER_RULE,
                });
            }
            out.push(hline(frame, frame.head_top, LW_THICK_BASELINE, Rgb::BASELINE));
            if r.header {
                out.push(hline(frame, m.body_top, LW_THICK_BASELINE, Rgb::BASELINE));
            }
        }

        let fill = flow.fill_frame(reader, state, m.lines_per_page, m.limit)?;
        for (i, line) in fill.lines.iter().enumerate() {
            self.body_line(frame, &m, i + 1, line, out);
        }

        if r.notebook {
            for i in fill.lines.len() + 1..m.lines_per_page {
                let baseline = m.body_top + m.line_h * i as f64;
                out.push(hline(frame, baseline, LW_THIN_BASELINE, Rgb::BASELINE));
            }
            out.push(hline(frame, m.bottom_base + 1.0, LW_THICK_BASELINE, Rgb::BASELINE));
        }

        debug!(page, lines = fill.lines.len(), exhausted = fill.exhausted, "page composed");
        Ok(fill.exhausted)
    }

    fn punch_mark(&self, frame: &PageFrame, out: &mut Vec<DrawCommand>) {
        let (pw, ph) = (self.layout.page_width, self.layout.page_height);
        let (x, y) = match frame.punch {
            Direction::None => return,
            Direction::Up => (pw / 2.0, frame.head_top / 2.0),
            Direction::Down => (pw / 2.0, ph - frame.margin_bottom / 2.0),
            Direction::Left => (frame.body_left / 2.0, ph / 2.0),
            Direction::Right => ((frame.body_right + pw) / 2.0, ph / 2.0),
        };
        out.push(DrawCommand::PunchMark {
            direction: frame.punch,
            x,
            y,
        });
    }

    fn header(
        &self,
        frame: &PageFrame,
        m: &BodyMetrics,
        page: u32,
        header: &HeaderInfo,
        out: &mut Vec<DrawCommand>,
    ) {
        let large = self.render.header_size;
        let medium = self.render.header_medium_size;
        let (title, detail) = (self.measurers.header_title, self.measurers.header_detail);
        let ascent = title.ascent(large);
        let descent = title.descent(large);
        let gap = (m.body_top - frame.head_top - (ascent + descent)) / 2.0;
        let baseline = frame.head_top + gap + ascent + descent / 2.0;
        let inset = detail.text_width(medium, "0");

        out.push(DrawCommand::Text {
            x: frame.body_left + inset,
            y: baseline,
            size: medium,
            role: FontRole::HeaderDetail,
            text: header.date.clone(),
            color: Rgb::BLACK,
        });

        let title_w = title.text_width(large, &header.title);
        out.push(DrawCommand::Text {
            x: frame.body_left + frame.body_width / 2.0 - title_w / 2.0,
            y: baseline,
            size: large,
            role: FontRole::HeaderTitle,
            text: header.title.clone(),
            color: Rgb::BLACK,
        });

        let page_label = format!("page: {page}  ");
        let label_w = detail.text_width(medium, &page_label);
        out.push(DrawCommand::Text {
            x: frame.body_left + frame.body_width - inset - label_w,
            y: baseline,
            size: medium,
            role: FontRole::HeaderDetail,
            text: page_label,
            color: Rgb::BLACK,
        });
    }

    /// Draw body line `pline` (1-based within the page).
    fn body_line(
        &self,
        frame: &PageFrame,
        m: &BodyMetrics,
        pline: usize,
        line: &FlowLine,
        out: &mut Vec<DrawCommand>,
    ) {
        let r = self.render;
        let size = r.font_size;
        let baseline = m.body_top + m.line_h * pline as f64;
        let body = self.measurers.body;
        let ascent = body.ascent(size);
        let arrow_edge = m.line_h - ascent / 2.0 + body.descent(size);

        if r.notebook && pline < m.lines_per_page {
            out.push(hline(frame, baseline, LW_THIN_BASELINE, Rgb::BASELINE));
        }

        if line.continuation {
            if r.fold_arrows {
                let x = if r.numbering {
                    m.num_right - arrow_edge / 2.0
                } else {
                    frame.body_left
                };
                out.push(DrawCommand::FoldArrow {
                    kind: ArrowKind::Continue,
                    x,
                    y: baseline - m.line_h,
                    edge: arrow_edge,
                    line_width: ARROW_WIDTH,
                    color: Rgb::ARROW,
                });
            }
        } else if let (true, Some(number)) = (r.numbering, line.number) {
            out.push(DrawCommand::Text {
                x: frame.body_left + m.inset,
                y: baseline,
                size,
                role: FontRole::Body,
                text: format!("{number:>5}"),
                color: Rgb::LINE_NUMBER,
            });
        }

        for run in &line.runs {
            out.push(DrawCommand::Text {
                x: m.text_left + run.x,
                y: baseline,
                size,
                role: FontRole::Body,
                text: run.text.clone(),
                color: Rgb::BLACK,
            });
        }

        if line.folded && r.fold_arrows {
            out.push(DrawCommand::FoldArrow {
                kind: ArrowKind::Return,
                x: frame.body_right - m.inset,
                y: baseline - ascent / 2.0,
                edge: arrow_edge,
                line_width: ARROW_WIDTH,
                color: Rgb::ARROW,
            });
        }
    }
}

fn hline(frame: &PageFrame, y: f64, width: f64, color: Rgb) -> DrawCommand {
    DrawCommand::Line {
        x: frame.body_left,
        y,
        dx: frame.body_width,
        dy: 0.0,
        width,
        color,
    }
}
