// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line flow: folding and tab expansion.
//
// Pulls scalars from a `Utf8Reader` and lays out one visual line at a time
// against a width limit. A logical line too wide for the column is folded:
// the scalar that did not fit is pushed back and starts the next visual
// line, which is a continuation and takes no new line number.

use std::io::Read;

use bindery_core::error::Result;
use tracing::debug;

use crate::measure::TextMeasurer;
use crate::reader::Utf8Reader;

/// A contiguous piece of text on one line. `x` is relative to the line
/// origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub text: String,
}

/// Result of laying out one visual line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineOutcome {
    pub runs: Vec<TextRun>,
    /// The logical line continues on the next visual line.
    pub folded: bool,
}

/// A laid-out line inside a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLine {
    /// Logical line number; `None` for continuation lines.
    pub number: Option<u64>,
    /// This line continues the previous visual line.
    pub continuation: bool,
    pub runs: Vec<TextRun>,
    pub folded: bool,
}

/// Lines placed into one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameFill {
    pub lines: Vec<FlowLine>,
    /// The input was exhausted while filling this frame.
    pub exhausted: bool,
}

/// Cursor state carried across lines, frames and pages of one file.
#[derive(Debug, Clone)]
pub struct LineFlowState {
    continued: bool,
    overflow_ems: u32,
    next_number: u64,
    scratch: String,
}

impl Default for LineFlowState {
    fn default() -> Self {
        Self {
            continued: false,
            overflow_ems: 0,
            next_number: 1,
            scratch: String::new(),
        }
    }
}

impl LineFlowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the previous visual line was folded.
    pub fn is_continued(&self) -> bool {
        self.continued
    }

    /// Number the next new logical line will get.
    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    /// Ems of indent carried over from a tab that overflowed the last line.
    pub fn overflow_ems(&self) -> u32 {
        self.overflow_ems
    }
}

/// Lays out text for one font face and size.
pub struct LineFlow<'a> {
    measurer: &'a dyn TextMeasurer,
    font_size: f64,
    tab_width: u32,
}

impl<'a> LineFlow<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer, font_size: f64, tab_width: u32) -> Self {
        Self {
            measurer,
            font_size,
            tab_width,
        }
    }

    /// Width of "M" at the flow's size.
    pub fn em(&self) -> f64 {
        self.measurer.text_width(self.font_size, "M")
    }

    fn width(&self, text: &str) -> f64 {
        self.measurer.text_width(self.font_size, text)
    }

    /// Lay out one visual line no wider than `limit`.
    ///
    /// The line ends at LF, CR, CRLF (consumed as one break), end of stream,
    /// or when the next scalar does not fit. A line that has consumed
    /// nothing yet always accepts its first scalar so a column narrower than
    /// one glyph still makes progress.
    pub fn flow_line<R: Read>(
        &self,
        reader: &mut Utf8Reader<R>,
        state: &mut LineFlowState,
        limit: f64,
    ) -> Result<LineOutcome> {
        let em = self.em();
        let tab_w = em * f64::from(self.tab_width);
        let mut run_left = em * f64::from(state.overflow_ems);
        state.overflow_ems = 0;
        state.scratch.clear();

        let mut runs = Vec::new();
        let mut consumed = false;

        loop {
            let Some(scalar) = reader.next_scalar()? else {
                flush(&mut runs, &mut state.scratch, run_left);
                return Ok(LineOutcome { runs, folded: false });
            };

            if scalar.is_byte(b'\n') {
                flush(&mut runs, &mut state.scratch, run_left);
                return Ok(LineOutcome { runs, folded: false });
            }

            if scalar.is_byte(b'\r') {
                if let Some(next) = reader.next_scalar()? {
                    if !next.is_byte(b'\n') {
                        reader.push_back(next)?;
                    }
                }
                flush(&mut runs, &mut state.scratch, run_left);
                return Ok(LineOutcome { runs, folded: false });
            }

            if scalar.is_byte(b'\t') {
                consumed = true;
                let right = run_left + self.width(&state.scratch);
                let stop = tab_w * ((right + em) / tab_w).ceil();
                flush(&mut runs, &mut state.scratch, run_left);
                if stop <= limit {
                    run_left = stop;
                    continue;
                }
                state.overflow_ems = ((stop - limit) / em).ceil() as u32;
                return Ok(LineOutcome { runs, folded: true });
            }

            let mark = state.scratch.len();
            scalar.push_to(&mut state.scratch);
            if run_left + self.width(&state.scratch) > limit {
                if !consumed {
                    debug!(limit, "column narrower than one glyph, placing it anyway");
                } else {
                    state.scratch.truncate(mark);
                    reader.push_back(scalar)?;
                    flush(&mut runs, &mut state.scratch, run_left);
                    return Ok(LineOutcome { runs, folded: true });
                }
            }
            consumed = true;
        }
    }

    /// Fill up to `max_lines` visual lines, numbering new logical lines.
    pub fn fill_frame<R: Read>(
        &self,
        reader: &mut Utf8Reader<R>,
        state: &mut LineFlowState,
        max_lines: usize,
        limit: f64,
    ) -> Result<FrameFill> {
        let mut lines = Vec::new();
        while lines.len() < max_lines && !reader.is_at_end()? {
            let continuation = state.continued;
            let number = if continuation {
                None
            } else {
                let n = state.next_number;
                state.next_number += 1;
                Some(n)
            };
            let LineOutcome { runs, folded } = self.flow_line(reader, state, limit)?;
            state.continued = folded;
            lines.push(FlowLine {
                number,
                continuation,
                runs,
                folded,
            });
        }
        let exhausted = reader.is_at_end()?;
        Ok(FrameFill { lines, exhausted })
    }
}

fn flush(runs: &mut Vec<TextRun>, scratch: &mut String, x: f64) {
    if !scratch.is_empty() {
        runs.push(TextRun {
            x,
            text: std::mem::take(scratch),
        });
    }
}
