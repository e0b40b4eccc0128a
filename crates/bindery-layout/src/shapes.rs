// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline geometry for punch marks and fold arrows.
//
// All coordinates are in points with y growing down the sheet, the same
// space the composer works in.

use std::f64::consts::PI;

use bindery_core::Direction;

/// Punch mark length along its pointing direction.
pub const MARK_H: f64 = 4.0;
/// Punch mark base width.
pub const MARK_W: f64 = 2.0;

/// Segments used to approximate a half circle.
const ARC_SEGMENTS: usize = 12;

/// Fold marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKind {
    /// Drawn at the right end of a line that is folded.
    Return,
    /// Drawn before a continuation line.
    Continue,
}

/// Filled triangle centred on `(x, y)` pointing toward `direction`.
pub fn punch_triangle(direction: Direction, x: f64, y: f64) -> Option<[(f64, f64); 3]> {
    let (h, w) = (MARK_H / 2.0, MARK_W / 2.0);
    let points = match direction {
        Direction::None => return None,
        Direction::Up => [(x, y - h), (x - w, y + h), (x + w, y + h)],
        Direction::Down => [(x, y + h), (x - w, y - h), (x + w, y - h)],
        Direction::Right => [(x + h, y), (x - h, y - w), (x - h, y + w)],
        Direction::Left => [(x - h, y), (x + h, y - w), (x + h, y + w)],
    };
    Some(points)
}

/// Stroked polylines for a fold arrow inside the `edge`-sized square whose
/// top-left corner is `(x, y)`.
///
/// The shape is a stem down the square's vertical centre, a tail along the
/// bottom and a half circle: on the right for a return arrow, on the left
/// for a continue arrow.
pub fn fold_arrow(kind: ArrowKind, x: f64, y: f64, edge: f64, line_width: f64) -> Vec<Vec<(f64, f64)>> {
    let radius = edge / 2.0;
    let (cx, cy) = (x + radius, y + radius);
    let inner = (radius - line_width / 2.0).max(0.0);

    let stem = vec![(cx, cy), (cx, cy + radius)];
    let (tail, start) = match kind {
        ArrowKind::Return => (vec![(cx + radius, cy + inner), (cx, cy + inner)], PI * 1.5),
        ArrowKind::Continue => (vec![(cx - radius, cy + inner), (cx, cy + inner)], PI * 0.5),
    };
    let arc = (0..=ARC_SEGMENTS)
        .map(|i| {
            let angle = start + PI * i as f64 / ARC_SEGMENTS as f64;
            (cx + inner * angle.cos(), cy + inner * angle.sin())
        })
        .collect();

    vec![stem, tail, arc]
}
