// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bindery-layout: layout engine for the bindery text-to-PDF converter.
//
// Reads UTF-8 text one scalar at a time, computes margin frames for each
// page from the binding configuration, folds and tab-expands lines to fit
// each frame, composes display lists for every sheet side, and serialises
// them to PDF or PostScript.

pub mod compose;
pub mod flow;
pub mod fonts;
pub mod geometry;
pub mod job;
pub mod measure;
pub mod output;
pub mod pdf;
pub mod ps;
pub mod reader;
pub mod shapes;

// Re-export the primary types so callers can use `bindery_layout::LineFlow` etc.
pub use compose::{ComposedDocument, DrawCommand, HeaderInfo, PageComposer, SheetSide};
pub use flow::{FlowLine, FrameFill, LineFlow, LineFlowState, LineOutcome, TextRun};
pub use geometry::{PageCase, PageFrame, compute_frame, side_frames};
pub use fonts::FontLocator;
pub use job::ConvertJob;
pub use measure::{
    CourierMetrics, CourierStyle, FaceSet, FontFace, MeasurerSet, TextMeasurer, TrueTypeMetrics,
};
pub use pdf::PdfWriter;
pub use ps::PsWriter;
pub use reader::{Scalar, Utf8Reader};
