// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostScript module: serialising composed sheet sides for PostScript printers.

pub mod sfnt;
pub mod writer;

pub use writer::PsWriter;
