// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the bindery-layout crate: line folding over a
// large synthetic input, and full page composition of the same input.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use bindery_core::Settings;
use bindery_layout::compose::HeaderInfo;
use bindery_layout::{
    CourierMetrics, LineFlow, LineFlowState, MeasurerSet, PageComposer, TextMeasurer, Utf8Reader,
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Source-like text: indented with tabs, mixed line lengths, some lines long
/// enough to fold, and a sprinkling of multi-byte scalars.
fn synthetic_source(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        let indent = "\t".repeat(i % 4);
        let body = match i % 5 {
            0 => format!("fn item_{i}() -> Result<(), Error> {{"),
            1 => format!("let value = compute({i}, \"データ\", 0x{i:04x});"),
            2 => "// ".to_string() + &"long comment text ".repeat(12),
            3 => String::new(),
            _ => format!("}} // end of item {i}"),
        };
        text.push_str(&indent);
        text.push_str(&body);
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Fold 5,000 lines into a 60-column frame.
fn bench_line_flow(c: &mut Criterion) {
    let text = synthetic_source(5_000);
    let flow = LineFlow::new(&CourierMetrics, 10.0, 8);
    let limit = CourierMetrics.text_width(10.0, &"M".repeat(60));

    c.bench_function("line_flow (5000 lines)", |b| {
        b.iter(|| {
            let mut reader = Utf8Reader::new(black_box(text.as_bytes()), "bench");
            let mut state = LineFlowState::new();
            let fill = flow
                .fill_frame(&mut reader, &mut state, usize::MAX, limit)
                .expect("in-memory input cannot fail");
            black_box(fill.lines.len());
        });
    });
}

/// Compose the same input into duplex two-column sides.
fn bench_compose(c: &mut Criterion) {
    let text = synthetic_source(5_000);
    let config = Settings {
        orientation: Some(bindery_core::Orientation::Landscape),
        number: Some(true),
        notebook: Some(true),
        ..Default::default()
    }
    .resolve()
    .expect("default landscape settings are valid");
    let header = HeaderInfo {
        title: "bench.rs".into(),
        date: "01/01/26 00:00".into(),
    };

    c.bench_function("compose (5000 lines, 2 columns)", |b| {
        b.iter(|| {
            let composer = PageComposer::new(
                &config.layout,
                &config.render,
                MeasurerSet::uniform(&CourierMetrics),
            );
            let mut reader = Utf8Reader::new(black_box(text.as_bytes()), "bench");
            let doc = composer
                .compose(&mut reader, &header)
                .expect("in-memory input cannot fail");
            black_box(doc.sides.len());
        });
    });
}

criterion_group!(benches, bench_line_flow, bench_compose);
criterion_main!(benches);
