// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TrueType repacking for Type 42 embedding.
//
// A Type 42 font carries the sfnt as an array of strings. Each string must
// end on a table or glyph boundary and stay within the 65535-byte string
// limit, counting one trailing pad byte.

use bindery_core::error::{BinderyError, Result};

/// Largest data length of one `sfnts` string, before its pad byte.
pub const MAX_STRING_DATA: usize = 65534;

/// Tables a Type 42 interpreter reads; the rest are dropped.
const KEPT_TABLES: [&[u8; 4]; 11] = [
    b"cvt ", b"fpgm", b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp", b"prep", b"vhea",
    b"vmtx",
];

const TTC_TAG: &[u8; 4] = b"ttcf";

/// A single-face sfnt rebuilt with only the tables Type 42 needs.
#[derive(Debug, Clone)]
pub struct Sfnt {
    pub bytes: Vec<u8>,
    pub glyph_count: u16,
    /// Font bounding box in em units.
    pub bbox: [f64; 4],
    /// Offsets where an `sfnts` string may end.
    boundaries: Vec<usize>,
}

struct TableRecord {
    tag: [u8; 4],
    offset: usize,
    length: usize,
}

fn malformed(what: &str) -> BinderyError {
    BinderyError::Font(format!("malformed TrueType data: {what}"))
}

fn u16_at(data: &[u8], at: usize) -> Result<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| malformed("truncated field"))
}

fn i16_at(data: &[u8], at: usize) -> Result<i16> {
    u16_at(data, at).map(|v| v as i16)
}

fn u32_at(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| malformed("truncated field"))
}

fn checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

impl Sfnt {
    /// Extract face `index` of a font file or collection.
    ///
    /// Faces without `glyf` outlines (CFF-flavoured OpenType) cannot be
    /// carried by Type 42 and are rejected.
    pub fn extract(data: &[u8], index: u32) -> Result<Self> {
        let dir = if data.get(..4) == Some(TTC_TAG.as_slice()) {
            let count = u32_at(data, 8)?;
            if index >= count {
                return Err(malformed("face index out of range"));
            }
            u32_at(data, 12 + 4 * index as usize)? as usize
        } else {
            0
        };
        let version = u32_at(data, dir)?;
        let num_tables = u16_at(data, dir + 4)? as usize;

        let mut tables = Vec::with_capacity(KEPT_TABLES.len());
        for i in 0..num_tables {
            let entry = dir + 12 + 16 * i;
            let tag: [u8; 4] = data
                .get(entry..entry + 4)
                .and_then(|t| t.try_into().ok())
                .ok_or_else(|| malformed("truncated table directory"))?;
            if !KEPT_TABLES.contains(&&tag) {
                continue;
            }
            let offset = u32_at(data, entry + 8)? as usize;
            let length = u32_at(data, entry + 12)? as usize;
            if data.get(offset..offset + length).is_none() {
                return Err(malformed("table outside the file"));
            }
            tables.push(TableRecord {
                tag,
                offset,
                length,
            });
        }
        tables.sort_by_key(|t| t.tag);

        let table = |tag: &[u8; 4]| tables.iter().find(|t| &t.tag == tag);
        let (Some(head), Some(maxp), Some(loca), Some(glyf)) =
            (table(b"head"), table(b"maxp"), table(b"loca"), table(b"glyf"))
        else {
            return Err(BinderyError::Font(
                "face has no TrueType outlines for PostScript embedding".into(),
            ));
        };

        let units = f64::from(u16_at(data, head.offset + 18)?.max(1));
        let mut bbox = [0.0; 4];
        for (i, v) in bbox.iter_mut().enumerate() {
            *v = f64::from(i16_at(data, head.offset + 36 + 2 * i)?) / units;
        }
        let long_loca = i16_at(data, head.offset + 50)? != 0;
        let glyph_count = u16_at(data, maxp.offset + 4)?;
        let mut glyph_offsets = Vec::with_capacity(glyph_count as usize + 1);
        for g in 0..=glyph_count as usize {
            let offset = if long_loca {
                u32_at(data, loca.offset + 4 * g)? as usize
            } else {
                u16_at(data, loca.offset + 2 * g)? as usize * 2
            };
            glyph_offsets.push(offset.min(glyf.length));
        }

        // Rebuild: offset table, directory, then 4-byte aligned tables.
        let n = tables.len();
        let pow2 = if n == 0 { 0 } else { 1usize << n.ilog2() };
        let search_range = pow2 * 16;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(&(n as u16).to_be_bytes());
        bytes.extend_from_slice(&(search_range as u16).to_be_bytes());
        bytes.extend_from_slice(&(pow2.max(1).ilog2() as u16).to_be_bytes());
        bytes.extend_from_slice(&((n * 16 - search_range) as u16).to_be_bytes());

        let mut offset = 12 + 16 * n;
        let mut placed = Vec::with_capacity(n);
        for t in &tables {
            let body = &data[t.offset..t.offset + t.length];
            bytes.extend_from_slice(&t.tag);
            bytes.extend_from_slice(&checksum(body).to_be_bytes());
            bytes.extend_from_slice(&(offset as u32).to_be_bytes());
            bytes.extend_from_slice(&(t.length as u32).to_be_bytes());
            placed.push(offset);
            offset += t.length.next_multiple_of(4);
        }

        let mut boundaries = vec![bytes.len()];
        for (t, start) in tables.iter().zip(&placed) {
            if t.tag == *b"glyf" {
                boundaries.extend(glyph_offsets.iter().map(|g| start + g));
            }
            bytes.extend_from_slice(&data[t.offset..t.offset + t.length]);
            bytes.resize(start + t.length.next_multiple_of(4), 0);
            boundaries.push(bytes.len());
        }
        boundaries.sort_unstable();
        boundaries.dedup();

        Ok(Self {
            bytes,
            glyph_count,
            bbox,
            boundaries,
        })
    }

    /// Split the font into `sfnts` strings, each at most `MAX_STRING_DATA`.
    pub fn strings(&self) -> Vec<&[u8]> {
        let end = self.bytes.len();
        let mut out = Vec::new();
        let mut cur = 0;
        while cur < end {
            let next = self
                .boundaries
                .iter()
                .copied()
                .filter(|&b| b > cur && b - cur <= MAX_STRING_DATA)
                .max()
                // A single glyph or table larger than one string.
                .unwrap_or_else(|| (cur + MAX_STRING_DATA).min(end));
            out.push(&self.bytes[cur..next]);
            cur = next;
        }
        out
    }
}
