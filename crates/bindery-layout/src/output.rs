// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks shared by the PDF and PostScript writers.

use std::io::Write;
use std::path::Path;

use bindery_core::error::{BinderyError, Result};
use tracing::info;

/// Output name that selects standard output.
pub const STDOUT_NAME: &str = "-";

/// Write `bytes` to `dest`, or to stdout when `dest` is `-`.
pub fn write_output(bytes: &[u8], dest: &Path) -> Result<()> {
    let to_err = |source| BinderyError::Write {
        path: dest.to_path_buf(),
        source,
    };
    if dest == Path::new(STDOUT_NAME) {
        let mut out = std::io::stdout().lock();
        out.write_all(bytes).and_then(|()| out.flush()).map_err(to_err)?;
    } else {
        std::fs::write(dest, bytes).map_err(to_err)?;
    }
    info!(path = %dest.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        write_output(b"%PDF-1.7", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn write_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.ps");
        match write_output(b"x", &path) {
            Err(BinderyError::Write { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
