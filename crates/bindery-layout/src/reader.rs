// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Buffered UTF-8 reader with pushback.
//
// Yields one scalar's raw bytes at a time. Length is classified from the
// leading byte only (legacy table, 1-6 bytes); continuation bytes are not
// validated. A scalar split across two `read` calls is spliced by compacting
// the unread tail to the buffer start before refilling.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use bindery_core::error::{BinderyError, Result};
use tracing::debug;

/// Forward read buffer size.
pub const READ_BUFFER_LEN: usize = 16 * 1024;
/// Pushback stack size in bytes.
pub const PUSHBACK_LEN: usize = 256;
/// Longest sequence the legacy length table produces.
pub const MAX_SCALAR_LEN: usize = 6;

/// Byte length of the sequence introduced by `lead`.
///
/// Stray continuation bytes and 0xFE/0xFF count as single bytes.
pub fn scalar_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        0xF8..=0xFB => 5,
        0xFC..=0xFD => 6,
        _ => 1,
    }
}

/// One scalar's bytes, as read from the stream.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Scalar {
    bytes: [u8; MAX_SCALAR_LEN],
    len: u8,
}

impl Scalar {
    /// Build from at most [`MAX_SCALAR_LEN`] bytes; longer input is cut.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_SCALAR_LEN);
        let mut out = Self::default();
        out.bytes[..len].copy_from_slice(&bytes[..len]);
        out.len = len as u8;
        out
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when this scalar is exactly the ASCII byte `b`.
    pub fn is_byte(&self, b: u8) -> bool {
        self.len == 1 && self.bytes[0] == b
    }

    /// The scalar as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Append to `buf`, substituting U+FFFD for invalid or obsolete
    /// (5/6-byte) sequences.
    pub fn push_to(&self, buf: &mut String) {
        match self.as_str() {
            Some(s) => buf.push_str(s),
            None => buf.push(char::REPLACEMENT_CHARACTER),
        }
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "Scalar({s:?})"),
            None => write!(f, "Scalar({:02x?})", self.as_bytes()),
        }
    }
}

/// Pushback-capable scalar reader over any byte source.
///
/// Pending pushback always takes priority over the forward buffer. Exactly
/// one reader is active per input, and it is never shared.
pub struct Utf8Reader<R> {
    inner: R,
    path: PathBuf,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    /// Pushed-back bytes, stored reversed so the lead byte is on top.
    stack: Vec<u8>,
    stack_capacity: usize,
    eof: bool,
}

impl Utf8Reader<File> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BinderyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file, path))
    }
}

impl<R: Read> Utf8Reader<R> {
    /// Wrap `inner`; `path` names the source in error messages.
    pub fn new(inner: R, path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(inner, path, READ_BUFFER_LEN, PUSHBACK_LEN)
    }

    /// Like [`Utf8Reader::new`] with explicit buffer sizes. The forward
    /// buffer is never smaller than one maximal scalar.
    pub fn with_capacity(
        inner: R,
        path: impl Into<PathBuf>,
        buffer_len: usize,
        pushback_len: usize,
    ) -> Self {
        Self {
            inner,
            path: path.into(),
            buf: vec![0; buffer_len.max(MAX_SCALAR_LEN)].into_boxed_slice(),
            pos: 0,
            filled: 0,
            stack: Vec::with_capacity(pushback_len),
            stack_capacity: pushback_len,
            eof: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next complete scalar, or `None` at end of stream.
    ///
    /// A truncated sequence at end of stream is dropped and reads as end.
    pub fn next_scalar(&mut self) -> Result<Option<Scalar>> {
        if let Some(&lead) = self.stack.last() {
            let len = scalar_len(lead).min(self.stack.len());
            let mut bytes = [0u8; MAX_SCALAR_LEN];
            for slot in bytes.iter_mut().take(len) {
                // `len` is bounded by the stack length above.
                *slot = self.stack.pop().unwrap_or_default();
            }
            return Ok(Some(Scalar::from_bytes(&bytes[..len])));
        }

        loop {
            let avail = self.filled - self.pos;
            if avail > 0 {
                let len = scalar_len(self.buf[self.pos]);
                if avail >= len {
                    let scalar = Scalar::from_bytes(&self.buf[self.pos..self.pos + len]);
                    self.pos += len;
                    return Ok(Some(scalar));
                }
            }
            if self.eof {
                self.drop_fragment();
                return Ok(None);
            }
            self.refill()?;
        }
    }

    /// Return a scalar so the next read yields it again (LIFO).
    pub fn push_back(&mut self, scalar: Scalar) -> Result<()> {
        if self.stack.len() + scalar.len() > self.stack_capacity {
            return Err(BinderyError::PushbackOverflow {
                capacity: self.stack_capacity,
            });
        }
        self.stack.extend(scalar.as_bytes().iter().rev());
        Ok(())
    }

    /// True only when the source is exhausted and nothing is buffered or
    /// pushed back. May read from the source to find out.
    pub fn is_at_end(&mut self) -> Result<bool> {
        loop {
            if !self.stack.is_empty() {
                return Ok(false);
            }
            let avail = self.filled - self.pos;
            if avail > 0 && avail >= scalar_len(self.buf[self.pos]) {
                return Ok(false);
            }
            if self.eof {
                self.drop_fragment();
                return Ok(true);
            }
            self.refill()?;
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn drop_fragment(&mut self) {
        if self.pos < self.filled {
            debug!(
                path = %self.path.display(),
                bytes = self.filled - self.pos,
                "dropping truncated UTF-8 sequence at end of input"
            );
            self.pos = self.filled;
        }
    }

    fn refill(&mut self) -> Result<()> {
        // Move the unread tail to the front so a split sequence is contiguous.
        self.buf.copy_within(self.pos..self.filled, 0);
        self.filled -= self.pos;
        self.pos = 0;

        let n = loop {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(BinderyError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        };
        self.filled += n;
        self.eof = n == 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `step` bytes per read call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(out.len()).min(self.data.len() - self.pos);
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    fn read_all<R: Read>(reader: &mut Utf8Reader<R>) -> Vec<Scalar> {
        let mut out = Vec::new();
        while let Some(s) = reader.next_scalar().unwrap() {
            out.push(s);
        }
        out
    }

    #[test]
    fn length_table() {
        assert_eq!(scalar_len(b'a'), 1);
        assert_eq!(scalar_len(0xC3), 2);
        assert_eq!(scalar_len(0xE3), 3);
        assert_eq!(scalar_len(0xF0), 4);
        assert_eq!(scalar_len(0xF8), 5);
        assert_eq!(scalar_len(0xFC), 6);
        assert_eq!(scalar_len(0x80), 1);
        assert_eq!(scalar_len(0xFF), 1);
    }

    #[test]
    fn yields_whole_scalars() {
        let text = "aé日😀";
        let mut reader = Utf8Reader::new(Cursor::new(text.as_bytes().to_vec()), "mem");
        let scalars = read_all(&mut reader);
        let lens: Vec<usize> = scalars.iter().map(Scalar::len).collect();
        assert_eq!(lens, vec![1, 2, 3, 4]);
        assert_eq!(scalars[2].as_str(), Some("日"));
        assert!(reader.is_at_end().unwrap());
    }

    #[test]
    fn splices_scalars_split_across_reads() {
        let text = "日本語のテキスト";
        let source = Trickle {
            data: text.as_bytes().to_vec(),
            pos: 0,
            step: 1,
        };
        // A 7-byte buffer forces compaction on almost every refill.
        let mut reader = Utf8Reader::with_capacity(source, "trickle", 7, PUSHBACK_LEN);
        let mut out = String::new();
        for s in read_all(&mut reader) {
            out.push_str(s.as_str().unwrap());
        }
        assert_eq!(out, text);
    }

    #[test]
    fn pushback_round_trip() {
        let mut reader = Utf8Reader::new(Cursor::new("xé-".as_bytes().to_vec()), "mem");
        let x = reader.next_scalar().unwrap().unwrap();
        let e = reader.next_scalar().unwrap().unwrap();
        reader.push_back(e).unwrap();
        assert_eq!(reader.next_scalar().unwrap(), Some(e));
        // LIFO: the most recent pushback comes out first.
        reader.push_back(x).unwrap();
        reader.push_back(e).unwrap();
        assert_eq!(reader.next_scalar().unwrap(), Some(e));
        assert_eq!(reader.next_scalar().unwrap(), Some(x));
        // Both pushbacks drained; the stream resumes after the original reads.
        assert_eq!(reader.next_scalar().unwrap().unwrap().as_str(), Some("-"));
        assert_eq!(reader.next_scalar().unwrap(), None);
    }

    #[test]
    fn pushback_overflow_is_an_error() {
        let mut reader = Utf8Reader::with_capacity(Cursor::new(Vec::new()), "mem", 64, 4);
        let wide = Scalar::from_bytes("日".as_bytes());
        reader.push_back(wide).unwrap();
        assert!(matches!(
            reader.push_back(wide),
            Err(BinderyError::PushbackOverflow { capacity: 4 })
        ));
    }

    #[test]
    fn no_loss_or_duplication_with_pushbacks() {
        let text = "line one\r\nλ two\tthree\n終わり";
        let source = Trickle {
            data: text.as_bytes().to_vec(),
            pos: 0,
            step: 3,
        };
        let mut reader = Utf8Reader::with_capacity(source, "trickle", 8, PUSHBACK_LEN);
        let mut out = Vec::new();
        let mut n = 0;
        while let Some(s) = reader.next_scalar().unwrap() {
            n += 1;
            if n % 3 == 0 {
                // Put every third scalar back once and read it again.
                reader.push_back(s).unwrap();
                let again = reader.next_scalar().unwrap().unwrap();
                assert_eq!(again, s);
            }
            out.extend_from_slice(s.as_bytes());
        }
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn truncated_tail_is_dropped() {
        let mut data = b"ok".to_vec();
        data.extend_from_slice(&"日".as_bytes()[..2]);
        let mut reader = Utf8Reader::new(Cursor::new(data), "mem");
        let scalars = read_all(&mut reader);
        assert_eq!(scalars.len(), 2);
        assert!(reader.is_at_end().unwrap());
    }

    #[test]
    fn at_end_sees_truncated_tail_as_end() {
        let data = "日".as_bytes()[..1].to_vec();
        let mut reader = Utf8Reader::new(Cursor::new(data), "mem");
        assert!(reader.is_at_end().unwrap());
        assert_eq!(reader.next_scalar().unwrap(), None);
    }

    #[test]
    fn at_end_accounts_for_pushback() {
        let mut reader = Utf8Reader::new(Cursor::new(b"a".to_vec()), "mem");
        assert!(!reader.is_at_end().unwrap());
        let a = reader.next_scalar().unwrap().unwrap();
        assert!(reader.is_at_end().unwrap());
        reader.push_back(a).unwrap();
        assert!(!reader.is_at_end().unwrap());
    }

    #[test]
    fn legacy_six_byte_sequence_is_one_unit() {
        let data = vec![0xFC, 0x84, 0x80, 0x80, 0x80, 0x80, b'z'];
        let mut reader = Utf8Reader::new(Cursor::new(data), "mem");
        let first = reader.next_scalar().unwrap().unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first.as_str(), None);
        let mut buf = String::new();
        first.push_to(&mut buf);
        assert_eq!(buf, "\u{FFFD}");
        assert!(reader.next_scalar().unwrap().unwrap().is_byte(b'z'));
    }

    #[test]
    fn read_errors_name_the_path() {
        let mut reader = Utf8Reader::new(Broken, "/dev/broken");
        match reader.next_scalar() {
            Err(BinderyError::Read { path, .. }) => assert_eq!(path, PathBuf::from("/dev/broken")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn open_missing_file_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            Utf8Reader::open(&missing),
            Err(BinderyError::Read { .. })
        ));
    }
}
