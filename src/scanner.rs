// SPDX-License-Identifier: Apache-2.0

//! Line scanning over a bounded byte window.
//!
//! Reads for one file in one pass are capped to the window
//! `[offset, offset + max_read_size)`. The scanner emits only complete
//! (newline-terminated) lines from that window and reports exactly how many
//! bytes those lines occupied, so the caller can advance its offset without
//! ever counting a partially-written trailing line. The withheld fragment is
//! re-read on a later pass, by which time the writer has usually finished it.

use std::fs::File;
use std::io::{self, BufRead, Read};

/// Positional reader over a byte range of a file.
///
/// Uses `read_at`, so the handle's own cursor never moves; the same handle
/// can back many windows over time while the checkpoint tracks the logical
/// position.
pub struct WindowReader<'a> {
    file: &'a File,
    pos: u64,
    end: u64,
}

impl<'a> WindowReader<'a> {
    /// Create a reader over `[offset, offset + limit)` of `file`.
    pub fn new(file: &'a File, offset: u64, limit: u64) -> Self {
        Self {
            file,
            pos: offset,
            end: offset.saturating_add(limit),
        }
    }
}

#[cfg(unix)]
impl Read for WindowReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;

        if self.pos >= self.end {
            return Ok(0);
        }
        let remaining = self.end - self.pos;
        let take = (buf.len() as u64).min(remaining) as usize;
        let n = self.file.read_at(&mut buf[..take], self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Splits a byte stream into complete lines with exact byte accounting.
///
/// - Splits on `\n` and strips one trailing `\r` per line (CRLF input).
/// - Empty lines are emitted as empty strings.
/// - A trailing fragment with no terminating `\n` before the stream ends is
///   not emitted and contributes nothing to [`bytes_consumed`].
/// - Lines are decoded with lossy UTF-8; accounting uses the raw byte
///   lengths, so invalid sequences cannot desynchronize offsets.
///
/// [`bytes_consumed`]: LineScanner::bytes_consumed
pub struct LineScanner<R> {
    reader: R,
    buf: Vec<u8>,
    consumed: u64,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            consumed: 0,
        }
    }

    /// Return the next complete line, or `None` once no terminated line
    /// remains in the stream.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() != Some(&b'\n') {
            // Unterminated fragment at the end of the window: withhold it.
            // The bytes stay uncounted, so the next pass reads them again
            // from the same offset.
            return Ok(None);
        }
        self.consumed += self.buf.len() as u64;
        let mut line = &self.buf[..self.buf.len() - 1];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }

    /// Bytes occupied by the lines emitted so far, terminators included.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }
}
