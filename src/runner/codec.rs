//! Line framing for worker stdout/stderr.
//!
//! Follows the buffering strategy of [`tokio_util::codec::LinesCodec`] with
//! two differences: bytes are decoded lossily so a stray invalid UTF-8
//! sequence never ends the stream, and an over-long line is reported once as
//! [`OutputFrame::Oversized`] and then discarded up to its newline instead of
//! failing the reader.

use std::cmp;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::{AppError, Result};

/// Default maximum line length: 1 MiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1_048_576;

/// One decoded unit of worker output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    /// A complete line without its terminator (`\n` or `\r\n`).
    Line(String),
    /// A line exceeded the limit; its bytes are being dropped.
    Oversized,
}

/// Newline-delimited decoder with a per-line byte limit.
#[derive(Debug)]
pub struct OutputCodec {
    max_length: usize,
    next_index: usize,
    is_discarding: bool,
}

impl OutputCodec {
    /// Codec with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_BYTES)
    }

    /// Codec accepting lines of at most `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            is_discarding: false,
        }
    }
}

impl Default for OutputCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OutputCodec {
    type Item = OutputFrame;
    type Error = AppError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<OutputFrame>> {
        loop {
            // One byte past the limit so a line of exactly `max_length`
            // bytes still finds its newline.
            let read_to = cmp::min(self.max_length.saturating_add(1), buf.len());
            let newline_offset = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.is_discarding, newline_offset) {
                (true, Some(offset)) => {
                    buf.advance(offset + self.next_index + 1);
                    self.is_discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let newline_index = offset + self.next_index;
                    self.next_index = 0;
                    let line = buf.split_to(newline_index + 1);
                    return Ok(Some(OutputFrame::Line(decode_lossy(
                        &line[..newline_index],
                    ))));
                }
                (false, None) if buf.len() > self.max_length => {
                    self.is_discarding = true;
                    return Ok(Some(OutputFrame::Oversized));
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<OutputFrame>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        self.next_index = 0;
        if self.is_discarding {
            self.is_discarding = false;
            buf.clear();
            return Ok(None);
        }
        if buf.is_empty() {
            return Ok(None);
        }

        let line = buf.split_to(buf.len());
        Ok(Some(OutputFrame::Line(decode_lossy(&line))))
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
