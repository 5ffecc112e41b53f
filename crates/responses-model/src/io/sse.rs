use std::collections::VecDeque;

use serde_json::Value;

use super::{Chunks, ChunksError};

const DATA_PREFIX: &str = "data:";
const END_MARKER: &str = "[DONE]";

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
}

/// A type for reading server-sent events from a chunk stream.
///
/// Bytes are buffered until a block boundary (`\n\n`) is seen, so neither
/// blocks nor UTF-8 sequences have to align with chunk boundaries. Every
/// `data:` line of a block is decoded as a JSON document on its own; lines
/// that are not JSON are dropped.
pub struct Sse {
    buf: Vec<u8>,
    // Bytes of `buf` already known to hold no block boundary.
    scanned: usize,
    records: VecDeque<Value>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            records: VecDeque::new(),
            chunks,
            exhausted: false,
        }
    }

    /// Returns the next decoded record, or `None` once the stream ended.
    pub async fn next_record(&mut self) -> Result<Option<Value>, Error> {
        loop {
            if let Some(record) = self.records.pop_front() {
                return Ok(Some(record));
            }

            // Drain complete blocks before reading more data from the stream.
            if self.try_decode_block() {
                continue;
            }

            if self.exhausted {
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => {
                    if !self.buf.is_empty() {
                        trace!(
                            "discarding {} bytes of incomplete block",
                            self.buf.len()
                        );
                        self.buf.clear();
                        self.scanned = 0;
                    }
                    self.exhausted = true;
                }
            }
        }
    }

    fn try_decode_block(&mut self) -> bool {
        // A boundary may straddle the last scanned byte and the new data.
        let start = self.scanned.saturating_sub(1);
        let Some(eob_idx) = self.buf[start..]
            .windows(2)
            .position(|w| w == b"\n\n")
            .map(|idx| start + idx)
        else {
            self.scanned = self.buf.len();
            return false;
        };
        self.scanned = 0;

        let block: Vec<u8> = self.buf.drain(0..eob_idx + 2).collect();
        let block = String::from_utf8_lossy(&block[..eob_idx]);
        trace!("got sse block: {block:?}");
        self.records.extend(decode_block(&block));
        true
    }
}

/// Decodes the `data:` payloads of one block, skipping the end marker and
/// anything that is not a JSON document.
pub(crate) fn decode_block(block: &str) -> impl Iterator<Item = Value> + '_ {
    block
        .split('\n')
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .map(str::trim)
        .filter(|payload| !payload.is_empty() && *payload != END_MARKER)
        .filter_map(|payload| match serde_json::from_str(payload) {
            Ok(value) => Some(value),
            Err(err) => {
                trace!("skipping non-json payload ({err}): {payload}");
                None
            }
        })
}
