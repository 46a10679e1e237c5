//! The `Engine`: drives a [`Scanner`] across successive chunks, handling the
//! rescan-merge protocol that makes splitting independent of how the input
//! byte stream happens to be chunked (spec.md §4.4, §8).

use tracing::{trace, warn};

use crate::document::{Accumulator, Document};
use crate::error::SplitError;
use crate::scanner::Format;
use crate::state::EngineState;

/// Splits a byte stream, one chunk at a time, into complete top-level
/// documents.
///
/// Feed chunks to [`Engine::get_next_document`] in order. Each call returns
/// as soon as a document terminates within the bytes seen so far; an empty
/// [`Document`] means "no document completed in this call", not end of
/// stream — callers keep calling with `&[]` to drain anything still pending
/// once the underlying source is exhausted.
pub struct Engine {
    format: Format,
    state: EngineState,
    /// Bytes that followed the terminator of the last emitted document but
    /// were never passed through the scanner — `scan` returns before
    /// consuming them, so they must be rescanned as the head of the next
    /// call's buffer (spec.md §4.4). Empty whenever no document has just
    /// been emitted.
    carry: Vec<u8>,
}

impl Engine {
    pub fn new(format: Format, start_depth: i32) -> Self {
        Engine {
            format,
            state: EngineState::new(format.initial_state(), start_depth),
            carry: Vec::new(),
        }
    }

    /// Feeds one chunk to the scanner and returns the next completed
    /// document, if any.
    ///
    /// `max` bounds how many bytes an in-progress document may accumulate
    /// before it is silently discarded (spec.md §5 edge cases); scanning
    /// resumes cleanly on the next document after a drop.
    pub fn get_next_document(&mut self, max: usize, chunk: &[u8]) -> Result<Document, SplitError> {
        self.state.set_did_return_document(false);

        let buf = if self.carry.is_empty() {
            chunk.to_vec()
        } else {
            let mut merged = Vec::with_capacity(self.carry.len() + chunk.len());
            merged.extend_from_slice(&self.carry);
            merged.extend_from_slice(chunk);
            self.carry.clear();
            merged
        };

        let scanner = self.format.scanner();
        let result = scanner.scan(&mut self.state, &buf);
        let consumed_to = if result.end > 0 { result.end } else { buf.len() };

        match result.start {
            Some(at) => {
                // A new document started within this call; anything the
                // accumulator held before that point was noise between
                // documents (or the unused remainder of an earlier dropped
                // one) and is discarded.
                self.state.doc.release(&self.state.pool);
                self.state.doc.append(&self.state.pool, &buf[at..consumed_to])?;
            }
            None => {
                self.state.doc.append(&self.state.pool, &buf[..consumed_to])?;
            }
        }

        if result.end == 0 {
            if self.state.doc.len() > max {
                warn!(
                    len = self.state.doc.len(),
                    max, "accumulated document exceeded the configured maximum; dropping"
                );
                self.state.doc.release(&self.state.pool);
                // Matches `SplitstreamGetNextDocument`'s oversize branch:
                // reset the tokenizer to Init so the bytes discarded from
                // here on are genuinely ignored, rather than left mid-scan
                // where the next terminator would emit a truncated tail of
                // the dropped document instead of starting fresh. Also
                // restore `depth` to `start_depth`: the dropped document
                // was at exactly that depth when it began (the same
                // baseline `resume_state` returns to after a clean close),
                // so without this a still-open nested bracket leaves depth
                // permanently off by one and no later sibling ever closes.
                self.state.scanner_state = self.format.initial_state();
                self.state.depth = self.state.start_depth;
            }
            return Ok(self.empty_document());
        }

        self.carry = buf[result.end..].to_vec();
        let finished_acc = std::mem::take(&mut self.state.doc);
        let finished = finished_acc.into_document(std::rc::Rc::clone(&self.state.pool));

        if finished.len() > max {
            warn!(len = finished.len(), max, "completed document exceeded the configured maximum; dropping");
            return Ok(self.empty_document());
        }

        trace!(len = finished.len(), "document emitted");
        self.state.set_did_return_document(true);
        Ok(finished)
    }

    /// True if the most recent call returned a non-empty document. Lets a
    /// chunk driver retry a drain with no new input before blocking on
    /// another read — a single read can deliver more than one document's
    /// worth of bytes, and the next one may already be sitting in `carry`
    /// (spec.md §3 `DID_RETURN_DOCUMENT`, `SplitstreamGetNextDocumentFromFile`).
    #[inline(always)]
    pub fn did_return_document(&self) -> bool {
        self.state.did_return_document()
    }

    /// Records that the upstream byte source has signalled end-of-stream
    /// (spec.md §3 `FILE_EOF`). Purely informational for callers; the
    /// Engine itself does not change behavior based on this bit.
    pub fn note_file_eof(&mut self) {
        self.state.set_file_eof(true);
    }

    fn empty_document(&self) -> Document {
        Accumulator::new().into_document(std::rc::Rc::clone(&self.state.pool))
    }
}
