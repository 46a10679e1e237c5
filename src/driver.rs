//! Drives an [`Engine`] to exhaustion over a [`std::io::Read`] source or an
//! in-memory byte slice, handling the read/drain loop the reference file
//! driver implements in `SplitstreamGetNextDocumentFromFile`: keep pulling
//! chunks and handing them to the engine; once the source is exhausted,
//! keep calling with empty chunks until a call returns nothing, which is
//! when the stream is well and truly done (anything still short of a
//! terminator at that point is incomplete and is dropped).

use std::io::Read;

use tracing::debug;

use crate::config::SplitterConfig;
use crate::document::Document;
use crate::engine::Engine;
use crate::error::SplitError;

/// Iterator adapter that turns any [`Read`] plus a [`SplitterConfig`] into a
/// stream of complete documents.
pub struct DocumentReader<R> {
    source: R,
    engine: Engine,
    max_doc_size: usize,
    read_buf: Vec<u8>,
    preamble: Option<Vec<u8>>,
    source_exhausted: bool,
    /// Set once a read-then-scan round trip produces nothing: the source is
    /// empty and nothing remains buffered, so iteration is over for good.
    done: bool,
}

impl<R: Read> DocumentReader<R> {
    pub fn new(source: R, config: &SplitterConfig) -> Result<Self, SplitError> {
        config.validate()?;
        Ok(DocumentReader {
            source,
            engine: Engine::new(config.format, config.start_depth),
            max_doc_size: config.max_doc_size,
            read_buf: vec![0u8; config.bufsize],
            preamble: (!config.preamble.is_empty()).then(|| config.preamble.clone()),
            source_exhausted: false,
            done: false,
        })
    }

    /// Returns the next complete document, or `Ok(None)` once the source is
    /// exhausted and nothing remains to emit.
    pub fn next_document(&mut self) -> Result<Option<Document>, SplitError> {
        loop {
            if self.done {
                return Ok(None);
            }

            if let Some(preamble) = self.preamble.take() {
                let doc = self.engine.get_next_document(self.max_doc_size, &preamble)?;
                if !doc.is_empty() {
                    return Ok(Some(doc));
                }
                continue;
            }

            // Mirror `SplitstreamGetNextDocumentFromFile`'s DID_RETURN_DOCUMENT
            // re-entry: right after handing back a document, retry with no
            // new input before touching the source again. A single read can
            // carry more than one document's worth of bytes, and the next
            // one may already be sitting in the engine's carry buffer — read
            // only once that possibility is exhausted, so a live/blocking
            // source is never read from needlessly.
            let read_len = if self.engine.did_return_document() {
                0
            } else if self.source_exhausted {
                0
            } else {
                let n = self.source.read(&mut self.read_buf)?;
                if n == 0 {
                    self.source_exhausted = true;
                    self.engine.note_file_eof();
                } else {
                    debug!(bytes = n, "read chunk");
                }
                n
            };

            let doc = self.engine.get_next_document(self.max_doc_size, &self.read_buf[..read_len])?;
            if !doc.is_empty() {
                return Ok(Some(doc));
            }
            if self.source_exhausted && !self.engine.did_return_document() {
                self.done = true;
                return Ok(None);
            }
        }
    }
}

impl<R: Read> Iterator for DocumentReader<R> {
    type Item = Result<Document, SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

/// Splits an in-memory byte slice into documents, without any I/O. Useful
/// for embedders that already have the whole stream (or one frame of it)
/// in memory — e.g. the `wasm` binding.
pub fn split_bytes(config: &SplitterConfig, mut bytes: &[u8]) -> Result<Vec<Document>, SplitError> {
    config.validate()?;
    let mut engine = Engine::new(config.format, config.start_depth);
    let mut out = Vec::new();

    if !config.preamble.is_empty() {
        let doc = engine.get_next_document(config.max_doc_size, &config.preamble)?;
        if !doc.is_empty() {
            out.push(doc);
        }
    }

    while !bytes.is_empty() {
        let take = bytes.len().min(config.bufsize.max(1));
        let (chunk, rest) = bytes.split_at(take);
        bytes = rest;
        let doc = engine.get_next_document(config.max_doc_size, chunk)?;
        if !doc.is_empty() {
            out.push(doc);
        }
    }

    // Drain anything still pending after the last real chunk.
    loop {
        let doc = engine.get_next_document(config.max_doc_size, &[])?;
        if doc.is_empty() {
            break;
        }
        out.push(doc);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::scanner::Format;

    #[test]
    fn reader_drains_all_siblings_from_a_cursor() {
        let input = b"<a/><b/><c/>".to_vec();
        let cfg = SplitterConfig::new(Format::Xml);
        let mut reader = DocumentReader::new(std::io::Cursor::new(input), &cfg).unwrap();
        let docs: Result<Vec<Vec<u8>>, SplitError> =
            std::iter::from_fn(|| reader.next_document().transpose())
                .map(|r| r.map(|d| d.as_bytes().to_vec()))
                .collect();
        assert_eq!(docs.unwrap(), vec![b"<a/>".to_vec(), b"<b/>".to_vec(), b"<c/>".to_vec()]);
    }

    #[test]
    fn reader_respects_a_small_bufsize_across_many_reads() {
        let input = br#"{"a":1}{"b":2}{"c":3}"#.to_vec();
        let cfg = SplitterConfig::new(Format::Json).with_bufsize(3);
        let mut reader = DocumentReader::new(std::io::Cursor::new(input), &cfg).unwrap();
        let mut docs = Vec::new();
        while let Some(doc) = reader.next_document().unwrap() {
            docs.push(doc.as_bytes().to_vec());
        }
        assert_eq!(
            docs,
            vec![br#"{"a":1}"#.to_vec(), br#"{"b":2}"#.to_vec(), br#"{"c":3}"#.to_vec()]
        );
    }

    #[test]
    fn preamble_is_scanned_before_the_source() {
        let input = b"<b/>".to_vec();
        let cfg = SplitterConfig::new(Format::Xml).with_preamble(&b"<a/>"[..]);
        let mut reader = DocumentReader::new(std::io::Cursor::new(input), &cfg).unwrap();
        let mut docs = Vec::new();
        while let Some(doc) = reader.next_document().unwrap() {
            docs.push(doc.as_bytes().to_vec());
        }
        assert_eq!(docs, vec![b"<a/>".to_vec(), b"<b/>".to_vec()]);
    }

    #[test]
    fn split_bytes_handles_a_single_in_memory_slice() {
        let cfg = SplitterConfig::new(Format::Json);
        let docs = split_bytes(&cfg, br#"[1]{"x":2}"#).unwrap();
        assert_eq!(docs.iter().map(|d| d.as_bytes().to_vec()).collect::<Vec<_>>(), vec![
            b"[1]".to_vec(),
            br#"{"x":2}"#.to_vec()
        ]);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_reading() {
        let cfg = SplitterConfig::new(Format::Xml).with_bufsize(0);
        let result = DocumentReader::new(std::io::Cursor::new(Vec::new()), &cfg);
        assert!(result.is_err());
    }

    /// A `Read` source that yields its whole payload on the first call and
    /// errors on any further call — standing in for a live/blocking source
    /// that has no more bytes ready yet.
    struct OneShotReader {
        payload: Option<Vec<u8>>,
    }

    impl Read for OneShotReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.payload.take() {
                Some(bytes) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                None => Err(io::Error::new(io::ErrorKind::WouldBlock, "no more data ready")),
            }
        }
    }

    #[test]
    fn second_document_in_the_same_read_drains_without_a_further_read_call() {
        let source = OneShotReader {
            payload: Some(b"<a/><b/>".to_vec()),
        };
        let cfg = SplitterConfig::new(Format::Xml);
        let mut reader = DocumentReader::new(source, &cfg).unwrap();
        assert_eq!(reader.next_document().unwrap().unwrap().as_bytes(), b"<a/>");
        // Would return a WouldBlock error here if the driver read again
        // instead of draining the already-buffered second document.
        assert_eq!(reader.next_document().unwrap().unwrap().as_bytes(), b"<b/>");
    }
}
