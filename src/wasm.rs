//! FFI layer for running the splitter in a browser or other `wasm32`
//! host. Exports for JS: a write-region pointer for the next chunk, a
//! chunk-scan call that returns newly completed documents, and an explicit
//! reset between sessions.
//!
//! Generalizes the original log-indexing FFI surface (pointer-based chunk
//! write region, global single-session engine, explicit `clear`) from
//! indexing newlines to splitting documents.

use once_cell::sync::Lazy;
use std::sync::RwLock;
use wasm_bindgen::prelude::*;

use crate::document::Document;
use crate::engine::Engine;
use crate::scanner::Format;

const WRITE_BUF_CAP: usize = 1024 * 1024;

struct WasmSession {
    engine: Engine,
    write_buf: Vec<u8>,
    max_doc_size: usize,
    completed: Vec<Document>,
}

impl WasmSession {
    fn new(format: Format, start_depth: i32) -> Self {
        WasmSession {
            engine: Engine::new(format, start_depth),
            write_buf: vec![0u8; WRITE_BUF_CAP],
            max_doc_size: crate::config::DEFAULT_MAX_DOC_SIZE,
            completed: Vec::new(),
        }
    }
}

/// Single active session. Single-threaded WASM implies one stream at a
/// time; call `reset` to start a new one with a (possibly different)
/// format.
static SESSION: Lazy<RwLock<WasmSession>> =
    Lazy::new(|| RwLock::new(WasmSession::new(Format::Json, 0)));

/// Starts a new session for `format` ("xml", "json", or "ubjson") at the
/// given nesting `start_depth`. Drops anything left over from a prior
/// session.
#[wasm_bindgen]
pub fn reset(format: &str, start_depth: i32) -> bool {
    let Some(format) = Format::parse(format) else {
        return false;
    };
    *SESSION.write().expect("session lock") = WasmSession::new(format, start_depth);
    true
}

/// Returns a pointer to the write region for the next chunk. JS should
/// write up to `size` bytes there, then call `scan_chunk(chunk_len)` with
/// the actual length.
#[wasm_bindgen]
pub fn get_buffer_pointer(size: usize) -> *mut u8 {
    let mut session = SESSION.write().expect("session lock");
    if session.write_buf.len() < size {
        session.write_buf.resize(size, 0);
    }
    session.write_buf.as_mut_ptr()
}

/// Scans the chunk of length `chunk_len` that JS wrote into the buffer.
/// A single chunk may carry more than one document's worth of bytes, so
/// this drains every document the chunk completes, not just the first,
/// mirroring the chunk driver's own `DID_RETURN_DOCUMENT` re-entry loop.
/// Call `take_document` repeatedly afterward to retrieve them.
#[wasm_bindgen]
pub fn scan_chunk(chunk_len: usize) {
    let mut session = SESSION.write().expect("session lock");
    let max_doc_size = session.max_doc_size;
    let chunk = session.write_buf[..chunk_len].to_vec();
    match session.engine.get_next_document(max_doc_size, &chunk) {
        Ok(doc) if !doc.is_empty() => session.completed.push(doc),
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(%err, "scan_chunk failed");
            return;
        }
    }
    loop {
        match session.engine.get_next_document(max_doc_size, &[]) {
            Ok(doc) if !doc.is_empty() => session.completed.push(doc),
            Ok(_) => break,
            Err(err) => {
                tracing::warn!(%err, "scan_chunk drain failed");
                break;
            }
        }
    }
}

/// Signals that no more chunks are coming and drains anything still
/// buffered — a document may be sitting complete in the engine's carry
/// with nothing left to trigger another `scan_chunk` call. Safe to call
/// even if nothing is left; returns the number of documents queued by the
/// drain.
#[wasm_bindgen]
pub fn finish() -> usize {
    let mut session = SESSION.write().expect("session lock");
    session.engine.note_file_eof();
    let max_doc_size = session.max_doc_size;
    let mut drained = 0;
    loop {
        match session.engine.get_next_document(max_doc_size, &[]) {
            Ok(doc) if !doc.is_empty() => {
                session.completed.push(doc);
                drained += 1;
            }
            Ok(_) => break,
            Err(err) => {
                tracing::warn!(%err, "finish drain failed");
                break;
            }
        }
    }
    drained
}

/// Returns the number of documents completed but not yet taken.
#[wasm_bindgen]
pub fn pending_document_count() -> usize {
    SESSION.read().expect("session lock").completed.len()
}

/// Takes the oldest completed-but-undelivered document as a
/// UTF-8-lossy-decoded JS string, or `undefined` if none are pending.
#[wasm_bindgen]
pub fn take_document() -> JsValue {
    let mut session = SESSION.write().expect("session lock");
    if session.completed.is_empty() {
        return JsValue::UNDEFINED;
    }
    let doc = session.completed.remove(0);
    JsValue::from_str(&String::from_utf8_lossy(doc.as_bytes()))
}
