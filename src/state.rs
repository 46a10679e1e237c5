//! `EngineState`: the only memory a scanner is permitted to carry between
//! invocations.

use std::cell::RefCell;
use std::rc::Rc;

use crate::document::Accumulator;
use crate::pool::BufferPool;

/// The per-scanner-kind tokenizer state. Each scanner defines its own small
/// set of variants; see `scanner::xml`, `scanner::json`, `scanner::ubjson`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlState {
    Init,
    Document,
    ElementOrComment,
    CommentOrInstruction,
    BeginElement,
    EndElement,
    Instruction,
    Comment,
    Cdata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonState {
    Init,
    Document,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbjsonState {
    Init,
    Document,
    /// Skipping `remaining` opaque payload bytes.
    String,
    LengthType,
    Length,
}

/// Discriminated scanner state, carried across chunk boundaries.
///
/// The C source this is ported from folds a `Rescan` sentinel into the same
/// enum slot as the tokenizer's own states. That sentinel is unnecessary
/// here: the bytes left unscanned after a just-emitted document (spec.md
/// §4.4) are driver-level bookkeeping ([`crate::engine::Engine`]'s `carry`
/// buffer), not scanner state, so this enum only ever holds a genuine
/// tokenizer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Xml(XmlState),
    Json(JsonState),
    Ubjson(UbjsonState),
}

/// Bits of [`EngineState::flags`]. Values mirror the C source but are not
/// persisted or otherwise meaningful outside this process.
pub mod flags {
    pub const DID_RETURN_DOCUMENT: u8 = 1 << 3;
    pub const FILE_EOF: u8 = 1 << 4;
}

/// Engine state persistent across chunk boundaries — the only memory a
/// scanner may carry between invocations of [`crate::scanner::Scanner::scan`].
pub struct EngineState {
    /// Nesting depth at which top-level documents are delimited. Immutable
    /// after construction.
    pub start_depth: i32,
    /// Current nesting depth; `>= 0` at every scanner entry and exit.
    pub depth: i32,
    /// Scanner-private scratch integers preserved across resumes.
    pub counter: [i32; 4],
    /// Most recent input byte observed (XML uses this to detect `/>`).
    pub last: u8,
    /// Current tokenizer position, specific to the active format.
    pub scanner_state: ScannerState,
    pub flags: u8,
    /// Bytes observed since the most recent document-start (or `Init`).
    pub doc: Accumulator,
    /// Lazily created on first append; destroyed with the `EngineState`.
    pub(crate) pool: Rc<RefCell<BufferPool>>,
}

impl EngineState {
    /// Constructs state for the given scanner kind at `start_depth` (0 for
    /// top-level splitting).
    pub fn new(initial: ScannerState, start_depth: i32) -> Self {
        EngineState {
            start_depth: start_depth.max(0),
            depth: 0,
            counter: [0; 4],
            last: 0,
            scanner_state: initial,
            flags: 0,
            doc: Accumulator::new(),
            pool: Rc::new(RefCell::new(BufferPool::new())),
        }
    }

    #[inline(always)]
    pub fn did_return_document(&self) -> bool {
        self.flags & flags::DID_RETURN_DOCUMENT != 0
    }

    #[inline(always)]
    pub fn set_did_return_document(&mut self, value: bool) {
        if value {
            self.flags |= flags::DID_RETURN_DOCUMENT;
        } else {
            self.flags &= !flags::DID_RETURN_DOCUMENT;
        }
    }

    #[inline(always)]
    pub fn file_eof(&self) -> bool {
        self.flags & flags::FILE_EOF != 0
    }

    #[inline(always)]
    pub fn set_file_eof(&mut self, value: bool) {
        if value {
            self.flags |= flags::FILE_EOF;
        } else {
            self.flags &= !flags::FILE_EOF;
        }
    }

    /// Releases the in-progress document buffer back to the pool.
    pub fn release_doc(&mut self) {
        self.doc.release(&self.pool);
    }
}

impl Drop for EngineState {
    fn drop(&mut self) {
        self.release_doc();
        // A leaked pool at this point is a programming error: some Document
        // drawn from it is still alive elsewhere. `Rc::strong_count` > 1
        // means a `Document` still holds a reference; only check occupancy
        // when we are the pool's last owner.
        if Rc::strong_count(&self.pool) == 1 {
            let pool = std::mem::replace(&mut self.pool, Rc::new(RefCell::new(BufferPool::new())));
            if let Ok(cell) = Rc::try_unwrap(pool) {
                cell.into_inner().destroy(cfg!(debug_assertions));
            }
        }
    }
}
