//! An owned byte buffer handed to the caller, and the accumulator that
//! builds one up across chunk boundaries before it is emitted.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::SplitError;
use crate::pool::BufferPool;

/// A completed document: an owned byte buffer and its length.
///
/// Ownership transfers to the caller on emit. The backing storage came
/// from a [`BufferPool`] shared (via `Rc<RefCell<_>>`, single-threaded per
/// the engine's concurrency model) with the `Engine` that produced it;
/// the pool outlives every `Document` drawn from it because each
/// `Document` holds a strong reference to it.
pub struct Document {
    ptr: Option<NonNull<u8>>,
    len: usize,
    pool: Rc<RefCell<BufferPool>>,
}

impl Document {
    fn empty(pool: Rc<RefCell<BufferPool>>) -> Self {
        Document {
            ptr: None,
            len: 0,
            pool,
        }
    }

    /// Borrows the document's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: `ptr` was allocated for exactly `len` live bytes and is
            // only ever read here or copied from in `Accumulator::append`.
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            self.pool.borrow_mut().free(ptr, self.len);
        }
        // Per spec: a released document's length is zero, not one.
        self.len = 0;
    }
}

/// Owns the partially-assembled document bytes observed so far but not yet
/// terminated. Backed lazily by a [`BufferPool`] created on first append.
pub struct Accumulator {
    ptr: Option<NonNull<u8>>,
    len: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator { ptr: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: see `Document::as_bytes`.
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.len) },
            None => &[],
        }
    }

    /// Appends `bytes` to the accumulator, growing (and allocating, on the
    /// first call) from `pool`. A no-op for an empty slice.
    ///
    /// Spec §7 item 1: allocation failure is fatal and propagated upward
    /// rather than silently aborting the process.
    pub fn append(&mut self, pool: &Rc<RefCell<BufferPool>>, bytes: &[u8]) -> Result<(), SplitError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut pool_ref = pool.borrow_mut();
        match self.ptr {
            None => {
                let new_len = bytes.len();
                let ptr = pool_ref.alloc(new_len).ok_or(SplitError::Alloc)?;
                // SAFETY: `ptr` has room for `new_len` freshly-allocated bytes.
                unsafe {
                    std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), new_len);
                }
                self.ptr = Some(ptr);
                self.len = new_len;
            }
            Some(old_ptr) => {
                let old_len = self.len;
                let new_len = old_len + bytes.len();
                let new_ptr = pool_ref
                    .realloc(old_ptr, old_len, new_len)
                    .ok_or(SplitError::Alloc)?;
                // SAFETY: `new_ptr` has at least `new_len` bytes reserved; the
                // first `old_len` are the prior contents (copied by `realloc`
                // when it could not extend in place).
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        bytes.as_ptr(),
                        new_ptr.as_ptr().add(old_len),
                        bytes.len(),
                    );
                }
                self.ptr = Some(new_ptr);
                self.len = new_len;
            }
        }
        Ok(())
    }

    /// Frees the buffer back to `pool` and resets the accumulator to empty.
    pub fn release(&mut self, pool: &Rc<RefCell<BufferPool>>) {
        if let Some(ptr) = self.ptr.take() {
            pool.borrow_mut().free(ptr, self.len);
        }
        self.len = 0;
    }

    /// Consumes the accumulator, handing its bytes off as a released
    /// [`Document`] bound to `pool` (empty if nothing was ever appended).
    pub fn into_document(mut self, pool: Rc<RefCell<BufferPool>>) -> Document {
        match self.ptr.take() {
            Some(ptr) => {
                let len = self.len;
                self.len = 0;
                Document {
                    ptr: Some(ptr),
                    len,
                    pool,
                }
            }
            None => Document::empty(pool),
        }
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        debug_assert!(
            self.ptr.is_none(),
            "Accumulator dropped with live bytes; call release() first"
        );
    }
}
