//! Validated configuration for a split run, mirroring the bounds the
//! reference Python wrapper enforces before it will construct a generator
//! (`splitstream_py.c`): chunk size and maximum document size are both
//! capped well below what a caller could accidentally request.

use crate::error::SplitError;
use crate::scanner::Format;

/// Default read size, matching the reference wrapper's `bufsize` default.
pub const DEFAULT_BUFSIZE: usize = 1024;
/// Upper bound on `bufsize`: 100 MiB.
pub const MAX_BUFSIZE: usize = 1024 * 1024 * 100;

/// Default maximum accumulated document size, matching the reference
/// wrapper's `max` default.
pub const DEFAULT_MAX_DOC_SIZE: usize = 100 * 1024 * 1024;
/// Upper bound on the configurable maximum document size: 1 GiB.
pub const MAX_MAX_DOC_SIZE: usize = 1 << 30;

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub format: Format,
    /// Nesting depth at which top-level documents are delimited.
    pub start_depth: i32,
    /// Bytes read from the source per driver iteration.
    pub bufsize: usize,
    /// Documents larger than this are dropped rather than ever returned.
    pub max_doc_size: usize,
    /// Bytes prepended to the stream before the first real chunk, as if the
    /// source had produced them itself (spec.md supplemented feature: lets a
    /// caller re-inject a chunk it peeked at before handing the reader off).
    pub preamble: Vec<u8>,
}

impl SplitterConfig {
    pub fn new(format: Format) -> Self {
        SplitterConfig {
            format,
            start_depth: 0,
            bufsize: DEFAULT_BUFSIZE,
            max_doc_size: DEFAULT_MAX_DOC_SIZE,
            preamble: Vec::new(),
        }
    }

    pub fn with_start_depth(mut self, start_depth: i32) -> Self {
        self.start_depth = start_depth;
        self
    }

    pub fn with_bufsize(mut self, bufsize: usize) -> Self {
        self.bufsize = bufsize;
        self
    }

    pub fn with_max_doc_size(mut self, max_doc_size: usize) -> Self {
        self.max_doc_size = max_doc_size;
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<Vec<u8>>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Validates the bounds a caller may have set directly, the way the
    /// reference wrapper does before constructing its generator state.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.start_depth < 0 {
            return Err(SplitError::InvalidConfig(format!(
                "start_depth must be >= 0, got {}",
                self.start_depth
            )));
        }
        if self.bufsize == 0 || self.bufsize > MAX_BUFSIZE {
            return Err(SplitError::InvalidConfig(format!(
                "bufsize must be in 1..={MAX_BUFSIZE}, got {}",
                self.bufsize
            )));
        }
        if self.max_doc_size == 0 || self.max_doc_size > MAX_MAX_DOC_SIZE {
            return Err(SplitError::InvalidConfig(format!(
                "max_doc_size must be in 1..={MAX_MAX_DOC_SIZE}, got {}",
                self.max_doc_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SplitterConfig::new(Format::Xml).validate().unwrap();
    }

    #[test]
    fn zero_bufsize_is_rejected() {
        let cfg = SplitterConfig::new(Format::Json).with_bufsize(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversize_bufsize_is_rejected() {
        let cfg = SplitterConfig::new(Format::Json).with_bufsize(MAX_BUFSIZE + 1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversize_max_doc_size_is_rejected() {
        let cfg = SplitterConfig::new(Format::Ubjson).with_max_doc_size(MAX_MAX_DOC_SIZE + 1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_start_depth_is_rejected() {
        let cfg = SplitterConfig::new(Format::Xml).with_start_depth(-1);
        assert!(cfg.validate().is_err());
    }
}
