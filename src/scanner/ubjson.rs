//! UBJSON scanner: splits on matched `[]`/`{}` containers, treating
//! length-prefixed strings and fixed-width primitives as opaque payloads to
//! skip rather than recursing into them (spec.md §4.3.3).
//!
//! Ported transition-for-transition from `splitstream_ubjson.c`: every
//! value-position byte (object keys included) is expected to carry its own
//! type marker, so a bare, marker-less object key is out of scope here, the
//! same limitation the reference scanner has.

use crate::scanner::{ScanResult, Scanner};
use crate::state::{ScannerState, UbjsonState};

pub struct UbjsonScanner;

const COUNTER_SKIP_REMAINING: usize = 0;
const COUNTER_LENGTH_VALUE: usize = 1;

/// See `scanner::xml::resume_state`: at depth 0 we're between unrelated
/// top-level values and must go back to `Init`, or `Document`'s
/// inner-depth-only start capture would fold bytes between siblings into
/// the next document.
fn resume_state(depth: i32) -> UbjsonState {
    if depth == 0 {
        UbjsonState::Init
    } else {
        UbjsonState::Document
    }
}

impl Scanner for UbjsonScanner {
    fn scan(&self, state: &mut crate::state::EngineState, buf: &[u8]) -> ScanResult {
        let mut ub_state = match state.scanner_state {
            ScannerState::Ubjson(s) => s,
            other => panic!("UbjsonScanner invoked with non-UBJSON scanner state {other:?}"),
        };
        let mut remaining = state.counter[COUNTER_SKIP_REMAINING];
        let mut length_value = state.counter[COUNTER_LENGTH_VALUE];
        let mut start: Option<usize> = None;

        let mut i = 0usize;
        while i < buf.len() {
            let c = buf[i];

            match ub_state {
                UbjsonState::Init | UbjsonState::Document => match c {
                    b'[' | b'{' => {
                        if ub_state == UbjsonState::Init
                            || (state.depth == state.start_depth && state.start_depth > 0)
                        {
                            start = Some(i);
                        }
                        state.depth += 1;
                        ub_state = UbjsonState::Document;
                    }
                    b']' | b'}' => {
                        state.depth -= 1;
                        if state.depth == state.start_depth && ub_state != UbjsonState::Init {
                            state.last = c;
                            state.scanner_state = ScannerState::Ubjson(resume_state(state.depth));
                            state.counter[COUNTER_SKIP_REMAINING] = 0;
                            state.counter[COUNTER_LENGTH_VALUE] = 0;
                            return ScanResult { start, end: i + 1 };
                        }
                    }
                    b'S' | b'H' => ub_state = UbjsonState::LengthType,
                    b'C' | b'i' | b'U' => {
                        remaining = 1;
                        ub_state = UbjsonState::String;
                    }
                    b'I' => {
                        remaining = 2;
                        ub_state = UbjsonState::String;
                    }
                    b'l' | b'd' => {
                        remaining = 4;
                        ub_state = UbjsonState::String;
                    }
                    b'L' | b'D' => {
                        remaining = 8;
                        ub_state = UbjsonState::String;
                    }
                    // Unsized scalars (T/F/N/Z) and container-type
                    // optimization markers are consumed implicitly: no
                    // payload to skip, stay in Document.
                    _ => {}
                },

                UbjsonState::String => {
                    remaining -= 1;
                    if remaining <= 0 {
                        remaining = 0;
                        ub_state = UbjsonState::Document;
                    }
                }

                UbjsonState::LengthType => {
                    remaining = match c {
                        b'i' | b'U' => 1,
                        b'I' => 2,
                        b'l' => 4,
                        // 64-bit lengths are unsupported; fall back to Document.
                        _ => 0,
                    };
                    length_value = 0;
                    ub_state = if remaining == 0 {
                        UbjsonState::Document
                    } else {
                        UbjsonState::Length
                    };
                }

                UbjsonState::Length => {
                    length_value = (length_value << 8) | c as i32;
                    remaining -= 1;
                    if remaining <= 0 {
                        // Matches `splitstream_ubjson.c`: unconditionally
                        // entered even for a computed length of zero — the
                        // `String` state then immediately falls through to
                        // `Document` on its very next byte (see the `<= 0`
                        // check there) rather than skipping any payload. A
                        // known quirk of the reference scanner, reproduced
                        // as-is rather than special-cased away.
                        remaining = length_value;
                        length_value = 0;
                        ub_state = UbjsonState::String;
                    }
                }
            }

            state.last = c;
            i += 1;
        }

        state.scanner_state = ScannerState::Ubjson(ub_state);
        state.counter[COUNTER_SKIP_REMAINING] = remaining;
        state.counter[COUNTER_LENGTH_VALUE] = length_value;
        ScanResult { start, end: 0 }
    }
}
