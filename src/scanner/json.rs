//! JSON scanner: splits on matched `{}`/`[]` outside strings. Deliberately
//! lenient — it does not validate numbers, literals, colons, or commas;
//! splitting is governed purely by bracket matching outside strings
//! (spec.md §4.3.2).

use crate::scanner::{ScanResult, Scanner};
use crate::state::{JsonState, ScannerState};

pub struct JsonScanner;

const COUNTER_BACKSLASH: usize = 0;

/// See `scanner::xml::resume_state`: at depth 0 we're between unrelated
/// top-level values and must go back to `Init`, or `Document`'s
/// inner-depth-only start capture would fold any bytes between siblings
/// (commas, whitespace) into the next document.
fn resume_state(depth: i32) -> JsonState {
    if depth == 0 {
        JsonState::Init
    } else {
        JsonState::Document
    }
}

impl Scanner for JsonScanner {
    fn scan(&self, state: &mut crate::state::EngineState, buf: &[u8]) -> ScanResult {
        let mut json_state = match state.scanner_state {
            ScannerState::Json(s) => s,
            other => panic!("JsonScanner invoked with non-JSON scanner state {other:?}"),
        };
        let mut backslash_run = state.counter[COUNTER_BACKSLASH];
        let mut start: Option<usize> = None;

        let mut i = 0usize;
        while i < buf.len() {
            let c = buf[i];

            match json_state {
                JsonState::Init => match c {
                    b'[' | b'{' => {
                        start = Some(i);
                        state.depth += 1;
                        json_state = JsonState::Document;
                    }
                    b'"' => json_state = JsonState::String,
                    _ => {}
                },
                JsonState::Document => match c {
                    b'[' | b'{' => {
                        if state.depth == state.start_depth && state.start_depth > 0 {
                            start = Some(i);
                        }
                        state.depth += 1;
                    }
                    b']' | b'}' => {
                        state.depth -= 1;
                        if state.depth == state.start_depth {
                            state.last = c;
                            state.scanner_state = ScannerState::Json(resume_state(state.depth));
                            state.counter[COUNTER_BACKSLASH] = 0;
                            return ScanResult { start, end: i + 1 };
                        }
                    }
                    b'"' => json_state = JsonState::String,
                    _ => {}
                },
                JsonState::String => match c {
                    b'"' => {
                        if backslash_run % 2 == 0 {
                            json_state = JsonState::Document;
                        }
                        backslash_run = 0;
                    }
                    b'\\' => backslash_run += 1,
                    _ => backslash_run = 0,
                },
            }

            state.last = c;
            i += 1;
        }

        state.scanner_state = ScannerState::Json(json_state);
        state.counter[COUNTER_BACKSLASH] = backslash_run;
        ScanResult { start, end: 0 }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::scanner::Format;

    #[test]
    fn two_top_level_values() {
        let mut engine = Engine::new(Format::Json, 0);
        let d1 = engine.get_next_document(1024, br#"{"x":1}[1,2]"#).unwrap();
        assert_eq!(d1.as_bytes(), br#"{"x":1}"#);
        let d2 = engine.get_next_document(1024, b"").unwrap();
        assert_eq!(d2.as_bytes(), b"[1,2]");
    }

    #[test]
    fn byte_at_a_time_with_escaped_quote() {
        let input = br#"{"s":"a\"b"}"#;
        let mut engine = Engine::new(Format::Json, 0);
        let mut last = None;
        for &byte in input {
            let doc = engine.get_next_document(1024, &[byte]).unwrap();
            if !doc.is_empty() {
                last = Some(doc.as_bytes().to_vec());
            }
        }
        assert_eq!(last.unwrap(), input.to_vec());
    }

    #[test]
    fn escaped_backslash_closes_the_string() {
        // `"\\"` is a one-character string (an escaped backslash), so the
        // next `"` after it closes the *outer* object, not a new string.
        let mut engine = Engine::new(Format::Json, 0);
        let doc = engine.get_next_document(1024, br#"{"a":"\\"}"#).unwrap();
        assert_eq!(doc.as_bytes(), br#"{"a":"\\"}"#);
    }

    #[test]
    fn escaped_quote_does_not_close_the_string() {
        let mut engine = Engine::new(Format::Json, 0);
        let doc = engine.get_next_document(1024, br#"{"a":"\""}"#).unwrap();
        assert_eq!(doc.as_bytes(), br#"{"a":"\""}"#);
    }

    #[test]
    fn chunk_boundary_between_brackets() {
        let mut engine = Engine::new(Format::Json, 0);
        let d1 = engine.get_next_document(1024, b"{").unwrap();
        assert!(d1.is_empty());
        let d2 = engine.get_next_document(1024, b"}").unwrap();
        assert_eq!(d2.as_bytes(), b"{}");
    }

    #[test]
    fn siblings_at_start_depth_one() {
        let mut engine = Engine::new(Format::Json, 1);
        let doc1 = engine
            .get_next_document(1024, br#"{"a":[1,2],"b":{"c":3}}"#)
            .unwrap();
        assert_eq!(doc1.as_bytes(), b"[1,2]");
        let doc2 = engine.get_next_document(1024, b"").unwrap();
        assert_eq!(doc2.as_bytes(), br#"{"c":3}"#);
    }

    #[test]
    fn oversize_document_is_dropped_then_next_is_captured() {
        let mut engine = Engine::new(Format::Json, 0);
        let big = format!("{{\"pad\":\"{}\"}}", "x".repeat(200));
        let d1 = engine.get_next_document(100, big.as_bytes()).unwrap();
        assert!(d1.is_empty());
        let d2 = engine.get_next_document(100, br#"{"ok":1}"#).unwrap();
        assert_eq!(d2.as_bytes(), br#"{"ok":1}"#);
    }

    #[test]
    fn oversize_dropped_mid_scan_across_chunks_does_not_leak_a_truncated_tail() {
        // The array's `[` opens in chunk 1, the drop fires mid-array in
        // chunk 2 (still unclosed), and chunk 3 carries only the stray `]`.
        // Without resetting the tokenizer (and depth) on drop, that lone
        // `]` would be misread as closing the already-dropped array and
        // emitted as a bogus truncated document.
        let mut engine = Engine::new(Format::Json, 0);
        let d1 = engine.get_next_document(10, b"[").unwrap();
        assert!(d1.is_empty());
        let filler = "0,".repeat(20);
        let d2 = engine.get_next_document(10, filler.as_bytes()).unwrap();
        assert!(d2.is_empty());
        let d3 = engine.get_next_document(10, b"]").unwrap();
        assert!(d3.is_empty());
        let d4 = engine.get_next_document(10, br#"{"ok":1}"#).unwrap();
        assert_eq!(d4.as_bytes(), br#"{"ok":1}"#);
    }
}
