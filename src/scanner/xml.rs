//! XML scanner: a resumable byte-level tokenizer that finds top-level
//! element boundaries without building a parse tree.
//!
//! Ported transition-for-transition from `splitstream_xml.c`. One subtlety
//! worth calling out: the original only updates `last` (the byte used to
//! detect `/>` self-closing tags) when the current byte does *not* cause an
//! immediate state transition — a transitioning byte leaves `last` holding
//! whatever it held before. That is reproduced here via the `transitioned`
//! flag on every arm; removing it would make the self-close check observe
//! the wrong byte on inputs like degenerate empty tags.

use crate::scanner::{ScanResult, Scanner};
use crate::state::{ScannerState, XmlState};

pub struct XmlScanner;

const COUNTER_DASH: usize = 0;
const COUNTER_BRACKET: usize = 1;

/// The state to resume in after emitting a document. Depth 0 means we're
/// back at the true top level — between unrelated sibling documents, not
/// inside any element — so the next `<` must be treated the way the very
/// first one was (`Init`), or `Document`'s stricter inner-depth-only start
/// capture would swallow whitespace between top-level siblings into the
/// next document. A nonzero depth (`start_depth > 0`) means we're still
/// inside the enclosing element, where that inner-depth capture is exactly
/// what picks out the next sibling.
fn resume_state(depth: i32) -> XmlState {
    if depth == 0 {
        XmlState::Init
    } else {
        XmlState::Document
    }
}

impl Scanner for XmlScanner {
    fn scan(&self, state: &mut crate::state::EngineState, buf: &[u8]) -> ScanResult {
        let mut xml_state = match state.scanner_state {
            ScannerState::Xml(s) => s,
            other => panic!("XmlScanner invoked with non-XML scanner state {other:?}"),
        };
        let mut dash_run = state.counter[COUNTER_DASH];
        let mut bracket_run = state.counter[COUNTER_BRACKET];
        let mut start: Option<usize> = None;

        let mut i = 0usize;
        while i < buf.len() {
            let c = buf[i];
            let mut transitioned = true;

            match xml_state {
                XmlState::Init | XmlState::Document => {
                    if c == b'<' {
                        if xml_state == XmlState::Init
                            || (state.depth == state.start_depth && state.start_depth > 0)
                        {
                            start = Some(i);
                        }
                        xml_state = XmlState::ElementOrComment;
                    } else {
                        transitioned = false;
                    }
                }

                XmlState::ElementOrComment => match c {
                    b'>' => {
                        xml_state = XmlState::Document;
                        if state.last != b'/' {
                            state.depth += 1;
                        } else if state.depth == state.start_depth {
                            state.last = c;
                            state.scanner_state = ScannerState::Xml(resume_state(state.depth));
                            state.counter[COUNTER_DASH] = 0;
                            state.counter[COUNTER_BRACKET] = 0;
                            return ScanResult { start, end: i + 1 };
                        }
                    }
                    b'/' => xml_state = XmlState::EndElement,
                    b'?' => xml_state = XmlState::Instruction,
                    b'!' => xml_state = XmlState::CommentOrInstruction,
                    _ => xml_state = XmlState::BeginElement,
                },

                XmlState::CommentOrInstruction => match c {
                    b'-' => {
                        if dash_run > 0 {
                            dash_run = 0;
                            xml_state = XmlState::Comment;
                        } else {
                            dash_run += 1;
                            transitioned = false;
                        }
                    }
                    b'>' => {
                        dash_run = 0;
                        // A bare `<!>` construct never opened an element, so
                        // `depth` is unchanged; resume the way a just-emitted
                        // document does, or a top-level `<!>` before the
                        // first real document would glue its noise onto it.
                        xml_state = resume_state(state.depth);
                    }
                    b'[' => {
                        dash_run = 0;
                        xml_state = XmlState::Cdata;
                    }
                    _ => {
                        dash_run = 0;
                        xml_state = XmlState::Instruction;
                    }
                },

                XmlState::BeginElement => {
                    if c == b'>' {
                        xml_state = XmlState::Document;
                        if state.last != b'/' {
                            state.depth += 1;
                        } else if state.depth == state.start_depth {
                            state.last = c;
                            state.scanner_state = ScannerState::Xml(resume_state(state.depth));
                            state.counter[COUNTER_DASH] = 0;
                            state.counter[COUNTER_BRACKET] = 0;
                            return ScanResult { start, end: i + 1 };
                        }
                    } else {
                        transitioned = false;
                    }
                }

                XmlState::EndElement => {
                    if c == b'>' {
                        state.depth -= 1;
                        if state.depth == state.start_depth {
                            state.last = c;
                            state.scanner_state = ScannerState::Xml(resume_state(state.depth));
                            state.counter[COUNTER_DASH] = 0;
                            state.counter[COUNTER_BRACKET] = 0;
                            return ScanResult { start, end: i + 1 };
                        }
                        xml_state = XmlState::Document;
                    } else {
                        transitioned = false;
                    }
                }

                XmlState::Instruction => {
                    if c == b'>' {
                        // Processing instructions and `<!DOCTYPE ...>`-shaped
                        // constructs never open an element either; same
                        // reasoning as the `<!>` case above.
                        xml_state = resume_state(state.depth);
                    } else {
                        transitioned = false;
                    }
                }

                XmlState::Comment => match c {
                    b'>' => {
                        if dash_run >= 2 {
                            dash_run = 0;
                            // A comment never opens an element; resume the
                            // way a just-emitted document does so a
                            // top-level comment ahead of the real first
                            // document doesn't get glued onto it.
                            xml_state = resume_state(state.depth);
                        } else {
                            transitioned = false;
                        }
                    }
                    b'-' => {
                        dash_run += 1;
                        transitioned = false;
                    }
                    _ => {
                        dash_run = 0;
                        transitioned = false;
                    }
                },

                XmlState::Cdata => match c {
                    b'>' => {
                        if bracket_run >= 2 {
                            bracket_run = 0;
                            xml_state = resume_state(state.depth);
                        } else {
                            bracket_run = 0;
                            transitioned = false;
                        }
                    }
                    b']' => {
                        bracket_run += 1;
                        transitioned = false;
                    }
                    _ => {
                        bracket_run = 0;
                        transitioned = false;
                    }
                },
            }

            if !transitioned {
                state.last = c;
            }
            i += 1;
        }

        state.scanner_state = ScannerState::Xml(xml_state);
        state.counter[COUNTER_DASH] = dash_run;
        state.counter[COUNTER_BRACKET] = bracket_run;
        ScanResult { start, end: 0 }
    }
}
