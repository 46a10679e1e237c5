//! Property: splitting a stream is independent of how it is chunked
//! (spec.md §8: "∀ streams S, ∀ chunkings C1, C2 of S: the sequence of
//! emitted documents is identical"). Example-based tests colocated with
//! each scanner exercise specific boundary placements; this fuzzes
//! arbitrary boundary placement over a corpus of concatenated documents.

use proptest::prelude::*;

use splitstream::{Engine, Format};

fn drive(format: Format, start_depth: i32, chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut engine = Engine::new(format, start_depth);
    let mut out = Vec::new();
    for chunk in chunks {
        let doc = engine.get_next_document(1 << 20, chunk).unwrap();
        if !doc.is_empty() {
            out.push(doc.as_bytes().to_vec());
        }
    }
    loop {
        let doc = engine.get_next_document(1 << 20, &[]).unwrap();
        if doc.is_empty() {
            break;
        }
        out.push(doc.as_bytes().to_vec());
    }
    out
}

/// Splits `bytes` at the given sorted, deduplicated, in-range offsets.
fn chunk_at<'a>(bytes: &'a [u8], mut cuts: Vec<usize>) -> Vec<&'a [u8]> {
    cuts.retain(|&c| c > 0 && c < bytes.len());
    cuts.sort_unstable();
    cuts.dedup();
    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts {
        out.push(&bytes[start..cut]);
        start = cut;
    }
    out.push(&bytes[start..]);
    out
}

const JSON_DOCS: &[&str] = &[
    r#"{"a":1}"#,
    r#"[1,2,3]"#,
    r#"{"s":"a\"b\\c"}"#,
    r#"{"nested":{"x":[1,[2,3],{"y":"\\"}]}}"#,
    r#"[]"#,
    r#"{}"#,
];

const XML_DOCS: &[&str] = &[
    "<a/>",
    "<b></b>",
    "<r><a/><b/></r>",
    "<!-- a comment --><x/>",
    "<x><![CDATA[a]]b]]></x>",
    "<?pi data?><y/>",
];

fn json_stream() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(JSON_DOCS), 1..6)
        .prop_map(|docs| docs.join("").into_bytes())
}

fn xml_stream() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(XML_DOCS), 1..6)
        .prop_map(|docs| docs.join("").into_bytes())
}

fn cuts_strategy(max_len: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..=max_len.max(1), 0..8)
}

fn ubstr(s: &str) -> Vec<u8> {
    let mut out = vec![b'S', b'U', s.len() as u8];
    out.extend_from_slice(s.as_bytes());
    out
}

fn ubjson_docs() -> Vec<Vec<u8>> {
    let mut array_of_uints = vec![b'['];
    array_of_uints.extend([b'U', 1, b'U', 2]);
    array_of_uints.push(b']');

    let mut object_with_member = vec![b'{'];
    object_with_member.extend(ubstr("k"));
    object_with_member.extend(ubstr("v"));
    object_with_member.push(b'}');

    let mut nested = vec![b'['];
    nested.extend(array_of_uints.clone());
    nested.extend(object_with_member.clone());
    nested.push(b']');

    vec![array_of_uints, object_with_member, nested, vec![b'[', b']'], vec![b'{', b'}']]
}

fn ubjson_stream() -> impl Strategy<Value = Vec<u8>> {
    let docs = ubjson_docs();
    prop::collection::vec(0..docs.len(), 1..6).prop_map(move |idxs| {
        idxs.into_iter().flat_map(|i| docs[i].clone()).collect()
    })
}

proptest! {
    #[test]
    fn json_splitting_is_chunking_independent(stream in json_stream(), cuts in cuts_strategy(256)) {
        let whole = drive(Format::Json, 0, &[stream.as_slice()]);
        let chunks = chunk_at(&stream, cuts);
        let split = drive(Format::Json, 0, &chunks);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn xml_splitting_is_chunking_independent(stream in xml_stream(), cuts in cuts_strategy(256)) {
        let whole = drive(Format::Xml, 0, &[stream.as_slice()]);
        let chunks = chunk_at(&stream, cuts);
        let split = drive(Format::Xml, 0, &chunks);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn json_byte_at_a_time_matches_single_chunk(stream in json_stream()) {
        let whole = drive(Format::Json, 0, &[stream.as_slice()]);
        let byte_chunks: Vec<&[u8]> = stream.chunks(1).collect();
        let split = drive(Format::Json, 0, &byte_chunks);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn ubjson_splitting_is_chunking_independent(stream in ubjson_stream(), cuts in cuts_strategy(256)) {
        let whole = drive(Format::Ubjson, 0, &[stream.as_slice()]);
        let chunks = chunk_at(&stream, cuts);
        let split = drive(Format::Ubjson, 0, &chunks);
        prop_assert_eq!(whole, split);
    }
}
