//! Thin CLI wrapper around the library: read a file (or stdin) and write
//! each split-out document to stdout, separated by `--separator`.
//!
//! Exercises the same configuration surface as the informative
//! `splitfile(...)` wrapper spec.md §6 describes, but contributes no novel
//! engineering of its own — it is a binding, the same as the `wasm` feature.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;

use splitstream::{DocumentReader, Format, SplitError, SplitterConfig};

/// Split a stream of concatenated XML, JSON, or UBJSON documents.
#[derive(Parser, Debug)]
#[command(name = "splitstream", version, about)]
struct Args {
    /// Document format to split on.
    #[arg(long, value_parser = ["xml", "json", "ubjson"])]
    format: String,

    /// Input file; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Nesting depth at which top-level documents are delimited.
    #[arg(long, default_value_t = 0)]
    start_depth: i32,

    /// Bytes read from the source per driver iteration.
    #[arg(long, default_value_t = splitstream::config::DEFAULT_BUFSIZE)]
    bufsize: usize,

    /// Documents larger than this are dropped rather than ever printed.
    #[arg(long, default_value_t = splitstream::config::DEFAULT_MAX_DOC_SIZE)]
    max_doc_size: usize,

    /// Bytes written between emitted documents.
    #[arg(long, default_value = "\n")]
    separator: String,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let format = Format::parse(&args.format).expect("clap value_parser already restricted this");

    let config = SplitterConfig::new(format)
        .with_start_depth(args.start_depth)
        .with_bufsize(args.bufsize)
        .with_max_doc_size(args.max_doc_size);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let result = match &args.input {
        Some(path) => run(File::open(path)?, &config, args.separator.as_bytes(), &mut out),
        None => run(io::stdin(), &config, args.separator.as_bytes(), &mut out),
    };
    out.flush()?;
    Ok(result?)
}

fn run<R: Read>(
    source: R,
    config: &SplitterConfig,
    separator: &[u8],
    out: &mut impl Write,
) -> Result<(), SplitError> {
    let mut reader = DocumentReader::new(source, config)?;
    while let Some(doc) = reader.next_document()? {
        out.write_all(doc.as_bytes())?;
        out.write_all(separator)?;
    }
    Ok(())
}
