// Library root
// -----------
// This crate exposes the library surface used by the uploader binary.
// `main.rs` loads the configuration, builds an ESDR client and hands both
// to the interactive session in `ui`.
//
// Module responsibilities:
// - `record`, `numeric`, `checksum`: the Flamingo CSV record layout, its
//   lenient number parsing and the per-record checksum byte.
// - `lines`: splits data files into lines, tolerating any line ending
//   and invalid UTF-8.
// - `convert`: validates lines and turns the accepted ones into samples,
//   either in memory or streamed into an upload document.
// - `document`: the ESDR feed upload JSON envelope.
// - `temp_file`: temp files holding the upload body.
// - `config`, `error`: settings and the library error type.
// - `api`: HTTP interactions with ESDR (login, devices, feeds, upload).
// - `feed`: feed metadata and validation of the user's answers.
// - `ui`: the terminal prompt flow.
pub mod api;
pub mod checksum;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod feed;
pub mod lines;
pub mod numeric;
pub mod record;
pub mod temp_file;
pub mod ui;

pub use convert::{classify_line, convert_lines, convert_reader, stream_document, LineVerdict};
pub use error::{Error, Result};
pub use record::{OutputRecord, SkipReason};
