// Flamingo CSV to ESDR JSON conversion.
//
// Every line is classified on its own: lines with the wrong shape, a raised
// error indicator or a bad checksum are logged and skipped, everything else
// becomes one `OutputRecord`. Skipped lines never abort a pass; only a
// source that yields no line at all (or a failing reader) does.

use std::io::{BufRead, Write};

use log::{debug, warn};

use crate::checksum::compute_checksum;
use crate::document::DocumentWriter;
use crate::error::{Error, Result};
use crate::lines::data_lines;
use crate::record::{OutputRecord, RawRecord, SkipReason};

/// Outcome of classifying a single data line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineVerdict {
    Accepted(OutputRecord),
    Skipped(SkipReason),
}

/// Validate one line and extract its sample.
///
/// The error indicator is compared as a float, so a non-numeric indicator
/// (NaN) is not treated as an error and the line goes on to the checksum
/// check.
pub fn classify_line(line: &str) -> LineVerdict {
    let record = match RawRecord::parse(line) {
        Ok(record) => record,
        Err(reason) => return LineVerdict::Skipped(reason),
    };

    let error_code = record.error_code();
    if error_code > 0.0 {
        return LineVerdict::Skipped(SkipReason::NonZeroErrorCode);
    }

    let output = record.to_output();
    let expected = compute_checksum(
        output.temperature,
        output.conductivity,
        output.voltage,
        error_code,
    );
    if record.checksum() != f64::from(expected) {
        return LineVerdict::Skipped(SkipReason::InvalidChecksum);
    }

    LineVerdict::Accepted(output)
}

fn log_skipped(line: &str, reason: SkipReason) {
    match reason {
        SkipReason::WrongFieldCount => {
            warn!("Skipping invalid line (wrong number of fields): {}", line)
        }
        SkipReason::NonZeroErrorCode => {
            warn!("Ignoring line due to non-zero error code: {}", line)
        }
        SkipReason::InvalidChecksum => {
            warn!("Skipping line due to invalid checksum: {}", line)
        }
    }
}

/// A line dropped during conversion, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: String,
    pub reason: SkipReason,
}

/// Accepted samples and skipped lines of one in-memory pass, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionResult {
    pub records: Vec<OutputRecord>,
    pub skipped: Vec<SkippedLine>,
}

impl ConversionResult {
    pub fn lines_read(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

/// Line counts of a streamed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub lines_read: usize,
    pub accepted: usize,
    pub skipped: usize,
}

impl ConversionSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} lines read, {} records accepted, {} lines skipped",
            self.lines_read, self.accepted, self.skipped
        )
    }
}

/// Convert an in-memory sequence of lines.
///
/// Returns [`Error::EmptyInput`] when `lines` yields nothing.
pub fn convert_lines<I, S>(lines: I) -> Result<ConversionResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    convert_fallible_lines(lines.into_iter().map(Ok::<S, Error>))
}

/// Convert the lines of a reader into a [`ConversionResult`].
///
/// Lines are split and decoded as described in [`data_lines`].
pub fn convert_reader<R: BufRead>(reader: R) -> Result<ConversionResult> {
    convert_fallible_lines(data_lines(reader))
}

fn convert_fallible_lines<I, S, E>(lines: I) -> Result<ConversionResult>
where
    I: Iterator<Item = std::result::Result<S, E>>,
    S: AsRef<str>,
    Error: From<E>,
{
    let mut result = ConversionResult::default();
    for line in lines {
        let line = line?;
        let line = line.as_ref();
        match classify_line(line) {
            LineVerdict::Accepted(record) => result.records.push(record),
            LineVerdict::Skipped(reason) => {
                log_skipped(line, reason);
                result.skipped.push(SkippedLine {
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    if result.lines_read() == 0 {
        return Err(Error::EmptyInput);
    }
    Ok(result)
}

/// Stream the lines of `reader` into an upload document written to `sink`.
///
/// Records are written as soon as they are accepted, in input order. The
/// sink is returned once the document is closed. An empty reader is an
/// error and leaves the sink with an incomplete document.
pub fn stream_document<R, W>(reader: R, sink: W) -> Result<(W, ConversionSummary)>
where
    R: BufRead,
    W: Write,
{
    let mut writer = DocumentWriter::new(sink)?;
    let mut summary = ConversionSummary::default();

    for line in data_lines(reader) {
        let line = line?;
        summary.lines_read += 1;
        match classify_line(&line) {
            LineVerdict::Accepted(record) => {
                writer.push(&record)?;
                summary.accepted += 1;
            }
            LineVerdict::Skipped(reason) => {
                log_skipped(&line, reason);
                summary.skipped += 1;
            }
        }
    }

    if summary.lines_read == 0 {
        return Err(Error::EmptyInput);
    }

    debug!("conversion finished: {}", summary.summary());
    let sink = writer.finish()?;
    Ok((sink, summary))
}

/// Read the first line of `reader`, failing if there is none.
pub fn first_line<R: BufRead>(reader: R) -> Result<String> {
    data_lines(reader).next().ok_or(Error::EmptyInput)?.map_err(Error::from)
}
