// Line reader for Flamingo data files.
//
// A line ends at `\n`, `\r\n` or a bare `\r`, whichever the logger wrote.
// Bytes that are not valid UTF-8 are replaced with U+FFFD so a corrupt
// record only affects its own line; the classifier then decides what to do
// with it. Only failures of the underlying reader are reported as errors.

use std::io::{self, BufRead};

/// Iterator over the lines of a reader. See [`data_lines`].
pub struct DataLines<R> {
    reader: R,
    // The previous line ended with `\r`; a `\n` right after it belongs to
    // the same terminator.
    skip_lf: bool,
}

/// Split `reader` into lines, decoding each one lossily.
///
/// A final line without a terminator is still returned; a trailing
/// terminator does not produce an extra empty line.
pub fn data_lines<R: BufRead>(reader: R) -> DataLines<R> {
    DataLines {
        reader,
        skip_lf: false,
    }
}

impl<R: BufRead> Iterator for DataLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            };

            if available.is_empty() {
                if line.is_empty() {
                    return None;
                }
                return Some(Ok(String::from_utf8_lossy(&line).into_owned()));
            }

            let mut start = 0;
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    start = 1;
                }
            }

            let rest = &available[start..];
            match rest.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(pos) => {
                    line.extend_from_slice(&rest[..pos]);
                    let ended_with_cr = rest[pos] == b'\r';
                    self.reader.consume(start + pos + 1);
                    self.skip_lf = ended_with_cr;
                    return Some(Ok(String::from_utf8_lossy(&line).into_owned()));
                }
                None => {
                    line.extend_from_slice(rest);
                    let used = available.len();
                    self.reader.consume(used);
                }
            }
        }
    }
}
