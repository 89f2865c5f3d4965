// JSON upload body for an ESDR feed.
//
// ESDR accepts feed data as
// `{"channel_names":["temperature","conductivity","voltage"],"data":[[t,temp,cond,volt],...]}`.
// `DocumentWriter` streams that document record by record so large data
// files never sit in memory.

use std::io::Write;

use crate::error::Result;
use crate::record::OutputRecord;

/// Channel order of every data row. Must match [`OutputRecord::values`].
pub const CHANNEL_NAMES: [&str; 3] = ["temperature", "conductivity", "voltage"];

/// Append-only writer producing the upload document on any sink.
///
/// The envelope opening is written on construction, each [`push`](Self::push)
/// appends one data row, and [`finish`](Self::finish) closes the array and
/// object and returns the sink. An empty pass produces `"data":[]`.
pub struct DocumentWriter<W: Write> {
    sink: W,
    records_written: usize,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(mut sink: W) -> Result<Self> {
        sink.write_all(b"{\"channel_names\":")?;
        serde_json::to_writer(&mut sink, &CHANNEL_NAMES)?;
        sink.write_all(b",\"data\":[")?;
        Ok(Self {
            sink,
            records_written: 0,
        })
    }

    pub fn push(&mut self, record: &OutputRecord) -> Result<()> {
        if self.records_written > 0 {
            self.sink.write_all(b",")?;
        }
        self.sink.write_all(b"\n")?;
        serde_json::to_writer(&mut self.sink, record)?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn finish(mut self) -> Result<W> {
        if self.records_written > 0 {
            self.sink.write_all(b"\n")?;
        }
        self.sink.write_all(b"]}\n")?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}
