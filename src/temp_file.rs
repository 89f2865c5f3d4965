// Temp files for the JSON upload body.
//
// Names look like `<prefix><pid>_<counter>_<random><suffix>`. The counter is
// owned by the factory, so two factories never share state. Creation is
// exclusive (and 0600 on unix), retried a few times on collision; the file is
// removed when the returned handle is dropped or closed.

use std::path::{Path, PathBuf};

use log::warn;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const TOTAL_TRIES: usize = 10;
const RANDOM_CHARS: usize = 12;

pub struct TempFileFactory {
    dir: PathBuf,
    prefix: String,
    suffix: String,
    counter: u64,
}

impl TempFileFactory {
    /// Factory creating files in the system temp directory.
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self::in_dir(std::env::temp_dir(), prefix, suffix)
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P, prefix: &str, suffix: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            counter: 0,
        }
    }

    /// Number of files this factory has attempted to name so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn next_prefix(&mut self) -> String {
        let prefix = format!("{}{}_{}_", self.prefix, std::process::id(), self.counter);
        self.counter += 1;
        prefix
    }

    pub fn create(&mut self) -> Result<NamedTempFile> {
        let mut last_error = None;
        for _ in 0..TOTAL_TRIES {
            let prefix = self.next_prefix();
            match tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&self.suffix)
                .rand_bytes(RANDOM_CHARS)
                .tempfile_in(&self.dir)
            {
                Ok(file) => return Ok(file),
                Err(e) => {
                    warn!("Failed to create temp file: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(Error::TempFile(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}
