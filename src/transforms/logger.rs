//! Logs every line that passes through to standard output.

use std::io::Write;

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Writes `[logger] <line>` to stdout and forwards a copy of the line.
/// The whole emission happens under one stdout lock and is flushed
/// immediately.
pub struct Logger;

impl Transform for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) {
            return Ok(line.to_vec());
        }

        let mut out = std::io::stdout().lock();
        out.write_all(b"[logger] ")?;
        out.write_all(line)?;
        out.write_all(b"\n")?;
        out.flush()?;

        Ok(line.to_vec())
    }
}
