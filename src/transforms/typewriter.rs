//! Types a line out byte by byte with a pause between bytes.

use std::io::Write;
use std::time::Duration;

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Default pause between bytes.
pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(100);

/// Writes `[typewriter] ` then each byte of the line individually,
/// flushing and sleeping after every byte, then a newline. Empty input
/// emits nothing. Forwards a copy of the line.
///
/// The stdout lock is reacquired per byte so the pauses never hold the
/// stream against other stages.
pub struct Typewriter {
    char_delay: Duration,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_CHAR_DELAY)
    }

    pub fn with_delay(char_delay: Duration) -> Self {
        Self { char_delay }
    }
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Typewriter {
    fn name(&self) -> &'static str {
        "typewriter"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) || line.is_empty() {
            return Ok(line.to_vec());
        }

        {
            let mut out = std::io::stdout().lock();
            out.write_all(b"[typewriter] ")?;
            out.flush()?;
        }

        for &byte in line {
            {
                let mut out = std::io::stdout().lock();
                out.write_all(&[byte])?;
                out.flush()?;
            }
            std::thread::sleep(self.char_delay);
        }

        let mut out = std::io::stdout().lock();
        out.write_all(b"\n")?;
        out.flush()?;

        Ok(line.to_vec())
    }
}
