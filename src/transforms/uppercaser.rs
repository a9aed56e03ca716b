//! Converts ASCII letters to uppercase.

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Uppercases each ASCII letter; every other byte is untouched.
pub struct Uppercaser;

impl Transform for Uppercaser {
    fn name(&self) -> &'static str {
        "uppercaser"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) {
            return Ok(line.to_vec());
        }
        Ok(line.iter().map(u8::to_ascii_uppercase).collect())
    }
}
