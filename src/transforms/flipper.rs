//! Reverses the bytes of a line.

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Returns the byte-reversed line.
pub struct Flipper;

impl Transform for Flipper {
    fn name(&self) -> &'static str {
        "flipper"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) {
            return Ok(line.to_vec());
        }
        Ok(line.iter().rev().copied().collect())
    }
}
