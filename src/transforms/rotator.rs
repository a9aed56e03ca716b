//! Rotates a line one position to the right.

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Moves every byte one position right; the last byte wraps to the front.
/// Lines of length ≤ 1 are returned as-is.
pub struct Rotator;

impl Transform for Rotator {
    fn name(&self) -> &'static str {
        "rotator"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) || line.len() <= 1 {
            return Ok(line.to_vec());
        }

        let mut rotated = Vec::with_capacity(line.len());
        rotated.push(line[line.len() - 1]);
        rotated.extend_from_slice(&line[..line.len() - 1]);
        Ok(rotated)
    }
}
