//! Spreads a line out with spaces between bytes.

use crate::transforms::{Transform, TransformError};
use crate::is_terminator;

/// Inserts a single space between adjacent bytes; a line of length `n`
/// becomes length `2n - 1`. Empty input stays empty.
pub struct Expander;

impl Transform for Expander {
    fn name(&self) -> &'static str {
        "expander"
    }

    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
        if is_terminator(line) || line.is_empty() {
            return Ok(line.to_vec());
        }

        let mut expanded = Vec::with_capacity(line.len() * 2 - 1);
        for (i, &byte) in line.iter().enumerate() {
            if i > 0 {
                expanded.push(b' ');
            }
            expanded.push(byte);
        }
        Ok(expanded)
    }
}
