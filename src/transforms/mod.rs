//! The built-in line transforms.
//!
//! Each transform maps one line to a new owned line. Transforms are
//! byte-oriented (lines need not be valid UTF-8) and terminator-safe:
//! the literal `<END>` passes through every transform unchanged and
//! without side effects. Failures are transient by contract — the stage
//! worker logs them and keeps consuming.

mod expander;
mod flipper;
mod logger;
mod rotator;
mod typewriter;
mod uppercaser;

pub use expander::Expander;
pub use flipper::Flipper;
pub use logger::Logger;
pub use rotator::Rotator;
pub use typewriter::Typewriter;
pub use uppercaser::Uppercaser;

use thiserror::Error;

/// Transient failure inside a transform. The worker logs it and moves on.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("output write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A pure line transform bound to exactly one stage worker.
pub trait Transform: Send {
    /// The display name of this transform.
    fn name(&self) -> &'static str;

    /// Map `line` to a new owned line. Implementations must return the
    /// terminator unchanged and accept empty lines.
    fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TERMINATOR;
    use std::time::Duration;

    fn apply(t: &dyn Transform, line: &[u8]) -> Vec<u8> {
        t.apply(line).unwrap()
    }

    // ========================================================================
    // TERMINATOR SAFETY
    // ========================================================================

    #[test]
    fn test_all_transforms_pass_terminator_unchanged() {
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(Logger),
            Box::new(Uppercaser),
            Box::new(Rotator),
            Box::new(Flipper),
            Box::new(Expander),
            Box::new(Typewriter::with_delay(Duration::ZERO)),
        ];
        for t in &transforms {
            assert_eq!(apply(t.as_ref(), TERMINATOR), TERMINATOR, "{}", t.name());
        }
    }

    #[test]
    fn test_all_transforms_accept_empty_and_whitespace() {
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(Logger),
            Box::new(Uppercaser),
            Box::new(Rotator),
            Box::new(Flipper),
            Box::new(Expander),
            Box::new(Typewriter::with_delay(Duration::ZERO)),
        ];
        for t in &transforms {
            t.apply(b"").unwrap();
            t.apply(b"   ").unwrap();
        }
    }

    // ========================================================================
    // ROUND-TRIP / IDEMPOTENCE LAWS
    // ========================================================================

    #[test]
    fn test_flipper_is_an_involution() {
        let flipper = Flipper;
        for line in [&b"hello"[..], b"a", b"", b"ab cd ef", b"12345"] {
            assert_eq!(apply(&flipper, &apply(&flipper, line)), line);
        }
    }

    #[test]
    fn test_rotator_cycles_back_after_length_applications() {
        let rotator = Rotator;
        let line = b"stress".to_vec();
        let mut rotated = line.clone();
        for _ in 0..line.len() {
            rotated = apply(&rotator, &rotated);
        }
        assert_eq!(rotated, line);
    }

    #[test]
    fn test_uppercaser_is_idempotent() {
        let uppercaser = Uppercaser;
        let once = apply(&uppercaser, b"Hello, World! 123");
        let twice = apply(&uppercaser, &once);
        assert_eq!(once, twice);
    }

    // ========================================================================
    // NON-UTF8 INPUT
    // ========================================================================

    #[test]
    fn test_transforms_are_byte_oriented() {
        let raw = [0xffu8, 0x00, b'a', 0xc3];
        assert_eq!(apply(&Flipper, &raw), [0xc3, b'a', 0x00, 0xff]);
        assert_eq!(apply(&Rotator, &raw), [0xc3, 0xff, 0x00, b'a']);
        assert_eq!(apply(&Uppercaser, &raw), [0xff, 0x00, b'A', 0xc3]);
        assert_eq!(
            apply(&Expander, &raw),
            [0xff, b' ', 0x00, b' ', b'a', b' ', 0xc3]
        );
    }
}
