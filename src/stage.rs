//! A pipeline stage: one transform, one input channel, one worker thread.
//!
//! The worker consumes lines from the stage's input [`Channel`], applies
//! the transform, and forwards the result to the next stage's channel if
//! one has been attached. Observing the terminator makes the worker
//! forward it (so shutdown ripples downstream) and exit. The channel's
//! finished gate is signaled on every worker exit path, including panics,
//! so teardown can always complete.

use std::io;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, warn};

use crate::sync::channel::{Channel, ChannelError};
use crate::transforms::Transform;
use crate::{is_terminator, TERMINATOR};

/// Errors from stage lifecycle operations.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(io::Error),

    #[error("stage is already attached to a successor")]
    AlreadyAttached,

    #[error("worker thread panicked")]
    WorkerPanicked,
}

/// A running stage. Created by [`Stage::spawn`], wired at most once via
/// [`Stage::attach`], torn down by [`Stage::fini`].
#[derive(Debug)]
pub struct Stage {
    name: String,
    input: Arc<Channel>,
    forward: Arc<OnceLock<Arc<Channel>>>,
    worker: Option<JoinHandle<()>>,
}

impl Stage {
    /// Allocate the input channel and start the worker thread.
    pub fn spawn(
        name: impl Into<String>,
        transform: Box<dyn Transform>,
        queue_size: usize,
    ) -> Result<Self, StageError> {
        let name = name.into();
        let input = Arc::new(Channel::with_capacity(queue_size)?);
        let forward: Arc<OnceLock<Arc<Channel>>> = Arc::new(OnceLock::new());

        let worker = Worker {
            name: name.clone(),
            input: Arc::clone(&input),
            forward: Arc::clone(&forward),
            transform,
        };
        let handle = thread::Builder::new()
            .name(format!("stage-{name}"))
            .spawn(move || worker.run())
            .map_err(StageError::Spawn)?;

        Ok(Self {
            name,
            input,
            forward,
            worker: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to this stage's input channel — the place-work endpoint
    /// handed to the upstream stage (or the driver, for the head stage).
    pub fn input(&self) -> Arc<Channel> {
        Arc::clone(&self.input)
    }

    /// Fix this stage's forward to `next` for the rest of its lifetime.
    /// At most one attach is permitted per stage.
    pub fn attach(&self, next: Arc<Channel>) -> Result<(), StageError> {
        self.forward
            .set(next)
            .map_err(|_| StageError::AlreadyAttached)
    }

    /// Enqueue a line for this stage, blocking while its channel is full.
    /// The line is deep-copied; the caller keeps ownership.
    pub fn place_work(&self, line: &[u8]) {
        self.input.put(line);
    }

    /// Block until this stage's worker has observed the terminator and
    /// signaled the finished gate.
    pub fn wait_finished(&self) {
        self.input.wait_finished();
    }

    /// Join the worker thread and release the stage's resources. Callers
    /// are expected to have seen [`Stage::wait_finished`] return first.
    pub fn fini(mut self) -> Result<(), StageError> {
        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| StageError::WorkerPanicked)?;
        }
        Ok(())
    }
}

/// State moved onto the worker thread.
struct Worker {
    name: String,
    input: Arc<Channel>,
    forward: Arc<OnceLock<Arc<Channel>>>,
    transform: Box<dyn Transform>,
}

impl Worker {
    fn run(self) {
        // Signals finished on every exit path, unwinding included; a
        // worker that dies must not leave wait_finished blocked.
        let _finished = FinishedGuard(Arc::clone(&self.input));
        debug!(stage = %self.name, "worker started");

        loop {
            let line = self.input.get();

            if is_terminator(&line) {
                if let Some(next) = self.forward.get() {
                    next.put(TERMINATOR);
                }
                break;
            }

            match self.transform.apply(&line) {
                Ok(output) => {
                    if let Some(next) = self.forward.get() {
                        next.put(&output);
                    }
                }
                Err(err) => {
                    // Transient by contract: drop the line, keep going.
                    warn!(stage = %self.name, %err, "transform failed; line dropped");
                }
            }
        }

        debug!(stage = %self.name, "worker observed terminator, exiting");
    }
}

struct FinishedGuard(Arc<Channel>);

impl Drop for FinishedGuard {
    fn drop(&mut self) {
        self.0.signal_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{Flipper, TransformError, Uppercaser};

    /// Drain `sink` until the terminator arrives, collecting normal lines.
    fn drain(sink: &Channel) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        loop {
            let line = sink.get();
            if is_terminator(&line) {
                return lines;
            }
            lines.push(line);
        }
    }

    #[test]
    fn test_worker_transforms_and_forwards() {
        let stage = Stage::spawn("uppercaser", Box::new(Uppercaser), 4).unwrap();
        let sink = Arc::new(Channel::with_capacity(16).unwrap());
        stage.attach(Arc::clone(&sink)).unwrap();

        stage.place_work(b"hello");
        stage.place_work(b"world");
        stage.place_work(TERMINATOR);

        assert_eq!(drain(&sink), vec![b"HELLO".to_vec(), b"WORLD".to_vec()]);
        stage.wait_finished();
        stage.fini().unwrap();
    }

    #[test]
    fn test_terminator_propagates_downstream() {
        let stage = Stage::spawn("flipper", Box::new(Flipper), 2).unwrap();
        let sink = Arc::new(Channel::with_capacity(4).unwrap());
        stage.attach(Arc::clone(&sink)).unwrap();

        stage.place_work(TERMINATOR);
        assert_eq!(sink.get(), TERMINATOR);
        stage.wait_finished();
        stage.fini().unwrap();
    }

    #[test]
    fn test_finished_only_after_terminator() {
        let stage = Stage::spawn("flipper", Box::new(Flipper), 4).unwrap();
        stage.place_work(b"still running");
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!stage.input.is_finished());

        stage.place_work(TERMINATOR);
        stage.wait_finished();
        assert!(stage.input.is_finished());
        // wait_finished stays satisfied once signaled.
        stage.wait_finished();
        stage.fini().unwrap();
    }

    #[test]
    fn test_terminal_stage_consumes_without_forward() {
        let stage = Stage::spawn("uppercaser", Box::new(Uppercaser), 2).unwrap();
        for _ in 0..10 {
            stage.place_work(b"discarded");
        }
        stage.place_work(TERMINATOR);
        stage.wait_finished();
        stage.fini().unwrap();
    }

    #[test]
    fn test_attach_at_most_once() {
        let stage = Stage::spawn("flipper", Box::new(Flipper), 2).unwrap();
        let first = Arc::new(Channel::with_capacity(2).unwrap());
        let second = Arc::new(Channel::with_capacity(2).unwrap());

        stage.attach(first).unwrap();
        assert!(matches!(
            stage.attach(second),
            Err(StageError::AlreadyAttached)
        ));

        stage.place_work(TERMINATOR);
        stage.wait_finished();
        stage.fini().unwrap();
    }

    #[test]
    fn test_zero_queue_size_fails_init() {
        let err = Stage::spawn("flipper", Box::new(Flipper), 0).unwrap_err();
        assert!(matches!(
            err,
            StageError::Channel(ChannelError::InvalidCapacity(0))
        ));
    }

    /// Fails on a marker line, passes everything else through.
    struct FailOnMarker;

    impl Transform for FailOnMarker {
        fn name(&self) -> &'static str {
            "fail-on-marker"
        }

        fn apply(&self, line: &[u8]) -> Result<Vec<u8>, TransformError> {
            if line == b"poison" {
                return Err(TransformError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "injected",
                )));
            }
            Ok(line.to_vec())
        }
    }

    #[test]
    fn test_transient_transform_failure_drops_line_and_continues() {
        let stage = Stage::spawn("fail-on-marker", Box::new(FailOnMarker), 4).unwrap();
        let sink = Arc::new(Channel::with_capacity(16).unwrap());
        stage.attach(Arc::clone(&sink)).unwrap();

        stage.place_work(b"before");
        stage.place_work(b"poison");
        stage.place_work(b"after");
        stage.place_work(TERMINATOR);

        assert_eq!(drain(&sink), vec![b"before".to_vec(), b"after".to_vec()]);
        stage.wait_finished();
        stage.fini().unwrap();
    }

    /// Panics on the first line it sees.
    struct PanicTransform;

    impl Transform for PanicTransform {
        fn name(&self) -> &'static str {
            "panic"
        }

        fn apply(&self, _line: &[u8]) -> Result<Vec<u8>, TransformError> {
            panic!("worker goes down");
        }
    }

    #[test]
    fn test_panicking_worker_still_signals_finished() {
        let stage = Stage::spawn("panic", Box::new(PanicTransform), 2).unwrap();
        stage.place_work(b"boom");
        // The drop guard must release wait_finished despite the panic.
        stage.wait_finished();
        assert!(matches!(stage.fini(), Err(StageError::WorkerPanicked)));
    }
}
