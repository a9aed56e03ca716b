//! Pipeline construction, feeding, and teardown.
//!
//! Construction is phased: resolve every stage name, start each stage's
//! worker in order, then wire `stage[i] → stage[i+1]`. A failure while
//! starting stages unwinds the already-running ones in reverse. After the
//! input has been fed (the terminator rippling downstream behind it),
//! shutdown awaits each stage's finished gate in stream order and joins
//! workers in reverse construction order.

use std::io::{self, BufRead};

use tracing::{debug, error, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::PipelineError;
use crate::registry::{LoaderMode, StageDescriptor, StageRegistry};
use crate::stage::Stage;
use crate::{is_terminator, TERMINATOR};

/// An ordered chain of running stages.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Resolve, start, and wire the requested stages.
    pub fn build(
        queue_size: usize,
        specs: &[String],
        registry: &StageRegistry,
        mode: LoaderMode,
        config: &AnalyzerConfig,
    ) -> Result<Self, PipelineError> {
        if specs.is_empty() {
            return Err(PipelineError::Usage("No stages specified".to_string()));
        }

        // Load: resolve every name before any stage starts, so an unknown
        // stage aborts with nothing to unwind.
        let mut resolved: Vec<&StageDescriptor> = Vec::with_capacity(specs.len());
        for spec in specs {
            let descriptor = registry
                .resolve(spec)
                .ok_or_else(|| PipelineError::UnknownStage { name: spec.clone() })?;
            if mode == LoaderMode::Shared
                && resolved.iter().any(|seen| seen.name == descriptor.name)
            {
                return Err(PipelineError::DuplicateStage {
                    name: descriptor.name.to_string(),
                });
            }
            resolved.push(descriptor);
        }

        // Initialize in order; the first failure rolls back in reverse.
        let mut stages: Vec<Stage> = Vec::with_capacity(resolved.len());
        for descriptor in &resolved {
            match Stage::spawn(descriptor.name, descriptor.build(config), queue_size) {
                Ok(stage) => stages.push(stage),
                Err(source) => {
                    let name = descriptor.name.to_string();
                    error!(stage = %name, %source, "stage initialization failed, rolling back");
                    Self::rollback(stages);
                    return Err(PipelineError::StageInit { name, source });
                }
            }
        }

        // Wire each stage to its successor. The stages are not yet fed,
        // so every forward is in place before the first line flows.
        for i in 0..stages.len().saturating_sub(1) {
            let next_input = stages[i + 1].input();
            if stages[i].attach(next_input).is_err() {
                return Err(PipelineError::Wire {
                    name: stages[i].name().to_string(),
                });
            }
        }

        info!(stages = stages.len(), queue_size, "pipeline constructed");
        Ok(Self { stages })
    }

    /// Unwind partially constructed stages in reverse order. None of them
    /// is wired yet, so injecting the terminator makes each worker exit
    /// without forwarding anything.
    fn rollback(stages: Vec<Stage>) {
        for stage in stages.into_iter().rev() {
            let name = stage.name().to_string();
            stage.place_work(TERMINATOR);
            stage.wait_finished();
            if let Err(err) = stage.fini() {
                warn!(stage = %name, %err, "stage teardown failed during rollback");
            }
        }
    }

    /// Number of stages in the chain.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Read lines from `reader` and place them into the head stage,
    /// stopping after the terminator. EOF and read errors both inject the
    /// terminator so shutdown stays reachable; read errors are reported
    /// after the injection.
    pub fn feed<R: BufRead>(
        &self,
        reader: R,
        max_line_bytes: usize,
    ) -> Result<(), PipelineError> {
        let head = &self.stages[0];
        match feed_reader(reader, max_line_bytes, &mut |line| head.place_work(line)) {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!("input ended without terminator, injecting it");
                head.place_work(TERMINATOR);
                Ok(())
            }
            Err(err) => {
                head.place_work(TERMINATOR);
                Err(PipelineError::Feed(err))
            }
        }
    }

    /// Await every stage's finished gate in stream order, then join the
    /// workers in reverse construction order. Later stages are still
    /// drained when an earlier one fails; the first error is returned.
    pub fn shutdown(self) -> Result<(), PipelineError> {
        for stage in &self.stages {
            stage.wait_finished();
            debug!(stage = %stage.name(), "stage finished");
        }

        let mut first_error = None;
        for stage in self.stages.into_iter().rev() {
            let name = stage.name().to_string();
            if let Err(source) = stage.fini() {
                error!(stage = %name, %source, "stage finalization failed");
                if first_error.is_none() {
                    first_error = Some(PipelineError::Shutdown { name, source });
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("pipeline shutdown complete");
                Ok(())
            }
        }
    }
}

/// Deliver each input line to `deliver`, stripping the trailing newline
/// and splitting reads longer than `max_line_bytes` at that boundary.
/// Returns `Ok(true)` when a terminator line was delivered (reading
/// stops), `Ok(false)` on EOF without one.
fn feed_reader<R: BufRead>(
    mut reader: R,
    max_line_bytes: usize,
    deliver: &mut dyn FnMut(&[u8]),
) -> io::Result<bool> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(false);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }

        let mut rest: &[u8] = &buf;
        loop {
            let (chunk, tail) = if rest.len() > max_line_bytes {
                rest.split_at(max_line_bytes)
            } else {
                (rest, &[][..])
            };
            if is_terminator(chunk) {
                deliver(chunk);
                return Ok(true);
            }
            deliver(chunk);
            if tail.is_empty() {
                break;
            }
            rest = tail;
        }
    }
}
