//! Stage name resolution — the loader boundary.
//!
//! Every stage the pipeline can run is registered here as a name, a
//! one-line summary (used by the usage text), and a transform factory.
//! A stage argument containing `/` is treated as an explicit module path
//! and resolved by its file stem, so `./output/logger.so` finds the
//! `logger` stage.

use std::path::Path;

use crate::config::AnalyzerConfig;
use crate::transforms::{Expander, Flipper, Logger, Rotator, Transform, Typewriter, Uppercaser};

/// Env var selecting the loader mode: absent or any value other than
/// `"0"` keeps namespace isolation on; `"0"` selects the classic shared
/// loader. Overrides the configuration file.
pub const NAMESPACE_ISOLATION_ENV: &str = "ANALYZER_NAMESPACE_ISOLATION";

/// How stage instances are isolated from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderMode {
    /// Each requested stage gets its own instance; duplicates allowed.
    Isolated,
    /// One shared context per stage name; duplicates rejected at load.
    Shared,
}

impl LoaderMode {
    /// Resolve the mode from the environment, falling back to the config.
    pub fn detect(config: &AnalyzerConfig) -> Self {
        match std::env::var(NAMESPACE_ISOLATION_ENV) {
            Ok(value) if value == "0" => LoaderMode::Shared,
            Ok(_) => LoaderMode::Isolated,
            Err(_) if config.loader.namespace_isolation => LoaderMode::Isolated,
            Err(_) => LoaderMode::Shared,
        }
    }
}

type TransformFactory = fn(&AnalyzerConfig) -> Box<dyn Transform>;

/// One registered stage: name, summary for help output, and factory.
pub struct StageDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
    factory: TransformFactory,
}

impl StageDescriptor {
    /// Build a fresh transform instance for one stage.
    pub fn build(&self, config: &AnalyzerConfig) -> Box<dyn Transform> {
        (self.factory)(config)
    }
}

/// Registry of the stages the analyzer can load.
pub struct StageRegistry {
    entries: Vec<StageDescriptor>,
}

impl StageRegistry {
    /// Registry holding the six built-in stages.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                StageDescriptor {
                    name: "logger",
                    summary: "Logs all lines that pass through",
                    factory: |_| Box::new(Logger),
                },
                StageDescriptor {
                    name: "typewriter",
                    summary: "Simulates a typewriter effect with per-character delays",
                    factory: |config| Box::new(Typewriter::with_delay(config.typewriter_delay())),
                },
                StageDescriptor {
                    name: "uppercaser",
                    summary: "Converts ASCII letters to uppercase",
                    factory: |_| Box::new(Uppercaser),
                },
                StageDescriptor {
                    name: "rotator",
                    summary: "Moves every character one position right; the last wraps to the front",
                    factory: |_| Box::new(Rotator),
                },
                StageDescriptor {
                    name: "flipper",
                    summary: "Reverses the order of characters",
                    factory: |_| Box::new(Flipper),
                },
                StageDescriptor {
                    name: "expander",
                    summary: "Inserts a single space between characters",
                    factory: |_| Box::new(Expander),
                },
            ],
        }
    }

    /// Resolve a stage argument to its descriptor. Bare names are looked
    /// up directly; `/`-containing paths resolve by file stem.
    pub fn resolve(&self, spec: &str) -> Option<&StageDescriptor> {
        let name = if spec.contains('/') {
            Path::new(spec).file_stem()?.to_str()?
        } else {
            spec
        };
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// All registered stages, in listing order.
    pub fn descriptors(&self) -> &[StageDescriptor] {
        &self.entries
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
