//! Deterministic tick-driven simulator coupling CPU scheduling with paged
//! virtual memory management.
//!
//! The [`engine`] module owns the per-tick coordination loop; [`scheduler`]
//! and [`replacement`] provide the pluggable policies it dispatches
//! through; [`memory`] owns the frame table and access history; [`process`]
//! is the job state machine the engine advances; [`loader`] and [`config`]
//! turn untrusted input into validated values; [`report`] assembles the
//! run's output once it completes.

#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod memory;
pub mod process;
pub mod replacement;
pub mod report;
pub mod scheduler;

pub mod prelude {
    pub use crate::config::{Cli, Config};
    pub use crate::engine::{SimulationEngine, TickSummary};
    pub use crate::error::{ConfigError, LoadError, RuntimeError, SimError, SimResult};
    pub use crate::memory::MemoryManager;
    pub use crate::process::{Burst, Process, ProcessState};
    pub use crate::replacement::{ReplacementKind, ReplacementPolicy};
    pub use crate::report::Report;
    pub use crate::scheduler::{SchedulingKind, SchedulingPolicy};
}

use error::SimError;
use prelude::*;

/// Initializes the structured logging facade. `verbosity` sets the default
/// filter level when `RUST_LOG` is not set (0 = warn, 1 = info, 2 = debug,
/// 3+ = trace); `RUST_LOG` always takes precedence when present. Safe to
/// call more than once; only the first call takes effect.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Builds and runs a simulator end-to-end from a validated [`Config`],
/// returning the final [`Report`]. This is the library-level entry point
/// the binary and integration tests both use.
pub fn run_simulation(config: &Config) -> Result<Report, SimError> {
    let processes = loader::load_process_file(&config.process_file)?;

    let engine = SimulationEngine::new(
        processes,
        SchedulingPolicy::new(config.scheduler, config.quantum),
        config.total_frames,
        ReplacementPolicy::new(config.replacement),
        config.preserve_frames_on_termination,
        config.tick_delay,
        config.max_ticks,
    );

    engine.run(|_summary| {});

    Ok(Report::build(
        &engine.processes(),
        engine.total_cpu_time(),
        engine.total_idle_time(),
        engine.context_switches(),
        engine.page_faults(),
        engine.replacements(),
        engine.free_frames(),
    ))
}
