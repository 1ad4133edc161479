//! Typed, validated configuration. A `Config` is only ever constructed
//! through [`Config::from_cli`] or [`Config::validate`], both of which
//! reject invalid values before any engine is built.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::replacement::ReplacementKind;
use crate::scheduler::SchedulingKind;

/// Command-line surface for the simulator binary.
#[derive(Parser, Debug)]
#[command(name = "tickcore")]
#[command(about = "Deterministic tick-driven CPU scheduling and paged memory simulator")]
pub struct Cli {
    /// Path to the process-definition file.
    pub process_file: PathBuf,

    /// Scheduling discipline: fcfs, sjf, rr, priority.
    #[arg(long, default_value = "fcfs")]
    pub scheduler: String,

    /// Page replacement policy: fifo, lru, optimal.
    #[arg(long, default_value = "fifo")]
    pub page_replacement: String,

    /// Number of physical frames in the pool.
    #[arg(long, default_value_t = 4)]
    pub total_frames: usize,

    /// Round-Robin quantum (ignored by other schedulers).
    #[arg(long, default_value_t = 2)]
    pub quantum: u64,

    /// Wall-clock delay between ticks, in milliseconds (0 = as fast as possible).
    #[arg(long, default_value_t = 0)]
    pub tick_delay_ms: u64,

    /// Keep terminated processes' last frame occupancy visible in snapshots.
    #[arg(long, default_value_t = false)]
    pub preserve_frames_on_termination: bool,

    /// Safety bound on the number of ticks for non-interactive runs.
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// takes precedence over this when set.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validated configuration driving a single simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    pub process_file: PathBuf,
    pub scheduler: SchedulingKind,
    pub replacement: ReplacementKind,
    pub total_frames: usize,
    pub quantum: u64,
    pub tick_delay: Duration,
    pub preserve_frames_on_termination: bool,
    pub max_ticks: Option<u64>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if !cli.process_file.exists() {
            return Err(ConfigError::MissingProcessFile(
                cli.process_file.display().to_string(),
            ));
        }
        let scheduler = SchedulingKind::parse(&cli.scheduler)
            .ok_or_else(|| ConfigError::UnknownScheduler(cli.scheduler.clone()))?;
        let replacement = ReplacementKind::parse(&cli.page_replacement)
            .ok_or_else(|| ConfigError::UnknownReplacement(cli.page_replacement.clone()))?;

        let config = Self {
            process_file: cli.process_file,
            scheduler,
            replacement,
            total_frames: cli.total_frames,
            quantum: cli.quantum,
            tick_delay: Duration::from_millis(cli.tick_delay_ms),
            preserve_frames_on_termination: cli.preserve_frames_on_termination,
            max_ticks: cli.max_ticks,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-validates an already-constructed config; used directly by tests
    /// that build a `Config` without going through the CLI.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_frames == 0 {
            return Err(ConfigError::InvalidFrameCount(self.total_frames));
        }
        if self.quantum == 0 {
            return Err(ConfigError::InvalidQuantum(self.quantum));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            process_file: PathBuf::from("/dev/null"),
            scheduler: SchedulingKind::Fcfs,
            replacement: ReplacementKind::Fifo,
            total_frames: 4,
            quantum: 2,
            tick_delay: Duration::ZERO,
            preserve_frames_on_termination: false,
            max_ticks: None,
        }
    }

    #[test]
    fn zero_frames_is_rejected() {
        let mut c = base();
        c.total_frames = 0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidFrameCount(0))));
    }

    #[test]
    fn zero_quantum_is_rejected() {
        let mut c = base();
        c.quantum = 0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidQuantum(0))));
    }

    #[test]
    fn valid_config_passes() {
        assert!(base().validate().is_ok());
    }
}
