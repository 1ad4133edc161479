//! End-to-end scenarios exercising the full loader -> engine -> report
//! pipeline against a real process-definition file on disk.

use std::io::Write;
use std::time::Duration;

use tickcore::prelude::*;

fn run(contents: &str, scheduler: SchedulingKind, quantum: u64, frames: usize, replacement: ReplacementKind) -> Report {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{}", contents).unwrap();

    let config = Config {
        process_file: f.path().to_path_buf(),
        scheduler,
        replacement,
        total_frames: frames,
        quantum,
        tick_delay: Duration::ZERO,
        preserve_frames_on_termination: false,
        max_ticks: Some(10_000),
    };

    tickcore::run_simulation(&config).unwrap()
}

#[test]
fn fcfs_single_process_no_memory_pressure() {
    let report = run(
        "P1 0 CPU(3) 1 1\n",
        SchedulingKind::Fcfs,
        1,
        2,
        ReplacementKind::Fifo,
    );
    assert_eq!(report.page_faults, 1);
    assert_eq!(report.replacements, 0);
    assert_eq!(report.avg_waiting, 0.0);
    assert_eq!(report.avg_turnaround, 3.0);
}

#[test]
fn round_robin_quantum_two_two_processes() {
    let report = run(
        "P1 0 CPU(5) 1 1\nP2 0 CPU(3) 1 1\n",
        SchedulingKind::RoundRobin,
        2,
        2,
        ReplacementKind::Fifo,
    );
    assert_eq!(report.context_switches, 5);
}

#[test]
fn lru_with_forced_eviction() {
    let report = run(
        "P1 0 CPU(6) 1 3\n",
        SchedulingKind::Fcfs,
        1,
        2,
        ReplacementKind::Lru,
    );
    assert_eq!(report.page_faults, 6);
    assert_eq!(report.replacements, 4);
}

#[test]
fn fifo_eviction_determinism() {
    let report = run(
        "P1 0 CPU(6) 1 3\n",
        SchedulingKind::Fcfs,
        1,
        2,
        ReplacementKind::Fifo,
    );
    assert_eq!(report.page_faults, 6);
    assert_eq!(report.replacements, 4);
}

#[test]
fn io_completion_deferred_to_next_tick() {
    let report = run(
        "P1 0 CPU(1),IO(1),CPU(1) 1 1\n",
        SchedulingKind::Fcfs,
        1,
        1,
        ReplacementKind::Fifo,
    );
    assert_eq!(report.processes[0].turnaround, Some(2));
}

#[test]
fn memory_blocked_process_is_reclaimed() {
    let report = run(
        "P1 0 CPU(1) 1 1\nP2 0 CPU(1) 1 1\n",
        SchedulingKind::Fcfs,
        1,
        1,
        ReplacementKind::Fifo,
    );
    assert_eq!(report.page_faults, 2);
    assert_eq!(report.replacements, 0);
    assert!(report.processes.iter().all(|p| p.turnaround.is_some()));
}

#[test]
fn malformed_and_numeric_error_lines_are_handled_distinctly() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "garbage\nP1 0 CPU(1) 1 0\n").unwrap();
    let processes = tickcore::loader::load_process_file(f.path()).unwrap();
    assert_eq!(processes.len(), 1);

    let mut f2 = tempfile::NamedTempFile::new().unwrap();
    write!(f2, "P1 notanumber CPU(1) 1 0\n").unwrap();
    assert!(tickcore::loader::load_process_file(f2.path()).is_err());
}

#[test]
fn invalid_config_rejects_before_engine_construction() {
    let mut c = Config {
        process_file: std::path::PathBuf::from("/dev/null"),
        scheduler: SchedulingKind::Fcfs,
        replacement: ReplacementKind::Fifo,
        total_frames: 0,
        quantum: 1,
        tick_delay: Duration::ZERO,
        preserve_frames_on_termination: false,
        max_ticks: None,
    };
    assert!(c.validate().is_err());
    c.total_frames = 4;
    c.quantum = 0;
    assert!(c.validate().is_err());
}
