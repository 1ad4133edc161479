//! The simulation engine: owns the clock and queues, and advances every
//! process through exactly the nine phases per tick.
//!
//! Concurrency model: the engine's queues/clock and the memory manager are
//! two separate mutual-exclusion domains (`inner` and `memory`), each held
//! only for the duration of a single operation. The driving thread calls
//! [`SimulationEngine::tick`] in a loop; external observers use the
//! snapshot getters, which take a lock briefly and release it before
//! returning. The per-tick update callback is invoked after both locks have
//! been released.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::describe_panic;
use crate::memory::MemoryManager;
use crate::process::{Burst, Process, ProcessState};
use crate::replacement::ReplacementPolicy;
use crate::scheduler::{SchedulingKind, SchedulingPolicy};

/// Summary emitted once per tick, used for logging and the update callback.
#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub ready_depth: usize,
    pub io_depth: usize,
    pub memory_blocked_depth: usize,
    pub running_pid: Option<String>,
    pub all_terminated: bool,
}

struct EngineInner {
    processes: FxHashMap<String, Process>,
    order: Vec<String>,
    ready: VecDeque<String>,
    ready_next_tick: VecDeque<String>,
    io_queue: Vec<String>,
    memory_blocked: VecDeque<String>,
    running: Option<String>,
    quantum_remaining: u64,
    clock: u64,
    scheduler: SchedulingPolicy,
    total_cpu_time: u64,
    total_idle_time: u64,
    context_switches: u64,
}

/// The coordination engine. Construct with [`SimulationEngine::new`], then
/// drive it with repeated [`tick`](Self::tick) calls (or [`run`](Self::run)
/// for the common case of running to completion).
pub struct SimulationEngine {
    inner: Mutex<EngineInner>,
    memory: Mutex<MemoryManager>,
    stop_flag: AtomicBool,
    tick_delay: Duration,
    max_ticks: Option<u64>,
}

impl SimulationEngine {
    pub fn new(
        processes: Vec<Process>,
        scheduler: SchedulingPolicy,
        total_frames: usize,
        replacement: ReplacementPolicy,
        preserve_frames_on_termination: bool,
        tick_delay: Duration,
        max_ticks: Option<u64>,
    ) -> Self {
        let order: Vec<String> = processes.iter().map(|p| p.pid.clone()).collect();
        let quantum = scheduler.quantum();
        let map: FxHashMap<String, Process> =
            processes.into_iter().map(|p| (p.pid.clone(), p)).collect();

        let inner = EngineInner {
            processes: map,
            order,
            ready: VecDeque::new(),
            ready_next_tick: VecDeque::new(),
            io_queue: Vec::new(),
            memory_blocked: VecDeque::new(),
            running: None,
            quantum_remaining: quantum,
            clock: 0,
            scheduler,
            total_cpu_time: 0,
            total_idle_time: 0,
            context_switches: 0,
        };

        Self {
            inner: Mutex::new(inner),
            memory: Mutex::new(MemoryManager::new(
                total_frames,
                replacement,
                preserve_frames_on_termination,
            )),
            stop_flag: AtomicBool::new(false),
            tick_delay,
            max_ticks,
        }
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Runs ticks until every process has terminated, `stop()` is called,
    /// or (if set) `max_ticks` is reached. The last case is a graceful
    /// stop, not an error: the caller inspects `TickSummary::all_terminated`
    /// to tell the two apart.
    pub fn run<F>(&self, mut on_tick: F) -> TickSummary
    where
        F: FnMut(&TickSummary),
    {
        loop {
            let summary = self.tick();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| on_tick(&summary)));
            if let Err(payload) = outcome {
                warn!(panic = %describe_panic(&*payload), "on_tick callback panicked; suppressing");
            }
            if summary.all_terminated || self.stop_flag.load(Ordering::SeqCst) {
                return summary;
            }
            if let Some(max) = self.max_ticks {
                if summary.tick + 1 >= max {
                    warn!(max_ticks = max, "stopping: max_ticks reached");
                    return summary;
                }
            }
            if !self.tick_delay.is_zero() {
                std::thread::sleep(self.tick_delay);
            }
        }
    }

    /// Advances exactly one tick through the nine phases of §4.4.
    pub fn tick(&self) -> TickSummary {
        let mut inner = self.inner.lock();
        let t = inner.clock;

        // Phase 1: publish clock.
        self.memory.lock().set_current_time(t);

        // Phase 2: arrivals.
        let arrivals: Vec<String> = inner
            .order
            .iter()
            .filter(|pid| {
                inner
                    .processes
                    .get(*pid)
                    .map(|p| p.arrival_time == t && p.state == ProcessState::New)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        for pid in arrivals {
            let loaded = self.memory.lock().try_load_initial_page(&pid);
            let p = inner.processes.get_mut(&pid).expect("arrival pid must exist");
            if loaded {
                p.state = ProcessState::Ready;
                inner.ready.push_back(pid);
            } else {
                p.state = ProcessState::BlockedMemory;
                inner.memory_blocked.push_back(pid);
            }
        }

        // Phase 3: I/O advance.
        let io_snapshot: Vec<String> = inner.io_queue.clone();
        inner.io_queue.clear();
        for pid in io_snapshot {
            let p = inner.processes.get_mut(&pid).expect("io pid must exist");
            p.decrement_current_burst_time(1, false);
            if p.burst_time_remaining == 0 {
                p.end_io_interval(t + 1);
                if p.move_to_next_burst() {
                    p.state = ProcessState::Ready;
                    inner.ready_next_tick.push_back(pid);
                } else {
                    p.state = ProcessState::Terminated;
                    p.end_time = Some(t);
                    self.memory.lock().unload_process(&pid);
                }
            } else {
                inner.io_queue.push(pid);
            }
        }

        // Phase 4: memory reclaim.
        let blocked_snapshot: Vec<String> = inner.memory_blocked.drain(..).collect();
        for pid in blocked_snapshot {
            let loaded = self.memory.lock().try_load_initial_page(&pid);
            if loaded {
                inner.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
                inner.ready.push_back(pid);
            } else {
                inner.memory_blocked.push_back(pid);
            }
        }

        // Phase 5: dispatch if idle.
        if inner.running.is_none() {
            let ready_pids: Vec<String> = inner.ready.iter().cloned().collect();
            let ready_refs: Vec<&Process> = ready_pids
                .iter()
                .map(|pid| inner.processes.get(pid).unwrap())
                .collect();
            if let Some(idx) = inner.scheduler.select_next(&ready_refs) {
                let pid = ready_pids[idx].clone();
                inner.ready.remove(idx);
                let loaded = self.memory.lock().try_load_initial_page(&pid);
                let p = inner.processes.get_mut(&pid).unwrap();
                if loaded {
                    if p.start_time.is_none() {
                        p.start_time = Some(t);
                    }
                    p.state = ProcessState::Running;
                    p.start_cpu_interval(t);
                    inner.context_switches += 1;
                    p.context_switches += 1;
                    let quantum = inner.scheduler.quantum();
                    inner.quantum_remaining = if inner.scheduler.kind() == SchedulingKind::RoundRobin {
                        quantum.max(1)
                    } else {
                        p.burst_time_remaining
                    };
                    inner.running = Some(pid);
                } else {
                    p.state = ProcessState::BlockedMemory;
                    inner.memory_blocked.push_back(pid);
                }
            }
        }

        // Phase 6: execute CPU tick.
        if let Some(pid) = inner.running.clone() {
            let page_count = inner.processes.get(&pid).unwrap().page_count;
            if page_count > 0 {
                let cpu_used = inner.processes.get(&pid).unwrap().cpu_time_used;
                let page = (cpu_used as usize) % page_count;
                self.memory.lock().access_page(&pid, page);
            }

            let p = inner.processes.get_mut(&pid).unwrap();
            p.decrement_current_burst_time(1, true);
            inner.total_cpu_time += 1;
            inner.quantum_remaining = inner.quantum_remaining.saturating_sub(1);

            if p.burst_time_remaining == 0 {
                p.end_cpu_interval(t + 1);
                if p.move_to_next_burst() {
                    match p.current_burst().copied() {
                        Some(Burst::Io(dur)) => {
                            p.burst_time_remaining = dur;
                            p.start_io_interval(t + 1);
                            p.state = ProcessState::BlockedIo;
                            inner.io_queue.push(pid.clone());
                        }
                        _ => {
                            p.state = ProcessState::Ready;
                            inner.ready.push_back(pid.clone());
                        }
                    }
                } else {
                    p.state = ProcessState::Terminated;
                    p.end_time = Some(t);
                    self.memory.lock().unload_process(&pid);
                }
                inner.running = None;
            } else if inner.scheduler.kind() == SchedulingKind::RoundRobin
                && inner.quantum_remaining == 0
            {
                p.end_cpu_interval(t + 1);
                p.state = ProcessState::Ready;
                inner.ready.push_back(pid.clone());
                inner.running = None;
            }
        } else {
            inner.total_idle_time += 1;
        }

        // Phase 7: drain deferred.
        while let Some(pid) = inner.ready_next_tick.pop_front() {
            inner.ready.push_back(pid);
        }

        let all_terminated = inner
            .processes
            .values()
            .all(|p| p.state == ProcessState::Terminated);

        let summary = TickSummary {
            tick: t,
            ready_depth: inner.ready.len(),
            io_depth: inner.io_queue.len(),
            memory_blocked_depth: inner.memory_blocked.len(),
            running_pid: inner.running.clone(),
            all_terminated,
        };

        if !all_terminated {
            inner.clock = t + 1;
        }

        drop(inner);

        // Phase 8/9: notify + termination check happen via the logged
        // summary and the caller's loop condition.
        info!(
            tick = summary.tick,
            ready = summary.ready_depth,
            io = summary.io_depth,
            mem_blocked = summary.memory_blocked_depth,
            running = summary.running_pid.as_deref().unwrap_or("-"),
            "tick"
        );

        summary
    }

    pub fn processes(&self) -> Vec<Process> {
        let inner = self.inner.lock();
        inner.order.iter().map(|pid| inner.processes[pid].clone()).collect()
    }

    pub fn total_cpu_time(&self) -> u64 {
        self.inner.lock().total_cpu_time
    }

    pub fn total_idle_time(&self) -> u64 {
        self.inner.lock().total_idle_time
    }

    pub fn context_switches(&self) -> u64 {
        self.inner.lock().context_switches
    }

    pub fn page_faults(&self) -> u64 {
        self.memory.lock().page_faults()
    }

    pub fn replacements(&self) -> u64 {
        self.memory.lock().replacements()
    }

    pub fn free_frames(&self) -> usize {
        self.memory.lock().free_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacement::ReplacementKind;

    fn engine(
        processes: Vec<Process>,
        kind: SchedulingKind,
        quantum: u64,
        frames: usize,
        rkind: ReplacementKind,
    ) -> SimulationEngine {
        SimulationEngine::new(
            processes,
            SchedulingPolicy::new(kind, quantum),
            frames,
            ReplacementPolicy::new(rkind),
            false,
            Duration::ZERO,
            Some(10_000),
        )
    }

    #[test]
    fn fcfs_single_process_no_memory_pressure() {
        let p = Process::new("P1".into(), 0, vec![Burst::Cpu(3)], 1, 1);
        let eng = engine(vec![p], SchedulingKind::Fcfs, 1, 2, ReplacementKind::Fifo);
        eng.run(|_| {});
        let procs = eng.processes();
        assert_eq!(procs[0].end_time, Some(2));
        assert_eq!(eng.page_faults(), 1);
        assert_eq!(eng.replacements(), 0);
    }

    #[test]
    fn io_completion_deferred_to_next_tick() {
        let p = Process::new(
            "P1".into(),
            0,
            vec![Burst::Cpu(1), Burst::Io(1), Burst::Cpu(1)],
            1,
            1,
        );
        let eng = engine(vec![p], SchedulingKind::Fcfs, 1, 1, ReplacementKind::Fifo);
        eng.run(|_| {});
        let procs = eng.processes();
        assert_eq!(procs[0].end_time, Some(2));
    }

    #[test]
    fn memory_blocked_process_is_reclaimed_next_tick() {
        let p1 = Process::new("P1".into(), 0, vec![Burst::Cpu(1)], 1, 1);
        let p2 = Process::new("P2".into(), 0, vec![Burst::Cpu(1)], 1, 1);
        let eng = engine(
            vec![p1, p2],
            SchedulingKind::Fcfs,
            1,
            1,
            ReplacementKind::Fifo,
        );
        eng.run(|_| {});
        let procs = eng.processes();
        assert!(procs.iter().all(|p| p.end_time.is_some()));
        assert_eq!(eng.page_faults(), 2);
        assert_eq!(eng.replacements(), 0);
    }

    #[test]
    fn round_robin_alternates_on_quantum() {
        let p1 = Process::new("P1".into(), 0, vec![Burst::Cpu(5)], 1, 1);
        let p2 = Process::new("P2".into(), 0, vec![Burst::Cpu(3)], 1, 1);
        let eng = engine(
            vec![p1, p2],
            SchedulingKind::RoundRobin,
            2,
            2,
            ReplacementKind::Fifo,
        );
        eng.run(|_| {});
        assert_eq!(eng.context_switches(), 5);
    }
}
