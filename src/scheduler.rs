//! Scheduling policies: a closed tagged-variant dispatch over the ready
//! queue, sized for four variants rather than a function-pointer table.

use crate::process::Process;

/// The four canonical scheduling disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingKind {
    Fcfs,
    Sjf,
    RoundRobin,
    Priority,
}

impl SchedulingKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fcfs" => Some(Self::Fcfs),
            "sjf" => Some(Self::Sjf),
            "rr" | "round_robin" | "roundrobin" => Some(Self::RoundRobin),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf => "SJF",
            Self::RoundRobin => "RR",
            Self::Priority => "Priority",
        }
    }
}

/// A scheduling policy. Stateless except Round-Robin, which only carries its
/// quantum (the engine, not the policy, enforces it).
#[derive(Debug, Clone, Copy)]
pub struct SchedulingPolicy {
    kind: SchedulingKind,
    quantum: u64,
}

impl SchedulingPolicy {
    pub fn new(kind: SchedulingKind, quantum: u64) -> Self {
        Self { kind, quantum }
    }

    pub fn kind(&self) -> SchedulingKind {
        self.kind
    }

    pub fn quantum(&self) -> u64 {
        self.quantum
    }

    /// Selects the index (into `ready`) of the next process to dispatch,
    /// without mutating the snapshot. `ready` must be in queue (insertion)
    /// order so ties break on arrival order.
    pub fn select_next(&self, ready: &[&Process]) -> Option<usize> {
        if ready.is_empty() {
            return None;
        }
        match self.kind {
            SchedulingKind::Fcfs | SchedulingKind::RoundRobin => Some(0),
            SchedulingKind::Sjf => ready
                .iter()
                .enumerate()
                .min_by_key(|(idx, p)| (p.total_cpu_time_needed(), *idx))
                .map(|(idx, _)| idx),
            SchedulingKind::Priority => ready
                .iter()
                .enumerate()
                .min_by_key(|(idx, p)| (p.priority, *idx))
                .map(|(idx, _)| idx),
        }
    }
}
