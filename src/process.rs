//! Process definitions: the immutable descriptor plus the mutable runtime
//! state the engine advances tick by tick.

use std::fmt;

/// One burst of demand within a process's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    Cpu(u64),
    Io(u64),
}

impl Burst {
    pub fn duration(&self) -> u64 {
        match self {
            Burst::Cpu(d) | Burst::Io(d) => *d,
        }
    }

    pub fn is_cpu(&self) -> bool {
        matches!(self, Burst::Cpu(_))
    }
}

/// Lifecycle states a process passes through. Terminated is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    BlockedIo,
    BlockedMemory,
    Terminated,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::New => "New",
            ProcessState::Ready => "Ready",
            ProcessState::Running => "Running",
            ProcessState::BlockedIo => "BlockedIO",
            ProcessState::BlockedMemory => "BlockedMemory",
            ProcessState::Terminated => "Terminated",
        };
        f.write_str(s)
    }
}

/// A half-open `[start, end)` interval recorded on a process's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A job in the simulation: immutable descriptor plus mutable runtime state.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: String,
    pub arrival_time: u64,
    pub bursts: Vec<Burst>,
    pub priority: i64,
    pub page_count: usize,

    pub state: ProcessState,
    pub current_burst_index: usize,
    pub burst_time_remaining: u64,
    pub cpu_time_used: u64,
    pub context_switches: u64,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub last_access_time: u64,

    cpu_intervals: Vec<Interval>,
    io_intervals: Vec<Interval>,
    open_cpu_start: Option<u64>,
    open_io_start: Option<u64>,
}

impl Process {
    pub fn new(
        pid: String,
        arrival_time: u64,
        bursts: Vec<Burst>,
        priority: i64,
        page_count: usize,
    ) -> Self {
        let burst_time_remaining = bursts.first().map(|b| b.duration()).unwrap_or(0);
        Self {
            pid,
            arrival_time,
            bursts,
            priority,
            page_count,
            state: ProcessState::New,
            current_burst_index: 0,
            burst_time_remaining,
            cpu_time_used: 0,
            context_switches: 0,
            start_time: None,
            end_time: None,
            last_access_time: 0,
            cpu_intervals: Vec::new(),
            io_intervals: Vec::new(),
            open_cpu_start: None,
            open_io_start: None,
        }
    }

    /// Total CPU time demanded across the whole burst list, independent of
    /// how much has executed so far.
    pub fn total_cpu_time_needed(&self) -> u64 {
        self.bursts
            .iter()
            .filter(|b| b.is_cpu())
            .map(|b| b.duration())
            .sum()
    }

    pub fn current_burst(&self) -> Option<&Burst> {
        self.bursts.get(self.current_burst_index)
    }

    /// Advances to the next burst, resetting `burst_time_remaining`.
    /// Returns `true` if a next burst exists.
    pub fn move_to_next_burst(&mut self) -> bool {
        self.current_burst_index += 1;
        match self.bursts.get(self.current_burst_index) {
            Some(b) => {
                self.burst_time_remaining = b.duration();
                true
            }
            None => {
                self.burst_time_remaining = 0;
                false
            }
        }
    }

    /// Decrements the current burst's remaining time by `amount`, crediting
    /// `cpu_time_used` iff `is_cpu` is set.
    pub fn decrement_current_burst_time(&mut self, amount: u64, is_cpu: bool) {
        self.burst_time_remaining = self.burst_time_remaining.saturating_sub(amount);
        if is_cpu {
            self.cpu_time_used += amount;
        }
    }

    pub fn start_cpu_interval(&mut self, t: u64) {
        self.open_cpu_start = Some(t);
    }

    pub fn end_cpu_interval(&mut self, t: u64) {
        if let Some(start) = self.open_cpu_start.take() {
            self.cpu_intervals.push(Interval { start, end: t });
        }
    }

    pub fn start_io_interval(&mut self, t: u64) {
        self.open_io_start = Some(t);
    }

    pub fn end_io_interval(&mut self, t: u64) {
        if let Some(start) = self.open_io_start.take() {
            self.io_intervals.push(Interval { start, end: t });
        }
    }

    /// Closes any intervals left open at termination, at `[t, t+1)`.
    pub fn close_open_intervals_at_termination(&mut self, t: u64) {
        if self.open_cpu_start.is_some() {
            self.end_cpu_interval(t + 1);
        }
        if self.open_io_start.is_some() {
            self.end_io_interval(t + 1);
        }
    }

    pub fn cpu_intervals(&self) -> &[Interval] {
        &self.cpu_intervals
    }

    pub fn io_intervals(&self) -> &[Interval] {
        &self.io_intervals
    }

    /// Restores initial runtime fields and clears recorded intervals.
    pub fn reset(&mut self) {
        self.state = ProcessState::New;
        self.current_burst_index = 0;
        self.burst_time_remaining = self.bursts.first().map(|b| b.duration()).unwrap_or(0);
        self.cpu_time_used = 0;
        self.context_switches = 0;
        self.start_time = None;
        self.end_time = None;
        self.last_access_time = 0;
        self.cpu_intervals.clear();
        self.io_intervals.clear();
        self.open_cpu_start = None;
        self.open_io_start = None;
    }

    /// Turnaround is measured to the close of the process's last recorded
    /// interval (`end_time + 1`, matching the half-open `[start, end)`
    /// convention used elsewhere), not to the raw tick `end_time` was
    /// recorded on.
    pub fn turnaround_time(&self) -> Option<u64> {
        self.end_time
            .map(|end| (end + 1).saturating_sub(self.arrival_time))
    }

    pub fn waiting_time(&self) -> Option<u64> {
        self.turnaround_time()
            .map(|t| t.saturating_sub(self.total_cpu_time_needed()))
    }

    pub fn response_time(&self) -> Option<u64> {
        self.start_time
            .map(|s| s.saturating_sub(self.arrival_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(bursts: Vec<Burst>) -> Process {
        Process::new("P1".into(), 0, bursts, 1, 1)
    }

    #[test]
    fn total_cpu_time_sums_only_cpu_bursts() {
        let p = make(vec![Burst::Cpu(3), Burst::Io(2), Burst::Cpu(4)]);
        assert_eq!(p.total_cpu_time_needed(), 7);
    }

    #[test]
    fn move_to_next_burst_resets_remaining() {
        let mut p = make(vec![Burst::Cpu(3), Burst::Io(2)]);
        assert!(p.move_to_next_burst());
        assert_eq!(p.burst_time_remaining, 2);
        assert!(!p.move_to_next_burst());
        assert_eq!(p.burst_time_remaining, 0);
    }

    #[test]
    fn interval_bookkeeping_round_trips() {
        let mut p = make(vec![Burst::Cpu(3)]);
        p.start_cpu_interval(0);
        p.end_cpu_interval(3);
        assert_eq!(p.cpu_intervals(), &[Interval { start: 0, end: 3 }]);
    }

    #[test]
    fn close_open_intervals_at_termination_closes_both() {
        let mut p = make(vec![Burst::Cpu(1)]);
        p.start_cpu_interval(0);
        p.start_io_interval(0);
        p.close_open_intervals_at_termination(0);
        assert_eq!(p.cpu_intervals()[0].end, 1);
        assert_eq!(p.io_intervals()[0].end, 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut p = make(vec![Burst::Cpu(3)]);
        p.state = ProcessState::Running;
        p.cpu_time_used = 5;
        p.reset();
        assert_eq!(p.state, ProcessState::New);
        assert_eq!(p.cpu_time_used, 0);
        assert_eq!(p.burst_time_remaining, 3);
    }
}
