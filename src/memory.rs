//! Memory manager: owns the frame table, resident sets, access history, and
//! routes every access through the active replacement policy.
//!
//! A single owner for state that must be mutated atomically and observed
//! through cheap snapshot getters — mutated in place under its own lock
//! rather than hot-swapped via `Arc<RwLock<_>>>`, since frames change every
//! tick rather than on rare reconfiguration.

use rustc_hash::FxHashMap;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::describe_panic;
use crate::replacement::ReplacementPolicy;

/// What caused an access-history entry to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessNote {
    Load,
    Access,
    Evict,
    Alloc,
    Unload,
}

/// One entry in a frame's append-only access history.
#[derive(Debug, Clone)]
pub struct AccessEvent {
    pub seq: u64,
    pub time: u64,
    pub page: usize,
    pub hit: bool,
    pub note: AccessNote,
}

/// Owns frame occupancy, resident sets, and the access-sequence counter.
/// Callers are expected to hold an external lock (e.g. `parking_lot::Mutex`)
/// around the manager; the manager itself performs no internal locking.
pub struct MemoryManager {
    total_frames: usize,
    frame_table: FxHashMap<usize, (String, usize)>,
    terminated_table: FxHashMap<usize, (String, usize)>,
    resident_sets: FxHashMap<String, HashSet<usize>>,
    access_history: FxHashMap<usize, Vec<AccessEvent>>,
    sequence: u64,
    page_faults: u64,
    replacements: u64,
    current_time: u64,
    preserve_frames_on_termination: bool,
    policy: ReplacementPolicy,
    on_update: Option<Box<dyn FnMut() + Send>>,
}

impl MemoryManager {
    pub fn new(total_frames: usize, policy: ReplacementPolicy, preserve_frames_on_termination: bool) -> Self {
        Self {
            total_frames,
            frame_table: FxHashMap::default(),
            terminated_table: FxHashMap::default(),
            resident_sets: FxHashMap::default(),
            access_history: FxHashMap::default(),
            sequence: 0,
            page_faults: 0,
            replacements: 0,
            current_time: 0,
            preserve_frames_on_termination,
            policy,
            on_update: None,
        }
    }

    pub fn set_on_update(&mut self, callback: Box<dyn FnMut() + Send>) {
        self.on_update = Some(callback);
    }

    pub fn set_current_time(&mut self, t: u64) {
        self.current_time = t;
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.sequence;
        self.sequence += 1;
        seq
    }

    fn free_frame_count(&self) -> usize {
        self.total_frames - self.frame_table.len()
    }

    fn lowest_free_frame(&self) -> Option<usize> {
        (0..self.total_frames).find(|f| !self.frame_table.contains_key(f))
    }

    fn record(&mut self, frame: usize, seq: u64, page: usize, hit: bool, note: AccessNote) {
        self.access_history.entry(frame).or_default().push(AccessEvent {
            seq,
            time: self.current_time,
            page,
            hit,
            note,
        });
    }

    fn notify(&mut self) {
        if let Some(cb) = self.on_update.as_mut() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb()));
            if let Err(payload) = outcome {
                warn!(panic = %describe_panic(&*payload), "on_update callback panicked; suppressing");
            }
        }
    }

    /// Attempts to make page 0 of `pid` resident. Unlike [`access_page`],
    /// this never evicts another process's page: an arriving or
    /// memory-blocked process only succeeds if a frame is already free,
    /// so it cannot starve a process that is still running. Returns `true`
    /// iff the process ends the call with at least one resident page.
    pub fn try_load_initial_page(&mut self, pid: &str) -> bool {
        if self
            .resident_sets
            .get(pid)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
        {
            return true;
        }
        let seq = self.next_seq();
        let result = self.fault_in_with_seq(pid, 0, seq, false);
        self.notify();
        result
    }

    /// Routes an access to `(pid, page)`; records the outcome and advances
    /// the sequence counter exactly once. A miss here may evict another
    /// process's page, per the replacement policy.
    pub fn access_page(&mut self, pid: &str, page: usize) {
        let frame = self
            .frame_table
            .iter()
            .find(|(_, (owner, p))| owner == pid && *p == page)
            .map(|(&f, _)| f);

        let seq = self.next_seq();
        if let Some(frame) = frame {
            self.record(frame, seq, page, true, AccessNote::Access);
            self.policy.page_accessed(frame, pid, page, self.current_time);
            debug!(seq, pid, page, frame, "page hit");
        } else {
            self.fault_in_with_seq(pid, page, seq, true);
        }
        self.notify();
    }

    fn fault_in_with_seq(&mut self, pid: &str, page: usize, seq: u64, allow_eviction: bool) -> bool {
        self.page_faults += 1;
        if self.free_frame_count() == 0 {
            if !allow_eviction {
                warn!(seq, pid, page, "pool full and eviction not permitted for this caller; no-op");
                return false;
            }
            let resident: Vec<usize> = self.frame_table.keys().copied().collect();
            match self.policy.select_victim(&resident, self.current_time) {
                Some(victim) => {
                    if let Some((owner, owned_page)) = self.frame_table.remove(&victim) {
                        if let Some(set) = self.resident_sets.get_mut(&owner) {
                            set.remove(&owned_page);
                        }
                        self.policy.frame_freed(victim);
                        self.replacements += 1;
                        self.record(victim, seq, owned_page, false, AccessNote::Evict);
                        info!(seq, victim, evicted_owner = %owner, evicted_page = owned_page, "eviction");
                    }
                }
                None => {
                    warn!(seq, pid, page, "page fault with no nameable victim; treating as no-op");
                    return false;
                }
            }
        }

        let frame = match self.lowest_free_frame() {
            Some(f) => f,
            None => {
                warn!(seq, pid, page, "no free frame after eviction attempt");
                return false;
            }
        };

        self.frame_table.insert(frame, (pid.to_string(), page));
        self.resident_sets
            .entry(pid.to_string())
            .or_default()
            .insert(page);
        self.policy.frame_allocated(frame, pid, page);
        self.record(frame, seq, page, false, AccessNote::Load);
        self.policy.page_accessed(frame, pid, page, self.current_time);
        info!(seq, pid, page, frame, "page loaded");
        true
    }

    /// Frees every frame owned by `pid`. If `preserve_frames_on_termination`
    /// is set, mappings move to a read-only terminated table instead of
    /// being cleared outright.
    pub fn unload_process(&mut self, pid: &str) {
        let pages: Vec<usize> = self
            .resident_sets
            .get(pid)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        if pages.is_empty() {
            return;
        }
        let frames: Vec<usize> = self
            .frame_table
            .iter()
            .filter(|(_, (owner, _))| owner == pid)
            .map(|(&f, _)| f)
            .collect();

        for frame in frames {
            if let Some(entry) = self.frame_table.remove(&frame) {
                if self.preserve_frames_on_termination {
                    self.terminated_table.insert(frame, entry);
                }
                self.policy.frame_freed(frame);
                let seq = self.next_seq();
                self.record(frame, seq, entry.1, false, AccessNote::Unload);
            }
        }
        self.resident_sets.remove(pid);
        self.notify();
    }

    pub fn free_frames(&self) -> usize {
        self.free_frame_count()
    }

    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    pub fn max_access_sequence(&self) -> u64 {
        self.sequence
    }

    /// Deep-copy snapshot of live frame occupancy (and, if preserving,
    /// terminated occupancy merged in for reporting).
    pub fn frame_status_snapshot(&self) -> FxHashMap<usize, (String, usize)> {
        let mut snapshot = self.frame_table.clone();
        for (&f, entry) in &self.terminated_table {
            snapshot.entry(f).or_insert_with(|| entry.clone());
        }
        snapshot
    }

    pub fn frame_to_page_snapshot(&self) -> FxHashMap<usize, usize> {
        self.frame_table.iter().map(|(&f, (_, p))| (f, *p)).collect()
    }

    pub fn frame_access_history_snapshot(&self) -> FxHashMap<usize, Vec<AccessEvent>> {
        self.access_history.clone()
    }

    /// Deep-copy snapshot of each process's resident page set, for checking
    /// it stays in lockstep with the frame table.
    pub fn resident_pages_snapshot(&self) -> FxHashMap<String, HashSet<usize>> {
        self.resident_sets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacement::ReplacementKind;

    fn manager(frames: usize, kind: ReplacementKind) -> MemoryManager {
        MemoryManager::new(frames, ReplacementPolicy::new(kind), false)
    }

    #[test]
    fn initial_load_succeeds_and_is_idempotent() {
        let mut m = manager(2, ReplacementKind::Fifo);
        assert!(m.try_load_initial_page("P1"));
        assert_eq!(m.page_faults(), 1);
        assert!(m.try_load_initial_page("P1"));
        assert_eq!(m.page_faults(), 1);
    }

    #[test]
    fn access_hit_does_not_increment_faults() {
        let mut m = manager(2, ReplacementKind::Fifo);
        m.try_load_initial_page("P1");
        m.access_page("P1", 0);
        assert_eq!(m.page_faults(), 1);
    }

    #[test]
    fn eviction_under_pressure_picks_fifo_victim() {
        let mut m = manager(1, ReplacementKind::Fifo);
        m.try_load_initial_page("P1");
        m.access_page("P2", 0);
        assert_eq!(m.page_faults(), 2);
        assert_eq!(m.replacements(), 1);
        assert!(m.frame_status_snapshot().values().any(|(pid, _)| pid == "P2"));
    }

    #[test]
    fn unload_frees_all_owned_frames() {
        let mut m = manager(2, ReplacementKind::Fifo);
        m.try_load_initial_page("P1");
        m.access_page("P1", 1);
        m.unload_process("P1");
        assert_eq!(m.free_frames(), 2);
    }

    #[test]
    fn unload_on_process_with_no_frames_is_a_no_op() {
        let mut m = manager(2, ReplacementKind::Fifo);
        m.unload_process("ghost");
        assert_eq!(m.free_frames(), 2);
    }

    #[test]
    fn sequence_advances_once_per_access_call() {
        let mut m = manager(2, ReplacementKind::Fifo);
        m.try_load_initial_page("P1");
        let seq_before = m.max_access_sequence();
        m.access_page("P1", 1);
        assert_eq!(m.max_access_sequence(), seq_before + 1);
    }
}
