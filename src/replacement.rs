//! Page replacement policies: FIFO, LRU, and a deterministic Optimal
//! fallback, dispatched through a closed tagged variant rather than a
//! trait-object hierarchy.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    Fifo,
    Lru,
    Optimal,
}

impl ReplacementKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Some(Self::Fifo),
            "lru" => Some(Self::Lru),
            "optimal" | "opt" => Some(Self::Optimal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Lru => "LRU",
            Self::Optimal => "Optimal",
        }
    }
}

/// Sentinel meaning "never accessed since allocation" — sorts as oldest.
const NEVER_ACCESSED: i64 = -1;

/// Per-variant state for the active replacement policy. Only one of the
/// three payloads is used at a time, selected by `kind`.
pub struct ReplacementPolicy {
    kind: ReplacementKind,
    fifo_queue: VecDeque<usize>,
    lru_times: FxHashMap<usize, i64>,
}

impl ReplacementPolicy {
    pub fn new(kind: ReplacementKind) -> Self {
        Self {
            kind,
            fifo_queue: VecDeque::new(),
            lru_times: FxHashMap::default(),
        }
    }

    pub fn kind(&self) -> ReplacementKind {
        self.kind
    }

    pub fn page_accessed(&mut self, frame: usize, _process: &str, _page: usize, t: u64) {
        if self.kind == ReplacementKind::Lru {
            self.lru_times.insert(frame, t as i64);
        }
    }

    pub fn frame_allocated(&mut self, frame: usize, _process: &str, _page: usize) {
        match self.kind {
            ReplacementKind::Fifo => self.fifo_queue.push_back(frame),
            ReplacementKind::Lru => {
                self.lru_times.insert(frame, NEVER_ACCESSED);
            }
            ReplacementKind::Optimal => {}
        }
    }

    pub fn frame_freed(&mut self, frame: usize) {
        match self.kind {
            ReplacementKind::Fifo => self.fifo_queue.retain(|&f| f != frame),
            ReplacementKind::Lru => {
                self.lru_times.remove(&frame);
            }
            ReplacementKind::Optimal => {}
        }
    }

    /// Names a victim frame currently present in `resident_frames`, or
    /// returns `None` if no victim can be named (caller treats this as a
    /// no-op fault, never a hard failure).
    pub fn select_victim(&mut self, resident_frames: &[usize], _t: u64) -> Option<usize> {
        if resident_frames.is_empty() {
            return None;
        }
        match self.kind {
            ReplacementKind::Fifo => {
                while let Some(&front) = self.fifo_queue.front() {
                    if resident_frames.contains(&front) {
                        self.fifo_queue.pop_front();
                        return Some(front);
                    }
                    self.fifo_queue.pop_front();
                }
                resident_frames.first().copied()
            }
            ReplacementKind::Lru => resident_frames
                .iter()
                .copied()
                .min_by_key(|f| (self.lru_times.get(f).copied().unwrap_or(NEVER_ACCESSED), *f)),
            ReplacementKind::Optimal => resident_frames.iter().copied().max(),
        }
    }
}
