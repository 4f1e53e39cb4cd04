//! Memoization and path stack for the bounded depth-first search.

use log::debug;

use crate::paged::PagedVec;

/// Largest supported push bound. Stored depths count the states on the path, so a bound
/// of `MAX_DFS_DEPTH` pushes needs depths up to `MAX_DFS_DEPTH + 1`, the largest value a
/// byte holds besides the "unseen" marker.
pub const MAX_DFS_DEPTH: u32 = 254;

const UNSEEN: u8 = 0;

/// Best depth at which each configuration has been reached so far.
#[derive(Debug, Default)]
pub struct DepthMap {
    depths: PagedVec<u8>,
    per_depth: Vec<u64>,
}

impl DepthMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `depth` (>= 1) for `conf` if it is the first or a strictly smaller depth
    /// seen for it. Returns whether the entry changed.
    #[inline]
    pub fn lookup_and_set(&mut self, conf: u64, depth: u8) -> bool {
        debug_assert!(depth != UNSEEN);
        let slot = self.depths.get_mut(conf);
        let old = *slot;
        if old != UNSEEN && old <= depth {
            return false;
        }
        *slot = depth;

        if self.per_depth.len() <= depth as usize {
            self.per_depth.resize(depth as usize + 1, 0);
        }
        self.per_depth[depth as usize] += 1;
        if old != UNSEEN {
            self.per_depth[old as usize] -= 1;
        }
        true
    }

    /// Number of configurations whose best known depth is `depth`.
    pub fn configs_at_depth(&self, depth: u8) -> u64 {
        self.per_depth.get(depth as usize).copied().unwrap_or(0)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.depths.allocated_bytes()
    }

    /// Logs per-depth counts and memory use; returns the total number of recorded configurations.
    pub fn statistics(&self) -> u64 {
        for depth in 1..self.per_depth.len() {
            debug!("Depth {}: {} configurations", depth - 1, self.configs_at_depth(depth as u8));
        }
        debug!("Used {} KBytes for depth map", self.allocated_bytes() / 1024);
        self.per_depth.iter().sum()
    }
}

/// Configurations on the current search path, root first.
#[derive(Clone, Debug)]
pub struct DfsStack {
    confs: Vec<u64>,
    limit: usize,
}

impl DfsStack {
    /// A stack holding at most `limit` configurations.
    pub fn new(limit: usize) -> Self {
        DfsStack { confs: Vec::with_capacity(limit), limit }
    }

    #[inline]
    pub fn push(&mut self, conf: u64) {
        debug_assert!(self.confs.len() < self.limit);
        self.confs.push(conf);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.confs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confs.is_empty()
    }

    pub fn path(&self) -> &[u64] {
        &self.confs
    }
}
