//! Queue and visited set for breadth-first search.
//!
//! While depth `d` is expanded, the entries of depth `d-1` are read from the read
//! generation and newly found states of depth `d` are appended to the write generation.
//! Each entry keeps the distance back to its predecessor, so the solution path can be
//! recovered without keeping every generation in memory: older generations are moved to a
//! [`RecordLog`] and only read again for path reconstruction.

use std::mem;

use log::info;

use crate::error::SolverError;
use crate::paged::{PagedBitSet, PagedVec};
use crate::record_log::{Entry, FileRecordLog, RecordLog};

/// The shared, mutable half of the queue: visited set and write generation. Concurrent
/// searches wrap it in a single lock.
#[derive(Debug, Default)]
pub struct Frontier {
    visited: PagedBitSet,
    write: PagedVec<Entry>,
    write_len: u64,
    read_len: u64,
}

impl Frontier {
    /// Marks `conf` as visited. If it was not visited before, appends it with its
    /// predecessor (an index into the read generation) and the moved box, and returns true.
    #[inline]
    pub fn lookup_and_add(&mut self, conf: u64, pred_index: u64, moved_box: usize) -> bool {
        if !self.visited.test_and_set(conf) {
            return false;
        }
        debug_assert!(pred_index <= self.read_len);
        self.write.set(
            self.write_len,
            Entry {
                config: conf,
                pred: self.write_len + (self.read_len - pred_index),
                moved_box: moved_box as u32,
            },
        );
        self.write_len += 1;
        true
    }
}

/// The read generation while a depth is being expanded.
#[derive(Clone, Copy)]
pub struct ReadGeneration<'a> {
    entries: &'a PagedVec<Entry>,
    len: u64,
}

impl ReadGeneration<'_> {
    #[inline]
    pub fn get(&self, i: u64) -> Entry {
        debug_assert!(i < self.len);
        self.entries.get(i)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct QueueStats {
    pub queue_bytes: u64,
    pub bitset_bytes: u64,
    pub log_records: u64,
    pub log_bytes: u64,
}

#[derive(Debug)]
pub struct BfsQueue<L = FileRecordLog> {
    num_configs: u64,
    read: PagedVec<Entry>,
    frontier: Frontier,
    log: L,
    depth: u64,
}

impl BfsQueue<FileRecordLog> {
    /// Queue for configuration numbers `0..num_configs`, logging old generations to an
    /// anonymous temporary file.
    pub fn new(num_configs: u64) -> Result<Self, SolverError> {
        Ok(Self::with_log(num_configs, FileRecordLog::new()?))
    }
}

impl<L: RecordLog> BfsQueue<L> {
    pub fn with_log(num_configs: u64, log: L) -> Self {
        BfsQueue { num_configs, read: PagedVec::new(), frontier: Frontier::default(), log, depth: 0 }
    }

    #[inline]
    pub fn lookup_and_add(&mut self, conf: u64, pred_index: u64, moved_box: usize) -> bool {
        debug_assert!(conf < self.num_configs);
        self.frontier.lookup_and_add(conf, pred_index, moved_box)
    }

    /// Starts the next depth: the write generation becomes the read generation and the
    /// previous read generation is appended to the log and released.
    pub fn push_depth(&mut self) -> Result<(), SolverError> {
        let completed = mem::take(&mut self.frontier.write);
        let stale = mem::replace(&mut self.read, completed);
        for (block, n) in stale.runs(self.frontier.read_len) {
            match block {
                Some(entries) => self.log.append(entries)?,
                // Keeps record indices aligned; cannot happen for a generation filled in order.
                None => self.log.append(&vec![Entry::default(); n])?,
            }
        }
        drop(stale);

        self.frontier.read_len = self.frontier.write_len;
        self.frontier.write_len = 0;
        self.depth += 1;
        Ok(())
    }

    /// Number of entries in the read generation.
    pub fn length(&self) -> u64 {
        self.frontier.read_len
    }

    /// Number of completed generations.
    pub fn depth(&self) -> u64 {
        self.depth
    }

    #[inline]
    pub fn get(&self, i: u64) -> Entry {
        debug_assert!(i < self.frontier.read_len);
        self.read.get(i)
    }

    /// Borrows the read generation and the frontier separately, so that workers can read
    /// the former freely while serializing on the latter.
    pub fn split_layer(&mut self) -> (ReadGeneration<'_>, &mut Frontier) {
        let read = ReadGeneration { entries: &self.read, len: self.frontier.read_len };
        (read, &mut self.frontier)
    }

    /// The path from the start configuration to `conf`, which was found as a successor of
    /// read-generation entry `pred_index`.
    pub fn get_path(&mut self, conf: u64, pred_index: u64) -> Result<Vec<u64>, SolverError> {
        let mut path = Vec::with_capacity(self.depth as usize + 1);
        path.push(conf);

        let mut entry = self.get(pred_index);
        path.push(entry.config);
        // The log holds every generation before the read generation.
        let mut index = self.log.len() + pred_index;
        for _ in 1..self.depth {
            index = index
                .checked_sub(entry.pred)
                .ok_or(SolverError::InconsistentPath { step: path.len() })?;
            entry = self.log.read(index)?;
            path.push(entry.config);
        }
        path.reverse();
        Ok(path)
    }

    pub fn statistics(&self) -> QueueStats {
        let stats = QueueStats {
            queue_bytes: (self.read.allocated_bytes() + self.frontier.write.allocated_bytes()) as u64,
            bitset_bytes: self.frontier.visited.allocated_bytes() as u64,
            log_records: self.log.len(),
            log_bytes: self.log.size_bytes(),
        };
        info!("Used {} KBytes for arrays", stats.queue_bytes / 1024);
        info!("Used {} KBytes for bit set", stats.bitset_bytes / 1024);
        info!("Used {} KBytes for temp file", stats.log_bytes / 1024);
        stats
    }
}
