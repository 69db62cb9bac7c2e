//! Contiguous block partition of element ranges across workers.
//!
//! In distributed execution each worker resolves supports and remaps
//! indices restricted to a disjoint, covering block of every element
//! group. Workers never coordinate: correctness relies solely on the
//! blocks partitioning `0..n` disjointly and exhaustively.

use std::ops::Range;

use crate::mesh_error::MeshSupportError;

/// This worker's position in the fleet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerLayout {
    rank: usize,
    count: usize,
}

impl WorkerLayout {
    /// Single-process layout: one worker owning everything.
    pub fn serial() -> Self {
        Self { rank: 0, count: 1 }
    }

    /// Layout for worker `rank` of `count`.
    pub fn new(rank: usize, count: usize) -> Result<Self, MeshSupportError> {
        if count == 0 || rank >= count {
            return Err(MeshSupportError::BadWorkerLayout { rank, count });
        }
        Ok(Self { rank, count })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_serial(&self) -> bool {
        self.count == 1
    }

    /// This worker's element block of a group with `n` elements.
    ///
    /// Blocks are `n / count` long; the last worker absorbs the
    /// remainder so the blocks cover `0..n` exactly.
    pub fn block(&self, n: usize) -> Range<usize> {
        let size = n / self.count;
        let start = size * self.rank;
        let end = if self.rank + 1 == self.count {
            n
        } else {
            start + size
        };
        start..end
    }
}

impl Default for WorkerLayout {
    fn default() -> Self {
        Self::serial()
    }
}
