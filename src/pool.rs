//! `CellInfoPool`: bounded arena of per-cell search/occupancy scratch state.
//!
//! A `Cell` only carries an `info` index while something actually claims it:
//! open/closed list membership during a search, an occupant id, a goal id,
//! or an obstacle id. Everything else — cost, parent pointer, open/closed
//! links — lives in the pooled `CellInfo`, not on the cell itself, so the
//! vast majority of a large map's cells cost nothing beyond the handful of
//! bytes in `grid::Cell`.

use serde::{Deserialize, Serialize};

use crate::grid::CellType;
use crate::ids::{EntityId, LayerId, ObstacleId};

/// Stable index into a `CellInfoPool`, used in place of a raw pointer so
/// the pool can be freely relocated, serialised, or compared by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InfoIndex(pub u32);

/// Pool-allocated search/occupancy scratch for one cell.
#[derive(Clone, Debug, Default)]
pub struct CellInfo {
    pub parent: Option<InfoIndex>,
    pub prev_open: Option<InfoIndex>,
    pub next_open: Option<InfoIndex>,
    pub cost_so_far: u32,
    pub total_cost: u32,
    pub open: bool,
    pub closed: bool,
    pub blocked_by_ally: bool,
    pub obstacle_id: Option<ObstacleId>,
    pub obstacle_is_fence: bool,
    pub obstacle_is_transparent: bool,
    pub goal_unit_id: Option<EntityId>,
    pub pos_unit_id: Option<EntityId>,
    pub goal_aircraft_id: Option<EntityId>,
    pub pos: (i32, i32),
    /// Layer this cell belongs to. Lets a search walk parent/open-list
    /// links (which only carry an `InfoIndex`) back to a concrete grid
    /// cell without a side table.
    pub layer: LayerId,
    /// Cell type that was in effect before an obstacle was stamped over
    /// this cell, needed to make `stamp_obstacle`/`unstamp_obstacle`
    /// reversible without re-querying terrain.
    pub prev_type: Option<CellType>,
}

impl CellInfo {
    /// True while some reason still requires this slot to exist: open/closed
    /// list membership, an occupant, or an obstacle.
    fn has_claim(&self) -> bool {
        self.open
            || self.closed
            || self.obstacle_id.is_some()
            || self.goal_unit_id.is_some()
            || self.pos_unit_id.is_some()
            || self.goal_aircraft_id.is_some()
    }
}

/// Bounded pool of `CellInfo` slots with an index-based free list.
///
/// Allocation failure ("out of search state") is a legitimate terminal
/// error for the request in progress, not a crash.
pub struct CellInfoPool {
    slots: Vec<CellInfo>,
    free: Vec<u32>,
    capacity: usize,
}

impl CellInfoPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn free_len(&self) -> usize {
        self.capacity - self.in_use()
    }

    /// Pop a free slot (growing the backing storage up to `capacity`) and
    /// zero-initialise it. Returns `None` on pool exhaustion.
    pub fn allocate(&mut self) -> Option<InfoIndex> {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = CellInfo::default();
            return Some(InfoIndex(idx));
        }
        if self.slots.len() >= self.capacity {
            return None;
        }
        let idx = self.slots.len() as u32;
        self.slots.push(CellInfo::default());
        Some(InfoIndex(idx))
    }

    pub fn get(&self, idx: InfoIndex) -> &CellInfo {
        &self.slots[idx.0 as usize]
    }

    pub fn get_mut(&mut self, idx: InfoIndex) -> &mut CellInfo {
        &mut self.slots[idx.0 as usize]
    }

    /// Release the slot back to the pool if nothing still claims it. Returns
    /// `true` if the slot was freed (callers clear the owning cell's `info`
    /// field in that case).
    pub fn release_if_unused(&mut self, idx: InfoIndex) -> bool {
        if self.slots[idx.0 as usize].has_claim() {
            return false;
        }
        self.free.push(idx.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_respects_capacity() {
        let mut pool = CellInfoPool::new(2);
        let a = pool.allocate().unwrap();
        let _b = pool.allocate().unwrap();
        assert!(pool.allocate().is_none());
        assert_eq!(pool.in_use(), 2);
        assert!(pool.release_if_unused(a));
        assert_eq!(pool.in_use(), 1);
        assert!(pool.allocate().is_some());
    }

    #[test]
    fn release_noop_while_claimed() {
        let mut pool = CellInfoPool::new(4);
        let idx = pool.allocate().unwrap();
        pool.get_mut(idx).pos_unit_id = Some(EntityId(1));
        assert!(!pool.release_if_unused(idx));
        pool.get_mut(idx).pos_unit_id = None;
        assert!(pool.release_if_unused(idx));
    }
}
