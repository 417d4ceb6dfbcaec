//! `RequestQueue`: a bounded FIFO of entities awaiting a pathfind, drained
//! under a per-tick cell budget.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::ids::EntityId;
use crate::pool::CellInfoPool;
use crate::zone::ZoneManager;

/// Cumulative cells examined across all requests served in a single
/// `process` call.
pub const DEFAULT_CELL_BUDGET: u32 = 5000;

/// Handed to `RequestQueue::process` once per served request. Implemented
/// by the AI layer: it runs whichever search variant the entity's pending
/// command needs and installs the resulting path.
pub trait PathRequestHandler {
    /// Serve one request, returning the number of cells the underlying
    /// search examined so the queue can charge it against the tick budget.
    /// A `None` return (entity destroyed, command superseded) charges
    /// nothing and the request is simply dropped.
    fn serve(&mut self, entity: EntityId) -> Option<u32>;
}

/// Bounded FIFO of entity IDs awaiting a pathfind. `queue_for_path` is
/// idempotent: an entity already pending is not re-enqueued.
pub struct RequestQueue {
    capacity: usize,
    order: VecDeque<EntityId>,
    pending: FxHashSet<EntityId>,
}

impl RequestQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            pending: FxHashSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// FIFO contents still actually pending, skipping stale cancelled
    /// entries, for persistence.
    pub fn pending_contents(&self) -> Vec<EntityId> {
        self.order.iter().copied().filter(|e| self.pending.contains(e)).collect()
    }

    /// Rebuilds a queue from persisted FIFO contents.
    pub fn from_contents(capacity: usize, contents: Vec<EntityId>) -> Self {
        let pending = contents.iter().copied().collect();
        Self {
            capacity,
            order: contents.into(),
            pending,
        }
    }

    /// `queueForPath(id)`. Returns `false` if the queue is already at
    /// capacity and the request was dropped.
    pub fn queue_for_path(&mut self, entity: EntityId) -> bool {
        if self.pending.contains(&entity) {
            return true;
        }
        if self.order.len() >= self.capacity {
            return false;
        }
        self.pending.insert(entity);
        self.order.push_back(entity);
        true
    }

    /// Cancel a pending request — implicitly triggered when the owning
    /// entity is destroyed or issues a new command. Tolerates an id that
    /// isn't actually queued.
    pub fn cancel(&mut self, entity: EntityId) {
        self.pending.remove(&entity);
        // Left in `order` as a stale id; `process` skips it cheaply via the
        // `pending` lookup rather than paying an O(n) VecDeque removal here.
    }

    /// If the zone manager is dirty, this tick is spent entirely on the
    /// zone recompute and no requests are served — recomputation takes
    /// priority over draining the queue. Returns the number of requests
    /// actually served.
    pub fn process(&mut self, zones: &mut crate::grid::CellGrid, zone_manager: &mut ZoneManager, pool: &CellInfoPool, handler: &mut dyn PathRequestHandler, block_size: usize) -> usize {
        if zone_manager.is_dirty() {
            zone_manager.calculate_zones(zones, pool, block_size);
            return 0;
        }

        let mut cells_spent: u32 = 0;
        let mut served = 0;
        while cells_spent < DEFAULT_CELL_BUDGET {
            let Some(entity) = self.order.pop_front() else {
                break;
            };
            if !self.pending.remove(&entity) {
                continue; // stale: cancelled since it was enqueued
            }
            if let Some(cells) = handler.serve(entity) {
                cells_spent += cells;
                served += 1;
            }
        }
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::{FixedNum, FixedVec2};
    use crate::grid::CellGrid;

    struct CountingHandler {
        cost_per_request: u32,
        served: Vec<EntityId>,
    }
    impl PathRequestHandler for CountingHandler {
        fn serve(&mut self, entity: EntityId) -> Option<u32> {
            self.served.push(entity);
            Some(self.cost_per_request)
        }
    }

    #[test]
    fn duplicate_enqueue_is_a_no_op() {
        let mut queue = RequestQueue::new(16);
        queue.queue_for_path(EntityId(1));
        queue.queue_for_path(EntityId(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn process_drains_fifo_order_under_budget() {
        let mut queue = RequestQueue::new(16);
        for id in 1..=3 {
            queue.queue_for_path(EntityId(id));
        }
        let mut grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = CellInfoPool::new(100);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        let mut handler = CountingHandler { cost_per_request: 10, served: Vec::new() };
        let served = queue.process(&mut grid, &mut zones, &pool, &mut handler, 5);
        assert_eq!(served, 3);
        assert_eq!(handler.served, vec![EntityId(1), EntityId(2), EntityId(3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn dirty_zones_stall_the_tick_instead_of_serving_requests() {
        let mut queue = RequestQueue::new(16);
        queue.queue_for_path(EntityId(1));
        let mut grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = CellInfoPool::new(100);
        let mut zones = ZoneManager::new(); // starts dirty
        let mut handler = CountingHandler { cost_per_request: 10, served: Vec::new() };
        let served = queue.process(&mut grid, &mut zones, &pool, &mut handler, 5);
        assert_eq!(served, 0);
        assert_eq!(queue.len(), 1);
        assert!(!zones.is_dirty());
    }

    #[test]
    fn cancelled_request_is_skipped_without_being_served() {
        let mut queue = RequestQueue::new(16);
        queue.queue_for_path(EntityId(1));
        queue.queue_for_path(EntityId(2));
        queue.cancel(EntityId(1));
        let mut grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = CellInfoPool::new(100);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        let mut handler = CountingHandler { cost_per_request: 10, served: Vec::new() };
        queue.process(&mut grid, &mut zones, &pool, &mut handler, 5);
        assert_eq!(handler.served, vec![EntityId(2)]);
    }

    #[test]
    fn budget_exhaustion_leaves_remaining_requests_queued() {
        let mut queue = RequestQueue::new(1000);
        for id in 1..=600 {
            queue.queue_for_path(EntityId(id));
        }
        let mut grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = CellInfoPool::new(100);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        let mut handler = CountingHandler { cost_per_request: 10, served: Vec::new() };
        let served = queue.process(&mut grid, &mut zones, &pool, &mut handler, 5);
        assert_eq!(served, 500); // 5000 / 10
        assert_eq!(queue.len(), 100);
    }
}
