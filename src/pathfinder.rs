//! `Pathfinder`: the process-wide singleton tying the grid, zones, pool,
//! request queue, and locomotor templates together, with the lifecycle
//! `init -> new_map (classify + zones) -> per-tick update -> reset ->
//! teardown`.

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::grid::{classify_map_cells, classify_wall_layer, CellGrid, WallPiece};
use crate::ids::{EntityId, ObstacleId};
use crate::interop::TerrainQuery;
use crate::locomotor::LocomotorStore;
use crate::pool::CellInfoPool;
use crate::queue::{PathRequestHandler, RequestQueue};
use crate::save::PathfinderSave;
use crate::zone::ZoneManager;

pub const DEFAULT_POOL_CAPACITY: usize = 30_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_BLOCK_SIZE: usize = 16;

/// Holds everything a tick of movement/pathfinding touches. Nothing here is
/// actually a language-level global — "process-wide singleton" describes
/// how one instance is used in practice, not a constraint this type
/// enforces; tests freely build several.
pub struct Pathfinder {
    pub grid: CellGrid,
    pub zones: ZoneManager,
    pub pool: CellInfoPool,
    pub queue: RequestQueue,
    pub locomotors: LocomotorStore,
    map_ready: bool,
    tunneling: bool,
    ignored_obstacle_id: Option<ObstacleId>,
    /// Ordered wall-piece ids, indexed by position.
    wall_piece_ids: Vec<u32>,
    wall_height: FixedNum,
    cumulative_cell_counter: u64,
    block_size: usize,
}

/// Wraps a caller's handler so `update` can tally the cells each served
/// request actually examined into the save-visible cumulative counter,
/// without `RequestQueue::process` needing to expose that total itself.
struct CellCounter<'a> {
    inner: &'a mut dyn PathRequestHandler,
    total: u32,
}

impl PathRequestHandler for CellCounter<'_> {
    fn serve(&mut self, entity: EntityId) -> Option<u32> {
        let cells = self.inner.serve(entity);
        if let Some(c) = cells {
            self.total += c;
        }
        cells
    }
}

impl Pathfinder {
    /// Allocate the grid and supporting pools; the map is not yet
    /// classified.
    pub fn init(width: usize, height: usize, cell_size: FixedNum, world_origin: FixedVec2) -> Self {
        Self {
            grid: CellGrid::new(width, height, cell_size, world_origin),
            zones: ZoneManager::new(),
            pool: CellInfoPool::new(DEFAULT_POOL_CAPACITY),
            queue: RequestQueue::new(DEFAULT_QUEUE_CAPACITY),
            locomotors: LocomotorStore::new(),
            map_ready: false,
            tunneling: false,
            ignored_obstacle_id: None,
            wall_piece_ids: Vec::new(),
            wall_height: FixedNum::ZERO,
            cumulative_cell_counter: 0,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Classify terrain and the wall layer (if any pieces are supplied),
    /// then run the first zone calculation.
    pub fn new_map(&mut self, terrain: &dyn TerrainQuery, wall_pieces: &[WallPiece]) {
        classify_map_cells(&mut self.grid, terrain);
        if !wall_pieces.is_empty() {
            classify_wall_layer(&mut self.grid, wall_pieces);
        }
        self.zones.calculate_zones(&mut self.grid, &self.pool, self.block_size);
        self.map_ready = true;
    }

    pub fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn set_tunneling(&mut self, tunneling: bool) {
        self.tunneling = tunneling;
    }

    pub fn is_tunneling(&self) -> bool {
        self.tunneling
    }

    pub fn set_ignored_obstacle(&mut self, id: Option<ObstacleId>) {
        self.ignored_obstacle_id = id;
    }

    pub fn ignored_obstacle(&self) -> Option<ObstacleId> {
        self.ignored_obstacle_id
    }

    pub fn set_wall_pieces(&mut self, ids: Vec<u32>, height: FixedNum) {
        self.wall_piece_ids = ids;
        self.wall_height = height;
    }

    pub fn wall_piece_ids(&self) -> &[u32] {
        &self.wall_piece_ids
    }

    pub fn wall_height(&self) -> FixedNum {
        self.wall_height
    }

    pub fn cumulative_cell_counter(&self) -> u64 {
        self.cumulative_cell_counter
    }

    /// Lets a caller outside `update`'s queue-drain path (e.g. a direct,
    /// non-queued `find_path` call) fold its examined-cell count into the
    /// same save-visible counter.
    pub fn record_cells_examined(&mut self, cells: u32) {
        self.cumulative_cell_counter += cells as u64;
    }

    /// Per-tick update: drains the request queue under its cell budget,
    /// tallying every served request's examined-cell count into the
    /// save-visible cumulative counter.
    pub fn update(&mut self, handler: &mut dyn PathRequestHandler) -> usize {
        let mut counter = CellCounter { inner: handler, total: 0 };
        let served = self.queue.process(&mut self.grid, &mut self.zones, &self.pool, &mut counter, self.block_size);
        self.cumulative_cell_counter += counter.total as u64;
        served
    }

    /// Drop all search/occupancy scratch and the pending queue, but keep
    /// the classified grid and zones.
    pub fn reset(&mut self) {
        self.pool = CellInfoPool::new(self.pool.capacity());
        self.queue = RequestQueue::new(self.queue.capacity());
        self.tunneling = false;
        self.ignored_obstacle_id = None;
        self.cumulative_cell_counter = 0;
    }

    /// Release everything; consumes `self` since there is nothing
    /// meaningful left to call on it afterward.
    pub fn teardown(self) {}

    /// Snapshot the persisted fields. The classified grid itself is not
    /// part of the snapshot — it is
    /// deterministic from terrain plus whatever obstacles the save system
    /// restores separately, so `new_map` is expected to run again before
    /// `restore_from_save`.
    pub fn to_save(&self) -> PathfinderSave {
        PathfinderSave {
            version: crate::save::PATHFINDER_SAVE_VERSION,
            extent: (self.grid.layers.ground.width, self.grid.layers.ground.height),
            map_ready: self.map_ready,
            tunneling: self.tunneling,
            ignored_obstacle_id: self.ignored_obstacle_id,
            request_queue: self.queue.pending_contents(),
            wall_piece_ids: self.wall_piece_ids.clone(),
            wall_height: self.wall_height,
            cumulative_cell_counter: self.cumulative_cell_counter,
        }
    }

    /// Restores flags, queue contents, wall-piece bookkeeping, and the
    /// cumulative counter from a snapshot. Assumes `self` already ran
    /// `new_map` against the same terrain this tick, so the classified grid
    /// matches `save.extent`.
    pub fn restore_from_save(&mut self, save: &PathfinderSave) {
        self.map_ready = save.map_ready;
        self.tunneling = save.tunneling;
        self.ignored_obstacle_id = save.ignored_obstacle_id;
        self.queue = RequestQueue::from_contents(self.queue.capacity(), save.request_queue.clone());
        self.wall_piece_ids = save.wall_piece_ids.clone();
        self.wall_height = save.wall_height;
        self.cumulative_cell_counter = save.cumulative_cell_counter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellType;
    use crate::ids::LayerId;

    struct FlatTerrain;
    impl TerrainQuery for FlatTerrain {
        fn layer_height(&self, _pos: FixedVec2, _layer: LayerId) -> FixedNum {
            FixedNum::ZERO
        }
        fn ground_height(&self, _pos: FixedVec2) -> FixedNum {
            FixedNum::ZERO
        }
        fn is_underwater(&self, _pos: FixedVec2) -> bool {
            false
        }
        fn is_cliff_cell(&self, _pos: FixedVec2) -> bool {
            false
        }
        fn layer_for_destination(&self, _pos: FixedVec2) -> LayerId {
            LayerId::Ground
        }
        fn highest_layer_for_destination(&self, _pos: FixedVec2, _only_healthy: bool) -> LayerId {
            LayerId::Ground
        }
        fn object_interacts_with_bridge(&self, _entity: EntityId, _layer: LayerId) -> bool {
            false
        }
    }

    struct OneShotHandler {
        cells: u32,
    }
    impl PathRequestHandler for OneShotHandler {
        fn serve(&mut self, _entity: EntityId) -> Option<u32> {
            Some(self.cells)
        }
    }

    #[test]
    fn new_map_classifies_and_computes_zones() {
        let mut pf = Pathfinder::init(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        assert!(!pf.is_map_ready());
        pf.new_map(&FlatTerrain, &[]);
        assert!(pf.is_map_ready());
        assert!(!pf.zones.is_dirty());
        assert_eq!(pf.grid.cell(LayerId::Ground, 0, 0).unwrap().cell_type, CellType::Clear);
    }

    #[test]
    fn update_drains_queue_and_tallies_cumulative_counter() {
        let mut pf = Pathfinder::init(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        pf.new_map(&FlatTerrain, &[]);
        pf.queue.queue_for_path(EntityId(1));
        pf.queue.queue_for_path(EntityId(2));
        let mut handler = OneShotHandler { cells: 40 };
        let served = pf.update(&mut handler);
        assert_eq!(served, 2);
        assert_eq!(pf.cumulative_cell_counter(), 80);
    }

    #[test]
    fn reset_clears_scratch_but_keeps_classified_grid() {
        let mut pf = Pathfinder::init(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        pf.new_map(&FlatTerrain, &[]);
        pf.set_tunneling(true);
        pf.queue.queue_for_path(EntityId(1));
        pf.reset();
        assert!(!pf.is_tunneling());
        assert!(pf.queue.is_empty());
        assert!(pf.is_map_ready()); // grid/zones survive reset
    }

    #[test]
    fn save_round_trip_restores_flags_and_queue() {
        let mut pf = Pathfinder::init(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        pf.new_map(&FlatTerrain, &[]);
        pf.set_tunneling(true);
        pf.set_ignored_obstacle(Some(ObstacleId(3)));
        pf.set_wall_pieces(vec![9, 2, 7], FixedNum::from_num(4));
        pf.queue.queue_for_path(EntityId(5));
        pf.record_cells_examined(123);

        let save = pf.to_save();
        let bytes = crate::save::encode_pathfinder(&save).unwrap();
        let decoded = crate::save::decode_pathfinder(&bytes).unwrap();

        let mut restored = Pathfinder::init(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        restored.new_map(&FlatTerrain, &[]);
        restored.restore_from_save(&decoded);

        assert!(restored.is_tunneling());
        assert_eq!(restored.ignored_obstacle(), Some(ObstacleId(3)));
        assert_eq!(restored.wall_piece_ids(), &[9, 2, 7]);
        assert_eq!(restored.cumulative_cell_counter(), 123);
        assert_eq!(restored.queue.len(), 1);
    }
}
