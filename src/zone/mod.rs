//! Terrain-flood zoning and per-mobility reachability equivalence.

mod block;
mod equivalence;
mod flood;

pub use block::{BlockId, ZoneBlock, ZoneBlockGrid};
pub use equivalence::{EquivalenceClass, Mobility};

use crate::grid::{CellGrid, CellType};
use crate::ids::LayerId;
use crate::pool::CellInfoPool;
use equivalence::EquivalenceTables;

/// Owns the per-mobility equivalence tables and the coarse `ZoneBlock` grid
/// used by the hierarchical search.
pub struct ZoneManager {
    tables: EquivalenceTables,
    pub blocks: ZoneBlockGrid,
    dirty: bool,
}

impl ZoneManager {
    pub fn new() -> Self {
        Self {
            tables: EquivalenceTables::default(),
            blocks: ZoneBlockGrid::new(0, 0, 0),
            dirty: true,
        }
    }

    /// Mark zones stale. Obstacle stamping/unstamping and bridge
    /// destruction call this.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Full recompute: flood-fill raw zones into the ground/bridge layers,
    /// derive the five equivalence arrays, then rebuild coarse blocks. Needs
    /// pool access to tell a crusher-crossable fence apart from a plain
    /// obstacle when building the crusher equivalence class.
    pub fn calculate_zones(&mut self, grid: &mut CellGrid, pool: &CellInfoPool, block_size: usize) {
        let raw_zone_count = flood::flood_fill_zones(grid);
        self.tables = equivalence::build_equivalence_tables(grid, pool, raw_zone_count);
        self.blocks = block::build_zone_blocks(grid, &self.tables, block_size);
        self.dirty = false;
    }

    /// Air short-circuits to the universal zone 1; ground+water+cliff also
    /// short-circuits to 1, matching the "universal-terrain" carve-out.
    pub fn effective_zone(&self, mobility: Mobility, is_crusher: bool, raw_zone: u16) -> u16 {
        if mobility.air || (mobility.ground && mobility.water && mobility.cliff) {
            return 1;
        }
        let class = EquivalenceClass::for_mobility(mobility, is_crusher);
        self.tables.canonical(class, raw_zone)
    }

    /// Zone reachability test used throughout `search`.
    pub fn reachable(&self, grid: &CellGrid, layer_a: LayerId, a: (usize, usize), layer_b: LayerId, b: (usize, usize), mobility: Mobility, is_crusher: bool) -> bool {
        let (Some(za), Some(zb)) = (grid.cell(layer_a, a.0, a.1), grid.cell(layer_b, b.0, b.1)) else {
            return false;
        };
        if za.cell_type == CellType::Obstacle || za.cell_type == CellType::Impassable {
            return false;
        }
        if zb.cell_type == CellType::Obstacle || zb.cell_type == CellType::Impassable {
            return false;
        }
        self.effective_zone(mobility, is_crusher, za.zone) == self.effective_zone(mobility, is_crusher, zb.zone)
    }
}

impl Default for ZoneManager {
    fn default() -> Self {
        Self::new()
    }
}
