//! Shared stub implementations of the `interop` traits for integration
//! tests, plus small grid-building helpers used across more than one
//! scenario file.

use pathcore::astar::{SearchParams, DEFAULT_BUDGET};
use pathcore::fixed_math::{FixedNum, FixedVec2};
use pathcore::grid::CellGrid;
use pathcore::ids::{EntityId, LayerId};
use pathcore::interop::{EntityQuery, GeometryInfo, Relationship, TerrainQuery};
use pathcore::pool::CellInfoPool;
use pathcore::zone::{Mobility, ZoneManager};

pub struct NoEntities;
impl EntityQuery for NoEntities {
    fn position(&self, _e: EntityId) -> FixedVec2 {
        FixedVec2::ZERO
    }
    fn set_position(&mut self, _e: EntityId, _pos: FixedVec2) {}
    fn orientation(&self, _e: EntityId) -> FixedNum {
        FixedNum::ZERO
    }
    fn set_orientation(&mut self, _e: EntityId, _angle: FixedNum) {}
    fn layer(&self, _e: EntityId) -> LayerId {
        LayerId::Ground
    }
    fn set_layer(&mut self, _e: EntityId, _layer: LayerId) {}
    fn destination_layer(&self, _e: EntityId) -> LayerId {
        LayerId::Ground
    }
    fn geometry(&self, _e: EntityId) -> GeometryInfo {
        GeometryInfo {
            bounding_radius: FixedNum::from_num(1),
            is_small: true,
            max_height_above_position: FixedNum::ZERO,
        }
    }
    fn relationship(&self, _from: EntityId, _to: EntityId) -> Relationship {
        Relationship::Neutral
    }
    fn crusher_level(&self, _e: EntityId) -> i32 {
        0
    }
    fn crushable_level(&self, _e: EntityId) -> i32 {
        0
    }
}

pub struct FlatTerrain;
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

/// A flat, fully-classified ground grid with zones already computed.
pub fn flat_world(w: usize, h: usize) -> (CellGrid, ZoneManager, CellInfoPool) {
    let mut grid = CellGrid::new(w, h, FixedNum::from_num(1), FixedVec2::ZERO);
    let pool = CellInfoPool::new(20_000);
    let mut zones = ZoneManager::new();
    zones.calculate_zones(&mut grid, &pool, 16);
    (grid, zones, pool)
}

pub fn ground_params<'a>(entities: &'a NoEntities, terrain: &'a FlatTerrain, entity: EntityId) -> SearchParams<'a> {
    SearchParams {
        entity,
        mobility: Mobility::ground(),
        is_crusher: false,
        can_path_through_units: false,
        downhill_only: false,
        attack_distance: None,
        budget: DEFAULT_BUDGET,
        allow_closest_ok: false,
        entities,
        terrain,
    }
}
