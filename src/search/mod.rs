//! Search variant dispatchers. Each variant adapts
//! `astar::search`/`search_with_goal_test` with a different cost budget,
//! success predicate, and fallback behaviour.

mod hierarchical;

pub use hierarchical::find_hierarchical_path;

use crate::astar::{self, NodeRef, SearchOutcome, SearchParams, ATTACK_PATH_BUDGET, DEFAULT_BUDGET, PATCH_PATH_BUDGET};
use crate::fixed_math::{FixedNum, FixedVec2};
use crate::grid::{CellGrid, CellType};
use crate::occupancy::{self, OccupancyState};
use crate::path::PathObject;
use crate::pool::CellInfoPool;
use crate::zone::{Mobility, ZoneManager};

/// Full A* search, pre-filtered by zone equality.
pub fn find_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, goal: NodeRef, params: &SearchParams) -> Option<PathObject> {
    if !zones.reachable(grid, start.layer, (start.x, start.y), goal.layer, (goal.x, goal.y), params.mobility, params.is_crusher) {
        return None;
    }
    if !find_hierarchical_path(zones, start, goal) {
        return None;
    }
    match astar::search(grid, zones, pool, start, goal, params) {
        SearchOutcome::Found(chain) => {
            let mut path = PathObject::from_search_chain(grid, &chain);
            path.optimize(grid, params.mobility.ground);
            Some(path)
        }
        _ => None,
    }
}

/// Every candidate cell must sustain a clear run of `diameter` cells; on
/// failure the formation shrinks by 2 and retries.
pub fn find_ground_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, goal: NodeRef, params: &SearchParams, mut diameter: u32) -> Option<(PathObject, u32)> {
    while diameter >= 1 {
        if clear_cell_for_diameter(grid, goal, diameter) {
            if let Some(path) = find_path(grid, zones, pool, start, goal, params) {
                return Some((path, diameter));
            }
        }
        if diameter <= 2 {
            break;
        }
        diameter -= 2;
    }
    None
}

fn clear_cell_for_diameter(grid: &CellGrid, center: NodeRef, diameter: u32) -> bool {
    let half = (diameter / 2) as i32;
    for dy in -half..=half {
        for dx in -half..=half {
            let x = center.x as i32 + dx;
            let y = center.y as i32 + dy;
            if x < 0 || y < 0 {
                return false;
            }
            match grid.cell(center.layer, x as usize, y as usize) {
                Some(cell) if cell.cell_type.is_base_walkable() => {}
                _ => return false,
            }
        }
    }
    true
}

/// Success is "within weapon range of the victim's cell AND
/// line-of-sight", skipping the attacker's own starting cell.
pub fn find_attack_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, victim: NodeRef, weapon_range_cells: FixedNum, params: &SearchParams) -> Option<PathObject> {
    let attack_params = SearchParams {
        budget: ATTACK_PATH_BUDGET,
        attack_distance: Some((weapon_range_cells.to_num::<f64>() * 10.0) as u32),
        ..clone_params(params)
    };
    let range_sq = weapon_range_cells * weapon_range_cells;

    let outcome = astar::search_with_goal_test(grid, zones, pool, start, victim, &attack_params, |node, grid, _pool| {
        if node.x == start.x && node.y == start.y && node.layer == start.layer {
            return false;
        }
        let dx = FixedNum::from_num(node.x as i32 - victim.x as i32);
        let dy = FixedNum::from_num(node.y as i32 - victim.y as i32);
        if dx * dx + dy * dy > range_sq {
            return false;
        }
        has_cell_line_of_sight(grid, node, victim)
    });

    match outcome {
        SearchOutcome::Found(chain) => {
            let mut path = PathObject::from_search_chain(grid, &chain);
            path.optimize(grid, params.mobility.ground);
            Some(path)
        }
        _ => None,
    }
}

fn has_cell_line_of_sight(grid: &CellGrid, a: NodeRef, b: NodeRef) -> bool {
    use crate::path::is_line_passable;
    let fake_a = crate::path::PathNode {
        layer: a.layer,
        x: a.x,
        y: a.y,
        world: FixedVec2::ZERO,
        next_optimized: 0,
    };
    let fake_b = crate::path::PathNode {
        layer: b.layer,
        x: b.x,
        y: b.y,
        world: FixedVec2::ZERO,
        next_optimized: 0,
    };
    is_line_passable(grid, &fake_a, &fake_b)
}

/// Success is "far enough from every repulsor point"; an improving
/// intermediate cell is returned when the budget runs out before a fully
/// safe cell is found.
pub fn find_safe_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, repulsors: &[FixedVec2], min_distance: FixedNum, params: &SearchParams) -> Option<PathObject> {
    let safe_params = SearchParams {
        budget: DEFAULT_BUDGET,
        allow_closest_ok: true,
        ..clone_params(params)
    };
    let min_distance_sq = min_distance * min_distance;

    let outcome = astar::search_with_goal_test(grid, zones, pool, start, start, &safe_params, |node, grid, _pool| {
        let Some(center) = grid.cell_center(node.layer, node.x, node.y) else {
            return false;
        };
        repulsors.iter().all(|r| (center - *r).length_squared() >= min_distance_sq)
    });

    match outcome {
        SearchOutcome::Found(chain) | SearchOutcome::ClosestViable(chain) => {
            let mut path = PathObject::from_search_chain(grid, &chain);
            path.optimize(grid, params.mobility.ground);
            Some(path)
        }
        SearchOutcome::NotFound => None,
    }
}

/// Like `find_path`, but if the goal is zoned-unreachable this still
/// returns the best approximation instead of `None`.
pub fn find_closest_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, goal: NodeRef, params: &SearchParams) -> Option<PathObject> {
    let closest_params = SearchParams {
        allow_closest_ok: true,
        ..clone_params(params)
    };
    match astar::search(grid, zones, pool, start, goal, &closest_params) {
        SearchOutcome::Found(chain) | SearchOutcome::ClosestViable(chain) => {
            let mut path = PathObject::from_search_chain(grid, &chain);
            path.optimize(grid, params.mobility.ground);
            Some(path)
        }
        SearchOutcome::NotFound => None,
    }
}

/// Walk the existing optimised path backwards from its end to find the
/// closest node still reachable from `current`, then run A* from there.
pub fn patch_path(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, current: NodeRef, existing: &PathObject, params: &SearchParams) -> Option<PathObject> {
    let patch_params = SearchParams {
        budget: PATCH_PATH_BUDGET,
        ..clone_params(params)
    };
    for node in existing.nodes.iter().rev() {
        let anchor = NodeRef::new(node.layer, node.x, node.y);
        match astar::search(grid, zones, pool, current, anchor, &patch_params) {
            SearchOutcome::Found(chain) => {
                let mut path = PathObject::from_search_chain(grid, &chain);
                path.optimize(grid, params.mobility.ground);
                return Some(path);
            }
            _ => continue,
        }
    }
    None
}

/// Finds a nearby clear cell whose footprint doesn't intersect either
/// path, by spiralling outward from `from`.
pub fn find_move_away_path(grid: &CellGrid, from: NodeRef, path1: &PathObject, path2: &PathObject, max_radius: i32) -> Option<NodeRef> {
    spiral_search(grid, from, max_radius, |candidate| {
        let occupied = grid.cell(candidate.layer, candidate.x, candidate.y).map(|c| c.cell_type.is_base_walkable()).unwrap_or(false);
        occupied && !node_on_path(path1, candidate) && !node_on_path(path2, candidate)
    })
}

fn node_on_path(path: &PathObject, node: NodeRef) -> bool {
    path.nodes.iter().any(|n| n.layer == node.layer && n.x == node.x && n.y == node.y)
}

/// Looks for a destroyed bridge layer whose two ramp cells sit in zones A
/// and B respectively (in either order), by reading each bridge's
/// declared start/end cells back against the ground layer's own zone
/// numbers, which survive bridge destruction even though
/// `connects_to_layer` is cleared.
pub fn find_broken_bridge(grid: &CellGrid, zones: &ZoneManager, mobility: Mobility, is_crusher: bool, a: NodeRef, b: NodeRef) -> Option<u16> {
    let cell_a = grid.cell(a.layer, a.x, a.y)?;
    let cell_b = grid.cell(b.layer, b.x, b.y)?;
    let zone_a = zones.effective_zone(mobility, is_crusher, cell_a.zone);
    let zone_b = zones.effective_zone(mobility, is_crusher, cell_b.zone);

    for (&id, layer) in grid.layers.bridges.iter() {
        if !layer.destroyed {
            continue;
        }
        let (Some(start), Some(end)) = (layer.start_cell, layer.end_cell) else {
            continue;
        };
        let (sx, sy) = layer.local_to_ground(start.0, start.1);
        let (ex, ey) = layer.local_to_ground(end.0, end.1);
        if sx < 0 || sy < 0 || ex < 0 || ey < 0 {
            continue;
        }
        let (Some(start_ground), Some(end_ground)) = (grid.layers.ground.get(sx as usize, sy as usize), grid.layers.ground.get(ex as usize, ey as usize)) else {
            continue;
        };
        let start_zone = zones.effective_zone(mobility, is_crusher, start_ground.zone);
        let end_zone = zones.effective_zone(mobility, is_crusher, end_ground.zone);
        if (start_zone == zone_a && end_zone == zone_b) || (start_zone == zone_b && end_zone == zone_a) {
            return Some(id);
        }
    }
    None
}

/// Mode for the destination-adjustment family: plain ground placement, a
/// landing spot for an airborne transport, or a generic "closest possible"
/// relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustMode {
    Destination,
    LandingDestination,
    PossibleDestination,
}

/// Spiral search from the requested destination; returns the first cell
/// whose occupancy check passes and which is same-zone reachable from
/// `reference`.
pub fn adjust_destination(grid: &CellGrid, zones: &ZoneManager, pool: &CellInfoPool, requested: NodeRef, reference: NodeRef, mode: AdjustMode, mobility: crate::zone::Mobility, is_crusher: bool, max_radius: i32) -> Option<NodeRef> {
    spiral_search(grid, requested, max_radius, |candidate| {
        let Some(cell) = grid.cell(candidate.layer, candidate.x, candidate.y) else {
            return false;
        };
        if !cell.cell_type.is_base_walkable() {
            return false;
        }
        if mode == AdjustMode::LandingDestination && cell.cell_type == CellType::Water {
            return false;
        }
        let state = occupancy::state_at(grid, pool, candidate.layer, candidate.x, candidate.y);
        if matches!(state, OccupancyState::PresentFixed | OccupancyState::GoalOtherMoving) {
            return false;
        }
        zones.reachable(grid, reference.layer, (reference.x, reference.y), candidate.layer, (candidate.x, candidate.y), mobility, is_crusher)
    })
}

/// Square-ring spiral outward from `center` up to `max_radius`, testing
/// each cell with `accept` (used by scatter-on-exit, adjustDestination,
/// and getMoveAwayFromPath).
pub fn spiral_search(grid: &CellGrid, center: NodeRef, max_radius: i32, mut accept: impl FnMut(NodeRef) -> bool) -> Option<NodeRef> {
    let candidate = center;
    if in_bounds(grid, candidate) && accept(candidate) {
        return Some(candidate);
    }
    for radius in 1..=max_radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue; // only the ring border at this radius
                }
                let x = center.x as i32 + dx;
                let y = center.y as i32 + dy;
                if x < 0 || y < 0 {
                    continue;
                }
                let candidate = NodeRef::new(center.layer, x as usize, y as usize);
                if in_bounds(grid, candidate) && accept(candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

fn in_bounds(grid: &CellGrid, node: NodeRef) -> bool {
    grid.cell(node.layer, node.x, node.y).is_some()
}

fn clone_params<'a>(params: &SearchParams<'a>) -> SearchParams<'a> {
    SearchParams {
        entity: params.entity,
        mobility: params.mobility,
        is_crusher: params.is_crusher,
        can_path_through_units: params.can_path_through_units,
        downhill_only: params.downhill_only,
        attack_distance: params.attack_distance,
        budget: params.budget,
        allow_closest_ok: params.allow_closest_ok,
        entities: params.entities,
        terrain: params.terrain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::FixedVec2;
    use crate::ids::{EntityId, LayerId};
    use crate::interop::{EntityQuery, GeometryInfo, Relationship, TerrainQuery};
    use crate::zone::Mobility;

    struct NoEntities;
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

    fn flat_setup(w: usize, h: usize) -> (CellGrid, ZoneManager, CellInfoPool) {
        let mut grid = CellGrid::new(w, h, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = CellInfoPool::new(2000);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        (grid, zones, pool)
    }

    #[test]
    fn find_path_returns_direct_route_on_open_ground() {
        let (mut grid, zones, mut pool) = flat_setup(20, 20);
        let entities = NoEntities;
        let terrain = FlatTerrain;
        let params = SearchParams {
            entity: EntityId(1),
            mobility: Mobility::ground(),
            is_crusher: false,
            can_path_through_units: false,
            downhill_only: false,
            attack_distance: None,
            budget: DEFAULT_BUDGET,
            allow_closest_ok: false,
            entities: &entities,
            terrain: &terrain,
        };
        let start = NodeRef::new(LayerId::Ground, 0, 0);
        let goal = NodeRef::new(LayerId::Ground, 12, 0);
        let path = find_path(&mut grid, &zones, &mut pool, start, goal, &params).expect("path expected");
        assert_eq!(path.last().unwrap().x, 12);
    }

    #[test]
    fn adjust_destination_finds_nearby_clear_cell_when_requested_is_blocked() {
        let (mut grid, zones, pool) = flat_setup(10, 10);
        let idx = grid.layers.ground.index(5, 5);
        grid.layers.ground.cells[idx].cell_type = CellType::Impassable;
        let requested = NodeRef::new(LayerId::Ground, 5, 5);
        let reference = NodeRef::new(LayerId::Ground, 0, 0);
        let result = adjust_destination(&grid, &zones, &pool, requested, reference, AdjustMode::Destination, Mobility::ground(), false, 3).unwrap();
        assert_ne!((result.x, result.y), (5, 5));
    }

    #[test]
    fn find_broken_bridge_matches_ramp_zones_and_clears_after_repair() {
        use crate::grid::classify_bridge_layer;

        // Two ground strips separated by a water channel at y in [5,6],
        // joined by a single bridge layer spanning y in [4,7] at x in [4,6)
        // so its ramp cells land on each shore rather than in the water.
        let mut grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        for x in 0..10 {
            for y in 5..7 {
                let idx = grid.layers.ground.index(x, y);
                grid.layers.ground.cells[idx].cell_type = CellType::Water;
            }
        }
        let bridge_id = grid.layers.add_bridge_layer(2, 4, (4, 4));
        classify_bridge_layer(&mut grid, bridge_id, |_| true, (0, 0), (0, 3));

        let pool = CellInfoPool::new(2000);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);

        let north = NodeRef::new(LayerId::Ground, 4, 0);
        let south = NodeRef::new(LayerId::Ground, 4, 9);
        assert!(find_broken_bridge(&grid, &zones, Mobility::ground(), false, north, south).is_none());

        let LayerId::Bridge(raw_id) = bridge_id else { unreachable!() };
        grid.layers.destroy_bridge(raw_id);
        zones.mark_dirty();
        zones.calculate_zones(&mut grid, &pool, 5);

        let found = find_broken_bridge(&grid, &zones, Mobility::ground(), false, north, south).expect("broken bridge expected");
        assert_eq!(found, raw_id);

        // Repair: reclassify the bridge layer and recompute zones, then the
        // broken-bridge query must no longer find it.
        grid.layers.layer_mut(bridge_id).unwrap().destroyed = false;
        classify_bridge_layer(&mut grid, bridge_id, |_| true, (0, 0), (0, 3));
        zones.mark_dirty();
        zones.calculate_zones(&mut grid, &pool, 5);
        assert!(find_broken_bridge(&grid, &zones, Mobility::ground(), false, north, south).is_none());
    }
}
