//! Grid A* search.

mod cost;
mod open_list;

pub use cost::{attack_adjusted_heuristic, heuristic, turn_penalty, COST_DIAGONAL, COST_ORTHOGONAL};

use open_list::OpenList;

use crate::grid::{Cell, CellGrid, CellType};
use crate::ids::{EntityId, LayerId};
use crate::interop::{EntityQuery, Relationship, TerrainQuery};
use crate::occupancy::{self, OccupancyState};
use crate::pool::{CellInfoPool, InfoIndex};
use crate::zone::{Mobility, ZoneManager};

/// Cell-budget variants: `find_ground_path`/`find_path` use the default,
/// tighter searches clamp lower.
pub const DEFAULT_BUDGET: u32 = 5000;
pub const ATTACK_PATH_BUDGET: u32 = 2000;
pub const PATCH_PATH_BUDGET: u32 = 2500;
pub const ADJUST_DESTINATION_BUDGET: u32 = 500;

#[derive(Clone, Copy, Debug)]
pub struct NodeRef {
    pub layer: LayerId,
    pub x: usize,
    pub y: usize,
}

impl NodeRef {
    pub fn new(layer: LayerId, x: usize, y: usize) -> Self {
        Self { layer, x, y }
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.layer == other.layer && self.x == other.x && self.y == other.y
    }
}
impl Eq for NodeRef {}

/// Per-search parameters.
pub struct SearchParams<'a> {
    pub entity: EntityId,
    pub mobility: Mobility,
    pub is_crusher: bool,
    pub can_path_through_units: bool,
    pub downhill_only: bool,
    pub attack_distance: Option<u32>,
    pub budget: u32,
    pub allow_closest_ok: bool,
    pub entities: &'a dyn EntityQuery,
    pub terrain: &'a dyn TerrainQuery,
}

pub enum SearchOutcome {
    Found(Vec<NodeRef>),
    ClosestViable(Vec<NodeRef>),
    NotFound,
}

/// Entry in the closed set kept for the Manhattan-distance "closest viable
/// cell" fallback used when a search exhausts its budget without reaching
/// the goal.
struct ClosestTracker {
    best_idx: Option<InfoIndex>,
    best_key: (u32, u32), // (manhattan distance to goal, cost so far)
}

impl ClosestTracker {
    fn new() -> Self {
        Self {
            best_idx: None,
            best_key: (u32::MAX, u32::MAX),
        }
    }

    fn consider(&mut self, idx: InfoIndex, manhattan: u32, cost: u32) {
        let key = (manhattan, cost);
        if key < self.best_key {
            self.best_key = key;
            self.best_idx = Some(idx);
        }
    }
}

/// A crusher may step onto an `Obstacle` cell that's flagged as a fence,
/// in addition to the existing tunnel-out allowance.
fn cell_walkable(cell: &Cell, pool: &CellInfoPool, mobility: Mobility, is_crusher: bool, tunneling: bool) -> bool {
    match cell.cell_type {
        CellType::Clear => true,
        CellType::Water => mobility.water,
        CellType::Cliff => mobility.cliff,
        CellType::Rubble => mobility.rubble,
        CellType::Obstacle => {
            let is_fence = cell.info.map(|idx| pool.get(idx).obstacle_is_fence).unwrap_or(false);
            tunneling || (is_crusher && is_fence)
        }
        CellType::Impassable => false,
    }
}

const NEIGHBOR_STEPS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Allocate (or reuse) a cell's pool slot and reset it to a fresh search
/// node, preserving any existing occupancy/obstacle claims already on it.
fn open_node(grid: &mut CellGrid, pool: &mut CellInfoPool, node: NodeRef) -> Option<InfoIndex> {
    let cell = grid.cell_mut(node.layer, node.x, node.y)?;
    let idx = match cell.info {
        Some(idx) => idx,
        None => {
            let idx = pool.allocate()?;
            cell.info = Some(idx);
            idx
        }
    };
    let info = pool.get_mut(idx);
    info.pos = (node.x as i32, node.y as i32);
    info.layer = node.layer;
    Some(idx)
}

/// Enemies always block; neutrals/allies cost the moving-ally penalty.
fn ally_cost(entities: &dyn EntityQuery, mover: EntityId, occupant: EntityId) -> Option<u32> {
    match entities.relationship(mover, occupant) {
        Relationship::Enemies => None,
        Relationship::Neutral | Relationship::Allies => Some(cost::ALLY_MOVING_PENALTY),
    }
}

/// Cost/blocked decision for moving onto `neighbor`, folding in occupancy.
/// A moving ally always costs the ally penalty; a fixed ally only costs
/// anything (the same penalty, since at most one entity occupies a cell
/// here) when the mover can path through units at all — otherwise it
/// blocks outright, friend or foe.
fn occupancy_penalty(
    grid: &CellGrid,
    pool: &CellInfoPool,
    node: NodeRef,
    entities: &dyn EntityQuery,
    mover: EntityId,
    can_path_through_units: bool,
) -> Option<u32> {
    let state = occupancy::state_at(grid, pool, node.layer, node.x, node.y);
    match state {
        OccupancyState::None | OccupancyState::Goal => Some(0),
        OccupancyState::PresentMoving => {
            let occupant = grid.cell(node.layer, node.x, node.y).and_then(|c| c.info).and_then(|idx| pool.get(idx).pos_unit_id)?;
            ally_cost(entities, mover, occupant)
        }
        OccupancyState::PresentFixed | OccupancyState::GoalOtherMoving => {
            if !can_path_through_units {
                return None;
            }
            let occupant = grid
                .cell(node.layer, node.x, node.y)
                .and_then(|c| c.info)
                .and_then(|idx| pool.get(idx).pos_unit_id.or(pool.get(idx).goal_unit_id))?;
            ally_cost(entities, mover, occupant)
        }
    }
}

/// Run A* from `start` to `goal`. On success/closest-viable, returns the
/// raw parent-link chain from start to the terminal node (inclusive), not
/// yet optimised — see `path::optimize`.
pub fn search(grid: &mut CellGrid, zones: &ZoneManager, pool: &mut CellInfoPool, start: NodeRef, goal: NodeRef, params: &SearchParams) -> SearchOutcome {
    search_with_goal_test(grid, zones, pool, start, goal, params, |n, _g, _p| n.layer == goal.layer && n.x == goal.x && n.y == goal.y)
}

/// General form used by the `search` dispatcher variants whose success
/// condition isn't "reached this exact cell" — weapon range, safety
/// distance, and so on. `goal` still anchors the heuristic and the
/// Manhattan-distance closest-viable fallback.
pub fn search_with_goal_test(
    grid: &mut CellGrid,
    _zones: &ZoneManager,
    pool: &mut CellInfoPool,
    start: NodeRef,
    goal: NodeRef,
    params: &SearchParams,
    mut is_goal: impl FnMut(NodeRef, &CellGrid, &CellInfoPool) -> bool,
) -> SearchOutcome {
    let tunneling_start = grid
        .cell(start.layer, start.x, start.y)
        .map(|c| !cell_walkable(c, pool, params.mobility, params.is_crusher, false))
        .unwrap_or(true);

    let Some(start_idx) = open_node(grid, pool, start) else {
        return SearchOutcome::NotFound;
    };
    {
        let info = pool.get_mut(start_idx);
        info.cost_so_far = 0;
        info.total_cost = 0;
        info.parent = None;
    }

    let mut open = OpenList::default();
    open.insert(pool, start_idx);
    let mut closest = ClosestTracker::new();
    let mut cells_examined: u32 = 0;
    let mut tunneling = tunneling_start;

    loop {
        let Some(current_idx) = open.pop_front(pool) else {
            break;
        };
        pool.get_mut(current_idx).closed = true;
        cells_examined += 1;

        let current_pos = pool.get(current_idx).pos;
        let current_layer = pool.get(current_idx).layer;
        let current = NodeRef::new(current_layer, current_pos.0 as usize, current_pos.1 as usize);

        let manhattan = (current.x as i32 - goal.x as i32).unsigned_abs() + (current.y as i32 - goal.y as i32).unsigned_abs();
        closest.consider(current_idx, manhattan, pool.get(current_idx).cost_so_far);

        if is_goal(current, grid, pool) {
            return SearchOutcome::Found(reconstruct(pool, current_idx));
        }

        if tunneling {
            let still_obstacle = grid
                .cell(current.layer, current.x, current.y)
                .map(|c| c.cell_type == CellType::Obstacle)
                .unwrap_or(true);
            let pinched = grid.cell(current.layer, current.x, current.y).map(|c| c.pinched).unwrap_or(false);
            if !still_obstacle && !pinched {
                tunneling = false;
            }
        }

        if cells_examined > params.budget {
            break;
        }

        expand_neighbors(grid, pool, &mut open, current, current_idx, goal, params, tunneling);

        // A cell that connects to another layer (e.g. a bridge ramp) gets its
        // counterpart on that layer opened too, so the search can step across
        // the seam without treating it as a normal directional neighbor.
        if let Some(other_layer) = grid.cell(current.layer, current.x, current.y).and_then(|c| c.connects_to_layer) {
            if let Some(other_idx) = open_node(grid, pool, NodeRef::new(other_layer, current.x, current.y)) {
                let already_closed = pool.get(other_idx).closed;
                if !already_closed {
                    let cost_so_far = pool.get(current_idx).cost_so_far;
                    if cost_so_far < pool.get(other_idx).cost_so_far || pool.get(other_idx).parent.is_none() {
                        let h = heuristic(other_idx_dx(pool, other_idx, goal), other_idx_dy(pool, other_idx, goal));
                        let info = pool.get_mut(other_idx);
                        info.cost_so_far = cost_so_far;
                        info.total_cost = cost_so_far + h;
                        info.parent = Some(current_idx);
                        if info.open {
                            open.remove(pool, other_idx);
                        }
                        open.insert(pool, other_idx);
                    }
                }
            }
        }
    }

    if params.allow_closest_ok {
        if let Some(idx) = closest.best_idx {
            return SearchOutcome::ClosestViable(reconstruct(pool, idx));
        }
    }
    SearchOutcome::NotFound
}

fn other_idx_dx(pool: &CellInfoPool, idx: InfoIndex, goal: NodeRef) -> i32 {
    goal.x as i32 - pool.get(idx).pos.0
}
fn other_idx_dy(pool: &CellInfoPool, idx: InfoIndex, goal: NodeRef) -> i32 {
    goal.y as i32 - pool.get(idx).pos.1
}

#[allow(clippy::too_many_arguments)]
fn expand_neighbors(
    grid: &mut CellGrid,
    pool: &mut CellInfoPool,
    open: &mut OpenList,
    current: NodeRef,
    current_idx: InfoIndex,
    goal: NodeRef,
    params: &SearchParams,
    tunneling: bool,
) {
    let prev_step = pool
        .get(current_idx)
        .parent
        .map(|p| {
            let parent_pos = pool.get(p).pos;
            let cur_pos = pool.get(current_idx).pos;
            (
                (cur_pos.0 - parent_pos.0).signum(),
                (cur_pos.1 - parent_pos.1).signum(),
            )
        })
        .unwrap_or((0, 0));

    for &(dx, dy) in &NEIGHBOR_STEPS {
        let nx = current.x as i32 + dx;
        let ny = current.y as i32 + dy;
        if nx < 0 || ny < 0 {
            continue;
        }
        let neighbor = NodeRef::new(current.layer, nx as usize, ny as usize);

        let Some(neighbor_cell) = grid.cell(neighbor.layer, neighbor.x, neighbor.y) else {
            continue;
        };
        if !cell_walkable(neighbor_cell, pool, params.mobility, params.is_crusher, tunneling) {
            continue;
        }

        if dx != 0 && dy != 0 {
            // Corner-squeeze prevention: at least one flank must be open.
            let flank_a_x = current.x as i32 + dx;
            let flank_a = (flank_a_x >= 0)
                .then(|| grid.cell(current.layer, flank_a_x as usize, current.y))
                .flatten()
                .map(|c| cell_walkable(c, pool, params.mobility, params.is_crusher, tunneling))
                .unwrap_or(false);
            let flank_b_y = current.y as i32 + dy;
            let flank_b = (flank_b_y >= 0)
                .then(|| grid.cell(current.layer, current.x, flank_b_y as usize))
                .flatten()
                .map(|c| cell_walkable(c, pool, params.mobility, params.is_crusher, tunneling))
                .unwrap_or(false);
            if !flank_a && !flank_b {
                continue;
            }
        }

        if params.downhill_only {
            let here = grid.cell_center(current.layer, current.x, current.y);
            let there = grid.cell_center(neighbor.layer, neighbor.x, neighbor.y);
            if let (Some(here), Some(there)) = (here, there) {
                if params.terrain.ground_height(there) > params.terrain.ground_height(here) {
                    continue;
                }
            }
        }

        let Some(occ_penalty) = occupancy_penalty(grid, pool, neighbor, params.entities, params.entity, params.can_path_through_units) else {
            continue;
        };

        let step_cost = if dx != 0 && dy != 0 { cost::COST_DIAGONAL } else { cost::COST_ORTHOGONAL };
        let pinch_penalty = if grid.cell(neighbor.layer, neighbor.x, neighbor.y).map(|c| c.pinched).unwrap_or(false) {
            cost::COST_ORTHOGONAL
        } else {
            0
        };
        let turn = turn_penalty(if prev_step == (0, 0) { (dx, dy) } else { prev_step }, (dx, dy));
        let new_cost = pool.get(current_idx).cost_so_far + step_cost + pinch_penalty + turn + occ_penalty;

        let Some(neighbor_idx) = open_node(grid, pool, neighbor) else {
            continue;
        };
        if pool.get(neighbor_idx).closed {
            continue;
        }
        let better = pool.get(neighbor_idx).parent.is_none() || new_cost < pool.get(neighbor_idx).cost_so_far;
        if !better {
            continue;
        }

        // While tunneling out of an obstacle the goal is irrelevant; drive
        // purely by accumulated cost so the search heads for the nearest
        // open cell instead of in a beeline for a goal it can't see yet.
        let h = if tunneling {
            0
        } else {
            attack_adjusted_heuristic(goal.x as i32 - neighbor.x as i32, goal.y as i32 - neighbor.y as i32, params.attack_distance)
        };
        let was_open = pool.get(neighbor_idx).open;
        if was_open {
            open.remove(pool, neighbor_idx);
        }
        {
            let info = pool.get_mut(neighbor_idx);
            info.cost_so_far = new_cost;
            info.total_cost = new_cost + h;
            info.parent = Some(current_idx);
        }
        open.insert(pool, neighbor_idx);
    }
}

fn reconstruct(pool: &CellInfoPool, terminal: InfoIndex) -> Vec<NodeRef> {
    let mut chain = Vec::new();
    let mut cursor = Some(terminal);
    while let Some(idx) = cursor {
        let info = pool.get(idx);
        chain.push(NodeRef::new(info.layer, info.pos.0 as usize, info.pos.1 as usize));
        cursor = info.parent;
    }
    chain.reverse();
    chain
}

/// Release every pool slot this search touched that isn't otherwise
/// claimed (open/closed flags cleared first). Dispatchers call this after
/// extracting the result so a search never leaks pool capacity.
pub fn release_search_state(grid: &mut CellGrid, pool: &mut CellInfoPool, touched: &[NodeRef]) {
    for node in touched {
        if let Some(cell) = grid.cell_mut(node.layer, node.x, node.y) {
            if let Some(idx) = cell.info {
                let info = pool.get_mut(idx);
                info.open = false;
                info.closed = false;
                info.parent = None;
                if pool.release_if_unused(idx) {
                    cell.info = None;
                }
            }
        }
    }
}
