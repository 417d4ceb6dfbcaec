//! Five-state cell occupancy machine and position/goal radius stamping.
//!
//! The state is never stored directly: `{none, goal, present-moving,
//! present-fixed, goal+other-moving}` all fall out of whichever of
//! `pos_unit_id`/`goal_unit_id` a `CellInfo` currently carries, so
//! `set_goal`/`set_pos`/`clear_goal`/`clear_pos` only ever touch those two
//! fields and `derive_state` reconstructs the rest.

use smallvec::SmallVec;

use crate::grid::CellGrid;
use crate::ids::{EntityId, LayerId};
use crate::pool::{CellInfo, CellInfoPool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyState {
    None,
    Goal,
    PresentMoving,
    PresentFixed,
    GoalOtherMoving,
}

/// Reconstruct occupancy state from a `CellInfo`'s occupant fields.
pub fn derive_state(info: &CellInfo) -> OccupancyState {
    match (info.pos_unit_id, info.goal_unit_id) {
        (None, None) => OccupancyState::None,
        (None, Some(_)) => OccupancyState::Goal,
        (Some(_), None) => OccupancyState::PresentMoving,
        (Some(p), Some(g)) if p == g => OccupancyState::PresentFixed,
        (Some(_), Some(_)) => OccupancyState::GoalOtherMoving,
    }
}

/// Radius class controlling how many cells a position/goal stamp covers,
/// derived from an entity's bounding-circle diameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StampRadius {
    /// Fits entirely within one cell.
    Single,
    /// Straddles into the four orthogonal neighbours as well.
    Cross,
    /// Straddles a full 3x3 block (large vehicles/structures).
    Block,
}

impl StampRadius {
    pub fn from_diameter(diameter_cells: crate::fixed_math::FixedNum) -> Self {
        if diameter_cells <= crate::fixed_math::FixedNum::from_num(1) {
            StampRadius::Single
        } else if diameter_cells <= crate::fixed_math::FixedNum::from_num(2) {
            StampRadius::Cross
        } else {
            StampRadius::Block
        }
    }

    fn offsets(self) -> SmallVec<[(i32, i32); 9]> {
        match self {
            StampRadius::Single => SmallVec::from_slice(&[(0, 0)]),
            StampRadius::Cross => SmallVec::from_slice(&[(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)]),
            StampRadius::Block => SmallVec::from_slice(&[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (0, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ]),
        }
    }
}

fn claim_cell(grid: &mut CellGrid, pool: &mut CellInfoPool, layer: LayerId, x: usize, y: usize, entity: EntityId, as_goal: bool) {
    let Some(cell) = grid.cell_mut(layer, x, y) else { return };
    let idx = match cell.info {
        Some(idx) => idx,
        None => match pool.allocate() {
            Some(idx) => {
                cell.info = Some(idx);
                idx
            }
            None => return,
        },
    };
    let info = pool.get_mut(idx);
    if as_goal {
        info.goal_unit_id = Some(entity);
    } else {
        info.pos_unit_id = Some(entity);
    }
}

fn unclaim_cell(grid: &mut CellGrid, pool: &mut CellInfoPool, layer: LayerId, x: usize, y: usize, entity: EntityId, as_goal: bool) {
    let Some(cell) = grid.cell_mut(layer, x, y) else { return };
    let Some(idx) = cell.info else { return };
    let info = pool.get_mut(idx);
    let claimed_by_us = if as_goal { info.goal_unit_id == Some(entity) } else { info.pos_unit_id == Some(entity) };
    if !claimed_by_us {
        return;
    }
    if as_goal {
        info.goal_unit_id = None;
    } else {
        info.pos_unit_id = None;
    }
    if pool.release_if_unused(idx) {
        cell.info = None;
    }
}

fn stamp_cells(center: (usize, usize), radius: StampRadius) -> SmallVec<[(usize, usize); 9]> {
    radius
        .offsets()
        .into_iter()
        .filter_map(|(dx, dy)| {
            let x = center.0 as i32 + dx;
            let y = center.1 as i32 + dy;
            if x >= 0 && y >= 0 {
                Some((x as usize, y as usize))
            } else {
                None
            }
        })
        .collect()
}

/// Move an entity's position stamp from `old_cell` to `new_cell` on
/// `layer`, releasing the old radius first, then stamping the new one.
pub fn update_pos(
    grid: &mut CellGrid,
    pool: &mut CellInfoPool,
    layer: LayerId,
    entity: EntityId,
    old_cell: Option<(usize, usize)>,
    new_cell: (usize, usize),
    radius: StampRadius,
) {
    if let Some(old) = old_cell {
        for (x, y) in stamp_cells(old, radius) {
            unclaim_cell(grid, pool, layer, x, y, entity, false);
        }
    }
    for (x, y) in stamp_cells(new_cell, radius) {
        claim_cell(grid, pool, layer, x, y, entity, false);
    }
}

/// Analogous to `update_pos` for the final destination.
pub fn update_goal(
    grid: &mut CellGrid,
    pool: &mut CellInfoPool,
    layer: LayerId,
    entity: EntityId,
    old_cell: Option<(usize, usize)>,
    new_cell: Option<(usize, usize)>,
    radius: StampRadius,
) {
    if let Some(old) = old_cell {
        for (x, y) in stamp_cells(old, radius) {
            unclaim_cell(grid, pool, layer, x, y, entity, true);
        }
    }
    if let Some(new) = new_cell {
        for (x, y) in stamp_cells(new, radius) {
            claim_cell(grid, pool, layer, x, y, entity, true);
        }
    }
}

/// Query occupancy state at a single cell (e.g. for A*'s ally-cost rules).
pub fn state_at(grid: &CellGrid, pool: &CellInfoPool, layer: LayerId, x: usize, y: usize) -> OccupancyState {
    match grid.cell(layer, x, y).and_then(|c| c.info) {
        Some(idx) => derive_state(pool.get(idx)),
        None => OccupancyState::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::{FixedNum, FixedVec2};

    fn grid() -> CellGrid {
        CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO)
    }

    #[test]
    fn pos_then_goal_same_entity_is_present_fixed() {
        let mut grid = grid();
        let mut pool = CellInfoPool::new(100);
        let e = EntityId(1);
        update_pos(&mut grid, &mut pool, LayerId::Ground, e, None, (5, 5), StampRadius::Single);
        update_goal(&mut grid, &mut pool, LayerId::Ground, e, None, Some((5, 5)), StampRadius::Single);
        assert_eq!(state_at(&grid, &pool, LayerId::Ground, 5, 5), OccupancyState::PresentFixed);
    }

    #[test]
    fn pos_then_goal_other_entity_is_goal_other_moving() {
        let mut grid = grid();
        let mut pool = CellInfoPool::new(100);
        let a = EntityId(1);
        let b = EntityId(2);
        update_pos(&mut grid, &mut pool, LayerId::Ground, a, None, (5, 5), StampRadius::Single);
        update_goal(&mut grid, &mut pool, LayerId::Ground, b, None, Some((5, 5)), StampRadius::Single);
        assert_eq!(state_at(&grid, &pool, LayerId::Ground, 5, 5), OccupancyState::GoalOtherMoving);
    }

    #[test]
    fn clearing_pos_with_no_goal_returns_to_none_and_releases_slot() {
        let mut grid = grid();
        let mut pool = CellInfoPool::new(100);
        let e = EntityId(1);
        update_pos(&mut grid, &mut pool, LayerId::Ground, e, None, (5, 5), StampRadius::Single);
        update_pos(&mut grid, &mut pool, LayerId::Ground, e, Some((5, 5)), (6, 6), StampRadius::Single);
        assert_eq!(state_at(&grid, &pool, LayerId::Ground, 5, 5), OccupancyState::None);
        assert!(grid.cell(LayerId::Ground, 5, 5).unwrap().info.is_none());
        assert_eq!(pool.in_use(), 1);
    }
}
