//! Static obstacle stamping and pinch closure.

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::ids::{LayerId, ObstacleId};
use crate::pool::CellInfoPool;

use super::cell::CellType;
use super::layer::CellGrid;

/// Footprint shape of a static obstacle.
#[derive(Clone, Copy, Debug)]
pub enum ObstacleShape {
    /// Axis-aligned-in-its-own-frame box, walked at half-cell resolution
    /// along the rotated lattice.
    Box {
        half_extent_x: FixedNum,
        half_extent_y: FixedNum,
        cos_angle: FixedNum,
        sin_angle: FixedNum,
    },
    /// Cylinder/sphere footprint, stamped by a radius test.
    Cylinder { radius: FixedNum },
}

#[derive(Clone, Copy, Debug)]
pub struct ObstacleFootprint {
    pub id: ObstacleId,
    pub center: FixedVec2,
    pub shape: ObstacleShape,
    pub layer: LayerId,
    /// A fence is stamped as Obstacle but is crusher-crossable: a crusher
    /// can cross it, a non-crusher cannot.
    pub is_fence: bool,
}

fn cell_bounds(footprint: &ObstacleFootprint, cell_size: FixedNum) -> FixedNum {
    match footprint.shape {
        ObstacleShape::Box {
            half_extent_x,
            half_extent_y,
            ..
        } => half_extent_x.max(half_extent_y) + cell_size,
        ObstacleShape::Cylinder { radius } => radius + cell_size,
    }
}

fn point_in_footprint(footprint: &ObstacleFootprint, p: FixedVec2) -> bool {
    match footprint.shape {
        ObstacleShape::Box {
            half_extent_x,
            half_extent_y,
            cos_angle,
            sin_angle,
        } => {
            let d = p - footprint.center;
            let local_x = d.x * cos_angle + d.y * sin_angle;
            let local_y = -d.x * sin_angle + d.y * cos_angle;
            local_x.abs() <= half_extent_x && local_y.abs() <= half_extent_y
        }
        ObstacleShape::Cylinder { radius } => (p - footprint.center).length_squared() <= radius * radius,
    }
}

/// Cells covered by a footprint, found by walking a rotated lattice at
/// half-cell step over the shape's bounding box.
fn footprint_cells(grid: &CellGrid, footprint: &ObstacleFootprint) -> Vec<(usize, usize)> {
    let half_step = grid.cell_size / FixedNum::from_num(2);
    let bound = cell_bounds(footprint, grid.cell_size);
    let mut cells = std::collections::BTreeSet::new();

    let mut dy = -bound;
    while dy <= bound {
        let mut dx = -bound;
        while dx <= bound {
            let sample = footprint.center + FixedVec2::new(dx, dy);
            if point_in_footprint(footprint, sample) {
                if let Some((x, y)) = grid.world_to_cell_on_layer(sample, footprint.layer) {
                    cells.insert((x, y));
                }
            }
            dx += half_step;
        }
        dy += half_step;
    }
    cells.into_iter().collect()
}

fn bounding_box(cells: &[(usize, usize)]) -> Option<(usize, usize, usize, usize)> {
    let mut iter = cells.iter();
    let first = iter.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in iter {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some((min_x, min_y, max_x, max_y))
}

/// Stamp OBSTACLE over a footprint and run pinch closure on its bounding
/// cells. Returns `false` (no-op) if the pool is exhausted partway through
/// — already-stamped cells in this call are rolled back.
pub fn stamp_obstacle(grid: &mut CellGrid, pool: &mut CellInfoPool, footprint: &ObstacleFootprint) -> bool {
    let cells = footprint_cells(grid, footprint);
    let mut stamped = Vec::with_capacity(cells.len());

    for &(x, y) in &cells {
        let Some(cell) = grid.cell_mut(footprint.layer, x, y) else {
            continue;
        };
        let info_idx = match cell.info {
            Some(idx) => idx,
            None => match pool.allocate() {
                Some(idx) => {
                    cell.info = Some(idx);
                    idx
                }
                None => {
                    rollback_stamp(grid, pool, footprint.layer, &stamped);
                    return false;
                }
            },
        };
        let prev_type = cell.cell_type;
        cell.cell_type = CellType::Obstacle;
        let info = pool.get_mut(info_idx);
        info.obstacle_id = Some(footprint.id);
        info.obstacle_is_fence = footprint.is_fence;
        info.prev_type = Some(prev_type);
        stamped.push((x, y));
    }

    if let Some((min_x, min_y, max_x, max_y)) = bounding_box(&stamped) {
        recompute_pinch_region(grid, footprint.layer, min_x, min_y, max_x, max_y);
    }
    true
}

fn rollback_stamp(grid: &mut CellGrid, pool: &mut CellInfoPool, layer: LayerId, stamped: &[(usize, usize)]) {
    for &(x, y) in stamped {
        let Some(cell) = grid.cell_mut(layer, x, y) else { continue };
        if let Some(idx) = cell.info {
            let prev = pool.get(idx).prev_type;
            pool.get_mut(idx).obstacle_id = None;
            pool.get_mut(idx).prev_type = None;
            if let Some(prev) = prev {
                cell.cell_type = prev;
            }
            if pool.release_if_unused(idx) {
                cell.info = None;
            }
        }
    }
}

/// Reverse a stamp: restore each cell's pre-obstacle type and release its
/// `info` slot if nothing else still claims it, then recompute pinch state
/// over the bounding region so inflation reverts when no cliff/obstacle
/// neighbours remain. Footprint pinch inflation itself is not re-run on
/// removal.
pub fn unstamp_obstacle(grid: &mut CellGrid, pool: &mut CellInfoPool, footprint: &ObstacleFootprint) {
    let cells = footprint_cells(grid, footprint);
    for &(x, y) in &cells {
        let Some(cell) = grid.cell_mut(footprint.layer, x, y) else {
            continue;
        };
        let Some(idx) = cell.info else { continue };
        if pool.get(idx).obstacle_id != Some(footprint.id) {
            continue;
        }
        let prev = pool.get(idx).prev_type.unwrap_or(CellType::Clear);
        cell.cell_type = prev;
        pool.get_mut(idx).obstacle_id = None;
        pool.get_mut(idx).obstacle_is_fence = false;
        pool.get_mut(idx).prev_type = None;
        if pool.release_if_unused(idx) {
            cell.info = None;
        }
    }

    if let Some((min_x, min_y, max_x, max_y)) = bounding_box(&cells) {
        recompute_pinch_region(grid, footprint.layer, min_x, min_y, max_x, max_y);
    }
}

/// Count of 4- and 8-connected clear neighbours around `(x, y)`.
fn clear_neighbor_counts(grid: &CellGrid, layer: LayerId, x: usize, y: usize) -> (usize, usize) {
    let mut orth = 0;
    let mut total = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 {
                continue;
            }
            let is_clear = grid
                .cell(layer, nx as usize, ny as usize)
                .map(|c| c.cell_type == CellType::Clear)
                .unwrap_or(false);
            if is_clear {
                total += 1;
                if dx == 0 || dy == 0 {
                    orth += 1;
                }
            }
        }
    }
    (orth, total)
}

/// Re-evaluate pinch state over `[min_x,max_x] x [min_y,max_y]` expanded by
/// one cell: promote clear cells whose clear-neighbour count drops below
/// threshold, and demote previously pinch-promoted impassable cells whose
/// neighbourhood has recovered.
fn recompute_pinch_region(grid: &mut CellGrid, layer: LayerId, min_x: usize, min_y: usize, max_x: usize, max_y: usize) {
    let lo_x = min_x.saturating_sub(1);
    let lo_y = min_y.saturating_sub(1);
    let hi_x = max_x + 1;
    let hi_y = max_y + 1;

    let mut changes = Vec::new();
    for y in lo_y..=hi_y {
        for x in lo_x..=hi_x {
            let Some(cell) = grid.cell(layer, x, y) else { continue };
            match cell.cell_type {
                CellType::Clear => {
                    let (orth, total) = clear_neighbor_counts(grid, layer, x, y);
                    if orth < 2 || total < 4 {
                        changes.push((x, y, CellType::Impassable, true));
                    }
                }
                CellType::Impassable if cell.pinched => {
                    let (orth, total) = clear_neighbor_counts(grid, layer, x, y);
                    if orth >= 2 && total >= 4 {
                        changes.push((x, y, CellType::Clear, false));
                    }
                }
                _ => {}
            }
        }
    }

    for (x, y, new_type, pinched) in changes {
        if let Some(cell) = grid.cell_mut(layer, x, y) {
            // Never downgrade a cell that actually carries an obstacle.
            if cell.cell_type == CellType::Obstacle {
                continue;
            }
            cell.cell_type = new_type;
            cell.pinched = pinched;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(w: usize, h: usize) -> CellGrid {
        CellGrid::new(w, h, FixedNum::from_num(1), FixedVec2::ZERO)
    }

    #[test]
    fn stamp_then_unstamp_restores_cell_type() {
        let mut grid = flat_grid(20, 20);
        let mut pool = CellInfoPool::new(1000);
        let footprint = ObstacleFootprint {
            id: ObstacleId(1),
            center: FixedVec2::new(FixedNum::from_num(10), FixedNum::from_num(10)),
            shape: ObstacleShape::Cylinder {
                radius: FixedNum::from_num(1),
            },
            layer: LayerId::Ground,
            is_fence: false,
        };
        assert!(stamp_obstacle(&mut grid, &mut pool, &footprint));
        let center_cell = grid.world_to_cell(footprint.center).unwrap();
        assert_eq!(
            grid.cell(LayerId::Ground, center_cell.0, center_cell.1).unwrap().cell_type,
            CellType::Obstacle
        );

        unstamp_obstacle(&mut grid, &mut pool, &footprint);
        assert_eq!(
            grid.cell(LayerId::Ground, center_cell.0, center_cell.1).unwrap().cell_type,
            CellType::Clear
        );
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn narrow_gap_is_pinch_closed() {
        // Two 1-cell-thick walls one cell apart: the gap between them
        // should pinch-close to impassable.
        let mut grid = flat_grid(10, 10);
        let mut pool = CellInfoPool::new(1000);
        let left = ObstacleFootprint {
            id: ObstacleId(1),
            center: FixedVec2::new(FixedNum::from_num(4), FixedNum::from_num(5)),
            shape: ObstacleShape::Cylinder {
                radius: FixedNum::from_num(0.4),
            },
            layer: LayerId::Ground,
            is_fence: false,
        };
        let right = ObstacleFootprint {
            id: ObstacleId(2),
            center: FixedVec2::new(FixedNum::from_num(6), FixedNum::from_num(5)),
            shape: ObstacleShape::Cylinder {
                radius: FixedNum::from_num(0.4),
            },
            layer: LayerId::Ground,
            is_fence: false,
        };
        stamp_obstacle(&mut grid, &mut pool, &left);
        stamp_obstacle(&mut grid, &mut pool, &right);

        let gap = grid.cell(LayerId::Ground, 5, 5).unwrap();
        assert_eq!(gap.cell_type, CellType::Impassable);
        assert!(gap.pinched);
    }
}
