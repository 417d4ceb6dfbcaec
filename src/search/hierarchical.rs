//! A cheap O(blocks) graph search over `ZoneBlock` gateways used to
//! pre-reject a detailed search that could never succeed.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::astar::NodeRef;
use crate::zone::ZoneManager;

/// Breadth-first search over the coarse block graph from the block
/// containing `start` to the block containing `goal`. Returns `true` if a
/// chain of gateway hops connects them, meaning a detailed A* search has a
/// chance of finding a real path. This never walks actual cells, so it's
/// safe to call far more often than the full search.
pub fn find_hierarchical_path(zones: &ZoneManager, start: NodeRef, goal: NodeRef) -> bool {
    let Some(start_block) = zones.blocks.block_for_cell(start.x, start.y) else {
        return false;
    };
    let Some(goal_block) = zones.blocks.block_for_cell(goal.x, goal.y) else {
        return false;
    };
    if start_block.id == goal_block.id {
        return true;
    }
    if start_block.hierarchical_zone == 0 || goal_block.hierarchical_zone == 0 {
        return false;
    }

    let mut visited = FxHashSet::default();
    visited.insert(start_block.id.0);
    let mut queue = VecDeque::new();
    queue.push_back(start_block.id.0);

    while let Some(current) = queue.pop_front() {
        if current == goal_block.id.0 {
            return true;
        }
        let Some(block) = zones.blocks.blocks.get(current as usize) else {
            continue;
        };
        for gateway in &block.gateways {
            if visited.insert(gateway.to.0) {
                queue.push_back(gateway.to.0);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::{FixedNum, FixedVec2};
    use crate::grid::{CellGrid, CellType};
    use crate::ids::LayerId;

    #[test]
    fn connected_blocks_report_reachable() {
        let mut grid = CellGrid::new(20, 20, FixedNum::from_num(1), FixedVec2::ZERO);
        let pool = crate::pool::CellInfoPool::new(100);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        let start = NodeRef::new(LayerId::Ground, 0, 0);
        let goal = NodeRef::new(LayerId::Ground, 18, 18);
        assert!(find_hierarchical_path(&zones, start, goal));
    }

    #[test]
    fn wall_splitting_all_gateways_reports_unreachable() {
        let mut grid = CellGrid::new(20, 20, FixedNum::from_num(1), FixedVec2::ZERO);
        for y in 0..20 {
            let idx = grid.layers.ground.index(10, y);
            grid.layers.ground.cells[idx].cell_type = CellType::Impassable;
        }
        let pool = crate::pool::CellInfoPool::new(100);
        let mut zones = ZoneManager::new();
        zones.calculate_zones(&mut grid, &pool, 5);
        let start = NodeRef::new(LayerId::Ground, 0, 0);
        let goal = NodeRef::new(LayerId::Ground, 18, 18);
        assert!(!find_hierarchical_path(&zones, start, goal));
    }
}
