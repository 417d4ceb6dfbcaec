//! `PathObject`: the node chain A* produces, its line-of-sight optimisation
//! pass, and projection/consumption for the locomotor.

use serde::{Deserialize, Serialize};

use crate::astar::NodeRef;
use crate::fixed_math::{FixedNum, FixedVec2};
use crate::grid::{CellGrid, CellType};
use crate::ids::LayerId;

/// One waypoint on a reconstructed/optimised path.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PathNode {
    pub layer: LayerId,
    pub x: usize,
    pub y: usize,
    pub world: FixedVec2,
    /// Index of the farthest node this one can shortcut to in a single
    /// straight/diagonal run.
    pub next_optimized: usize,
}

#[derive(Clone, Debug)]
pub struct PathObject {
    pub nodes: Vec<PathNode>,
    pub is_optimized: bool,
    pub blocked_by_ally: bool,
    cached_query: Option<(FixedVec2, ProjectionResult)>,
}

/// Serialised form of a `Path`: per-node `(pos, layer, canOptimize,
/// nextOptimizedId)` written tail-first, plus the two flags. The cached
/// projection is search-time state and is never persisted — it gets rebuilt
/// at load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathSave {
    pub nodes_tail_first: Vec<PathNode>,
    pub is_optimized: bool,
    pub blocked_by_ally: bool,
}

impl PathObject {
    pub fn to_save(&self) -> PathSave {
        PathSave {
            nodes_tail_first: self.nodes.iter().rev().copied().collect(),
            is_optimized: self.is_optimized,
            blocked_by_ally: self.blocked_by_ally,
        }
    }

    pub fn from_save(save: PathSave) -> Self {
        let mut nodes = save.nodes_tail_first;
        nodes.reverse();
        Self {
            nodes,
            is_optimized: save.is_optimized,
            blocked_by_ally: save.blocked_by_ally,
            cached_query: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProjectionResult {
    pub point: FixedVec2,
    pub layer: LayerId,
    pub segment_index: usize,
    pub remaining_distance: FixedNum,
    pub perpendicular_error: FixedNum,
}

/// Ground-only jog removal threshold: a mid-node is dropped if removing it
/// shortens squared 2D distance by less than `3.9 * cell_size^2`.
const JOG_REMOVAL_COEFFICIENT: f64 = 3.9;

/// Cache reuse threshold for `compute_point_on_path`: a query within this
/// many world units of the last one reuses the cached projection.
const PROJECTION_CACHE_EPSILON: f64 = 0.1;

/// Perpendicular error past which the locomotor goal is fully the
/// projection rather than the next node.
const RUBBER_BAND_ERROR_COEFFICIENT: f64 = 3.0;

impl PathObject {
    pub fn from_search_chain(grid: &CellGrid, chain: &[NodeRef]) -> Self {
        let nodes = chain
            .iter()
            .enumerate()
            .map(|(i, n)| PathNode {
                layer: n.layer,
                x: n.x,
                y: n.y,
                world: grid.cell_center(n.layer, n.x, n.y).unwrap_or(FixedVec2::ZERO),
                next_optimized: i,
            })
            .collect();
        Self {
            nodes,
            is_optimized: false,
            blocked_by_ally: false,
            cached_query: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    /// Line-of-sight optimisation: for each anchor, scan forward to the
    /// farthest node reachable by a passable straight line, a uniform
    /// diagonal run, or a uniform orthogonal run. Never optimises across a
    /// cliff transition or more than 3 steps across a layer change.
    pub fn optimize(&mut self, grid: &CellGrid, ground_only: bool) {
        let n = self.nodes.len();
        if n == 0 {
            return;
        }
        for i in 0..n {
            let mut farthest = i;
            for j in (i + 1)..n {
                if !self.run_is_optimizable(grid, i, j) {
                    break;
                }
                farthest = j;
            }
            self.nodes[i].next_optimized = farthest;
        }
        if ground_only {
            self.remove_jogs(grid);
        }
        self.is_optimized = true;
    }

    fn run_is_optimizable(&self, grid: &CellGrid, i: usize, j: usize) -> bool {
        let a = &self.nodes[i];
        let b = &self.nodes[j];

        if a.layer != b.layer {
            // Layer transitions may only be optimised across a short hop.
            if j - i > 3 {
                return false;
            }
        }

        if crosses_cliff_transition(grid, a, b) {
            return false;
        }

        is_line_passable(grid, a, b) || is_uniform_run(&self.nodes[i..=j])
    }

    fn remove_jogs(&mut self, grid: &CellGrid) {
        if self.nodes.len() < 3 {
            return;
        }
        let cell_size_sq: f64 = {
            let s = grid.cell_size.to_num::<f64>();
            s * s
        };
        let threshold = JOG_REMOVAL_COEFFICIENT * cell_size_sq;

        let mut kept = vec![self.nodes[0]];
        let mut i = 1;
        while i < self.nodes.len() - 1 {
            let prev = kept.last().copied().unwrap();
            let cur = self.nodes[i];
            let next = self.nodes[i + 1];
            let direct = squared_distance(prev.world, next.world);
            let via_cur = squared_distance(prev.world, cur.world) + squared_distance(cur.world, next.world);
            if via_cur - direct < threshold {
                i += 1;
                continue;
            }
            kept.push(cur);
            i += 1;
        }
        kept.push(*self.nodes.last().unwrap());
        for (idx, node) in kept.iter_mut().enumerate() {
            node.next_optimized = idx;
        }
        self.nodes = kept;
    }

    /// Projects `pos` onto the path, returning the nearest point and the
    /// node index it falls on or after. Caches the last query within
    /// `PROJECTION_CACHE_EPSILON` world units.
    pub fn compute_point_on_path(&mut self, pos: FixedVec2) -> Option<ProjectionResult> {
        if self.nodes.is_empty() {
            return None;
        }
        if let Some((cached_pos, result)) = self.cached_query {
            if distance(cached_pos, pos) < FixedNum::from_num(PROJECTION_CACHE_EPSILON) {
                return Some(result);
            }
        }

        let mut best: Option<ProjectionResult> = None;
        for (idx, pair) in self.nodes.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let seg = b.world - a.world;
            let len_sq = seg.dot(seg);
            let t = if len_sq > FixedNum::ZERO {
                ((pos - a.world).dot(seg) / len_sq).clamp(FixedNum::ZERO, FixedNum::from_num(1))
            } else {
                FixedNum::ZERO
            };
            let point = a.world + seg * t;
            let err = distance(point, pos);

            if best.map(|r| err < r.perpendicular_error).unwrap_or(true) {
                let remaining = self.remaining_distance_from(idx, point);
                best = Some(ProjectionResult {
                    point,
                    layer: a.layer,
                    segment_index: idx,
                    remaining_distance: remaining,
                    perpendicular_error: err,
                });
            }
        }

        if let Some(result) = best {
            self.cached_query = Some((pos, result));
        }
        best
    }

    fn remaining_distance_from(&self, segment_index: usize, point: FixedVec2) -> FixedNum {
        let mut remaining = distance(point, self.nodes[segment_index + 1].world);
        for pair in self.nodes[(segment_index + 1)..].windows(2) {
            remaining += distance(pair[0].world, pair[1].world);
        }
        remaining
    }

    /// Lead-point selection for the locomotor: normally the next node past
    /// the projected segment; as perpendicular error grows past `3*S` the
    /// goal slides linearly back toward the raw projection, reaching it
    /// exactly at/after max error.
    pub fn locomotor_goal(&self, projection: &ProjectionResult, cell_size: FixedNum) -> FixedVec2 {
        let next_node = self.nodes[(projection.segment_index + 1).min(self.nodes.len() - 1)].world;
        let threshold = cell_size * FixedNum::from_num(RUBBER_BAND_ERROR_COEFFICIENT);
        if projection.perpendicular_error <= threshold {
            return next_node;
        }
        let max_error = threshold * FixedNum::from_num(2);
        let t = ((projection.perpendicular_error - threshold) / (max_error - threshold)).clamp(FixedNum::ZERO, FixedNum::from_num(1));
        next_node + (projection.point - next_node) * t
    }
}

fn squared_distance(a: FixedVec2, b: FixedVec2) -> f64 {
    let d = a - b;
    d.length_squared().to_num::<f64>()
}

fn distance(a: FixedVec2, b: FixedVec2) -> FixedNum {
    (a - b).length()
}

fn crosses_cliff_transition(grid: &CellGrid, a: &PathNode, b: &PathNode) -> bool {
    let a_cliff = grid.cell(a.layer, a.x, a.y).map(|c| c.cell_type == CellType::Cliff).unwrap_or(false);
    let b_cliff = grid.cell(b.layer, b.x, b.y).map(|c| c.cell_type == CellType::Cliff).unwrap_or(false);
    a_cliff != b_cliff
}

/// Bresenham line-of-sight test between two cells on the same layer.
pub fn is_line_passable(grid: &CellGrid, a: &PathNode, b: &PathNode) -> bool {
    if a.layer != b.layer {
        return false;
    }
    let (mut x0, mut y0) = (a.x as i32, a.y as i32);
    let (x1, y1) = (b.x as i32, b.y as i32);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        match grid.cell(a.layer, x0 as usize, y0 as usize) {
            Some(cell) if cell.cell_type.is_base_walkable() => {}
            _ => return false,
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    true
}

/// A run of nodes is "uniform" if each consecutive step uses the same
/// (dx,dy) direction, i.e. it's already a straight 45-degree-aligned
/// sub-path even if `is_line_passable` rejects it due to a layer quirk.
fn is_uniform_run(nodes: &[PathNode]) -> bool {
    if nodes.len() < 2 {
        return true;
    }
    let first_step = (
        (nodes[1].x as i32 - nodes[0].x as i32).signum(),
        (nodes[1].y as i32 - nodes[0].y as i32).signum(),
    );
    nodes.windows(2).all(|pair| {
        let step = (
            (pair[1].x as i32 - pair[0].x as i32).signum(),
            (pair[1].y as i32 - pair[0].y as i32).signum(),
        );
        step == first_step
    })
}
