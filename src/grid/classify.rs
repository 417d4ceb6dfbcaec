//! Terrain/bridge/wall classification.

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::ids::LayerId;
use crate::interop::TerrainQuery;

use super::cell::CellType;
use super::layer::{CellGrid, Layer};

/// Sample terrain at each cell's four corners and classify the ground
/// layer, then run a two-step pinch inflation: cells adjacent to a cliff
/// are promoted to cliff and marked pinched, then the *new* cliff border is
/// pinched again, so pathable cells never touch a true cliff directly.
pub fn classify_map_cells(grid: &mut CellGrid, terrain: &dyn TerrainQuery) {
    let layer = &mut grid.layers.ground;
    let cell_size = grid.cell_size;
    let origin = grid.world_origin;

    for y in 0..layer.height {
        for x in 0..layer.width {
            let corners = corner_positions(origin, cell_size, x as i32, y as i32);
            let any_underwater = corners.iter().any(|&c| terrain.is_underwater(c));
            let any_cliff = corners.iter().any(|&c| terrain.is_cliff_cell(c));
            let idx = layer.index(x, y);
            layer.cells[idx].cell_type = if any_cliff {
                CellType::Cliff
            } else if any_underwater {
                CellType::Water
            } else {
                CellType::Clear
            };
        }
    }

    inflate_pinch_from_cliffs(layer);
    inflate_pinch_from_cliffs(layer);
}

fn corner_positions(origin: FixedVec2, cell_size: FixedNum, x: i32, y: i32) -> [FixedVec2; 4] {
    let bx = origin.x + FixedNum::from_num(x) * cell_size;
    let by = origin.y + FixedNum::from_num(y) * cell_size;
    [
        FixedVec2::new(bx, by),
        FixedVec2::new(bx + cell_size, by),
        FixedVec2::new(bx, by + cell_size),
        FixedVec2::new(bx + cell_size, by + cell_size),
    ]
}

/// One inflation pass: any clear/water cell 4-adjacent to a cliff is
/// promoted to cliff and marked pinched.
fn inflate_pinch_from_cliffs(layer: &mut Layer) {
    let (w, h) = (layer.width, layer.height);
    let mut to_promote = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if layer.cells[layer.index(x, y)].cell_type == CellType::Cliff {
                continue;
            }
            if orthogonal_neighbors(x, y, w, h)
                .into_iter()
                .any(|(nx, ny)| layer.cells[layer.index(nx, ny)].cell_type == CellType::Cliff)
            {
                to_promote.push((x, y));
            }
        }
    }
    for (x, y) in to_promote {
        let idx = layer.index(x, y);
        layer.cells[idx].cell_type = CellType::Cliff;
        layer.cells[idx].pinched = true;
    }
}

fn orthogonal_neighbors(x: usize, y: usize, w: usize, h: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(4);
    if x > 0 {
        out.push((x - 1, y));
    }
    if x + 1 < w {
        out.push((x + 1, y));
    }
    if y > 0 {
        out.push((x, y - 1));
    }
    if y + 1 < h {
        out.push((x, y + 1));
    }
    out
}

/// An oriented rectangle describing a wall segment.
#[derive(Clone, Copy, Debug)]
pub struct WallPiece {
    pub center: FixedVec2,
    pub half_extent_x: FixedNum,
    pub half_extent_y: FixedNum,
    pub cos_angle: FixedNum,
    pub sin_angle: FixedNum,
}

impl WallPiece {
    fn contains(&self, p: FixedVec2) -> bool {
        let d = p - self.center;
        // Rotate the sample point into the piece's local frame.
        let local_x = d.x * self.cos_angle + d.y * self.sin_angle;
        let local_y = -d.x * self.sin_angle + d.y * self.cos_angle;
        local_x.abs() <= self.half_extent_x && local_y.abs() <= self.half_extent_y
    }
}

/// Classify a bridge layer from its 2D polygon footprint: 4/4 corners
/// inside ⇒ clear, 0/4 ⇒ impassable, otherwise cliff. Ramp cells (cells
/// whose footprint touches the bridge's declared start/end) connect back to
/// the ground layer.
pub fn classify_bridge_layer(
    grid: &mut CellGrid,
    bridge_layer_id: LayerId,
    polygon_test: impl Fn(FixedVec2) -> bool,
    start_cell: (usize, usize),
    end_cell: (usize, usize),
) {
    let cell_size = grid.cell_size;
    let origin = grid.world_origin;

    let (w, h, offset) = {
        let layer = grid.layers.layer(bridge_layer_id).expect("bridge layer must exist");
        (layer.width, layer.height, layer.origin_offset)
    };

    for y in 0..h {
        for x in 0..w {
            let (gx, gy) = (x as i32 + offset.0, y as i32 + offset.1);
            let corners = corner_positions(origin, cell_size, gx, gy);
            let inside = corners.iter().filter(|&&c| polygon_test(c)).count();
            let layer = grid.layers.layer_mut(bridge_layer_id).unwrap();
            let idx = layer.index(x, y);
            layer.cells[idx].cell_type = match inside {
                4 => CellType::Clear,
                0 => CellType::Impassable,
                _ => CellType::Cliff,
            };
        }
    }

    let layer = grid.layers.layer_mut(bridge_layer_id).unwrap();
    layer.start_cell = Some(start_cell);
    layer.end_cell = Some(end_cell);
    let mut ground_updates = Vec::new();
    for &(lx, ly) in &[start_cell, end_cell] {
        if let Some(cell) = layer.get_mut(lx, ly) {
            cell.connects_to_layer = Some(LayerId::Ground);
        }
        let (gx, gy) = layer.local_to_ground(lx, ly);
        if gx >= 0 && gy >= 0 {
            ground_updates.push((gx, gy));
        }
    }
    for (gx, gy) in ground_updates {
        if let Some(ground_cell) = grid.layers.ground.get_mut(gx as usize, gy as usize) {
            ground_cell.connects_to_layer = Some(bridge_layer_id);
        }
    }
}

/// Classify the single wall layer against an arbitrary set of oriented wall
/// pieces, then force a one-cell inward border to cliff so units never
/// overshoot the end of a wall run.
pub fn classify_wall_layer(grid: &mut CellGrid, pieces: &[WallPiece]) {
    let cell_size = grid.cell_size;
    let origin = grid.world_origin;

    let layer = match grid.layers.wall.as_mut() {
        Some(l) => l,
        None => return,
    };
    let (w, h, offset) = (layer.width, layer.height, layer.origin_offset);

    for y in 0..h {
        for x in 0..w {
            let (gx, gy) = (x as i32 + offset.0, y as i32 + offset.1);
            let corners = corner_positions(origin, cell_size, gx, gy);
            let inside = corners
                .iter()
                .filter(|&&c| pieces.iter().any(|p| p.contains(c)))
                .count();
            let idx = layer.index(x, y);
            layer.cells[idx].cell_type = match inside {
                4 => CellType::Clear,
                0 => CellType::Impassable,
                _ => CellType::Cliff,
            };
        }
    }

    for y in 0..h {
        for x in 0..w {
            if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                let idx = layer.index(x, y);
                if layer.cells[idx].cell_type == CellType::Clear {
                    layer.cells[idx].cell_type = CellType::Cliff;
                }
            }
        }
    }
}
