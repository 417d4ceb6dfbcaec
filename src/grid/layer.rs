use rustc_hash::FxHashMap;

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::ids::LayerId;

use super::cell::Cell;

/// A coplanar sub-grid: the ground plane, one per bridge, or the wall layer.
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerId,
    pub width: usize,
    pub height: usize,
    /// Offset, in ground-cell coordinates, of this layer's (0,0) cell.
    /// Zero for the ground layer itself.
    pub origin_offset: (i32, i32),
    pub cells: Vec<Cell>,
    /// Ramp/approach endpoints used by the hierarchical search to stitch a
    /// bridge layer into the ground graph.
    pub start_cell: Option<(usize, usize)>,
    pub end_cell: Option<(usize, usize)>,
    pub destroyed: bool,
}

impl Layer {
    pub fn new(id: LayerId, width: usize, height: usize, origin_offset: (i32, i32)) -> Self {
        Self {
            id,
            width,
            height,
            origin_offset,
            cells: vec![Cell::new(id); width * height],
            start_cell: None,
            end_cell: None,
            destroyed: false,
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Ground-cell coordinates -> this layer's local coordinates, bounds
    /// checked against the layer's origin-offset sub-region.
    pub fn ground_to_local(&self, gx: i32, gy: i32) -> Option<(usize, usize)> {
        let lx = gx - self.origin_offset.0;
        let ly = gy - self.origin_offset.1;
        if self.in_bounds(lx, ly) {
            Some((lx as usize, ly as usize))
        } else {
            None
        }
    }

    pub fn local_to_ground(&self, x: usize, y: usize) -> (i32, i32) {
        (x as i32 + self.origin_offset.0, y as i32 + self.origin_offset.1)
    }
}

/// Named layers over a world: ground, zero-or-more bridges, and one wall
/// layer.
pub struct LayerSet {
    pub ground: Layer,
    pub bridges: FxHashMap<u16, Layer>,
    pub wall: Option<Layer>,
    next_bridge_id: u16,
}

impl LayerSet {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            ground: Layer::new(LayerId::Ground, width, height, (0, 0)),
            bridges: FxHashMap::default(),
            wall: None,
            next_bridge_id: 0,
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        match id {
            LayerId::Ground => Some(&self.ground),
            LayerId::Bridge(n) => self.bridges.get(&n),
            LayerId::Wall => self.wall.as_ref(),
        }
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        match id {
            LayerId::Ground => Some(&mut self.ground),
            LayerId::Bridge(n) => self.bridges.get_mut(&n),
            LayerId::Wall => self.wall.as_mut(),
        }
    }

    pub fn add_bridge_layer(&mut self, width: usize, height: usize, origin_offset: (i32, i32)) -> LayerId {
        let id = self.next_bridge_id;
        self.next_bridge_id += 1;
        let layer_id = LayerId::Bridge(id);
        self.bridges.insert(id, Layer::new(layer_id, width, height, origin_offset));
        layer_id
    }

    pub fn remove_bridge_layer(&mut self, id: u16) {
        self.bridges.remove(&id);
    }

    /// Put a bridge in `destroyed` state: its cells become impassable and
    /// every ground<->layer link through it is cleared.
    pub fn destroy_bridge(&mut self, id: u16) {
        if let Some(layer) = self.bridges.get_mut(&id) {
            layer.destroyed = true;
            for cell in layer.cells.iter_mut() {
                cell.cell_type = super::cell::CellType::Impassable;
                cell.connects_to_layer = None;
            }
            let offset = layer.origin_offset;
            let (w, h) = (layer.width, layer.height);
            for y in 0..h {
                for x in 0..w {
                    let (gx, gy) = (x as i32 + offset.0, y as i32 + offset.1);
                    if let Some(ground_cell) = self
                        .ground
                        .get_mut(gx.max(0) as usize, gy.max(0) as usize)
                        .filter(|_| gx >= 0 && gy >= 0)
                    {
                        if ground_cell.connects_to_layer == Some(LayerId::Bridge(id)) {
                            ground_cell.connects_to_layer = None;
                        }
                    }
                }
            }
        }
    }
}

/// Maps world coordinates onto layered pathfind cells.
pub struct CellGrid {
    pub layers: LayerSet,
    pub cell_size: FixedNum,
    pub world_origin: FixedVec2,
}

impl CellGrid {
    pub fn new(width: usize, height: usize, cell_size: FixedNum, world_origin: FixedVec2) -> Self {
        Self {
            layers: LayerSet::new(width, height),
            cell_size,
            world_origin,
        }
    }

    /// Floor-divide a world position by the cell edge length to get ground
    /// cell coordinates, without bounds checking.
    pub fn world_to_ground_coords(&self, pos: FixedVec2) -> (i32, i32) {
        let local = pos - self.world_origin;
        let gx = (local.x / self.cell_size).floor().to_num::<i32>();
        let gy = (local.y / self.cell_size).floor().to_num::<i32>();
        (gx, gy)
    }

    /// Ground-layer lookup: pick layer, clamp to bounds, `None` if outside
    /// the map extent.
    pub fn world_to_cell(&self, pos: FixedVec2) -> Option<(usize, usize)> {
        let (gx, gy) = self.world_to_ground_coords(pos);
        self.layers.ground.ground_to_local(gx, gy)
    }

    /// Same lookup against a specific (possibly non-ground) layer.
    pub fn world_to_cell_on_layer(&self, pos: FixedVec2, layer_id: LayerId) -> Option<(usize, usize)> {
        let (gx, gy) = self.world_to_ground_coords(pos);
        self.layers.layer(layer_id)?.ground_to_local(gx, gy)
    }

    pub fn cell_center(&self, layer_id: LayerId, x: usize, y: usize) -> Option<FixedVec2> {
        let layer = self.layers.layer(layer_id)?;
        let (gx, gy) = layer.local_to_ground(x, y);
        let half = self.cell_size / FixedNum::from_num(2);
        Some(FixedVec2::new(
            self.world_origin.x + FixedNum::from_num(gx) * self.cell_size + half,
            self.world_origin.y + FixedNum::from_num(gy) * self.cell_size + half,
        ))
    }

    pub fn cell(&self, layer_id: LayerId, x: usize, y: usize) -> Option<&Cell> {
        self.layers.layer(layer_id)?.get(x, y)
    }

    pub fn cell_mut(&mut self, layer_id: LayerId, x: usize, y: usize) -> Option<&mut Cell> {
        self.layers.layer_mut(layer_id)?.get_mut(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_cell_then_cell_center_round_trips_to_same_cell() {
        let grid = CellGrid::new(200, 200, FixedNum::from_num(1), FixedVec2::ZERO);
        let (x, y) = grid.world_to_cell(FixedVec2::new(FixedNum::from_num(5.4), FixedNum::from_num(5.9))).unwrap();
        assert_eq!((x, y), (5, 5));
        let center = grid.cell_center(LayerId::Ground, x, y).unwrap();
        let (x2, y2) = grid.world_to_cell(center).unwrap();
        assert_eq!((x, y), (x2, y2));
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let grid = CellGrid::new(10, 10, FixedNum::from_num(1), FixedVec2::ZERO);
        assert!(grid.world_to_cell(FixedVec2::new(FixedNum::from_num(-1), FixedNum::ZERO)).is_none());
        assert!(grid.world_to_cell(FixedVec2::new(FixedNum::from_num(50), FixedNum::ZERO)).is_none());
    }
}
