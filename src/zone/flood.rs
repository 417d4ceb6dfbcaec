//! Pass 1/2 of zone calculation: flood-fill same-type 4-connected
//! components into raw zone ids.
//!
//! A union-find two-pass connected-component labelling produces the same
//! final partition a per-block labelling pass followed by a canonical-id
//! collapse would, without needing the block stride to be correct for
//! anything but performance. The coarse `ZoneBlock` graph used by the
//! hierarchical search is built separately in `block.rs` from the
//! already-canonical zone ids.

use crate::grid::{CellGrid, CellType};
use crate::ids::LayerId;

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        if self.parent[x as usize] != x {
            let root = self.find(self.parent[x as usize]);
            self.parent[x as usize] = root;
        }
        self.parent[x as usize]
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb) as usize] = ra.min(rb);
        }
    }
}

/// Same-type test used by the flood: cells of equal `CellType` that are
/// both base-walkable (or both cliff, which the search crosses only with
/// climber mobility) belong to the same raw component.
fn same_component_type(a: CellType, b: CellType) -> bool {
    a == b && a != CellType::Obstacle
}

/// Flood-fills raw zone ids into every layer's cells (ground, each bridge,
/// wall) and returns the number of zone ids assigned (zone 0 means
/// "never walkable", reserved). Obstacle/Impassable cells keep zone 0.
pub fn flood_fill_zones(grid: &mut CellGrid) -> u16 {
    let mut uf = UnionFind::new(1); // slot 0 reserved for "no zone"
    let mut next_component: u32 = 1;

    // First pass, per layer: raster-scan 4-connected labelling with a
    // local union-find, using already-seen west/north neighbours.
    let mut layer_ids: Vec<LayerId> = vec![LayerId::Ground];
    layer_ids.extend(grid.layers.bridges.keys().map(|&id| LayerId::Bridge(id)));
    if grid.layers.wall.is_some() {
        layer_ids.push(LayerId::Wall);
    }

    // label[layer_index][cell_index] -> provisional component id
    let mut all_labels: Vec<Vec<u32>> = Vec::with_capacity(layer_ids.len());

    for &layer_id in &layer_ids {
        let layer = grid.layers.layer(layer_id).unwrap();
        let (w, h) = (layer.width, layer.height);
        let mut labels = vec![0u32; w * h];

        for y in 0..h {
            for x in 0..w {
                let idx = layer.index(x, y);
                let cell_type = layer.cells[idx].cell_type;
                if cell_type == CellType::Obstacle || cell_type == CellType::Impassable {
                    continue;
                }

                let west = if x > 0 {
                    let w_idx = layer.index(x - 1, y);
                    same_component_type(layer.cells[w_idx].cell_type, cell_type).then_some(labels[w_idx])
                } else {
                    None
                };
                let north = if y > 0 {
                    let n_idx = layer.index(x, y - 1);
                    same_component_type(layer.cells[n_idx].cell_type, cell_type).then_some(labels[n_idx])
                } else {
                    None
                };

                let label = match (west, north) {
                    (Some(a), Some(b)) if a != 0 && b != 0 => {
                        uf.union(a, b);
                        a.min(b)
                    }
                    (Some(a), _) if a != 0 => a,
                    (_, Some(b)) if b != 0 => b,
                    _ => {
                        let id = next_component;
                        next_component += 1;
                        uf.parent.push(id);
                        id
                    }
                };
                labels[idx] = label;
            }
        }
        all_labels.push(labels);
    }

    // Resolve each provisional label to its union-find root, then compact
    // roots into a dense 1..N range.
    let mut root_to_dense: std::collections::HashMap<u32, u16> = std::collections::HashMap::new();
    let mut dense_count: u16 = 1;

    for (layer_idx, &layer_id) in layer_ids.iter().enumerate() {
        let layer = grid.layers.layer_mut(layer_id).unwrap();
        let labels = &all_labels[layer_idx];
        for (idx, cell) in layer.cells.iter_mut().enumerate() {
            if labels[idx] == 0 {
                cell.zone = 0;
                continue;
            }
            let root = uf.find(labels[idx]);
            let dense = *root_to_dense.entry(root).or_insert_with(|| {
                let d = dense_count;
                dense_count += 1;
                d
            });
            cell.zone = dense;
        }
    }

    dense_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::{FixedNum, FixedVec2};

    #[test]
    fn single_component_gets_one_zone() {
        let mut grid = CellGrid::new(5, 5, FixedNum::from_num(1), FixedVec2::ZERO);
        let count = flood_fill_zones(&mut grid);
        assert_eq!(count, 2); // zone 0 reserved + one real zone
        let z = grid.layers.ground.cells[0].zone;
        assert!(grid.layers.ground.cells.iter().all(|c| c.zone == z));
    }

    #[test]
    fn disconnected_regions_get_different_zones() {
        let mut grid = CellGrid::new(5, 1, FixedNum::from_num(1), FixedVec2::ZERO);
        let idx = grid.layers.ground.index(2, 0);
        grid.layers.ground.cells[idx].cell_type = CellType::Impassable;
        flood_fill_zones(&mut grid);
        let left = grid.layers.ground.cells[grid.layers.ground.index(0, 0)].zone;
        let right = grid.layers.ground.cells[grid.layers.ground.index(4, 0)].zone;
        assert_ne!(left, right);
        assert_ne!(left, 0);
        assert_ne!(right, 0);
    }
}
