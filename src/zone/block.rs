//! Coarse `ZoneBlock` grid used to pre-reject hopeless searches before
//! launching detailed A*.

use smallvec::SmallVec;

use crate::grid::CellGrid;
use crate::ids::LayerId;

use super::equivalence::{EquivalenceClass, EquivalenceTables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// A side-centre connection between two adjacent blocks whose boundary
/// cells share a hierarchical zone.
#[derive(Clone, Copy, Debug)]
pub struct Gateway {
    pub to: BlockId,
    pub cell: (usize, usize),
}

/// One BxB square of the coarse graph.
#[derive(Clone, Debug)]
pub struct ZoneBlock {
    pub id: BlockId,
    pub bx: usize,
    pub by: usize,
    /// Hierarchical-class zone representing this block, taken from its
    /// first walkable cell. Blocks with no walkable cell carry zone 0.
    pub hierarchical_zone: u16,
    pub gateways: SmallVec<[Gateway; 8]>,
    pub touches_bridge: bool,
}

pub struct ZoneBlockGrid {
    pub block_size: usize,
    pub width_blocks: usize,
    pub height_blocks: usize,
    pub blocks: Vec<ZoneBlock>,
}

impl ZoneBlockGrid {
    pub fn new(width_blocks: usize, height_blocks: usize, block_size: usize) -> Self {
        Self {
            block_size,
            width_blocks,
            height_blocks,
            blocks: Vec::new(),
        }
    }

    pub fn block_at(&self, bx: usize, by: usize) -> Option<&ZoneBlock> {
        if bx < self.width_blocks && by < self.height_blocks {
            self.blocks.get(by * self.width_blocks + bx)
        } else {
            None
        }
    }

    pub fn block_for_cell(&self, x: usize, y: usize) -> Option<&ZoneBlock> {
        self.block_at(x / self.block_size.max(1), y / self.block_size.max(1))
    }
}

pub fn build_zone_blocks(grid: &CellGrid, tables: &EquivalenceTables, block_size: usize) -> ZoneBlockGrid {
    let block_size = block_size.max(1);
    let (w, h) = (grid.layers.ground.width, grid.layers.ground.height);
    let width_blocks = w.div_ceil(block_size);
    let height_blocks = h.div_ceil(block_size);

    let mut blocks = Vec::with_capacity(width_blocks * height_blocks);
    for by in 0..height_blocks {
        for bx in 0..width_blocks {
            let id = BlockId((by * width_blocks + bx) as u32);
            let x0 = bx * block_size;
            let y0 = by * block_size;
            let x1 = (x0 + block_size).min(w);
            let y1 = (y0 + block_size).min(h);

            let mut hierarchical_zone = 0u16;
            let mut touches_bridge = false;
            'scan: for y in y0..y1 {
                for x in x0..x1 {
                    let cell = grid.layers.ground.get(x, y).unwrap();
                    if cell.connects_to_layer.is_some() {
                        touches_bridge = true;
                    }
                    if cell.zone != 0 && hierarchical_zone == 0 {
                        hierarchical_zone = tables.canonical(EquivalenceClass::Hierarchical, cell.zone);
                        if !touches_bridge {
                            continue;
                        }
                        break 'scan;
                    }
                }
            }

            blocks.push(ZoneBlock {
                id,
                bx,
                by,
                hierarchical_zone,
                gateways: SmallVec::new(),
                touches_bridge,
            });
        }
    }

    let mut grid_blocks = ZoneBlockGrid {
        block_size,
        width_blocks,
        height_blocks,
        blocks,
    };

    build_gateways(grid, tables, &mut grid_blocks);
    grid_blocks
}

/// A gateway exists on the boundary column/row between two side-adjacent
/// blocks whenever the two boundary cells resolve to the same hierarchical
/// zone.
fn build_gateways(grid: &CellGrid, tables: &EquivalenceTables, blocks: &mut ZoneBlockGrid) {
    let block_size = blocks.block_size;
    for by in 0..blocks.height_blocks {
        for bx in 0..blocks.width_blocks {
            let mut gateways = SmallVec::new();

            // East neighbour.
            if bx + 1 < blocks.width_blocks {
                let here_x = ((bx + 1) * block_size).saturating_sub(1);
                let there_x = (bx + 1) * block_size;
                let y0 = by * block_size;
                let y1 = ((by + 1) * block_size).min(grid.layers.ground.height);
                for y in y0..y1 {
                    if zones_match(grid, tables, (here_x, y), (there_x, y)) {
                        let to_id = BlockId(((by) * blocks.width_blocks + bx + 1) as u32);
                        gateways.push(Gateway { to: to_id, cell: (here_x, y) });
                        break;
                    }
                }
            }
            // South neighbour.
            if by + 1 < blocks.height_blocks {
                let here_y = ((by + 1) * block_size).saturating_sub(1);
                let there_y = (by + 1) * block_size;
                let x0 = bx * block_size;
                let x1 = ((bx + 1) * block_size).min(grid.layers.ground.width);
                for x in x0..x1 {
                    if zones_match(grid, tables, (x, here_y), (x, there_y)) {
                        let to_id = BlockId(((by + 1) * blocks.width_blocks + bx) as u32);
                        gateways.push(Gateway { to: to_id, cell: (x, here_y) });
                        break;
                    }
                }
            }

            let idx = by * blocks.width_blocks + bx;
            blocks.blocks[idx].gateways = gateways;
        }
    }

    // Gateways are symmetric: mirror east/south hops back as west/north.
    let mirrors: Vec<(usize, Gateway)> = blocks
        .blocks
        .iter()
        .enumerate()
        .flat_map(|(from_idx, block)| {
            block.gateways.iter().map(move |gw| {
                (
                    gw.to.0 as usize,
                    Gateway {
                        to: BlockId(from_idx as u32),
                        cell: gw.cell,
                    },
                )
            })
        })
        .collect();
    for (target_idx, gw) in mirrors {
        blocks.blocks[target_idx].gateways.push(gw);
    }
}

fn zones_match(grid: &CellGrid, tables: &EquivalenceTables, a: (usize, usize), b: (usize, usize)) -> bool {
    let (Some(ca), Some(cb)) = (grid.cell(LayerId::Ground, a.0, a.1), grid.cell(LayerId::Ground, b.0, b.1)) else {
        return false;
    };
    if ca.zone == 0 || cb.zone == 0 {
        return false;
    }
    tables.canonical(EquivalenceClass::Hierarchical, ca.zone) == tables.canonical(EquivalenceClass::Hierarchical, cb.zone)
}
