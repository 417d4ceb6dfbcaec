//! Per-mobility equivalence arrays derived from raw flood-fill zones.

use rustc_hash::FxHashMap;

/// Caller's mobility bitset, used to pick which equivalence array answers
/// an effective-zone query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mobility {
    pub ground: bool,
    pub water: bool,
    pub cliff: bool,
    pub rubble: bool,
    pub air: bool,
}

impl Mobility {
    pub fn ground() -> Self {
        Self {
            ground: true,
            ..Default::default()
        }
    }

    pub fn water() -> Self {
        Self {
            water: true,
            ..Default::default()
        }
    }

    pub fn air() -> Self {
        Self {
            air: true,
            ..Default::default()
        }
    }
}

/// Which of the five equivalence arrays a query resolves against:
/// ground+cliff, ground+water, ground+rubble, crusher, or hierarchical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EquivalenceClass {
    GroundCliff,
    GroundWater,
    GroundRubble,
    Crusher,
    Hierarchical,
}

impl EquivalenceClass {
    pub fn for_mobility(mobility: Mobility, is_crusher: bool) -> Self {
        if is_crusher {
            return EquivalenceClass::Crusher;
        }
        if mobility.cliff {
            EquivalenceClass::GroundCliff
        } else if mobility.water {
            EquivalenceClass::GroundWater
        } else if mobility.rubble {
            EquivalenceClass::GroundRubble
        } else {
            EquivalenceClass::GroundCliff
        }
    }
}

/// A union-find collapsing raw zone ids into canonical representatives.
#[derive(Clone, Debug, Default)]
struct UnionFind {
    parent: Vec<u16>,
}

impl UnionFind {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count as u16).collect(),
        }
    }

    fn find(&mut self, x: u16) -> u16 {
        if self.parent[x as usize] != x {
            let root = self.find(self.parent[x as usize]);
            self.parent[x as usize] = root;
        }
        self.parent[x as usize]
    }

    fn union(&mut self, a: u16, b: u16) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb) as usize] = ra.min(rb);
        }
    }
}

/// Canonical-zone lookup per equivalence class, built once per
/// `calculate_zones` pass.
#[derive(Clone, Debug, Default)]
pub struct EquivalenceTables {
    tables: FxHashMap<EquivalenceClass, Vec<u16>>,
}

impl EquivalenceTables {
    pub fn canonical(&self, class: EquivalenceClass, raw_zone: u16) -> u16 {
        match self.tables.get(&class) {
            Some(table) if (raw_zone as usize) < table.len() => table[raw_zone as usize],
            _ => raw_zone,
        }
    }
}

/// Adjacency fed into each equivalence class's union pass: pairs of raw
/// zone ids known to touch across a type boundary that class considers
/// crossable.
pub struct CrossTypeAdjacency {
    pub water_ground: Vec<(u16, u16)>,
    pub ground_cliff: Vec<(u16, u16)>,
    pub ground_rubble: Vec<(u16, u16)>,
    pub fence_ground: Vec<(u16, u16)>,
    pub all: Vec<(u16, u16)>,
}

/// Pass 2 of zone calculation: collapse each class's adjacency list into a
/// canonical-id lookup table.
pub fn build_tables_from_adjacency(raw_zone_count: u16, adjacency: &CrossTypeAdjacency) -> EquivalenceTables {
    let mut tables = FxHashMap::default();

    let mut build = |pairs: &[(u16, u16)]| -> Vec<u16> {
        let mut uf = UnionFind::new(raw_zone_count as usize);
        for &(a, b) in pairs {
            uf.union(a, b);
        }
        (0..raw_zone_count).map(|z| uf.find(z)).collect()
    };

    tables.insert(EquivalenceClass::GroundWater, build(&adjacency.water_ground));
    tables.insert(EquivalenceClass::GroundCliff, build(&adjacency.ground_cliff));
    tables.insert(EquivalenceClass::GroundRubble, build(&adjacency.ground_rubble));
    tables.insert(EquivalenceClass::Crusher, build(&adjacency.fence_ground));
    tables.insert(EquivalenceClass::Hierarchical, build(&adjacency.all));

    EquivalenceTables { tables }
}

/// Walk the classified grid once to build the cross-type adjacency lists,
/// then run pass 2. Kept separate from flood-fill (pass 1) so each stays a
/// single, testable responsibility.
pub fn build_equivalence_tables(grid: &crate::grid::CellGrid, pool: &crate::pool::CellInfoPool, raw_zone_count: u16) -> EquivalenceTables {
    use crate::grid::CellType;

    let mut adjacency = CrossTypeAdjacency {
        water_ground: Vec::new(),
        ground_cliff: Vec::new(),
        ground_rubble: Vec::new(),
        fence_ground: Vec::new(),
        all: Vec::new(),
    };

    let layer = &grid.layers.ground;
    for y in 0..layer.height {
        for x in 0..layer.width {
            let here = layer.get(x, y).unwrap();
            if here.zone == 0 {
                continue;
            }
            for (nx, ny) in [(x.wrapping_add(1), y), (x, y.wrapping_add(1))] {
                let Some(there) = layer.get(nx, ny) else { continue };
                if there.zone == 0 {
                    continue;
                }
                adjacency.all.push((here.zone, there.zone));
                match (here.cell_type, there.cell_type) {
                    (CellType::Water, CellType::Clear) | (CellType::Clear, CellType::Water) => {
                        adjacency.water_ground.push((here.zone, there.zone));
                    }
                    (CellType::Cliff, CellType::Clear) | (CellType::Clear, CellType::Cliff) => {
                        adjacency.ground_cliff.push((here.zone, there.zone));
                    }
                    (CellType::Rubble, CellType::Clear) | (CellType::Clear, CellType::Rubble) => {
                        adjacency.ground_rubble.push((here.zone, there.zone));
                    }
                    _ => {}
                }
                if here.cell_type == CellType::Clear && there.cell_type == CellType::Clear {
                    adjacency.water_ground.push((here.zone, there.zone));
                    adjacency.ground_cliff.push((here.zone, there.zone));
                    adjacency.ground_rubble.push((here.zone, there.zone));
                    adjacency.fence_ground.push((here.zone, there.zone));
                }
            }
        }
    }

    // A fence (an `Obstacle` cell flagged crusher-crossable) stays outside
    // every raw zone, so pass 1 never gives it one. A crusher can still
    // step onto it, which means the zones on either side are equivalent
    // for the Crusher class even though nothing else can walk between
    // them directly.
    for y in 0..layer.height {
        for x in 0..layer.width {
            let here = layer.get(x, y).unwrap();
            if here.cell_type != CellType::Obstacle {
                continue;
            }
            let is_fence = here.info.map(|idx| pool.get(idx).obstacle_is_fence).unwrap_or(false);
            if !is_fence {
                continue;
            }
            let neighbor_zones: Vec<u16> = [
                (x.checked_sub(1), Some(y)),
                (Some(x.wrapping_add(1)), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), Some(y.wrapping_add(1))),
            ]
            .into_iter()
            .filter_map(|(nx, ny)| {
                let (nx, ny) = (nx?, ny?);
                layer.get(nx, ny)
            })
            .map(|c| c.zone)
            .filter(|&z| z != 0)
            .collect();
            for pair in neighbor_zones.windows(2) {
                adjacency.fence_ground.push((pair[0], pair[1]));
            }
        }
    }

    for layer in grid.layers.bridges.values() {
        if let (Some(start), Some(end)) = (layer.start_cell, layer.end_cell) {
            let (sx, sy) = layer.local_to_ground(start.0, start.1);
            let (ex, ey) = layer.local_to_ground(end.0, end.1);
            if let (Some(s), Some(e)) = (
                grid.layers.ground.get(sx.max(0) as usize, sy.max(0) as usize),
                grid.layers.ground.get(ex.max(0) as usize, ey.max(0) as usize),
            ) {
                let bridge_zone = layer.get(start.0, start.1).map(|c| c.zone).unwrap_or(0);
                if bridge_zone != 0 {
                    adjacency.all.push((bridge_zone, s.zone));
                    adjacency.all.push((bridge_zone, e.zone));
                    adjacency.ground_cliff.push((bridge_zone, s.zone));
                    adjacency.ground_cliff.push((bridge_zone, e.zone));
                    adjacency.water_ground.push((bridge_zone, s.zone));
                    adjacency.water_ground.push((bridge_zone, e.zone));
                    adjacency.ground_rubble.push((bridge_zone, s.zone));
                    adjacency.ground_rubble.push((bridge_zone, e.zone));
                    adjacency.fence_ground.push((bridge_zone, s.zone));
                    adjacency.fence_ground.push((bridge_zone, e.zone));
                }
            }
        }
    }

    build_tables_from_adjacency(raw_zone_count.max(1), &adjacency)
}
