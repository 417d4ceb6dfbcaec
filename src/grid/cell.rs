use serde::{Deserialize, Serialize};

use crate::ids::LayerId;
use crate::pool::InfoIndex;

/// Terrain/obstacle classification of a single grid square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Clear,
    Water,
    Cliff,
    Obstacle,
    Impassable,
    Rubble,
}

impl CellType {
    /// Cells a ground unit can ever stand on, ignoring occupancy and zone.
    /// Obstacle/Impassable never are; Cliff only is for climber mobility
    /// (checked separately by the search's surface mask).
    pub fn is_base_walkable(self) -> bool {
        !matches!(self, CellType::Obstacle | CellType::Impassable)
    }
}

/// One square of the pathfind grid.
///
/// `info` is `None` unless the cell currently participates in a search or
/// carries occupancy/obstacle state — see `pool::CellInfoPool`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    pub zone: u16,
    pub connects_to_layer: Option<LayerId>,
    pub layer: LayerId,
    pub pinched: bool,
    pub aircraft_goal: bool,
    pub info: Option<InfoIndex>,
}

impl Cell {
    pub fn new(layer: LayerId) -> Self {
        Self {
            cell_type: CellType::Clear,
            zone: 0,
            connects_to_layer: None,
            layer,
            pinched: false,
            aircraft_goal: false,
            info: None,
        }
    }
}
