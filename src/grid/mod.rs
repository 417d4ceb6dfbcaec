//! The pathfind cell grid: terrain classification, bridge/wall layers, and
//! static-obstacle stamping.

mod cell;
mod classify;
mod layer;
mod obstacle;

pub use cell::{Cell, CellType};
pub use classify::{classify_bridge_layer, classify_map_cells, classify_wall_layer, WallPiece};
pub use layer::{CellGrid, Layer, LayerSet};
pub use obstacle::{stamp_obstacle, unstamp_obstacle, ObstacleFootprint, ObstacleShape};
