//! Deterministic grid pathfinding and movement coordination for a
//! real-time strategy engine.
//!
//! The crate is organised the way the simulation touches it: [`grid`]
//! owns the layered cell terrain and obstacle stamping, [`zone`] derives
//! per-mobility reachability, [`pool`] and [`occupancy`] hold the bounded
//! per-cell transient state shared by search and the occupancy machine,
//! [`astar`] is the core search, and [`search`] exposes the variant
//! dispatchers AI callers actually use.

pub mod astar;
pub mod contain;
pub mod error;
pub mod fixed_math;
pub mod grid;
pub mod ids;
pub mod interop;
pub mod locomotor;
pub mod occupancy;
pub mod path;
pub mod pathfinder;
pub mod pool;
pub mod queue;
pub mod save;
pub mod search;
pub mod zone;

pub use error::PathfindError;
pub use fixed_math::{FixedNum, FixedVec2};
pub use ids::{BridgeId, EntityId, LayerId, ObstacleId};
