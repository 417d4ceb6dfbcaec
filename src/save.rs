//! Versioned persistence for `Pathfinder`/`Path`/`Locomotor`/
//! `LocomotorStore`. Binary snapshot state uses `bincode`; the locomotor
//! template store uses `ron`, splitting runtime snapshot data from
//! author-facing template data.

use serde::{Deserialize, Serialize};

use crate::error::PathfindError;
use crate::ids::{EntityId, ObstacleId};
use crate::locomotor::{HealthCategory, Locomotor, LocomotorStore, LocomotorTemplate};
use crate::path::PathSave;

/// Current `Pathfinder` save format version.
pub const PATHFINDER_SAVE_VERSION: u32 = 1;

/// Persisted `Pathfinder` state: extent, map-ready flag, tunneling flag,
/// ignored-obstacle id, the request queue's raw contents, the wall-piece
/// array, wall height, and the cumulative cell counter. Search-time scratch
/// (pool, open/closed lists, cached projections) is never persisted — it's
/// rebuilt by `new_map`/`update` after load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathfinderSave {
    pub version: u32,
    pub extent: (usize, usize),
    pub map_ready: bool,
    pub tunneling: bool,
    pub ignored_obstacle_id: Option<ObstacleId>,
    /// Request queue contents in FIFO order (head to tail); re-enqueued
    /// into a fresh `RequestQueue` on load.
    pub request_queue: Vec<EntityId>,
    /// Indexed by `i`, not by a fixed maximum piece count.
    pub wall_piece_ids: Vec<u32>,
    pub wall_height: crate::fixed_math::FixedNum,
    pub cumulative_cell_counter: u64,
}

pub fn encode_pathfinder(save: &PathfinderSave) -> Result<Vec<u8>, PathfindError> {
    bincode::serialize(save).map_err(|e| PathfindError::Decode(e.to_string()))
}

pub fn decode_pathfinder(bytes: &[u8]) -> Result<PathfinderSave, PathfindError> {
    let save: PathfinderSave = bincode::deserialize(bytes).map_err(|e| PathfindError::Decode(e.to_string()))?;
    if save.version != PATHFINDER_SAVE_VERSION {
        return Err(PathfindError::VersionMismatch { expected: PATHFINDER_SAVE_VERSION, found: save.version });
    }
    Ok(save)
}

pub fn encode_path(path: &PathSave) -> Result<Vec<u8>, PathfindError> {
    bincode::serialize(path).map_err(|e| PathfindError::Decode(e.to_string()))
}

pub fn decode_path(bytes: &[u8]) -> Result<PathSave, PathfindError> {
    bincode::deserialize(bytes).map_err(|e| PathfindError::Decode(e.to_string()))
}

/// What's persisted for a `Locomotor` instance: its flags plus the
/// template it overrides, referenced by name rather than embedded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocomotorSave {
    pub template_name: String,
    pub ultra_accurate: bool,
    pub allow_invalid_position: bool,
    pub precise_z: bool,
    pub health: HealthCategory,
    pub donut_timer: u32,
}

pub fn save_locomotor(loco: &Locomotor) -> LocomotorSave {
    LocomotorSave {
        template_name: loco.template.name.clone(),
        ultra_accurate: loco.ultra_accurate,
        allow_invalid_position: loco.allow_invalid_position,
        precise_z: loco.precise_z,
        health: loco.health,
        donut_timer: loco.donut_timer,
    }
}

/// Rehydrates a `Locomotor` by looking its template up in `store`. Fails if
/// the named template isn't present — a save made against a mod/template
/// set that has since changed.
pub fn load_locomotor(save: &LocomotorSave, store: &LocomotorStore) -> Option<Locomotor> {
    let template = store.get(&save.template_name)?;
    let mut loco = Locomotor::new(template);
    loco.ultra_accurate = save.ultra_accurate;
    loco.allow_invalid_position = save.allow_invalid_position;
    loco.precise_z = save.precise_z;
    loco.health = save.health;
    loco.donut_timer = save.donut_timer;
    Some(loco)
}

/// `LocomotorStore` is author-facing template data, not runtime snapshot
/// state, so it round-trips through `ron` rather than `bincode`.
pub fn encode_locomotor_templates(templates: &[LocomotorTemplate]) -> Result<String, PathfindError> {
    ron::to_string(templates).map_err(|e| PathfindError::Decode(e.to_string()))
}

pub fn decode_locomotor_templates(text: &str) -> Result<Vec<LocomotorTemplate>, PathfindError> {
    ron::from_str(text).map_err(|e| PathfindError::Decode(e.to_string()))
}

pub fn load_locomotor_store(text: &str) -> Result<LocomotorStore, PathfindError> {
    let templates = decode_locomotor_templates(text)?;
    let mut store = LocomotorStore::new();
    for template in templates {
        store.insert(template);
    }
    Ok(store)
}
