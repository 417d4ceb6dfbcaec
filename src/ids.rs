//! Small newtype identifiers shared across the core.

use serde::{Deserialize, Serialize};

/// Opaque handle to a mobile or static entity, supplied by the engine shell.
/// The core never dereferences this itself — all entity state is reached
/// through the `interop` traits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const INVALID: EntityId = EntityId(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Identifies a layer within a `LayerSet`: the ground plane, one of the
/// bridge layers, or the wall layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerId {
    Ground,
    Bridge(u16),
    Wall,
}

impl Default for LayerId {
    fn default() -> Self {
        LayerId::Ground
    }
}

/// Stable identifier for a static obstacle footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// Identifier for a bridge structure, distinct from the `LayerId::Bridge`
/// index it owns (a destroyed bridge keeps its id but loses its layer link).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BridgeId(pub u16);
