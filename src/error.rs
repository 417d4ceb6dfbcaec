//! Error taxonomy.
//!
//! Most pathfinding failures are *expected* outcomes, not exceptions: an
//! out-of-budget search, a zone-unreachable destination, or an occupied
//! goal cell all return `None`/`false` from the variant that detected them,
//! so that AI callers can fall back (`find_path` -> `find_closest_path`,
//! `find_ground_path` auto-shrink, `adjust_destination` spiral) without
//! unwinding a stack. `PathfindError` exists only for the handful of
//! conditions that are genuinely terminal for the current request.
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathfindError {
    /// The bounded `CellInfoPool` has no free slots left. The request that
    /// triggered this releases its own open/closed lists and returns `None`;
    /// the pool remains usable for the next request.
    #[error("cell info pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    /// A cell index fell outside every layer's extent.
    #[error("cell ({x}, {y}) is outside the map extent")]
    OutOfBounds { x: i32, y: i32 },

    /// Save data failed to decode, or decoded with an unsupported version
    /// tag.
    #[error("save data version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("save data could not be decoded: {0}")]
    Decode(String),
}
