//! External-collaborator contracts.
//!
//! The pathfinding/movement core is a library: it never owns terrain
//! sampling, physics integration, entity storage or AI state machines. It
//! only ever reaches those systems through the narrow traits below, which an
//! engine shell implements and a test harness mocks.

use crate::fixed_math::FixedVec2;
use crate::ids::{EntityId, LayerId};

/// Relationship between two entities, as seen by the occupancy/ally-cost
/// rules in A*.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relationship {
    Allies,
    Neutral,
    Enemies,
}

/// Terrain height/classification sampling.
pub trait TerrainQuery {
    fn layer_height(&self, pos: FixedVec2, layer: LayerId) -> FixedNum;
    fn ground_height(&self, pos: FixedVec2) -> FixedNum;
    fn is_underwater(&self, pos: FixedVec2) -> bool;
    fn is_cliff_cell(&self, pos: FixedVec2) -> bool;
    fn layer_for_destination(&self, pos: FixedVec2) -> LayerId;
    fn highest_layer_for_destination(&self, pos: FixedVec2, only_healthy: bool) -> LayerId;
    fn object_interacts_with_bridge(&self, entity: EntityId, layer: LayerId) -> bool;
}

use crate::fixed_math::FixedNum;

/// Turning response reported back by physics for the locomotor's
/// three-point-turn decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnDirection {
    None,
    Left,
    Right,
    ThreePoint,
}

/// Physics state the locomotor drives.
pub trait PhysicsHandle {
    fn velocity(&self) -> FixedVec2;
    fn acceleration(&self) -> FixedVec2;
    fn apply_motive_force(&mut self, force: FixedVec2);
    fn scrub_velocity_2d(&mut self, threshold: FixedNum);
    fn set_allow_to_fall(&mut self, allow: bool);
    fn turning(&self) -> TurnDirection;
    fn z_velocity(&self) -> FixedNum;
    fn apply_z_force(&mut self, force: FixedNum);
}

/// Bounding geometry used for occupancy radius and attack-range checks.
#[derive(Clone, Copy, Debug)]
pub struct GeometryInfo {
    pub bounding_radius: FixedNum,
    pub is_small: bool,
    pub max_height_above_position: FixedNum,
}

/// Entity-level queries and mutators.
pub trait EntityQuery {
    fn position(&self, entity: EntityId) -> FixedVec2;
    fn set_position(&mut self, entity: EntityId, pos: FixedVec2);
    fn orientation(&self, entity: EntityId) -> FixedNum;
    fn set_orientation(&mut self, entity: EntityId, angle: FixedNum);
    fn layer(&self, entity: EntityId) -> LayerId;
    fn set_layer(&mut self, entity: EntityId, layer: LayerId);
    fn destination_layer(&self, entity: EntityId) -> LayerId;
    fn geometry(&self, entity: EntityId) -> GeometryInfo;
    fn relationship(&self, from: EntityId, to: EntityId) -> Relationship;
    fn crusher_level(&self, entity: EntityId) -> i32;
    fn crushable_level(&self, entity: EntityId) -> i32;
}

/// AI-facing movement primitives and path bookkeeping.
pub trait AiQuery {
    fn can_path_through_units(&self, entity: EntityId) -> bool;
    fn ignored_obstacle_id(&self, entity: EntityId) -> Option<crate::ids::ObstacleId>;
    fn is_moving(&self, entity: EntityId) -> bool;
    fn is_idle(&self, entity: EntityId) -> bool;
    fn is_aircraft_that_adjusts_destination(&self, entity: EntityId) -> bool;
}

/// Containment-side contract used by `ContainFlow` when evacuating riders.
pub trait ContainmentQuery {
    fn exit_bone_position(&self, container: EntityId) -> Option<FixedVec2>;
    fn is_container_airborne(&self, container: EntityId) -> bool;
    fn passenger_can_rappel(&self, passenger: EntityId) -> bool;
    fn passenger_mobility_matches(&self, passenger: EntityId, container: EntityId) -> bool;
}
