//! `ContainFlow`: the evacuate/exit-positioning and door-reservation
//! contract for transports, mob-nexuses, and rider-changers, as it touches
//! movement.

use rustc_hash::FxHashMap;

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::ids::EntityId;
use crate::interop::ContainmentQuery;
use crate::search::AdjustMode;

/// Reservable slot governing when and where a container may release an
/// entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DoorId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveDoorResult {
    Reserved(DoorId),
    NoneAvailable,
}

struct DoorState {
    reserved_by: Option<EntityId>,
    /// Tick before which new reservations are refused.
    busy_until_tick: u64,
}

/// One container's door bank plus exit-delay bookkeeping.
pub struct ContainerDoors {
    doors: Vec<DoorState>,
    exit_delay_ticks: u64,
}

impl ContainerDoors {
    pub fn new(door_count: usize, exit_delay_ticks: u64) -> Self {
        Self {
            doors: (0..door_count).map(|_| DoorState { reserved_by: None, busy_until_tick: 0 }).collect(),
            exit_delay_ticks,
        }
    }

    /// Claims the first free, non-busy door for `passenger`.
    pub fn reserve_door_for_exit(&mut self, passenger: EntityId, current_tick: u64) -> ReserveDoorResult {
        for (idx, door) in self.doors.iter_mut().enumerate() {
            if door.reserved_by.is_none() && current_tick >= door.busy_until_tick {
                door.reserved_by = Some(passenger);
                return ReserveDoorResult::Reserved(DoorId(idx as u32));
            }
        }
        ReserveDoorResult::NoneAvailable
    }

    /// `exitObjectViaDoor(obj, door)`: marks the door busy until
    /// `current_tick + exit_delay_ticks` and frees the reservation so a new
    /// passenger can queue behind it once the delay elapses.
    pub fn exit_object_via_door(&mut self, door: DoorId, current_tick: u64) {
        if let Some(state) = self.doors.get_mut(door.0 as usize) {
            state.reserved_by = None;
            state.busy_until_tick = current_tick + self.exit_delay_ticks;
        }
    }

    /// `unreserveDoorForExit(door)`: frees a reservation without moving
    /// anyone, used on abort.
    pub fn unreserve_door_for_exit(&mut self, door: DoorId) {
        if let Some(state) = self.doors.get_mut(door.0 as usize) {
            state.reserved_by = None;
        }
    }
}

/// One occupant's placement back into the world on uncontain.
#[derive(Clone, Copy, Debug)]
pub struct ExitPlacement {
    pub position: FixedVec2,
    pub orientation: Option<FixedNum>,
    pub allow_to_fall: bool,
}

/// Resolves where a passenger lands when leaving `container`, trying in
/// order: exit bone, then a scatter spiral, then container position with
/// optional orientation match.
pub fn resolve_exit_placement(
    containment: &dyn ContainmentQuery,
    container: EntityId,
    container_position: FixedVec2,
    container_orientation: FixedNum,
    passenger: EntityId,
    scatter: impl FnOnce() -> Option<FixedVec2>,
) -> Option<ExitPlacement> {
    if containment.is_container_airborne(container) && !containment.passenger_can_rappel(passenger) {
        return None; // flying transports refuse exits unless the passenger can rappel
    }

    if let Some(bone) = containment.exit_bone_position(container) {
        return Some(ExitPlacement {
            position: bone,
            orientation: Some(container_orientation),
            allow_to_fall: containment.is_container_airborne(container),
        });
    }

    if let Some(scattered) = scatter() {
        return Some(ExitPlacement {
            position: scattered,
            orientation: None,
            allow_to_fall: containment.is_container_airborne(container),
        });
    }

    Some(ExitPlacement {
        position: container_position,
        orientation: Some(container_orientation),
        allow_to_fall: containment.is_container_airborne(container),
    })
}

/// Spirals outward from the container looking for a cell the passenger can
/// actually stand on, reusing the same spiral the pathfind dispatcher uses
/// for `adjust_to_possible_destination`.
pub fn scatter_to_nearby_position(grid: &crate::grid::CellGrid, zones: &crate::zone::ZoneManager, pool: &crate::pool::CellInfoPool, container: crate::astar::NodeRef, mobility: crate::zone::Mobility, max_radius: i32) -> Option<crate::astar::NodeRef> {
    crate::search::adjust_destination(grid, zones, pool, container, container, AdjustMode::PossibleDestination, mobility, false, max_radius)
}

/// Amphibious transports refuse exits where the passenger's mobility could
/// not reach the container's current cell.
pub fn amphibious_exit_allowed(containment: &dyn ContainmentQuery, container: EntityId, passenger: EntityId) -> bool {
    containment.passenger_mobility_matches(passenger, container)
}

/// Tracks evacuate-in-progress state for a container with multiple
/// occupants exiting over several ticks (one door at a time), e.g. a
/// transport dropping off its squad.
pub struct EvacuationFlow {
    pending: Vec<EntityId>,
    placed: FxHashMap<EntityId, FixedVec2>,
}

impl EvacuationFlow {
    pub fn new(occupants: Vec<EntityId>) -> Self {
        Self { pending: occupants, placed: FxHashMap::default() }
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Places the next pending occupant, rejecting a scatter candidate that
    /// collides with a previously placed occupant's footprint.
    pub fn place_next(&mut self, min_separation: FixedNum, mut candidate: impl FnMut() -> Option<FixedVec2>) -> Option<(EntityId, FixedVec2)> {
        let entity = *self.pending.first()?;
        let min_sep_sq = min_separation * min_separation;
        for _ in 0..8 {
            let Some(pos) = candidate() else { break };
            let collides = self.placed.values().any(|p| (*p - pos).length_squared() < min_sep_sq);
            if !collides {
                self.placed.insert(entity, pos);
                self.pending.remove(0);
                return Some((entity, pos));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_reservation_round_trip_frees_on_unreserve() {
        let mut doors = ContainerDoors::new(1, 5);
        let reserved = doors.reserve_door_for_exit(EntityId(1), 0);
        let ReserveDoorResult::Reserved(door) = reserved else { panic!("expected a door") };
        doors.unreserve_door_for_exit(door);
        let reserved_again = doors.reserve_door_for_exit(EntityId(2), 0);
        assert!(matches!(reserved_again, ReserveDoorResult::Reserved(_)));
    }

    #[test]
    fn exit_delay_blocks_reservation_until_busy_window_elapses() {
        let mut doors = ContainerDoors::new(1, 10);
        let ReserveDoorResult::Reserved(door) = doors.reserve_door_for_exit(EntityId(1), 0) else { panic!() };
        doors.exit_object_via_door(door, 0);
        assert_eq!(doors.reserve_door_for_exit(EntityId(2), 5), ReserveDoorResult::NoneAvailable);
        assert!(matches!(doors.reserve_door_for_exit(EntityId(2), 10), ReserveDoorResult::Reserved(_)));
    }

    #[test]
    fn evacuation_flow_rejects_colliding_candidates() {
        let mut flow = EvacuationFlow::new(vec![EntityId(1), EntityId(2)]);
        let fixed_spot = FixedVec2::new(FixedNum::from_num(10), FixedNum::from_num(10));
        let (first_entity, first_pos) = flow.place_next(FixedNum::from_num(1), || Some(fixed_spot)).unwrap();
        assert_eq!(first_entity, EntityId(1));
        assert_eq!(first_pos, fixed_spot);

        let mut attempts = vec![fixed_spot, FixedVec2::new(FixedNum::from_num(20), FixedNum::from_num(20))].into_iter();
        let (second_entity, second_pos) = flow.place_next(FixedNum::from_num(1), || attempts.next()).unwrap();
        assert_eq!(second_entity, EntityId(2));
        assert_ne!(second_pos, fixed_spot);
    }
}
