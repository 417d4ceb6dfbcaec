//! Per-entity movement driver, expressed as desired-velocity-minus-current
//! force accumulation rather than direct position writes.

mod appearance;
mod turn;

pub use appearance::AppearanceKind;
pub use turn::rotate_towards_position;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fixed_math::FixedNum;
use crate::ids::EntityId;
use crate::interop::{PhysicsHandle, TerrainQuery, TurnDirection};

/// The eight Z-behaviour modes a template declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZBehavior {
    NoMotive,
    SeaLevel,
    SurfaceRelativeHeight,
    AbsoluteHeight,
    FixedRelativeToGround,
    FixedAbsolute,
    RelativeToHighestLayer,
    SmoothRelativeToHighestLayer,
}

/// Body-health bucket used to pick between a template's normal and
/// damaged speed/turn-rate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthCategory {
    Healthy,
    Damaged,
}

/// Per-template wander perturbation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct WanderParams {
    pub width_factor: FixedNum,
    pub length_factor: FixedNum,
    pub about_point_radius: FixedNum,
}

/// Inert wheel/tread geometry consumed by `moveTowardsPosition` for braking
/// bias.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SuspensionParams {
    pub has_suspension: bool,
    pub wheel_extension: FixedNum,
    pub wheel_compression: FixedNum,
    pub wheel_turn_angle: FixedNum,
}

/// Immutable per-unit-type movement profile, shared across every instance
/// that uses it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocomotorTemplate {
    pub name: String,
    pub appearance: AppearanceKind,
    pub z_behavior: ZBehavior,
    pub max_speed: FixedNum,
    pub max_speed_damaged: FixedNum,
    pub turn_rate: FixedNum,
    pub turn_rate_damaged: FixedNum,
    /// -1..+1, shifts the effective rotation centre between rear (-1) and
    /// front (+1) of the chassis.
    pub turn_pivot_offset: FixedNum,
    pub no_slow_down_as_approaching_dest: bool,
    pub wander: Option<WanderParams>,
    pub suspension: Option<SuspensionParams>,
    /// Per-template donut-timer length in ticks; `0` disables it.
    pub donut_timer_ticks: u32,
}

impl LocomotorTemplate {
    pub fn speed_for(&self, health: HealthCategory) -> FixedNum {
        match health {
            HealthCategory::Healthy => self.max_speed,
            HealthCategory::Damaged => self.max_speed_damaged,
        }
    }

    pub fn turn_rate_for(&self, health: HealthCategory) -> FixedNum {
        match health {
            HealthCategory::Healthy => self.turn_rate,
            HealthCategory::Damaged => self.turn_rate_damaged,
        }
    }
}

/// A keyed collection of templates, loaded once at startup and shared by
/// reference from every `Locomotor` instance.
#[derive(Default)]
pub struct LocomotorStore {
    templates: FxHashMap<String, Arc<LocomotorTemplate>>,
}

impl LocomotorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: LocomotorTemplate) {
        self.templates.insert(template.name.clone(), Arc::new(template));
    }

    pub fn get(&self, name: &str) -> Option<Arc<LocomotorTemplate>> {
        self.templates.get(name).cloned()
    }
}

/// Per-entity locomotor state. The template is shared (`Arc`); only the
/// mutable, per-instance fields live here.
#[derive(Clone, Debug)]
pub struct Locomotor {
    pub template: Arc<LocomotorTemplate>,
    /// Escape hatch for airplane takeoff/landing and scripted final
    /// positioning.
    pub ultra_accurate: bool,
    pub allow_invalid_position: bool,
    /// Forces strict Z tracking with increased lift authority.
    pub precise_z: bool,
    pub health: HealthCategory,
    /// Ticks remaining before another reversal-into-a-circle is permitted.
    pub donut_timer: u32,
    wander_angle: FixedNum,
}

impl Locomotor {
    pub fn new(template: Arc<LocomotorTemplate>) -> Self {
        Self {
            template,
            ultra_accurate: false,
            allow_invalid_position: false,
            precise_z: false,
            health: HealthCategory::Healthy,
            donut_timer: 0,
            wander_angle: FixedNum::ZERO,
        }
    }

    pub fn tick_donut_timer(&mut self) {
        if self.donut_timer > 0 {
            self.donut_timer -= 1;
        }
    }

    /// Dispatches to the template's appearance, folding in the
    /// ultra-accurate speed/turn-rate multiplier.
    /// `goal` is the direction to the target, already relative to the
    /// entity's current position (the caller — `pathfinder::update` —
    /// computes `goal_world - entity_position` once via `EntityQuery`
    /// before calling in, so appearances never need entity lookups of
    /// their own).
    pub fn move_towards_position(
        &mut self,
        entity: EntityId,
        physics: &mut dyn PhysicsHandle,
        terrain: &dyn TerrainQuery,
        goal: crate::fixed_math::FixedVec2,
        dist_to_goal: FixedNum,
        desired_speed: FixedNum,
    ) {
        let behavior = appearance::behavior_for(self.template.appearance);
        let speed = if self.ultra_accurate {
            desired_speed * FixedNum::from_num(1.5)
        } else {
            desired_speed.min(self.template.speed_for(self.health))
        };
        behavior.move_towards_position(self, entity, physics, terrain, goal, dist_to_goal, speed);
    }

    /// Reports whether this appearance can park in place between updates.
    pub fn maintain_current_position(&self, physics: &dyn PhysicsHandle) -> bool {
        appearance::behavior_for(self.template.appearance).maintain_current_position(self, physics)
    }

    /// Target world-space Z for this tick, before lift authority is
    /// applied.
    pub fn handle_behavior_z(&self, pos: crate::fixed_math::FixedVec2, terrain: &dyn TerrainQuery, layer: crate::ids::LayerId) -> FixedNum {
        match self.template.z_behavior {
            ZBehavior::NoMotive => FixedNum::ZERO,
            ZBehavior::SeaLevel => FixedNum::ZERO,
            ZBehavior::SurfaceRelativeHeight => terrain.ground_height(pos),
            ZBehavior::AbsoluteHeight => terrain.layer_height(pos, layer),
            ZBehavior::FixedRelativeToGround => terrain.ground_height(pos) + FixedNum::from_num(1),
            ZBehavior::FixedAbsolute => FixedNum::from_num(1),
            ZBehavior::RelativeToHighestLayer | ZBehavior::SmoothRelativeToHighestLayer => {
                let highest = terrain.highest_layer_for_destination(pos, false);
                terrain.layer_height(pos, highest)
            }
        }
    }

    pub fn turn_rate(&self) -> FixedNum {
        let rate = self.template.turn_rate_for(self.health);
        if self.ultra_accurate {
            rate * FixedNum::from_num(2)
        } else {
            rate
        }
    }

    /// Entry point for the turn model: picks direction and angle delta for
    /// the current tick.
    pub fn rotate_towards_position(&mut self, current_orientation: FixedNum, facing: crate::fixed_math::FixedVec2, goal: crate::fixed_math::FixedVec2) -> (TurnDirection, FixedNum) {
        turn::rotate_towards_position(current_orientation, facing, goal, self.turn_rate(), self.template.turn_pivot_offset, self.donut_timer > 0)
    }

    /// Advances the per-template wander perturbation used by the legs
    /// appearance.
    pub fn next_wander_offset(&mut self) -> FixedNum {
        let Some(wander) = self.template.wander else {
            return FixedNum::ZERO;
        };
        self.wander_angle = crate::fixed_math::wrap_angle(self.wander_angle + wander.width_factor);
        self.wander_angle * wander.about_point_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::FixedVec2;
    use crate::ids::LayerId;

    struct StubPhysics {
        velocity: FixedVec2,
        applied: FixedVec2,
        z_velocity: FixedNum,
    }
    impl PhysicsHandle for StubPhysics {
        fn velocity(&self) -> FixedVec2 {
            self.velocity
        }
        fn acceleration(&self) -> FixedVec2 {
            FixedVec2::ZERO
        }
        fn apply_motive_force(&mut self, force: FixedVec2) {
            self.applied = force;
        }
        fn scrub_velocity_2d(&mut self, _threshold: FixedNum) {}
        fn set_allow_to_fall(&mut self, _allow: bool) {}
        fn turning(&self) -> TurnDirection {
            TurnDirection::None
        }
        fn z_velocity(&self) -> FixedNum {
            self.z_velocity
        }
        fn apply_z_force(&mut self, _force: FixedNum) {}
    }

    struct FlatTerrain;
    impl TerrainQuery for FlatTerrain {
        fn layer_height(&self, _pos: FixedVec2, _layer: LayerId) -> FixedNum {
            FixedNum::ZERO
        }
        fn ground_height(&self, _pos: FixedVec2) -> FixedNum {
            FixedNum::ZERO
        }
        fn is_underwater(&self, _pos: FixedVec2) -> bool {
            false
        }
        fn is_cliff_cell(&self, _pos: FixedVec2) -> bool {
            false
        }
        fn layer_for_destination(&self, _pos: FixedVec2) -> LayerId {
            LayerId::Ground
        }
        fn highest_layer_for_destination(&self, _pos: FixedVec2, _only_healthy: bool) -> LayerId {
            LayerId::Ground
        }
        fn object_interacts_with_bridge(&self, _entity: EntityId, _layer: LayerId) -> bool {
            false
        }
    }

    fn legs_template() -> LocomotorTemplate {
        LocomotorTemplate {
            name: "infantry".into(),
            appearance: AppearanceKind::Legs,
            z_behavior: ZBehavior::SurfaceRelativeHeight,
            max_speed: FixedNum::from_num(5),
            max_speed_damaged: FixedNum::from_num(3),
            turn_rate: FixedNum::from_num(0.2),
            turn_rate_damaged: FixedNum::from_num(0.1),
            turn_pivot_offset: FixedNum::ZERO,
            no_slow_down_as_approaching_dest: false,
            wander: None,
            suspension: None,
            donut_timer_ticks: 0,
        }
    }

    #[test]
    fn damaged_health_selects_damaged_speed() {
        let template = Arc::new(legs_template());
        let mut loco = Locomotor::new(template);
        loco.health = HealthCategory::Damaged;
        let mut physics = StubPhysics { velocity: FixedVec2::ZERO, applied: FixedVec2::ZERO, z_velocity: FixedNum::ZERO };
        let terrain = FlatTerrain;
        loco.move_towards_position(EntityId(1), &mut physics, &terrain, FixedVec2::new(FixedNum::from_num(10), FixedNum::ZERO), FixedNum::from_num(10), FixedNum::from_num(5));
        assert!(physics.applied.length_squared() > FixedNum::ZERO);
    }

    #[test]
    fn thrust_appearance_never_reports_parkable() {
        let mut template = legs_template();
        template.appearance = AppearanceKind::Thrust;
        let loco = Locomotor::new(Arc::new(template));
        let physics = StubPhysics { velocity: FixedVec2::ZERO, applied: FixedVec2::ZERO, z_velocity: FixedNum::ZERO };
        assert!(!loco.maintain_current_position(&physics));
    }

    #[test]
    fn wander_offset_is_zero_without_wander_params() {
        let template = Arc::new(legs_template());
        let mut loco = Locomotor::new(template);
        assert_eq!(loco.next_wander_offset(), FixedNum::ZERO);
    }
}
