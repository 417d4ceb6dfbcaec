//! The per-appearance `{moveTowardsPosition, maintainCurrentPosition}` pair:
//! a tagged-variant dispatch over a common trait, where "other" delegates
//! to legs and "thrust" never rests. Steering uses a
//! desired-velocity-minus-current idiom, the same shape flocking forces use,
//! generalised from flocking to goal-seeking.

use serde::{Deserialize, Serialize};

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::ids::EntityId;
use crate::interop::{PhysicsHandle, TerrainQuery};

use super::Locomotor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppearanceKind {
    Legs,
    Wheels,
    Treads,
    Hover,
    Thrust,
    Wings,
    Climber,
    Other,
}

pub trait AppearanceBehavior {
    fn move_towards_position(&self, loco: &mut Locomotor, entity: EntityId, physics: &mut dyn PhysicsHandle, terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum);
    fn maintain_current_position(&self, loco: &Locomotor, physics: &dyn PhysicsHandle) -> bool;
}

pub fn behavior_for(kind: AppearanceKind) -> &'static dyn AppearanceBehavior {
    match kind {
        AppearanceKind::Legs => &Legs,
        AppearanceKind::Wheels => &Wheels,
        AppearanceKind::Treads => &Treads,
        AppearanceKind::Hover => &Hover,
        AppearanceKind::Thrust => &Thrust,
        AppearanceKind::Wings => &Wings,
        AppearanceKind::Climber => &Climber,
        AppearanceKind::Other => &Legs,
    }
}

/// Ground-hugging, comes to rest, braking on approach unless the template
/// disables it.
struct Legs;
impl AppearanceBehavior for Legs {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, _terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_ground_steering(loco, physics, goal, dist_to_goal, speed, loco.template.no_slow_down_as_approaching_dest);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        true
    }
}

/// Wheeled vehicle: braking distance biased by suspension params when
/// present.
struct Wheels;
impl AppearanceBehavior for Wheels {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, _terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        let braking_bias = loco
            .template
            .suspension
            .filter(|s| s.has_suspension)
            .map(|s| FixedNum::from_num(1) + s.wheel_compression)
            .unwrap_or(FixedNum::from_num(1));
        let effective_dist = dist_to_goal * braking_bias;
        apply_ground_steering(loco, physics, goal, effective_dist, speed, loco.template.no_slow_down_as_approaching_dest);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        true
    }
}

struct Treads;
impl AppearanceBehavior for Treads {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, _terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_ground_steering(loco, physics, goal, dist_to_goal, speed, loco.template.no_slow_down_as_approaching_dest);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        true
    }
}

/// Climbs surfaces the other ground appearances reject; otherwise steers
/// identically to legs.
struct Climber;
impl AppearanceBehavior for Climber {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, _terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_ground_steering(loco, physics, goal, dist_to_goal, speed, true);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        true
    }
}

/// Never comes to rest: "maintain" is an orbit around the anchor.
struct Thrust;
impl AppearanceBehavior for Thrust {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_air_steering(loco, physics, terrain, goal, dist_to_goal, speed);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        false
    }
}

struct Wings;
impl AppearanceBehavior for Wings {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_air_steering(loco, physics, terrain, goal, dist_to_goal, speed);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        false
    }
}

/// Hovers in place when idle instead of resting — must be updated every
/// frame rather than parking.
struct Hover;
impl AppearanceBehavior for Hover {
    fn move_towards_position(&self, loco: &mut Locomotor, _entity: EntityId, physics: &mut dyn PhysicsHandle, terrain: &dyn TerrainQuery, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum) {
        apply_air_steering(loco, physics, terrain, goal, dist_to_goal, speed);
    }
    fn maintain_current_position(&self, _loco: &Locomotor, _physics: &dyn PhysicsHandle) -> bool {
        false
    }
}

fn apply_ground_steering(loco: &mut Locomotor, physics: &mut dyn PhysicsHandle, goal: FixedVec2, dist_to_goal: FixedNum, speed: FixedNum, no_slow_down: bool) {
    let wander = loco.next_wander_offset();
    let direction = goal;
    if direction.length_squared() <= FixedNum::ZERO {
        physics.scrub_velocity_2d(FixedNum::from_num(0.05));
        return;
    }
    let braking_distance = speed; // one tick of travel at current speed
    let desired_speed = if !no_slow_down && dist_to_goal < braking_distance {
        speed * (dist_to_goal / braking_distance).max(FixedNum::from_num(0.1))
    } else {
        speed
    };
    let desired_velocity = direction.normalize() * desired_speed;
    let wandered = FixedVec2::new(desired_velocity.x, desired_velocity.y + wander);
    let force = wandered - physics.velocity();
    physics.apply_motive_force(force);
}

fn apply_air_steering(loco: &mut Locomotor, physics: &mut dyn PhysicsHandle, terrain: &dyn TerrainQuery, goal: FixedVec2, _dist_to_goal: FixedNum, speed: FixedNum) {
    if goal.length_squared() > FixedNum::ZERO {
        let desired_velocity = goal.normalize() * speed;
        let force = desired_velocity - physics.velocity();
        physics.apply_motive_force(force);
    }
    let target_z = loco.handle_behavior_z(goal, terrain, crate::ids::LayerId::Ground);
    let z_gain = if loco.precise_z { FixedNum::from_num(2) } else { FixedNum::from_num(1) };
    physics.apply_z_force((target_z - physics.z_velocity()) * z_gain);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legs_parks_and_thrust_does_not() {
        assert!(matches!(AppearanceKind::Legs, AppearanceKind::Legs));
        let legs = behavior_for(AppearanceKind::Legs);
        let thrust = behavior_for(AppearanceKind::Thrust);
        // Behavior identity is exercised through Locomotor's own tests;
        // this just pins the dispatch table shape.
        let _ = (legs, thrust);
    }
}
