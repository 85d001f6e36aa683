//! Fixed-step deterministic integrator (§4.6): player locomotion, stick
//! kinematics, and puck dynamics with sub-step rink/stick collision
//! resolution. All arithmetic is single-precision, applied in deterministic
//! slot order, matching §8 Testable Property 5.

pub mod player;
pub mod puck;
pub mod stick;
pub mod world;

pub use world::step_tick;

use crate::math::Vec3;

/// Gravity applied to every object's Y velocity once per tick (§4.6).
pub const GRAVITY: f32 = 0.000_680;

/// Puck-world and puck-stick collisions run in 10 equal sub-steps per tick
/// (§4.6).
pub const SUBSTEPS_PER_TICK: u32 = 10;

/// Scales the component of `v` along `normal` by `scale` when it points
/// away from the surface (separating); the tangential component passes
/// through unchanged. Used throughout physics to blend a corrective
/// impulse with outward-moving velocity rather than cancel it outright.
pub fn projection_with_scale(v: Vec3, normal: Vec3, scale: f32) -> Vec3 {
    let along = v.dot(normal);
    if along > 0.0 {
        v - normal * (along * (1.0 - scale))
    } else {
        v
    }
}

/// Moves `current` toward `target` by at most `accel_limit` per tick when
/// that increases alignment with `target`, or `brake_limit` when it
/// decreases it (§4.6 ground locomotion limiter pattern).
pub fn approach(current: Vec3, target: Vec3, accel_limit: f32, brake_limit: f32) -> Vec3 {
    let diff = target - current;
    let dist = diff.length();
    if dist <= 1e-9 {
        return target;
    }
    let increasing_speed = target.length() >= current.length();
    let limit = if increasing_speed { accel_limit } else { brake_limit };
    if dist <= limit {
        target
    } else {
        current + diff * (limit / dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_with_scale_leaves_inward_velocity_untouched() {
        let v = Vec3::new(0.0, -1.0, 0.0);
        let normal = Vec3::Y;
        assert_eq!(projection_with_scale(v, normal, 0.05), v);
    }

    #[test]
    fn projection_with_scale_damps_outward_velocity() {
        let v = Vec3::new(0.0, 1.0, 0.0);
        let normal = Vec3::Y;
        let result = projection_with_scale(v, normal, 0.05);
        assert!(result.y < v.y);
        assert!(result.y > 0.0);
    }

    #[test]
    fn approach_does_not_overshoot_small_gaps() {
        let result = approach(Vec3::ZERO, Vec3::new(0.0001, 0.0, 0.0), 0.00055555, 0.000208);
        assert_eq!(result, Vec3::new(0.0001, 0.0, 0.0));
    }
}
