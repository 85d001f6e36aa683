//! Puck geometry and end-of-tick puck-only forces (§4.6).

use crate::math::Vec3;
use crate::object::{PuckObject, PUCK_HEIGHT, PUCK_RADIUS};

pub const VERTEX_ANGLES: usize = 16;
const DRAG_COEFFICIENT: f32 = 0.015625;

/// The 3x16 ring of rim vertices used for rink collision queries (§4.6):
/// 16 angles around the puck's circumference at three heights, in world
/// space.
pub fn collision_vertices(puck: &PuckObject) -> Vec<Vec3> {
    let mut vertices = Vec::with_capacity(3 * VERTEX_ANGLES);
    for i in 0..VERTEX_ANGLES {
        let theta = i as f32 * std::f32::consts::TAU / VERTEX_ANGLES as f32;
        let rim_local = Vec3::new(theta.cos() * PUCK_RADIUS, 0.0, theta.sin() * PUCK_RADIUS);
        let rim_world = puck.body.rotation.transform(rim_local);
        for h in [-PUCK_HEIGHT, 0.0, PUCK_HEIGHT] {
            vertices.push(puck.body.position + rim_world + puck.body.rotation.y * h);
        }
    }
    vertices
}

/// Velocity of a rigid-body point, to first order: linear velocity plus
/// the `rot_axis x r` rotational term.
pub fn point_velocity(puck: &PuckObject, point: Vec3) -> Vec3 {
    puck.body.pos_delta + puck.body.rot_axis.cross(point - puck.body.position)
}

/// Quadratic air drag opposing the puck's motion, applied once at the end
/// of each tick (§4.6).
pub fn apply_air_drag(puck: &mut PuckObject) {
    let speed_sq = puck.body.pos_delta.length_squared();
    if speed_sq <= 1e-12 {
        return;
    }
    let direction = puck.body.pos_delta * (1.0 / speed_sq.sqrt());
    puck.body.pos_delta -= direction * (DRAG_COEFFICIENT * speed_sq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat3;

    #[test]
    fn collision_vertices_lie_on_the_rim_radius() {
        let puck = PuckObject::spawn(Vec3::new(10.0, 1.0, 10.0), Mat3::IDENTITY);
        let verts = collision_vertices(&puck);
        assert_eq!(verts.len(), 3 * VERTEX_ANGLES);
        let v = verts[1] - puck.body.position; // middle-height vertex of angle 0
        let radial = Vec3::new(v.x, 0.0, v.z).length();
        assert!((radial - PUCK_RADIUS).abs() < 1e-5);
    }

    #[test]
    fn air_drag_reduces_speed_but_not_direction() {
        let mut puck = PuckObject::spawn(Vec3::ZERO, Mat3::IDENTITY);
        puck.body.pos_delta = Vec3::new(1.0, 0.0, 0.0);
        apply_air_drag(&mut puck);
        assert!(puck.body.pos_delta.x < 1.0);
        assert!(puck.body.pos_delta.x > 0.0);
        assert_eq!(puck.body.pos_delta.z, 0.0);
    }

    #[test]
    fn air_drag_is_noop_at_rest() {
        let mut puck = PuckObject::spawn(Vec3::ZERO, Mat3::IDENTITY);
        apply_air_drag(&mut puck);
        assert_eq!(puck.body.pos_delta, Vec3::ZERO);
    }
}
