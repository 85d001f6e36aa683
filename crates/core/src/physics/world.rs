//! Per-tick orchestration: player locomotion, puck sub-stepping, and
//! rink/stick/puck collision resolution, in the deterministic slot order
//! required by §4.6/§8.

use super::{player, projection_with_scale, puck, GRAVITY, SUBSTEPS_PER_TICK};
use crate::math::Vec3;
use crate::object::{Object, PlayerObject, PuckObject, STICK_SIZE};
use crate::rink::Rink;
use crate::session::PlayerInput;

const SUBSTEP_SCALE: f32 = 1.0 / SUBSTEPS_PER_TICK as f32;
const RINK_IMPULSE_SPRING: f32 = 0.0078125;
const RINK_IMPULSE_DAMPING: f32 = 0.015625;
const RINK_IMPULSE_SCALE: f32 = 0.05;
const STICK_PUCK_RANGE: f32 = 1.0;
const STICK_PUCK_SPRING: f32 = 0.0078125;
const STICK_PUCK_DAMPING: f32 = 0.015625;
const STICK_PUCK_SCALE: f32 = 0.5;
const STICK_LOSS_FRACTION: f32 = 0.25;
const PUCK_GAIN_FRACTION: f32 = 0.75;

pub const OBJECT_SLOTS: usize = 32;

/// Advances every occupied slot by one 100 Hz tick. `inputs[slot]` is read
/// only for slots holding a `Player`.
pub fn step_tick(objects: &mut [Option<Object>; OBJECT_SLOTS], inputs: &[PlayerInput; OBJECT_SLOTS], rink: &Rink) {
    for (slot, object) in objects.iter_mut().enumerate() {
        match object {
            Some(Object::Player(p)) => player::step_player(p, &inputs[slot]),
            Some(Object::Puck(p)) => p.body.pos_delta.y -= GRAVITY,
            None => {}
        }
    }

    for substep in 0..SUBSTEPS_PER_TICK {
        advance_substep_positions(objects);
        if substep == 0 {
            resolve_rink_collisions(objects, rink);
        }
        resolve_stick_puck_collisions(objects);
    }

    for object in objects.iter_mut() {
        if let Some(Object::Puck(p)) = object {
            puck::apply_air_drag(p);
            p.body.integrate_rotation();
        }
    }
}

fn advance_substep_positions(objects: &mut [Option<Object>; OBJECT_SLOTS]) {
    for object in objects.iter_mut() {
        match object {
            Some(Object::Puck(p)) => p.body.position += p.body.pos_delta * SUBSTEP_SCALE,
            Some(Object::Player(p)) => p.stick_pos += p.stick_pos_delta * SUBSTEP_SCALE,
            None => {}
        }
    }
}

fn resolve_rink_collisions(objects: &mut [Option<Object>; OBJECT_SLOTS], rink: &Rink) {
    for object in objects.iter_mut() {
        let Some(Object::Puck(p)) = object else { continue };
        resolve_puck_rink_collision(p, rink);
    }
}

fn resolve_puck_rink_collision(puck_obj: &mut PuckObject, rink: &Rink) {
    for vertex in puck::collision_vertices(puck_obj) {
        let Some((overlap, normal)) = rink.max_overlap(vertex) else { continue };
        let vertex_velocity = puck::point_velocity(puck_obj, vertex);
        let raw = normal * (RINK_IMPULSE_SPRING * overlap) - vertex_velocity * RINK_IMPULSE_DAMPING;
        let impulse = projection_with_scale(raw, normal, RINK_IMPULSE_SCALE);
        puck_obj.body.apply_impulse_at_point(impulse, vertex, crate::object::PUCK_ROT_FORCE_MULTIPLIER);
    }
}

fn resolve_stick_puck_collisions(objects: &mut [Option<Object>; OBJECT_SLOTS]) {
    let sticks: Vec<(usize, Vec3, crate::math::Mat3)> = objects
        .iter()
        .enumerate()
        .filter_map(|(slot, o)| match o {
            Some(Object::Player(p)) => Some((slot, p.stick_pos, p.stick_rot)),
            _ => None,
        })
        .collect();

    // `resolve_one_stick_contact` can't reach `objects[slot]` for the
    // owning player while a puck slot is already mutably borrowed out of
    // the same array, so the stick-side loss is accumulated here and
    // applied in a second pass once the puck borrow ends.
    let mut stick_losses: Vec<(usize, Vec3)> = Vec::new();

    for object in objects.iter_mut() {
        let Some(Object::Puck(puck_obj)) = object else { continue };
        for &(slot, stick_pos, stick_rot) in &sticks {
            if (puck_obj.body.position - stick_pos).length() > STICK_PUCK_RANGE {
                continue;
            }
            resolve_one_stick_contact(puck_obj, stick_pos, stick_rot, slot, &mut stick_losses);
        }
    }

    for (slot, loss) in stick_losses {
        if let Some(Object::Player(p)) = &mut objects[slot] {
            p.stick_pos_delta -= loss;
        }
    }
}

fn resolve_one_stick_contact(
    puck_obj: &mut PuckObject,
    stick_pos: Vec3,
    stick_rot: crate::math::Mat3,
    slot: usize,
    stick_losses: &mut Vec<(usize, Vec3)>,
) {
    let half_extents = STICK_SIZE * 0.5;
    for vertex in puck::collision_vertices(puck_obj) {
        let local = stick_rot.inverse_transform(vertex - stick_pos);
        let Some((depth, local_normal)) = point_inside_box(local, half_extents) else { continue };
        let normal = stick_rot.transform(local_normal);
        let vertex_velocity = puck::point_velocity(puck_obj, vertex);
        let raw = normal * (STICK_PUCK_SPRING * depth) - vertex_velocity * STICK_PUCK_DAMPING;
        let delta = projection_with_scale(raw, normal, STICK_PUCK_SCALE);
        puck_obj
            .body
            .apply_impulse_at_point(delta * PUCK_GAIN_FRACTION, vertex, crate::object::PUCK_ROT_FORCE_MULTIPLIER);
        stick_losses.push((slot, delta * STICK_LOSS_FRACTION));
    }
}

/// Penetration depth and outward face normal of `local_point` against a box
/// of half-extents `half_extents` centered at the local origin, or `None`
/// if the point is outside the box.
fn point_inside_box(local_point: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let dx = half_extents.x - local_point.x.abs();
    let dy = half_extents.y - local_point.y.abs();
    let dz = half_extents.z - local_point.z.abs();
    if dx <= 0.0 || dy <= 0.0 || dz <= 0.0 {
        return None;
    }
    let candidates = [
        (dx, Vec3::new(local_point.x.signum(), 0.0, 0.0)),
        (dy, Vec3::new(0.0, local_point.y.signum(), 0.0)),
        (dz, Vec3::new(0.0, 0.0, local_point.z.signum())),
    ];
    let mut best = candidates[0];
    for &c in &candidates[1..] {
        if c.0 < best.0 {
            best = c;
        }
    }
    Some(best)
}
