//! Player locomotion and stick kinematics (§4.6).

use super::stick;
use super::{approach, projection_with_scale, GRAVITY};
use crate::keys::Keys;
use crate::math::Vec3;
use crate::object::{PlayerObject, PLAYER_HEIGHT_MAX, PLAYER_HEIGHT_MIN, PLAYER_ROT_FORCE_MULTIPLIER};
use crate::session::PlayerInput;

const GROUND_SPEED: f32 = 0.05;
const GROUND_ACCEL_LIMIT: f32 = 0.000_555_55;
const GROUND_BRAKE_LIMIT: f32 = 0.000_208;
const SIDESLIP_LIMIT: f32 = 0.000_277_78;
const JUMP_IMPULSE: f32 = 0.025;
const YAW_RATE_SHIFT: f32 = 5.6 / 14400.0;
const YAW_RATE_NORMAL: f32 = 6.0 / 14400.0;
const CROUCH_RATE: f32 = 0.015625;
const STAND_RATE: f32 = 0.125;
const GROUND_REACTION_SCALE: f32 = 0.00390625;
const GROUND_REACTION_FACTOR: f32 = 1.2;
const GROUND_REACTION_FACTOR_SHIFT: f32 = 0.4;
const TOO_LOW_Y: f32 = 0.5;
const TOO_LOW_SPEED: f32 = 0.025;
const TOO_LOW_ACCEL: f32 = 0.000_555_555;
const TOO_LOW_SPIN_DAMP: f32 = 0.975;
const TOO_LOW_TORQUE_LIMIT: f32 = 0.000347;
const STICK_SPRING_STIFFNESS: f32 = 0.0625;
const STICK_SPRING_DAMPING: f32 = 0.5;
const STICK_RATE_LIMIT: f32 = 0.008_888_88;
const STICK_TARGET_OFFSET: f32 = 1.75;
const STICK_REACTION_FRACTION: f32 = 0.004;

/// Hand-sign pivot offset (§3 `stickPos`/`stickRot` kinematics). The
/// original hard-codes a single hand; per §9 open question (ii) this is a
/// per-player constant left fixed at right-handed for now (see DESIGN.md).
const HAND_PIVOT: Vec3 = Vec3::new(0.375, -0.5, -0.125);

pub fn step_player(player: &mut PlayerObject, input: &PlayerInput) {
    integrate_position_and_gravity(player);
    let on_ground = ground_contact(player);
    apply_locomotion(player, input, on_ground);
    apply_jump(player, input);
    apply_turning(player, input, on_ground);
    player.body.integrate_rotation();
    apply_crouch(player, input);
    apply_ground_reaction(player, input);
    apply_too_low_safety_net(player);
    step_stick(player, input);
}

fn integrate_position_and_gravity(player: &mut PlayerObject) {
    player.body.position += player.body.pos_delta;
    player.body.pos_delta.y -= GRAVITY;
}

fn feet_position(player: &PlayerObject) -> Vec3 {
    player.body.position - player.body.rotation.y * player.height
}

fn ground_contact(player: &PlayerObject) -> bool {
    feet_position(player).y <= 0.0
}

fn flatten_to_ground(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize()
}

fn apply_locomotion(player: &mut PlayerObject, input: &PlayerInput, on_ground: bool) {
    if !on_ground {
        return;
    }
    let ground_dir = flatten_to_ground(player.body.rotation.z);
    let desired = ground_dir * (input.fwd_back.clamp(-1.0, 1.0) * GROUND_SPEED);
    player.body.pos_delta = approach(player.body.pos_delta, desired, GROUND_ACCEL_LIMIT, GROUND_BRAKE_LIMIT);
}

fn apply_jump(player: &mut PlayerObject, input: &PlayerInput) {
    if input.keys.pressed_edge(input.prev_keys, Keys::JUMP) {
        player.body.pos_delta.y += JUMP_IMPULSE;
    }
}

fn apply_turning(player: &mut PlayerObject, input: &PlayerInput, on_ground: bool) {
    let turn = input.turn.clamp(-1.0, 1.0);
    let shift = input.keys.contains(Keys::SHIFT);

    if on_ground && shift {
        let side_dir = flatten_to_ground(player.body.rotation.x);
        let desired = side_dir * (turn * GROUND_SPEED);
        player.body.pos_delta = approach(player.body.pos_delta, desired, SIDESLIP_LIMIT, SIDESLIP_LIMIT);
    }

    let yaw_rate = if shift { -turn * YAW_RATE_SHIFT } else { turn * YAW_RATE_NORMAL };
    player.body.rot_axis += player.body.rotation.y * yaw_rate;
}

fn apply_crouch(player: &mut PlayerObject, input: &PlayerInput) {
    player.height = if input.keys.contains(Keys::CROUCH) {
        (player.height - CROUCH_RATE).max(PLAYER_HEIGHT_MIN)
    } else {
        (player.height + STAND_RATE).min(PLAYER_HEIGHT_MAX)
    };
}

/// `isTooLow` ground reaction: an upward correction plus a forward-direction
/// projection, so a player whose feet have sunk below the floor is pushed
/// back up rather than tunneling through it (§4.6).
fn apply_ground_reaction(player: &mut PlayerObject, input: &PlayerInput) {
    let feet = feet_position(player);
    if feet.y >= 0.0 {
        return;
    }
    let shift = input.keys.contains(Keys::SHIFT);
    let forward = if shift { player.body.rotation.x } else { player.body.rotation.z };
    let factor = if shift { GROUND_REACTION_FACTOR_SHIFT } else { GROUND_REACTION_FACTOR };
    let proj_y = -feet.y * GROUND_REACTION_SCALE - player.body.pos_delta.y * 0.25;
    let tangential = player.body.pos_delta.reject_from(forward.normalize());
    let tmp = Vec3::new(tangential.x, proj_y, tangential.z);
    player.body.pos_delta = projection_with_scale(tmp, Vec3::Y, factor);
}

fn apply_too_low_safety_net(player: &mut PlayerObject) {
    player.is_too_low = false;
    if player.body.position.y < TOO_LOW_Y && player.body.pos_delta.length() < TOO_LOW_SPEED {
        player.body.pos_delta.y += TOO_LOW_ACCEL;
        player.is_too_low = true;
    }
    if player.is_too_low {
        player.body.rot_axis *= TOO_LOW_SPIN_DAMP;
        let lateral = player.body.rotation.y.reject_from(Vec3::Y);
        let spin_from_motion = player.body.rotation.z.cross(player.body.pos_delta);
        let torque = (lateral + spin_from_motion).clamp_component(-TOO_LOW_TORQUE_LIMIT, TOO_LOW_TORQUE_LIMIT);
        player.body.rot_axis += torque;
    }
}

/// Stick spring integration: the stick's placement and tip position both
/// chase a target with a spring-damper, with a small fraction of the tip's
/// corrective force reacting back onto the player's body (§4.6).
fn step_stick(player: &mut PlayerObject, input: &PlayerInput) {
    let target = crate::object::StickPlacement { azimuth: input.stick_x, inclination: input.stick_y };
    stick::spring_toward(
        &mut player.stick_rot_target,
        &mut player.stick_rot_target_delta,
        target,
        STICK_SPRING_STIFFNESS,
        STICK_SPRING_DAMPING,
        STICK_RATE_LIMIT,
    );

    player.stick_angle = input.stick_angle;
    let pivot = player.body.position + player.body.rotation.transform(HAND_PIVOT);
    let tentative = stick::orient(&player.body.rotation, player.stick_rot_target);
    player.stick_rot = stick::roll_shaft(tentative, player.stick_angle);

    let target_pos = pivot - player.stick_rot.z * STICK_TARGET_OFFSET;
    let target_pos = Vec3::new(target_pos.x, target_pos.y.max(0.0), target_pos.z);

    let spring = (target_pos - player.stick_pos) * STICK_SPRING_STIFFNESS
        - player.stick_pos_delta * STICK_SPRING_DAMPING;
    // Velocity of the target point on the rotating body, to first order:
    // linear velocity plus the rigid-body rotational term `rot_axis x r`.
    let body_point_velocity = player.body.pos_delta + player.body.rot_axis.cross(target_pos - player.body.position);
    let accel = spring + body_point_velocity * 0.5;

    let stick_accel = accel * (1.0 - STICK_REACTION_FRACTION);
    let body_reaction = accel * STICK_REACTION_FRACTION;

    player.stick_pos_delta += stick_accel;
    player
        .body
        .apply_impulse_at_point(-body_reaction, target_pos, PLAYER_ROT_FORCE_MULTIPLIER);
    // `stick_pos` itself is integrated during the 10-substep puck/stick
    // collision pass (`world::step_tick`), not here (§4.6).
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat3;

    fn idle_input() -> PlayerInput {
        PlayerInput::default()
    }

    #[test]
    fn gravity_reduces_vertical_velocity_each_tick() {
        let mut player = PlayerObject::spawn(Vec3::new(10.0, 5.0, 10.0), Mat3::IDENTITY, 0);
        step_player(&mut player, &idle_input());
        assert!(player.body.pos_delta.y < 0.0);
    }

    #[test]
    fn jump_is_edge_triggered_not_held() {
        let mut player = PlayerObject::spawn(Vec3::new(10.0, 0.0, 10.0), Mat3::IDENTITY, 0);
        let mut input = idle_input();
        input.keys = Keys::JUMP;
        step_player(&mut player, &input);
        let y_after_jump = player.body.pos_delta.y;

        input.prev_keys = Keys::JUMP;
        step_player(&mut player, &input);
        assert!(player.body.pos_delta.y < y_after_jump + JUMP_IMPULSE);
    }

    #[test]
    fn crouch_ramps_height_toward_minimum() {
        let mut player = PlayerObject::spawn(Vec3::new(10.0, 2.0, 10.0), Mat3::IDENTITY, 0);
        let mut input = idle_input();
        input.keys = Keys::CROUCH;
        for _ in 0..200 {
            step_player(&mut player, &input);
        }
        assert!((player.height - PLAYER_HEIGHT_MIN).abs() < 1e-3);
    }

    #[test]
    fn rotation_stays_orthonormal_after_many_ticks() {
        let mut player = PlayerObject::spawn(Vec3::new(10.0, 2.0, 10.0), Mat3::IDENTITY, 0);
        let mut input = idle_input();
        input.turn = 0.3;
        for _ in 0..500 {
            step_player(&mut player, &input);
        }
        let r = player.body.rotation;
        assert!((r.x.length() - 1.0).abs() < 1e-2);
        assert!(r.x.dot(r.y).abs() < 1e-1);
    }
}
