//! Tagged `Player`/`Puck` object record (§3) — the physical entity both the
//! physics step and the snapshot codec operate on. Replaces the duck-typed
//! object dictionary named in §9 with a tagged variant plus a shared `Body`.

use crate::math::{Mat3, Vec3};

pub const STICK_SIZE: Vec3 = Vec3::new(0.0625, 0.25, 0.5);
pub const PLAYER_ROT_FORCE_MULTIPLIER: Vec3 = Vec3::new(2.75, 6.16, 2.35);
pub const PLAYER_HEIGHT_MIN: f32 = 0.25;
pub const PLAYER_HEIGHT_MAX: f32 = 0.75;

pub const PUCK_RADIUS: f32 = 0.125;
pub const PUCK_HEIGHT: f32 = 0.04125;
pub const PUCK_ROT_FORCE_MULTIPLIER: Vec3 = Vec3::new(223.5, 128.0, 223.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Player = 0,
    Puck = 1,
}

/// Fields shared by every object: world position and velocity, and
/// orientation plus its per-tick axis-angle update (§3).
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub position: Vec3,
    pub pos_delta: Vec3,
    pub rotation: Mat3,
    pub rot_axis: Vec3,
}

impl Body {
    pub fn at_rest(position: Vec3, rotation: Mat3) -> Self {
        Self { position, pos_delta: Vec3::ZERO, rotation, rot_axis: Vec3::ZERO }
    }

    /// Applies a linear `impulse` acting at world-space `point` to both
    /// velocity and spin (§4.6: `applyImpulseAtPoint`). The rotational
    /// component is computed in body-local space so `rot_force_multiplier`
    /// can weight each local axis independently, then rotated back to world
    /// space before accumulating into `rot_axis`.
    pub fn apply_impulse_at_point(&mut self, impulse: Vec3, point: Vec3, rot_force_multiplier: Vec3) {
        self.pos_delta += impulse;
        let torque_world = impulse.cross(point - self.position);
        let torque_local = self.rotation.inverse_transform(torque_world);
        let scaled_local = Vec3::new(
            torque_local.x * rot_force_multiplier.x,
            torque_local.y * rot_force_multiplier.y,
            torque_local.z * rot_force_multiplier.z,
        );
        self.rot_axis += self.rotation.transform(scaled_local);
    }

    /// Integrates `rotation` by the accumulated `rot_axis` (direction is
    /// the axis, length is the angle in radians) and clears it, when the
    /// spin is large enough to matter (§4.6).
    pub fn integrate_rotation(&mut self) {
        let angle = self.rot_axis.length();
        if angle > 1e-5 {
            let axis = self.rot_axis * (1.0 / angle);
            self.rotation = self.rotation.rotate(axis, angle);
        }
    }
}

/// Azimuth/inclination placement control for stick targeting (§4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct StickPlacement {
    pub azimuth: f32,
    pub inclination: f32,
}

#[derive(Debug, Clone)]
pub struct PlayerObject {
    pub body: Body,
    pub stick_pos: Vec3,
    pub stick_pos_delta: Vec3,
    pub stick_rot: Mat3,
    pub stick_rot_target: StickPlacement,
    pub stick_rot_target_delta: StickPlacement,
    pub height: f32,
    pub head_rot: f32,
    pub body_rot: f32,
    pub stick_angle: f32,
    pub is_too_low: bool,
    /// Back-reference to the owning session's player slot (§9 cyclic
    /// reference note: a non-owning integer index, never a pointer).
    pub owner_slot: u8,
}

impl PlayerObject {
    pub fn spawn(position: Vec3, rotation: Mat3, owner_slot: u8) -> Self {
        Self {
            body: Body::at_rest(position, rotation),
            stick_pos: position,
            stick_pos_delta: Vec3::ZERO,
            stick_rot: rotation,
            stick_rot_target: StickPlacement::default(),
            stick_rot_target_delta: StickPlacement::default(),
            height: PLAYER_HEIGHT_MAX,
            head_rot: 0.0,
            body_rot: 0.0,
            stick_angle: 0.0,
            is_too_low: false,
            owner_slot,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PuckObject {
    pub body: Body,
}

impl PuckObject {
    pub fn spawn(position: Vec3, rotation: Mat3) -> Self {
        Self { body: Body::at_rest(position, rotation) }
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Player(PlayerObject),
    Puck(PuckObject),
}

impl Object {
    pub fn body(&self) -> &Body {
        match self {
            Object::Player(p) => &p.body,
            Object::Puck(p) => &p.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Object::Player(p) => &mut p.body,
            Object::Puck(p) => &mut p.body,
        }
    }

    pub fn type_tag(&self) -> ObjectType {
        match self {
            Object::Player(_) => ObjectType::Player,
            Object::Puck(_) => ObjectType::Puck,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerObject> {
        match self {
            Object::Player(p) => Some(p),
            Object::Puck(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerObject> {
        match self {
            Object::Player(p) => Some(p),
            Object::Puck(_) => None,
        }
    }

    pub fn as_puck(&self) -> Option<&PuckObject> {
        match self {
            Object::Puck(p) => Some(p),
            Object::Player(_) => None,
        }
    }
}
