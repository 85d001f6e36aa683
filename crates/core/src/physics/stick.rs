//! Stick placement spring-damper and pose construction (§4.6).

use crate::math::Mat3;
use crate::object::StickPlacement;

/// Spring-damps `current`/`velocity` toward `target`, rate-limited per
/// component per tick.
pub fn spring_toward(
    current: &mut StickPlacement,
    velocity: &mut StickPlacement,
    target: StickPlacement,
    stiffness: f32,
    damping: f32,
    rate_limit: f32,
) {
    let accel_az = (target.azimuth - current.azimuth) * stiffness - velocity.azimuth * damping;
    let accel_inc = (target.inclination - current.inclination) * stiffness - velocity.inclination * damping;
    velocity.azimuth = (velocity.azimuth + accel_az).clamp(-rate_limit, rate_limit);
    velocity.inclination = (velocity.inclination + accel_inc).clamp(-rate_limit, rate_limit);
    current.azimuth += velocity.azimuth;
    current.inclination += velocity.inclination;
}

/// Builds the stick's tentative world orientation: a yaw around the body's
/// Y axis, then a pitch around the resulting X axis, with a half-pi tilt
/// once the stick points upward (§4.6).
pub fn orient(body_rotation: &Mat3, placement: StickPlacement) -> Mat3 {
    let mut rot = body_rotation.rotate(body_rotation.y, placement.azimuth);
    rot = rot.rotate(rot.x, placement.inclination);
    if placement.inclination > 0.0 {
        rot = rot.rotate(rot.x, std::f32::consts::FRAC_PI_2);
    }
    rot
}

/// Rolls the shaft about the handle axis by the client's reported stick
/// angle (§4.6: `normalize(stickRot.z + 0.75*stickRot.y)`).
pub fn roll_shaft(rot: Mat3, stick_angle: f32) -> Mat3 {
    let handle_axis = (rot.z + rot.y * 0.75).normalize();
    rot.rotate(handle_axis, -stick_angle * std::f32::consts::FRAC_PI_4)
}
