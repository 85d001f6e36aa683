//! Rectangular rink with rounded corners (§3): five bounding half-spaces
//! (floor and four walls) plus four quarter-cylinder corners. Used by the
//! physics step to resolve puck/player-vertex collisions against the ice
//! boundary.

use crate::math::Vec3;

/// Default rink dimensions (§6).
pub const DEFAULT_WIDTH: f32 = 30.0;
pub const DEFAULT_LENGTH: f32 = 61.0;
pub const DEFAULT_CORNER_RADIUS: f32 = 8.5;

/// A half-space boundary: points satisfy `dot(p, normal) <= offset` inside
/// the rink. `normal` points inward.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    offset: f32,
}

impl Plane {
    /// Positive overlap means `point` has penetrated past the boundary by
    /// that distance along `normal`.
    fn overlap(&self, point: Vec3) -> f32 {
        self.offset - point.dot(self.normal)
    }
}

/// One of the four vertical quarter-cylinders rounding off the rink
/// corners, axis parallel to Y at `(center_x, center_z)`.
#[derive(Debug, Clone, Copy)]
struct Corner {
    center_x: f32,
    center_z: f32,
    radius: f32,
    /// Inward direction in the XZ-plane away from the corner apex — the
    /// quadrant this corner cylinder concaves into.
    quadrant: Vec3,
}

impl Corner {
    fn overlap(&self, point: Vec3) -> Option<(f32, Vec3)> {
        let dx = point.x - self.center_x;
        let dz = point.z - self.center_z;
        // Only active in the quadrant this corner occupies (the octant
        // where both offsets share sign with `quadrant`).
        if dx * self.quadrant.x < 0.0 || dz * self.quadrant.z < 0.0 {
            return None;
        }
        let dist = (dx * dx + dz * dz).sqrt();
        if dist <= 1e-6 {
            return None;
        }
        let overlap = dist - self.radius;
        if overlap >= 0.0 {
            return None;
        }
        let normal = Vec3::new(-dx / dist, 0.0, -dz / dist);
        Some((-overlap, normal))
    }
}

#[derive(Debug, Clone)]
pub struct Rink {
    width: f32,
    length: f32,
    corner_radius: f32,
    planes: [Plane; 5],
    corners: [Corner; 4],
}

impl Rink {
    pub fn new(width: f32, length: f32, corner_radius: f32) -> Self {
        let planes = [
            Plane { normal: Vec3::Y, offset: 0.0 },                     // floor
            Plane { normal: Vec3::X, offset: width },                  // +x wall
            Plane { normal: -Vec3::X, offset: 0.0 },                   // -x wall
            Plane { normal: Vec3::Z, offset: length },                 // +z wall
            Plane { normal: -Vec3::Z, offset: 0.0 },                   // -z wall
        ];
        let corners = [
            Corner { center_x: corner_radius, center_z: corner_radius, radius: corner_radius, quadrant: Vec3::new(-1.0, 0.0, -1.0) },
            Corner { center_x: width - corner_radius, center_z: corner_radius, radius: corner_radius, quadrant: Vec3::new(1.0, 0.0, -1.0) },
            Corner { center_x: width - corner_radius, center_z: length - corner_radius, radius: corner_radius, quadrant: Vec3::new(1.0, 0.0, 1.0) },
            Corner { center_x: corner_radius, center_z: length - corner_radius, radius: corner_radius, quadrant: Vec3::new(-1.0, 0.0, 1.0) },
        ];
        Self { width, length, corner_radius, planes, corners }
    }

    pub fn default_sized() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_LENGTH, DEFAULT_CORNER_RADIUS)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Returns the maximum positive overlap across every plane and corner
    /// at `point`, with the corresponding inward normal — `None` if the
    /// point is fully inside the boundary (§4.6 "query Rink: find the
    /// maximum positive overlap").
    pub fn max_overlap(&self, point: Vec3) -> Option<(f32, Vec3)> {
        // Corners take precedence near the rounded regions: a point inside
        // a corner's quadrant is tested against the cylinder, not the two
        // straight walls it replaces.
        for corner in &self.corners {
            if let Some(result) = corner.overlap(point) {
                return Some(result);
            }
        }
        let mut best: Option<(f32, Vec3)> = None;
        for plane in &self.planes {
            let overlap = plane.overlap(point);
            if overlap > 0.0 && best.map(|(b, _)| overlap > b).unwrap_or(true) {
                best = Some((overlap, plane.normal));
            }
        }
        best
    }
}
