//! Bijection between a unit vector and an odd-bit integer via recursive
//! octahedral-triangle subdivision (§4.2). Wire widths used elsewhere in
//! the codebase: `B=31` for object orientation rows, `B=25` for stick
//! rotation rows.

use crate::math::Vec3;

const UNIT_VECTORS: [Vec3; 6] = [
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 1.0, 0.0),
];

const CHOICE_1: [usize; 8] = [5, 5, 5, 5, 4, 1, 3, 2];
const CHOICE_2: [usize; 8] = [3, 4, 2, 1, 3, 4, 2, 1];
const CHOICE_3: [usize; 8] = [4, 1, 3, 2, 0, 0, 0, 0];

fn initial_triangle(v: Vec3) -> (usize, Vec3, Vec3, Vec3) {
    let mut octant = 0usize;
    if v.x < 0.0 {
        octant |= 1;
    }
    if v.z < 0.0 {
        octant |= 2;
    }
    if v.y < 0.0 {
        octant |= 4;
    }
    (
        octant,
        UNIT_VECTORS[CHOICE_1[octant]],
        UNIT_VECTORS[CHOICE_2[octant]],
        UNIT_VECTORS[CHOICE_3[octant]],
    )
}

/// Encodes unit vector `v` into `bits` bits (odd, >= 5).
pub fn encode(bits: u8, v: Vec3) -> u32 {
    debug_assert!(bits % 2 == 1 && bits >= 5);
    let (octant, mut a1, mut a2, mut a3) = initial_triangle(v);
    let mut result = octant as u32;

    let mut i = 3u8;
    while i < bits {
        let mid_12 = (a1 + a2).normalize();
        let mid_23 = (a2 + a3).normalize();
        let mid_31 = (a3 + a1).normalize();

        // Each sub-triangle of the medial subdivision is tested in turn by
        // the signed triple product of `v` against the cutting edge shared
        // with the medial (center) triangle. Ties fall through in priority
        // order 0 -> 1 -> 2 -> 3, per §4.2.
        if cutting_side(v, mid_31, mid_12) >= 0.0 {
            a2 = mid_12;
            a3 = mid_31;
        } else if cutting_side(v, mid_12, mid_23) >= 0.0 {
            result |= 1 << i;
            a1 = mid_12;
            a3 = mid_23;
        } else if cutting_side(v, mid_23, mid_31) >= 0.0 {
            result |= 2 << i;
            a1 = mid_31;
            a2 = mid_23;
        } else {
            result |= 3 << i;
            a1 = mid_12;
            a2 = mid_23;
            a3 = mid_31;
        }
        i += 2;
    }
    result
}

/// Signed triple product used to decide which side of the medial edge
/// `(vertex, edge)` the point `v` falls on.
fn cutting_side(v: Vec3, vertex: Vec3, edge: Vec3) -> f32 {
    let b1 = v - vertex;
    let b2 = edge - vertex;
    b2.cross(b1).dot(v)
}

/// Decodes `n` (encoded with `bits` bits) back into a unit vector.
pub fn decode(bits: u8, n: u32) -> Vec3 {
    debug_assert!(bits % 2 == 1 && bits >= 5);
    let octant = (n & 0x7) as usize;
    let mut a1 = UNIT_VECTORS[CHOICE_1[octant]];
    let mut a2 = UNIT_VECTORS[CHOICE_2[octant]];
    let mut a3 = UNIT_VECTORS[CHOICE_3[octant]];

    let mut i = 3u8;
    while i < bits {
        let c = (n >> i) & 0x3;
        let mid_12 = (a1 + a2).normalize();
        let mid_23 = (a2 + a3).normalize();
        let mid_31 = (a3 + a1).normalize();
        match c {
            0 => {
                a2 = mid_12;
                a3 = mid_31;
            }
            1 => {
                a1 = mid_12;
                a3 = mid_23;
            }
            2 => {
                a1 = mid_31;
                a2 = mid_23;
            }
            3 => {
                a1 = mid_12;
                a2 = mid_23;
                a3 = mid_31;
            }
            _ => unreachable!("2-bit field"),
        }
        i += 2;
    }
    (a1 + a2 + a3).normalize()
}
