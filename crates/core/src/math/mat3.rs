use super::vec3::Vec3;

/// A 3x3 matrix stored as three basis vectors, `x`/`y`/`z`. For an
/// orthonormal rotation matrix these are the world-space images of the
/// local X/Y/Z axes — the convention `WireProtocol` relies on when it
/// transmits only the `y` and `z` rows and reconstructs `x` as their cross
/// product (§4.2 of the design).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        x: Vec3::X,
        y: Vec3::Y,
        z: Vec3::Z,
    };

    pub const fn from_rows(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self { x, y, z }
    }

    /// Reconstructs the first basis vector from the other two, as done on
    /// wire decode where only `y` and `z` are transmitted.
    pub fn from_yz(y: Vec3, z: Vec3) -> Self {
        Self { x: y.cross(z), y, z }
    }

    /// Transforms a vector expressed in this matrix's local frame into the
    /// frame `self` is itself expressed in (world space, if `self` maps
    /// local-to-world).
    pub fn transform(self, local: Vec3) -> Vec3 {
        self.x * local.x + self.y * local.y + self.z * local.z
    }

    pub fn transpose(self) -> Mat3 {
        Mat3::from_rows(
            Vec3::new(self.x.x, self.y.x, self.z.x),
            Vec3::new(self.x.y, self.y.y, self.z.y),
            Vec3::new(self.x.z, self.y.z, self.z.z),
        )
    }

    /// Inverse of an orthonormal matrix is its transpose; used to move a
    /// world-space vector into local space.
    pub fn inverse_transform(self, world: Vec3) -> Vec3 {
        self.transpose().transform(world)
    }

    pub fn mul(self, rhs: Mat3) -> Mat3 {
        Mat3::from_rows(self.transform(rhs.x), self.transform(rhs.y), self.transform(rhs.z))
    }

    /// Re-orthonormalizes via Gram-Schmidt — used after repeated
    /// incremental rotation updates to keep `rotation` within the
    /// single-precision orthonormality invariant.
    pub fn orthonormalized(self) -> Mat3 {
        let x = self.x.normalize();
        let y = (self.y - x * self.y.dot(x)).normalize();
        let z = x.cross(y);
        Mat3::from_rows(x, y, z)
    }

    /// Rotates this matrix by `angle` radians about unit `axis`, expressed
    /// in the same frame this matrix is expressed in (Rodrigues' rotation
    /// formula applied to each basis vector).
    pub fn rotate(self, axis: Vec3, angle: f32) -> Mat3 {
        if angle.abs() <= 1e-9 {
            return self;
        }
        let (sin, cos) = angle.sin_cos();
        let rotate_vec = |v: Vec3| -> Vec3 {
            v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
        };
        Mat3::from_rows(rotate_vec(self.x), rotate_vec(self.y), rotate_vec(self.z)).orthonormalized()
    }
}
