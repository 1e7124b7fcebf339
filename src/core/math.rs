//=========================================================================
// Spatial Math
//=========================================================================
//
// Minimal vector/rotation types used for pose bookkeeping.
//
// The core never simulates motion itself; it only snapshots, restores
// and compares poses that the physics collaborator reports.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ops::{Add, Mul, Sub};

//=== Vec3 ================================================================

/// World-space position or displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

//=== Quat ================================================================

/// Unit quaternion rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `degrees` around the world Z axis.
    pub fn from_rotation_z(degrees: f32) -> Self {
        let half = degrees.to_radians() * 0.5;
        Self { x: 0.0, y: 0.0, z: half.sin(), w: half.cos() }
    }

    pub fn dot(self, other: Quat) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Smallest angle in degrees between two rotations.
    pub fn angle_to(self, other: Quat) -> f32 {
        let d = self.dot(other).abs().min(1.0);
        (2.0 * d.acos()).to_degrees()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

//=== Pose ================================================================

/// Position plus rotation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with identity rotation.
    pub const fn at(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }

    /// True if the pose moved beyond the given thresholds relative to `other`.
    pub fn differs_from(&self, other: &Pose, max_sq_distance: f32, max_degrees: f32) -> bool {
        (self.position - other.position).length_squared() > max_sq_distance
            || self.rotation.angle_to(other.rotation) > max_degrees
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(Vec3::ZERO.distance(a), 3.0);
        assert_eq!(a.distance(Vec3::ZERO), 3.0);
    }

    #[test]
    fn angle_between_quarter_turns() {
        let q = Quat::from_rotation_z(90.0);
        assert!((Quat::IDENTITY.angle_to(q) - 90.0).abs() < 1e-3);
        assert!(q.angle_to(q) < 1e-2);
    }

    #[test]
    fn pose_differs_uses_both_thresholds() {
        let a = Pose::at(Vec3::ZERO);
        let nudged = Pose::at(Vec3::new(0.01, 0.0, 0.0));
        let moved = Pose::at(Vec3::new(0.1, 0.0, 0.0));
        let turned = Pose::new(Vec3::ZERO, Quat::from_rotation_z(5.0));

        assert!(!nudged.differs_from(&a, 0.0004, 0.5));
        assert!(moved.differs_from(&a, 0.0004, 0.5));
        assert!(turned.differs_from(&a, 0.0004, 0.5));
    }
}
