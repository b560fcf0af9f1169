//! Rigid transforms shared by the simulation and planning sides.

use bevy_math::Isometry3d;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::{Mul, MulAssign};

/// A rigid transform (translation `p`, rotation `q`).
///
/// Composition follows the usual frame convention: `a * b` first applies `b`,
/// then `a`, so `T_world_obj = T_world_link * T_link_obj`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation.
    pub p: Vec3,
    /// Rotation (unit quaternion).
    pub q: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        p: Vec3::ZERO,
        q: Quat::IDENTITY,
    };

    pub const fn new(p: Vec3, q: Quat) -> Self {
        Self { p, q }
    }

    pub const fn from_translation(p: Vec3) -> Self {
        Self {
            p,
            q: Quat::IDENTITY,
        }
    }

    pub const fn from_rotation(q: Quat) -> Self {
        Self { p: Vec3::ZERO, q }
    }

    /// Returns the inverse transform.
    pub fn inverse(&self) -> Self {
        let q_inv = self.q.inverse();
        Self {
            p: -(q_inv * self.p),
            q: q_inv,
        }
    }

    /// The local X axis expressed in the parent frame.
    pub fn x_axis(&self) -> Vec3 {
        self.q * Vec3::X
    }

    /// The local Y axis expressed in the parent frame.
    pub fn y_axis(&self) -> Vec3 {
        self.q * Vec3::Y
    }

    /// The local Z axis expressed in the parent frame.
    pub fn z_axis(&self) -> Vec3 {
        self.q * Vec3::Z
    }

    /// Approximate equality on translation and rotation (sign-agnostic for `q`).
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.p.abs_diff_eq(other.p, max_abs_diff)
            && (self.q.abs_diff_eq(other.q, max_abs_diff)
                || self.q.abs_diff_eq(-other.q, max_abs_diff))
    }

    pub fn to_isometry(self) -> Isometry3d {
        Isometry3d::new(self.p, self.q)
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            p: self.q * rhs.p + self.p,
            q: (self.q * rhs.q).normalize(),
        }
    }
}

impl MulAssign for Pose {
    fn mul_assign(&mut self, rhs: Pose) {
        *self = *self * rhs;
    }
}

impl From<(Vec3, Quat)> for Pose {
    fn from((p, q): (Vec3, Quat)) -> Self {
        Self { p, q }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn inverse_cancels() {
        let pose = Pose::new(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1),
        );
        assert!((pose * pose.inverse()).abs_diff_eq(&Pose::IDENTITY, 1e-5));
        assert!((pose.inverse() * pose).abs_diff_eq(&Pose::IDENTITY, 1e-5));
    }

    #[test]
    fn composition_applies_right_first() {
        let link = Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_z(FRAC_PI_2));
        let offset = Pose::from_translation(Vec3::X);
        let world = link * offset;
        // +X in the link frame is +Y in the world after the yaw.
        assert!(world.p.abs_diff_eq(Vec3::new(0.0, 1.0, 1.0), 1e-6));
    }

    #[test]
    fn axes_follow_rotation() {
        let pose = Pose::from_rotation(Quat::from_rotation_y(-FRAC_PI_2));
        assert!(pose.x_axis().abs_diff_eq(Vec3::Z, 1e-6));
        assert!(pose.y_axis().abs_diff_eq(Vec3::Y, 1e-6));
    }
}
