//! Pose type definition

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pose (position and orientation) as written in URDF `<origin>` elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub xyz: [f32; 3],
    pub rpy: [f32; 3], // roll, pitch, yaw in radians
}

impl Pose {
    pub fn new(xyz: [f32; 3], rpy: [f32; 3]) -> Self {
        Self { xyz, rpy }
    }

    pub fn from_position(xyz: [f32; 3]) -> Self {
        Self { xyz, rpy: [0.0; 3] }
    }

    /// Orientation as a unit quaternion.
    ///
    /// URDF rpy are fixed-axis rotations about X, then Y, then Z, which is the
    /// intrinsic Z-Y-X composition `Rz(yaw) * Ry(pitch) * Rx(roll)`.
    pub fn to_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::ZYX, self.rpy[2], self.rpy[1], self.rpy[0])
    }

    /// Get position as Vec3
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.xyz)
    }

    /// True when both translation and rotation are exactly zero
    pub fn is_identity(&self) -> bool {
        self.xyz == [0.0; 3] && self.rpy == [0.0; 3]
    }
}

impl From<&urdf_rs::Pose> for Pose {
    fn from(urdf_pose: &urdf_rs::Pose) -> Self {
        Self {
            xyz: [
                urdf_pose.xyz.0[0] as f32,
                urdf_pose.xyz.0[1] as f32,
                urdf_pose.xyz.0[2] as f32,
            ],
            rpy: [
                urdf_pose.rpy.0[0] as f32,
                urdf_pose.rpy.0[1] as f32,
                urdf_pose.rpy.0[2] as f32,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_turns_x_into_y() {
        let pose = Pose::new([0.0; 3], [0.0, 0.0, std::f32::consts::FRAC_PI_2]);
        let turned = pose.to_quat() * Vec3::X;
        assert!(turned.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_roll_is_applied_before_yaw() {
        // roll 90 deg then yaw 90 deg: local Y goes to Z under roll, and Z is
        // unaffected by the yaw that follows
        let pose = Pose::new(
            [0.0; 3],
            [std::f32::consts::FRAC_PI_2, 0.0, std::f32::consts::FRAC_PI_2],
        );
        let turned = pose.to_quat() * Vec3::Y;
        assert!(turned.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_from_urdf_pose() {
        let urdf_pose = urdf_rs::Pose {
            xyz: urdf_rs::Vec3([1.0, 2.0, 3.0]),
            rpy: urdf_rs::Vec3([0.1, 0.2, 0.3]),
        };

        let pose = Pose::from(&urdf_pose);
        assert_eq!(pose.xyz, [1.0, 2.0, 3.0]);
        assert_eq!(pose.rpy, [0.1, 0.2, 0.3]);
        assert!(!pose.is_identity());
        assert!(Pose::default().is_identity());
    }
}
