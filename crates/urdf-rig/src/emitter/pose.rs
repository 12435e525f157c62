use super::{BoneMap, SkeletonEmitter};
use crate::config::AxisPolicy;
use crate::error::{ImportWarning, RigError};
use crate::host::{ArmatureId, BoneId, ChannelLocks, SceneHost};
use crate::tree::JointNode;
use crate::types::Axis;

impl SkeletonEmitter<'_> {
    /// Pass 2: configure bones and attach visuals.
    ///
    /// Must run in pose mode, after [`SkeletonEmitter::rest_pass`] created the
    /// bones. Fixed leaves get no bone configuration: their link is hung off
    /// the parent bone at the joint offset.
    pub fn pose_pass<H: SceneHost>(
        &mut self,
        host: &mut H,
        armature: ArmatureId,
    ) -> Result<BoneMap, RigError> {
        let mut bones = BoneMap::with_capacity(self.tree.len());
        let tree = self.tree;

        for id in tree.depth_first() {
            let node = tree.node(id);

            if node.is_fixed_leaf() {
                if let Some(parent_bone) = node.parent.and_then(|p| bones.get(&p)).copied() {
                    self.attach_visual(
                        host,
                        armature,
                        &node.link,
                        parent_bone,
                        Some(node.local_position),
                        Some(node.local_orientation),
                    )?;
                }
                continue;
            }

            let bone = host
                .find_bone(armature, &node.name)
                .ok_or_else(|| RigError::BoneNotFound(node.name.clone()))?;

            if !node.is_leaf() {
                host.set_channel_locks(bone, ChannelLocks::ALL)?;
            }
            for axis in Axis::ALL {
                host.set_ik_lock(bone, axis, true)?;
            }
            self.configure_joint(host, bone, node)?;

            self.attach_visual(host, armature, &node.link, bone, None, None)?;
            bones.insert(id, bone);
        }

        Ok(bones)
    }

    /// Open the IK axis of a joint and apply its limits.
    ///
    /// Only the first nonzero axis component in x, y, z order is configured.
    fn configure_joint<H: SceneHost>(
        &mut self,
        host: &mut H,
        bone: BoneId,
        node: &JointNode,
    ) -> Result<(), RigError> {
        let Some(axis) = node.axis else {
            return Ok(());
        };

        let mut active = Axis::ALL.into_iter().filter(|a| axis[a.index()] != 0.0);
        let Some(first) = active.next() else {
            return Ok(());
        };

        if active.next().is_some() {
            match self.options.axis_policy {
                AxisPolicy::Reject => {
                    return Err(RigError::MultiAxisJoint {
                        joint: node.name.clone(),
                        axis: axis.to_array(),
                    });
                }
                AxisPolicy::FirstNonZero => {
                    tracing::warn!(
                        "Joint {} has several active axis components {:?}, using {:?}",
                        node.name,
                        axis,
                        first
                    );
                    self.warnings.push(ImportWarning::MultiAxisJoint {
                        joint: node.name.clone(),
                        axis: axis.to_array(),
                    });
                }
            }
        }

        host.set_ik_lock(bone, first, false)?;
        host.set_ik_limit(bone, first, node.limit.map(|l| (l.lower, l.upper)))?;
        tracing::debug!("Configured joint {} ({}) on {:?}", node.name, node.kind, first);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{AxisPolicy, ImportOptions};
    use crate::document::{JointDecl, LinkDecl, RobotDocument};
    use crate::emitter::{Emission, SkeletonEmitter};
    use crate::error::{ImportWarning, RigError};
    use crate::host::{ChannelLocks, EditMode, SceneHost};
    use crate::material::MaterialRegistry;
    use crate::resolve::PackageResolver;
    use crate::scene::MemoryScene;
    use crate::tree::KinematicTree;
    use crate::types::JointKind;
    use glam::Vec3;

    fn two_joints(axis: [f32; 3]) -> RobotDocument {
        RobotDocument::new("bot")
            .with_link(LinkDecl::new("base"))
            .with_link(LinkDecl::new("upper"))
            .with_link(LinkDecl::new("lower"))
            .with_joint(
                JointDecl::new("shoulder", JointKind::Revolute, "base", "upper")
                    .with_axis(axis)
                    .with_limit(-1.0, 1.0),
            )
            .with_joint(
                JointDecl::new("elbow", JointKind::Continuous, "upper", "lower")
                    .with_axis([0.0, 1.0, 0.0]),
            )
    }

    type Outcome = (MemoryScene, Result<Emission, RigError>, Vec<ImportWarning>);

    fn emit(document: &RobotDocument, options: &ImportOptions) -> Outcome {
        let tree = KinematicTree::build(document).unwrap();
        let registry = MaterialRegistry::new();
        let resolver = PackageResolver::default();
        let mut scene = MemoryScene::new();
        let mut emitter = SkeletonEmitter::new(&tree, options, &registry, &resolver);
        let result = emitter.emit(&mut scene, "bot");
        (scene, result, emitter.into_warnings())
    }

    #[test]
    fn test_x_axis_limits() {
        let (scene, result, warnings) = emit(&two_joints([1.0, 0.0, 0.0]), &Default::default());
        let armature = result.unwrap().armature;

        let shoulder = scene.bone(scene.find_bone(armature, "shoulder").unwrap()).unwrap();
        assert_eq!(shoulder.ik_locked, [false, true, true]);
        assert_eq!(shoulder.ik_limit_enabled, [true, false, false]);
        assert_eq!(shoulder.ik_bounds, [Some((-1.0, 1.0)), None, None]);
        assert_eq!(shoulder.locks, ChannelLocks::ALL);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_leaf_keeps_channels_and_has_no_bounds() {
        let (scene, result, _) = emit(&two_joints([1.0, 0.0, 0.0]), &Default::default());
        let armature = result.unwrap().armature;

        let elbow = scene.bone(scene.find_bone(armature, "elbow").unwrap()).unwrap();
        assert_eq!(elbow.locks, ChannelLocks::default());
        assert_eq!(elbow.ik_locked, [true, false, true]);
        assert_eq!(elbow.ik_limit_enabled, [false, true, false]);
        assert_eq!(elbow.ik_bounds, [None; 3]);
    }

    #[test]
    fn test_multi_axis_first_nonzero_warns() {
        let (scene, result, warnings) = emit(&two_joints([0.0, 1.0, 1.0]), &Default::default());
        let armature = result.unwrap().armature;

        let shoulder = scene.bone(scene.find_bone(armature, "shoulder").unwrap()).unwrap();
        assert_eq!(shoulder.ik_locked, [true, false, true]);
        assert_eq!(
            warnings,
            vec![ImportWarning::MultiAxisJoint {
                joint: "shoulder".into(),
                axis: [0.0, 1.0, 1.0],
            }]
        );
    }

    #[test]
    fn test_multi_axis_reject() {
        let options = ImportOptions::default().with_axis_policy(AxisPolicy::Reject);
        let (_, result, _) = emit(&two_joints([1.0, 1.0, 0.0]), &options);
        assert!(matches!(
            result,
            Err(RigError::MultiAxisJoint { joint, .. }) if joint == "shoulder"
        ));
    }

    #[test]
    fn test_pose_pass_without_rest_pass() {
        let document = two_joints([1.0, 0.0, 0.0]);
        let tree = KinematicTree::build(&document).unwrap();
        let options = ImportOptions::default();
        let registry = MaterialRegistry::new();
        let resolver = PackageResolver::default();
        let mut scene = MemoryScene::new();
        let armature = scene.create_armature("bot", Vec3::ZERO).unwrap();
        scene.set_mode(armature, EditMode::Pose).unwrap();

        let mut emitter = SkeletonEmitter::new(&tree, &options, &registry, &resolver);
        assert!(matches!(
            emitter.pose_pass(&mut scene, armature),
            Err(RigError::BoneNotFound(name)) if name == "shoulder"
        ));
    }

    #[test]
    fn test_fixed_leaf_creates_no_configuration() {
        let document = RobotDocument::new("bot")
            .with_link(LinkDecl::new("base"))
            .with_link(LinkDecl::new("upper"))
            .with_link(LinkDecl::new("camera"))
            .with_joint(
                JointDecl::new("shoulder", JointKind::Revolute, "base", "upper")
                    .with_axis([0.0, 0.0, 1.0]),
            )
            .with_joint(JointDecl::new("mount", JointKind::Fixed, "upper", "camera"));
        let (scene, result, _) = emit(&document, &ImportOptions::default());
        let emission = result.unwrap();

        let mount = scene.bone(scene.find_bone(emission.armature, "mount").unwrap()).unwrap();
        assert_eq!(mount.ik_locked, [false; 3]);
        assert_eq!(mount.locks, ChannelLocks::default());
        assert_eq!(emission.bones.len(), 1);
    }

    #[test]
    fn test_fixed_root_leaf_is_ignored() {
        let document = RobotDocument::new("bot")
            .with_link(LinkDecl::new("base"))
            .with_link(LinkDecl::new("sensor"))
            .with_joint(JointDecl::new("mount", JointKind::Fixed, "base", "sensor"));
        let (scene, result, _) = emit(&document, &ImportOptions::default());
        let emission = result.unwrap();

        assert!(emission.bones.is_empty());
        assert_eq!(scene.bones_of(emission.armature).len(), 1);
    }
}
