use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::{BoneMap, SkeletonEmitter};
use crate::error::RigError;
use crate::host::{ArmatureId, BoneId, BoneSpec, SceneHost};
use crate::tree::NodeId;

/// Armature-space frame of a bone created during the rest pass
#[derive(Debug, Clone, Copy)]
struct RestFrame {
    bone: BoneId,
    head: Vec3,
    rotation: Quat,
}

impl SkeletonEmitter<'_> {
    /// Pass 1: create one bone per joint at its rest pose.
    ///
    /// Must run in edit mode. Bones are created in depth-first pre-order so
    /// a parent's frame is always known before its children.
    pub fn rest_pass<H: SceneHost>(
        &self,
        host: &mut H,
        armature: ArmatureId,
    ) -> Result<BoneMap, RigError> {
        let mut frames: HashMap<NodeId, RestFrame> = HashMap::with_capacity(self.tree.len());
        let epsilon = Vec3::new(0.0, 0.0, self.options.bone_epsilon);

        for id in self.tree.depth_first() {
            let node = self.tree.node(id);
            let parent = node.parent.and_then(|p| frames.get(&p)).copied();

            let (head, rotation) = match parent {
                Some(parent) => (
                    parent.rotation * node.local_position + parent.head,
                    parent.rotation * node.local_orientation,
                ),
                None => (
                    node.local_orientation * node.local_position,
                    node.local_orientation,
                ),
            };
            let tail = head + rotation * epsilon;

            let bone = host.create_bone(
                armature,
                BoneSpec {
                    name: &node.name,
                    head,
                    tail,
                    rotation,
                    parent: parent.map(|p| p.bone),
                },
            )?;
            tracing::debug!("Create bone {} at {:?}", node.name, head);

            frames.insert(
                id,
                RestFrame {
                    bone,
                    head,
                    rotation,
                },
            );
        }

        Ok(frames.into_iter().map(|(id, f)| (id, f.bone)).collect())
    }
}
