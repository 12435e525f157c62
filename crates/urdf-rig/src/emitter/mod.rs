//! Skeleton emission
//!
//! A [`KinematicTree`] is turned into host bones in two strictly ordered
//! passes:
//!
//! 1. [`SkeletonEmitter::rest_pass`] creates one bone per joint at its rest
//!    pose while the armature is in edit mode.
//! 2. [`SkeletonEmitter::pose_pass`] runs in pose mode, locks channels,
//!    configures the IK axis of every joint and hangs the link visuals off
//!    the bones.
//!
//! Each pass keeps its own `NodeId -> BoneId` map; the tree never stores host
//! handles.

mod pose;
mod rest;

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::config::ImportOptions;
use crate::error::{ImportWarning, RigError};
use crate::geometry::GeometryInstancer;
use crate::host::{ArmatureId, BoneId, EditMode, ObjectId, SceneHost};
use crate::link::LinkRecord;
use crate::material::{MaterialContext, MaterialRegistry};
use crate::resolve::PackageResolver;
use crate::tree::{KinematicTree, NodeId};

/// Bones created or resolved by one pass
pub type BoneMap = HashMap<NodeId, BoneId>;

/// Result of a complete emission
#[derive(Debug, Clone)]
pub struct Emission {
    pub armature: ArmatureId,
    /// Bones from the pose pass; fixed leaves have none
    pub bones: BoneMap,
    /// Every object instantiated for a link visual
    pub objects: Vec<ObjectId>,
}

/// Emits the armature for one kinematic tree
pub struct SkeletonEmitter<'a> {
    tree: &'a KinematicTree,
    options: &'a ImportOptions,
    instancer: GeometryInstancer<'a>,
    materials: MaterialContext<'a>,
    objects: Vec<ObjectId>,
    warnings: Vec<ImportWarning>,
}

impl<'a> SkeletonEmitter<'a> {
    pub fn new(
        tree: &'a KinematicTree,
        options: &'a ImportOptions,
        registry: &'a MaterialRegistry,
        resolver: &'a PackageResolver,
    ) -> Self {
        Self {
            tree,
            options,
            instancer: GeometryInstancer::new(resolver, options.marker_scale),
            materials: MaterialContext::new(registry, resolver),
            objects: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create the armature and run both passes.
    ///
    /// The base link visual is attached between the passes, while the
    /// armature is still in edit mode.
    pub fn emit<H: SceneHost>(
        &mut self,
        host: &mut H,
        armature_name: &str,
    ) -> Result<Emission, RigError> {
        let armature = host.create_armature(armature_name, Vec3::ZERO)?;
        host.set_mode(armature, EditMode::Edit)?;

        let rest = self.rest_pass(host, armature)?;
        tracing::debug!("Rest pass created {} bone(s)", rest.len());

        if self.options.base_link_visuals {
            self.attach_base_visual(host, armature)?;
        }

        host.set_mode(armature, EditMode::Pose)?;
        let bones = self.pose_pass(host, armature)?;

        Ok(Emission {
            armature,
            bones,
            objects: self.objects.clone(),
        })
    }

    /// Instantiate the base link's visual and parent it to the armature
    pub fn attach_base_visual<H: SceneHost>(
        &mut self,
        host: &mut H,
        armature: ArmatureId,
    ) -> Result<(), RigError> {
        let tree = self.tree;
        let base = &tree.base_link;
        let Some(visual) = &base.visual else {
            return Ok(());
        };

        let objects = self.instancer.instantiate(host, base)?;
        for &object in &objects {
            if let Some(material) = &visual.material {
                self.materials.apply(host, object, &base.name, material)?;
            }
            host.parent_to_armature(object, armature)?;
        }
        self.objects.extend(objects);
        Ok(())
    }

    /// Instantiate a link's visual and hang it off `bone`.
    ///
    /// Objects start at the bone's rest transform, are moved by `offset`
    /// (rotated by `orientation` when given), take the link's orientation and
    /// get their shape-specific sizing back before being parented.
    pub(crate) fn attach_visual<H: SceneHost>(
        &mut self,
        host: &mut H,
        armature: ArmatureId,
        link: &LinkRecord,
        bone: BoneId,
        offset: Option<Vec3>,
        orientation: Option<Quat>,
    ) -> Result<(), RigError> {
        let Some(visual) = &link.visual else {
            return Ok(());
        };

        let objects = self.instancer.instantiate(host, link)?;
        let rest = host.bone_rest_transform(bone)?;

        for &object in &objects {
            let mut transform = rest;
            match (offset, orientation) {
                (Some(offset), Some(orientation)) => transform.location += orientation * offset,
                (Some(offset), None) => transform.location += offset,
                _ => {}
            }
            transform.rotation = link.origin_orientation;
            host.set_object_transform(object, transform)?;

            self.instancer.rescale(host, object, visual.geometry.as_ref())?;
            if let Some(material) = &visual.material {
                self.materials.apply(host, object, &link.name, material)?;
            }
            host.parent_to_bone(object, armature, bone)?;
        }

        tracing::debug!("Attached {} object(s) of link {}", objects.len(), link.name);
        self.objects.extend(objects);
        Ok(())
    }

    /// Every soft error collected by the passes, the geometry instancer and
    /// material resolution
    pub fn into_warnings(self) -> Vec<ImportWarning> {
        let mut warnings = self.warnings;
        warnings.extend(self.instancer.into_warnings());
        warnings.extend(self.materials.into_warnings());
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{JointDecl, LinkDecl, RobotDocument, VisualDecl};
    use crate::scene::{MemoryScene, ObjectParent};
    use crate::types::{Geometry, JointKind, MaterialDecl, Pose};

    fn boxed_link(name: &str) -> LinkDecl {
        LinkDecl::new(name).with_visual(VisualDecl {
            origin: None,
            geometry: Some(Geometry::Box {
                size: [0.1, 0.1, 0.4],
            }),
            material: Some(MaterialDecl::named("grey")),
        })
    }

    fn arm_document() -> RobotDocument {
        RobotDocument::new("arm")
            .with_material(MaterialDecl::named("grey").with_color([0.5, 0.5, 0.5, 1.0]))
            .with_link(boxed_link("base"))
            .with_link(boxed_link("upper"))
            .with_link(boxed_link("tool"))
            .with_joint(
                JointDecl::new("shoulder", JointKind::Revolute, "base", "upper")
                    .with_origin(Pose::from_position([0.0, 0.0, 0.1]))
                    .with_axis([0.0, 0.0, 1.0])
                    .with_limit(-1.5, 1.5),
            )
            .with_joint(
                JointDecl::new("flange", JointKind::Fixed, "upper", "tool")
                    .with_origin(Pose::from_position([0.0, 0.0, 0.4])),
            )
    }

    #[test]
    fn test_emit_full_arm() {
        let document = arm_document();
        let tree = KinematicTree::build(&document).unwrap();
        let options = ImportOptions::default();
        let mut registry = MaterialRegistry::new();
        registry.register_all(&document.materials);
        let resolver = PackageResolver::default();

        let mut scene = MemoryScene::new();
        let mut emitter = SkeletonEmitter::new(&tree, &options, &registry, &resolver);
        let emission = emitter.emit(&mut scene, "arm").unwrap();

        // The fixed leaf has no bone in the pose pass
        assert_eq!(scene.bones_of(emission.armature).len(), 2);
        assert_eq!(emission.bones.len(), 1);
        assert_eq!(emission.objects.len(), 3);
        assert_eq!(scene.armature(emission.armature).unwrap().mode, EditMode::Pose);

        let base = scene.object_named("base").unwrap();
        assert_eq!(base.parent, Some(ObjectParent::Armature(emission.armature)));

        let shoulder = scene.find_bone(emission.armature, "shoulder").unwrap();
        let hung: Vec<&str> = scene
            .children_of_bone(shoulder)
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(hung, ["upper", "tool"]);

        // Grey is declared once and shared by all three links
        assert_eq!(scene.material_count(), 1);
        assert!(emitter.into_warnings().is_empty());
    }

    #[test]
    fn test_base_visuals_can_be_skipped() {
        let document = arm_document();
        let tree = KinematicTree::build(&document).unwrap();
        let options = ImportOptions {
            base_link_visuals: false,
            ..ImportOptions::default()
        };
        let registry = MaterialRegistry::new();
        let resolver = PackageResolver::default();

        let mut scene = MemoryScene::new();
        let mut emitter = SkeletonEmitter::new(&tree, &options, &registry, &resolver);
        emitter.emit(&mut scene, "arm").unwrap();

        assert!(scene.object_named("base").is_none());
        // Unregistered grey is reported once per visual
        assert_eq!(emitter.into_warnings().len(), 2);
    }

    #[test]
    fn test_fixed_leaf_offset_follows_parent_bone() {
        let document = arm_document();
        let tree = KinematicTree::build(&document).unwrap();
        let options = ImportOptions::default();
        let registry = MaterialRegistry::new();
        let resolver = PackageResolver::default();

        let mut scene = MemoryScene::new();
        let mut emitter = SkeletonEmitter::new(&tree, &options, &registry, &resolver);
        emitter.emit(&mut scene, "arm").unwrap();

        // Shoulder head sits at z = 0.1 and the flange adds 0.4 on top
        let tool = scene.object_named("tool").unwrap();
        assert!(tool.transform.location.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-6));
        assert!(tool.dimensions().abs_diff_eq(Vec3::new(0.1, 0.1, 0.4), 1e-6));
    }
}
