//! URDF import pipeline
//!
//! Parses a robot description, registers its global materials, builds the
//! kinematic tree and emits the armature into a [`SceneHost`].

use std::path::Path;

use serde::Serialize;

use crate::config::ImportOptions;
use crate::document::RobotDocument;
use crate::emitter::SkeletonEmitter;
use crate::error::{ImportWarning, RigError};
use crate::host::{ArmatureId, SceneHost};
use crate::material::{SharedMaterialRegistry, create_shared_registry};
use crate::resolve::PackageResolver;
use crate::tree::KinematicTree;

/// Summary of a finished import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub robot: String,
    pub armature: ArmatureId,
    /// Joint names in the order their bones were created
    pub bones: Vec<String>,
    /// Number of scene objects created for link visuals
    pub objects: usize,
    pub warnings: Vec<ImportWarning>,
}

/// Imports robots into a host, sharing one material registry between
/// imports
#[derive(Debug, Clone)]
pub struct RobotImporter {
    registry: SharedMaterialRegistry,
    options: ImportOptions,
}

impl Default for RobotImporter {
    fn default() -> Self {
        Self::new(ImportOptions::default())
    }
}

impl RobotImporter {
    /// Create an importer with a fresh material registry
    pub fn new(options: ImportOptions) -> Self {
        Self::with_registry(create_shared_registry(), options)
    }

    /// Create an importer that reuses an existing registry
    pub fn with_registry(registry: SharedMaterialRegistry, options: ImportOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn registry(&self) -> &SharedMaterialRegistry {
        &self.registry
    }

    /// Import a parsed document; the armature is named after the robot
    pub fn import<H: SceneHost>(
        &self,
        host: &mut H,
        document: &RobotDocument,
    ) -> Result<ImportReport, RigError> {
        self.import_as(host, document, &document.name)
    }

    /// Import a parsed document under the given armature name.
    ///
    /// A failure after the armature was created leaves it in the host.
    pub fn import_as<H: SceneHost>(
        &self,
        host: &mut H,
        document: &RobotDocument,
        armature_name: &str,
    ) -> Result<ImportReport, RigError> {
        tracing::info!(
            "Importing robot {} ({} links, {} joints)",
            document.name,
            document.links().len(),
            document.joints.len()
        );

        self.registry.write().register_all(&document.materials);

        let tree = KinematicTree::build(document)?;
        let resolver =
            PackageResolver::new(self.options.share_root.clone(), document.source_dir.clone());

        let registry = self.registry.read();
        let mut emitter = SkeletonEmitter::new(&tree, &self.options, &registry, &resolver);
        let emission = emitter.emit(host, armature_name)?;
        let warnings = emitter.into_warnings();

        let bones = tree
            .depth_first()
            .into_iter()
            .map(|id| tree.node(id).name.clone())
            .collect();

        if !warnings.is_empty() {
            tracing::info!("Import of {} finished with {} warning(s)", document.name, warnings.len());
        }

        Ok(ImportReport {
            robot: document.name.clone(),
            armature: emission.armature,
            bones,
            objects: emission.objects.len(),
            warnings,
        })
    }

    /// Parse and import a URDF file
    pub fn import_file<H: SceneHost>(
        &self,
        host: &mut H,
        path: impl AsRef<Path>,
    ) -> Result<ImportReport, RigError> {
        let document = RobotDocument::read_file(path)?;
        self.import(host, &document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, ObjectKind};
    use crate::types::MaterialDecl;

    const ARM_URDF: &str = r#"<?xml version="1.0"?>
<robot name="two_link_arm">
  <material name="orange">
    <color rgba="1.0 0.5 0.0 1.0"/>
  </material>
  <link name="base_link">
    <visual>
      <geometry><cylinder radius="0.1" length="0.05"/></geometry>
      <material name="orange"/>
    </visual>
  </link>
  <link name="upper_arm">
    <inertial>
      <origin xyz="0 0 0.2" rpy="0 0 0"/>
      <mass value="1.0"/>
      <inertia ixx="0.01" ixy="0" ixz="0" iyy="0.01" iyz="0" izz="0.01"/>
    </inertial>
    <visual>
      <origin xyz="0 0 0.2" rpy="0 0 0"/>
      <geometry><box size="0.05 0.05 0.4"/></geometry>
      <material name="orange"/>
    </visual>
  </link>
  <link name="forearm">
    <visual>
      <geometry><sphere radius="0.05"/></geometry>
      <material name="tip">
        <color rgba="0.0 0.0 1.0 1.0"/>
      </material>
    </visual>
  </link>
  <link name="tool0"/>
  <joint name="shoulder" type="revolute">
    <parent link="base_link"/>
    <child link="upper_arm"/>
    <origin xyz="0 0 0.05" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-1.57" upper="1.57" effort="10" velocity="1"/>
  </joint>
  <joint name="elbow" type="revolute">
    <parent link="upper_arm"/>
    <child link="forearm"/>
    <origin xyz="0 0 0.4" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-2.0" upper="2.0" effort="10" velocity="1"/>
  </joint>
  <joint name="tool_mount" type="fixed">
    <parent link="forearm"/>
    <child link="tool0"/>
    <origin xyz="0 0 0.1" rpy="0 0 0"/>
  </joint>
</robot>
"#;

    #[test]
    fn test_import_arm() {
        let document = RobotDocument::from_xml_str(ARM_URDF).unwrap();
        let importer = RobotImporter::new(ImportOptions::default());
        let mut scene = MemoryScene::new();

        let report = importer.import(&mut scene, &document).unwrap();

        assert_eq!(report.robot, "two_link_arm");
        assert_eq!(report.bones, ["shoulder", "elbow", "tool_mount"]);
        assert_eq!(report.objects, 3);
        assert!(report.warnings.is_empty());

        let bones = scene.bones_of(report.armature);
        assert_eq!(bones.len(), 3);
        assert!(bones[1].head.abs_diff_eq(glam::Vec3::new(0.0, 0.0, 0.45), 1e-6));

        let elbow = scene.bone(scene.find_bone(report.armature, "elbow").unwrap()).unwrap();
        assert_eq!(elbow.ik_locked, [true, false, true]);
        assert_eq!(elbow.ik_bounds[1], Some((-2.0, 2.0)));

        // tool0 has no visual, so the fixed leaf produces nothing
        assert!(scene.object_named("tool0").is_none());
        let orange = scene.find_material("orange").unwrap();
        assert_eq!(scene.object_named("base_link").unwrap().materials, vec![orange]);
        assert_eq!(scene.object_named("upper_arm").unwrap().materials, vec![orange]);
        assert_eq!(scene.material_count(), 2);
    }

    #[test]
    fn test_registry_is_shared_between_imports() {
        let registry = create_shared_registry();
        registry
            .write()
            .register(&MaterialDecl::named("orange").with_color([0.2, 0.2, 0.2, 1.0]));

        let importer = RobotImporter::with_registry(registry.clone(), ImportOptions::default());
        let document = RobotDocument::from_xml_str(ARM_URDF).unwrap();
        let mut scene = MemoryScene::new();
        importer.import_as(&mut scene, &document, "first").unwrap();
        importer.import_as(&mut scene, &document, "second").unwrap();

        // The first registration keeps its color
        let orange = scene.find_material("orange").unwrap();
        assert_eq!(scene.material(orange).unwrap().color, Some(glam::Vec3::splat(0.2)));
        assert_eq!(scene.armatures().count(), 2);
        assert_eq!(registry.read().len(), 1);
    }

    fn painted_robot(name: &str, rgba: &str) -> RobotDocument {
        RobotDocument::from_xml_str(&format!(
            r#"<robot name="{name}">
  <link name="{name}_body">
    <visual>
      <geometry><box size="0.1 0.1 0.1"/></geometry>
      <material name="paint"><color rgba="{rgba}"/></material>
    </visual>
  </link>
</robot>"#
        ))
        .unwrap()
    }

    #[test]
    fn test_local_colors_survive_later_imports() {
        let importer = RobotImporter::default();
        let mut scene = MemoryScene::new();
        importer.import(&mut scene, &painted_robot("red", "1 0 0 1")).unwrap();
        importer.import(&mut scene, &painted_robot("green", "0 1 0 1")).unwrap();
        // Same look as the first robot, so its material is reused
        importer.import(&mut scene, &painted_robot("red_again", "1 0 0 1")).unwrap();

        let red = scene.object_named("red_body").unwrap().materials[0];
        let green = scene.object_named("green_body").unwrap().materials[0];
        let red_again = scene.object_named("red_again_body").unwrap().materials[0];

        assert_ne!(red, green);
        assert_eq!(red, red_again);
        assert_eq!(scene.material(red).unwrap().color, Some(glam::Vec3::X));
        assert_eq!(scene.material(green).unwrap().color, Some(glam::Vec3::Y));
        assert_eq!(scene.material(green).unwrap().name, "paint.001");
        assert_eq!(scene.material_count(), 2);
    }

    #[test]
    fn test_joint_without_axis_stays_locked() {
        let document = RobotDocument::from_xml_str(
            r#"<robot name="stiff">
  <link name="base"/>
  <link name="arm"/>
  <joint name="hinge" type="revolute">
    <parent link="base"/>
    <child link="arm"/>
    <limit lower="-1" upper="1" effort="1" velocity="1"/>
  </joint>
</robot>"#,
        )
        .unwrap();
        let mut scene = MemoryScene::new();
        let report = RobotImporter::default().import(&mut scene, &document).unwrap();

        let hinge = scene.bone(scene.find_bone(report.armature, "hinge").unwrap()).unwrap();
        assert_eq!(hinge.ik_locked, [true; 3]);
        assert_eq!(hinge.ik_limit_enabled, [false; 3]);
        assert_eq!(hinge.ik_bounds, [None; 3]);
    }

    #[test]
    fn test_malformed_tree_is_fatal() {
        let document = RobotDocument::from_xml_str(
            r#"<robot name="broken">
  <link name="a"/>
  <link name="b"/>
  <link name="c"/>
  <joint name="ab" type="fixed"><parent link="a"/><child link="b"/></joint>
</robot>"#,
        )
        .unwrap();
        let mut scene = MemoryScene::new();
        let result = RobotImporter::default().import(&mut scene, &document);

        assert!(matches!(result, Err(RigError::MalformedTree(_))));
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn test_import_file_resolves_meshes_next_to_urdf() {
        let dir = std::env::temp_dir().join(format!("urdf-rig-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("meshes")).unwrap();
        std::fs::write(
            dir.join("gripper.urdf"),
            r#"<robot name="gripper">
  <link name="palm">
    <visual><geometry><mesh filename="meshes/palm.dae"/></geometry></visual>
  </link>
</robot>"#,
        )
        .unwrap();

        let mut scene = MemoryScene::new();
        scene.register_mesh(dir.join("meshes/palm.dae"), &["palm_mesh"]);
        let report = RobotImporter::default()
            .import_file(&mut scene, dir.join("gripper.urdf"))
            .unwrap();

        assert!(report.bones.is_empty());
        let palm = scene.object_named("palm_mesh").unwrap();
        assert_eq!(palm.kind, ObjectKind::Mesh);
        assert!(palm.parent.is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file() {
        let mut scene = MemoryScene::new();
        let result = RobotImporter::default().import_file(&mut scene, "/nonexistent/robot.urdf");
        assert!(matches!(result, Err(RigError::Io { .. })));
    }
}
