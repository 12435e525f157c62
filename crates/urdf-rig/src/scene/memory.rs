use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;

use super::{
    Armature, ArmatureSnapshot, Bone, BoneSnapshot, Material, MaterialSnapshot, ObjectKind,
    ObjectParent, ObjectSnapshot, SceneObject, SceneSnapshot,
};
use crate::error::HostError;
use crate::host::{
    Appearance, ArmatureId, BoneId, BoneSpec, ChannelLocks, EditMode, MaterialId, ObjectId,
    Primitive, SceneHost, Transform,
};
use crate::types::{Axis, MeshFormat};

/// Scene host that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: HashMap<ObjectId, SceneObject>,
    /// Objects in creation order
    object_order: Vec<ObjectId>,
    armatures: HashMap<ArmatureId, Armature>,
    armature_order: Vec<ArmatureId>,
    bones: HashMap<BoneId, Bone>,
    materials: HashMap<MaterialId, Material>,
    material_order: Vec<MaterialId>,
    /// Object names produced when importing a registered mesh path
    mesh_fixtures: HashMap<PathBuf, Vec<String>>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the objects that importing `path` should produce.
    ///
    /// Registered paths take precedence over reading the file, which is the
    /// only way to import COLLADA files into this host.
    pub fn register_mesh(&mut self, path: impl Into<PathBuf>, names: &[&str]) {
        self.mesh_fixtures
            .insert(path.into(), names.iter().map(|n| n.to_string()).collect());
    }

    /// Add a light object, which has no material slots
    pub fn add_light(&mut self, name: &str) -> ObjectId {
        self.insert_object(name, ObjectKind::Light, Vec3::ZERO)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// First object carrying `name`
    pub fn object_named(&self, name: &str) -> Option<&SceneObject> {
        self.object_order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .find(|o| o.name == name)
    }

    pub fn armature(&self, id: ArmatureId) -> Option<&Armature> {
        self.armatures.get(&id)
    }

    pub fn armatures(&self) -> impl Iterator<Item = &Armature> {
        self.armature_order.iter().filter_map(|id| self.armatures.get(id))
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(&id)
    }

    /// Bones of an armature in creation order
    pub fn bones_of(&self, armature: ArmatureId) -> Vec<&Bone> {
        self.armatures
            .get(&armature)
            .map(|a| a.bones.iter().filter_map(|id| self.bones.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Objects parented to the given bone
    pub fn children_of_bone(&self, bone: BoneId) -> Vec<&SceneObject> {
        self.object_order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| matches!(o.parent, Some(ObjectParent::Bone { bone: b, .. }) if b == bone))
            .collect()
    }

    /// Dump the scene with ids replaced by names
    pub fn snapshot(&self) -> SceneSnapshot {
        let bone_name = |id: BoneId| self.bones.get(&id).map(|b| b.name.clone());

        let armatures = self
            .armatures()
            .map(|armature| ArmatureSnapshot {
                name: armature.name.clone(),
                bones: self
                    .bones_of(armature.id)
                    .into_iter()
                    .map(|bone| BoneSnapshot {
                        name: bone.name.clone(),
                        parent: bone.parent.and_then(bone_name),
                        head: bone.head.to_array(),
                        tail: bone.tail.to_array(),
                        rotation: bone.rotation.to_array(),
                        locks: bone.locks,
                        ik_locked: bone.ik_locked,
                        ik_bounds: bone.ik_bounds,
                    })
                    .collect(),
            })
            .collect();

        let objects = self
            .object_order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| o.kind != ObjectKind::Armature)
            .map(|object| ObjectSnapshot {
                name: object.name.clone(),
                kind: object.kind,
                location: object.transform.location.to_array(),
                rotation: object.transform.rotation.to_array(),
                dimensions: object.dimensions().to_array(),
                parent: match object.parent {
                    Some(ObjectParent::Bone { bone, .. }) => bone_name(bone),
                    Some(ObjectParent::Armature(id)) => {
                        self.armatures.get(&id).map(|a| a.name.clone())
                    }
                    None => None,
                },
                materials: object
                    .materials
                    .iter()
                    .filter_map(|id| self.materials.get(id))
                    .map(|m| m.name.clone())
                    .collect(),
            })
            .collect();

        let materials = self
            .material_order
            .iter()
            .filter_map(|id| self.materials.get(id))
            .map(|m| MaterialSnapshot {
                name: m.name.clone(),
                color: m.color.map(|c| c.to_array()),
                texture: m.texture.clone(),
            })
            .collect();

        SceneSnapshot {
            armatures,
            objects,
            materials,
        }
    }

    fn insert_object(&mut self, name: &str, kind: ObjectKind, base_dimensions: Vec3) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(
            id,
            SceneObject {
                id,
                name: name.to_string(),
                kind,
                transform: Transform::IDENTITY,
                base_dimensions,
                origin_recentered: false,
                parent: None,
                materials: Vec::new(),
            },
        );
        self.object_order.push(id);
        id
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, HostError> {
        self.objects
            .get_mut(&id)
            .ok_or_else(|| HostError::UnknownObject(id.0.to_string()))
    }

    fn armature_in_mode(
        &mut self,
        id: ArmatureId,
        mode: EditMode,
    ) -> Result<&mut Armature, HostError> {
        let armature = self
            .armatures
            .get_mut(&id)
            .ok_or_else(|| HostError::UnknownObject(id.0.to_string()))?;
        if armature.mode != mode {
            return Err(HostError::WrongMode {
                expected: mode.name(),
            });
        }
        Ok(armature)
    }

    /// Bone whose armature is currently in pose mode
    fn posed_bone_mut(&mut self, id: BoneId) -> Result<&mut Bone, HostError> {
        let unknown = || HostError::UnknownBone(id.0.to_string());
        let armature = self.bones.get(&id).ok_or_else(unknown)?.armature;
        self.armature_in_mode(armature, EditMode::Pose)?;
        self.bones.get_mut(&id).ok_or_else(unknown)
    }

    /// Read an STL file and add one mesh object named after the file
    fn import_stl(&mut self, path: &Path) -> Result<(), HostError> {
        let import_error = |reason: String| HostError::Import {
            path: path.display().to_string(),
            reason,
        };

        let mut file = std::fs::File::open(path).map_err(|e| import_error(e.to_string()))?;
        let mesh = stl_io::read_stl(&mut file).map_err(|e| import_error(e.to_string()))?;

        let (min, max) = mesh.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), v| {
                let p = Vec3::new(v[0], v[1], v[2]);
                (min.min(p), max.max(p))
            },
        );
        let dimensions = if mesh.vertices.is_empty() {
            Vec3::ZERO
        } else {
            max - min
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_string());
        self.insert_object(&name, ObjectKind::Mesh, dimensions);
        tracing::debug!(
            "Read {} triangles from {}",
            mesh.faces.len(),
            path.display()
        );
        Ok(())
    }
}

impl SceneHost for MemoryScene {
    fn create_armature(&mut self, name: &str, location: Vec3) -> Result<ArmatureId, HostError> {
        let object = self.insert_object(name, ObjectKind::Armature, Vec3::ZERO);
        self.object_mut(object)?.transform.location = location;

        let id = ArmatureId::new();
        self.armatures.insert(
            id,
            Armature {
                id,
                name: name.to_string(),
                object,
                mode: EditMode::Edit,
                bones: Vec::new(),
            },
        );
        self.armature_order.push(id);
        Ok(id)
    }

    fn set_mode(&mut self, armature: ArmatureId, mode: EditMode) -> Result<(), HostError> {
        let target = self
            .armatures
            .get_mut(&armature)
            .ok_or_else(|| HostError::UnknownObject(armature.0.to_string()))?;
        target.mode = mode;
        Ok(())
    }

    fn create_bone(
        &mut self,
        armature: ArmatureId,
        spec: BoneSpec<'_>,
    ) -> Result<BoneId, HostError> {
        let bones = &self.bones;
        let target = self
            .armatures
            .get(&armature)
            .ok_or_else(|| HostError::UnknownObject(armature.0.to_string()))?;
        if target.mode != EditMode::Edit {
            return Err(HostError::WrongMode {
                expected: EditMode::Edit.name(),
            });
        }
        if target
            .bones
            .iter()
            .filter_map(|id| bones.get(id))
            .any(|b| b.name == spec.name)
        {
            return Err(HostError::DuplicateBone(spec.name.to_string()));
        }
        if let Some(parent) = spec.parent
            && !target.bones.contains(&parent)
        {
            return Err(HostError::UnknownBone(parent.0.to_string()));
        }

        let id = BoneId::new();
        self.bones.insert(
            id,
            Bone {
                id,
                armature,
                name: spec.name.to_string(),
                head: spec.head,
                tail: spec.tail,
                rotation: spec.rotation,
                parent: spec.parent,
                use_relative_parent: false,
                locks: ChannelLocks::default(),
                ik_locked: [false; 3],
                ik_limit_enabled: [false; 3],
                ik_bounds: [None; 3],
            },
        );
        self.armature_in_mode(armature, EditMode::Edit)?.bones.push(id);
        Ok(id)
    }

    fn find_bone(&self, armature: ArmatureId, name: &str) -> Option<BoneId> {
        self.armatures
            .get(&armature)?
            .bones
            .iter()
            .copied()
            .find(|id| self.bones.get(id).is_some_and(|b| b.name == name))
    }

    fn bone_rest_transform(&self, bone: BoneId) -> Result<Transform, HostError> {
        let bone = self
            .bones
            .get(&bone)
            .ok_or_else(|| HostError::UnknownBone(bone.0.to_string()))?;
        Ok(Transform::from_rotation_translation(bone.rotation, bone.head))
    }

    fn add_primitive(&mut self, primitive: Primitive) -> Result<ObjectId, HostError> {
        let id = match primitive {
            Primitive::Cube => self.insert_object("Cube", ObjectKind::Mesh, Vec3::splat(2.0)),
            Primitive::Cylinder { radius, depth } => self.insert_object(
                "Cylinder",
                ObjectKind::Mesh,
                Vec3::new(2.0 * radius, 2.0 * radius, depth),
            ),
            Primitive::UvSphere { radius } => {
                self.insert_object("Sphere", ObjectKind::Mesh, Vec3::splat(2.0 * radius))
            }
            Primitive::Arrows => self.insert_object("Empty", ObjectKind::Empty, Vec3::ZERO),
        };
        Ok(id)
    }

    fn import_mesh(&mut self, format: MeshFormat, path: &Path) -> Result<(), HostError> {
        if let Some(names) = self.mesh_fixtures.get(path).cloned() {
            for name in names {
                self.insert_object(&name, ObjectKind::Mesh, Vec3::ONE);
            }
            return Ok(());
        }

        match format {
            MeshFormat::Stl => self.import_stl(path),
            MeshFormat::Collada => Err(HostError::Import {
                path: path.display().to_string(),
                reason: if path.exists() {
                    "no COLLADA reader available".to_string()
                } else {
                    "file not found".to_string()
                },
            }),
        }
    }

    fn objects(&self) -> Vec<ObjectId> {
        self.object_order.clone()
    }

    fn set_object_name(&mut self, object: ObjectId, name: &str) -> Result<(), HostError> {
        self.object_mut(object)?.name = name.to_string();
        Ok(())
    }

    fn object_transform(&self, object: ObjectId) -> Result<Transform, HostError> {
        self.objects
            .get(&object)
            .map(|o| o.transform)
            .ok_or_else(|| HostError::UnknownObject(object.0.to_string()))
    }

    fn set_object_transform(
        &mut self,
        object: ObjectId,
        transform: Transform,
    ) -> Result<(), HostError> {
        self.object_mut(object)?.transform = transform;
        Ok(())
    }

    fn set_object_dimensions(
        &mut self,
        object: ObjectId,
        dimensions: Vec3,
    ) -> Result<(), HostError> {
        let object = self.object_mut(object)?;
        let base = object.base_dimensions;
        let scale = &mut object.transform.scale;
        // Flat axes keep their scale
        for i in 0..3 {
            if base[i] > 0.0 {
                scale[i] = dimensions[i] / base[i];
            }
        }
        Ok(())
    }

    fn recenter_origin(&mut self, object: ObjectId) -> Result<(), HostError> {
        self.object_mut(object)?.origin_recentered = true;
        Ok(())
    }

    fn parent_to_armature(
        &mut self,
        object: ObjectId,
        armature: ArmatureId,
    ) -> Result<(), HostError> {
        if !self.armatures.contains_key(&armature) {
            return Err(HostError::UnknownObject(armature.0.to_string()));
        }
        self.object_mut(object)?.parent = Some(ObjectParent::Armature(armature));
        Ok(())
    }

    fn parent_to_bone(
        &mut self,
        object: ObjectId,
        armature: ArmatureId,
        bone: BoneId,
    ) -> Result<(), HostError> {
        let target = self
            .bones
            .get_mut(&bone)
            .filter(|b| b.armature == armature)
            .ok_or_else(|| HostError::UnknownBone(bone.0.to_string()))?;
        target.use_relative_parent = true;
        self.object_mut(object)?.parent = Some(ObjectParent::Bone { armature, bone });
        Ok(())
    }

    fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.material_order
            .iter()
            .copied()
            .find(|id| self.materials.get(id).is_some_and(|m| m.name == name))
    }

    fn create_material(&mut self, name: &str) -> Result<MaterialId, HostError> {
        let id = MaterialId::new();
        self.materials.insert(
            id,
            Material {
                id,
                name: name.to_string(),
                color: None,
                texture: None,
            },
        );
        self.material_order.push(id);
        Ok(id)
    }

    fn set_material_color(&mut self, material: MaterialId, rgb: Vec3) -> Result<(), HostError> {
        let material = self
            .materials
            .get_mut(&material)
            .ok_or_else(|| HostError::UnknownMaterial(material.0.to_string()))?;
        material.color = Some(rgb);
        Ok(())
    }

    fn set_material_texture(
        &mut self,
        material: MaterialId,
        path: &Path,
    ) -> Result<(), HostError> {
        let material = self
            .materials
            .get_mut(&material)
            .ok_or_else(|| HostError::UnknownMaterial(material.0.to_string()))?;
        material.texture = Some(path.to_path_buf());
        Ok(())
    }

    fn material_appearance(&self, material: MaterialId) -> Result<Appearance, HostError> {
        let material = self
            .materials
            .get(&material)
            .ok_or_else(|| HostError::UnknownMaterial(material.0.to_string()))?;
        Ok(Appearance {
            color: material.color,
            texture: material.texture.clone(),
        })
    }

    fn assign_material(
        &mut self,
        object: ObjectId,
        material: MaterialId,
    ) -> Result<(), HostError> {
        if !self.materials.contains_key(&material) {
            return Err(HostError::UnknownMaterial(material.0.to_string()));
        }
        let object = self.object_mut(object)?;
        if !object.kind.has_material_slots() {
            return Err(HostError::UnsupportedGeometry(object.name.clone()));
        }
        object.materials.push(material);
        Ok(())
    }

    fn set_channel_locks(&mut self, bone: BoneId, locks: ChannelLocks) -> Result<(), HostError> {
        self.posed_bone_mut(bone)?.locks = locks;
        Ok(())
    }

    fn set_ik_lock(&mut self, bone: BoneId, axis: Axis, locked: bool) -> Result<(), HostError> {
        self.posed_bone_mut(bone)?.ik_locked[axis.index()] = locked;
        Ok(())
    }

    fn set_ik_limit(
        &mut self,
        bone: BoneId,
        axis: Axis,
        bounds: Option<(f32, f32)>,
    ) -> Result<(), HostError> {
        let bone = self.posed_bone_mut(bone)?;
        bone.ik_limit_enabled[axis.index()] = true;
        bone.ik_bounds[axis.index()] = bounds;
        Ok(())
    }
}
