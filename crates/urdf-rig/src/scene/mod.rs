//! In-memory scene host
//!
//! [`MemoryScene`] implements [`crate::host::SceneHost`] without a 3D
//! application behind it. It keeps every armature, bone, object and material
//! it is asked to create, enforces the edit/pose mode discipline of a real
//! host, and can be inspected or serialized afterwards.

mod memory;

use std::path::PathBuf;

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::host::{
    ArmatureId, BoneId, ChannelLocks, EditMode, MaterialId, ObjectId, Transform,
};

pub use memory::MemoryScene;

/// Kind of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectKind {
    Mesh,
    Empty,
    Armature,
    Light,
}

impl ObjectKind {
    /// Only meshes have material slots
    pub fn has_material_slots(&self) -> bool {
        matches!(self, ObjectKind::Mesh)
    }
}

/// What an object is parented to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectParent {
    Armature(ArmatureId),
    Bone { armature: ArmatureId, bone: BoneId },
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
    /// Dimensions at unit scale
    pub base_dimensions: Vec3,
    pub origin_recentered: bool,
    pub parent: Option<ObjectParent>,
    pub materials: Vec<MaterialId>,
}

impl SceneObject {
    /// Bounding dimensions at the current scale
    pub fn dimensions(&self) -> Vec3 {
        self.base_dimensions * self.transform.scale
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Armature {
    pub id: ArmatureId,
    pub name: String,
    /// Object carrying the armature in the scene
    pub object: ObjectId,
    pub mode: EditMode,
    /// Bones in creation order
    pub bones: Vec<BoneId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bone {
    pub id: BoneId,
    pub armature: ArmatureId,
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    pub rotation: Quat,
    pub parent: Option<BoneId>,
    /// Set once an object is parented relative to this bone
    pub use_relative_parent: bool,
    pub locks: ChannelLocks,
    pub ik_locked: [bool; 3],
    pub ik_limit_enabled: [bool; 3],
    pub ik_bounds: [Option<(f32, f32)>; 3],
}

impl Bone {
    pub fn length(&self) -> f32 {
        (self.tail - self.head).length()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub color: Option<Vec3>,
    pub texture: Option<PathBuf>,
}

/// Readable dump of a scene, with ids replaced by names
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub armatures: Vec<ArmatureSnapshot>,
    pub objects: Vec<ObjectSnapshot>,
    pub materials: Vec<MaterialSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArmatureSnapshot {
    pub name: String,
    pub bones: Vec<BoneSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoneSnapshot {
    pub name: String,
    pub parent: Option<String>,
    pub head: [f32; 3],
    pub tail: [f32; 3],
    pub rotation: [f32; 4],
    pub locks: ChannelLocks,
    pub ik_locked: [bool; 3],
    pub ik_bounds: [Option<(f32, f32)>; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub kind: ObjectKind,
    pub location: [f32; 3],
    pub rotation: [f32; 4],
    pub dimensions: [f32; 3],
    /// Bone or armature name
    pub parent: Option<String>,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialSnapshot {
    pub name: String,
    pub color: Option<[f32; 3]>,
    pub texture: Option<PathBuf>,
}
