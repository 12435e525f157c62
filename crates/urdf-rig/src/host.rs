//! Host scene interface
//!
//! Everything the importer does to the 3D application goes through
//! [`SceneHost`]. The host owns armatures, bones, objects and materials and
//! hands out opaque ids for them.

use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HostError;
use crate::types::{Axis, MeshFormat};

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

host_id!(
    /// Handle to an armature object
    ArmatureId
);
host_id!(
    /// Handle to a bone inside an armature
    BoneId
);
host_id!(
    /// Handle to a scene object (mesh, empty, light...)
    ObjectId
);
host_id!(
    /// Handle to a material in the host's material store
    MaterialId
);

/// Editing mode of an armature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    /// Rest pose topology: bones can be created and parented
    Edit,
    /// Pose channels and IK constraints can be configured
    Pose,
}

impl EditMode {
    pub fn name(&self) -> &'static str {
        match self {
            EditMode::Edit => "edit",
            EditMode::Pose => "pose",
        }
    }
}

/// Primitive objects the host can create
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Cube of edge length 2 centered on the origin
    Cube,
    Cylinder { radius: f32, depth: f32 },
    UvSphere { radius: f32 },
    /// Axis gizmo empty, used as a marker
    Arrows,
}

/// Rest-pose bone description
#[derive(Debug, Clone, PartialEq)]
pub struct BoneSpec<'a> {
    pub name: &'a str,
    pub head: Vec3,
    pub tail: Vec3,
    /// Rest orientation in armature space
    pub rotation: Quat,
    pub parent: Option<BoneId>,
}

/// Local transform of an object or bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_rotation_translation(rotation: Quat, location: Vec3) -> Self {
        Self {
            location,
            rotation,
            scale: Vec3::ONE,
        }
    }
}

/// Lock flags for the location, rotation and scale pose channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelLocks {
    pub location: [bool; 3],
    pub rotation: [bool; 3],
    pub scale: [bool; 3],
}

impl ChannelLocks {
    pub const ALL: Self = Self {
        location: [true; 3],
        rotation: [true; 3],
        scale: [true; 3],
    };
}

/// Surface of a 3D content-creation host used by the importer.
///
/// Bone creation is only valid in [`EditMode::Edit`]; pose channel and IK
/// calls are only valid in [`EditMode::Pose`].
/// What a material looks like, as far as the importer sets it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Appearance {
    pub color: Option<Vec3>,
    pub texture: Option<PathBuf>,
}

pub trait SceneHost {
    /// Create an empty armature object at `location` and leave it in edit mode
    fn create_armature(&mut self, name: &str, location: Vec3) -> Result<ArmatureId, HostError>;

    fn set_mode(&mut self, armature: ArmatureId, mode: EditMode) -> Result<(), HostError>;

    fn create_bone(&mut self, armature: ArmatureId, spec: BoneSpec<'_>)
    -> Result<BoneId, HostError>;

    fn find_bone(&self, armature: ArmatureId, name: &str) -> Option<BoneId>;

    /// Rest transform of a bone relative to its armature
    fn bone_rest_transform(&self, bone: BoneId) -> Result<Transform, HostError>;

    fn add_primitive(&mut self, primitive: Primitive) -> Result<ObjectId, HostError>;

    /// Import a mesh file. The new objects are found by diffing
    /// [`SceneHost::objects`] around the call.
    fn import_mesh(&mut self, format: MeshFormat, path: &Path) -> Result<(), HostError>;

    /// All objects currently in the scene
    fn objects(&self) -> Vec<ObjectId>;

    fn set_object_name(&mut self, object: ObjectId, name: &str) -> Result<(), HostError>;

    fn object_transform(&self, object: ObjectId) -> Result<Transform, HostError>;

    fn set_object_transform(
        &mut self,
        object: ObjectId,
        transform: Transform,
    ) -> Result<(), HostError>;

    /// Set the bounding dimensions, adjusting the scale to match
    fn set_object_dimensions(&mut self, object: ObjectId, dimensions: Vec3)
    -> Result<(), HostError>;

    /// Move the object origin to its geometric reference point
    fn recenter_origin(&mut self, object: ObjectId) -> Result<(), HostError>;

    fn parent_to_armature(
        &mut self,
        object: ObjectId,
        armature: ArmatureId,
    ) -> Result<(), HostError>;

    /// Parent an object to a bone so that it follows the bone's pose
    /// transform relative to the bone itself
    fn parent_to_bone(
        &mut self,
        object: ObjectId,
        armature: ArmatureId,
        bone: BoneId,
    ) -> Result<(), HostError>;

    fn find_material(&self, name: &str) -> Option<MaterialId>;

    fn create_material(&mut self, name: &str) -> Result<MaterialId, HostError>;

    fn set_material_color(&mut self, material: MaterialId, rgb: Vec3) -> Result<(), HostError>;

    fn set_material_texture(&mut self, material: MaterialId, path: &Path)
    -> Result<(), HostError>;

    /// Current color and texture of a material
    fn material_appearance(&self, material: MaterialId) -> Result<Appearance, HostError>;

    /// Fails with [`HostError::UnsupportedGeometry`] for objects without
    /// material slots
    fn assign_material(&mut self, object: ObjectId, material: MaterialId)
    -> Result<(), HostError>;

    fn set_channel_locks(&mut self, bone: BoneId, locks: ChannelLocks) -> Result<(), HostError>;

    fn set_ik_lock(&mut self, bone: BoneId, axis: Axis, locked: bool) -> Result<(), HostError>;

    /// Enable the IK limit on `axis`, optionally with bounds
    fn set_ik_limit(
        &mut self,
        bone: BoneId,
        axis: Axis,
        bounds: Option<(f32, f32)>,
    ) -> Result<(), HostError>;
}
