//! Visual geometry descriptors

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shape of a link's visual element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// External mesh file, usually a `package://` reference
    Mesh {
        filename: String,
        scale: Option<[f32; 3]>,
    },
    Box {
        size: [f32; 3],
    },
    Cylinder {
        radius: f32,
        length: f32,
    },
    Sphere {
        radius: f32,
    },
}

impl Geometry {
    /// Bounding dimensions for primitive shapes, `None` for meshes
    pub fn dimensions(&self) -> Option<Vec3> {
        match self {
            Geometry::Mesh { .. } => None,
            Geometry::Box { size } => Some(Vec3::from(*size)),
            Geometry::Cylinder { radius, length } => {
                let diameter = radius * 2.0;
                Some(Vec3::new(diameter, diameter, *length))
            }
            Geometry::Sphere { radius } => Some(Vec3::splat(radius * 2.0)),
        }
    }
}

impl From<&urdf_rs::Geometry> for Geometry {
    fn from(geometry: &urdf_rs::Geometry) -> Self {
        match geometry {
            urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
                filename: filename.clone(),
                scale: scale
                    .as_ref()
                    .map(|s| [s.0[0] as f32, s.0[1] as f32, s.0[2] as f32]),
            },
            urdf_rs::Geometry::Box { size } => Geometry::Box {
                size: [size.0[0] as f32, size.0[1] as f32, size.0[2] as f32],
            },
            urdf_rs::Geometry::Cylinder { radius, length } => Geometry::Cylinder {
                radius: *radius as f32,
                length: *length as f32,
            },
            // Approximate capsule as cylinder
            urdf_rs::Geometry::Capsule { radius, length } => Geometry::Cylinder {
                radius: *radius as f32,
                length: *length as f32,
            },
            urdf_rs::Geometry::Sphere { radius } => Geometry::Sphere {
                radius: *radius as f32,
            },
        }
    }
}

/// Mesh file formats the host knows how to import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshFormat {
    Collada,
    Stl,
}

impl MeshFormat {
    /// Detect format from the file extension of a mesh reference
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".dae") {
            Some(MeshFormat::Collada)
        } else if lower.ends_with(".stl") {
            Some(MeshFormat::Stl)
        } else {
            None
        }
    }

    /// Get format name
    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Collada => "DAE (COLLADA)",
            MeshFormat::Stl => "STL",
        }
    }
}
