//! Error types for URDF loading, tree construction and skeleton emission.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fatal errors: any of these aborts the whole import.
///
/// The host scene is not rolled back, so an import that fails after pass 1
/// started leaves a partially built armature behind.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    /// Failed to read a file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse URDF XML content.
    #[error("URDF parse error: {0}")]
    Parse(String),

    /// The link/joint graph is not a single tree hanging off one root link.
    #[error("malformed kinematic tree: {0}")]
    MalformedTree(String),

    /// Pose pass looked up a bone the rest pass never created.
    #[error("bone not found in armature: {0}")]
    BoneNotFound(String),

    /// Joint declares more than one active axis component.
    #[error("joint {joint} has more than one active axis: {axis:?}")]
    MultiAxisJoint { joint: String, axis: [f32; 3] },

    /// A host call failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Errors reported by a [`crate::host::SceneHost`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("operation requires {expected} mode")]
    WrongMode { expected: &'static str },

    #[error("unknown object: {0}")]
    UnknownObject(String),

    #[error("unknown bone: {0}")]
    UnknownBone(String),

    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    #[error("bone already exists: {0}")]
    DuplicateBone(String),

    /// The object type has no material slots (empties, lights, cameras).
    #[error("object {0} cannot carry materials")]
    UnsupportedGeometry(String),

    #[error("failed to import {path}: {reason}")]
    Import { path: String, reason: String },
}

/// Cosmetic problems found during an import.
///
/// These never abort the import; they are logged and collected into the
/// [`crate::import::ImportReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportWarning {
    /// A visual references a global material that was never declared.
    UnresolvedMaterial { link: String, material: String },
    /// A visual carries a material element without a name.
    UnnamedMaterial { link: String },
    /// Mesh reference with an extension no importer handles.
    UnsupportedMeshFormat { link: String, filename: String },
    /// The host failed to import a mesh file.
    MeshImportFailed {
        link: String,
        path: String,
        reason: String,
    },
    /// Only the first nonzero axis component was configured.
    MultiAxisJoint { joint: String, axis: [f32; 3] },
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportWarning::UnresolvedMaterial { link, material } => {
                write!(f, "{link}: global material not found: {material}")
            }
            ImportWarning::UnnamedMaterial { link } => {
                write!(f, "{link}: material without name")
            }
            ImportWarning::UnsupportedMeshFormat { link, filename } => {
                write!(f, "{link}: unsupported mesh format: {filename}")
            }
            ImportWarning::MeshImportFailed { link, path, reason } => {
                write!(f, "{link}: failed to import {path}: {reason}")
            }
            ImportWarning::MultiAxisJoint { joint, axis } => {
                write!(f, "{joint}: several active axis components {axis:?}, using the first")
            }
        }
    }
}
