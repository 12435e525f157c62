//! URDF Rig
//!
//! Turns URDF robot descriptions into armatures inside a 3D host:
//! - RobotDocument: parsed links, joints and global materials
//! - KinematicTree: joint tree hanging off the base link
//! - SkeletonEmitter: rest pass (bones) and pose pass (constraints, visuals)
//! - SceneHost: the host surface, with MemoryScene as an in-memory host
//! - RobotImporter: the whole pipeline with a shared material registry

pub mod config;
pub mod document;
pub mod emitter;
pub mod error;
pub mod geometry;
pub mod host;
pub mod import;
pub mod link;
pub mod material;
pub mod resolve;
pub mod scene;
pub mod tree;
pub mod types;

pub use config::{AxisPolicy, ConfigError, ImportOptions};
pub use document::RobotDocument;
pub use emitter::{Emission, SkeletonEmitter};
pub use error::{HostError, ImportWarning, RigError};
pub use host::SceneHost;
pub use import::{ImportReport, RobotImporter};
pub use link::LinkRecord;
pub use material::{MaterialRegistry, SharedMaterialRegistry, create_shared_registry};
pub use scene::MemoryScene;
pub use tree::{JointNode, KinematicTree, KinematicTreeBuilder, NodeId};
pub use types::*;
