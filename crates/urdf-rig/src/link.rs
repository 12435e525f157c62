//! Link records
//!
//! URDF links have no origin of their own. A representative one is still
//! needed to place visuals and to orient bones of links without children, so
//! it is taken from the first sub-element that declares one.

use glam::{Quat, Vec3};

use crate::document::{CollisionDecl, InertialDecl, LinkDecl, VisualDecl};
use crate::types::Pose;

/// An immutable URDF link with its derived origin
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub name: String,
    pub inertial: Option<InertialDecl>,
    pub collision: Option<CollisionDecl>,
    pub visual: Option<VisualDecl>,
    pub origin_position: Vec3,
    pub origin_orientation: Quat,
}

impl LinkRecord {
    /// Build a record from a link declaration.
    ///
    /// Origin precedence is inertial, then collision, then visual, then
    /// identity.
    pub fn from_decl(decl: &LinkDecl) -> Self {
        let origin = decl
            .inertial
            .as_ref()
            .and_then(|i| i.origin)
            .or_else(|| decl.collision.as_ref().and_then(|c| c.origin))
            .or_else(|| decl.visual.as_ref().and_then(|v| v.origin))
            .unwrap_or_default();

        tracing::debug!("Create link {}", decl.name);

        Self {
            name: decl.name.clone(),
            inertial: decl.inertial.clone(),
            collision: decl.collision.clone(),
            visual: decl.visual.clone(),
            origin_position: origin.position(),
            origin_orientation: origin.to_quat(),
        }
    }

    pub fn has_visual(&self) -> bool {
        self.visual.is_some()
    }
}

impl From<&LinkDecl> for LinkRecord {
    fn from(decl: &LinkDecl) -> Self {
        Self::from_decl(decl)
    }
}
