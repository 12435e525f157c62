//! Kinematic tree of joints
//!
//! Nodes are stored in an arena owned by [`KinematicTree`] and refer to each
//! other by [`NodeId`]. The tree holds no host handles; emission passes keep
//! their own `NodeId -> bone` maps.

mod builder;

use glam::{Quat, Vec3};

use crate::document::JointDecl;
use crate::link::LinkRecord;
use crate::types::{JointKind, JointLimit};

pub use builder::KinematicTreeBuilder;

/// Index of a node inside its [`KinematicTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One URDF joint together with the link it carries
#[derive(Debug, Clone)]
pub struct JointNode {
    pub id: NodeId,
    pub name: String,
    pub kind: JointKind,
    /// Joint origin relative to the parent joint's frame
    pub local_position: Vec3,
    pub local_orientation: Quat,
    /// Child link of the joint
    pub link: LinkRecord,
    pub axis: Option<Vec3>,
    pub limit: Option<JointLimit>,
    pub parent: Option<NodeId>,
    /// Child joints in document order
    pub children: Vec<NodeId>,
}

impl JointNode {
    pub(crate) fn from_decl(
        id: NodeId,
        decl: &JointDecl,
        link: LinkRecord,
        parent: Option<NodeId>,
    ) -> Self {
        let origin = decl.origin.unwrap_or_default();

        tracing::debug!("Create joint {} ({})", decl.name, decl.kind);

        Self {
            id,
            name: decl.name.clone(),
            kind: decl.kind,
            local_position: origin.position(),
            local_orientation: origin.to_quat(),
            link,
            axis: decl.axis.map(Vec3::from),
            limit: decl.limit,
            parent,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Fixed joints at the end of a chain get no bone configuration; their
    /// link is hung off the parent bone instead
    pub fn is_fixed_leaf(&self) -> bool {
        self.is_leaf() && self.kind == JointKind::Fixed
    }
}

/// Joint tree hanging off a robot's base link
#[derive(Debug, Clone)]
pub struct KinematicTree {
    pub robot_name: String,
    pub base_link: LinkRecord,
    nodes: Vec<JointNode>,
    roots: Vec<NodeId>,
}

impl KinematicTree {
    /// Build a tree from a parsed document
    pub fn build(document: &crate::document::RobotDocument) -> Result<Self, crate::RigError> {
        KinematicTreeBuilder::new(document).build()
    }

    pub fn node(&self, id: NodeId) -> &JointNode {
        &self.nodes[id.0]
    }

    /// All nodes in creation order, which is depth-first pre-order
    pub fn nodes(&self) -> &[JointNode] {
        &self.nodes
    }

    /// Direct children of the base link
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by joint name
    pub fn find(&self, name: &str) -> Option<&JointNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn parent(&self, id: NodeId) -> Option<&JointNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    /// Node ids in depth-first pre-order, roots and siblings in document order
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// Number of joints between a node and the base link, roots being 0
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }
}
