//! Assembly of the joint tree from the flat link/joint tables

use std::collections::HashSet;

use crate::document::RobotDocument;
use crate::error::RigError;
use crate::link::LinkRecord;

use super::{JointNode, KinematicTree, NodeId};

/// Walks a [`RobotDocument`] from its root link downward
pub struct KinematicTreeBuilder<'a> {
    document: &'a RobotDocument,
    visited_links: HashSet<&'a str>,
    reached_joints: usize,
    nodes: Vec<JointNode>,
}

impl<'a> KinematicTreeBuilder<'a> {
    pub fn new(document: &'a RobotDocument) -> Self {
        Self {
            document,
            visited_links: HashSet::new(),
            reached_joints: 0,
            nodes: Vec::new(),
        }
    }

    /// Build the tree.
    ///
    /// Fails with [`RigError::MalformedTree`] when there is not exactly one
    /// root link, when a link is reachable by more than one path, when a joint
    /// names an unknown link, or when some joints cannot be reached from the
    /// root.
    pub fn build(mut self) -> Result<KinematicTree, RigError> {
        let root = self.document.root_link()?;
        self.visited_links.insert(root.name.as_str());

        let base_link = LinkRecord::from_decl(root);
        let roots = self.walk(root.name.as_str(), None)?;

        let total_joints = self.document.joints.len();
        if roots.is_empty() && total_joints > 0 {
            return Err(RigError::MalformedTree(format!(
                "root link '{}' has no joints while {} joints are declared",
                root.name, total_joints
            )));
        }

        if self.reached_joints < total_joints {
            let reached: HashSet<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();
            let unreached: Vec<&str> = self
                .document
                .joints
                .iter()
                .map(|j| j.name.as_str())
                .filter(|name| !reached.contains(name))
                .collect();
            return Err(RigError::MalformedTree(format!(
                "joints not reachable from root link '{}': {}",
                root.name,
                unreached.join(", ")
            )));
        }

        tracing::debug!(
            "Built kinematic tree for {}: {} joints, {} roots",
            self.document.name,
            self.nodes.len(),
            roots.len()
        );

        Ok(KinematicTree {
            robot_name: self.document.name.clone(),
            base_link,
            nodes: self.nodes,
            roots,
        })
    }

    /// Create nodes for every joint leaving `link`, recursing into their child
    /// links, and return the new node ids in document order
    fn walk(&mut self, link: &'a str, parent: Option<NodeId>) -> Result<Vec<NodeId>, RigError> {
        let document = self.document;
        let joints: Vec<_> = document.joints_from(link).collect();
        let mut ids = Vec::with_capacity(joints.len());

        for joint in joints {
            let child = self.document.link(&joint.child).ok_or_else(|| {
                RigError::MalformedTree(format!(
                    "joint '{}' references unknown link '{}'",
                    joint.name, joint.child
                ))
            })?;

            if !self.visited_links.insert(child.name.as_str()) {
                return Err(RigError::MalformedTree(format!(
                    "link '{}' is reachable by more than one path (via joint '{}')",
                    child.name, joint.name
                )));
            }
            self.reached_joints += 1;

            let id = NodeId(self.nodes.len());
            self.nodes.push(JointNode::from_decl(
                id,
                joint,
                LinkRecord::from_decl(child),
                parent,
            ));

            let children = self.walk(child.name.as_str(), Some(id))?;
            self.nodes[id.0].children = children;
            ids.push(id);
        }

        Ok(ids)
    }
}
