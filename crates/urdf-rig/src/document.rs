//! Parsed robot description
//!
//! [`RobotDocument`] is the flat link/joint/material view of a URDF file that
//! the tree builder consumes. XML parsing itself is delegated to `urdf-rs`;
//! this module only converts its types and records which optional elements
//! were actually declared.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::RigError;
use crate::types::{Geometry, JointKind, JointLimit, MaterialDecl, Pose};

/// `<inertial>` element of a link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InertialDecl {
    pub origin: Option<Pose>,
}

/// `<collision>` element of a link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionDecl {
    pub origin: Option<Pose>,
}

/// `<visual>` element of a link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualDecl {
    pub origin: Option<Pose>,
    pub geometry: Option<Geometry>,
    pub material: Option<MaterialDecl>,
}

/// A `<link>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDecl {
    pub name: String,
    pub inertial: Option<InertialDecl>,
    pub collision: Option<CollisionDecl>,
    pub visual: Option<VisualDecl>,
}

impl LinkDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_inertial_origin(mut self, origin: Pose) -> Self {
        self.inertial = Some(InertialDecl {
            origin: Some(origin),
        });
        self
    }

    pub fn with_collision_origin(mut self, origin: Pose) -> Self {
        self.collision = Some(CollisionDecl {
            origin: Some(origin),
        });
        self
    }

    pub fn with_visual(mut self, visual: VisualDecl) -> Self {
        self.visual = Some(visual);
        self
    }
}

/// A `<joint>` element
#[derive(Debug, Clone, PartialEq)]
pub struct JointDecl {
    pub name: String,
    pub kind: JointKind,
    /// Parent link name
    pub parent: String,
    /// Child link name
    pub child: String,
    pub origin: Option<Pose>,
    pub axis: Option<[f32; 3]>,
    pub limit: Option<JointLimit>,
}

impl JointDecl {
    pub fn new(
        name: impl Into<String>,
        kind: JointKind,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.into(),
            child: child.into(),
            origin: None,
            axis: None,
            limit: None,
        }
    }

    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_axis(mut self, axis: [f32; 3]) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn with_limit(mut self, lower: f32, upper: f32) -> Self {
        self.limit = Some(JointLimit::new(lower, upper));
        self
    }
}

/// A whole robot description: links, joints in document order, and the
/// globally declared materials
#[derive(Debug, Clone, Default)]
pub struct RobotDocument {
    pub name: String,
    links: Vec<LinkDecl>,
    link_index: HashMap<String, usize>,
    pub joints: Vec<JointDecl>,
    pub materials: Vec<MaterialDecl>,
    /// Directory of the source file, used to resolve relative mesh paths
    pub source_dir: Option<PathBuf>,
}

impl RobotDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a URDF file from disk
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, RigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut document = Self::from_xml_str(&content)?;
        document.source_dir = path.parent().map(Path::to_path_buf);
        Ok(document)
    }

    /// Parse a URDF XML string.
    ///
    /// Joints without an `<axis>` element get no axis.
    pub fn from_xml_str(xml: &str) -> Result<Self, RigError> {
        let robot = urdf_rs::read_from_string(xml).map_err(|e| RigError::Parse(e.to_string()))?;
        let with_axis = joints_with_axis(xml)?;

        let mut document = Self::from_urdf(&robot);
        for joint in &mut document.joints {
            if joint.axis.is_some() && !with_axis.contains(&joint.name) {
                tracing::debug!("Joint {} declares no axis", joint.name);
                joint.axis = None;
            }
        }
        Ok(document)
    }

    /// Convert an already parsed `urdf_rs::Robot`.
    ///
    /// `urdf_rs` cannot tell a missing `<axis>` from `xyz="1 0 0"`, so moving
    /// joints always carry its value here.
    pub fn from_urdf(robot: &urdf_rs::Robot) -> Self {
        let mut document = Self::new(robot.name.clone());
        for link in &robot.links {
            document.add_link(convert_link(link));
        }
        for joint in &robot.joints {
            document.add_joint(convert_joint(joint));
        }
        document.materials = robot.materials.iter().map(MaterialDecl::from).collect();
        document
    }

    /// Add a link. A second link with an already known name is ignored.
    pub fn add_link(&mut self, link: LinkDecl) {
        if self.link_index.contains_key(&link.name) {
            tracing::warn!("Duplicate link {} ignored", link.name);
            return;
        }
        self.link_index.insert(link.name.clone(), self.links.len());
        self.links.push(link);
    }

    pub fn add_joint(&mut self, joint: JointDecl) {
        self.joints.push(joint);
    }

    pub fn add_material(&mut self, material: MaterialDecl) {
        self.materials.push(material);
    }

    pub fn with_link(mut self, link: LinkDecl) -> Self {
        self.add_link(link);
        self
    }

    pub fn with_joint(mut self, joint: JointDecl) -> Self {
        self.add_joint(joint);
        self
    }

    pub fn with_material(mut self, material: MaterialDecl) -> Self {
        self.add_material(material);
        self
    }

    /// Links in document order
    pub fn links(&self) -> &[LinkDecl] {
        &self.links
    }

    /// Look up a link by name
    pub fn link(&self, name: &str) -> Option<&LinkDecl> {
        self.link_index.get(name).map(|&i| &self.links[i])
    }

    /// Joints whose parent is the given link, in document order
    pub fn joints_from<'a>(&'a self, link: &'a str) -> impl Iterator<Item = &'a JointDecl> + 'a {
        self.joints.iter().filter(move |j| j.parent == link)
    }

    /// The single link that is not the child of any joint
    pub fn root_link(&self) -> Result<&LinkDecl, RigError> {
        let child_links: HashSet<&str> = self.joints.iter().map(|j| j.child.as_str()).collect();
        let mut roots = self
            .links
            .iter()
            .filter(|l| !child_links.contains(l.name.as_str()));

        let root = roots
            .next()
            .ok_or_else(|| RigError::MalformedTree("no root link found".into()))?;

        let extra: Vec<&str> = roots.map(|l| l.name.as_str()).collect();
        if !extra.is_empty() {
            return Err(RigError::MalformedTree(format!(
                "multiple root links: {}, {}",
                root.name,
                extra.join(", ")
            )));
        }

        Ok(root)
    }
}

/// urdf-rs fills absent origins with zeros, so an all-zero pose is read as
/// "not declared".
fn declared_origin(pose: &urdf_rs::Pose) -> Option<Pose> {
    Some(Pose::from(pose)).filter(|p| !p.is_identity())
}

/// Names of the joints that carry an `<axis>` element
fn joints_with_axis(xml: &str) -> Result<HashSet<String>, RigError> {
    let mut reader = Reader::from_str(xml);
    let mut declared = HashSet::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"joint" => {
                current = attribute(e, "name");
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => current = None,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"axis" => {
                if let Some(joint) = &current {
                    declared.insert(joint.clone());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RigError::Parse(e.to_string())),
        }
    }

    Ok(declared)
}

fn attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| String::from_utf8(attr.value.to_vec()).ok())
}

fn convert_link(link: &urdf_rs::Link) -> LinkDecl {
    let inertial = &link.inertial;
    let inertia = &inertial.inertia;
    let has_inertial = inertial.mass.value != 0.0
        || [inertia.ixx, inertia.ixy, inertia.ixz, inertia.iyy, inertia.iyz, inertia.izz]
            .iter()
            .any(|v| *v != 0.0)
        || declared_origin(&inertial.origin).is_some();

    if link.visual.len() > 1 {
        tracing::debug!(
            "Link {} has {} visual elements, using the first",
            link.name,
            link.visual.len()
        );
    }

    LinkDecl {
        name: link.name.clone(),
        inertial: has_inertial.then(|| InertialDecl {
            origin: declared_origin(&inertial.origin),
        }),
        collision: link.collision.first().map(|c| CollisionDecl {
            origin: declared_origin(&c.origin),
        }),
        visual: link.visual.first().map(|v| VisualDecl {
            origin: declared_origin(&v.origin),
            geometry: Some(Geometry::from(&v.geometry)),
            material: v.material.as_ref().map(MaterialDecl::from),
        }),
    }
}

fn convert_joint(joint: &urdf_rs::Joint) -> JointDecl {
    let kind = JointKind::from(&joint.joint_type);
    let axis = [
        joint.axis.xyz.0[0] as f32,
        joint.axis.xyz.0[1] as f32,
        joint.axis.xyz.0[2] as f32,
    ];

    JointDecl {
        name: joint.name.clone(),
        kind,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: declared_origin(&joint.origin),
        axis: (kind.has_axis() && axis != [0.0; 3]).then_some(axis),
        limit: if kind.has_limits() {
            JointLimit::from_urdf(&joint.limit)
        } else {
            None
        },
    }
}
