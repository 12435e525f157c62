//! Creation of scene objects for link visuals

use std::collections::HashSet;

use glam::Vec3;

use crate::error::{HostError, ImportWarning, RigError};
use crate::host::{ObjectId, Primitive, SceneHost};
use crate::link::LinkRecord;
use crate::resolve::PackageResolver;
use crate::types::{Geometry, MeshFormat};

/// Instantiates a link's visual geometry in the host scene
pub struct GeometryInstancer<'a> {
    resolver: &'a PackageResolver,
    marker_scale: f32,
    warnings: Vec<ImportWarning>,
}

impl<'a> GeometryInstancer<'a> {
    pub fn new(resolver: &'a PackageResolver, marker_scale: f32) -> Self {
        Self {
            resolver,
            marker_scale,
            warnings: Vec::new(),
        }
    }

    /// Create the objects for a link's visual.
    ///
    /// Every object is placed at the link origin and has its origin recentered.
    /// A visual without geometry produces a small marker empty.
    pub fn instantiate<H: SceneHost>(
        &mut self,
        host: &mut H,
        link: &LinkRecord,
    ) -> Result<Vec<ObjectId>, RigError> {
        let geometry = link.visual.as_ref().and_then(|v| v.geometry.as_ref());

        let objects = match geometry {
            Some(Geometry::Mesh { filename, scale }) => {
                self.import_mesh(host, link, filename, *scale)?
            }
            Some(Geometry::Box { size }) => {
                let object = host.add_primitive(Primitive::Cube)?;
                host.set_object_name(object, &link.name)?;
                host.set_object_dimensions(object, Vec3::from(*size))?;
                vec![object]
            }
            Some(Geometry::Cylinder { radius, length }) => {
                let object = host.add_primitive(Primitive::Cylinder {
                    radius: *radius,
                    depth: *length,
                })?;
                host.set_object_name(object, &link.name)?;
                vec![object]
            }
            Some(Geometry::Sphere { radius }) => {
                let object = host.add_primitive(Primitive::UvSphere { radius: *radius })?;
                host.set_object_name(object, &link.name)?;
                vec![object]
            }
            None => {
                let object = host.add_primitive(Primitive::Arrows)?;
                host.set_object_name(object, &link.name)?;
                let mut transform = host.object_transform(object)?;
                transform.scale = Vec3::splat(self.marker_scale);
                host.set_object_transform(object, transform)?;
                vec![object]
            }
        };

        for &object in &objects {
            let mut transform = host.object_transform(object)?;
            transform.location = link.origin_position;
            transform.rotation = link.origin_orientation;
            host.set_object_transform(object, transform)?;
            host.recenter_origin(object)?;
        }

        tracing::debug!("Instantiated {} object(s) for link {}", objects.len(), link.name);
        Ok(objects)
    }

    /// Import a mesh file and return the objects it added to the scene
    fn import_mesh<H: SceneHost>(
        &mut self,
        host: &mut H,
        link: &LinkRecord,
        filename: &str,
        scale: Option<[f32; 3]>,
    ) -> Result<Vec<ObjectId>, RigError> {
        let Some(format) = MeshFormat::from_filename(filename) else {
            tracing::warn!("Unsupported mesh format for link {}: {}", link.name, filename);
            self.warnings.push(ImportWarning::UnsupportedMeshFormat {
                link: link.name.clone(),
                filename: filename.into(),
            });
            return Ok(Vec::new());
        };

        let path = self.resolver.resolve(filename);
        let before: HashSet<ObjectId> = host.objects().into_iter().collect();

        match host.import_mesh(format, &path) {
            Ok(()) => {}
            Err(HostError::Import { path, reason }) => {
                tracing::warn!("Failed to import {} for link {}: {}", path, link.name, reason);
                self.warnings.push(ImportWarning::MeshImportFailed {
                    link: link.name.clone(),
                    path,
                    reason,
                });
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let produced: Vec<ObjectId> = host
            .objects()
            .into_iter()
            .filter(|o| !before.contains(o))
            .collect();

        tracing::debug!(
            "Imported {} ({}) for link {}: {} object(s)",
            path.display(),
            format.name(),
            link.name,
            produced.len()
        );

        if let Some(scale) = scale {
            for &object in &produced {
                let mut transform = host.object_transform(object)?;
                transform.scale *= Vec3::from(scale);
                host.set_object_transform(object, transform)?;
            }
        }

        Ok(produced)
    }

    /// Apply shape-specific sizing to an object after it was aligned to a
    /// bone, which resets its scale
    pub fn rescale<H: SceneHost>(
        &self,
        host: &mut H,
        object: ObjectId,
        geometry: Option<&Geometry>,
    ) -> Result<(), RigError> {
        match geometry {
            Some(Geometry::Mesh { scale, .. }) => {
                if let Some(scale) = scale {
                    let mut transform = host.object_transform(object)?;
                    transform.scale *= Vec3::from(*scale);
                    host.set_object_transform(object, transform)?;
                }
            }
            Some(shape) => {
                if let Some(dimensions) = shape.dimensions() {
                    host.set_object_dimensions(object, dimensions)?;
                }
            }
            None => {
                let mut transform = host.object_transform(object)?;
                transform.scale = Vec3::splat(self.marker_scale);
                host.set_object_transform(object, transform)?;
            }
        }
        Ok(())
    }

    /// Soft errors collected so far
    pub fn into_warnings(self) -> Vec<ImportWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LinkDecl, VisualDecl};
    use crate::scene::{MemoryScene, ObjectKind};
    use crate::types::Pose;
    use approx::assert_relative_eq;

    fn link_with(geometry: Option<Geometry>) -> LinkRecord {
        LinkRecord::from_decl(&LinkDecl::new("part").with_visual(VisualDecl {
            origin: Some(Pose::from_position([0.0, 0.0, 0.25])),
            geometry,
            material: None,
        }))
    }

    #[test]
    fn test_box() {
        let resolver = PackageResolver::default();
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let link = link_with(Some(Geometry::Box { size: [2.0, 1.0, 1.0] }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();

        assert_eq!(objects.len(), 1);
        let object = scene.object(objects[0]).unwrap();
        assert_eq!(object.name, "part");
        assert!(object.dimensions().abs_diff_eq(Vec3::new(2.0, 1.0, 1.0), 1e-6));
        assert_eq!(object.transform.location, Vec3::new(0.0, 0.0, 0.25));
        assert!(object.origin_recentered);
    }

    #[test]
    fn test_sphere() {
        let resolver = PackageResolver::default();
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let link = link_with(Some(Geometry::Sphere { radius: 0.5 }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();

        assert_eq!(objects.len(), 1);
        let dimensions = scene.object(objects[0]).unwrap().dimensions();
        assert_relative_eq!(dimensions.x, 1.0);
        assert_relative_eq!(dimensions.y, 1.0);
        assert_relative_eq!(dimensions.z, 1.0);
    }

    #[test]
    fn test_cylinder() {
        let resolver = PackageResolver::default();
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let link = link_with(Some(Geometry::Cylinder {
            radius: 0.1,
            length: 0.6,
        }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();
        let dimensions = scene.object(objects[0]).unwrap().dimensions();
        assert!(dimensions.abs_diff_eq(Vec3::new(0.2, 0.2, 0.6), 1e-6));
    }

    #[test]
    fn test_marker_for_missing_geometry() {
        let resolver = PackageResolver::default();
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let objects = instancer.instantiate(&mut scene, &link_with(None)).unwrap();
        let object = scene.object(objects[0]).unwrap();
        assert_eq!(object.kind, ObjectKind::Empty);
        assert_eq!(object.name, "part");
        assert_eq!(object.transform.scale, Vec3::splat(0.01));
    }

    #[test]
    fn test_collada_import_captures_new_objects() {
        let resolver = PackageResolver::new(Some("/share".into()), None);
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();
        scene.add_primitive(Primitive::Cube).unwrap();
        scene.register_mesh("/share/robot/meshes/hand.dae", &["palm", "thumb"]);

        let link = link_with(Some(Geometry::Mesh {
            filename: "package://robot/meshes/hand.dae".into(),
            scale: Some([2.0, 2.0, 0.5]),
        }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();

        let names: Vec<&str> = objects
            .iter()
            .map(|id| scene.object(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["palm", "thumb"]);
        for id in &objects {
            assert_eq!(scene.object(*id).unwrap().transform.scale, Vec3::new(2.0, 2.0, 0.5));
        }
        assert!(instancer.into_warnings().is_empty());
    }

    #[test]
    fn test_stl_import_from_disk() {
        let dir = std::env::temp_dir().join(format!("urdf-rig-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let triangle = stl_io::Triangle {
            normal: stl_io::Normal::new([0.0, 0.0, 1.0]),
            vertices: [
                stl_io::Vertex::new([0.0, 0.0, 0.0]),
                stl_io::Vertex::new([0.4, 0.0, 0.0]),
                stl_io::Vertex::new([0.0, 0.2, 0.1]),
            ],
        };
        let mut file = std::fs::File::create(dir.join("link.stl")).unwrap();
        stl_io::write_stl(&mut file, [triangle].iter()).unwrap();
        drop(file);

        let resolver = PackageResolver::new(Some(dir.clone()), None);
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();
        let link = link_with(Some(Geometry::Mesh {
            filename: "package://link.stl".into(),
            scale: None,
        }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();

        assert_eq!(objects.len(), 1);
        let object = scene.object(objects[0]).unwrap();
        assert_eq!(object.name, "link");
        assert!(object.dimensions().abs_diff_eq(Vec3::new(0.4, 0.2, 0.1), 1e-6));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_mesh_is_soft() {
        let resolver = PackageResolver::new(Some("/nonexistent".into()), None);
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let link = link_with(Some(Geometry::Mesh {
            filename: "package://robot/meshes/gone.stl".into(),
            scale: None,
        }));
        let objects = instancer.instantiate(&mut scene, &link).unwrap();
        assert!(objects.is_empty());
        assert!(matches!(
            instancer.into_warnings().as_slice(),
            [ImportWarning::MeshImportFailed { .. }]
        ));
    }

    #[test]
    fn test_unsupported_mesh_format() {
        let resolver = PackageResolver::default();
        let mut instancer = GeometryInstancer::new(&resolver, 0.01);
        let mut scene = MemoryScene::new();

        let link = link_with(Some(Geometry::Mesh {
            filename: "meshes/arm.obj".into(),
            scale: None,
        }));
        assert!(instancer.instantiate(&mut scene, &link).unwrap().is_empty());
        assert!(scene.objects().is_empty());
        assert!(matches!(
            instancer.into_warnings().as_slice(),
            [ImportWarning::UnsupportedMeshFormat { .. }]
        ));
    }
}
