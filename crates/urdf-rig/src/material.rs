//! Material registry and resolution
//!
//! Global `<material>` declarations are collected into a [`MaterialRegistry`]
//! that outlives a single import. Visuals either carry their own color/texture
//! or reference a global material by name.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::error::{HostError, ImportWarning, RigError};
use crate::host::{Appearance, MaterialId, ObjectId, SceneHost};
use crate::resolve::PackageResolver;
use crate::types::{MaterialDecl, Rgba};

/// Registry handle shared between imports that may run on several threads
pub type SharedMaterialRegistry = Arc<RwLock<MaterialRegistry>>;

/// Create an empty shared registry
pub fn create_shared_registry() -> SharedMaterialRegistry {
    Arc::new(RwLock::new(MaterialRegistry::new()))
}

/// Color and texture of a globally declared material
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialEntry {
    pub color: Option<Rgba>,
    pub texture: Option<String>,
}

/// Name to color/texture map, first writer wins
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    entries: HashMap<String, MaterialEntry>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global material. Returns false when the name was already
    /// known, in which case the existing entry is kept.
    pub fn register(&mut self, material: &MaterialDecl) -> bool {
        if self.entries.contains_key(&material.name) {
            return false;
        }
        self.entries.insert(
            material.name.clone(),
            MaterialEntry {
                color: material.color,
                texture: material.texture.clone(),
            },
        );
        true
    }

    /// Register every global material of a document
    pub fn register_all<'a>(&mut self, materials: impl IntoIterator<Item = &'a MaterialDecl>) {
        for material in materials {
            if !self.register(material) {
                tracing::debug!("Material {} already registered", material.name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MaterialEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of resolving a visual's material
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Color/texture declared on the visual itself
    Local(MaterialEntry),
    /// Entry found in the registry
    Global(MaterialEntry),
    /// Name not present in the registry
    Unresolved,
}

impl MaterialRegistry {
    /// Resolve a visual's material. Local materials never touch the registry.
    pub fn resolve(&self, decl: &MaterialDecl) -> Resolution {
        if decl.is_local() {
            return Resolution::Local(MaterialEntry {
                color: decl.color,
                texture: decl.texture.clone(),
            });
        }
        match self.get(&decl.name) {
            Some(entry) => Resolution::Global(entry.clone()),
            None => Resolution::Unresolved,
        }
    }
}

/// Key under which a host material is reused within one import
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MaterialKey {
    Global(String),
    /// Name plus the bit patterns of the color, so that two local materials
    /// sharing a name but not a color stay apart
    Local {
        name: String,
        color: Option<[u32; 4]>,
        texture: Option<String>,
    },
}

/// Per-import material state: the registry handle plus the host materials
/// already created or reused during this import
pub struct MaterialContext<'a> {
    registry: &'a MaterialRegistry,
    resolver: &'a PackageResolver,
    handles: HashMap<MaterialKey, MaterialId>,
    warnings: Vec<ImportWarning>,
}

impl<'a> MaterialContext<'a> {
    pub fn new(registry: &'a MaterialRegistry, resolver: &'a PackageResolver) -> Self {
        Self {
            registry,
            resolver,
            handles: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Resolve `decl` and assign the resulting host material to `object`.
    ///
    /// Missing or unnamed materials are logged and skipped. Objects that
    /// cannot carry materials are silently ignored.
    pub fn apply<H: SceneHost>(
        &mut self,
        host: &mut H,
        object: ObjectId,
        link: &str,
        decl: &MaterialDecl,
    ) -> Result<(), RigError> {
        if decl.name.is_empty() {
            tracing::warn!("Found material without name on link {}", link);
            self.warnings.push(ImportWarning::UnnamedMaterial { link: link.into() });
            return Ok(());
        }

        let (key, entry) = match self.registry.resolve(decl) {
            Resolution::Local(entry) => (
                MaterialKey::Local {
                    name: decl.name.clone(),
                    color: entry.color.map(|c| c.map(f32::to_bits)),
                    texture: entry.texture.clone(),
                },
                entry,
            ),
            Resolution::Global(entry) => (MaterialKey::Global(decl.name.clone()), entry),
            Resolution::Unresolved => {
                tracing::warn!("Global material not found: {} (link {})", decl.name, link);
                self.warnings.push(ImportWarning::UnresolvedMaterial {
                    link: link.into(),
                    material: decl.name.clone(),
                });
                return Ok(());
            }
        };

        let material = match self.handles.get(&key) {
            Some(id) => *id,
            None => {
                let id = self.host_material(host, &key, &entry)?;
                self.handles.insert(key, id);
                id
            }
        };

        match host.assign_material(object, material) {
            Ok(()) => Ok(()),
            Err(HostError::UnsupportedGeometry(name)) => {
                tracing::debug!("Object {} has no material slots", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a host material with the entry's look or create one.
    ///
    /// Names already taken by a material that looks different are skipped in
    /// favor of the next free `name.NNN`, so earlier imports into the same
    /// host keep their colors. The alpha channel is ignored.
    fn host_material<H: SceneHost>(
        &self,
        host: &mut H,
        key: &MaterialKey,
        entry: &MaterialEntry,
    ) -> Result<MaterialId, RigError> {
        let base = match key {
            MaterialKey::Global(name) | MaterialKey::Local { name, .. } => name,
        };
        let wanted = Appearance {
            color: entry.color.map(|rgba| Vec3::new(rgba[0], rgba[1], rgba[2])),
            texture: entry.texture.as_ref().map(|t| self.resolver.resolve(t)),
        };

        let mut suffix = 0usize;
        loop {
            let name = if suffix == 0 {
                base.clone()
            } else {
                format!("{}.{:03}", base, suffix)
            };

            match host.find_material(&name) {
                Some(id) if host.material_appearance(id)? == wanted => return Ok(id),
                Some(_) => suffix += 1,
                None => {
                    tracing::debug!("Create material {}", name);
                    let material = host.create_material(&name)?;
                    if let Some(rgb) = wanted.color {
                        host.set_material_color(material, rgb)?;
                    }
                    if let Some(texture) = &wanted.texture {
                        host.set_material_texture(material, texture)?;
                    }
                    return Ok(material);
                }
            }
        }
    }

    /// Soft errors collected so far
    pub fn into_warnings(self) -> Vec<ImportWarning> {
        self.warnings
    }
}
