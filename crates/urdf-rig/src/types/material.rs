//! Material declarations

use serde::{Deserialize, Serialize};

/// RGBA color with components in 0..=1
pub type Rgba = [f32; 4];

/// A `<material>` element, either global (robot level) or inside a visual
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialDecl {
    pub name: String,
    pub color: Option<Rgba>,
    /// Texture filename, possibly a `package://` reference
    pub texture: Option<String>,
}

impl MaterialDecl {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    /// A material carrying its own color or texture, as opposed to a bare
    /// reference to a globally declared one
    pub fn is_local(&self) -> bool {
        self.color.is_some() || self.texture.is_some()
    }
}

impl From<&urdf_rs::Material> for MaterialDecl {
    fn from(material: &urdf_rs::Material) -> Self {
        Self {
            name: material.name.clone(),
            color: material.color.as_ref().map(|c| {
                [
                    c.rgba.0[0] as f32,
                    c.rgba.0[1] as f32,
                    c.rgba.0[2] as f32,
                    c.rgba.0[3] as f32,
                ]
            }),
            texture: material
                .texture
                .as_ref()
                .map(|t| t.filename.clone())
                .filter(|f| !f.is_empty()),
        }
    }
}
