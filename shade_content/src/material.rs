use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{shader::ShaderImportSettings, AssetKey, PropertyName, Shader};

/// Material that binds textures to the properties of a shader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub shader: AssetKey,
    #[serde(default)]
    pub textures: BTreeMap<PropertyName, AssetKey>,
    /// Everything else that has been added to the material, e.g. colors and floats.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl Material {
    /// Creates a material that starts with the default textures of the shader.
    pub fn new(shader: &Shader, shader_settings: &ShaderImportSettings) -> Self {
        Self {
            shader: shader.asset_key().clone(),
            textures: shader_settings.default_textures.clone(),
            other: BTreeMap::new(),
        }
    }

    /// Binds the texture to the property and returns the texture that was bound before.
    pub fn set_texture(&mut self, property_name: PropertyName, texture: AssetKey) -> Option<AssetKey> {
        self.textures.insert(property_name, texture)
    }

    pub fn texture(&self, property_name: &PropertyName) -> Option<&AssetKey> {
        self.textures.get(property_name)
    }
}

/// Returns the key of the material of the shader. The material is located one directory above the
/// directory of the shader and is named after the name of the shader without `name_prefix`.
///
/// # Example
///
/// ```rust
/// use shade_content::{material::material_key, AssetKey, Shader};
/// let shader = Shader::new("Root/Shade/Surface/Foo/Foo.shader", "Shade/Foo");
/// assert_eq!(material_key(&shader, "Shade/", "mat"), AssetKey::new("Root/Shade/Surface/Foo.mat"));
/// ```
pub fn material_key(shader: &Shader, name_prefix: &str, extension: &str) -> AssetKey {
    let parent = shader.directory().parent().unwrap_or(Path::new(""));
    AssetKey::new(parent.join(format!("{}.{extension}", shader.short_name(name_prefix))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(label: &str) -> PropertyName {
        PropertyName::from_label(label).unwrap()
    }

    #[test]
    fn key_is_next_to_shader_directory() {
        let shader = Shader::new("Root/Shade/Surface/Foo/Foo.shader", "Shade/Foo");
        assert_eq!(material_key(&shader, "Shade/", "mat"), AssetKey::new("Root/Shade/Surface/Foo.mat"));
    }

    #[test]
    fn key_of_shader_near_root() {
        let shader = Shader::new("Foo/Foo.shader", "Shade/Foo");
        assert_eq!(material_key(&shader, "Shade/", "mat"), AssetKey::new("Foo.mat"));
        let shader = Shader::new("Foo.shader", "Shade/Foo");
        assert_eq!(material_key(&shader, "Shade/", "mat"), AssetKey::new("Foo.mat"));
    }

    #[test]
    fn new_material_uses_default_textures() {
        let shader = Shader::new("Shade/Foo/Foo.shader", "Shade/Foo");
        let mut shader_settings = ShaderImportSettings::default();
        shader_settings
            .default_textures
            .insert(property("Base Color"), AssetKey::new("Shade/Foo/Base Color.png"));
        let material = Material::new(&shader, &shader_settings);
        assert_eq!(material.shader, AssetKey::new("Shade/Foo/Foo.shader"));
        assert_eq!(
            material.texture(&property("Base Color")),
            Some(&AssetKey::new("Shade/Foo/Base Color.png"))
        );
    }

    #[test]
    fn set_texture_replaces_binding() {
        let shader = Shader::new("Shade/Foo/Foo.shader", "Shade/Foo");
        let mut material = Material::new(&shader, &ShaderImportSettings::default());
        assert_eq!(material.set_texture(property("Albedo"), AssetKey::new("a.png")), None);
        assert_eq!(
            material.set_texture(property("Albedo"), AssetKey::new("b.png")),
            Some(AssetKey::new("a.png"))
        );
        assert_eq!(material.texture(&property("Albedo")), Some(&AssetKey::new("b.png")));
    }
}
