use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use shade_shared::{
    log::{info, trace, warn},
    pathdiff,
    walkdir::WalkDir,
};

use crate::{
    asset_store::{ImportSettings, ReadAsset},
    common::extract_extension_from_path,
    AssetKey, Error, PropertyName, Result,
};

/// Extension of the shader source files.
pub const SHADER_EXTENSION: &str = "shader";

/// A shader asset together with the name it declares in its source, e.g. `Shade/Foo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Shader {
    asset_key: AssetKey,
    name: String,
}

impl Shader {
    pub fn new(asset_key: impl Into<AssetKey>, name: impl Into<String>) -> Self {
        Self {
            asset_key: asset_key.into(),
            name: name.into(),
        }
    }

    /// Reads the name from the `Shader "..."` declaration in the shader source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shade_content::Shader;
    /// let source = "// Generated by Shade\nShader \"Shade/Foo\"\n{\n}\n";
    /// let shader = Shader::parse_declaration("Shade/Foo/Foo.shader", source).unwrap();
    /// assert_eq!(shader.name(), "Shade/Foo");
    /// ```
    pub fn parse_declaration(asset_key: impl Into<AssetKey>, source: &str) -> Option<Self> {
        let name = source
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.starts_with("//"))
            .find_map(|line| {
                let rest = line.strip_prefix("Shader")?.trim_start();
                let rest = rest.strip_prefix('"')?;
                let end = rest.find('"')?;
                Some(&rest[..end])
            })?;
        Some(Self::new(asset_key, name))
    }

    /// Loads the shader source from the store and reads its declaration. Returns `None` when the source declares no shader.
    pub fn load<S: ReadAsset>(store: &S, asset_key: impl Into<AssetKey>) -> Result<Option<Self>> {
        let asset_key = asset_key.into();
        let Some(source) = store.read(&asset_key)? else {
            return Err(Error::MissingShader(asset_key));
        };
        let source = String::from_utf8_lossy(&source);
        Ok(Self::parse_declaration(asset_key, &source))
    }

    pub fn asset_key(&self) -> &AssetKey {
        &self.asset_key
    }

    /// Returns the name that the shader declares.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name without the given prefix.
    pub fn short_name(&self, prefix: &str) -> &str {
        self.name.strip_prefix(prefix).unwrap_or(&self.name)
    }

    /// Returns the directory that contains the shader and the files that belong to it.
    pub fn directory(&self) -> &Path {
        self.asset_key.directory()
    }
}

/// Import settings of a shader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderImportSettings {
    /// Textures that new materials of the shader start with.
    pub default_textures: BTreeMap<PropertyName, AssetKey>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl ImportSettings for ShaderImportSettings {}

/// Finds all shaders below `root` whose declared name starts with `prefix`, ordered by their key.
pub fn discover_shaders(root: impl AsRef<Path>, prefix: &str) -> Result<Vec<Shader>> {
    let root = root.as_ref();
    info!("Discovering shaders in '{}'", root.display());

    let mut shaders = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read directory entry in '{}': {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !matches!(extract_extension_from_path(entry.path()), Ok(extension) if extension == SHADER_EXTENSION) {
            continue;
        }

        let Some(relative_path) = pathdiff::diff_paths(entry.path(), root) else {
            warn!("Failed to get relative path of '{}' relative to '{}'", entry.path().display(), root.display());
            continue;
        };
        let source = match fs::read_to_string(entry.path()) {
            Ok(source) => source,
            Err(err) => {
                warn!("Failed to read shader '{}': {err}", entry.path().display());
                continue;
            }
        };
        match Shader::parse_declaration(relative_path, &source) {
            Some(shader) if shader.name().starts_with(prefix) => {
                trace!("Found shader '{}' in {}", shader.name(), shader.asset_key());
                shaders.push(shader);
            }
            Some(shader) => trace!("Ignoring shader '{}' because it isn't prefixed with '{prefix}'", shader.name()),
            None => warn!("No shader declaration in '{}'", entry.path().display()),
        }
    }

    shaders.sort();
    Ok(shaders)
}
