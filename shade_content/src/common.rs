use std::{
    borrow::Cow,
    fmt::{self, Formatter},
    io,
    path::{Path, PathBuf},
    result,
};

use serde::{Deserialize, Serialize};
use shade_shared::thiserror;

/// Extension of the sidecar file that stores the import settings of an asset.
pub const IMPORT_SETTINGS_EXTENSION: &str = "meta";

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed descriptor {path}: {message}")]
    MalformedDescriptor { path: AssetKey, message: String },
    #[error("No descriptor found at {0}")]
    MissingDescriptor(AssetKey),
    #[error("No shader found at {0}")]
    MissingShader(AssetKey),
    #[error("Asset already exists: {0}")]
    AssetAlreadyExists(AssetKey),
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("Failed to read the asset: {0}")]
    InvalidAssetData(PathBuf),
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Other: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Identifies the asset. It's a relative path in the asset directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(PathBuf);

impl AssetKey {
    /// Create a new [`AssetKey`] from a path. No validation is done on the path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shade_content::AssetKey;
    /// let asset_key = AssetKey::new("Shade/Surface/Foo/Foo.shader");
    /// assert_eq!(asset_key.as_str(), "Shade/Surface/Foo/Foo.shader");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the path of the asset.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns the path of the asset as a string.
    pub fn as_str(&self) -> Cow<str> {
        self.0.to_string_lossy()
    }

    /// Returns the directory that contains the asset. The key of an asset in the root directory has an empty parent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::path::Path;
    /// use shade_content::AssetKey;
    /// let asset_key = AssetKey::new("Shade/Foo/Foo.shader");
    /// assert_eq!(asset_key.directory(), Path::new("Shade/Foo"));
    /// ```
    pub fn directory(&self) -> &Path {
        self.0.parent().unwrap_or(Path::new(""))
    }

    /// Returns the key of the sidecar file that stores the import settings of this asset.
    pub fn import_settings_key(&self) -> AssetKey {
        let mut file_name = self.0.as_os_str().to_owned();
        file_name.push(".");
        file_name.push(IMPORT_SETTINGS_EXTENSION);
        AssetKey::new(file_name)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({})", self.as_str())
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for AssetKey {
    fn from(value: &Path) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for AssetKey {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

impl From<&AssetKey> for AssetKey {
    fn from(value: &AssetKey) -> Self {
        value.clone()
    }
}

pub(crate) fn extract_extension_from_path(path: &Path) -> Result<String> {
    Ok(path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_lowercase())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_of_root_asset_is_empty() {
        let asset_key = AssetKey::new("Foo.shader");
        assert_eq!(asset_key.directory(), Path::new(""));
    }

    #[test]
    fn import_settings_key_keeps_extension() {
        let asset_key = AssetKey::new("Shade/Foo/Base Color.png");
        assert_eq!(asset_key.import_settings_key(), AssetKey::new("Shade/Foo/Base Color.png.meta"));
    }

    #[test]
    fn extension_is_lower_case() {
        assert_eq!(extract_extension_from_path(Path::new("Foo/Foo.SHADER")).unwrap(), "shader");
        assert!(extract_extension_from_path(Path::new("Foo/Graph")).is_err());
    }
}
