use std::path::{Component, Path};

use shade_shared::log::warn;

use crate::{asset_store::ReadAsset, descriptor::Options, AssetKey};

/// Determines the key of the image that backs a texture-like node and checks that the image exists.
///
/// The image is expected in `directory` and named after the explicit value of the node or, if
/// there is none, after its label. Returns `None` when the node names no image, when the name
/// leaves `directory` or when the image hasn't been created yet.
///
/// # Example
///
/// ```rust
/// use std::path::{Component, Path};
/// use shade_content::{descriptor::Options, texture::resolve_texture, AssetKey, MemoryStore};
/// let mut store = MemoryStore::new();
/// store.insert("Foo/Base Color.png", vec![0x89, 0x50, 0x4e, 0x47]);
/// let options = Options {
///     user_label: Some("Base Color".to_owned()),
///     ..Options::default()
/// };
/// let texture = resolve_texture(&store, Path::new("Foo"), &options, "png");
/// assert_eq!(texture, Some(AssetKey::new("Foo/Base Color.png")));
/// ```
pub fn resolve_texture<S: ReadAsset>(store: &S, directory: &Path, options: &Options, image_extension: &str) -> Option<AssetKey> {
    let texture_name = options.texture_name()?;
    if Path::new(texture_name).components().any(|component| !matches!(component, Component::Normal(_))) {
        warn!("Texture name '{texture_name}' leaves the directory '{}'. Skipping the node", directory.display());
        return None;
    }
    let asset_key = AssetKey::new(directory.join(format!("{texture_name}.{image_extension}")));
    if store.exists(&asset_key) {
        Some(asset_key)
    } else {
        warn!("Texture {asset_key} doesn't exist. Skipping the node");
        None
    }
}
