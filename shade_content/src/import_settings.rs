use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shade_shared::log::{trace, warn};

use crate::{
    asset_store::{AssetStore, ImportSettings},
    descriptor::{Options, RequestedFilterMode, RequestedWrapMode},
    AssetKey, Result,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureType {
    #[default]
    Default,
    NormalMap,
}

/// Settings that determine how a texture is imported and sampled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureImportSettings {
    pub wrap_mode: WrapMode,
    pub filter_mode: FilterMode,
    pub texture_type: TextureType,
    /// Settings that are not managed here. They are written back unchanged.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl ImportSettings for TextureImportSettings {}

impl TextureImportSettings {
    /// Updates the settings according to the options of a node.
    ///
    /// A missing wrap mode resets the wrap mode to [`WrapMode::Clamp`] while a missing filter mode keeps
    /// the current filter mode. Values that are not recognized keep the current setting.
    pub fn apply(&mut self, options: &Options) {
        match &options.wrap_mode {
            Some(RequestedWrapMode::Repeat) => self.wrap_mode = WrapMode::Repeat,
            Some(RequestedWrapMode::Clamp) | None => self.wrap_mode = WrapMode::Clamp,
            Some(RequestedWrapMode::Mirror) => self.wrap_mode = WrapMode::Mirror,
            Some(RequestedWrapMode::Unrecognized(value)) => {
                warn!("Unrecognized wrap mode '{value}'. Keeping {:?}", self.wrap_mode)
            }
        }

        match &options.filter_mode {
            Some(RequestedFilterMode::Point) => self.filter_mode = FilterMode::Point,
            Some(RequestedFilterMode::Linear) if options.generate_mipmaps => self.filter_mode = FilterMode::Trilinear,
            Some(RequestedFilterMode::Linear) => self.filter_mode = FilterMode::Bilinear,
            Some(RequestedFilterMode::Unrecognized(value)) => {
                warn!("Unrecognized filter mode '{value}'. Keeping {:?}", self.filter_mode)
            }
            None => {}
        }

        self.texture_type = if options.is_normal_map {
            TextureType::NormalMap
        } else {
            TextureType::Default
        };
    }
}

/// Applies the options of a node to the import settings of the texture and reimports the texture.
///
/// Returns `false` without touching anything when the texture doesn't exist.
pub fn apply_import_settings<S: AssetStore>(store: &mut S, texture: &AssetKey, options: &Options) -> Result<bool> {
    let Some(settings) = updated_import_settings(store, texture, options)? else {
        return Ok(false);
    };
    store.save_and_reimport(texture, &settings)?;
    Ok(true)
}

/// Loads the import settings of the texture and applies the options of a node without writing anything.
pub fn updated_import_settings<S: AssetStore>(store: &S, texture: &AssetKey, options: &Options) -> Result<Option<TextureImportSettings>> {
    let Some(mut settings) = store.load_import_settings::<TextureImportSettings>(texture)? else {
        return Ok(None);
    };
    settings.apply(options);
    trace!("Applying {settings:?} to {texture}");
    Ok(Some(settings))
}
