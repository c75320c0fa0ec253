use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use shade_shared::log::{info, trace};

use crate::{AssetKey, Error, Result};

pub trait ReadAsset {
    /// Returns the content of the asset or `None` when there is no asset with the given key.
    fn read(&self, asset_key: &AssetKey) -> Result<Option<Vec<u8>>>;

    /// Returns whether an asset with the given key exists.
    fn exists(&self, asset_key: &AssetKey) -> bool;
}

pub trait WriteAsset {
    /// Replaces the content of the asset. The asset is either written completely or not at all.
    fn write(&mut self, asset_key: &AssetKey, content: &[u8]) -> Result<()>;

    /// Notifies everyone who depends on the asset that it has to be imported again.
    fn reimport(&mut self, asset_key: &AssetKey) -> Result<()>;
}

/// Import settings that are stored next to the asset they belong to.
pub trait ImportSettings: Serialize + DeserializeOwned + Default {}

/// Typed access to the assets on top of [`ReadAsset`] and [`WriteAsset`].
///
/// Assets and import settings are stored as YAML.
pub trait AssetStore: ReadAsset + WriteAsset {
    /// Loads and decodes the asset or returns `None` when it doesn't exist.
    fn load_asset<T: DeserializeOwned>(&self, asset_key: &AssetKey) -> Result<Option<T>> {
        let Some(content) = self.read(asset_key)? else {
            return Ok(None);
        };
        let asset = serde_yaml::from_slice(&content).map_err(|_| Error::InvalidAssetData(asset_key.as_path().to_owned()))?;
        Ok(Some(asset))
    }

    /// Stores a new asset. Fails when there already is an asset with the given key.
    fn create_asset<T: Serialize>(&mut self, asset_key: &AssetKey, asset: &T) -> Result<()> {
        if self.exists(asset_key) {
            return Err(Error::AssetAlreadyExists(asset_key.clone()));
        }
        info!("Creating asset {asset_key}");
        self.save_asset(asset_key, asset)
    }

    /// Stores the asset and replaces the previous content.
    fn save_asset<T: Serialize>(&mut self, asset_key: &AssetKey, asset: &T) -> Result<()> {
        let content = serde_yaml::to_string(asset).map_err(|err| Error::Other(Box::new(err)))?;
        trace!("Saving asset {asset_key}");
        self.write(asset_key, content.as_bytes())
    }

    /// Loads the import settings of an asset. Returns `None` when the asset itself doesn't exist
    /// and the default settings when the asset exists but has never been configured.
    fn load_import_settings<T: ImportSettings>(&self, asset_key: &AssetKey) -> Result<Option<T>> {
        if !self.exists(asset_key) {
            return Ok(None);
        }
        let settings = self.load_asset(&asset_key.import_settings_key())?;
        Ok(Some(settings.unwrap_or_default()))
    }

    /// Persists the import settings of an asset and reimports the asset so that the settings take effect.
    fn save_and_reimport<T: ImportSettings>(&mut self, asset_key: &AssetKey, settings: &T) -> Result<()> {
        self.save_asset(&asset_key.import_settings_key(), settings)?;
        self.reimport(asset_key)
    }
}

impl<S: ReadAsset + WriteAsset> AssetStore for S {}

/// [`AssetStore`] that keeps all assets in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    assets: BTreeMap<AssetKey, Vec<u8>>,
    reimported: Vec<AssetKey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset or replaces its content.
    pub fn insert(&mut self, asset_key: impl Into<AssetKey>, content: impl Into<Vec<u8>>) {
        self.assets.insert(asset_key.into(), content.into());
    }

    /// All assets ordered by their key.
    pub fn assets(&self) -> &BTreeMap<AssetKey, Vec<u8>> {
        &self.assets
    }

    /// The assets that have been reimported, in the order of the reimports.
    pub fn reimported(&self) -> &[AssetKey] {
        &self.reimported
    }
}

impl ReadAsset for MemoryStore {
    fn read(&self, asset_key: &AssetKey) -> Result<Option<Vec<u8>>> {
        Ok(self.assets.get(asset_key).cloned())
    }

    fn exists(&self, asset_key: &AssetKey) -> bool {
        self.assets.contains_key(asset_key)
    }
}

impl WriteAsset for MemoryStore {
    fn write(&mut self, asset_key: &AssetKey, content: &[u8]) -> Result<()> {
        self.assets.insert(asset_key.clone(), content.to_vec());
        Ok(())
    }

    fn reimport(&mut self, asset_key: &AssetKey) -> Result<()> {
        self.reimported.push(asset_key.clone());
        Ok(())
    }
}
