use std::{
    env,
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use shade_shared::{
    crossbeam_channel::{self, Receiver, Sender},
    log::{info, trace, warn},
    parking_lot::Mutex,
};

use crate::{
    asset_store::{ReadAsset, WriteAsset},
    AssetKey, Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Reimported(AssetKey),
}

/// [`AssetStore`](crate::AssetStore) that stores the assets as files in a directory.
///
/// The [`AssetKey`]s are paths relative to the root directory. The import settings of an asset
/// are stored in a sidecar file next to the asset.
pub struct FileSystem {
    root: PathBuf,
    senders: Arc<Mutex<Vec<Sender<Event>>>>,
}

impl FileSystem {
    /// Creates a new [`FileSystem`] and checks that the given root directory exists.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shade_content::FileSystem;
    /// let _file_system = FileSystem::new("assets").unwrap();
    /// ```
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = env::current_dir()?.join(root);
        if !root.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("Directory '{}' does not exist", root.display())).into());
        }
        info!("Creating FileSystem asset store in '{}'", root.display());
        Ok(Self {
            root,
            senders: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns a channel that can be used to observe [`Event`]s.
    pub fn observe(&self) -> Receiver<Event> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.senders.lock().push(sender);
        receiver
    }

    fn absolute_path(&self, asset_key: &AssetKey) -> Result<PathBuf> {
        check_path(asset_key)?;
        Ok(self.root.join(asset_key.as_path()))
    }
}

/// Rejects keys that could point outside of the root directory.
fn check_path(asset_key: &AssetKey) -> Result<()> {
    let path = asset_key.as_path();
    if path.is_absolute() || path.components().any(|component| !matches!(component, Component::Normal(_) | Component::CurDir)) {
        return Err(Error::InvalidPath(asset_key.as_path().to_owned()));
    }
    Ok(())
}

/// Path of the file that is written first and then renamed to `path`.
fn temporary_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or(Error::InvalidPath(path.to_owned()))?;
    let mut temporary_file_name = OsString::from(".");
    temporary_file_name.push(file_name);
    temporary_file_name.push(".tmp");
    Ok(path.with_file_name(temporary_file_name))
}

impl ReadAsset for FileSystem {
    fn read(&self, asset_key: &AssetKey) -> Result<Option<Vec<u8>>> {
        let path = self.absolute_path(asset_key)?;
        match fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, asset_key: &AssetKey) -> bool {
        self.absolute_path(asset_key).map(|path| path.is_file()).unwrap_or(false)
    }
}

impl WriteAsset for FileSystem {
    fn write(&mut self, asset_key: &AssetKey, content: &[u8]) -> Result<()> {
        let path = self.absolute_path(asset_key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers must never see a partially written file.
        let temporary_path = temporary_path(&path)?;
        trace!("Writing '{}' through '{}'", path.display(), temporary_path.display());
        fs::write(&temporary_path, content)?;
        fs::rename(&temporary_path, &path)?;
        Ok(())
    }

    fn reimport(&mut self, asset_key: &AssetKey) -> Result<()> {
        // Send a Reimported event to all observers and remove the channels
        // that are no longer active.
        let mut senders = self.senders.lock();
        senders.retain(|sender| {
            if let Err(err) = sender.send(Event::Reimported(asset_key.clone())) {
                warn!("Failed to send Reimported event for asset {asset_key}: \"{err}\". Channel will be removed.");
                false
            } else {
                trace!("Sent Reimported event for asset {asset_key}");
                true
            }
        });
        Ok(())
    }
}
