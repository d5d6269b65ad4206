// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! On-disk home for `BusConfig` and friends: one `<key>.json` file per config
//! key, under `--config-dir` or the platform config directory.

use directories::ProjectDirs;
use embed_action_bus::config::{ConfigError, ConfigStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Config store that maps each key to `<base>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store under the platform config directory for `embed-actions`
    /// (`~/.config/embed-actions` on Linux).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "embed-actions")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Store under `base`; the directory is created if absent.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the `<key>.json` files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        fs::read(self.path_for(key)).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io(err),
        })
    }

    /// Writes `<key>.json.tmp` and renames it over `<key>.json`, so a reader
    /// never sees a half-written document.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.base)?;
        let path = self.path_for(key);
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, data)?;
        fs::rename(&staged, &path)?;
        Ok(())
    }
}
