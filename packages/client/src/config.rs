//! Reading and writing `lunatodo-client.toml`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use store::LunaTodoConfig;
use tracing::info;

use crate::ClientError;

pub fn config_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(LunaTodoConfig::filename())
}

/// Parse the config file at `path`.
pub fn read_config(path: impl AsRef<Path>) -> Result<LunaTodoConfig, ClientError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ClientError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LunaTodoConfig::from_toml(&contents)?)
}

/// Load `lunatodo-client.toml` from `dir`. When the file does not exist yet, the
/// defaults are written there and returned.
pub fn load_or_create_config(dir: impl AsRef<Path>) -> Result<LunaTodoConfig, ClientError> {
    let path = config_path(dir);
    match read_config(&path) {
        Err(ClientError::ConfigIo { source, .. }) if source.kind() == ErrorKind::NotFound => {
            let config = LunaTodoConfig::default();
            let io_error = |source| ClientError::ConfigIo {
                path: path.clone(),
                source,
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
            fs::write(&path, config.to_toml()?).map_err(io_error)?;
            info!(path = %path.display(), "wrote default client config");
            Ok(config)
        }
        other => other,
    }
}
