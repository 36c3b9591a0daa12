use crate::error::EnergimetError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "energimet";

/// Default directory for downloaded archives and extracted files, under the
/// platform data directory.
pub fn get_data_dir() -> Result<PathBuf, EnergimetError> {
    dirs::data_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or(EnergimetError::DataDirResolution)
}

pub async fn ensure_dir_exists(path: &Path) -> Result<(), EnergimetError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(EnergimetError::DataDirConflict(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| EnergimetError::DataDirCreation(path.to_path_buf(), e))?;
            Ok(())
        }
        Err(e) => Err(EnergimetError::DataDirInspect(path.to_path_buf(), e)),
    }
}
