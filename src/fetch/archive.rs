use crate::fetch::error::FetchError;
use log::info;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::task;
use zip::ZipArchive;

/// Expands an in-memory zip payload into `target_dir` and returns the paths of
/// the extracted files, sorted. Extraction is all-or-nothing per archive: an
/// invalid container fails with `CorruptArchive` before anything is written.
pub async fn extract_zip(bytes: Vec<u8>, target_dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let target = target_dir.to_path_buf();
    task::spawn_blocking(move || {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(FetchError::CorruptArchive)?;

        let names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();

        archive
            .extract(&target)
            .map_err(|e| FetchError::ExtractIo(target.clone(), e))?;
        info!("Extracted {} files into {}", names.len(), target.display());

        let mut files: Vec<PathBuf> = names.into_iter().map(|n| target.join(n)).collect();
        files.sort();
        Ok(files)
    })
    .await?
}
