//! Filesystem side of the mirror

use crate::ExportError;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Removes any previous output and recreates an empty root
///
/// A missing root is not an error.
pub async fn prepare_output_dir(root: &Path) -> Result<(), ExportError> {
    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => tracing::debug!("Removed previous output at {}", root.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(ExportError::io(root, e)),
    }

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| ExportError::io(root, e))
}

/// Writes `contents` to `path`, creating parent directories as needed
pub async fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExportError::io(parent, e))?;
    }

    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ExportError::io(path, e))
}

/// Recursively copies `source` into `target`
///
/// Existing files in `target` are overwritten. Symlinks are not followed
/// or copied. A missing `source` directory copies nothing.
///
/// # Returns
///
/// The number of files copied.
pub fn copy_static_tree(source: &Path, target: &Path) -> Result<usize, ExportError> {
    if !source.is_dir() {
        tracing::warn!(
            "Static directory {} not found, nothing to copy",
            source.display()
        );
        return Ok(0);
    }

    std::fs::create_dir_all(target).map_err(|e| ExportError::io(target, e))?;

    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            ExportError::io(path, e.into())
        })?;

        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&destination)
                .map_err(|e| ExportError::io(&destination, e))?;
        } else if file_type.is_file() {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
            }
            std::fs::copy(entry.path(), &destination)
                .map_err(|e| ExportError::io(entry.path(), e))?;
            copied += 1;
        }
    }

    tracing::info!(
        "Copied {} static files from {}",
        copied,
        source.display()
    );

    Ok(copied)
}
