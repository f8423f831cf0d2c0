//! Document serialization and persistence.
//!
//! # Responsibilities
//! - Render the document as canonical indented JSON
//! - Write the rendered bytes to the destination path
//!
//! # Design Decisions
//! - Pretty JSON in struct declaration order; the engine tolerates any
//!   order but diffs and tooling assume this canonical one
//! - Write-then-rename: the destination is either untouched or holds the
//!   fully written new content, never a partial write
//! - Mode 0o640: owner read/write, group read, nothing for world

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ConfigDocument;

const FILE_MODE: u32 = 0o640;

/// Errors from rendering or writing the configuration file.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The document could not be rendered as JSON.
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    /// The rendered bytes could not be written to disk.
    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Renders the document as canonical indented JSON.
pub fn serialize(document: &ConfigDocument) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec_pretty(document)?)
}

/// Writes the document to `path`, fully or not at all.
pub fn persist(document: &ConfigDocument, path: &Path) -> Result<(), PersistError> {
    let data = serialize(document)?;
    let staged = staging_path(path);

    if let Err(source) = stage(&staged, &data) {
        let _ = fs::remove_file(&staged);
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    fs::rename(&staged, path).map_err(|source| {
        let _ = fs::remove_file(&staged);
        PersistError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn stage(path: &Path, data: &[u8]) -> io::Result<()> {
    fs::write(path, data)?;
    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
