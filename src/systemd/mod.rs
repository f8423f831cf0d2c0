//! systemd unit file emission.
//!
//! # Responsibilities
//! - Render a `[Unit]`/`[Service]`/`[Install]` unit for the proxy binary
//! - Quote ExecStart arguments that would otherwise split
//! - Write the unit file, creating parent directories
//!
//! # Design Decisions
//! - The tool never calls `systemctl`; it only leaves the unit on disk and
//!   prints the commands to enable it
//! - A `--unit-path` pointing at a directory gets the canonical unit file
//!   name appended; a `.service` file path is renamed to the canonical name

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Canonical unit file name.
pub const UNIT_NAME: &str = "xray-cli.service";
/// System-space unit directory.
pub const SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";
/// User-space unit directory, relative to `$HOME`.
pub const USER_UNIT_DIR: &str = ".config/systemd/user";

/// Errors from writing the unit file.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The unit directory could not be created.
    #[error("failed to prepare unit directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The unit file could not be written.
    #[error("failed to write unit file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A systemd service unit definition.
#[derive(Debug, Clone)]
pub struct UnitFile {
    pub description: String,
    pub working_dir: PathBuf,
    pub exec_start: String,
    pub restart: String,
    pub wanted_by: String,
}

impl UnitFile {
    /// Renders the unit text.
    pub fn render(&self) -> String {
        format!(
            "[Unit]\n\
             Description={}\n\
             After=network.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             WorkingDirectory={}\n\
             ExecStart={}\n\
             Restart={}\n\
             \n\
             [Install]\n\
             WantedBy={}\n",
            self.description,
            self.working_dir.display(),
            self.exec_start,
            self.restart,
            self.wanted_by,
        )
    }

    /// Writes the rendered unit to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), UnitError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| UnitError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.render()).map_err(|source| UnitError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// ExecStart line launching the proxy binary against a config file.
pub fn exec_start(binary: &Path, config: &Path) -> String {
    format!(
        "{} run -c {}",
        escape_arg(&binary.display().to_string()),
        escape_arg(&config.display().to_string()),
    )
}

/// Resolves a user-supplied unit path to the canonical unit file location.
pub fn normalize_unit_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "service") {
        path.with_file_name(UNIT_NAME)
    } else {
        path.join(UNIT_NAME)
    }
}

fn escape_arg(value: &str) -> String {
    if value.is_empty() {
        return "\"\"".to_string();
    }
    if value.chars().any(|c| " \t'\"`()".contains(c)) {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}
