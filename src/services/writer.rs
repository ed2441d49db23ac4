//! Atomic persistence of configuration files.
//!
//! Contents go to a temporary file in the target's own directory, are synced,
//! and then renamed over the target. Readers of the target see either the old
//! or the new contents. On any failure after the temporary file exists, it is
//! removed before the error is returned.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use std::fs::{self, File};
use std::io::{self, Write};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while persisting a file
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to back up {path}: {source}")]
    Backup {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create temporary file in {dir}: {source}")]
    TempFile {
        dir: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes whole files atomically, optionally keeping a backup of the old copy
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicWriter {
    backup: bool,
}

impl AtomicWriter {
    pub fn new(backup: bool) -> Self {
        Self { backup }
    }

    /// Replaces `path` with `contents`.
    ///
    /// # Returns
    /// The backup path, when a backup was requested and the file existed
    pub fn write(&self, path: &Utf8Path, contents: &str) -> Result<Option<Utf8PathBuf>, WriteError> {
        self.write_with(path, |file| file.write_all(contents.as_bytes()))
    }

    fn write_with<F>(&self, path: &Utf8Path, fill: F) -> Result<Option<Utf8PathBuf>, WriteError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let backup_path = if self.backup {
            backup_file(path)?
        } else {
            None
        };

        let dir = parent_dir(path);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| WriteError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
            tracing::info!("Created directory {}", dir);
        }

        // Dropping `temp` on any early return deletes it.
        let mut temp = NamedTempFile::new_in(&dir).map_err(|source| WriteError::TempFile {
            dir: dir.clone(),
            source,
        })?;

        let write_err = |source| WriteError::Write {
            path: path.to_path_buf(),
            source,
        };
        fill(temp.as_file_mut()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        carry_permissions(path, temp.as_file()).map_err(write_err)?;

        temp.persist(path).map_err(|e| WriteError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        sync_dir(&dir);

        tracing::info!("Wrote {}", path);
        Ok(backup_path)
    }
}

/// Copies `path` aside as `<path>.<pid>.<timestamp>~`. No-op if it does not exist.
pub fn backup_file(path: &Utf8Path) -> Result<Option<Utf8PathBuf>, WriteError> {
    if !path.exists() {
        return Ok(None);
    }

    let backup_path = Utf8PathBuf::from(format!(
        "{}.{}.{}~",
        path,
        std::process::id(),
        Local::now().format("%Y-%m-%d@%H:%M:%S")
    ));

    fs::copy(path, &backup_path).map_err(|source| WriteError::Backup {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Backed up {} to {}", path, backup_path);
    Ok(Some(backup_path))
}

fn parent_dir(path: &Utf8Path) -> Utf8PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    }
}

/// Gives the replacement file the permissions of the file it replaces.
/// New files get 0644 on Unix instead of the temp file's 0600.
fn carry_permissions(target: &Utf8Path, temp: &File) -> io::Result<()> {
    match fs::metadata(target) {
        Ok(meta) => {
            temp.set_permissions(meta.permissions())?;
            carry_ownership(&meta, temp)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                temp.set_permissions(fs::Permissions::from_mode(0o644))?;
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Gives the replacement file the owner and group of the file it replaces.
/// Unprivileged callers may not be allowed to; the file then keeps the
/// caller's ownership.
#[cfg(unix)]
fn carry_ownership(meta: &fs::Metadata, temp: &File) -> io::Result<()> {
    use std::os::unix::fs::{MetadataExt, fchown};

    let current = temp.metadata()?;
    if current.uid() == meta.uid() && current.gid() == meta.gid() {
        return Ok(());
    }
    match fchown(temp, Some(meta.uid()), Some(meta.gid())) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::debug!(
                "Cannot restore owner {}:{}, keeping {}:{}: {}",
                meta.uid(),
                meta.gid(),
                current.uid(),
                current.gid(),
                e
            );
            Ok(())
        }
        result => result,
    }
}

#[cfg(not(unix))]
fn carry_ownership(_meta: &fs::Metadata, _temp: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Utf8Path) {
    let result = File::open(dir).and_then(|handle| handle.sync_all());
    if let Err(e) = result {
        tracing::debug!("Failed to sync directory {}: {}", dir, e);
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Utf8Path) {}
