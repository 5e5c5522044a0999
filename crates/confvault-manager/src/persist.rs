//! Backups and atomic writes
//!
//! Writes go to a uniquely named temporary file in the destination's
//! directory, are synced, restricted to the owner and then renamed over the
//! destination. A failure at any point drops the temporary file and leaves
//! the destination untouched.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::SaveError;

/// Mode for configuration directories
pub const DIR_MODE: u32 = 0o700;

/// Mode for configuration files and backups
pub const FILE_MODE: u32 = 0o600;

/// Backup location for `path`: the file name with `suffix` appended
#[must_use]
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    name.push(suffix);
    path.with_file_name(name)
}

/// Create the parent directory of `path` if missing
///
/// Every newly created level, not just the leaf, is restricted to the owner.
/// Existing ancestors keep their modes.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), SaveError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.is_dir() {
        return Ok(());
    }

    create_private_dirs(parent).map_err(|source| SaveError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;
    restrict_permissions(parent, DIR_MODE).map_err(|source| SaveError::Permissions {
        path: parent.to_path_buf(),
        source,
    })?;
    debug!(dir = %parent.display(), "created configuration directory");
    Ok(())
}

/// Copy an existing file at `path` to its backup location
///
/// Returns the backup path, or `None` when there was nothing to back up.
pub(crate) fn create_backup(path: &Path, suffix: &str) -> Result<Option<PathBuf>, SaveError> {
    if !path.is_file() {
        return Ok(None);
    }

    let backup = backup_path(path, suffix);
    let backup_err = |source| SaveError::Backup {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    };
    fs::copy(path, &backup).map_err(backup_err)?;
    restrict_permissions(&backup, FILE_MODE).map_err(backup_err)?;

    info!(path = %path.display(), backup = %backup.display(), "created configuration backup");
    Ok(Some(backup))
}

/// Atomically replace `path` with `contents`
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), SaveError> {
    atomic_write_with(path, contents, |_| Ok(()))
}

/// [`atomic_write`] with a hook run on the synced temporary file right
/// before the rename
///
/// A hook error aborts the write like any other failure.
pub(crate) fn atomic_write_with<F>(path: &Path, contents: &[u8], before_commit: F) -> Result<(), SaveError>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");

    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|source| SaveError::TempFile {
            dir: dir.clone(),
            source,
        })?;
    let temp_path = temp.path().to_path_buf();

    temp.write_all(contents)
        .and_then(|()| temp.flush())
        .map_err(|source| SaveError::Write {
            path: temp_path.clone(),
            source,
        })?;
    temp.as_file()
        .sync_all()
        .map_err(|source| SaveError::Sync {
            path: temp_path.clone(),
            source,
        })?;
    restrict_permissions(&temp_path, FILE_MODE).map_err(|source| SaveError::Permissions {
        path: temp_path.clone(),
        source,
    })?;
    before_commit(&temp_path).map_err(|source| SaveError::Write {
        path: temp_path.clone(),
        source,
    })?;

    // Dropping the PersistError drops the temp file with it
    temp.persist(path).map_err(|e| SaveError::Rename {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    sync_dir(&dir);

    debug!(path = %path.display(), bytes = contents.len(), "wrote configuration atomically");
    Ok(())
}

#[cfg(unix)]
fn create_private_dirs(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(DIR_MODE).create(dir)
}

#[cfg(not(unix))]
fn create_private_dirs(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/etc/app/config.yaml"), ".backup"),
            PathBuf::from("/etc/app/config.yaml.backup")
        );
    }

    #[test]
    fn atomic_write_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        atomic_write(&path, b"version: '1.0'\n").unwrap();
        atomic_write(&path, b"version: '1.2'\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "version: '1.2'\n");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        ensure_parent_dir(&path).unwrap();
        atomic_write(&path, b"a: 1\n").unwrap();
        let backup = create_backup(&path, ".backup").unwrap().unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(path.parent().unwrap()), DIR_MODE);
        assert_eq!(mode(&path), FILE_MODE);
        assert_eq!(mode(&backup), FILE_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn every_created_directory_level_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let outer = dir.path().join("home");
        let middle = outer.join("config");
        let path = middle.join("stack").join("config.yaml");
        ensure_parent_dir(&path).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&outer), DIR_MODE);
        assert_eq!(mode(&middle), DIR_MODE);
        assert_eq!(mode(path.parent().unwrap()), DIR_MODE);
    }

    #[test]
    fn backup_of_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(create_backup(&dir.path().join("absent.yaml"), ".backup").unwrap(), None);
    }

    #[test]
    fn failure_before_rename_leaves_destination_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: '1.0'\n").unwrap();

        let backup = create_backup(&path, ".backup").unwrap().unwrap();
        let err = atomic_write_with(&path, b"version: '1.2'\n", |_| {
            Err(io::Error::other("injected"))
        })
        .unwrap_err();

        assert!(matches!(err, SaveError::Write { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "version: '1.0'\n");
        assert_eq!(fs::read_to_string(backup).unwrap(), "version: '1.0'\n");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn missing_directory_fails_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("config.yaml");
        assert!(matches!(
            atomic_write(&path, b"a: 1\n"),
            Err(SaveError::TempFile { .. })
        ));
        assert!(!path.exists());
    }
}
