//! Owner execute permission handling for downloaded binaries.

use std::path::Path;

use crate::{Error, Result};

/// Give the owner read, write and execute permission on `path`.
///
/// Other permission bits are preserved. Calling this on a file that already
/// carries the bits leaves it unchanged. A no-op on platforms without an
/// executable bit.
///
/// # Errors
///
/// Returns [`Error::Permission`] if the file metadata cannot be read or the
/// new mode cannot be applied.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| Error::permission(path, "cannot read metadata", Some(e)))?;
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();

    if mode & 0o700 != 0o700 {
        permissions.set_mode(mode | 0o700);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| Error::permission(path, "cannot set mode", Some(e)))?;
    }

    Ok(())
}

/// Windows has no executable bit; only confirms the file exists.
///
/// # Errors
///
/// Returns [`Error::Permission`] if `path` is not a regular file.
#[cfg(not(unix))]
pub fn mark_executable(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::permission(path, "not a regular file", None))
    }
}
