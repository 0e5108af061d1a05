use crate::error::Error;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Whether the platform offers advisory file locks at all. Modeled as a
/// queryable capability rather than ambient state.
pub fn locking_supported() -> bool {
    cfg!(any(unix, windows))
}

/// Access configuration carrying the file-locking policy pair:
/// whether to take an advisory lock on open, and whether to tolerate
/// platforms that cannot lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessConfig {
    use_locking: bool,
    ignore_when_unsupported: bool,
}

impl AccessConfig {
    pub fn new(use_locking: bool, ignore_when_unsupported: bool) -> Self {
        Self {
            use_locking,
            ignore_when_unsupported,
        }
    }

    /// Reads the policy back as it will actually be applied. This equals
    /// the requested pair except when the platform cannot lock and
    /// `ignore_when_unsupported` is set, in which case `use_locking` is
    /// clamped to the platform capability.
    pub fn effective_policy(&self) -> (bool, bool) {
        let use_locking = if self.use_locking && !locking_supported() && self.ignore_when_unsupported
        {
            false
        } else {
            self.use_locking
        };
        (use_locking, self.ignore_when_unsupported)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self::new(locking_supported(), true)
    }
}

/// An open container file. The handle exclusively owns the underlying file
/// and any advisory lock taken on it; both are released exactly once, either
/// by `close` or on drop.
pub struct Container {
    file: std::fs::File,
    path: PathBuf,
    locked: bool,
}

/// Opens the container at `path` under the given access configuration,
/// creating the file if it does not exist yet.
pub fn open_with_policy(path: impl AsRef<Path>, config: &AccessConfig) -> Result<Container, Error> {
    let path = path.as_ref();
    let (use_locking, ignore_when_unsupported) = config.effective_policy();
    if use_locking && !locking_supported() {
        return Err(Error::UnsupportedPolicy(format!(
            "File locking requested for `{}` but the platform cannot lock",
            path.display()
        )));
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)?;

    let mut locked = false;
    if use_locking {
        match file.try_lock_exclusive() {
            Ok(()) => locked = true,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(Error::IoFailure(err));
            }
            Err(err) => {
                // The open file lives on a filesystem that rejects
                // advisory locks, for example some network mounts.
                if ignore_when_unsupported {
                    log::warn!(
                        "Advisory locking unavailable for `{}`: {}",
                        path.display(),
                        err
                    );
                } else {
                    return Err(Error::UnsupportedPolicy(format!(
                        "Could not lock `{}`: {}",
                        path.display(),
                        err
                    )));
                }
            }
        }
    }

    log::info!(
        "Opened container `{}` (locked: {})",
        path.display(),
        locked
    );
    Ok(Container { file, path: path.to_path_buf(), locked })
}

impl Container {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Releases the lock and the file handle. Consumes the container, so a
    /// closed handle cannot be reused or closed twice.
    pub fn close(mut self) -> Result<(), Error> {
        self.release()?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), std::io::Error> {
        if self.locked {
            self.file.unlock()?;
            self.locked = false;
        }
        Ok(())
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!(
                "Failed to release lock on `{}`: {}",
                self.path.display(),
                err
            );
        }
    }
}
