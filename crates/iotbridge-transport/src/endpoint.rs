use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, TransportError};

/// Maximum socket path length, including the trailing NUL.
/// Unix `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS and the BSDs.
#[cfg(target_os = "linux")]
pub const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub const MAX_PATH_LEN: usize = 104;

/// A validated filesystem path naming a Unix domain socket.
///
/// Both sides of the relay build their address from an `Endpoint`, so a path
/// that the receiver could not bind is rejected by the sender as well. Paths
/// are never truncated: anything that does not fit in `sun_path` with its
/// terminator is an error.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    /// Validate `path` as a socket endpoint.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = path_bytes(&path);

        if bytes.is_empty() {
            return Err(TransportError::InvalidPath {
                path,
                reason: "path is empty",
            });
        }
        if bytes.contains(&0) {
            return Err(TransportError::InvalidPath {
                path,
                reason: "path contains a NUL byte",
            });
        }
        if bytes.len() >= MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                len: bytes.len(),
                max: MAX_PATH_LEN - 1,
                path,
            });
        }

        Ok(Self { path })
    }

    /// The socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw path bytes as they are copied into `sun_path`.
    pub fn as_bytes(&self) -> &[u8] {
        path_bytes(&self.path)
    }
}

impl AsRef<Path> for Endpoint {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Endpoint").field(&self.path).finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.display().fmt(f)
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> &[u8] {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}
