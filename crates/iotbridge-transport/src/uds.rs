use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::stream::BridgeStream;

/// Listen backlog used when none is configured.
pub const DEFAULT_BACKLOG: i32 = 5;

/// Options applied when creating a listening endpoint.
#[derive(Debug, Clone)]
pub struct ListenOptions {
    /// Depth of the kernel accept queue.
    pub backlog: i32,
    /// Permission bits for the socket file. `None` keeps the umask default.
    pub mode: Option<u32>,
    /// Remove the socket file when the listener is dropped.
    pub remove_on_drop: bool,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            backlog: DEFAULT_BACKLOG,
            mode: None,
            remove_on_drop: false,
        }
    }
}

/// A bound, listening Unix domain socket.
///
/// The socket file outlives the listener unless `remove_on_drop` was
/// requested, so a receiver that exits leaves its endpoint on disk until the
/// next bind replaces it.
pub struct SocketListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
    remove_on_drop: bool,
}

impl SocketListener {
    /// Bind and listen on `endpoint` with default options.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        Self::bind_with(endpoint, &ListenOptions::default())
    }

    /// Bind and listen on `endpoint`.
    ///
    /// Any non-directory object already at the path is unlinked first. Each
    /// setup step reports its own error variant: [`TransportError::Socket`],
    /// [`TransportError::Bind`] or [`TransportError::Listen`].
    pub fn bind_with(endpoint: &Endpoint, options: &ListenOptions) -> Result<Self> {
        let path = endpoint.path().to_path_buf();

        remove_stale(&path);

        let socket = new_socket().map_err(TransportError::Socket)?;
        let (addr, addr_len) = socket_addr(endpoint);

        // SAFETY: `addr` is a fully initialised `sockaddr_un` that lives across the
        // call and `addr_len` does not exceed its size.
        let rc = unsafe {
            libc::bind(
                socket.as_raw_fd(),
                (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
                addr_len,
            )
        };
        if rc != 0 {
            return Err(TransportError::Bind {
                path,
                source: io::Error::last_os_error(),
            });
        }

        if let Some(mode) = options.mode {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(
                |e| TransportError::Bind {
                    path: path.clone(),
                    source: e,
                },
            )?;
        }

        // SAFETY: `socket` is an open, bound stream socket.
        let rc = unsafe { libc::listen(socket.as_raw_fd(), options.backlog) };
        if rc != 0 {
            return Err(TransportError::Listen {
                path,
                source: io::Error::last_os_error(),
            });
        }

        let created_inode = std::fs::symlink_metadata(&path)
            .ok()
            .map(|metadata| (metadata.dev(), metadata.ino()));

        info!(?path, backlog = options.backlog, "listening on unix domain socket");

        Ok(Self {
            listener: UnixListener::from(socket),
            path,
            created_inode,
            remove_on_drop: options.remove_on_drop,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<BridgeStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        let stream = BridgeStream::from_unix(stream);
        match stream.peer_credentials() {
            Some((uid, gid, pid)) => debug!(uid, gid, pid, "accepted connection"),
            None => debug!("accepted connection"),
        }
        Ok(stream)
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(endpoint: &Endpoint) -> Result<BridgeStream> {
        let path = endpoint.path();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to unix domain socket");
        Ok(BridgeStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        if !self.remove_on_drop {
            return;
        }
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_socket()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "removing socket file");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "socket path identity changed; skipping removal"
                    );
                }
            }
        }
    }
}

fn remove_stale(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(?path, "removed stale endpoint"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        // Left for bind() to report.
        Err(err) => debug!(?path, error = %err, "could not remove existing path"),
    }
}

fn new_socket() -> io::Result<OwnedFd> {
    // SAFETY: socket() takes no pointers.
    let fd = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `fd` was just returned by socket() and nothing else owns it.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    // SAFETY: fcntl on a descriptor we own.
    let rc = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(socket)
}

fn socket_addr(endpoint: &Endpoint) -> (libc::sockaddr_un, libc::socklen_t) {
    // SAFETY: `sockaddr_un` is plain old data and all-zero is a valid value.
    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

    let bytes = endpoint.as_bytes();
    debug_assert!(bytes.len() < addr.sun_path.len());
    for (dst, src) in addr.sun_path.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }

    let len = std::mem::offset_of!(libc::sockaddr_un, sun_path) + bytes.len() + 1;
    (addr, len as libc::socklen_t)
}
