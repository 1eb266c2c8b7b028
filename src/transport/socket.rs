use std::fs;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use nix::sys::socket::{
    accept, bind, connect, listen, socket, AddressFamily, Backlog, SockFlag, SockType, UnixAddr,
};

use crate::config::BenchConfig;
use crate::error::{During, Result};
use crate::message;
use crate::sync::Semaphore;

use super::{Mechanism, Transport};

/// Stream socket bound to a filesystem path. The parent listens and writes,
/// the child connects and reads.
pub struct SocketTransport {
    path: PathBuf,
    addr: UnixAddr,
    listener: OwnedFd,
    len: usize,
}

impl SocketTransport {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let path = config.socket_path.clone();
        remove_socket(&path);
        let addr = UnixAddr::new(&path).during("sockaddr")?;
        let listener = socket(
            AddressFamily::Unix,
            SockType::Stream,
            SockFlag::empty(),
            None,
        )
        .during("socket")?;
        Ok(SocketTransport {
            path,
            addr,
            listener,
            len: config.message_size.get(),
        })
    }
}

impl Transport for SocketTransport {
    fn mechanism(&self) -> Mechanism {
        Mechanism::UnixSocket
    }

    fn produce(&mut self, ready: &Semaphore) -> Result<()> {
        bind(self.listener.as_raw_fd(), &self.addr).during("bind")?;
        log::debug!("listening on {}", self.path.display());
        listen(&self.listener, Backlog::new(1).during("listen")?).during("listen")?;

        // The child only connects once the listener exists.
        ready.post()?;

        let fd = accept(self.listener.as_raw_fd()).during("accept")?;
        let mut conn = UnixStream::from(unsafe { OwnedFd::from_raw_fd(fd) });

        let mut msg = message::alloc(self.len)?;
        message::fill(&mut msg);
        conn.write_all(&msg).during("write")
    }

    fn consume(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let fd = socket(
            AddressFamily::Unix,
            SockType::Stream,
            SockFlag::empty(),
            None,
        )?;
        connect(fd.as_raw_fd(), &self.addr)?;
        UnixStream::from(fd).read_exact(buf)
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        remove_socket(&self.path);
    }
}

fn remove_socket(path: &Path) {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            log::warn!("failed to unlink {}: {}", path.display(), err);
        }
        _ => (),
    }
}
