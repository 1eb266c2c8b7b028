//! The four transports under test. Each one is set up by the parent before
//! the fork; the parent then drives [`Transport::produce`] and the forked
//! child drives [`Transport::consume`].

mod file;
mod mmap;
mod socket;
mod sysv;

use std::fmt::{self, Display};
use std::io;

pub use file::FileTransport;
pub use mmap::MmapTransport;
pub use socket::SocketTransport;
pub use sysv::{ipc_key, OpenOptions, SysvShm, SysvTransport};

use crate::error::Result;
use crate::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
    Mmap,
    SharedMemory,
    File,
    UnixSocket,
}

impl Mechanism {
    /// Every mechanism, in the order they are benchmarked.
    pub const ALL: [Mechanism; 4] = [
        Mechanism::Mmap,
        Mechanism::SharedMemory,
        Mechanism::File,
        Mechanism::UnixSocket,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mechanism::Mmap => "mmap",
            Mechanism::SharedMemory => "shared memory",
            Mechanism::File => "file read-write",
            Mechanism::UnixSocket => "unix socket",
        }
    }
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub trait Transport {
    fn mechanism(&self) -> Mechanism;

    /// Producer side, run by the parent inside the timed window. Must post
    /// `ready` exactly once, as soon as the consumer may start reading.
    fn produce(&mut self, ready: &Semaphore) -> Result<()>;

    /// Consumer side, run by the forked child after `ready` was posted.
    /// Fills `buf` with the received message. Must not allocate: the
    /// parent may have had other threads running when it forked.
    fn consume(&mut self, buf: &mut [u8]) -> io::Result<()>;
}
