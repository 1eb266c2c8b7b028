use std::ffi::CString;
use std::io;
use std::num::NonZero;
use std::ops::{Deref, DerefMut};
use std::os::unix::ffi::OsStrExt;
use std::ptr::{self, NonNull};
use std::slice;

use nix::libc::{
    c_int, c_void, ftok, key_t, shmat, shmctl, shmdt, shmget, IPC_CREAT, IPC_EXCL, IPC_PRIVATE,
    IPC_RMID,
};

use crate::config::{BenchConfig, ShmKey};
use crate::error::{During, Result};
use crate::message;
use crate::sync::Semaphore;

use super::{Mechanism, Transport};

/// Resolves a [`ShmKey`] to a System V IPC key.
pub fn ipc_key(key: &ShmKey) -> Result<key_t> {
    match key {
        ShmKey::Private => Ok(IPC_PRIVATE),
        ShmKey::Path { path, proj_id } => {
            let path = CString::new(path.as_os_str().as_bytes())
                .map_err(io::Error::from)
                .during("ftok")?;
            let key = unsafe { ftok(path.as_ptr(), c_int::from(*proj_id)) };
            if key == -1 {
                return Err(io::Error::last_os_error()).during("ftok");
            }
            Ok(key)
        }
    }
}

pub struct OpenOptions {
    mode: c_int,
    flags: c_int,
}

impl OpenOptions {
    /// Gets (or creates, if enabled) the segment for `key` and attaches it.
    pub fn attach(self, key: key_t, len: NonZero<usize>) -> Result<SysvShm> {
        let id = unsafe { shmget(key, len.get(), self.flags | self.mode) };
        if id == -1 {
            return Err(io::Error::last_os_error()).during("shmget");
        }
        // Owns the id from here on, so a failed attach still removes it.
        let mut shm = SysvShm {
            id,
            ptr: None,
            len: len.get(),
        };
        let addr = unsafe { shmat(id, ptr::null(), 0) };
        if addr as isize == -1 {
            return Err(io::Error::last_os_error()).during("shmat");
        }
        shm.ptr = NonNull::new(addr);
        Ok(shm)
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = (mode & 0o777) as c_int;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        if create {
            self.flags |= IPC_CREAT;
        } else {
            self.flags &= !IPC_CREAT;
        }
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        if exclusive {
            self.flags |= IPC_EXCL;
        } else {
            self.flags &= !IPC_EXCL;
        }
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            mode: 0o600,
            flags: 0,
        }
    }
}

/// An attached System V shared memory segment. Dropping it detaches the
/// segment and marks it for removal.
pub struct SysvShm {
    id: c_int,
    ptr: Option<NonNull<c_void>>,
    len: usize,
}

impl SysvShm {
    pub fn new(key: key_t, len: NonZero<usize>) -> Result<Self> {
        SysvShm::options().mode(0o666).create(true).attach(key, len)
    }

    pub fn options() -> OpenOptions {
        OpenOptions::default()
    }

    pub fn id(&self) -> c_int {
        self.id
    }
}

impl Deref for SysvShm {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        match self.ptr {
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr() as *const u8, self.len) },
            None => &[],
        }
    }
}

impl DerefMut for SysvShm {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.ptr {
            Some(ptr) => unsafe { slice::from_raw_parts_mut(ptr.as_ptr() as *mut u8, self.len) },
            None => &mut [],
        }
    }
}

impl Drop for SysvShm {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            if unsafe { shmdt(ptr.as_ptr()) } == -1 {
                log::warn!("shmdt failed: {}", io::Error::last_os_error());
            }
        }
        if unsafe { shmctl(self.id, IPC_RMID, ptr::null_mut()) } == -1 {
            log::warn!(
                "shmctl(IPC_RMID) on segment {} failed: {}",
                self.id,
                io::Error::last_os_error()
            );
        }
    }
}

/// Payload in a System V segment. The segment's attachment is inherited by
/// the child; the semaphore stays in its own anonymous mapping.
pub struct SysvTransport {
    shm: SysvShm,
}

impl SysvTransport {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let key = ipc_key(&config.shm_key)?;
        let shm = SysvShm::new(key, config.message_size)?;
        log::debug!("attached sysv segment {} (key {:#x})", shm.id(), key);
        Ok(SysvTransport { shm })
    }
}

impl Transport for SysvTransport {
    fn mechanism(&self) -> Mechanism {
        Mechanism::SharedMemory
    }

    fn produce(&mut self, ready: &Semaphore) -> Result<()> {
        message::fill(&mut self.shm);
        ready.post()
    }

    fn consume(&mut self, buf: &mut [u8]) -> io::Result<()> {
        buf.copy_from_slice(&self.shm);
        Ok(())
    }
}
