use std::{io::Error, mem::size_of, num::NonZero};

use nix::errno::Errno;
use nix::libc::{sem_destroy, sem_init, sem_post, sem_t, sem_wait};

use crate::error::{During, Result};
use crate::mmap_raw::MmapRaw;

macro_rules! check_err {
    ($call:expr, $op:literal) => {
        if $call < 0 {
            return Err(Error::last_os_error()).during($op);
        }
    };
}

/// A process-shared POSIX semaphore living in its own anonymous shared
/// mapping. Forked children inherit the mapping, so both sides operate on
/// the same `sem_t`.
pub struct Semaphore {
    mem: MmapRaw,
}

impl Semaphore {
    pub fn new(value: u32) -> Result<Self> {
        let len = NonZero::new(size_of::<sem_t>()).unwrap_or(NonZero::<usize>::MIN);
        let mem = MmapRaw::anonymous(len)?;
        // Only a successfully initialized sem_t may be wrapped, Drop destroys it.
        unsafe {
            check_err!(sem_init(mem.ptr.as_ptr() as *mut sem_t, 1, value), "sem_init");
        }
        Ok(Semaphore { mem })
    }

    fn raw(&self) -> *mut sem_t {
        self.mem.ptr.as_ptr() as *mut sem_t
    }

    pub fn post(&self) -> Result<()> {
        unsafe {
            check_err!(sem_post(self.raw()), "sem_post");
        }
        Ok(())
    }

    /// Blocks until the count is positive, then decrements it.
    pub fn wait(&self) -> Result<()> {
        loop {
            if unsafe { sem_wait(self.raw()) } == 0 {
                return Ok(());
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => return Err(errno).during("sem_wait"),
            }
        }
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        if unsafe { sem_destroy(self.raw()) } < 0 {
            log::warn!("sem_destroy failed: {}", Error::last_os_error());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_then_wait_does_not_block() {
        let sem = Semaphore::new(0).unwrap();
        sem.post().unwrap();
        sem.wait().unwrap();
    }

    #[test]
    fn count_above_sem_value_max_is_rejected() {
        let err = Semaphore::new(u32::MAX).err().unwrap();
        assert_eq!(err.op(), Some("sem_init"));
    }

    #[test]
    fn initial_count_is_honored() {
        let sem = Semaphore::new(2).unwrap();
        sem.wait().unwrap();
        sem.wait().unwrap();
    }
}
