use std::num::NonZero;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use nix::libc::c_void;
use nix::sys::mman::{mmap_anonymous, munmap, MapFlags, ProtFlags};

use crate::error::{During, Result};

/// An anonymous `MAP_SHARED` region. Stays shared with every child forked
/// while it is mapped.
#[derive(Debug)]
pub(crate) struct MmapRaw {
    pub ptr: NonNull<c_void>,
    pub len: usize,
}

impl MmapRaw {
    pub fn anonymous(len: NonZero<usize>) -> Result<Self> {
        let ptr = unsafe {
            mmap_anonymous(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED | MapFlags::MAP_ANONYMOUS,
            )
            .during("mmap")?
        };
        Ok(MmapRaw {
            ptr,
            len: len.into(),
        })
    }
}

impl Drop for MmapRaw {
    fn drop(&mut self) {
        if let Err(err) = unsafe { munmap(self.ptr, self.len) } {
            log::warn!("munmap of {} bytes failed: {}", self.len, err);
        }
    }
}

impl Deref for MmapRaw {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const u8, self.len) }
    }
}

impl DerefMut for MmapRaw {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut u8, self.len) }
    }
}
