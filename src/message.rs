//! The benchmark payload: `len - 1` filler bytes followed by a NUL.

use crate::error::{ErrorKind, Result};

pub const FILLER: u8 = b'A';
pub const TERMINATOR: u8 = 0;

/// Fills `buf` with the benchmark message.
pub fn fill(buf: &mut [u8]) {
    if let Some((last, body)) = buf.split_last_mut() {
        body.fill(FILLER);
        *last = TERMINATOR;
    }
}

/// Allocates a zeroed buffer of `len` bytes, reporting failure instead of
/// aborting the process.
pub fn alloc(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| ErrorKind::Alloc(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Checks that `buf` holds a complete message as written by [`fill`].
pub fn is_intact(buf: &[u8]) -> bool {
    match buf.split_last() {
        Some((&last, body)) => last == TERMINATOR && body.iter().all(|&b| b == FILLER),
        None => false,
    }
}
