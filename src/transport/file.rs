use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::PathBuf;

use crate::config::BenchConfig;
use crate::error::{During, Result};
use crate::message;
use crate::sync::Semaphore;

use super::{Mechanism, Transport};

/// A regular file opened once by the parent. The child reads through the
/// inherited descriptor at an explicit offset, so the offset it shares with
/// the parent does not matter.
pub struct FileTransport {
    path: PathBuf,
    file: File,
    len: usize,
}

impl FileTransport {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let path = config.file_path.clone();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o666)
            .open(&path)
            .during("open")?;
        log::debug!("opened {}", path.display());
        Ok(FileTransport {
            path,
            file,
            len: config.message_size.get(),
        })
    }
}

impl Transport for FileTransport {
    fn mechanism(&self) -> Mechanism {
        Mechanism::File
    }

    fn produce(&mut self, ready: &Semaphore) -> Result<()> {
        let mut msg = message::alloc(self.len)?;
        message::fill(&mut msg);
        self.file.write_all(&msg).during("write")?;
        ready.post()
    }

    fn consume(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(buf, 0)
    }
}

impl Drop for FileTransport {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!("failed to unlink {}: {}", self.path.display(), err);
        }
    }
}
