use std::io;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::message;
use crate::mmap_raw::MmapRaw;
use crate::sync::Semaphore;

use super::{Mechanism, Transport};

/// Payload in an anonymous shared mapping inherited by the child.
pub struct MmapTransport {
    region: MmapRaw,
}

impl MmapTransport {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let region = MmapRaw::anonymous(config.message_size)?;
        log::debug!("mapped {} anonymous shared bytes", region.len);
        Ok(MmapTransport { region })
    }
}

impl Transport for MmapTransport {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Mmap
    }

    fn produce(&mut self, ready: &Semaphore) -> Result<()> {
        message::fill(&mut self.region);
        ready.post()
    }

    fn consume(&mut self, buf: &mut [u8]) -> io::Result<()> {
        buf.copy_from_slice(&self.region);
        Ok(())
    }
}
