use std::num::NonZero;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
use crate::measure::Clock;

pub const DEFAULT_MESSAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_SOCKET_PATH: &str = "./socket_test";
pub const DEFAULT_FILE_PATH: &str = "test_file";
pub const DEFAULT_PROJ_ID: u8 = 65;

/// Source of the System V IPC key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShmKey {
    /// `ftok(path, proj_id)`. The path must exist.
    Path { path: PathBuf, proj_id: u8 },
    /// `IPC_PRIVATE`, a fresh segment on every run.
    Private,
}

impl Default for ShmKey {
    fn default() -> Self {
        ShmKey::Path {
            path: PathBuf::from("."),
            proj_id: DEFAULT_PROJ_ID,
        }
    }
}

/// Everything a benchmark run needs to know. Resource names live here so
/// concurrent runs can be kept apart.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub message_size: NonZero<usize>,
    pub socket_path: PathBuf,
    pub file_path: PathBuf,
    pub shm_key: ShmKey,
    pub clock: Clock,
    pub verify: bool,
}

impl BenchConfig {
    pub fn new() -> Self {
        BenchConfig {
            message_size: NonZero::new(DEFAULT_MESSAGE_SIZE).unwrap_or(NonZero::<usize>::MIN),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            shm_key: ShmKey::default(),
            clock: Clock::default(),
            verify: false,
        }
    }

    /// Builds a config from the command line: an optional message size in
    /// bytes as the first argument after the program name. Anything that is
    /// not a positive integer falls back to the default size.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = BenchConfig::new();
        let Some(arg) = args.into_iter().nth(1) else {
            return config;
        };
        match parse_size(arg.as_ref()) {
            Ok(size) => config.message_size(size),
            Err(err) => {
                log::warn!(
                    "{}, using default size: {} bytes",
                    err,
                    config.message_size
                );
                config
            }
        }
    }

    pub fn message_size(mut self, size: NonZero<usize>) -> Self {
        self.message_size = size;
        self
    }

    pub fn socket_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.socket_path = path.as_ref().to_path_buf();
        self
    }

    pub fn file_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file_path = path.as_ref().to_path_buf();
        self
    }

    pub fn shm_key(mut self, key: ShmKey) -> Self {
        self.shm_key = key;
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_size(arg: &str) -> Result<NonZero<usize>> {
    arg.trim()
        .parse::<usize>()
        .ok()
        .and_then(NonZero::new)
        .ok_or_else(|| ErrorKind::InvalidSize(arg.to_string()).into())
}
