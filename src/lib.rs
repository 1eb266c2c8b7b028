//! Times the transfer of one message from a parent to a forked child over
//! four IPC mechanisms: an anonymous shared mapping, a System V segment, a
//! regular file and a Unix domain socket.

pub mod config;
pub mod error;
pub mod measure;
pub mod message;
mod mmap_raw;
pub mod runner;
pub mod sync;
pub mod transport;

pub use config::{BenchConfig, ShmKey};
pub use error::{Error, ErrorKind, Result};
pub use measure::{Clock, Measurement};
pub use runner::{measure, run_all, run_mechanism};
pub use sync::Semaphore;
pub use transport::{Mechanism, Transport};
