use std::io;

use nix::sys::signal::Signal;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error("{op}: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("consumer exited with status {0}")]
    ChildExited(i32),
    #[error("consumer was killed by {0}")]
    ChildSignaled(Signal),
    #[error("consumer observed a corrupt message")]
    CorruptMessage,
    #[error("message size must be a positive byte count, got {0:?}")]
    InvalidSize(String),
    #[error("cannot allocate a {0} byte message buffer")]
    Alloc(usize),
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Name of the syscall that failed, if this is an OS error.
    pub fn op(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::Os { op, .. } => Some(op),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Tags a failed syscall with its name.
pub(crate) trait During<T> {
    fn during(self, op: &'static str) -> Result<T>;
}

impl<T> During<T> for std::result::Result<T, io::Error> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|source| Error::new(ErrorKind::Os { op, source }))
    }
}

impl<T> During<T> for std::result::Result<T, nix::Error> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|errno| {
            Error::new(ErrorKind::Os {
                op,
                source: errno.into(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn os_errors_name_the_failing_call() {
        let err = Err::<(), _>(Errno::EACCES).during("shmget").unwrap_err();
        assert_eq!(err.op(), Some("shmget"));
        assert!(err.to_string().starts_with("shmget: "));
    }

    #[test]
    fn child_errors_have_no_op() {
        let err = Error::new(ErrorKind::ChildExited(1));
        assert_eq!(err.op(), None);
        assert_eq!(err.to_string(), "consumer exited with status 1");
    }
}
