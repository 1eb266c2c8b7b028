use std::hint::black_box;

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use crate::config::BenchConfig;
use crate::error::{During, Error, ErrorKind, Result};
use crate::measure::Measurement;
use crate::message;
use crate::sync::Semaphore;
use crate::transport::{
    FileTransport, Mechanism, MmapTransport, SocketTransport, SysvTransport, Transport,
};

/// Child exit status for a failed wait, connect or read.
pub const EXIT_IO: i32 = 1;
/// Child exit status when verification found a damaged message.
pub const EXIT_CORRUPT: i32 = 2;

/// Sets up `mechanism`, runs one transfer and tears it down again.
pub fn run_mechanism(mechanism: Mechanism, config: &BenchConfig) -> Result<Measurement> {
    log::debug!("{}: setting up", mechanism);
    match mechanism {
        Mechanism::Mmap => measure(&mut MmapTransport::new(config)?, config),
        Mechanism::SharedMemory => measure(&mut SysvTransport::new(config)?, config),
        Mechanism::File => measure(&mut FileTransport::new(config)?, config),
        Mechanism::UnixSocket => measure(&mut SocketTransport::new(config)?, config),
    }
}

/// Runs every mechanism in order, handing each result to `report` as soon
/// as it is available. A failed mechanism does not stop the others.
/// Returns `true` if all of them succeeded.
pub fn run_all<F>(config: &BenchConfig, mut report: F) -> bool
where
    F: FnMut(Mechanism, Result<Measurement>),
{
    let mut ok = true;
    for mechanism in Mechanism::ALL {
        let result = run_mechanism(mechanism, config);
        if let Err(err) = &result {
            log::error!("{} benchmark failed: {}", mechanism, err);
            ok = false;
        }
        report(mechanism, result);
    }
    ok
}

/// Forks a consumer, times the producer's side of the transfer up to and
/// including reaping the consumer.
pub fn measure<T: Transport>(transport: &mut T, config: &BenchConfig) -> Result<Measurement> {
    let size = config.message_size.get();
    let ready = Semaphore::new(0)?;
    // Allocated before the fork so the child never touches the allocator.
    let mut received = message::alloc(size)?;

    match unsafe { fork() }.during("fork")? {
        ForkResult::Child => {
            let code = consume(transport, &ready, &mut received, config.verify);
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => {
            let start = match config
                .clock
                .now()
                .and_then(|start| transport.produce(&ready).map(|()| start))
            {
                Ok(start) => start,
                Err(err) => {
                    abort(child);
                    return Err(err);
                }
            };
            let status = reap(child);
            let end = config.clock.now()?;
            status?;
            Ok(Measurement::new(transport.mechanism(), size, start, end))
        }
    }
}

fn consume<T: Transport>(
    transport: &mut T,
    ready: &Semaphore,
    buf: &mut [u8],
    verify: bool,
) -> i32 {
    if ready.wait().is_err() {
        return EXIT_IO;
    }
    if transport.consume(buf).is_err() {
        return EXIT_IO;
    }
    if verify && !message::is_intact(buf) {
        return EXIT_CORRUPT;
    }
    black_box(buf);
    0
}

/// Waits for `child` to terminate and maps its status.
fn reap(child: Pid) -> Result<()> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, 0)) => return Ok(()),
            Ok(WaitStatus::Exited(_, EXIT_CORRUPT)) => {
                return Err(Error::new(ErrorKind::CorruptMessage))
            }
            Ok(WaitStatus::Exited(_, code)) => {
                return Err(Error::new(ErrorKind::ChildExited(code)))
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Err(Error::new(ErrorKind::ChildSignaled(signal)))
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno).during("waitpid"),
        }
    }
}

/// The producer failed, so the child may be blocked forever.
fn abort(child: Pid) {
    if let Err(err) = kill(child, Signal::SIGKILL) {
        log::warn!("failed to kill consumer {}: {}", child, err);
    }
    let _ = reap(child);
}
