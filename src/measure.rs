use std::fmt::{self, Display};
use std::time::Duration;

use nix::time::{clock_gettime, ClockId};

use crate::error::{During, Result};
use crate::transport::Mechanism;

const MIB: f64 = 1024.0 * 1024.0;

/// Clock used to time the producer's critical section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// `CLOCK_MONOTONIC` wall time.
    #[default]
    Monotonic,
    /// CPU time consumed by the producer process only.
    ProcessCpu,
}

impl Clock {
    pub fn now(self) -> Result<Duration> {
        let id = match self {
            Clock::Monotonic => ClockId::CLOCK_MONOTONIC,
            Clock::ProcessCpu => ClockId::CLOCK_PROCESS_CPUTIME_ID,
        };
        let ts = clock_gettime(id).during("clock_gettime")?;
        Ok(Duration::from(ts))
    }
}

/// One timing sample for one mechanism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub mechanism: Mechanism,
    pub bytes: usize,
    pub elapsed: Duration,
}

impl Measurement {
    pub fn new(mechanism: Mechanism, bytes: usize, start: Duration, end: Duration) -> Self {
        Measurement {
            mechanism,
            bytes,
            elapsed: end.saturating_sub(start),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Throughput in MiB per second. Infinite if the clock did not tick.
    pub fn throughput(&self) -> f64 {
        let ms = self.elapsed_ms();
        if ms == 0.0 {
            return f64::INFINITY;
        }
        self.bytes as f64 / ms * 1000.0 / MIB
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.mechanism.label();
        writeln!(f, "{}: Elapsed time = {:.5} ms", label, self.elapsed_ms())?;
        write!(f, "{}: Throughput = {:.2} MB/s", label, self.throughput())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_mib_per_second() {
        let m = Measurement::new(
            Mechanism::Mmap,
            1024 * 1024,
            Duration::from_millis(10),
            Duration::from_millis(1010),
        );
        assert_eq!(m.elapsed_ms(), 1000.0);
        assert!((m.throughput() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_is_infinite_throughput() {
        let t = Duration::from_millis(5);
        let m = Measurement::new(Mechanism::File, 1024, t, t);
        assert!(m.throughput().is_infinite());
    }

    #[test]
    fn report_uses_one_unit_for_every_mechanism() {
        for mechanism in Mechanism::ALL {
            let m = Measurement::new(mechanism, 2048, Duration::ZERO, Duration::from_millis(2));
            let report = m.to_string();
            let lines: Vec<&str> = report.lines().collect();
            assert_eq!(lines.len(), 2);
            assert_eq!(
                lines[0],
                format!("{}: Elapsed time = 2.00000 ms", mechanism.label())
            );
            assert!(lines[1].ends_with(" MB/s"), "{}", lines[1]);
        }
    }

    #[test]
    fn clocks_move_forward() {
        for clock in [Clock::Monotonic, Clock::ProcessCpu] {
            let a = clock.now().unwrap();
            let b = clock.now().unwrap();
            assert!(b >= a);
        }
    }
}
