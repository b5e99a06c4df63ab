//! Latency and throughput measurement.
//!
//! Both monitors sample into a [`SampleBuffer`], so collection is O(1)
//! and lock-free on the hot path while measurement pays O(n) only when
//! somebody asks. Latency is recorded through an explicit timer token:
//!
//! ```
//! use filequeue::monitor::LatencyMonitor;
//!
//! let monitor = LatencyMonitor::new(128);
//!
//! let timer = monitor.start_timer();
//! // ... the operation being measured ...
//! timer.stop();
//!
//! let average = monitor.average();
//! # let _ = average;
//! ```

use std::time::{Duration, Instant};

use crate::sync::SampleBuffer;

/// A rolling average-latency measurement.
pub struct LatencyMonitor {
    samples: SampleBuffer<u64>,
}

impl LatencyMonitor {
    /// Create a monitor keeping the most recent `sample_size` latency
    /// samples. The sample size trades memory for measurement
    /// stability.
    ///
    /// # Panics
    ///
    /// Panics if `sample_size` is zero.
    pub fn new(sample_size: usize) -> Self {
        Self {
            samples: SampleBuffer::new(sample_size),
        }
    }

    /// Start a timer for one operation. Stopping the timer records its
    /// elapsed time into this monitor.
    pub fn start_timer(&self) -> Timer<'_> {
        Timer {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// The mean duration over the current sample window, or `None` if
    /// nothing has been recorded yet.
    pub fn average(&self) -> Option<Duration> {
        let snapshot = self.samples.snapshot();

        if snapshot.is_empty() {
            return None;
        }

        let total: u64 = snapshot.iter().sum();

        Some(Duration::from_nanos(total / snapshot.len() as u64))
    }

    fn record(&self, elapsed: Duration) {
        self.samples.add(elapsed.as_nanos() as u64);
    }
}

/// A running measurement of a single operation.
///
/// The timer borrows its monitor, so it cannot outlive it, and
/// [`stop`](Timer::stop) consumes the timer, so a measurement cannot be
/// recorded twice.
#[must_use = "a timer that is never stopped records nothing"]
pub struct Timer<'a> {
    monitor: &'a LatencyMonitor,
    start: Instant,
}

impl Timer<'_> {
    /// Stop the timer, record the measurement, and return it.
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        self.monitor.record(elapsed);
        elapsed
    }
}

/// A rolling events-per-second measurement.
///
/// Each call to [`count`](ThroughputMonitor::count) stamps a monotonic
/// timestamp into the sample ring; the rate is derived from the span of
/// the sampled window.
pub struct ThroughputMonitor {
    samples: SampleBuffer<u64>,
    origin: Instant,
}

impl ThroughputMonitor {
    /// Create a monitor deriving its rate from the most recent
    /// `sample_size` events.
    ///
    /// # Panics
    ///
    /// Panics if `sample_size` is zero.
    pub fn new(sample_size: usize) -> Self {
        Self {
            samples: SampleBuffer::new(sample_size),
            origin: Instant::now(),
        }
    }

    /// Count one event.
    pub fn count(&self) {
        self.samples.add(self.origin.elapsed().as_nanos() as u64);
    }

    /// Events per second over the sampled window, or `None` until at
    /// least two events spanning a measurable interval were counted.
    pub fn rate_per_sec(&self) -> Option<f64> {
        let snapshot = self.samples.snapshot();

        let (first, last) = match (snapshot.first(), snapshot.last()) {
            (Some(first), Some(last)) if last > first => (*first, *last),
            _ => return None,
        };

        let span_secs = Duration::from_nanos(last - first).as_secs_f64();

        Some((snapshot.len() - 1) as f64 / span_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn unused_monitor_has_no_average() {
        let monitor = LatencyMonitor::new(16);
        assert_eq!(monitor.average(), None);
    }

    #[test]
    fn timer_records_elapsed_time() {
        let monitor = LatencyMonitor::new(16);

        let timer = monitor.start_timer();
        thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        assert!(elapsed >= Duration::from_millis(10));

        let average = monitor.average().unwrap();
        assert!(average >= Duration::from_millis(10));
        assert!(average <= elapsed);
    }

    #[test]
    fn average_spans_the_sample_window() {
        let monitor = LatencyMonitor::new(4);

        for _ in 0..8 {
            monitor.start_timer().stop();
        }

        // Eight quick timers through a four-slot window still average.
        assert!(monitor.average().is_some());
    }

    #[test]
    fn throughput_needs_a_window() {
        let monitor = ThroughputMonitor::new(16);

        assert_eq!(monitor.rate_per_sec(), None);
        monitor.count();
        assert_eq!(monitor.rate_per_sec(), None);
    }

    #[test]
    fn throughput_rate_is_plausible() {
        let monitor = ThroughputMonitor::new(16);

        for _ in 0..10 {
            monitor.count();
            thread::sleep(Duration::from_millis(5));
        }

        let rate = monitor.rate_per_sec().unwrap();

        // Ten events at ~5ms spacing is on the order of 200/sec.
        assert!(rate > 20.0, "rate unexpectedly low: {rate}");
        assert!(rate < 2_000.0, "rate unexpectedly high: {rate}");
    }
}
