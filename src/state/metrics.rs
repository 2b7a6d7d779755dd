// Load-time metrics.
// Times a selection from the start of loading until its data settles.

use std::time::{Duration, Instant};

/// Stopwatch for one strategy's detail loads.
#[derive(Debug, Clone, Default)]
pub struct LoadTimer {
    started: Option<Instant>,
    last: Option<Duration>,
}

impl LoadTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop the running measurement, if any, and record it.
    pub fn finish(&mut self) -> Option<Duration> {
        let elapsed = self.started.take()?.elapsed();
        self.last = Some(elapsed);
        Some(elapsed)
    }

    /// Forget everything (post closed).
    pub fn reset(&mut self) {
        self.started = None;
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    /// Last load time in milliseconds, zero when nothing was measured.
    pub fn last_ms(&self) -> f64 {
        self.last().map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0)
    }
}
