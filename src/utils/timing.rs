use std::time::{Duration, Instant};
use log::{debug, info};

/// Running total of a repeated measurement, e.g. per-grid analysis time in a batch
#[derive(Debug, Clone)]
pub struct TimingStats {
    pub name: String,
    pub total_time: Duration,
    pub count: u32,
}

impl TimingStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_time: Duration::from_secs(0),
            count: 0,
        }
    }

    pub fn add_measurement(&mut self, duration: Duration) {
        self.total_time += duration;
        self.count += 1;

        debug!("{} - Current: {:.2}ms, Avg: {:.2}ms, Count: {}",
            self.name,
            duration.as_secs_f64() * 1000.0,
            self.average_ms(),
            self.count
        );
    }

    pub fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_time.as_secs_f64() * 1000.0) / self.count as f64
        }
    }

    pub fn log_summary(&self) {
        info!("{} - Total: {:.2}ms over {} runs, Avg: {:.2}ms",
            self.name,
            self.total_time.as_secs_f64() * 1000.0,
            self.count,
            self.average_ms()
        );
    }
}

/// Logs the elapsed time of a pipeline stage when dropped
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        debug!("{} took {:.2}ms", self.stage, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let mut stats = TimingStats::new("analysis");
        assert_eq!(stats.average_ms(), 0.0);
        stats.add_measurement(Duration::from_millis(10));
        stats.add_measurement(Duration::from_millis(30));
        assert_eq!(stats.count, 2);
        assert!((stats.average_ms() - 20.0).abs() < 1e-9);
    }
}
