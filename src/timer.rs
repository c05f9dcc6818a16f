//! Wall-clock timing of conversion runs.

use std::time::{Duration, Instant};

/// An accumulating stopwatch.
///
/// Each `start()`/`stop()` pair adds the time between them to the total. Calling `start()` on a
/// running stopwatch restarts the current lap; calling `stop()` on a stopped one does nothing.
#[derive(Debug, Default, Clone)]
pub struct Stopwatch {
    started: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Creates a stopped stopwatch with nothing accumulated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a lap.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Ends the current lap, adding it to the total.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Returns `true` while a lap is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Total time accumulated over completed laps.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total time accumulated over completed laps, in whole microseconds.
    #[inline]
    pub fn elapsed_micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_accumulates() {
        let mut watch = Stopwatch::new();
        assert_eq!(watch.elapsed_micros(), 0);
        assert!(!watch.is_running());

        watch.start();
        assert!(watch.is_running());
        std::thread::sleep(Duration::from_millis(2));
        watch.stop();
        let first = watch.elapsed();
        assert!(first >= Duration::from_millis(2));

        watch.start();
        std::thread::sleep(Duration::from_millis(2));
        watch.stop();
        assert!(watch.elapsed() >= first + Duration::from_millis(2));
    }

    #[test]
    fn test_stop_without_start() {
        let mut watch = Stopwatch::new();
        watch.stop();
        assert_eq!(watch.elapsed(), Duration::ZERO);
    }
}
