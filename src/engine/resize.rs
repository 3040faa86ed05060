// Resize debouncing.
//
// Window managers emit a burst of resize events while the user drags a
// border. Rebuilding the scene on each one would reseed every star and ship
// dozens of times a second, so the host records the latest size and only
// rebuilds once the size has been stable for `RESIZE_QUIET_PERIOD`.

use std::time::{Duration, Instant};

use super::canvas::CanvasSize;

pub const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet: Duration,
    pending: Option<(CanvasSize, Instant)>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET_PERIOD)
    }
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Record a resize. Restarts the quiet period.
    pub fn notify(&mut self, size: CanvasSize, now: Instant) {
        self.pending = Some((size, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled size, once nothing has changed for the quiet period.
    /// Returns it exactly once per burst.
    pub fn poll(&mut self, now: Instant) -> Option<CanvasSize> {
        let (size, at) = self.pending?;
        if now.saturating_duration_since(at) < self.quiet {
            return None;
        }
        self.pending = None;
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_size() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        for i in 0..10u64 {
            let at = start + Duration::from_millis(i * 20);
            debouncer.notify(CanvasSize::new(800.0 + i as f32, 600.0), at);
            assert_eq!(debouncer.poll(at), None);
        }
        let last = start + Duration::from_millis(180);
        assert_eq!(debouncer.poll(last + Duration::from_millis(99)), None);
        assert_eq!(
            debouncer.poll(last + Duration::from_millis(100)),
            Some(CanvasSize::new(809.0, 600.0))
        );
        assert_eq!(debouncer.poll(last + Duration::from_secs(5)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn idle_debouncer_yields_nothing() {
        let mut debouncer = ResizeDebouncer::new(Duration::ZERO);
        assert_eq!(debouncer.poll(Instant::now()), None);
    }
}
