//! Rate limiting for wide-channel snapshots.

use std::time::{Duration, Instant};

/// At most one snapshot per ~33ms (30 fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThrottleState {
    Idle,
    Pending { due: Instant, redundant: bool },
}

/// A single-slot debouncer.
///
/// The first request schedules a send; later requests are folded into it
/// until it fires. Redundant requests fire immediately and ask for the
/// snapshot to be sent twice.
#[derive(Debug)]
pub struct FrameThrottle {
    interval: Duration,
    state: ThrottleState,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ThrottleState::Idle,
        }
    }

    /// Ask for a snapshot. Returns true if this request scheduled a new send.
    pub fn request(&mut self, now: Instant, redundant: bool) -> bool {
        match self.state {
            ThrottleState::Idle => {
                let due = if redundant { now } else { now + self.interval };
                self.state = ThrottleState::Pending { due, redundant };
                true
            }
            ThrottleState::Pending {
                redundant: ref mut pending,
                ..
            } => {
                *pending |= redundant;
                false
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ThrottleState::Idle => None,
            ThrottleState::Pending { due, .. } => Some(due),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state != ThrottleState::Idle
    }

    /// Fire the pending send if it is due. Returns how many copies to send.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        match self.state {
            ThrottleState::Pending { due, redundant } if now >= due => {
                self.state = ThrottleState::Idle;
                Some(if redundant { 2 } else { 1 })
            }
            _ => None,
        }
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_request_waits_one_interval() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::default();
        assert!(throttle.request(start, false));
        assert_eq!(throttle.poll(start + Duration::from_millis(10)), None);
        assert_eq!(throttle.poll(start + FRAME_INTERVAL), Some(1));
        assert!(!throttle.is_pending());
    }

    #[test]
    fn requests_inside_window_coalesce() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::default();
        assert!(throttle.request(start, false));
        for ms in 1..30 {
            assert!(!throttle.request(start + Duration::from_millis(ms), false));
        }
        assert_eq!(throttle.deadline(), Some(start + FRAME_INTERVAL));
        assert_eq!(throttle.poll(start + FRAME_INTERVAL), Some(1));
        assert_eq!(throttle.poll(start + FRAME_INTERVAL * 2), None);
    }

    #[test]
    fn redundant_request_fires_immediately_twice() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::default();
        throttle.request(start, true);
        assert_eq!(throttle.poll(start), Some(2));
    }

    #[test]
    fn redundant_request_upgrades_pending_send() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::default();
        throttle.request(start, false);
        throttle.request(start + Duration::from_millis(5), true);
        // Timing is kept, copies are doubled
        assert_eq!(throttle.poll(start + Duration::from_millis(5)), None);
        assert_eq!(throttle.poll(start + FRAME_INTERVAL), Some(2));
    }
}
