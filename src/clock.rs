/*!
    Host-tick to item-time mapping.
*/

use std::time::{Duration, Instant};

/**
    Maps host instants to item time for the playback loop.

    The pump's tick driver fires on the host refresh interval and passes the
    host instant in; the clock converts it to the item-relative time the due
    frame should represent. Instants are explicit (rather than sampled
    internally) so ticks are deterministic under test.

    Starts paused at position zero.
*/
#[derive(Clone, Copy, Debug)]
pub struct PlaybackClock {
    /// Host instant corresponding to `base`.
    origin: Instant,
    /// Item time at `origin`.
    base: Duration,
    paused: bool,
}

impl PlaybackClock {
    /**
        Create a new clock, paused at item time zero.
    */
    pub fn new(now: Instant) -> Self {
        Self {
            origin: now,
            base: Duration::ZERO,
            paused: true,
        }
    }

    /**
        Item time corresponding to the given host instant.

        While paused, always returns the position at pause time. Instants
        earlier than the clock origin clamp to the origin position.
    */
    pub fn position_at(&self, now: Instant) -> Duration {
        if self.paused {
            self.base
        } else {
            self.base + now.checked_duration_since(self.origin).unwrap_or_default()
        }
    }

    /**
        Pause the clock, freezing the position. Idempotent.
    */
    pub fn pause(&mut self, now: Instant) {
        if !self.paused {
            self.base = self.position_at(now);
            self.paused = true;
        }
    }

    /**
        Resume the clock from its frozen position. Idempotent.
    */
    pub fn resume(&mut self, now: Instant) {
        if self.paused {
            self.origin = now;
            self.paused = false;
        }
    }

    /**
        Jump to an arbitrary item time (after seeking). Pause state is
        preserved.
    */
    pub fn reset_to(&mut self, now: Instant, position: Duration) {
        self.origin = now;
        self.base = position;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_paused_at_zero() {
        let now = Instant::now();
        let clock = PlaybackClock::new(now);
        assert!(clock.is_paused());
        assert_eq!(clock.position_at(now + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn advances_while_running() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.resume(now);
        assert_eq!(
            clock.position_at(now + Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn pause_freezes_position() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.resume(now);
        clock.pause(now + Duration::from_secs(2));
        assert_eq!(
            clock.position_at(now + Duration::from_secs(10)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn resume_continues_from_frozen_position() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.resume(now);
        clock.pause(now + Duration::from_secs(2));
        clock.resume(now + Duration::from_secs(100));
        assert_eq!(
            clock.position_at(now + Duration::from_secs(101)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.resume(now);
        clock.resume(now + Duration::from_secs(1));
        assert_eq!(
            clock.position_at(now + Duration::from_secs(2)),
            Duration::from_secs(2)
        );

        clock.pause(now + Duration::from_secs(2));
        clock.pause(now + Duration::from_secs(5));
        assert_eq!(
            clock.position_at(now + Duration::from_secs(9)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn reset_jumps_to_position() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.resume(now);
        clock.reset_to(now + Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(
            clock.position_at(now + Duration::from_secs(3)),
            Duration::from_secs(32)
        );
    }

    #[test]
    fn reset_preserves_pause_state() {
        let now = Instant::now();
        let mut clock = PlaybackClock::new(now);
        clock.reset_to(now, Duration::from_secs(7));
        assert!(clock.is_paused());
        assert_eq!(
            clock.position_at(now + Duration::from_secs(1)),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn instants_before_origin_clamp() {
        let now = Instant::now();
        let later = now + Duration::from_secs(10);
        let mut clock = PlaybackClock::new(later);
        clock.resume(later);
        assert_eq!(clock.position_at(now), Duration::ZERO);
    }
}
