//! Frame Clock
//!
//! Turns frame timing into the whole-millisecond `dt` each tick takes.
//! Fractions of a millisecond are carried forward instead of dropped, so
//! the simulation clock never falls behind the time actually elapsed.

use std::time::Duration;

/// Accumulates elapsed time and hands it out in whole milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
    /// Total time fed in
    elapsed: Duration,
    /// Total milliseconds handed out so far
    reported_ms: u64,
}

impl FrameClock {
    /// Clock at zero.
    pub const fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            reported_ms: 0,
        }
    }

    /// Feed one frame's measured duration; returns the `dt` to tick with.
    ///
    /// The sum of every returned `dt` is the total elapsed time floored to
    /// the millisecond.
    pub fn advance(&mut self, frame: Duration) -> u64 {
        self.elapsed = self.elapsed.saturating_add(frame);
        let total_ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX);
        let dt_ms = total_ms.saturating_sub(self.reported_ms);
        self.reported_ms = total_ms;
        dt_ms
    }

    /// Total milliseconds handed out.
    #[inline]
    pub fn reported_ms(&self) -> u64 {
        self.reported_ms
    }
}

/// `dt` of frame `frame_index` (0-based) on a fixed-rate clock.
///
/// Derived from the cumulative `frame * 1000 / tick_rate`, so after `n`
/// frames the clock reads exactly `n * 1000 / tick_rate` (floored).
pub fn fixed_step_ms(frame_index: u64, tick_rate: u32) -> u64 {
    let rate = u64::from(tick_rate.max(1));
    let at = |frame: u64| frame.saturating_mul(1000) / rate;
    at(frame_index.saturating_add(1)) - at(frame_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_sums_to_a_second() {
        let total: u64 = (0..60).map(|frame| fixed_step_ms(frame, 60)).sum();
        assert_eq!(total, 1000);

        // Steps alternate between 16 and 17 ms
        let steps: Vec<u64> = (0..3).map(|frame| fixed_step_ms(frame, 60)).collect();
        assert_eq!(steps, vec![16, 17, 17]);
    }

    #[test]
    fn test_fixed_step_zero_rate() {
        assert_eq!(fixed_step_ms(0, 0), 1000);
    }

    #[test]
    fn test_measured_frames_carry_remainder() {
        let mut clock = FrameClock::new();
        let frame = Duration::from_micros(1_000_000 / 60);

        let total: u64 = (0..60).map(|_| clock.advance(frame)).sum();
        // 60 x 16.666 ms = 999.96 ms
        assert_eq!(total, 999);
        assert_eq!(clock.reported_ms(), 999);

        let more: u64 = (0..60).map(|_| clock.advance(frame)).sum();
        assert_eq!(total + more, 1999);
    }

    #[test]
    fn test_sub_millisecond_frames_accumulate() {
        let mut clock = FrameClock::new();
        let steps: Vec<u64> = (0..4).map(|_| clock.advance(Duration::from_micros(400))).collect();
        assert_eq!(steps, vec![0, 0, 1, 0]);
    }
}
