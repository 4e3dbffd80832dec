// Procstat -- per-process telemetry agent for Linux
// Copyright (C) 2026  Procstat authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::thread::sleep;
use std::time::{Duration, Instant};

/// Granularity at which an interruptible sleep re-checks its condition.
const POLL_DELAY: Duration = Duration::from_millis(250);

/// Timer that expires at constant intervals.
///
/// The stop watch records when the timer was started. It is used to correct
/// the remaining time, so a slow cycle does not shift later ticks.
pub struct Timer {
    delay: Duration,
    stop_watch: Instant,
    remaining: Option<Duration>,
}

impl Timer {
    /// Create a new timer, already expired if the second parameter is true.
    pub fn new(delay: Duration, expired: bool) -> Timer {
        Timer {
            delay,
            stop_watch: Instant::now(),
            remaining: if expired { None } else { Some(delay) },
        }
    }

    /// Reset the timer.
    ///
    /// The new reference is not the current time but the last time the timer
    /// actually expired.
    pub fn reset(&mut self) {
        self.remaining = Some(self.delay);
    }

    /// Return the remaining time or None if the timer has expired.
    pub fn remaining(&mut self) -> Option<Duration> {
        if let Some(remaining) = self.remaining {
            let elapsed = self.stop_watch.elapsed();
            let now = Instant::now();
            match remaining.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => {
                    self.remaining = Some(remaining);
                    self.stop_watch = now;
                }
                _ => {
                    self.remaining = None;
                    // The timer reference is exactly when it expired.
                    self.stop_watch = elapsed
                        .checked_sub(remaining)
                        .and_then(|overshoot| now.checked_sub(overshoot))
                        .unwrap_or(now);
                }
            }
        }
        self.remaining
    }

    /// Sleep until the timer expires or the condition becomes true.
    ///
    /// The condition is re-checked at sub-second granularity so a shutdown
    /// request never waits out the full interval. Returns false when
    /// interrupted.
    pub fn sleep_unless<F>(&mut self, condition: F) -> bool
    where
        F: Fn() -> bool,
    {
        while let Some(remaining) = self.remaining() {
            if condition() {
                return false;
            }
            sleep(remaining.min(POLL_DELAY));
        }
        !condition()
    }
}

#[cfg(test)]
mod tests {

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    use super::Timer;

    fn new_in_the_past(delay: Duration, past_offset: Duration) -> Timer {
        Timer {
            delay,
            stop_watch: Instant::now().checked_sub(past_offset).unwrap(),
            remaining: Some(delay),
        }
    }

    #[test]
    fn remaining_decreases() {
        let delay = Duration::new(1, 0);
        let mut timer = Timer::new(delay, false);
        sleep(Duration::from_millis(2));
        let remaining = timer.remaining().unwrap();
        assert!(remaining < delay);
    }

    #[test]
    fn expired_on_creation() {
        let mut timer1 = Timer::new(Duration::new(60, 0), false);
        assert!(timer1.remaining().is_some());
        let mut timer2 = Timer::new(Duration::new(60, 0), true);
        assert!(timer2.remaining().is_none());
    }

    #[test]
    fn elapsed_timer_expires() {
        let delay = Duration::new(60, 0);
        let mut timer = new_in_the_past(delay, delay);
        assert!(timer.remaining().is_none());
    }

    #[test]
    fn reset_rearms() {
        let mut timer = Timer::new(Duration::new(60, 0), true);
        assert!(timer.remaining().is_none());
        timer.reset();
        assert!(timer.remaining().is_some());
    }

    #[test]
    fn sleep_completes_short_interval() {
        let mut timer = Timer::new(Duration::from_millis(5), false);
        assert!(timer.sleep_unless(|| false));
        assert!(timer.remaining().is_none());
    }

    #[test]
    fn sleep_is_interrupted_without_waiting() {
        let mut timer = Timer::new(Duration::new(3600, 0), false);
        let polls = AtomicUsize::new(0);
        let start = Instant::now();
        let completed = timer.sleep_unless(|| {
            polls.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert!(!completed);
        assert!(start.elapsed() < Duration::new(1, 0));
        assert_eq!(1, polls.load(Ordering::SeqCst));
    }
}
