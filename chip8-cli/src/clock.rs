//! Frame clock.
use std::{
    thread,
    time::{Duration, Instant},
};

use chip8::Hz;

/// Timer to synchronize the driver thread with the 60Hz frame rate
/// of the virtual machine's timers.
///
/// Time spent running instructions inside a frame counts towards
/// the frame, so only the remainder is waited out.
pub struct Clock {
    last: Instant,
    period: Duration,
}

impl Clock {
    pub fn new(freq: Hz) -> Self {
        Self {
            last: Instant::now(),
            period: freq.into(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = Instant::now()
    }

    /// Block the current thread until the next frame.
    pub fn wait(&mut self) {
        loop {
            if self.last.elapsed() < self.period {
                // Sleep does not have enough resolution, and causes
                // the clock to run at 30 FPS.
                //
                // Yielding in a loop avoids spinning the CPU at full load.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up
                // on frames lost to a stalled host.
                self.reset();
                return;
            }
        }
    }
}
