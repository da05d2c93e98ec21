//! Delay and sound timers.

/// The two 60Hz countdown timers.
///
/// Both count down to zero and stop there. They are ticked by the
/// caller at a fixed cadence, independent of how many instructions
/// are executed in between.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Timers {
    /// (DT) Delay timer that counts down to 0.
    pub delay: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Default::default()
    }

    /// Count down both timers by one step.
    ///
    /// Returns whether the buzzer should sound during this tick, which is
    /// the case when the sound timer was running before it was decremented.
    #[inline]
    pub fn tick(&mut self) -> bool {
        let buzz = self.sound > 0;
        self.sound = self.sound.saturating_sub(1);
        self.delay = self.delay.saturating_sub(1);
        buzz
    }

    /// Whether the buzzer is currently on.
    #[inline]
    pub fn is_buzzing(&self) -> bool {
        self.sound > 0
    }
}
