//! Rest timer - countdown between sets
//!
//! The state machine is synchronous and clock-free; [`driver::TimerDriver`]
//! feeds it one tick per second and fires the completion effects.

pub mod driver;
pub mod effects;

use std::fmt;

pub use driver::TimerDriver;
pub use effects::{AudioOutcome, CompletionReport, EffectOutcome, dispatch_completion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimerState::Idle => "ready",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running
    Ignored,
    Ticked { remaining: u32 },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestTimer {
    duration: u32,
    remaining: u32,
    running: bool,
}

impl RestTimer {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> TimerState {
        if self.running {
            TimerState::Running
        } else if self.remaining == self.duration {
            TimerState::Idle
        } else if self.remaining == 0 {
            TimerState::Completed
        } else {
            TimerState::Paused
        }
    }

    /// New duration; also the new remaining time. Bounds are the caller's job.
    pub fn configure(&mut self, seconds: u32) {
        self.duration = seconds;
        self.remaining = seconds;
        self.running = false;
    }

    /// Restart from the full duration
    pub fn start(&mut self) {
        if self.duration == 0 {
            return;
        }
        self.remaining = self.duration;
        self.running = true;
    }

    pub fn pause(&mut self) {
        if self.state() == TimerState::Running {
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if self.state() == TimerState::Paused {
            self.running = true;
        }
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.duration;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Completed
        } else {
            TickOutcome::Ticked {
                remaining: self.remaining,
            }
        }
    }

    /// Percentage elapsed, 0..=100
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        let elapsed = self.duration.saturating_sub(self.remaining) as f64;
        (elapsed / self.duration as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Remaining time as MM:SS
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REST_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_run_is_monotonic() {
        for duration in [1u32, 2, 10, 90, 600] {
            let mut timer = RestTimer::new(duration);
            assert_eq!(timer.state(), TimerState::Idle);
            assert_eq!(timer.progress(), 0.0);

            timer.start();
            let mut last_remaining = timer.remaining();
            let mut last_progress = timer.progress();
            let mut completions = 0;

            loop {
                match timer.tick() {
                    TickOutcome::Ticked { remaining } => {
                        assert_eq!(remaining, last_remaining - 1);
                    }
                    TickOutcome::Completed => {
                        completions += 1;
                        break;
                    }
                    TickOutcome::Ignored => panic!("running timer ignored a tick"),
                }
                assert!(timer.progress() >= last_progress);
                last_remaining = timer.remaining();
                last_progress = timer.progress();
            }

            assert_eq!(completions, 1);
            assert_eq!(timer.remaining(), 0);
            assert_eq!(timer.progress(), 100.0);
            assert_eq!(timer.state(), TimerState::Completed);
            assert_eq!(timer.tick(), TickOutcome::Ignored);
        }
    }

    #[test]
    fn test_pause_resume_preserves_remaining() {
        let mut timer = RestTimer::new(30);
        timer.start();
        timer.tick();
        timer.tick();

        timer.pause();
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.tick(), TickOutcome::Ignored);
        assert_eq!(timer.remaining(), 28);

        timer.resume();
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining(), 28);
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut idle = RestTimer::new(45);
        let mut running = RestTimer::new(45);
        running.start();
        running.tick();
        let mut paused = running.clone();
        paused.pause();
        let mut done = RestTimer::new(2);
        done.start();
        done.tick();
        done.tick();
        assert_eq!(done.state(), TimerState::Completed);

        for timer in [&mut idle, &mut running, &mut paused, &mut done] {
            timer.reset();
            assert_eq!(timer.remaining(), timer.duration());
            assert!(!timer.is_running());
            assert_eq!(timer.state(), TimerState::Idle);
        }
    }

    #[test]
    fn test_configure_sets_both() {
        let mut timer = RestTimer::new(90);
        timer.start();
        timer.configure(120);
        assert_eq!(timer.duration(), 120);
        assert_eq!(timer.remaining(), 120);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn test_start_restarts_from_duration() {
        let mut timer = RestTimer::new(10);
        timer.start();
        timer.tick();
        timer.pause();
        timer.start();
        assert_eq!(timer.remaining(), 10);
        assert!(timer.is_running());
    }

    #[test]
    fn test_zero_duration() {
        let mut timer = RestTimer::new(0);
        timer.start();
        assert!(!timer.is_running());
        assert_eq!(timer.progress(), 0.0);
        timer.resume();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_resume_only_from_paused() {
        let mut timer = RestTimer::new(10);
        timer.resume();
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn test_display() {
        let mut timer = RestTimer::new(90);
        assert_eq!(timer.display(), "01:30");
        timer.configure(5);
        assert_eq!(timer.display(), "00:05");
    }
}
