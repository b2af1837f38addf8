//! Tokio driver for the rest timer

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

use super::effects::dispatch_completion;
use super::{RestTimer, TickOutcome};
use crate::caps::CapabilityProvider;

const TICK: Duration = Duration::from_secs(1);

/// Runs a ticker task only while the timer is running.
/// Every state change is published on a watch channel.
pub struct TimerDriver {
    timer: Arc<watch::Sender<RestTimer>>,
    caps: Arc<dyn CapabilityProvider>,
    ticker: Option<JoinHandle<()>>,
}

impl TimerDriver {
    pub fn new(duration: u32, caps: Arc<dyn CapabilityProvider>) -> Self {
        if !caps.request_notification_permission() {
            debug!("Notifications not permitted; rest timer will skip them");
        }
        let (timer, _) = watch::channel(RestTimer::new(duration));
        Self {
            timer: Arc::new(timer),
            caps,
            ticker: None,
        }
    }

    pub fn snapshot(&self) -> RestTimer {
        self.timer.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RestTimer> {
        self.timer.subscribe()
    }

    pub fn configure(&mut self, seconds: u32) {
        self.stop_ticker();
        self.timer.send_modify(|t| t.configure(seconds));
    }

    pub fn start(&mut self) {
        self.stop_ticker();
        self.timer.send_modify(|t| t.start());
        self.ensure_ticker();
    }

    pub fn pause(&mut self) {
        self.stop_ticker();
        self.timer.send_modify(|t| t.pause());
    }

    pub fn resume(&mut self) {
        self.timer.send_modify(|t| t.resume());
        self.ensure_ticker();
    }

    pub fn reset(&mut self) {
        self.stop_ticker();
        self.timer.send_modify(|t| t.reset());
    }

    /// Pause when running, resume when paused, start otherwise
    pub fn toggle(&mut self) {
        use super::TimerState;
        match self.snapshot().state() {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            TimerState::Idle | TimerState::Completed => self.start(),
        }
    }

    fn ensure_ticker(&mut self) {
        let running = self.timer.borrow().is_running();
        let alive = self.ticker.as_ref().is_some_and(|t| !t.is_finished());
        if running && !alive {
            self.ticker = Some(tokio::spawn(tick_loop(self.timer.clone(), self.caps.clone())));
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

async fn tick_loop(timer: Arc<watch::Sender<RestTimer>>, caps: Arc<dyn CapabilityProvider>) {
    let mut interval = interval_at(Instant::now() + TICK, TICK);
    loop {
        interval.tick().await;

        let mut outcome = TickOutcome::Ignored;
        timer.send_modify(|t| outcome = t.tick());

        match outcome {
            TickOutcome::Ticked { .. } => continue,
            TickOutcome::Completed => {
                info!("Rest timer complete");
                // notify-rust and process spawning block briefly
                let report = tokio::task::spawn_blocking(move || dispatch_completion(caps.as_ref())).await;
                debug!("Completion effects: {:?}", report);
                break;
            }
            TickOutcome::Ignored => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::testing::Recorder;
    use crate::timer::TimerState;

    #[tokio::test]
    async fn test_driver_runs_to_completion() {
        let caps = Arc::new(Recorder::new());
        let mut driver = TimerDriver::new(1, caps.clone());
        let mut rx = driver.subscribe();

        driver.start();
        assert_eq!(driver.snapshot().state(), TimerState::Running);

        tokio::time::timeout(Duration::from_secs(5), async {
            while rx.borrow_and_update().state() != TimerState::Completed {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        // Give the blocking effect task a moment
        for _ in 0..50 {
            if !caps.toast_messages().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(caps.toast_messages(), vec!["Rest complete! 💪"]);
    }

    #[tokio::test]
    async fn test_pause_stops_ticking() {
        let caps = Arc::new(Recorder::new());
        let mut driver = TimerDriver::new(30, caps);

        driver.start();
        driver.pause();
        tokio::time::sleep(Duration::from_millis(1200)).await;

        let snap = driver.snapshot();
        assert_eq!(snap.remaining(), 30);
        assert!(!snap.is_running());

        // Paused before the first tick is indistinguishable from idle, so toggle starts
        driver.toggle();
        assert!(driver.snapshot().is_running());
        driver.reset();
        assert_eq!(driver.snapshot().state(), TimerState::Idle);
    }
}
