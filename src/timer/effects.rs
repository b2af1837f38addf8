//! Completion side effects: haptics, OS notification, sound, toast

use std::time::Duration;

use tracing::{debug, warn};

use crate::caps::{Capability, CapabilityProvider, OsNotification, Toast, Tone};

pub const VIBRATION_PATTERN: [u64; 5] = [200, 100, 200, 100, 200];
pub const NOTIFICATION_TAG: &str = "rest-timer";
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);
const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Fired,
    /// Capability absent or not permitted
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioOutcome {
    Cue,
    /// Primary cue failed; the synthesized tone played instead
    Fallback { cue_error: String },
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub vibration: EffectOutcome,
    pub notification: EffectOutcome,
    pub audio: AudioOutcome,
}

pub fn rest_complete_notification() -> OsNotification {
    OsNotification {
        title: "Rest Timer Complete! 💪".to_string(),
        body: "Time to start your next set!".to_string(),
        tag: NOTIFICATION_TAG.to_string(),
        actions: vec![
            ("start".to_string(), "Start Next Set".to_string()),
            ("dismiss".to_string(), "Dismiss".to_string()),
        ],
        auto_dismiss: NOTIFICATION_TIMEOUT,
    }
}

fn run(caps: &dyn CapabilityProvider, capability: Capability, effect: impl FnOnce() -> anyhow::Result<()>) -> EffectOutcome {
    if !caps.has(capability) {
        debug!("{:?} unavailable, skipping", capability);
        return EffectOutcome::Skipped;
    }
    match effect() {
        Ok(()) => EffectOutcome::Fired,
        Err(e) => {
            warn!("{:?} effect failed: {:#}", capability, e);
            EffectOutcome::Failed(e.to_string())
        }
    }
}

fn play_audio(caps: &dyn CapabilityProvider) -> AudioOutcome {
    if !caps.has(Capability::Audio) {
        return AudioOutcome::Skipped;
    }
    let cue_error = match caps.play_cue() {
        Ok(()) => return AudioOutcome::Cue,
        Err(e) => e.to_string(),
    };
    debug!("Audio cue failed ({}), synthesizing tone", cue_error);
    match caps.play_tone(&Tone::beep()) {
        Ok(()) => AudioOutcome::Fallback { cue_error },
        Err(e) => {
            warn!("Audio notification failed: {:#}", e);
            AudioOutcome::Failed(e.to_string())
        }
    }
}

/// Fire every completion effect; each is independent of the others
pub fn dispatch_completion(caps: &dyn CapabilityProvider) -> CompletionReport {
    let vibration = run(caps, Capability::Vibration, || caps.vibrate(&VIBRATION_PATTERN));
    let notification = run(caps, Capability::Notification, || caps.notify(&rest_complete_notification()));
    let audio = play_audio(caps);

    caps.toast(
        Toast::success("Rest complete! 💪")
            .description("Time to start your next set.")
            .ttl(TOAST_TTL),
    );

    CompletionReport {
        vibration,
        notification,
        audio,
    }
}
