//! Desktop capability provider - notify-rust popups and system audio players

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use notify_rust::{Notification, Timeout};
use tracing::debug;

use super::{Capability, CapabilityProvider, OsNotification, Toast, ToastQueue, Tone};

/// Candidate (player, sound file) pairs for the pre-rendered cue
const SOUND_CANDIDATES: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

const APP_NAME: &str = "gymplanner";

pub struct DesktopCapabilities {
    notifications: bool,
    sound: bool,
    toasts: ToastQueue,
}

impl DesktopCapabilities {
    pub fn new(notifications: bool, sound: bool, toasts: ToastQueue) -> Self {
        Self {
            notifications,
            sound,
            toasts,
        }
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }
}

fn spawn_player(player: &str, file: &Path) -> Result<()> {
    Command::new(player)
        .arg(file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", player))?;
    Ok(())
}

/// Stable non-zero id for a tag; 0 asks the daemon for a fresh one
fn notification_id(tag: &str) -> u32 {
    let hash = tag
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
    hash.max(1)
}

fn tone_path() -> PathBuf {
    std::env::temp_dir().join(format!("{}-rest-tone.wav", APP_NAME))
}

impl CapabilityProvider for DesktopCapabilities {
    fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Notification => self.notifications,
            Capability::Audio => self.sound,
            // Desktops have no haptics
            Capability::Vibration => false,
        }
    }

    fn vibrate(&self, _pattern: &[u64]) -> Result<()> {
        bail!("vibration is not available on this device")
    }

    fn notify(&self, notification: &OsNotification) -> Result<()> {
        let mut popup = Notification::new();
        popup
            .summary(&notification.title)
            .body(&notification.body)
            .appname(APP_NAME)
            .icon("alarm-clock")
            .timeout(Timeout::Milliseconds(notification.auto_dismiss.as_millis() as u32));

        for (id, label) in &notification.actions {
            popup.action(id, label);
        }

        // Same id replaces the earlier popup on XDG desktops
        #[cfg(all(unix, not(target_os = "macos")))]
        popup.id(notification_id(&notification.tag));

        popup.show().context("notification daemon rejected the request")?;
        debug!("Shown notification {:?}", notification.tag);
        Ok(())
    }

    fn play_cue(&self) -> Result<()> {
        let (player, file) = SOUND_CANDIDATES
            .iter()
            .find(|(_, file)| Path::new(file).exists())
            .context("no system sound file found")?;
        spawn_player(player, Path::new(file))
    }

    fn play_tone(&self, tone: &Tone) -> Result<()> {
        let path = tone_path();
        std::fs::write(&path, tone.to_wav())
            .with_context(|| format!("failed to write {}", path.display()))?;
        spawn_player("aplay", &path)
    }

    fn toast(&self, toast: Toast) {
        self.toasts.push(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_gate_capabilities() {
        let caps = DesktopCapabilities::new(false, true, ToastQueue::default());
        assert!(!caps.has(Capability::Notification));
        assert!(caps.has(Capability::Audio));
        assert!(!caps.has(Capability::Vibration));
        assert!(caps.vibrate(&[100]).is_err());
    }

    #[test]
    fn test_notification_id_follows_tag() {
        assert_eq!(notification_id("rest-timer"), notification_id("rest-timer"));
        assert_ne!(notification_id("rest-timer"), notification_id("new-day"));
        assert_ne!(notification_id(""), 0);
    }

    #[test]
    fn test_toasts_go_to_queue() {
        let queue = ToastQueue::default();
        let caps = DesktopCapabilities::new(false, false, queue.clone());
        caps.toast(Toast::success("done"));
        assert_eq!(queue.drain().len(), 1);
        assert_eq!(caps.toasts().drain().len(), 0);
    }
}
