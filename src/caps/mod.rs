//! Capability provider - optional environment features behind one interface
//!
//! Notifications, vibration and audio may be missing or permission-gated.
//! Callers probe with [`CapabilityProvider::has`] and skip what is absent;
//! the toast channel is always available.

pub mod desktop;
#[cfg(test)]
pub mod testing;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;

pub use desktop::DesktopCapabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Notification,
    Vibration,
    Audio,
}

/// OS-level notification request
#[derive(Debug, Clone, PartialEq)]
pub struct OsNotification {
    pub title: String,
    pub body: String,
    /// Replaces an earlier notification with the same tag
    pub tag: String,
    /// (action id, button label)
    pub actions: Vec<(String, String)>,
    pub auto_dismiss: Duration,
}

/// Synthesized cue: a sine wave with an exponential gain envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    pub start_gain: f32,
    pub end_gain: f32,
    pub sample_rate: u32,
}

impl Tone {
    /// Short 800 Hz beep fading from 0.3 to 0.01 over half a second
    pub fn beep() -> Self {
        Self {
            frequency_hz: 800.0,
            duration: Duration::from_millis(500),
            start_gain: 0.3,
            end_gain: 0.01,
            sample_rate: 44_100,
        }
    }

    pub fn samples(&self) -> Vec<f32> {
        let total = (self.duration.as_secs_f32() * self.sample_rate as f32).round() as usize;
        let ratio = self.end_gain / self.start_gain;

        (0..total)
            .map(|i| {
                let t = i as f32 / self.sample_rate as f32;
                let progress = i as f32 / total as f32;
                let gain = self.start_gain * ratio.powf(progress);
                gain * (2.0 * std::f32::consts::PI * self.frequency_hz * t).sin()
            })
            .collect()
    }

    /// 16-bit mono PCM WAV image of [`Tone::samples`]
    pub fn to_wav(&self) -> Vec<u8> {
        let samples = self.samples();
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);

        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());

        for s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// Transient in-app message
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub description: Option<String>,
    pub ttl: Duration,
    pub created: Instant,
}

impl Toast {
    const DEFAULT_TTL: Duration = Duration::from_secs(4);

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            description: None,
            ttl: Self::DEFAULT_TTL,
            created: Instant::now(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= self.ttl
    }
}

/// Shared queue the presentation layer drains or renders
#[derive(Clone, Default)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Toast>>>,
}

impl ToastQueue {
    const MAX_QUEUED: usize = 32;

    pub fn push(&self, toast: Toast) {
        if let Ok(mut queue) = self.inner.lock() {
            if queue.len() == Self::MAX_QUEUED {
                queue.pop_front();
            }
            queue.push_back(toast);
        }
    }

    /// Take everything queued so far
    pub fn drain(&self) -> Vec<Toast> {
        self.inner
            .lock()
            .map(|mut q| q.drain(..).collect())
            .unwrap_or_default()
    }

    /// Drop expired toasts and return the ones still visible
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        match self.inner.lock() {
            Ok(mut queue) => {
                queue.retain(|t| !t.is_expired(now));
                queue.iter().cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }
}

/// Environment features the core may use.
///
/// Every method other than `toast` may fail or be unavailable; callers treat
/// each one as best-effort and never let one failure block another.
pub trait CapabilityProvider: Send + Sync {
    fn has(&self, capability: Capability) -> bool;

    /// Ask for notification permission where the platform requires it
    fn request_notification_permission(&self) -> bool {
        self.has(Capability::Notification)
    }

    /// Pulse pattern in milliseconds: on, off, on, ...
    fn vibrate(&self, pattern: &[u64]) -> Result<()>;

    fn notify(&self, notification: &OsNotification) -> Result<()>;

    /// Pre-rendered cue
    fn play_cue(&self) -> Result<()>;

    fn play_tone(&self, tone: &Tone) -> Result<()>;

    fn toast(&self, toast: Toast);
}
