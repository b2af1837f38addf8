//! Recording provider for tests

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Result, bail};

use super::{Capability, CapabilityProvider, OsNotification, Toast, Tone};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Vibrate(Vec<u64>),
    Notify(String),
    Cue,
    Tone(u32),
}

/// Records every call; capabilities can be hidden or made to fail
#[derive(Default)]
pub struct Recorder {
    missing: HashSet<Capability>,
    fail_cue: bool,
    fail_notify: bool,
    calls: Mutex<Vec<Call>>,
    toasts: Mutex<Vec<Toast>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.missing.insert(capability);
        self
    }

    pub fn failing_cue(mut self) -> Self {
        self.fail_cue = true;
        self
    }

    pub fn failing_notify(mut self) -> Self {
        self.fail_notify = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn toast_messages(&self) -> Vec<String> {
        self.toasts.lock().unwrap().iter().map(|t| t.message.clone()).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CapabilityProvider for Recorder {
    fn has(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    fn vibrate(&self, pattern: &[u64]) -> Result<()> {
        self.record(Call::Vibrate(pattern.to_vec()));
        Ok(())
    }

    fn notify(&self, notification: &OsNotification) -> Result<()> {
        if self.fail_notify {
            bail!("permission denied");
        }
        self.record(Call::Notify(notification.title.clone()));
        Ok(())
    }

    fn play_cue(&self) -> Result<()> {
        if self.fail_cue {
            bail!("autoplay blocked");
        }
        self.record(Call::Cue);
        Ok(())
    }

    fn play_tone(&self, tone: &Tone) -> Result<()> {
        self.record(Call::Tone(tone.frequency_hz as u32));
        Ok(())
    }

    fn toast(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}
