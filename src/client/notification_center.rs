use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::notification::{Notification, NotificationKind};

/// How long a toast stays visible unless dismissed.
pub const DISPLAY_WINDOW: Duration = Duration::seconds(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Notification,
    Completed,
    Error,
}

impl Sound {
    pub fn asset_path(&self) -> &'static str {
        match self {
            Sound::Notification => "/sounds/notification.mp3",
            Sound::Completed => "/sounds/completed.mp3",
            Sound::Error => "/sounds/notification.mp3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub sound: Sound,
    pub volume: f32,
}

impl SoundCue {
    pub fn for_kind(kind: NotificationKind) -> Self {
        let (sound, volume) = match kind {
            NotificationKind::Scheduled | NotificationKind::Skipped => (Sound::Notification, 0.5),
            NotificationKind::Completed => (Sound::Completed, 0.6),
            NotificationKind::Error => (Sound::Error, 0.7),
        };
        Self { sound, volume }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: DateTime<Utc>,
}

/// Subscriber-side state: visible toasts, unread badge and the sound toggle.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    toasts: Vec<Toast>,
    unread: usize,
    sound_enabled: bool,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self {
            toasts: Vec::new(),
            unread: 0,
            sound_enabled: true,
        }
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a toast and returns the cue to play, if sound is on.
    pub fn receive(&mut self, notification: Notification, now: DateTime<Utc>) -> Option<SoundCue> {
        let cue = self
            .sound_enabled
            .then(|| SoundCue::for_kind(notification.kind));

        self.toasts.push(Toast {
            notification,
            shown_at: now,
        });
        self.unread += 1;

        cue
    }

    /// Drops toasts whose display window has elapsed.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|toast| now - toast.shown_at < DISPLAY_WINDOW);
    }

    pub fn dismiss(&mut self, reminder_id: Uuid) {
        self.toasts
            .retain(|toast| toast.notification.reminder_id != reminder_id);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn clear_unread(&mut self) {
        self.unread = 0;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn toggle_sound(&mut self) {
        self.sound_enabled = !self.sound_enabled;
    }
}
