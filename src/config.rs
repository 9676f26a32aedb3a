use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::{JsonFile, StoreError};

/// Which sprite set the pet uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    Cat,
    Dog,
}

impl PetKind {
    pub fn label(self) -> &'static str {
        match self {
            PetKind::Cat => "Cat",
            PetKind::Dog => "Dog",
        }
    }
}

/// Tone of the offline chat replies and of the cloud persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Playful,
    Calm,
    Energetic,
    Lazy,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Playful,
        Personality::Calm,
        Personality::Energetic,
        Personality::Lazy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Personality::Playful => "playful",
            Personality::Calm => "calm",
            Personality::Energetic => "energetic",
            Personality::Lazy => "lazy",
        }
    }
}

/// User-facing settings, persisted as JSON. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pet_kind: PetKind,
    pub pet_name: String,
    pub user_name: String,
    /// Pixels per 60 Hz tick (1..=10).
    pub movement_speed: u32,
    /// Milliseconds per animation frame.
    pub animation_speed_ms: u32,

    pub ai_enabled: bool,
    pub api_key: String,
    pub personality: Personality,

    pub random_messages_enabled: bool,
    /// Seconds between random messages, `[min, max]`.
    pub random_message_interval: [u32; 2],
    pub love_messages_enabled: bool,
    pub quotes_enabled: bool,
    pub suggestions_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pet_kind: PetKind::Cat,
            pet_name: "Mochi".to_string(),
            user_name: "friend".to_string(),
            movement_speed: 3,
            animation_speed_ms: 100,
            ai_enabled: false,
            api_key: String::new(),
            personality: Personality::Playful,
            random_messages_enabled: true,
            random_message_interval: [300, 900],
            love_messages_enabled: true,
            quotes_enabled: true,
            suggestions_enabled: true,
        }
    }
}

impl Settings {
    /// Base movement speed in pixels per second.
    pub fn speed_px_per_sec(&self) -> f32 {
        self.movement_speed.clamp(1, 10) as f32 * 60.0
    }

    /// Seconds per animation frame.
    pub fn frame_time(&self) -> f32 {
        self.animation_speed_ms.max(16) as f32 / 1000.0
    }

    /// Random message interval in seconds, ordered.
    pub fn message_interval_secs(&self) -> (f32, f32) {
        let [a, b] = self.random_message_interval;
        (a.min(b) as f32, a.max(b) as f32)
    }

    /// The cloud model is used only when enabled and a key is present.
    pub fn cloud_chat_ready(&self) -> bool {
        self.ai_enabled && !self.api_key.trim().is_empty()
    }
}

/// Settings plus the file they live in. Every update is written through.
pub struct ConfigStore {
    file: JsonFile<Settings>,
    settings: Settings,
}

impl ConfigStore {
    /// Load from `path`, falling back to defaults when missing or unreadable.
    pub fn open(path: PathBuf) -> Self {
        let file = JsonFile::new(path);
        let settings: Settings = file.load_or_default();
        Self { file, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutate the settings and save them.
    pub fn update(&mut self, f: impl FnOnce(&mut Settings)) -> Result<(), StoreError> {
        f(&mut self.settings);
        self.file.save(&self.settings)
    }

    /// Replace all settings at once (settings dialog "Save").
    pub fn replace(&mut self, settings: Settings) -> Result<(), StoreError> {
        self.settings = settings;
        self.file.save(&self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"pet_name": "Biscuit", "pet_kind": "dog"}"#)
            .unwrap();
        assert_eq!(s.pet_name, "Biscuit");
        assert_eq!(s.pet_kind, PetKind::Dog);
        assert_eq!(s.movement_speed, 3);
        assert_eq!(s.random_message_interval, [300, 900]);
    }

    #[test]
    fn speed_is_clamped() {
        let s = Settings {
            movement_speed: 40,
            ..Default::default()
        };
        assert_eq!(s.speed_px_per_sec(), 600.0);
    }

    #[test]
    fn cloud_needs_key_and_flag() {
        let mut s = Settings::default();
        assert!(!s.cloud_chat_ready());
        s.ai_enabled = true;
        s.api_key = "   ".into();
        assert!(!s.cloud_chat_ready());
        s.api_key = "abc".into();
        assert!(s.cloud_chat_ready());
    }

    #[test]
    fn update_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut store = ConfigStore::open(path.clone());
        store.update(|s| s.user_name = "Sam".into()).unwrap();

        let reopened = ConfigStore::open(path);
        assert_eq!(reopened.settings().user_name, "Sam");
    }
}
