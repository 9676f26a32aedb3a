pub mod actions;
pub mod cloud;
pub mod offline;
pub mod worker;

use chrono::{DateTime, Local};

use crate::bubble::Mood;
use crate::config::{Personality, Settings};

pub use self::actions::Action;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("api reply had no text")]
    EmptyReply,
}

/// Who is talking to whom, captured when the message is sent.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub pet_name: String,
    pub user_name: String,
    pub personality: Personality,
    pub now: DateTime<Local>,
}

impl ChatContext {
    pub fn from_settings(settings: &Settings, now: DateTime<Local>) -> Self {
        Self {
            pet_name: settings.pet_name.clone(),
            user_name: settings.user_name.clone(),
            personality: settings.personality,
            now,
        }
    }
}

/// A reply ready for the bubble, plus anything the pet was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub mood: Mood,
    pub actions: Vec<Action>,
}

impl Reply {
    /// Build a reply from raw model or canned text: pull out embedded
    /// actions and pick a mood for what is left.
    pub fn from_text(raw: &str) -> Self {
        let (text, actions) = actions::extract(raw);
        let mood = classify_mood(&text);
        Self {
            text,
            mood,
            actions,
        }
    }
}

pub trait Responder {
    fn respond(&mut self, text: &str, ctx: &ChatContext) -> Reply;
}

const LOVE_MARKERS: &[&str] = &["❤", "💕", "🥰", "love", "adore"];
const ALERT_MARKERS: &[&str] = &["⚠", "🔥", "❌", "warning", "error", "careful"];
const INFO_MARKERS: &[&str] = &["📊", "ℹ", "✅", "info", "saved", "reminder"];

/// Bubble tint for a reply, by keyword.
pub fn classify_mood(text: &str) -> Mood {
    let lower = text.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    if has(LOVE_MARKERS) {
        Mood::Love
    } else if has(ALERT_MARKERS) {
        Mood::Alert
    } else if has(INFO_MARKERS) {
        Mood::Info
    } else {
        Mood::Normal
    }
}

/// Cloud first when configured, offline patterns otherwise or on failure.
pub struct Router {
    offline: offline::Offline,
    cloud: Option<cloud::Gemini>,
}

impl Router {
    pub fn new(settings: &Settings, rng: fastrand::Rng) -> Self {
        let mut router = Self {
            offline: offline::Offline::new(rng),
            cloud: None,
        };
        router.reconfigure(settings);
        router
    }

    pub fn reconfigure(&mut self, settings: &Settings) {
        self.cloud = if settings.cloud_chat_ready() {
            match cloud::Gemini::new(settings.api_key.trim()) {
                Ok(client) => Some(client),
                Err(e) => {
                    log::warn!("Cloud chat unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };
        log::info!(
            "Chat mode: {}",
            if self.is_cloud() { "cloud" } else { "offline" }
        );
    }

    pub fn is_cloud(&self) -> bool {
        self.cloud.is_some()
    }
}

impl Responder for Router {
    fn respond(&mut self, text: &str, ctx: &ChatContext) -> Reply {
        if let Some(cloud) = &self.cloud {
            match cloud.ask(text, ctx) {
                Ok(raw) => return Reply::from_text(&raw),
                Err(e) => log::warn!("Cloud chat failed, answering offline: {e}"),
            }
        }
        self.offline.respond(text, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_keywords() {
        assert_eq!(classify_mood("I love you too!"), Mood::Love);
        assert_eq!(classify_mood("Careful, that's hot"), Mood::Alert);
        assert_eq!(classify_mood("Note saved"), Mood::Info);
        assert_eq!(classify_mood("Meow?"), Mood::Normal);
    }

    #[test]
    fn reply_strips_actions() {
        let reply = Reply::from_text(r#"Sure! {"action": "note", "content": "buy milk"}"#);
        assert_eq!(reply.text, "Sure!");
        assert_eq!(
            reply.actions,
            vec![Action::Note {
                content: "buy milk".into()
            }]
        );
    }

    #[test]
    fn router_without_key_stays_offline() {
        let settings = Settings {
            ai_enabled: true,
            ..Settings::default()
        };
        let router = Router::new(&settings, fastrand::Rng::with_seed(1));
        assert!(!router.is_cloud());
    }
}
