use crate::bubble::Mood;
use crate::config::Settings;

const LOVE: &[&str] = &[
    "I like you a lot!",
    "I miss you when you're not around...",
    "You're the best person in the world!",
    "Thanks for taking care of me!",
    "You light up my day!",
    "I'm so happy to have you!",
];

const QUOTES: &[&str] = &[
    "\"Fall seven times, stand up eight.\" - Japanese proverb",
    "\"The only way to achieve the impossible is to believe it is possible.\"",
    "\"Every day is a new chance to change your life.\"",
    "\"Dreams don't work unless you do.\"",
    "\"Motivation gets you going, habit keeps you going.\"",
    "\"Believe in yourself and the rest will follow.\"",
];

const SUGGESTIONS: &[&str] = &[
    "How about we look up some easy, tasty recipes?",
    "I feel like learning something new! Tutorials, maybe?",
    "Want to catch up on the latest tech news?",
    "Shall we find some new places to visit?",
    "We could look for tips to get more done today!",
    "What about some interesting educational videos?",
];

/// Kind of unprompted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Love,
    Quote,
    Suggestion,
}

impl MessageKind {
    /// Parse the `type` field of a `random_message` chat action.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "quote" => MessageKind::Quote,
            "research" | "suggestion" => MessageKind::Suggestion,
            _ => MessageKind::Love,
        }
    }
}

fn pick<'a>(rng: &mut fastrand::Rng, list: &'a [&'a str]) -> &'a str {
    list[rng.usize(..list.len())]
}

/// Compose one message of `kind` along with its bubble mood.
pub fn compose(kind: MessageKind, settings: &Settings, rng: &mut fastrand::Rng) -> (String, Mood) {
    match kind {
        MessageKind::Love => (
            format!("Hey {}! {}", settings.user_name, pick(rng, LOVE)),
            Mood::Love,
        ),
        MessageKind::Quote => (pick(rng, QUOTES).to_string(), Mood::Info),
        MessageKind::Suggestion => (pick(rng, SUGGESTIONS).to_string(), Mood::Normal),
    }
}

/// A random message from the enabled categories, or `None` if all are off.
pub fn random(settings: &Settings, rng: &mut fastrand::Rng) -> Option<(String, Mood)> {
    let mut kinds = Vec::with_capacity(3);
    if settings.love_messages_enabled {
        kinds.push(MessageKind::Love);
    }
    if settings.quotes_enabled {
        kinds.push(MessageKind::Quote);
    }
    if settings.suggestions_enabled {
        kinds.push(MessageKind::Suggestion);
    }
    if kinds.is_empty() {
        return None;
    }
    let kind = kinds[rng.usize(..kinds.len())];
    Some(compose(kind, settings, rng))
}
