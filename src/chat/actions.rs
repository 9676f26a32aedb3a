use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::messages::MessageKind;

/// Something a chat reply asks the pet to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Note { content: String },
    Reminder { time: String, message: String },
    SearchNotes { query: String },
    RandomMessage(MessageKind),
}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)\{\s*"action"\s*:\s*"[^"]+"[^{}]*\}"#).expect("action pattern")
    })
}

fn field(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn parse(obj: &Value) -> Option<Action> {
    match obj.get("action")?.as_str()? {
        "note" => {
            let content = field(obj, "content");
            (!content.is_empty()).then_some(Action::Note { content })
        }
        "reminder" => {
            let time = field(obj, "time");
            let message = field(obj, "message");
            (!time.is_empty() && !message.is_empty()).then_some(Action::Reminder { time, message })
        }
        "search_notes" => {
            let query = field(obj, "query");
            (!query.is_empty()).then_some(Action::SearchNotes { query })
        }
        "random_message" => {
            let kind = obj.get("type").and_then(Value::as_str).unwrap_or("love");
            Some(Action::RandomMessage(MessageKind::from_tag(kind)))
        }
        other => {
            log::warn!("Ignoring unknown chat action {other:?}");
            None
        }
    }
}

/// Split `raw` into display text and embedded `{"action": ...}` objects.
///
/// Every well-formed action object is removed from the text, recognized or
/// not. Malformed JSON is left in place.
pub fn extract(raw: &str) -> (String, Vec<Action>) {
    let mut actions = Vec::new();
    let mut text = String::with_capacity(raw.len());
    let mut last = 0;

    for m in action_re().find_iter(raw) {
        let Ok(obj) = serde_json::from_str::<Value>(m.as_str()) else {
            log::warn!("Malformed chat action: {}", m.as_str());
            continue;
        };
        text.push_str(&raw[last..m.start()]);
        last = m.end();
        if let Some(action) = parse(&obj) {
            actions.push(action);
        }
    }
    text.push_str(&raw[last..]);

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (text, actions)
}
