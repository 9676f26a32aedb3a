//! Everything the overlay shell drives that is not windowing: the sim, the
//! speech bubble and the three JSON stores, plus the glue that turns chat
//! replies and sim events into bubble text and saved records.

use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::bubble::{Bubble, Mood};
use crate::chat::{Action, Reply};
use crate::config::{ConfigStore, PetKind, Settings};
use crate::messages::MessageKind;
use crate::pet::Screen;
use crate::sim::{Sim, SimEvent};
use crate::store::notes::NoteBook;
use crate::store::reminders::{parse_time, ReminderBook};

/// How many notes "show notes" lists.
const NOTES_SHOWN: usize = 3;
const REMINDER_BUBBLE_MS: u32 = 6000;

pub struct Companion {
    pub sim: Sim,
    pub bubble: Bubble,
    pub config: ConfigStore,
    pub reminders: ReminderBook,
    pub notes: NoteBook,
    /// Random messages asked for by chat, spoken once the bubble is free.
    queued: VecDeque<MessageKind>,
}

impl Companion {
    /// Load settings, reminders and notes from `dir` and build the sim.
    pub fn open(dir: &Path, screen: Screen, rng: fastrand::Rng) -> Self {
        let config = ConfigStore::open(dir.join("config.json"));
        let reminders = ReminderBook::open(dir.join("reminders.json"));
        let notes = NoteBook::open(dir.join("notes.json"));
        let sim = Sim::new(config.settings().clone(), screen, rng);
        Self {
            sim,
            bubble: Bubble::new(),
            config,
            reminders,
            notes,
            queued: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.config.settings()
    }

    pub fn start(&mut self) {
        self.sim.start();
    }

    pub fn say(&mut self, text: &str, mood: Mood, duration_ms: u32) {
        self.bubble.show(text, mood, duration_ms);
    }

    /// Move queued sim events into the bubble and the reminder book.
    /// Returns how many reminders fired.
    pub fn pump_events(&mut self, now: DateTime<Local>) -> usize {
        if self.bubble.current().is_none() {
            if let Some(kind) = self.queued.pop_front() {
                self.sim.say_message(kind);
            }
        }
        let events: Vec<SimEvent> = self.sim.drain_events().collect();
        let mut fired = 0;
        for event in events {
            match event {
                SimEvent::Say {
                    text,
                    mood,
                    duration_ms,
                } => self.bubble.show(&text, mood, duration_ms),
                SimEvent::CheckReminders => fired += self.fire_reminders(now),
            }
        }
        fired
    }

    /// Announce every reminder due at `now`.
    pub fn fire_reminders(&mut self, now: DateTime<Local>) -> usize {
        let due = self.reminders.take_due(now);
        for message in &due {
            log::info!("Reminder fired: {message}");
            self.bubble
                .show(&format!("Reminder: {message}"), Mood::Alert, REMINDER_BUBBLE_MS);
        }
        due.len()
    }

    /// Carry out a chat reply: run its actions and show the text together
    /// with what the actions did.
    pub fn apply_reply(&mut self, reply: Reply, now: DateTime<Local>) {
        let mut lines = Vec::new();
        if !reply.text.is_empty() {
            lines.push(reply.text.clone());
        }
        let mut mood = reply.mood;

        for action in reply.actions {
            match action {
                Action::Note { content } => match self.notes.add(&content, now) {
                    Ok(id) => {
                        lines.push(format!("Note #{id} saved"));
                        mood = Mood::Info;
                    }
                    Err(e) => {
                        log::warn!("Failed to save note: {e}");
                        lines.push("I couldn't save that note...".to_string());
                        mood = Mood::Alert;
                    }
                },
                Action::Reminder { time, message } => {
                    lines.push(self.add_reminder(&time, &message, now));
                    mood = Mood::Info;
                }
                Action::SearchNotes { query } => {
                    lines.push(self.search_notes(&query));
                    mood = Mood::Info;
                }
                Action::RandomMessage(kind) => self.queued.push_back(kind),
            }
        }

        if lines.is_empty() {
            // Nothing to say; drop the "thinking" bubble.
            self.bubble.hide();
        } else {
            self.bubble.show(&lines.join("\n"), mood, 5000);
        }
        // Queued messages wait for this bubble to close.
        self.pump_events(now);
    }

    fn add_reminder(&mut self, time: &str, message: &str, now: DateTime<Local>) -> String {
        let Some(at) = parse_time(time, now) else {
            return format!("I didn't get the timing '{time}'. Try 'in 5 minutes' or '14:30'");
        };
        match self.reminders.add(at, message, false) {
            Ok(()) => {
                log::info!("{} reminders pending", self.reminders.pending().len());
                format!("Reminder set for {}: {message}", at.format("%H:%M"))
            }
            Err(e) => {
                log::warn!("Failed to save reminder: {e}");
                "I couldn't save that reminder...".to_string()
            }
        }
    }

    fn search_notes(&self, query: &str) -> String {
        let hits = self.notes.search(query);
        if hits.is_empty() {
            return format!("No notes about '{query}'");
        }
        let lines: Vec<String> = hits
            .iter()
            .take(NOTES_SHOWN)
            .map(|n| format!("#{} {}", n.id, n.content))
            .collect();
        format!("Found {}:\n{}", hits.len(), lines.join("\n"))
    }

    /// Newest notes as one bubble.
    pub fn show_notes(&mut self) {
        let recent = self.notes.recent(NOTES_SHOWN);
        let text = if recent.is_empty() {
            "No notes yet".to_string()
        } else {
            let lines: Vec<String> = recent
                .iter()
                .map(|n| format!("#{} {}", n.id, n.content))
                .collect();
            format!("Notes:\n{}", lines.join("\n"))
        };
        self.bubble.show(&text, Mood::Info, 5000);
    }

    pub fn set_pet_kind(&mut self, kind: PetKind) {
        if self.settings().pet_kind == kind {
            return;
        }
        if let Err(e) = self.config.update(|s| s.pet_kind = kind) {
            log::warn!("Failed to save settings: {e}");
        }
        self.sim.settings.pet_kind = kind;
        log::info!("Pet is now a {}", kind.label());
    }

    /// Store edited settings and push them into the sim. Returns false when
    /// nothing changed.
    pub fn save_settings(&mut self, settings: Settings) -> bool {
        if *self.settings() == settings {
            return false;
        }
        if let Err(e) = self.config.replace(settings.clone()) {
            log::warn!("Failed to save settings: {e}");
        }
        self.sim.apply_settings(settings);
        self.bubble.show("Settings saved!", Mood::Info, 2000);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const SCREEN: Screen = Screen { w: 1920.0, h: 1080.0 };

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn companion(dir: &Path) -> Companion {
        Companion::open(dir, SCREEN, fastrand::Rng::with_seed(7))
    }

    fn bubble_text(c: &Companion) -> String {
        c.bubble.current().map(|m| m.text.clone()).unwrap_or_default()
    }

    #[test]
    fn greeting_reaches_the_bubble() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        c.start();
        c.pump_events(now());
        assert_eq!(bubble_text(&c), "Hi friend! Mochi is here!");
    }

    #[test]
    fn note_action_is_saved_and_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let reply = Reply {
            text: "Got it!".into(),
            mood: Mood::Normal,
            actions: vec![Action::Note {
                content: "buy milk".into(),
            }],
        };
        c.apply_reply(reply, now());
        assert_eq!(c.notes.len(), 1);
        assert_eq!(bubble_text(&c), "Got it!\nNote #1 saved");
        assert_eq!(c.bubble.current().unwrap().mood, Mood::Info);

        // persisted
        let again = companion(dir.path());
        assert_eq!(again.notes.len(), 1);
    }

    #[test]
    fn reminder_action_parses_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let reply = Reply {
            text: String::new(),
            mood: Mood::Normal,
            actions: vec![Action::Reminder {
                time: "in 5 minutes".into(),
                message: "stretch".into(),
            }],
        };
        c.apply_reply(reply, now());
        assert_eq!(bubble_text(&c), "Reminder set for 09:05: stretch");
        assert_eq!(c.reminders.pending().len(), 1);
    }

    #[test]
    fn bad_reminder_time_is_explained() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let reply = Reply {
            text: String::new(),
            mood: Mood::Normal,
            actions: vec![Action::Reminder {
                time: "someday".into(),
                message: "x".into(),
            }],
        };
        c.apply_reply(reply, now());
        assert!(bubble_text(&c).starts_with("I didn't get the timing 'someday'"));
        assert!(c.reminders.pending().is_empty());
    }

    #[test]
    fn random_message_action_speaks() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let reply = Reply {
            text: String::new(),
            mood: Mood::Normal,
            actions: vec![Action::RandomMessage(MessageKind::Love)],
        };
        c.apply_reply(reply, now());
        assert!(bubble_text(&c).starts_with("Hey friend!"));
    }

    #[test]
    fn random_message_waits_for_the_reply_bubble() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let reply = Reply {
            text: "Sure!".into(),
            mood: Mood::Normal,
            actions: vec![Action::RandomMessage(MessageKind::Love)],
        };
        c.apply_reply(reply, now());
        assert_eq!(bubble_text(&c), "Sure!");

        c.bubble.update(1.0);
        c.pump_events(now());
        assert_eq!(bubble_text(&c), "Sure!");

        c.bubble.update(30.0);
        c.pump_events(now());
        assert!(bubble_text(&c).starts_with("Hey friend!"));
    }

    #[test]
    fn search_action_lists_matching_notes() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        c.notes.add("buy milk", now()).unwrap();
        c.notes.add("call the doctor", now()).unwrap();
        let search = |query: &str| Reply {
            text: String::new(),
            mood: Mood::Normal,
            actions: vec![Action::SearchNotes { query: query.into() }],
        };

        c.apply_reply(search("MILK"), now());
        assert_eq!(bubble_text(&c), "Found 1:\n#1 buy milk");
        // "doctor" is tagged health
        c.apply_reply(search("health"), now());
        assert_eq!(bubble_text(&c), "Found 1:\n#2 call the doctor");
        c.apply_reply(search("tea"), now());
        assert_eq!(bubble_text(&c), "No notes about 'tea'");
    }

    #[test]
    fn due_reminders_fire_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        c.reminders.add(now() + Duration::minutes(1), "tea", false).unwrap();
        assert_eq!(c.fire_reminders(now()), 0);
        assert_eq!(c.fire_reminders(now() + Duration::minutes(2)), 1);
        assert_eq!(bubble_text(&c), "Reminder: tea");
        assert_eq!(c.fire_reminders(now() + Duration::minutes(3)), 0);
    }

    #[test]
    fn notes_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        c.show_notes();
        assert_eq!(bubble_text(&c), "No notes yet");
        c.notes.add("first", now()).unwrap();
        c.notes.add("second", now() + Duration::minutes(1)).unwrap();
        c.show_notes();
        assert_eq!(bubble_text(&c), "Notes:\n#2 second\n#1 first");
    }

    #[test]
    fn settings_save_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        let same = c.settings().clone();
        assert!(!c.save_settings(same));

        let edited = Settings {
            pet_name: "Biscuit".into(),
            ..c.settings().clone()
        };
        assert!(c.save_settings(edited));
        assert_eq!(c.sim.settings.pet_name, "Biscuit");
        assert_eq!(companion(dir.path()).settings().pet_name, "Biscuit");
    }

    #[test]
    fn pet_kind_switch_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = companion(dir.path());
        c.set_pet_kind(PetKind::Dog);
        assert_eq!(c.sim.settings.pet_kind, PetKind::Dog);
        assert_eq!(companion(dir.path()).settings().pet_kind, PetKind::Dog);
    }
}
