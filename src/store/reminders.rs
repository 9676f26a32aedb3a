use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Local, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{JsonFile, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub at: DateTime<Local>,
    pub message: String,
    #[serde(default)]
    pub recurring: bool,
}

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bin\s+(\d{1,4})\s*(minutes?|mins?|m|hours?|hrs?|h)\b")
            .expect("relative time pattern")
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})[:h](\d{2})\b").expect("clock time pattern"))
}

/// Resolve a loose time expression against `now`.
///
/// Accepts "in 5 minutes", "in 2 hours", "14:30" and "at 9h05". A clock time
/// that already passed today means tomorrow.
pub fn parse_time(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if let Some(caps) = relative_re().captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_ascii_lowercase();
        let delta = if unit.starts_with('h') {
            Duration::hours(amount)
        } else {
            Duration::minutes(amount)
        };
        return Some(now + delta);
    }

    let caps = clock_re().captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let mut at = now
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()?;
    if at <= now {
        at += Duration::days(1);
    }
    Some(at)
}

/// All pending reminders, persisted after every change.
pub struct ReminderBook {
    file: JsonFile<Vec<Reminder>>,
    reminders: Vec<Reminder>,
}

impl ReminderBook {
    pub fn open(path: PathBuf) -> Self {
        let file = JsonFile::new(path);
        let reminders: Vec<Reminder> = file.load_or_default();
        log::info!("Loaded {} reminders", reminders.len());
        Self { file, reminders }
    }

    pub fn add(&mut self, at: DateTime<Local>, message: &str, recurring: bool) -> Result<(), StoreError> {
        self.reminders.push(Reminder {
            at,
            message: message.to_string(),
            recurring,
        });
        self.file.save(&self.reminders)
    }

    /// Take every reminder due at `now`. One-off reminders are removed;
    /// recurring ones move forward by whole days until they are in the future.
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<String> {
        let mut fired = Vec::new();
        self.reminders.retain_mut(|r| {
            if r.at > now {
                return true;
            }
            fired.push(r.message.clone());
            if !r.recurring {
                return false;
            }
            while r.at <= now {
                r.at += Duration::days(1);
            }
            true
        });

        if !fired.is_empty() {
            if let Err(e) = self.file.save(&self.reminders) {
                log::warn!("Failed to save reminders: {e}");
            }
        }
        fired
    }

    pub fn pending(&self) -> &[Reminder] {
        &self.reminders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn relative_minutes_and_hours() {
        let now = noon();
        assert_eq!(parse_time("in 5 minutes", now), Some(now + Duration::minutes(5)));
        assert_eq!(parse_time("In 2 hours", now), Some(now + Duration::hours(2)));
        assert_eq!(parse_time("in 10 min", now), Some(now + Duration::minutes(10)));
    }

    #[test]
    fn clock_time_later_today() {
        let at = parse_time("at 14:30", noon()).unwrap();
        assert_eq!((at.hour(), at.minute()), (14, 30));
        assert_eq!(at.date_naive(), noon().date_naive());
    }

    #[test]
    fn clock_time_already_passed_rolls_to_tomorrow() {
        let at = parse_time("9h05", noon()).unwrap();
        assert_eq!(at.date_naive(), noon().date_naive().succ_opt().unwrap());
    }

    #[test]
    fn nonsense_is_rejected() {
        assert_eq!(parse_time("sometime soon", noon()), None);
        assert_eq!(parse_time("25:99", noon()), None);
    }

    #[test]
    fn due_reminders_fire_once_and_recurring_rearm() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ReminderBook::open(dir.path().join("reminders.json"));
        let now = noon();
        book.add(now - Duration::minutes(1), "stretch", false).unwrap();
        book.add(now - Duration::minutes(1), "water", true).unwrap();
        book.add(now + Duration::hours(1), "later", false).unwrap();

        let fired = book.take_due(now);
        assert_eq!(fired, vec!["stretch".to_string(), "water".to_string()]);
        assert_eq!(book.pending().len(), 2);
        assert!(book.pending().iter().all(|r| r.at > now));

        assert!(book.take_due(now).is_empty());

        let reopened = ReminderBook::open(dir.path().join("reminders.json"));
        assert_eq!(reopened.pending().len(), 2);
    }
}
