use glam::Vec2;

use crate::pet::SPRITE_SIZE;

/// Bubble box size in logical pixels.
pub const BUBBLE_W: f32 = 200.0;
pub const BUBBLE_H: f32 = 70.0;

const MIN_ADAPTIVE_MS: u32 = 4000;
const MAX_ADAPTIVE_MS: u32 = 20_000;

/// Tint of the speech bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mood {
    #[default]
    Normal,
    Love,
    Alert,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub mood: Mood,
    /// Seconds left on screen.
    pub remaining: f32,
}

/// Reading time for `text`: 2 s plus the larger of 400 ms/word and 50 ms/char.
pub fn adaptive_duration_ms(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    let chars = text.chars().count() as u32;
    (2000 + (words * 400).max(chars * 50)).clamp(MIN_ADAPTIVE_MS, MAX_ADAPTIVE_MS)
}

/// The single speech bubble above the pet. A new message replaces the old one.
#[derive(Debug, Default)]
pub struct Bubble {
    current: Option<Message>,
}

impl Bubble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text`. The stock 3 s and 5 s durations are stretched to fit
    /// longer text; any other duration is used as given.
    pub fn show(&mut self, text: &str, mood: Mood, duration_ms: u32) {
        let ms = match duration_ms {
            3000 | 5000 => adaptive_duration_ms(text),
            other => other,
        };
        self.current = Some(Message {
            text: text.to_string(),
            mood,
            remaining: ms as f32 / 1000.0,
        });
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(msg) = &mut self.current {
            msg.remaining -= dt;
            if msg.remaining <= 0.0 {
                self.current = None;
            }
        }
    }
}

/// Top-left of the bubble for a pet at `pet_pos`.
pub fn anchor(pet_pos: Vec2, screen_w: f32) -> Vec2 {
    let max_x = (screen_w - BUBBLE_W - 20.0).max(10.0);
    let x = (pet_pos.x + SPRITE_SIZE / 2.0 - BUBBLE_W / 2.0).clamp(10.0, max_x);
    let y = (pet_pos.y - 80.0).max(10.0);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_gets_minimum() {
        assert_eq!(adaptive_duration_ms("Yum"), 4000);
    }

    #[test]
    fn long_text_is_capped() {
        let text = "word ".repeat(200);
        assert_eq!(adaptive_duration_ms(&text), 20_000);
    }

    #[test]
    fn char_heavy_text_uses_char_rate() {
        // 3 words, 60 chars: 2000 + 3000
        let text = format!("{} {} {}", "a".repeat(20), "b".repeat(19), "c".repeat(19));
        assert_eq!(text.chars().count(), 60);
        assert_eq!(adaptive_duration_ms(&text), 5000);
    }

    #[test]
    fn explicit_duration_is_kept() {
        let mut b = Bubble::new();
        b.show("Thinking...", Mood::Info, 60_000);
        assert_eq!(b.current().unwrap().remaining, 60.0);
    }

    #[test]
    fn message_expires() {
        let mut b = Bubble::new();
        b.show("Hi", Mood::Normal, 3000);
        b.update(3.9);
        assert!(b.current().is_some());
        b.update(0.2);
        assert!(b.current().is_none());
    }

    #[test]
    fn anchor_is_clamped() {
        assert_eq!(anchor(Vec2::new(0.0, 0.0), 1920.0), Vec2::new(10.0, 10.0));
        let a = anchor(Vec2::new(1800.0, 500.0), 1920.0);
        assert_eq!(a, Vec2::new(1700.0, 420.0));
    }
}
