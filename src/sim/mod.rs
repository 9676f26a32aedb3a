pub mod behavior;
pub mod interaction;
pub mod motion;

use glam::Vec2;

use crate::bubble::Mood;
use crate::config::Settings;
use crate::messages;
use crate::pet::{Pet, Screen};
use crate::props::Props;
use crate::schedule::{secs_between, Timers};

/// How often due reminders are polled, seconds.
const REMINDER_POLL: f32 = 60.0;
/// Chance per waste-timer firing that the pet leaves a mess.
const WASTE_CHANCE: f32 = 0.3;

/// Something the sim wants the shell to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Say {
        text: String,
        mood: Mood,
        duration_ms: u32,
    },
    /// Time to poll the reminder book.
    CheckReminders,
}

/// What the pointer is holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grab {
    Pet,
    Food { entity: hecs::Entity, offset: Vec2 },
}

/// The whole pet world: one pet, its props and every timer that drives it.
pub struct Sim {
    pub pet: Pet,
    pub props: Props,
    pub timers: Timers,
    pub settings: Settings,
    pub screen: Screen,
    pub rng: fastrand::Rng,
    grab: Option<Grab>,
    events: Vec<SimEvent>,
}

impl Sim {
    pub fn new(settings: Settings, screen: Screen, mut rng: fastrand::Rng) -> Self {
        let pos = Pet::spawn_point(&mut rng, screen);
        let pet = Pet::new(pos, settings.frame_time());
        Self {
            pet,
            props: Props::new(),
            timers: Timers::new(),
            settings,
            screen,
            rng,
            grab: None,
            events: Vec::new(),
        }
    }

    /// Arm the startup timers and greet the user.
    pub fn start(&mut self) {
        let first = secs_between(&mut self.rng, 15.0, 45.0);
        self.timers.behavior.start(first);
        let waste = secs_between(&mut self.rng, 60.0, 120.0);
        self.timers.waste_spawn.start(waste);
        if self.settings.random_messages_enabled {
            self.restart_message_timer();
        }
        self.timers.reminder_check.start(REMINDER_POLL);

        let greeting = format!(
            "Hi {}! {} is here!",
            self.settings.user_name, self.settings.pet_name
        );
        self.say(&greeting, Mood::Love, 4000);
        log::info!("Pet started, first behavior in {first:.0}s");
    }

    pub fn say(&mut self, text: &str, mood: Mood, duration_ms: u32) {
        self.events.push(SimEvent::Say {
            text: text.to_string(),
            mood,
            duration_ms,
        });
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    pub fn speed(&self) -> f32 {
        self.settings.speed_px_per_sec()
    }

    pub fn resize(&mut self, screen: Screen) {
        self.screen = screen;
        if !matches!(self.pet.activity, crate::pet::Activity::Dragged(_)) {
            self.pet.pos = screen.clamp(self.pet.pos);
        }
    }

    /// Advance everything by one fixed step.
    pub fn tick(&mut self, dt: f32) {
        self.pet.prev_pos = self.pet.pos;

        // 1. Timers
        self.run_timers(dt);

        // 2. Waste decay
        let decayed = self.props.update(dt);
        if decayed > 0 {
            log::debug!("{decayed} waste decayed");
        }

        // 3. Movement and behavior-mode transitions
        motion::step(self, dt);

        // 4. Animation frames
        self.pet.anim.advance(dt);
    }

    fn run_timers(&mut self, dt: f32) {
        if self.timers.behavior.tick(dt) {
            behavior::decide(self);
        }
        if self.timers.walk_stop.tick(dt) {
            behavior::stop_walking(self);
        }
        if self.timers.one_shot.tick(dt) {
            behavior::finish_one_shot(self);
        }
        if self.timers.deferred_behavior.tick(dt) {
            let delay = self.timers.deferred_delay;
            self.timers.behavior.start(delay);
        }
        if self.timers.waste_spawn.tick(dt) {
            self.maybe_drop_waste();
        }
        if self.timers.random_message.tick(dt) {
            self.random_message();
        }
        if self.timers.quiet_check.tick(dt) {
            behavior::check_quiet(self);
        }
        if self.timers.reminder_check.tick(dt) {
            self.events.push(SimEvent::CheckReminders);
        }
    }

    fn maybe_drop_waste(&mut self) {
        if self.pet.activity.is_dead() || self.rng.f32() >= WASTE_CHANCE {
            return;
        }
        self.add_waste();
    }

    fn restart_message_timer(&mut self) {
        let (min, max) = self.settings.message_interval_secs();
        let secs = secs_between(&mut self.rng, min, max);
        self.timers.random_message.start(secs);
    }

    fn random_message(&mut self) {
        if !self.pet.activity.is_dead() {
            if let Some((text, mood)) = messages::random(&self.settings, &mut self.rng) {
                self.say(&text, mood, 4000);
            }
        }
        if self.settings.random_messages_enabled {
            self.restart_message_timer();
        } else {
            self.timers.random_message.stop();
        }
    }

    /// Say one message of the given kind right now (chat action).
    pub fn say_message(&mut self, kind: messages::MessageKind) {
        let (text, mood) = messages::compose(kind, &self.settings, &mut self.rng);
        self.say(&text, mood, 5000);
    }

    /// Swap in edited settings.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.pet.anim.frame_time = settings.frame_time();
        let messages_on = settings.random_messages_enabled;
        self.settings = settings;

        if messages_on {
            if !self.timers.random_message.is_active() && !self.pet.quiet {
                self.restart_message_timer();
            }
        } else {
            self.timers.random_message.stop();
        }
        log::info!("Settings applied");
    }

    pub fn grab(&self) -> Option<Grab> {
        self.grab
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    pub const SCREEN: Screen = Screen { w: 1920.0, h: 1080.0 };
    pub const DT: f32 = 1.0 / 60.0;

    /// A sim with a fixed seed and the pet parked at `pos`.
    pub fn sim_at(pos: Vec2) -> Sim {
        let mut sim = Sim::new(Settings::default(), SCREEN, fastrand::Rng::with_seed(42));
        sim.pet.pos = pos;
        sim.pet.prev_pos = pos;
        sim
    }

    pub fn run(sim: &mut Sim, secs: f32) {
        let ticks = (secs / DT).round() as usize;
        for _ in 0..ticks {
            sim.tick(DT);
        }
    }

    pub fn said(sim: &mut Sim) -> Vec<String> {
        sim.drain_events()
            .filter_map(|e| match e {
                SimEvent::Say { text, .. } => Some(text),
                SimEvent::CheckReminders => None,
            })
            .collect()
    }
}
