/// Sim-time countdown. Either repeating (re-arms with its period after firing)
/// or single-shot (disarms after firing).
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    remaining: Option<f32>,
    period: f32,
    repeating: bool,
}

impl Timer {
    /// Repeating timer, not yet armed.
    pub fn repeating() -> Self {
        Self {
            remaining: None,
            period: 0.0,
            repeating: true,
        }
    }

    /// Single-shot timer, not yet armed.
    pub fn once() -> Self {
        Self {
            remaining: None,
            period: 0.0,
            repeating: false,
        }
    }

    /// Arm (or re-arm) the timer to fire after `secs`.
    pub fn start(&mut self, secs: f32) {
        self.period = secs.max(0.0);
        self.remaining = Some(self.period);
    }

    pub fn stop(&mut self) {
        self.remaining = None;
    }

    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds until the next firing, if armed.
    pub fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    /// Advance by `dt`. Returns true on the tick the timer fires.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(left) = self.remaining.as_mut() else {
            return false;
        };
        *left -= dt;
        if *left > 0.0 {
            return false;
        }
        if self.repeating && self.period > 0.0 {
            self.remaining = Some(self.period);
        } else {
            self.remaining = None;
        }
        true
    }
}

/// Every timer the pet simulation owns.
#[derive(Debug, Clone)]
pub struct Timers {
    /// Random behavior decisions.
    pub behavior: Timer,
    /// Ends a random walk.
    pub walk_stop: Timer,
    /// Ends a non-jump one-shot animation (Hurt).
    pub one_shot: Timer,
    /// Restarts the behavior timer with `deferred_delay` after an edge run, slide or jump.
    pub deferred_behavior: Timer,
    pub deferred_delay: f32,
    /// Chance to drop waste near the pet.
    pub waste_spawn: Timer,
    /// Random affectionate message / quote / suggestion.
    pub random_message: Timer,
    /// While quiet, decides whether to wake up.
    pub quiet_check: Timer,
    /// Polls reminders for due entries.
    pub reminder_check: Timer,
}

impl Timers {
    pub fn new() -> Self {
        Self {
            behavior: Timer::repeating(),
            walk_stop: Timer::once(),
            one_shot: Timer::once(),
            deferred_behavior: Timer::once(),
            deferred_delay: 0.0,
            waste_spawn: Timer::repeating(),
            random_message: Timer::repeating(),
            quiet_check: Timer::once(),
            reminder_check: Timer::repeating(),
        }
    }

    /// Restart the behavior timer with `delay` once `after` seconds have passed.
    pub fn defer_behavior(&mut self, after: f32, delay: f32) {
        self.deferred_delay = delay;
        self.deferred_behavior.start(after);
    }
}

/// Uniform random seconds in `[min, max]`.
pub fn secs_between(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.f32() * (max - min)
}
