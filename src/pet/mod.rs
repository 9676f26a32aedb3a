pub mod animation;

use glam::Vec2;

use self::animation::{AnimationState, Clip};

/// Sprite box edge length in pixels. `Pet::pos` is its top-left corner.
pub const SPRITE_SIZE: f32 = 120.0;
/// Run speed relative to the base movement speed (edge runs, food chase).
pub const RUN_MULTIPLIER: f32 = 2.5;
/// Slide speed relative to the base movement speed.
pub const SLIDE_MULTIPLIER: f32 = 1.5;
/// Downward acceleration while jumping, px/s².
pub const GRAVITY: f32 = 2880.0;
/// Upward launch speed of a jump, px/s.
pub const JUMP_VELOCITY: f32 = 900.0;
/// Press-to-release manhattan distance under which a drag counts as a click.
pub const CLICK_THRESHOLD: f32 = 5.0;
/// Clicks that knock the pet out.
pub const DEATH_CLICKS: u8 = 5;
/// Pause before the behavior scheduler picks again after most actions.
pub const MOVEMENT_CHANGE_DELAY: f32 = 3.0;
/// Center-to-center distance at which food gets eaten.
pub const EAT_DISTANCE: f32 = 30.0;
/// Below this speed (px/s) an axis counts as stationary.
pub const STILL_SPEED: f32 = 6.0;

/// Screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub w: f32,
    pub h: f32,
}

impl Screen {
    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    /// Rightmost x for the sprite's top-left corner.
    pub fn max_x(&self) -> f32 {
        (self.w - SPRITE_SIZE).max(0.0)
    }

    /// Lowest y for the sprite's top-left corner.
    pub fn ground(&self) -> f32 {
        (self.h - SPRITE_SIZE).max(0.0)
    }

    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(0.0, self.max_x()), pos.y.clamp(0.0, self.ground()))
    }
}

/// Grab state while the user holds the pet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Cursor position minus pet position at press time.
    pub grab_offset: Vec2,
    pub pressed_at: Vec2,
    /// The pet was knocked out when picked up and stays that way.
    pub dead: bool,
}

/// What the pet is doing. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Idle,
    Walk,
    /// Running toward a point on a screen edge.
    EdgeRun { target: Vec2 },
    /// Running toward the targeted food.
    Chase,
    Jump,
    Slide { target: Vec2 },
    Hurt,
    Dead,
    Dragged(Drag),
}

impl Activity {
    pub fn is_dead(&self) -> bool {
        matches!(self, Activity::Dead | Activity::Dragged(Drag { dead: true, .. }))
    }

    /// A one-shot clip is playing.
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Activity::Jump | Activity::Hurt)
    }
}

/// Who drives the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Auto,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// The pet's physical and behavioral state.
#[derive(Debug, Clone)]
pub struct Pet {
    pub pos: Vec2,
    /// Position at the start of the last tick, for render interpolation.
    pub prev_pos: Vec2,
    /// Pixels per second.
    pub vel: Vec2,
    pub facing: Facing,
    pub anim: AnimationState,
    pub activity: Activity,
    pub control: Control,
    pub quiet: bool,
    pub clicks: u8,
    pub food_target: Option<hecs::Entity>,
}

impl Pet {
    pub fn new(pos: Vec2, frame_time: f32) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            facing: Facing::Right,
            anim: AnimationState::new(frame_time),
            activity: Activity::Idle,
            control: Control::Auto,
            quiet: false,
            clicks: 0,
            food_target: None,
        }
    }

    /// Random spawn point at least 100 px from the top-left edges.
    pub fn spawn_point(rng: &mut fastrand::Rng, screen: Screen) -> Vec2 {
        let max_x = (screen.max_x() - 100.0).max(200.0);
        let max_y = (screen.ground() - 100.0).max(200.0);
        let p = Vec2::new(
            100.0 + rng.f32() * (max_x - 100.0),
            100.0 + rng.f32() * (max_y - 100.0),
        );
        screen.clamp(p)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(SPRITE_SIZE / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.x < self.pos.x + SPRITE_SIZE
            && point.y >= self.pos.y
            && point.y < self.pos.y + SPRITE_SIZE
    }

    pub fn is_auto(&self) -> bool {
        self.control == Control::Auto
    }

    /// Zero velocity and fall back to Idle.
    pub fn halt(&mut self) {
        self.vel = Vec2::ZERO;
        self.activity = Activity::Idle;
        self.anim.set(Clip::Idle);
    }

    /// Face the direction of horizontal travel.
    pub fn update_facing(&mut self) {
        if self.vel.x > 0.0 {
            self.facing = Facing::Right;
        } else if self.vel.x < 0.0 {
            self.facing = Facing::Left;
        }
    }

    pub fn is_moving(&self) -> bool {
        self.vel.x.abs() > STILL_SPEED || self.vel.y.abs() > STILL_SPEED
    }
}
