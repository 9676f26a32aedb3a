use glam::Vec2;

/// Press/release edge of a polled button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
    Held,
    Up,
}

/// Turns raw "is it down" polling into edges.
#[derive(Debug, Default)]
pub struct ButtonEdge {
    was_down: bool,
}

impl ButtonEdge {
    pub fn update(&mut self, down: bool) -> Edge {
        let edge = match (self.was_down, down) {
            (false, true) => Edge::Pressed,
            (true, false) => Edge::Released,
            (true, true) => Edge::Held,
            (false, false) => Edge::Up,
        };
        self.was_down = down;
        edge
    }

    /// True only on the frame the button goes down.
    pub fn pressed(&mut self, down: bool) -> bool {
        self.update(down) == Edge::Pressed
    }
}

/// What the left button did this frame, with the cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

/// Left-button pointer tracking. Moves are reported only while held.
#[derive(Debug, Default)]
pub struct Pointer {
    button: ButtonEdge,
    last_pos: Vec2,
    /// The current press started over a panel and belongs to it.
    suppressed: bool,
}

impl Pointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one poll. `blocked` suppresses new presses (cursor over a panel)
    /// but never swallows the release of a press already in progress.
    pub fn update(&mut self, pos: Vec2, left_down: bool, blocked: bool) -> Option<PointerEvent> {
        let moved = pos != self.last_pos;
        self.last_pos = pos;
        match self.button.update(left_down) {
            Edge::Pressed => {
                self.suppressed = blocked;
                (!blocked).then_some(PointerEvent::Down(pos))
            }
            Edge::Held if moved && !self.suppressed => Some(PointerEvent::Move(pos)),
            Edge::Released => {
                let owned = !std::mem::take(&mut self.suppressed);
                owned.then_some(PointerEvent::Up(pos))
            }
            _ => None,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.last_pos
    }
}

/// Remote-control steering. Reports a change whenever the held direction
/// changes; a zero direction means "stop".
#[derive(Debug, Default)]
pub struct Steering {
    last: Vec2,
}

impl Steering {
    pub fn update(&mut self, dir: Vec2) -> Option<Vec2> {
        let dir = dir.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        if dir == self.last {
            return None;
        }
        self.last = dir;
        Some(dir)
    }

    pub fn reset(&mut self) {
        self.last = Vec2::ZERO;
    }
}

/// Direction from four held keys or buttons.
pub fn direction(left: bool, right: bool, up: bool, down: bool) -> Vec2 {
    let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
    Vec2::new(axis(left, right), axis(up, down))
}
