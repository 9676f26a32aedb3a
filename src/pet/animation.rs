/// Animation clips the pet sprite can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Clip {
    Dead,
    Fall,
    Hurt,
    Idle,
    Jump,
    Run,
    Slide,
    Walk,
}

impl Clip {
    pub fn frame_count(self) -> u8 {
        match self {
            Clip::Fall | Clip::Jump | Clip::Run => 8,
            Clip::Dead | Clip::Hurt | Clip::Idle | Clip::Slide | Clip::Walk => 10,
        }
    }
}

/// Animation frame data for the pet.
#[derive(Debug, Clone, Copy)]
pub struct AnimationState {
    pub clip: Clip,
    pub frame: u8,
    pub elapsed: f32,
    /// Seconds per frame.
    pub frame_time: f32,
    /// A one-shot clip is playing; looping clips are refused until released.
    locked: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            clip: Clip::Idle,
            frame: 0,
            elapsed: 0.0,
            frame_time: 0.1,
            locked: false,
        }
    }
}

impl AnimationState {
    pub fn new(frame_time: f32) -> Self {
        Self {
            frame_time,
            ..Default::default()
        }
    }

    /// Switch to a looping clip. Ignored while a one-shot is locked.
    /// The frame index only resets when the clip actually changes.
    pub fn set(&mut self, clip: Clip) {
        if self.locked && clip != self.clip && clip != Clip::Dead {
            return;
        }
        if self.clip != clip {
            self.clip = clip;
            self.frame = 0;
            self.elapsed = 0.0;
        }
    }

    /// Start a one-shot clip from its first frame and lock it.
    pub fn play_once(&mut self, clip: Clip) {
        self.clip = clip;
        self.frame = 0;
        self.elapsed = 0.0;
        self.locked = true;
    }

    /// Release a one-shot lock so looping clips can take over again.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Seconds a clip takes to play through once.
    pub fn duration(&self, clip: Clip) -> f32 {
        clip.frame_count() as f32 * self.frame_time
    }

    /// Advance frames. Dead holds on its last frame instead of wrapping.
    pub fn advance(&mut self, dt: f32) {
        if self.frame_time <= 0.0 {
            return;
        }
        self.elapsed += dt;
        let count = self.clip.frame_count();
        while self.elapsed >= self.frame_time {
            self.elapsed -= self.frame_time;
            if self.clip == Clip::Dead && self.frame + 1 >= count {
                self.frame = count - 1;
                self.elapsed = 0.0;
                return;
            }
            self.frame = (self.frame + 1) % count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_clip_wraps() {
        let mut anim = AnimationState::new(0.1);
        anim.set(Clip::Run);
        anim.advance(0.85);
        assert_eq!(anim.frame, 0);
    }

    #[test]
    fn dead_holds_last_frame() {
        let mut anim = AnimationState::new(0.1);
        anim.play_once(Clip::Dead);
        anim.advance(5.0);
        assert_eq!(anim.frame, 9);
        anim.advance(0.3);
        assert_eq!(anim.frame, 9);
    }

    #[test]
    fn one_shot_blocks_looping_clips_but_not_dead() {
        let mut anim = AnimationState::new(0.1);
        anim.play_once(Clip::Hurt);
        anim.set(Clip::Walk);
        assert_eq!(anim.clip, Clip::Hurt);
        anim.set(Clip::Dead);
        assert_eq!(anim.clip, Clip::Dead);
    }

    #[test]
    fn same_clip_keeps_frame() {
        let mut anim = AnimationState::new(0.1);
        anim.set(Clip::Walk);
        anim.advance(0.35);
        let frame = anim.frame;
        anim.set(Clip::Walk);
        assert_eq!(anim.frame, frame);
    }
}
