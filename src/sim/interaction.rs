use glam::Vec2;

use super::behavior::{self, OneShot};
use super::{Grab, Sim};
use crate::bubble::Mood;
use crate::pet::animation::Clip;
use crate::pet::{Activity, Control, Drag, Facing, CLICK_THRESHOLD, DEATH_CLICKS, MOVEMENT_CHANGE_DELAY};
use crate::props::PropKind;

impl Sim {
    // -----------------------------------------------------------------------
    // Pointer
    // -----------------------------------------------------------------------

    /// Left button went down at `at`. The pet is on top of every prop.
    /// Waste is cleaned on the spot; food and the pet are picked up.
    pub fn pointer_down(&mut self, at: Vec2) -> Option<Grab> {
        if self.pet.contains(at) {
            self.press_pet(at);
            self.grab = Some(Grab::Pet);
        } else {
            self.grab = match self.props.hit_test(at) {
                Some((entity, PropKind::Waste)) => {
                    self.props.despawn(entity);
                    log::debug!("Waste cleaned by click");
                    None
                }
                Some((entity, PropKind::Food)) => {
                    let offset = at - self.props.position(entity).unwrap_or(at);
                    Some(Grab::Food { entity, offset })
                }
                None => None,
            };
        }
        self.grab
    }

    pub fn pointer_move(&mut self, cursor: Vec2) {
        match self.grab {
            Some(Grab::Pet) => self.drag_pet(cursor),
            Some(Grab::Food { entity, offset }) => {
                self.props.move_to(entity, cursor - offset, self.screen);
            }
            None => {}
        }
    }

    pub fn pointer_up(&mut self, cursor: Vec2) {
        if let Some(Grab::Pet) = self.grab.take() {
            self.release_pet(cursor);
        }
    }

    fn press_pet(&mut self, at: Vec2) {
        let dead = self.pet.activity.is_dead();
        self.timers.behavior.stop();
        self.timers.walk_stop.stop();
        self.timers.one_shot.stop();
        self.pet.vel = Vec2::ZERO;
        self.pet.food_target = None;
        if !dead {
            self.pet.anim.unlock();
            self.pet.anim.set(Clip::Idle);
        }
        self.pet.activity = Activity::Dragged(Drag {
            grab_offset: at - self.pet.pos,
            pressed_at: at,
            dead,
        });
    }

    fn drag_pet(&mut self, cursor: Vec2) {
        if let Activity::Dragged(drag) = self.pet.activity {
            self.pet.pos = cursor - drag.grab_offset;
            self.pet.prev_pos = self.pet.pos;
        }
    }

    fn release_pet(&mut self, cursor: Vec2) {
        let Activity::Dragged(drag) = self.pet.activity else {
            return;
        };
        self.pet.pos = self.screen.clamp(self.pet.pos);

        if drag.dead {
            self.pet.activity = Activity::Dead;
            self.pet.clicks = 0;
            return;
        }
        self.pet.activity = Activity::Idle;

        let moved = cursor - drag.pressed_at;
        if moved.x.abs() + moved.y.abs() < CLICK_THRESHOLD {
            self.pet.clicks += 1;
            if self.pet.clicks >= DEATH_CLICKS {
                self.pet.clicks = 0;
                self.die();
                return;
            }
            behavior::play_one_shot(self, OneShot::Hurt);
            match self.pet.clicks {
                1 => self.say("Ouch!", Mood::Normal, 2000),
                2 => self.say("Stop it!", Mood::Alert, 2000),
                _ => self.say("You're hurting me!", Mood::Alert, 2000),
            }
        }

        if self.pet.is_auto() && self.props.count(PropKind::Food) == 0 {
            self.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
        if self.pet.food_target.is_none() {
            self.pet.food_target = self.props.first_food();
        }
    }

    // -----------------------------------------------------------------------
    // Knock-out
    // -----------------------------------------------------------------------

    pub fn die(&mut self) {
        self.timers.behavior.stop();
        self.timers.deferred_behavior.stop();
        self.timers.walk_stop.stop();
        self.timers.one_shot.stop();
        self.pet.vel = Vec2::ZERO;
        self.pet.food_target = None;
        self.pet.activity = Activity::Dead;
        self.pet.anim.play_once(Clip::Dead);

        let text = format!("{} is K.O.!", self.settings.pet_name);
        self.say(&text, Mood::Alert, 5000);
        log::info!("{text}");
    }

    pub fn revive(&mut self) {
        if let Some(Grab::Pet) = self.grab {
            self.grab = None;
        }
        self.timers.one_shot.stop();
        self.pet.vel = Vec2::ZERO;
        self.pet.clicks = 0;
        self.pet.food_target = None;
        self.pet.pos = self.screen.clamp(self.pet.pos);
        self.pet.anim.unlock();
        self.pet.halt();
        self.timers.behavior.start(MOVEMENT_CHANGE_DELAY);

        let text = format!("{} is back!", self.settings.pet_name);
        self.say(&text, Mood::Love, 3000);
        log::info!("{text}");
    }

    // -----------------------------------------------------------------------
    // Remote control
    // -----------------------------------------------------------------------

    pub fn open_remote(&mut self) {
        if self.pet.control == Control::Remote {
            return;
        }
        self.pet.control = Control::Remote;
        self.timers.walk_stop.stop();
        if self.pet.activity.is_dead() {
            return;
        }
        self.timers.behavior.stop();
        self.timers.deferred_behavior.stop();
        self.pet.food_target = None;

        match self.pet.activity {
            Activity::Jump => {
                self.pet.anim.unlock();
                self.pet.halt();
            }
            Activity::Walk | Activity::EdgeRun { .. } | Activity::Slide { .. } | Activity::Chase => {
                self.pet.halt();
            }
            _ => self.pet.vel = Vec2::ZERO,
        }
        log::info!("Remote control opened");
    }

    /// Walk in the unit direction `(dx, dy)` at base speed.
    pub fn manual_move(&mut self, dx: f32, dy: f32) {
        if self.pet.control != Control::Remote {
            return;
        }
        if matches!(
            self.pet.activity,
            Activity::Jump | Activity::Slide { .. } | Activity::Hurt | Activity::Dead | Activity::Dragged(_)
        ) {
            return;
        }
        if dx > 0.0 {
            self.pet.facing = Facing::Right;
        } else if dx < 0.0 {
            self.pet.facing = Facing::Left;
        }
        self.pet.vel = Vec2::new(dx, dy) * self.speed();
        if self.pet.is_moving() {
            self.pet.activity = Activity::Walk;
            self.pet.anim.set(Clip::Walk);
        } else {
            self.pet.halt();
        }
    }

    pub fn manual_stop(&mut self) {
        if matches!(
            self.pet.activity,
            Activity::Jump | Activity::Slide { .. } | Activity::Dead | Activity::Dragged(_)
        ) {
            return;
        }
        self.pet.vel = Vec2::ZERO;
        if self.pet.activity == Activity::Walk {
            self.pet.activity = Activity::Idle;
        }
        self.pet.anim.set(Clip::Idle);
    }

    pub fn manual_jump(&mut self) {
        if matches!(
            self.pet.activity,
            Activity::Jump | Activity::Hurt | Activity::Dead | Activity::Dragged(_)
        ) {
            return;
        }
        self.manual_stop();
        behavior::play_one_shot(self, OneShot::Jump);
    }

    pub fn manual_slide(&mut self) {
        if matches!(
            self.pet.activity,
            Activity::Slide { .. } | Activity::Jump | Activity::Hurt | Activity::Dead | Activity::Dragged(_)
        ) {
            return;
        }
        self.manual_stop();
        behavior::start_slide(self);
    }

    pub fn close_remote(&mut self) {
        if self.pet.control == Control::Auto {
            return;
        }
        self.pet.control = Control::Auto;

        let busy = self.pet.activity.is_one_shot() || self.pet.activity.is_dead();
        if !busy && self.props.count(PropKind::Food) == 0 {
            self.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
        if matches!(
            self.pet.activity,
            Activity::Walk | Activity::EdgeRun { .. } | Activity::Slide { .. }
        ) {
            self.pet.halt();
        } else if !busy {
            self.pet.vel = Vec2::ZERO;
        }
        log::info!("Remote control closed");
    }

    // -----------------------------------------------------------------------
    // Props and modes
    // -----------------------------------------------------------------------

    pub fn add_food(&mut self) {
        self.props.spawn_food_random(&mut self.rng, self.screen);
        self.say("Yum! Food!", Mood::Love, 2000);
    }

    pub fn clear_food(&mut self) {
        let n = self.props.clear(PropKind::Food);
        self.pet.food_target = None;
        if let Some(Grab::Food { .. }) = self.grab {
            self.grab = None;
        }
        if self.pet.activity == Activity::Chase {
            self.pet.halt();
            if self.pet.is_auto() {
                self.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
            }
        }
        log::info!("Cleared {n} food");
    }

    /// Drop waste next to the pet.
    /// Drop waste under the pet, or anywhere on screen while it is held.
    pub fn add_waste(&mut self) {
        if let Some(Grab::Pet) = self.grab {
            self.props.spawn_waste_random(&mut self.rng, self.screen);
        } else {
            let center = self.pet.center();
            self.props.spawn_waste_near(center, &mut self.rng, self.screen);
        }
        self.say("Oops... sorry!", Mood::Normal, 2000);
    }

    pub fn clean_waste(&mut self) {
        let n = self.props.clear(PropKind::Waste);
        log::info!("Cleaned {n} waste");
    }

    pub fn toggle_quiet(&mut self) {
        behavior::toggle_quiet(self);
    }

    /// The overlay was shown again after being hidden.
    pub fn on_shown(&mut self) {
        if self.pet.is_auto() && !self.pet.activity.is_dead() && !self.pet.quiet {
            self.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_util::*;

    fn click(sim: &mut Sim, at: Vec2) {
        sim.pointer_down(at);
        sim.pointer_move(at + Vec2::new(1.0, 1.0));
        sim.pointer_up(at + Vec2::new(1.0, 1.0));
    }

    #[test]
    fn clicks_escalate_then_knock_out() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        let on_pet = Vec2::new(560.0, 560.0);

        click(&mut sim, on_pet);
        assert_eq!(sim.pet.activity, Activity::Hurt);
        click(&mut sim, on_pet);
        click(&mut sim, on_pet);
        click(&mut sim, on_pet);
        assert_eq!(sim.pet.clicks, 4);
        assert_eq!(
            said(&mut sim),
            vec!["Ouch!", "Stop it!", "You're hurting me!", "You're hurting me!"]
        );

        click(&mut sim, on_pet);
        assert_eq!(sim.pet.activity, Activity::Dead);
        assert_eq!(sim.pet.clicks, 0);
        assert_eq!(sim.pet.anim.clip, Clip::Dead);
        assert!(!sim.timers.behavior.is_active());
        assert_eq!(said(&mut sim), vec!["Mochi is K.O.!"]);
    }

    #[test]
    fn dragging_moves_without_counting_a_click() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pointer_down(Vec2::new(510.0, 520.0));
        sim.pointer_move(Vec2::new(810.0, 320.0));
        assert_eq!(sim.pet.pos, Vec2::new(800.0, 300.0));
        sim.pointer_up(Vec2::new(810.0, 320.0));

        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.clicks, 0);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
    }

    #[test]
    fn drag_release_is_clamped_on_screen() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pointer_down(Vec2::new(510.0, 510.0));
        sim.pointer_move(Vec2::new(5000.0, -300.0));
        sim.pointer_up(Vec2::new(5000.0, -300.0));
        assert_eq!(sim.pet.pos, Vec2::new(SCREEN.max_x(), 0.0));
    }

    #[test]
    fn dead_pet_can_be_moved_but_stays_dead() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pet.clicks = 3;
        sim.die();
        sim.pet.clicks = 3;
        sim.pointer_down(Vec2::new(510.0, 510.0));
        sim.pointer_move(Vec2::new(710.0, 510.0));
        sim.pointer_up(Vec2::new(710.0, 510.0));
        assert_eq!(sim.pet.activity, Activity::Dead);
        assert_eq!(sim.pet.clicks, 0);
        assert_eq!(sim.pet.pos.x, 700.0);
        assert_eq!(sim.pet.anim.clip, Clip::Dead);
    }

    #[test]
    fn revive_resets_everything() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.die();
        sim.pet.clicks = 2;
        said(&mut sim);
        sim.revive();
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.clicks, 0);
        assert!(!sim.pet.anim.is_locked());
        assert_eq!(sim.pet.anim.clip, Clip::Idle);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
        assert_eq!(said(&mut sim), vec!["Mochi is back!"]);
    }

    #[test]
    fn release_targets_first_food() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        let first = sim.props.spawn_food_at(Vec2::new(100.0, 100.0), SCREEN);
        sim.props.spawn_food_at(Vec2::new(600.0, 600.0), SCREEN);
        sim.pointer_down(Vec2::new(510.0, 510.0));
        sim.pointer_move(Vec2::new(910.0, 510.0));
        sim.pointer_up(Vec2::new(910.0, 510.0));
        assert_eq!(sim.pet.food_target, Some(first));
        assert!(!sim.timers.behavior.is_active());
    }

    #[test]
    fn waste_dropped_while_held_lands_anywhere() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        let mut views = Vec::new();
        sim.add_waste();
        sim.props.views(&mut views);
        assert!(views[0].pos.distance(sim.pet.center()) < 60.0);

        sim.props.clear(PropKind::Waste);
        sim.pointer_down(Vec2::new(510.0, 510.0));
        for _ in 0..20 {
            sim.add_waste();
        }
        sim.props.views(&mut views);
        assert_eq!(views.len(), 20);
        let center = sim.pet.center();
        assert!(views.iter().any(|v| v.pos.distance(center) > 100.0));
    }

    #[test]
    fn clicking_waste_cleans_it_and_food_can_be_dragged() {
        let mut sim = sim_at(Vec2::new(1500.0, 800.0));
        sim.props.spawn_waste_at(Vec2::new(100.0, 100.0), SCREEN);
        assert_eq!(sim.pointer_down(Vec2::new(110.0, 110.0)), None);
        assert_eq!(sim.props.count(PropKind::Waste), 0);

        let food = sim.props.spawn_food_at(Vec2::new(300.0, 300.0), SCREEN);
        let grab = sim.pointer_down(Vec2::new(310.0, 320.0));
        assert!(matches!(grab, Some(Grab::Food { .. })));
        sim.pointer_move(Vec2::new(410.0, 420.0));
        sim.pointer_up(Vec2::new(410.0, 420.0));
        assert_eq!(sim.props.position(food), Some(Vec2::new(400.0, 400.0)));
        assert_eq!(sim.grab(), None);
    }

    #[test]
    fn remote_session() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.timers.behavior.start(10.0);
        sim.pet.activity = Activity::EdgeRun { target: Vec2::ZERO };
        sim.pet.vel = Vec2::new(-300.0, -300.0);

        sim.open_remote();
        assert_eq!(sim.pet.control, Control::Remote);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.vel, Vec2::ZERO);
        assert!(!sim.timers.behavior.is_active());

        sim.manual_move(-1.0, 0.0);
        assert_eq!(sim.pet.activity, Activity::Walk);
        assert_eq!(sim.pet.vel, Vec2::new(-180.0, 0.0));
        assert_eq!(sim.pet.facing, Facing::Left);
        run(&mut sim, 1.0);
        assert!((sim.pet.pos.x - 320.0).abs() < 0.5);

        sim.manual_stop();
        assert_eq!(sim.pet.activity, Activity::Idle);

        sim.manual_jump();
        assert_eq!(sim.pet.activity, Activity::Jump);
        sim.manual_move(1.0, 0.0);
        assert_eq!(sim.pet.activity, Activity::Jump);

        run(&mut sim, 3.0);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert!(!sim.timers.behavior.is_active());

        sim.close_remote();
        assert_eq!(sim.pet.control, Control::Auto);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
    }

    #[test]
    fn manual_move_needs_remote() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.manual_move(1.0, 0.0);
        assert_eq!(sim.pet.activity, Activity::Idle);
    }

    #[test]
    fn food_and_waste_commands() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.add_food();
        sim.add_food();
        sim.add_waste();
        assert_eq!(sim.props.count(PropKind::Food), 2);
        assert_eq!(sim.props.count(PropKind::Waste), 1);
        assert_eq!(said(&mut sim), vec!["Yum! Food!", "Yum! Food!", "Oops... sorry!"]);

        sim.tick(DT);
        assert_eq!(sim.pet.activity, Activity::Chase);
        sim.clear_food();
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.food_target, None);
        assert!(sim.timers.behavior.is_active());

        sim.clean_waste();
        assert_eq!(sim.props.count(PropKind::Waste), 0);
    }
}
