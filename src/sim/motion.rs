use glam::Vec2;

use super::Sim;
use crate::bubble::Mood;
use crate::pet::animation::Clip;
use crate::pet::{
    Activity, EAT_DISTANCE, GRAVITY, MOVEMENT_CHANGE_DELAY, RUN_MULTIPLIER, STILL_SPEED,
};
use crate::props::PropKind;

/// Edge runs end within this many pixels of their target on both axes.
const EDGE_ARRIVE: f32 = 10.0;

/// Integrate one tick of pet movement and settle the activity it leads to.
pub fn step(sim: &mut Sim, dt: f32) {
    match sim.pet.activity {
        Activity::Dead | Activity::Dragged(_) => return,
        Activity::Jump => {
            jump(sim, dt);
            return;
        }
        Activity::Hurt => return,
        _ => {}
    }

    chase_food(sim);

    sim.pet.pos += sim.pet.vel * dt;

    match sim.pet.activity {
        Activity::Slide { target } => slide(sim, target),
        Activity::EdgeRun { target } => edge_run(sim, target),
        _ => roam(sim),
    }

    sim.pet.update_facing();
}

/// Ballistic arc; landing on the ground ends the jump.
fn jump(sim: &mut Sim, dt: f32) {
    let ground = sim.screen.ground();
    let pet = &mut sim.pet;

    pet.vel.y += GRAVITY * dt;
    pet.pos.y += pet.vel.y * dt;
    if pet.vel.y > 0.0 && pet.anim.clip == Clip::Jump {
        pet.anim.play_once(Clip::Fall);
    }

    // Ceiling
    if pet.pos.y < 0.0 {
        pet.pos.y = 0.0;
        pet.vel.y = pet.vel.y.max(0.0);
    }

    if pet.pos.y >= ground {
        pet.pos.y = ground;
        pet.vel.y = 0.0;
        pet.activity = Activity::Idle;
        pet.anim.unlock();
        pet.anim.set(Clip::Idle);
        if pet.is_auto() {
            sim.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
    }

    let pet = &mut sim.pet;
    pet.pos.x = (pet.pos.x + pet.vel.x * dt).clamp(0.0, sim.screen.max_x());
    pet.update_facing();
}

/// Steer toward the nearest food while autonomous, and eat it on arrival.
fn chase_food(sim: &mut Sim) {
    if !sim.pet.is_auto() {
        return;
    }
    if !matches!(
        sim.pet.activity,
        Activity::Idle | Activity::Walk | Activity::EdgeRun { .. } | Activity::Chase
    ) {
        return;
    }

    let target_alive = sim
        .pet
        .food_target
        .is_some_and(|food| sim.props.is_alive(food));
    if !target_alive {
        sim.pet.food_target = sim.props.closest_food(sim.pet.center());
    }

    let Some(food) = sim.pet.food_target else {
        if sim.pet.activity == Activity::Chase {
            // Food vanished under us
            sim.pet.halt();
            sim.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
        return;
    };
    let Some(food_center) = sim.props.center(food) else {
        return;
    };

    let to_food = food_center - sim.pet.center();
    let dist = to_food.length();

    if dist < EAT_DISTANCE {
        sim.props.despawn(food);
        sim.pet.food_target = None;
        sim.pet.halt();
        sim.say("Yum! Delicious!", Mood::Love, 2000);
        log::debug!("Ate food, {} left", sim.props.count(PropKind::Food));
        if sim.props.count(PropKind::Food) == 0 {
            sim.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
    } else {
        sim.timers.behavior.stop();
        sim.pet.vel = to_food / dist * sim.speed() * RUN_MULTIPLIER;
        sim.pet.activity = Activity::Chase;
        sim.pet.anim.set(Clip::Run);
    }
}

fn axis_reached(pos: f32, vel: f32, target: f32) -> bool {
    (vel > 0.0 && pos >= target) || (vel < 0.0 && pos <= target) || vel.abs() < STILL_SPEED
}

fn slide(sim: &mut Sim, target: Vec2) {
    let pet = &mut sim.pet;
    let reached_x = axis_reached(pet.pos.x, pet.vel.x, target.x);
    let reached_y = axis_reached(pet.pos.y, pet.vel.y, target.y);

    if reached_x && (pet.vel.y == 0.0 || reached_y) {
        pet.pos.x = target.x;
        if pet.vel.y != 0.0 {
            pet.pos.y = target.y;
        }
        pet.pos = sim.screen.clamp(pet.pos);
        pet.halt();
        if pet.is_auto() && pet.food_target.is_none() {
            sim.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
    } else {
        pet.pos = sim.screen.clamp(pet.pos);
        pet.anim.set(Clip::Slide);
    }
}

fn edge_run(sim: &mut Sim, target: Vec2) {
    let max_x = sim.screen.max_x();
    let ground = sim.screen.ground();
    let pet = &mut sim.pet;
    pet.pos = sim.screen.clamp(pet.pos);

    let arrived = (pet.pos.x - target.x).abs() < EDGE_ARRIVE
        && (pet.pos.y - target.y).abs() < EDGE_ARRIVE;
    // Any boundary contact ends the run, whichever way the pet is heading
    let hit_wall =
        pet.pos.x <= 0.0 || pet.pos.x >= max_x || pet.pos.y <= 0.0 || pet.pos.y >= ground;

    if arrived || hit_wall {
        pet.halt();
        if pet.is_auto() && pet.food_target.is_none() {
            sim.timers.behavior.start(MOVEMENT_CHANGE_DELAY);
        }
    } else {
        pet.anim.set(Clip::Run);
    }
}

/// Idle, walk, chase and remote walking: clamp, bounce when wandering.
fn roam(sim: &mut Sim) {
    let max_x = sim.screen.max_x();
    let ground = sim.screen.ground();
    let pet = &mut sim.pet;
    let bounce = pet.is_auto() && pet.food_target.is_none();

    if pet.pos.x < 0.0 || pet.pos.x > max_x {
        pet.pos.x = pet.pos.x.clamp(0.0, max_x);
        if bounce {
            pet.vel.x = -pet.vel.x;
        }
    }
    if pet.pos.y < 0.0 || pet.pos.y > ground {
        pet.pos.y = pet.pos.y.clamp(0.0, ground);
        if bounce {
            pet.vel.y = -pet.vel.y;
        }
    }

    match pet.activity {
        Activity::Chase => pet.anim.set(Clip::Run),
        Activity::Idle | Activity::Walk => {
            if pet.is_moving() {
                pet.activity = Activity::Walk;
                pet.anim.set(Clip::Walk);
            } else {
                pet.activity = Activity::Idle;
                pet.anim.set(Clip::Idle);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{Control, Facing, JUMP_VELOCITY};
    use crate::sim::test_util::*;

    #[test]
    fn dead_and_dragged_pets_do_not_move() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pet.vel = Vec2::new(100.0, 0.0);
        sim.pet.activity = Activity::Dead;
        step(&mut sim, DT);
        assert_eq!(sim.pet.pos, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn jump_lands_on_ground_and_reschedules() {
        let ground = SCREEN.ground();
        let mut sim = sim_at(Vec2::new(500.0, ground));
        sim.pet.activity = Activity::Jump;
        sim.pet.anim.play_once(Clip::Jump);
        sim.pet.vel.y = -JUMP_VELOCITY;

        let mut peak = ground;
        let mut fell = false;
        for _ in 0..120 {
            step(&mut sim, DT);
            peak = peak.min(sim.pet.pos.y);
            if sim.pet.activity != Activity::Jump {
                break;
            }
            fell |= sim.pet.anim.clip == Clip::Fall;
        }
        assert!(fell, "descent should play the fall clip");
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.pos.y, ground);
        assert!(ground - peak > 100.0, "jump too low: {}", ground - peak);
        assert!(!sim.pet.anim.is_locked());
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
    }

    #[test]
    fn jump_near_top_hits_ceiling() {
        let mut sim = sim_at(Vec2::new(500.0, 20.0));
        sim.pet.activity = Activity::Jump;
        sim.pet.vel.y = -JUMP_VELOCITY;
        for _ in 0..10 {
            step(&mut sim, DT);
            assert!(sim.pet.pos.y >= 0.0);
        }
    }

    #[test]
    fn chases_and_eats_food() {
        let mut sim = sim_at(Vec2::new(100.0, 500.0));
        sim.timers.behavior.start(10.0);
        let food = sim.props.spawn_food_at(Vec2::new(600.0, 540.0), SCREEN);

        step(&mut sim, DT);
        assert_eq!(sim.pet.activity, Activity::Chase);
        assert_eq!(sim.pet.food_target, Some(food));
        assert_eq!(sim.pet.anim.clip, Clip::Run);
        assert!(!sim.timers.behavior.is_active());
        assert_eq!(sim.pet.facing, Facing::Right);

        for _ in 0..600 {
            step(&mut sim, DT);
            if sim.pet.activity == Activity::Idle {
                break;
            }
        }
        assert!(!sim.props.is_alive(food));
        assert_eq!(sim.pet.food_target, None);
        assert_eq!(sim.pet.vel, Vec2::ZERO);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
        assert_eq!(said(&mut sim), vec!["Yum! Delicious!".to_string()]);
    }

    #[test]
    fn remote_control_ignores_food() {
        let mut sim = sim_at(Vec2::new(100.0, 500.0));
        sim.pet.control = Control::Remote;
        sim.props.spawn_food_at(Vec2::new(600.0, 540.0), SCREEN);
        step(&mut sim, DT);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.food_target, None);
    }

    #[test]
    fn vanished_food_ends_chase() {
        let mut sim = sim_at(Vec2::new(100.0, 500.0));
        let food = sim.props.spawn_food_at(Vec2::new(600.0, 540.0), SCREEN);
        step(&mut sim, DT);
        sim.props.despawn(food);
        step(&mut sim, DT);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.vel, Vec2::ZERO);
        assert!(sim.timers.behavior.is_active());
    }

    #[test]
    fn slide_snaps_to_target() {
        let mut sim = sim_at(Vec2::new(500.0, 300.0));
        let target = Vec2::new(700.0, 300.0);
        sim.pet.activity = Activity::Slide { target };
        sim.pet.vel = Vec2::new(270.0, 0.0);
        for _ in 0..120 {
            step(&mut sim, DT);
            if sim.pet.activity == Activity::Idle {
                break;
            }
        }
        assert_eq!(sim.pet.pos, target);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));
    }

    #[test]
    fn edge_run_in_open_space_reaches_its_target() {
        let mut sim = sim_at(Vec2::new(500.0, 400.0));
        let target = Vec2::new(1000.0, 400.0);
        sim.pet.activity = Activity::EdgeRun { target };
        sim.pet.vel = Vec2::new(450.0, 0.0);

        step(&mut sim, DT);
        assert!(matches!(sim.pet.activity, Activity::EdgeRun { .. }));

        for _ in 0..200 {
            step(&mut sim, DT);
            if sim.pet.activity == Activity::Idle {
                break;
            }
        }
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert!((sim.pet.pos.x - 1000.0).abs() < EDGE_ARRIVE);
    }

    #[test]
    fn edge_run_ends_when_touching_a_wall() {
        // Running up the left wall toward the top corner
        let mut sim = sim_at(Vec2::new(0.0, 400.0));
        sim.pet.activity = Activity::EdgeRun { target: Vec2::ZERO };
        sim.pet.vel = Vec2::new(0.0, -450.0);
        step(&mut sim, DT);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.vel, Vec2::ZERO);
        assert_eq!(sim.timers.behavior.remaining(), Some(MOVEMENT_CHANGE_DELAY));

        // Running along the ground
        let ground = SCREEN.ground();
        let mut sim = sim_at(Vec2::new(500.0, ground));
        sim.pet.activity = Activity::EdgeRun {
            target: Vec2::new(1000.0, ground),
        };
        sim.pet.vel = Vec2::new(450.0, 0.0);
        step(&mut sim, DT);
        assert_eq!(sim.pet.activity, Activity::Idle);
    }

    #[test]
    fn wandering_pet_bounces_off_walls() {
        let mut sim = sim_at(Vec2::new(1.0, 500.0));
        sim.pet.activity = Activity::Walk;
        sim.pet.vel = Vec2::new(-180.0, 0.0);
        step(&mut sim, DT);
        assert_eq!(sim.pet.pos.x, 0.0);
        assert_eq!(sim.pet.vel.x, 180.0);
        assert_eq!(sim.pet.anim.clip, Clip::Walk);
    }

    #[test]
    fn remote_walk_stops_at_walls_without_bouncing() {
        let mut sim = sim_at(Vec2::new(1.0, 500.0));
        sim.pet.control = Control::Remote;
        sim.pet.activity = Activity::Walk;
        sim.pet.vel = Vec2::new(-180.0, 0.0);
        step(&mut sim, DT);
        assert_eq!(sim.pet.pos.x, 0.0);
        assert_eq!(sim.pet.vel.x, -180.0);
        assert_eq!(sim.pet.facing, Facing::Left);
    }
}
