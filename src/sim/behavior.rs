use std::f32::consts::TAU;

use glam::Vec2;

use super::Sim;
use crate::bubble::Mood;
use crate::pet::animation::Clip;
use crate::pet::{Activity, JUMP_VELOCITY, RUN_MULTIPLIER, SLIDE_MULTIPLIER};
use crate::schedule::secs_between;

/// Roll thresholds for the behavior scheduler, cumulative.
const IDLE_ROLL: f32 = 0.60;
const WALK_ROLL: f32 = 0.75;
const EDGE_RUN_ROLL: f32 = 0.85;
const SLIDE_ROLL: f32 = 0.92;

/// Idle pauses, one range picked uniformly.
const IDLE_RANGES: [(f32, f32); 3] = [(30.0, 60.0), (60.0, 120.0), (120.0, 300.0)];

/// Horizontal slides travel at least this far.
const SLIDE_MIN_DISTANCE: f32 = 100.0;

/// Chance per quiet check that the pet gets up on its own.
const WAKE_CHANCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    Jump,
    Hurt,
}

/// Behavior timer fired: roll the next thing to do.
pub fn decide(sim: &mut Sim) {
    let pet = &sim.pet;
    let busy = pet.activity.is_one_shot()
        || pet.activity.is_dead()
        || matches!(pet.activity, Activity::Slide { .. } | Activity::Dragged(_))
        || !pet.is_auto()
        || pet.food_target.is_some()
        || pet.quiet;
    if busy {
        return;
    }

    let roll = sim.rng.f32();
    let speed = sim.speed();

    if roll < IDLE_ROLL {
        sim.pet.halt();
        let (min, max) = IDLE_RANGES[sim.rng.usize(..IDLE_RANGES.len())];
        let delay = secs_between(&mut sim.rng, min, max);
        sim.timers.behavior.start(delay);
        log::debug!("Resting for {delay:.0}s");
    } else if roll < WALK_ROLL {
        let angle = sim.rng.f32() * TAU;
        let magnitude = speed * secs_between(&mut sim.rng, 0.5, 1.0);
        sim.pet.vel = Vec2::from_angle(angle) * magnitude;
        sim.pet.activity = Activity::Walk;
        sim.pet.anim.set(Clip::Walk);

        let walk_for = secs_between(&mut sim.rng, 3.0, 8.0);
        sim.timers.walk_stop.start(walk_for);
        let delay = secs_between(&mut sim.rng, 20.0, 90.0);
        sim.timers.behavior.start(delay);
        log::debug!("Walking for {walk_for:.1}s");
    } else if roll < EDGE_RUN_ROLL {
        start_edge_run(sim);
        let delay = secs_between(&mut sim.rng, 45.0, 180.0);
        sim.timers.defer_behavior(10.0, delay);
    } else if roll < SLIDE_ROLL {
        start_slide(sim);
        let delay = secs_between(&mut sim.rng, 30.0, 120.0);
        sim.timers.defer_behavior(8.0, delay);
    } else {
        play_one_shot(sim, OneShot::Jump);
        let delay = secs_between(&mut sim.rng, 25.0, 90.0);
        sim.timers.defer_behavior(5.0, delay);
    }
}

/// Walk-stop timer fired. Only an ongoing autonomous walk is stopped.
pub fn stop_walking(sim: &mut Sim) {
    if sim.pet.activity == Activity::Walk && sim.pet.is_auto() {
        sim.pet.halt();
    }
}

/// Head for a random point on a random screen edge. Returns false if already there.
pub fn start_edge_run(sim: &mut Sim) -> bool {
    let max_x = sim.screen.max_x();
    let ground = sim.screen.ground();
    let rng = &mut sim.rng;

    let target = match rng.u8(0..4) {
        0 => Vec2::new(rng.f32() * max_x, 0.0),
        1 => Vec2::new(rng.f32() * max_x, ground),
        2 => Vec2::new(0.0, rng.f32() * ground),
        _ => Vec2::new(max_x, rng.f32() * ground),
    };

    let to_target = target - sim.pet.pos;
    let dist = to_target.length();
    if dist < 1.0 {
        return false;
    }

    sim.pet.vel = to_target / dist * sim.speed() * RUN_MULTIPLIER;
    sim.pet.activity = Activity::EdgeRun { target };
    sim.pet.anim.set(Clip::Run);
    log::debug!("Edge run to {target}");
    true
}

/// Slide sideways or diagonally down. Returns false if there is no room.
pub fn start_slide(sim: &mut Sim) -> bool {
    let max_x = sim.screen.max_x();
    let ground = sim.screen.ground();
    let pos = sim.pet.pos;
    let rng = &mut sim.rng;

    let target = if rng.bool() {
        // Horizontal: anywhere at least SLIDE_MIN_DISTANCE away
        let right = (pos.x + SLIDE_MIN_DISTANCE, max_x);
        let left = (0.0, pos.x - SLIDE_MIN_DISTANCE);
        let right_len = (right.1 - right.0).max(0.0);
        let left_len = (left.1 - left.0).max(0.0);
        let total = right_len + left_len;
        let x = if total <= 0.0 {
            pos.x
        } else {
            let u = rng.f32() * total;
            if u < right_len {
                right.0 + u
            } else {
                left.0 + (u - right_len)
            }
        };
        Vec2::new(x, pos.y)
    } else {
        // Diagonal down
        let min_y = pos.y + 50.0;
        let y = if min_y < ground {
            secs_between(rng, min_y, ground)
        } else {
            pos.y
        };
        let x = (pos.x + secs_between(rng, -100.0, 100.0)).clamp(0.0, max_x);
        Vec2::new(x, y)
    };

    let to_target = target - pos;
    let dist = to_target.length();
    if dist < 1.0 {
        return false;
    }

    sim.pet.vel = to_target / dist * sim.speed() * SLIDE_MULTIPLIER;
    sim.pet.activity = Activity::Slide { target };
    sim.pet.anim.set(Clip::Slide);
    log::debug!("Slide to {target}");
    true
}

/// Play a jump or a hurt flinch. Ignored while knocked out.
pub fn play_one_shot(sim: &mut Sim, kind: OneShot) {
    if sim.pet.activity.is_dead() {
        return;
    }
    sim.timers.behavior.stop();
    sim.timers.walk_stop.stop();
    sim.pet.vel.x = 0.0;

    match kind {
        OneShot::Jump => {
            sim.pet.vel.y = -JUMP_VELOCITY;
            sim.pet.activity = Activity::Jump;
            sim.pet.anim.play_once(Clip::Jump);
        }
        OneShot::Hurt => {
            sim.pet.vel.y = 0.0;
            sim.pet.activity = Activity::Hurt;
            sim.pet.anim.play_once(Clip::Hurt);
            let secs = sim.pet.anim.duration(Clip::Hurt);
            sim.timers.one_shot.start(secs);
        }
    }
}

/// One-shot timer fired: the flinch is over.
pub fn finish_one_shot(sim: &mut Sim) {
    if sim.pet.activity != Activity::Hurt {
        return;
    }
    sim.pet.anim.unlock();
    sim.pet.halt();
    if sim.pet.is_auto() && sim.pet.food_target.is_none() {
        let delay = secs_between(&mut sim.rng, 20.0, 120.0);
        sim.timers.behavior.start(delay);
    }
}

/// Enter or leave quiet mode.
pub fn toggle_quiet(sim: &mut Sim) {
    if sim.pet.quiet {
        resume(sim);
        sim.say("I'm back to my business!", Mood::Love, 2000);
        return;
    }

    sim.pet.quiet = true;
    sim.timers.behavior.stop();
    sim.timers.deferred_behavior.stop();
    sim.timers.walk_stop.stop();
    sim.timers.random_message.stop();
    sim.timers.waste_spawn.stop();

    if matches!(
        sim.pet.activity,
        Activity::Walk | Activity::EdgeRun { .. } | Activity::Slide { .. } | Activity::Chase
    ) {
        sim.pet.halt();
    }
    sim.pet.vel.x = 0.0;
    if sim.pet.activity != Activity::Jump {
        sim.pet.vel.y = 0.0;
    }

    sim.say("Quiet mode on. Time for a little rest...", Mood::Info, 4000);
    let check = secs_between(&mut sim.rng, 30.0, 60.0);
    sim.timers.quiet_check.start(check);
    log::info!("Quiet mode on");
}

/// Quiet check fired: maybe get up, otherwise look again later.
pub fn check_quiet(sim: &mut Sim) {
    if !sim.pet.quiet {
        return;
    }
    if sim.rng.f32() < WAKE_CHANCE {
        resume(sim);
    } else {
        let again = secs_between(&mut sim.rng, 60.0, 180.0);
        sim.timers.quiet_check.start(again);
    }
}

/// Leave quiet mode with long initial delays.
pub fn resume(sim: &mut Sim) {
    sim.pet.quiet = false;
    sim.timers.quiet_check.stop();
    if !sim.pet.activity.is_dead() {
        let behavior = secs_between(&mut sim.rng, 30.0, 120.0);
        sim.timers.behavior.start(behavior);
        if sim.settings.random_messages_enabled {
            let message = secs_between(&mut sim.rng, 300.0, 1800.0);
            sim.timers.random_message.start(message);
        }
        let waste = secs_between(&mut sim.rng, 120.0, 300.0);
        sim.timers.waste_spawn.start(waste);
    }
    log::info!("Quiet mode off");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::Control;
    use crate::sim::test_util::*;

    #[test]
    fn busy_pet_skips_decision() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pet.quiet = true;
        decide(&mut sim);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert!(!sim.timers.behavior.is_active());

        sim.pet.quiet = false;
        sim.pet.control = Control::Remote;
        decide(&mut sim);
        assert!(!sim.timers.behavior.is_active());
    }

    #[test]
    fn decisions_cover_every_branch_with_expected_delays() {
        let mut seen_idle = false;
        let mut seen_walk = false;
        let mut seen_edge = false;
        let mut seen_slide = false;
        let mut seen_jump = false;

        for seed in 0..400 {
            let mut sim = sim_at(Vec2::new(800.0, 400.0));
            sim.rng = fastrand::Rng::with_seed(seed);
            decide(&mut sim);
            match sim.pet.activity {
                Activity::Idle => {
                    seen_idle = true;
                    let d = sim.timers.behavior.remaining().unwrap();
                    assert!((30.0..=300.0).contains(&d));
                }
                Activity::Walk => {
                    seen_walk = true;
                    let speed = sim.pet.vel.length();
                    assert!(speed >= 90.0 - 0.01 && speed <= 180.0 + 0.01);
                    let stop = sim.timers.walk_stop.remaining().unwrap();
                    assert!((3.0..=8.0).contains(&stop));
                    let d = sim.timers.behavior.remaining().unwrap();
                    assert!((20.0..=90.0).contains(&d));
                }
                Activity::EdgeRun { .. } => {
                    seen_edge = true;
                    assert_eq!(sim.timers.deferred_behavior.remaining(), Some(10.0));
                    assert!((45.0..=180.0).contains(&sim.timers.deferred_delay));
                }
                Activity::Slide { .. } => {
                    seen_slide = true;
                    assert_eq!(sim.timers.deferred_behavior.remaining(), Some(8.0));
                    assert!((30.0..=120.0).contains(&sim.timers.deferred_delay));
                }
                Activity::Jump => {
                    seen_jump = true;
                    assert_eq!(sim.pet.vel.y, -JUMP_VELOCITY);
                    assert_eq!(sim.timers.deferred_behavior.remaining(), Some(5.0));
                    assert!((25.0..=90.0).contains(&sim.timers.deferred_delay));
                }
                other => panic!("unexpected activity {other:?}"),
            }
        }
        assert!(seen_idle && seen_walk && seen_edge && seen_slide && seen_jump);
    }

    #[test]
    fn deferred_restart_rearms_behavior_timer() {
        let mut sim = sim_at(Vec2::new(800.0, 400.0));
        sim.timers.defer_behavior(5.0, 42.0);
        run(&mut sim, 5.1);
        let left = sim.timers.behavior.remaining().unwrap();
        assert!(left <= 42.0 && left > 41.0);
    }

    #[test]
    fn edge_run_targets_an_edge_at_run_speed() {
        let mut sim = sim_at(Vec2::new(800.0, 400.0));
        for _ in 0..20 {
            sim.pet.halt();
            assert!(start_edge_run(&mut sim));
            let Activity::EdgeRun { target } = sim.pet.activity else {
                panic!("not running");
            };
            let on_edge = target.x == 0.0
                || target.x == SCREEN.max_x()
                || target.y == 0.0
                || target.y == SCREEN.ground();
            assert!(on_edge, "{target} is not on an edge");
            assert!((sim.pet.vel.length() - 450.0).abs() < 0.01);
        }
    }

    #[test]
    fn horizontal_slide_keeps_distance() {
        for seed in 0..50 {
            let mut sim = sim_at(Vec2::new(800.0, 400.0));
            sim.rng = fastrand::Rng::with_seed(seed);
            assert!(start_slide(&mut sim));
            let Activity::Slide { target } = sim.pet.activity else {
                panic!("not sliding");
            };
            if target.y == 400.0 {
                assert!((target.x - 800.0).abs() >= SLIDE_MIN_DISTANCE);
            } else {
                assert!(target.y >= 450.0 && target.y <= SCREEN.ground());
                assert!((target.x - 800.0).abs() <= 100.0);
            }
            assert!((sim.pet.vel.length() - 270.0).abs() < 0.01);
        }
    }

    #[test]
    fn hurt_ends_after_its_clip_and_waits_long() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        play_one_shot(&mut sim, OneShot::Hurt);
        assert_eq!(sim.pet.activity, Activity::Hurt);
        assert!(sim.pet.anim.is_locked());

        run(&mut sim, 0.9);
        assert_eq!(sim.pet.activity, Activity::Hurt);
        run(&mut sim, 0.2);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.anim.clip, Clip::Idle);
        let d = sim.timers.behavior.remaining().unwrap();
        assert!((19.0..=120.0).contains(&d));
    }

    #[test]
    fn one_shot_ignored_when_dead() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pet.activity = Activity::Dead;
        play_one_shot(&mut sim, OneShot::Jump);
        assert_eq!(sim.pet.activity, Activity::Dead);
    }

    #[test]
    fn walk_stop_leaves_other_activities_alone() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.pet.activity = Activity::Chase;
        sim.pet.vel = Vec2::new(100.0, 0.0);
        stop_walking(&mut sim);
        assert_eq!(sim.pet.activity, Activity::Chase);

        sim.pet.activity = Activity::Walk;
        stop_walking(&mut sim);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert_eq!(sim.pet.vel, Vec2::ZERO);
    }

    #[test]
    fn quiet_mode_suspends_and_resumes() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        sim.start();
        said(&mut sim);
        sim.pet.activity = Activity::Walk;
        sim.pet.vel = Vec2::new(100.0, 0.0);

        toggle_quiet(&mut sim);
        assert!(sim.pet.quiet);
        assert_eq!(sim.pet.activity, Activity::Idle);
        assert!(!sim.timers.behavior.is_active());
        assert!(!sim.timers.random_message.is_active());
        assert!(!sim.timers.waste_spawn.is_active());
        let check = sim.timers.quiet_check.remaining().unwrap();
        assert!((30.0..=60.0).contains(&check));
        assert_eq!(said(&mut sim).len(), 1);

        toggle_quiet(&mut sim);
        assert!(!sim.pet.quiet);
        assert!(!sim.timers.quiet_check.is_active());
        let b = sim.timers.behavior.remaining().unwrap();
        assert!((30.0..=120.0).contains(&b));
        let m = sim.timers.random_message.remaining().unwrap();
        assert!((300.0..=1800.0).contains(&m));
        let w = sim.timers.waste_spawn.remaining().unwrap();
        assert!((120.0..=300.0).contains(&w));
        assert_eq!(said(&mut sim), vec!["I'm back to my business!".to_string()]);
    }

    #[test]
    fn quiet_check_eventually_wakes_up() {
        let mut sim = sim_at(Vec2::new(500.0, 500.0));
        toggle_quiet(&mut sim);
        let mut checks = 0;
        while sim.pet.quiet && checks < 100 {
            check_quiet(&mut sim);
            checks += 1;
            if sim.pet.quiet {
                let again = sim.timers.quiet_check.remaining().unwrap();
                assert!((60.0..=180.0).contains(&again));
            }
        }
        assert!(!sim.pet.quiet);
        assert!(sim.timers.behavior.is_active());
    }
}
