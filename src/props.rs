use glam::Vec2;

use crate::pet::Screen;

/// Food edge length in pixels.
pub const FOOD_SIZE: f32 = 40.0;
/// Waste edge length in pixels.
pub const WASTE_SIZE: f32 = 25.0;
/// Waste disappears on its own after this many seconds.
pub const WASTE_LIFETIME: f32 = 60.0;

const FOOD_MARGIN: f32 = 50.0;
const WASTE_MARGIN: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PropKind {
    Food,
    Waste,
}

impl PropKind {
    pub fn size(self) -> f32 {
        match self {
            PropKind::Food => FOOD_SIZE,
            PropKind::Waste => WASTE_SIZE,
        }
    }
}

/// Top-left corner in screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Seconds until the prop removes itself.
#[derive(Debug, Clone, Copy)]
pub struct Decay(pub f32);

/// Spawn order, used for "first food" and topmost hit tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Serial(pub u64);

/// Flattened prop for rendering.
#[derive(Debug, Clone, Copy)]
pub struct PropView {
    pub pos: Vec2,
    pub kind: PropKind,
    /// 1.0 when fresh, falls toward 0.0 as waste decays.
    pub freshness: f32,
}

/// Food and waste living on the desktop.
pub struct Props {
    world: hecs::World,
    next_serial: u64,
}

fn random_in(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.f32() * (max - min)
}

impl Props {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            next_serial: 0,
        }
    }

    fn serial(&mut self) -> Serial {
        self.next_serial += 1;
        Serial(self.next_serial)
    }

    /// Place food at `pos` (top-left), clamped on screen.
    pub fn spawn_food_at(&mut self, pos: Vec2, screen: Screen) -> hecs::Entity {
        let pos = clamp_on_screen(pos, FOOD_SIZE, screen);
        let serial = self.serial();
        self.world.spawn((Position(pos), PropKind::Food, serial))
    }

    pub fn spawn_food_random(&mut self, rng: &mut fastrand::Rng, screen: Screen) -> hecs::Entity {
        let x = random_in(rng, FOOD_MARGIN, screen.w - FOOD_SIZE - FOOD_MARGIN);
        let y = random_in(rng, FOOD_MARGIN, screen.h - FOOD_SIZE - FOOD_MARGIN);
        self.spawn_food_at(Vec2::new(x, y), screen)
    }

    pub fn spawn_waste_at(&mut self, pos: Vec2, screen: Screen) -> hecs::Entity {
        let pos = clamp_on_screen(pos, WASTE_SIZE, screen);
        let serial = self.serial();
        self.world
            .spawn((Position(pos), PropKind::Waste, Decay(WASTE_LIFETIME), serial))
    }

    /// Drop waste slightly below and beside `pet_center`.
    pub fn spawn_waste_near(
        &mut self,
        pet_center: Vec2,
        rng: &mut fastrand::Rng,
        screen: Screen,
    ) -> hecs::Entity {
        let offset = Vec2::new(random_in(rng, -30.0, 30.0), random_in(rng, 10.0, 40.0));
        self.spawn_waste_at(pet_center + offset, screen)
    }

    pub fn spawn_waste_random(&mut self, rng: &mut fastrand::Rng, screen: Screen) -> hecs::Entity {
        let x = random_in(rng, WASTE_MARGIN, screen.w - WASTE_SIZE - WASTE_MARGIN);
        let y = random_in(rng, WASTE_MARGIN, screen.h - WASTE_SIZE - WASTE_MARGIN);
        self.spawn_waste_at(Vec2::new(x, y), screen)
    }

    /// Remove one prop. Returns false if it was already gone.
    pub fn despawn(&mut self, entity: hecs::Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    pub fn is_alive(&self, entity: hecs::Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn kind(&self, entity: hecs::Entity) -> Option<PropKind> {
        self.world.get::<&PropKind>(entity).ok().map(|k| *k)
    }

    /// Remove every prop of `kind`. Returns how many were removed.
    pub fn clear(&mut self, kind: PropKind) -> usize {
        let doomed: Vec<hecs::Entity> = self
            .world
            .query::<&PropKind>()
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(e, _)| e)
            .collect();
        for &e in &doomed {
            let _ = self.world.despawn(e);
        }
        doomed.len()
    }

    pub fn count(&self, kind: PropKind) -> usize {
        self.world
            .query::<&PropKind>()
            .iter()
            .filter(|(_, k)| **k == kind)
            .count()
    }

    /// Center of a live prop.
    pub fn center(&self, entity: hecs::Entity) -> Option<Vec2> {
        let pos = self.world.get::<&Position>(entity).ok()?;
        let kind = self.world.get::<&PropKind>(entity).ok()?;
        Some(pos.0 + Vec2::splat(kind.size() / 2.0))
    }

    /// Live food whose center is nearest to `from`.
    pub fn closest_food(&self, from: Vec2) -> Option<hecs::Entity> {
        let mut best: Option<(hecs::Entity, f32)> = None;
        for (e, (pos, kind)) in self.world.query::<(&Position, &PropKind)>().iter() {
            if *kind != PropKind::Food {
                continue;
            }
            let d = (pos.0 + Vec2::splat(FOOD_SIZE / 2.0)).distance_squared(from);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((e, d));
            }
        }
        best.map(|(e, _)| e)
    }

    /// Oldest live food.
    pub fn first_food(&self) -> Option<hecs::Entity> {
        self.world
            .query::<(&PropKind, &Serial)>()
            .iter()
            .filter(|(_, (k, _))| **k == PropKind::Food)
            .min_by_key(|(_, (_, s))| **s)
            .map(|(e, _)| e)
    }

    /// Age waste and remove what has decayed. Returns how many decayed.
    pub fn update(&mut self, dt: f32) -> usize {
        let mut expired = Vec::new();
        for (e, decay) in self.world.query_mut::<&mut Decay>() {
            decay.0 -= dt;
            if decay.0 <= 0.0 {
                expired.push(e);
            }
        }
        for &e in &expired {
            let _ = self.world.despawn(e);
        }
        expired.len()
    }

    /// Topmost prop under `point`.
    pub fn hit_test(&self, point: Vec2) -> Option<(hecs::Entity, PropKind)> {
        self.world
            .query::<(&Position, &PropKind, &Serial)>()
            .iter()
            .filter(|(_, (pos, kind, _))| {
                let size = kind.size();
                point.x >= pos.0.x
                    && point.x < pos.0.x + size
                    && point.y >= pos.0.y
                    && point.y < pos.0.y + size
            })
            .max_by_key(|(_, (_, _, s))| **s)
            .map(|(e, (_, k, _))| (e, *k))
    }

    /// Move a prop's top-left to `pos`, clamped on screen.
    pub fn move_to(&mut self, entity: hecs::Entity, pos: Vec2, screen: Screen) {
        let Some(size) = self.kind(entity).map(PropKind::size) else {
            return;
        };
        if let Ok(mut p) = self.world.get::<&mut Position>(entity) {
            p.0 = clamp_on_screen(pos, size, screen);
        }
    }

    pub fn position(&self, entity: hecs::Entity) -> Option<Vec2> {
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    /// Collect every prop, oldest first, into `out`.
    pub fn views(&self, out: &mut Vec<PropView>) {
        out.clear();
        let mut rows: Vec<(Serial, PropView)> = self
            .world
            .query::<(&Position, &PropKind, &Serial, Option<&Decay>)>()
            .iter()
            .map(|(_, (pos, kind, serial, decay))| {
                let freshness = decay.map_or(1.0, |d| (d.0 / WASTE_LIFETIME).clamp(0.0, 1.0));
                (
                    *serial,
                    PropView {
                        pos: pos.0,
                        kind: *kind,
                        freshness,
                    },
                )
            })
            .collect();
        rows.sort_by_key(|(s, _)| *s);
        out.extend(rows.into_iter().map(|(_, v)| v));
    }
}

fn clamp_on_screen(pos: Vec2, size: f32, screen: Screen) -> Vec2 {
    Vec2::new(
        pos.x.clamp(0.0, (screen.w - size).max(0.0)),
        pos.y.clamp(0.0, (screen.h - size).max(0.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Screen = Screen { w: 1920.0, h: 1080.0 };

    #[test]
    fn random_food_respects_margin() {
        let mut props = Props::new();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let e = props.spawn_food_random(&mut rng, SCREEN);
            let p = props.position(e).unwrap();
            assert!(p.x >= 50.0 && p.x <= 1920.0 - 90.0);
            assert!(p.y >= 50.0 && p.y <= 1080.0 - 90.0);
        }
        assert_eq!(props.count(PropKind::Food), 50);
    }

    #[test]
    fn waste_near_pet_stays_on_screen() {
        let mut props = Props::new();
        let mut rng = fastrand::Rng::with_seed(4);
        let e = props.spawn_waste_near(Vec2::new(1915.0, 1075.0), &mut rng, SCREEN);
        let p = props.position(e).unwrap();
        assert!(p.x <= 1920.0 - WASTE_SIZE);
        assert!(p.y <= 1080.0 - WASTE_SIZE);
    }

    #[test]
    fn random_waste_respects_margin() {
        let mut props = Props::new();
        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..50 {
            let e = props.spawn_waste_random(&mut rng, SCREEN);
            let p = props.position(e).unwrap();
            assert!(p.x >= 30.0 && p.x <= 1920.0 - WASTE_SIZE - 30.0);
            assert!(p.y >= 30.0 && p.y <= 1080.0 - WASTE_SIZE - 30.0);
        }
        assert_eq!(props.count(PropKind::Waste), 50);
    }

    #[test]
    fn closest_and_first_food() {
        let mut props = Props::new();
        let far = props.spawn_food_at(Vec2::new(1000.0, 1000.0), SCREEN);
        let near = props.spawn_food_at(Vec2::new(100.0, 100.0), SCREEN);
        props.spawn_waste_at(Vec2::new(0.0, 0.0), SCREEN);

        assert_eq!(props.closest_food(Vec2::ZERO), Some(near));
        assert_eq!(props.first_food(), Some(far));

        assert!(props.despawn(far));
        assert!(!props.despawn(far));
        assert!(!props.is_alive(far));
        assert_eq!(props.first_food(), Some(near));
    }

    #[test]
    fn waste_decays() {
        let mut props = Props::new();
        props.spawn_waste_at(Vec2::new(10.0, 10.0), SCREEN);
        props.spawn_food_at(Vec2::new(10.0, 10.0), SCREEN);
        assert_eq!(props.update(59.0), 0);
        assert_eq!(props.update(1.5), 1);
        assert_eq!(props.count(PropKind::Waste), 0);
        assert_eq!(props.count(PropKind::Food), 1);
    }

    #[test]
    fn hit_test_prefers_newest() {
        let mut props = Props::new();
        props.spawn_food_at(Vec2::new(10.0, 10.0), SCREEN);
        let waste = props.spawn_waste_at(Vec2::new(20.0, 20.0), SCREEN);
        assert_eq!(props.hit_test(Vec2::new(25.0, 25.0)), Some((waste, PropKind::Waste)));
        assert_eq!(props.hit_test(Vec2::new(500.0, 500.0)), None);
    }

    #[test]
    fn clear_by_kind_and_move() {
        let mut props = Props::new();
        let food = props.spawn_food_at(Vec2::new(10.0, 10.0), SCREEN);
        props.spawn_waste_at(Vec2::new(10.0, 10.0), SCREEN);
        props.spawn_waste_at(Vec2::new(30.0, 10.0), SCREEN);

        props.move_to(food, Vec2::new(5000.0, -20.0), SCREEN);
        assert_eq!(props.position(food), Some(Vec2::new(1880.0, 0.0)));

        assert_eq!(props.clear(PropKind::Waste), 2);
        assert_eq!(props.count(PropKind::Food), 1);

        let mut views = Vec::new();
        props.views(&mut views);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].kind, PropKind::Food);
    }
}
