use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::pipeline::MAX_INSTANCES;
use crate::config::PetKind;
use crate::pet::{Facing, Pet, SPRITE_SIZE};
use crate::props::PropView;

/// What the fragment shader draws for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SpriteKind {
    Cat = 0,
    Dog = 1,
    Food = 2,
    Waste = 3,
}

/// Mirror the sprite horizontally.
pub const FLAG_FLIP: u32 = 1;

const CAT_COLOR: u32 = pack_rgba(240, 160, 70, 255);
const DOG_COLOR: u32 = pack_rgba(170, 120, 80, 255);
const FOOD_COLOR: u32 = pack_rgba(220, 60, 60, 255);
const WASTE_RGB: (u8, u8, u8) = (110, 72, 40);

/// RGBA8 packed little-endian, as `unpack4x8unorm` reads it.
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24
}

/// Per-instance data uploaded to GPU each frame.
/// Stride = 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Screen-space center in pixels.
    pub center: [f32; 2],
    /// Quad size in pixels.
    pub size: [f32; 2],
    /// RGBA color packed as u32.
    pub color: u32,
    pub kind: u32,
    /// Clip index in the high byte, frame in the low byte.
    pub anim: u32,
    pub flags: u32,
}

impl SpriteInstance {
    /// The pet, interpolated between the last two ticks.
    pub fn pet(pet: &Pet, kind: PetKind, alpha: f32) -> Self {
        let pos = Vec2::lerp(pet.prev_pos, pet.pos, alpha);
        let center = pos + Vec2::splat(SPRITE_SIZE / 2.0);
        let (sprite, color) = match kind {
            PetKind::Cat => (SpriteKind::Cat, CAT_COLOR),
            PetKind::Dog => (SpriteKind::Dog, DOG_COLOR),
        };
        let flags = if pet.facing == Facing::Left { FLAG_FLIP } else { 0 };

        Self {
            center: center.into(),
            size: [SPRITE_SIZE, SPRITE_SIZE],
            color,
            kind: sprite as u32,
            anim: (pet.anim.clip as u32) << 8 | pet.anim.frame as u32,
            flags,
        }
    }

    /// A food or waste prop. Waste fades as it decays.
    pub fn prop(view: &PropView) -> Self {
        let size = view.kind.size();
        let center = view.pos + Vec2::splat(size / 2.0);
        let (kind, color) = match view.kind {
            crate::props::PropKind::Food => (SpriteKind::Food, FOOD_COLOR),
            crate::props::PropKind::Waste => {
                let (r, g, b) = WASTE_RGB;
                let a = (view.freshness.clamp(0.0, 1.0) * 255.0) as u8;
                (SpriteKind::Waste, pack_rgba(r, g, b, a.max(40)))
            }
        };

        Self {
            center: center.into(),
            size: [size, size],
            color,
            kind: kind as u32,
            anim: 0,
            flags: 0,
        }
    }
}

/// Fill `out` with one frame's sprites: props first, the pet on top. Props
/// beyond the instance buffer are dropped so the pet always fits.
pub fn frame_instances(out: &mut Vec<SpriteInstance>, props: &[PropView], pet: SpriteInstance) {
    out.clear();
    let shown = props.len().min(MAX_INSTANCES - 1);
    if shown < props.len() {
        log::debug!("Drawing {shown} of {} props", props.len());
    }
    out.extend(props[..shown].iter().map(SpriteInstance::prop));
    out.push(pet);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::animation::Clip;
    use crate::props::PropKind;

    #[test]
    fn instance_is_32_bytes() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 32);
    }

    #[test]
    fn pet_instance_interpolates_and_flips() {
        let mut pet = Pet::new(Vec2::new(100.0, 100.0), 0.1);
        pet.prev_pos = Vec2::new(0.0, 100.0);
        pet.facing = Facing::Left;
        pet.anim.set(Clip::Walk);

        let inst = SpriteInstance::pet(&pet, PetKind::Dog, 0.5);
        assert_eq!(inst.center, [50.0 + 60.0, 160.0]);
        assert_eq!(inst.kind, SpriteKind::Dog as u32);
        assert_eq!(inst.flags & FLAG_FLIP, FLAG_FLIP);
        assert_eq!(inst.anim >> 8, Clip::Walk as u32);
    }

    #[test]
    fn old_waste_is_faint() {
        let fresh = SpriteInstance::prop(&PropView {
            pos: Vec2::ZERO,
            kind: PropKind::Waste,
            freshness: 1.0,
        });
        let stale = SpriteInstance::prop(&PropView {
            pos: Vec2::ZERO,
            kind: PropKind::Waste,
            freshness: 0.1,
        });
        assert!(fresh.color >> 24 > stale.color >> 24);
        assert_eq!(fresh.center, [12.5, 12.5]);
    }

    #[test]
    fn pet_survives_a_desk_full_of_food() {
        let pet = SpriteInstance::pet(&Pet::new(Vec2::new(10.0, 10.0), 0.1), PetKind::Cat, 1.0);
        let food = PropView {
            pos: Vec2::new(300.0, 300.0),
            kind: PropKind::Food,
            freshness: 1.0,
        };
        let props = vec![food; 300];
        let mut out = Vec::new();
        frame_instances(&mut out, &props, pet);
        assert_eq!(out.len(), MAX_INSTANCES);
        assert_eq!(out.last().map(|i| i.kind), Some(SpriteKind::Cat as u32));

        frame_instances(&mut out, &props[..2], pet);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].kind, SpriteKind::Food as u32);
    }
}
