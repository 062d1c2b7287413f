//! Heading glyph choreography.
//!
//! Entry: glyphs start on a semi-circle in the x/z plane, rotated to face
//! center, and fly to rest along a curved two-keyframe path — a one-shot
//! clip that fires when the landing section scrolls into view. Scatter:
//! as the landing section scrolls out, the non-name glyphs drift
//! horizontally with alternating direction and roll, scrubbed to scroll.

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::GlyphsConfig;
use crate::features::{anchors, Choreography};
use crate::gfx::anim::{lerp, Ease};
use crate::registry::EntityId;
use crate::timeline::phase::{phase_local, EvalCtx, Phase, PhaseEval};
use crate::timeline::{ScrollMarker, ScrubMode, Timeline, Trigger};

/// Semi-circle radius, logical px.
const SPHERE_RADIUS: f32 = 600.0;
/// Per-glyph flight time within the entry clip, seconds.
const GLYPH_FLIGHT_S: f32 = 1.2;
/// Entry stagger between glyphs, seconds.
const GLYPH_STAGGER_S: f32 = 0.04;

pub struct Glyphs {
    cfg: GlyphsConfig,
}

impl Glyphs {
    pub fn new(cfg: GlyphsConfig) -> Self {
        Self { cfg }
    }

    fn is_name_glyph(&self, index: usize) -> bool {
        index >= self.cfg.name_start && index < self.cfg.name_end
    }
}

impl Choreography for Glyphs {
    fn name(&self) -> &'static str {
        "glyphs"
    }

    fn required_entities(&self) -> Vec<EntityId> {
        (0..self.cfg.count).map(EntityId::glyph).collect()
    }

    fn required_anchors(&self) -> Vec<String> {
        vec![anchors::LANDING.to_string()]
    }

    fn build(&self, rng: &mut StdRng) -> Vec<Timeline> {
        // Scatter binds first: while the entry clip is still playing its
        // writes land later in the frame and win; once it settles the
        // scatter owns the glyphs.
        vec![self.scatter_timeline(rng), self.entry_timeline()]
    }
}

impl Glyphs {
    fn entry_timeline(&self) -> Timeline {
        let n = self.cfg.count;
        let total = GLYPH_FLIGHT_S + GLYPH_STAGGER_S * n.saturating_sub(1) as f32;
        let trigger = Trigger::new(
            ScrollMarker::new(anchors::LANDING, 0.0, 0.8),
            ScrollMarker::new(anchors::LANDING, 0.0, 0.5),
            ScrubMode::OneShot(total),
        );
        let eval = SphereEntry {
            count: n,
            window: GLYPH_FLIGHT_S / total,
            stagger: GLYPH_STAGGER_S / total,
        };
        Timeline::new(
            "glyph-entry",
            trigger,
            vec![Phase::custom(0.0, 1.0, Box::new(eval))],
        )
    }

    fn scatter_timeline(&self, rng: &mut StdRng) -> Timeline {
        let trigger = Trigger::new(
            ScrollMarker::top_top(anchors::LANDING),
            ScrollMarker::bottom_top(anchors::LANDING),
            ScrubMode::Scrub,
        );
        // Alternate direction per scatter glyph; random throw distance.
        // The name glyphs stay put.
        let mut glyphs = Vec::new();
        let mut scatter_index = 0usize;
        for index in 0..self.cfg.count {
            if self.is_name_glyph(index) {
                continue;
            }
            let direction = if scatter_index % 2 == 0 { -1.0 } else { 1.0 };
            glyphs.push(ScatterGlyph {
                id: EntityId::glyph(index),
                amplitude: rng.gen_range(200.0..500.0) * direction,
                roll: direction * 45f32.to_radians(),
            });
            scatter_index += 1;
        }
        Timeline::new(
            "glyph-scatter",
            trigger,
            vec![Phase::custom(0.0, 1.0, Box::new(Scatter { glyphs }))],
        )
    }
}

/// Per-glyph state for the entry flight, derived from its slot on the
/// semi-circle.
struct SphereSlot {
    x: f32,
    z: f32,
    rot_y: f32,
}

fn sphere_slot(index: usize, count: usize) -> SphereSlot {
    let denom = count.saturating_sub(1).max(1) as f32;
    let angle = (index as f32 / denom) * std::f32::consts::PI;
    SphereSlot {
        x: SPHERE_RADIUS * angle.cos(),
        z: SPHERE_RADIUS * angle.sin(),
        rot_y: angle - std::f32::consts::FRAC_PI_2,
    }
}

struct SphereEntry {
    count: usize,
    /// Per-glyph flight window as a fraction of the clip.
    window: f32,
    stagger: f32,
}

impl PhaseEval for SphereEntry {
    fn eval(&mut self, ctx: &mut EvalCtx<'_>, local: f32) {
        for index in 0..self.count {
            let slot = sphere_slot(index, self.count);
            let sub = phase_local(local, self.stagger * index as f32, self.window);

            // Keyframe 1: curve along the semi-circle to the halfway
            // point; keyframe 2: land at rest, fading and scaling in.
            let k1 = Ease::Power2Out.apply(phase_local(sub, 0.0, 0.5));
            let k2 = Ease::Power2Out.apply(phase_local(sub, 0.5, 0.5));

            let (x, z, rot_y) = if sub < 0.5 {
                (
                    lerp(slot.x, slot.x * 0.5, k1),
                    lerp(slot.z, slot.z * 0.5, k1),
                    lerp(slot.rot_y, slot.rot_y * 0.5, k1),
                )
            } else {
                (
                    lerp(slot.x * 0.5, 0.0, k2),
                    lerp(slot.z * 0.5, 0.0, k2),
                    lerp(slot.rot_y * 0.5, 0.0, k2),
                )
            };

            if let Some(transform) = ctx.registry.transform_mut(&EntityId::glyph(index)) {
                transform.position.x = x;
                transform.position.y = 0.0;
                transform.position.z = z;
                transform.rotation.y = rot_y;
                transform.opacity = lerp(0.0, 1.0, k2);
                let scale = lerp(0.4, 1.0, k2);
                transform.scale.x = scale;
                transform.scale.y = scale;
                transform.scale.z = scale;
            }
        }
    }
}

struct ScatterGlyph {
    id: EntityId,
    amplitude: f32,
    roll: f32,
}

struct Scatter {
    glyphs: Vec<ScatterGlyph>,
}

impl PhaseEval for Scatter {
    fn eval(&mut self, ctx: &mut EvalCtx<'_>, local: f32) {
        let t = Ease::Power1Out.apply(local);
        for glyph in &self.glyphs {
            if let Some(transform) = ctx.registry.transform_mut(&glyph.id) {
                transform.position.x = glyph.amplitude * t;
                transform.rotation.z = glyph.roll * t;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::config::Config;
    use crate::gfx::math::{Rect, Vec2};
    use crate::registry::{EntityKind, Registry, Transform};
    use crate::timeline::phase::AnchorMap;
    use rand::SeedableRng;

    fn glyphs() -> Glyphs {
        Glyphs::new(Config::default().glyphs)
    }

    fn setup(count: usize) -> (Registry, Camera, AnchorMap) {
        let mut reg = Registry::new();
        for i in 0..count {
            reg.register(EntityId::glyph(i), EntityKind::DomElement, Transform::default())
                .unwrap();
        }
        let mut map = AnchorMap::new();
        map.insert(anchors::LANDING.to_string(), Rect::new(0.0, 0.0, 1280.0, 800.0));
        (reg, Camera::new(5.0, 50.0), map)
    }

    #[test]
    fn sphere_slots_span_the_semicircle() {
        let first = sphere_slot(0, 30);
        let last = sphere_slot(29, 30);
        assert!((first.x - SPHERE_RADIUS).abs() < 1e-3);
        assert!(first.z.abs() < 1e-3);
        assert!((last.x + SPHERE_RADIUS).abs() < 1e-3);
        assert!(last.z.abs() < 1.0);
    }

    #[test]
    fn entry_start_state_is_hidden_on_the_circle() {
        let feature = glyphs();
        let (mut reg, camera, map) = setup(feature.cfg.count);
        let mut eval = SphereEntry {
            count: feature.cfg.count,
            window: 0.5,
            stagger: 0.01,
        };
        let mut ctx = EvalCtx {
            registry: &mut reg,
            camera: &camera,
            viewport: Vec2::new(1280.0, 800.0),
            anchors: &map,
            scroll: 0.0,
        };
        eval.eval(&mut ctx, 0.0);

        let g0 = reg.get(&EntityId::glyph(0)).unwrap().transform;
        assert_eq!(g0.opacity, 0.0);
        assert!((g0.position.x - SPHERE_RADIUS).abs() < 1e-3);
        assert!((g0.scale.x - 0.4).abs() < 1e-6);
    }

    #[test]
    fn entry_finishes_at_rest() {
        let feature = glyphs();
        let (mut reg, camera, map) = setup(feature.cfg.count);
        let mut eval = SphereEntry {
            count: feature.cfg.count,
            window: 0.5,
            stagger: 0.01,
        };
        let mut ctx = EvalCtx {
            registry: &mut reg,
            camera: &camera,
            viewport: Vec2::new(1280.0, 800.0),
            anchors: &map,
            scroll: 0.0,
        };
        eval.eval(&mut ctx, 1.0);

        for i in 0..feature.cfg.count {
            let t = reg.get(&EntityId::glyph(i)).unwrap().transform;
            assert!(t.position.x.abs() < 1e-3, "glyph {i} x = {}", t.position.x);
            assert!(t.position.z.abs() < 1e-3);
            assert_eq!(t.opacity, 1.0);
            assert!((t.scale.x - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn scatter_skips_name_glyphs() {
        let feature = glyphs();
        let mut rng = StdRng::seed_from_u64(42);
        let timelines = feature.build(&mut rng);
        assert_eq!(timelines[0].name(), "glyph-scatter");
        assert_eq!(timelines[1].name(), "glyph-entry");

        let (mut reg, camera, map) = setup(feature.cfg.count);
        let mut scatter = Scatter {
            glyphs: {
                let mut rng = StdRng::seed_from_u64(42);
                let mut v = Vec::new();
                let mut si = 0usize;
                for i in 0..feature.cfg.count {
                    if feature.is_name_glyph(i) {
                        continue;
                    }
                    let dir = if si % 2 == 0 { -1.0 } else { 1.0 };
                    v.push(ScatterGlyph {
                        id: EntityId::glyph(i),
                        amplitude: rng.gen_range(200.0..500.0) * dir,
                        roll: dir * 45f32.to_radians(),
                    });
                    si += 1;
                }
                v
            },
        };
        let mut ctx = EvalCtx {
            registry: &mut reg,
            camera: &camera,
            viewport: Vec2::new(1280.0, 800.0),
            anchors: &map,
            scroll: 0.0,
        };
        scatter.eval(&mut ctx, 1.0);

        // Name glyphs untouched, others thrown 200..500 px
        for i in 0..feature.cfg.count {
            let t = reg.get(&EntityId::glyph(i)).unwrap().transform;
            if feature.is_name_glyph(i) {
                assert_eq!(t.position.x, 0.0);
            } else {
                let a = t.position.x.abs();
                assert!((200.0..500.0).contains(&a), "glyph {i} amplitude {a}");
            }
        }
    }

    #[test]
    fn scatter_is_reversible_to_origin() {
        let feature = glyphs();
        let (mut reg, camera, map) = setup(feature.cfg.count);
        let mut scatter = Scatter {
            glyphs: vec![ScatterGlyph {
                id: EntityId::glyph(0),
                amplitude: -300.0,
                roll: -0.5,
            }],
        };
        let mut ctx = EvalCtx {
            registry: &mut reg,
            camera: &camera,
            viewport: Vec2::new(1280.0, 800.0),
            anchors: &map,
            scroll: 0.0,
        };
        scatter.eval(&mut ctx, 0.7);
        scatter.eval(&mut ctx, 0.0);
        let t = reg.get(&EntityId::glyph(0)).unwrap().transform;
        assert_eq!(t.position.x, 0.0);
        assert_eq!(t.rotation.z, 0.0);
    }
}
