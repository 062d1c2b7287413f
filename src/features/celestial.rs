//! Sun and moon choreography: the landing drop, the whole-page spin, and
//! the convergence onto the about image.

use rand::rngs::StdRng;

use crate::features::{anchors, Choreography};
use crate::gfx::anim::Ease;
use crate::gfx::math::{Vec2, Vec3};
use crate::registry::EntityId;
use crate::timeline::phase::{EvalCtx, Phase, PhaseEval, Property, PropertyCurve};
use crate::timeline::{ScrollMarker, ScrubMode, Timeline, Trigger};

/// Starting placements, matching the scene's initial object positions.
pub const SUN_START: Vec3 = Vec3 { x: -2.0, y: 3.0, z: 0.0 };
pub const MOON_START: Vec3 = Vec3 { x: 2.0, y: 3.0, z: 0.0 };

/// Where the drop leaves the planets; the convergence starts from here.
pub const SUN_REST: Vec3 = Vec3 { x: -2.5, y: 0.0, z: 0.0 };
pub const MOON_REST: Vec3 = Vec3 { x: 2.5, y: 0.0, z: 0.0 };

/// Three full turns over the whole document, opposite directions.
const SPIN_TURNS: f32 = 3.0;

pub struct Celestial;

impl Choreography for Celestial {
    fn name(&self) -> &'static str {
        "celestial"
    }

    fn required_entities(&self) -> Vec<EntityId> {
        vec![EntityId::sun(), EntityId::moon()]
    }

    fn required_anchors(&self) -> Vec<String> {
        vec![
            anchors::LANDING.to_string(),
            anchors::BODY.to_string(),
            anchors::ABOUT.to_string(),
            anchors::ABOUT_IMAGE.to_string(),
        ]
    }

    fn build(&self, _rng: &mut StdRng) -> Vec<Timeline> {
        vec![drop_timeline(), spin_timeline(), converge_timeline()]
    }
}

/// Planets fall from above the viewport to their rest height while
/// drifting slightly apart, strictly tied to the landing scroll.
fn drop_timeline() -> Timeline {
    let trigger = Trigger::new(
        ScrollMarker::top_top(anchors::LANDING),
        ScrollMarker::bottom_top(anchors::LANDING),
        ScrubMode::Scrub,
    );
    let phases = vec![
        Phase::curves(
            0.0,
            1.0,
            vec![EntityId::sun()],
            vec![
                PropertyCurve::new(Property::PositionX, SUN_START.x, SUN_REST.x, Ease::Linear),
                PropertyCurve::new(Property::PositionY, SUN_START.y, SUN_REST.y, Ease::Linear),
            ],
        ),
        Phase::curves(
            0.0,
            1.0,
            vec![EntityId::moon()],
            vec![
                PropertyCurve::new(Property::PositionX, MOON_START.x, MOON_REST.x, Ease::Linear),
                PropertyCurve::new(Property::PositionY, MOON_START.y, MOON_REST.y, Ease::Linear),
            ],
        ),
    ];
    Timeline::new("celestial-drop", trigger, phases)
}

/// Continuous rotation across the entire page scroll, lightly damped.
fn spin_timeline() -> Timeline {
    let trigger = Trigger::new(
        ScrollMarker::top_top(anchors::BODY),
        ScrollMarker::bottom_bottom(anchors::BODY),
        ScrubMode::Smooth(0.5),
    );
    let full = SPIN_TURNS * std::f32::consts::TAU;
    let phases = vec![
        Phase::curves(
            0.0,
            1.0,
            vec![EntityId::sun()],
            vec![PropertyCurve::new(Property::RotationY, 0.0, full, Ease::Linear)],
        ),
        Phase::curves(
            0.0,
            1.0,
            vec![EntityId::moon()],
            vec![PropertyCurve::new(Property::RotationY, 0.0, -full, Ease::Linear)],
        ),
    ];
    Timeline::new("celestial-spin", trigger, phases)
}

fn converge_timeline() -> Timeline {
    let trigger = Trigger::new(
        ScrollMarker::new(anchors::ABOUT, 0.0, 0.8),
        ScrollMarker::new(anchors::ABOUT, 0.5, 0.0),
        ScrubMode::Smooth(1.0),
    );
    let phases = vec![Phase::custom(0.0, 1.0, Box::new(Converge))];
    Timeline::new("about-converge", trigger, phases)
}

/// Pulls both planets onto the about image, landing them inside its
/// bottom strip. The image rect is live DOM geometry, so targets are
/// recomputed through the camera on every evaluation.
struct Converge;

impl Converge {
    /// Inset targets inside the image so planet centers sit on it, not
    /// outside; fractions keep it scaling from mobile to desktop.
    fn targets(rect: &crate::gfx::math::Rect, scroll: f32) -> (Vec2, Vec2) {
        let inset_x = 110f32.min(rect.width * 0.22);
        let inset_y = 110f32.min(rect.height * 0.18);
        let top = rect.y - scroll;
        let bottom_y = top + rect.height - inset_y;
        (
            Vec2::new(rect.x + inset_x, bottom_y),
            Vec2::new(rect.right() - inset_x, bottom_y),
        )
    }
}

impl PhaseEval for Converge {
    fn eval(&mut self, ctx: &mut EvalCtx<'_>, local: f32) {
        // At zero progress the targets equal the drop's rest state;
        // writing would only fight the drop timeline's own output while
        // the user is still above the about section.
        if local <= 0.0 {
            return;
        }
        // Image not measurable yet: defer, never error
        let Some(rect) = ctx.anchors.get(anchors::ABOUT_IMAGE).copied() else {
            return;
        };
        let (left_px, right_px) = Self::targets(&rect, ctx.scroll);
        let t = Ease::Power1InOut.apply(local);

        for (id, from, target_px) in [
            (EntityId::sun(), SUN_REST, left_px),
            (EntityId::moon(), MOON_REST, right_px),
        ] {
            let world = ctx.camera.screen_to_world_at_zero_depth(target_px, ctx.viewport);
            let target = Vec3::new(world.x, world.y, 0.0);
            if let Some(transform) = ctx.registry.transform_mut(&id) {
                transform.position = from.lerp(target, t);
                transform.scale = Vec3::splat(crate::gfx::anim::lerp(1.0, 0.8, t));
            }
        }
    }
}
