//! Phases: the sub-intervals of a timeline and what they write.
//!
//! A phase occupies a slice of its timeline's [0,1] progress domain and
//! either drives generic property curves on its targets or hands local
//! progress to a custom evaluator (the orbit/flight choreography, which
//! needs live projected positions).

use std::collections::HashMap;

use crate::camera::Camera;
use crate::gfx::anim::{clamp01, lerp, Ease};
use crate::gfx::math::{Rect, Vec2};
use crate::registry::{EntityId, Registry, Transform};

/// Measured document-space rects for named anchors.
pub type AnchorMap = HashMap<String, Rect>;

/// Everything an evaluation step may read or write. Rebuilt per frame;
/// never cached.
pub struct EvalCtx<'a> {
    pub registry: &'a mut Registry,
    pub camera: &'a Camera,
    pub viewport: Vec2,
    pub anchors: &'a AnchorMap,
    /// Smoothed scroll offset for this frame.
    pub scroll: f32,
}

impl EvalCtx<'_> {
    /// Where an entity currently projects on screen. The companion
    /// planets move every frame, so callers must not cache this.
    pub fn projected(&self, id: &EntityId) -> Option<Vec2> {
        let entity = self.registry.get(id)?;
        Some(
            self.camera
                .world_to_screen(entity.transform.position, self.viewport),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    /// Uniform scale across all three axes.
    Scale,
    Opacity,
}

impl Property {
    pub fn apply(self, transform: &mut Transform, value: f32) {
        match self {
            Property::PositionX => transform.position.x = value,
            Property::PositionY => transform.position.y = value,
            Property::PositionZ => transform.position.z = value,
            Property::RotationX => transform.rotation.x = value,
            Property::RotationY => transform.rotation.y = value,
            Property::RotationZ => transform.rotation.z = value,
            Property::Scale => {
                transform.scale.x = value;
                transform.scale.y = value;
                transform.scale.z = value;
            }
            Property::Opacity => transform.opacity = value,
        }
    }
}

/// A single eased from→to tween of one property. From-values are always
/// explicit so a reversed scrub lands exactly where it started.
#[derive(Debug, Clone, Copy)]
pub struct PropertyCurve {
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub ease: Ease,
}

impl PropertyCurve {
    pub fn new(property: Property, from: f32, to: f32, ease: Ease) -> Self {
        Self {
            property,
            from,
            to,
            ease,
        }
    }

    fn value_at(&self, local: f32) -> f32 {
        lerp(self.from, self.to, self.ease.apply(local))
    }
}

/// Custom per-frame evaluation for choreography that generic curves
/// cannot express (live targets, per-entity paths).
pub trait PhaseEval {
    fn eval(&mut self, ctx: &mut EvalCtx<'_>, local: f32);

    /// Layout changed; drop any cached measurements.
    fn invalidate(&mut self) {}
}

pub enum PhaseBody {
    Curves(Vec<PropertyCurve>),
    Custom(Box<dyn PhaseEval>),
}

pub struct Phase {
    /// Start of this phase inside the timeline's [0,1] domain.
    pub start: f32,
    /// Length inside the timeline's [0,1] domain.
    pub duration: f32,
    /// Per-target start offset, in timeline-domain units.
    pub stagger: f32,
    pub targets: Vec<EntityId>,
    pub body: PhaseBody,
}

impl Phase {
    pub fn curves(
        start: f32,
        duration: f32,
        targets: Vec<EntityId>,
        curves: Vec<PropertyCurve>,
    ) -> Self {
        Self {
            start,
            duration,
            stagger: 0.0,
            targets,
            body: PhaseBody::Curves(curves),
        }
    }

    pub fn custom(start: f32, duration: f32, body: Box<dyn PhaseEval>) -> Self {
        Self {
            start,
            duration,
            stagger: 0.0,
            targets: Vec::new(),
            body: PhaseBody::Custom(body),
        }
    }

    pub fn with_stagger(mut self, stagger: f32) -> Self {
        self.stagger = stagger;
        self
    }

    /// Last covered point of the timeline domain, staggers included.
    pub fn end(&self) -> f32 {
        let tail = self.stagger * self.targets.len().saturating_sub(1) as f32;
        self.start + self.duration + tail
    }

    /// Write this phase's outputs for the given timeline progress.
    ///
    /// A phase (or a staggered target within it) writes only once
    /// progress has reached its window; after the window it keeps
    /// writing its final value. Phases evaluate in timeline order, so on
    /// shared properties the latest *started* phase wins, and phases the
    /// scroll has not reached yet stay silent.
    pub fn evaluate(&mut self, ctx: &mut EvalCtx<'_>, progress: f32) {
        match &mut self.body {
            PhaseBody::Curves(curves) => {
                for (index, id) in self.targets.iter().enumerate() {
                    let start = self.start + self.stagger * index as f32;
                    if progress < start {
                        continue;
                    }
                    let local = phase_local(progress, start, self.duration);
                    if let Some(transform) = ctx.registry.transform_mut(id) {
                        for curve in curves.iter() {
                            curve.property.apply(transform, curve.value_at(local));
                        }
                    }
                }
            }
            PhaseBody::Custom(eval) => {
                if progress < self.start {
                    return;
                }
                let local = phase_local(progress, self.start, self.duration);
                eval.eval(ctx, local);
            }
        }
    }

    pub fn invalidate(&mut self) {
        if let PhaseBody::Custom(eval) = &mut self.body {
            eval.invalidate();
        }
    }
}

/// Remap timeline progress into a phase's own [0,1], clamped.
pub fn phase_local(progress: f32, start: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return if progress >= start { 1.0 } else { 0.0 };
    }
    clamp01((progress - start) / duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn phase_local_remaps_sub_interval() {
        // Phase spanning [0.4, 0.9] of the trigger, evaluated at 0.5
        let local = phase_local(0.5, 0.4, 0.5);
        assert!((local - 0.2).abs() < 1e-6);
    }

    #[test]
    fn phase_local_clamps_both_ends() {
        assert_eq!(phase_local(0.1, 0.4, 0.5), 0.0);
        assert_eq!(phase_local(0.95, 0.4, 0.5), 1.0);
    }

    #[test]
    fn zero_duration_phase_is_a_step() {
        assert_eq!(phase_local(0.39, 0.4, 0.0), 0.0);
        assert_eq!(phase_local(0.4, 0.4, 0.0), 1.0);
    }

    #[test]
    fn pending_phase_stays_silent() {
        use crate::registry::{EntityKind, Registry, Transform};
        let mut registry = Registry::new();
        registry
            .register(EntityId::sun(), EntityKind::Object3D, Transform::default())
            .unwrap();
        let camera = crate::camera::Camera::new(5.0, 50.0);
        let anchors = AnchorMap::new();
        let mut ctx = EvalCtx {
            registry: &mut registry,
            camera: &camera,
            viewport: Vec2::new(1280.0, 800.0),
            anchors: &anchors,
            scroll: 0.0,
        };

        let mut phase = Phase::curves(
            0.5,
            0.25,
            vec![EntityId::sun()],
            vec![PropertyCurve::new(Property::Opacity, 1.0, 0.0, Ease::Linear)],
        );

        // Before its window: no write at all
        phase.evaluate(&mut ctx, 0.3);
        assert_eq!(ctx.registry.write_count(), 0);

        // Inside and past the window: writes, holding the final value
        phase.evaluate(&mut ctx, 0.625);
        assert!((ctx.registry.get(&EntityId::sun()).unwrap().transform.opacity - 0.5).abs() < 1e-6);
        phase.evaluate(&mut ctx, 0.9);
        assert_eq!(ctx.registry.get(&EntityId::sun()).unwrap().transform.opacity, 0.0);
    }

    #[test]
    fn phase_end_includes_stagger_tail() {
        let phase = Phase::curves(
            0.1,
            0.3,
            vec![EntityId::glyph(0), EntityId::glyph(1), EntityId::glyph(2)],
            vec![],
        )
        .with_stagger(0.05);
        assert!((phase.end() - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn phase_local_is_monotonic_in_progress(
            start in 0.0f32..0.9,
            duration in 0.01f32..1.0,
            a in 0.0f32..1.0,
            b in 0.0f32..1.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(phase_local(lo, start, duration) <= phase_local(hi, start, duration));
        }

        #[test]
        fn phase_local_is_stateless_in_progress(p in 0.0f32..1.0) {
            // Scrubbing forward then back lands on the same value
            let forward = phase_local(p, 0.25, 0.5);
            let _ = phase_local(1.0, 0.25, 0.5);
            let back = phase_local(p, 0.25, 0.5);
            prop_assert_eq!(forward, back);
        }
    }
}
