//! Engine lifecycle and per-frame orchestration.
//!
//! The composition layer registers entities, signals readiness once,
//! feeds scroll/resize events, and calls `frame` on every display
//! refresh with its [`Host`]. Everything else — smoothing, timeline
//! evaluation, starfield painting, scene sync — happens inside the frame
//! in scheduler order.

use std::collections::BTreeSet;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::Camera;
use crate::config::Config;
use crate::error::EngineError;
use crate::features::{celestial::Celestial, cubes::Cubes, glyphs::Glyphs, sections::Sections, Choreography};
use crate::frame::{FrameScheduler, Stage};
use crate::gfx::math::{Rect, Vec2};
use crate::gfx::starfield::Starfield;
use crate::gfx::surface::Surface;
use crate::perf::FpsMonitor;
use crate::registry::{EntityId, EntityKind, Registry, Transform};
use crate::scroll::{ScrollSample, ScrollSource};
use crate::timeline::phase::{AnchorMap, EvalCtx};
use crate::timeline::TimelineSet;

/// Events the composition layer feeds in. They are cheap to deliver at
/// any rate; per-frame work happens only in [`Engine::frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Scroll { offset: f32 },
    Resize { width: f32, height: f32, pixel_ratio: f32 },
    ReducedMotion(bool),
}

/// The collaborator boundary: live geometry in, transforms out.
pub trait Host {
    fn viewport(&self) -> Vec2;

    fn pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Document-space rect of a named anchor, if it exists yet.
    fn anchor_rect(&self, name: &str) -> Option<Rect>;

    /// The starfield's raster target. `None` disables the starfield
    /// without affecting anything else.
    fn surface(&mut self) -> Option<&mut dyn Surface>;

    /// Push current transforms into the 3D scene / DOM. A failure here
    /// is isolated: logged once, then scene sync is dropped for good
    /// while the rest of the page keeps animating.
    fn sync_scene(&mut self, registry: &Registry) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    width: f32,
    height: f32,
    pixel_ratio: f32,
    /// Set when first seen by a frame; the debounce window counts from
    /// here and restarts on every fresh resize event.
    observed_at: Option<f64>,
}

pub struct Engine {
    config: Config,
    scheduler: FrameScheduler,
    scroll: ScrollSource,
    registry: Registry,
    camera: Camera,
    starfield: Starfield,
    timelines: TimelineSet,
    features: Vec<Box<dyn Choreography>>,
    /// Indexes into `features` not yet built+bound.
    unbound: Vec<usize>,
    anchors: AnchorMap,
    anchor_names: BTreeSet<String>,
    anchors_stale: bool,
    viewport: Vec2,
    pixel_ratio: f32,
    pending_resize: Option<PendingResize>,
    reduced_motion: bool,
    ready: bool,
    scene_failed: bool,
    surface_warned: bool,
    start_time: Option<f64>,
    sample: ScrollSample,
    rng: StdRng,
    fps: FpsMonitor,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let camera = Camera::new(config.camera.z, config.camera.fov_deg);
        let starfield = Starfield::new(config.starfield.count, 1.0, 1.0);
        let scroll = ScrollSource::new(config.scroll.smoothing);
        let reduced_motion = config.reduced_motion;
        let features = Self::build_features(&config, reduced_motion);
        let unbound = (0..features.len()).collect();

        Self {
            config,
            scheduler: FrameScheduler::new(),
            scroll,
            registry: Registry::new(),
            camera,
            starfield,
            timelines: TimelineSet::new(),
            features,
            unbound,
            anchors: AnchorMap::new(),
            anchor_names: BTreeSet::new(),
            anchors_stale: true,
            viewport: Vec2::ZERO,
            pixel_ratio: 1.0,
            pending_resize: None,
            reduced_motion,
            ready: false,
            scene_failed: false,
            surface_warned: false,
            start_time: None,
            sample: ScrollSample::default(),
            rng: StdRng::from_entropy(),
            fps: FpsMonitor::new(),
        }
    }

    fn build_features(config: &Config, reduced_motion: bool) -> Vec<Box<dyn Choreography>> {
        vec![
            Box::new(Glyphs::new(config.glyphs)),
            Box::new(Celestial),
            Box::new(Sections),
            Box::new(Cubes::new(
                config.cubes,
                config.mobile_breakpoint,
                reduced_motion,
            )),
        ]
    }

    /// Adopt the host's current geometry and start the frame loop. The
    /// composition layer should have its entities registered (or call
    /// `entities_ready` later); starting twice is a no-op.
    pub fn start(&mut self, host: &mut dyn Host) {
        if self.scheduler.is_running() {
            debug!("start() on a running engine, ignoring");
            return;
        }
        self.viewport = host.viewport();
        self.pixel_ratio = host.pixel_ratio();
        self.starfield.resize(self.viewport.x, self.viewport.y);
        self.anchors_stale = true;
        self.scheduler.start();
        info!(
            "engine started at {:.0}x{:.0}@{}x",
            self.viewport.x, self.viewport.y, self.pixel_ratio
        );
    }

    /// Synchronous teardown: stop the loop, release every trigger, leave
    /// nothing that could fire later. Entities stay registered so a
    /// restart can rebind.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.timelines.clear();
        self.unbound = (0..self.features.len()).collect();
        self.start_time = None;
        info!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn register_entity(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        initial: Transform,
    ) -> Result<(), EngineError> {
        self.registry.register(id, kind, initial)
    }

    pub fn unregister_entity(&mut self, id: &EntityId) {
        self.registry.unregister(id);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current_fps(&self) -> u32 {
        self.fps.current_fps()
    }

    pub fn last_sample(&self) -> ScrollSample {
        self.sample
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Scroll { offset } => self.scroll.set_raw(offset),
            Event::Resize {
                width,
                height,
                pixel_ratio,
            } => {
                // Coalesce: the newest geometry wins and the debounce
                // window restarts
                self.pending_resize = Some(PendingResize {
                    width,
                    height,
                    pixel_ratio,
                    observed_at: None,
                });
            }
            Event::ReducedMotion(enabled) => {
                if enabled != self.reduced_motion {
                    info!("reduced motion {}", if enabled { "on" } else { "off" });
                    self.reduced_motion = enabled;
                    self.rebuild_cubes();
                }
            }
        }
    }

    /// The one-shot ready signal from the composition layer: all named
    /// entities exist, timelines may bind. Idempotent; a second call
    /// neither rebinds nor duplicates writes.
    pub fn entities_ready(&mut self) {
        if self.ready {
            debug!("entities_ready() repeated, ignoring");
            return;
        }
        self.ready = true;
        self.try_bind_features();
    }

    /// Drive one frame. `now` is the host clock in seconds.
    pub fn frame(&mut self, now: f64, host: &mut dyn Host) {
        let Some(dt) = self.scheduler.begin_frame(now) else {
            return;
        };
        let elapsed = (now - *self.start_time.get_or_insert(now)) as f32;

        self.apply_debounced_resize(now);
        if self.ready && !self.unbound.is_empty() {
            // Entities arrived after the ready signal; keep retrying
            self.try_bind_features();
        }
        if self.anchors_stale {
            self.refresh_anchors(host);
        }

        for stage in self.scheduler.stages().to_vec() {
            match stage {
                Stage::SampleScroll => {
                    self.sample = self.scroll.sample(now);
                }
                Stage::EvaluateTimelines => {
                    let mut ctx = EvalCtx {
                        registry: &mut self.registry,
                        camera: &self.camera,
                        viewport: self.viewport,
                        anchors: &self.anchors,
                        scroll: self.sample.smoothed_offset,
                    };
                    self.timelines.evaluate_all(&mut ctx, dt, elapsed);
                }
                Stage::RenderStarfield => match host.surface() {
                    Some(surface) => {
                        self.starfield
                            .tick(self.sample.smoothed_offset, elapsed, surface);
                    }
                    None => {
                        if !self.surface_warned {
                            warn!("{}", EngineError::SurfaceUnavailable);
                            self.surface_warned = true;
                        }
                    }
                },
                Stage::SyncScene => {
                    if !self.scene_failed {
                        if let Err(e) = host.sync_scene(&self.registry) {
                            // Isolate the 3D collaborator: drop to the
                            // non-3D fallback, keep everything else alive
                            error!("scene sync failed, disabling 3D sync: {e:#}");
                            self.scene_failed = true;
                        }
                    }
                }
            }
        }

        self.fps.tick(now);
    }

    fn rebuild_cubes(&mut self) {
        self.timelines.remove("cubes");
        for (i, feature) in self.features.iter_mut().enumerate() {
            if feature.name() == "cubes" {
                *feature = Box::new(Cubes::new(
                    self.config.cubes,
                    self.config.mobile_breakpoint,
                    self.reduced_motion,
                ));
                if !self.unbound.contains(&i) {
                    self.unbound.push(i);
                }
            }
        }
        if self.ready {
            self.try_bind_features();
        }
    }

    fn try_bind_features(&mut self) {
        let mut still_unbound = Vec::new();
        for &index in &self.unbound {
            let feature = &self.features[index];
            let missing: Vec<EntityId> = feature
                .required_entities()
                .into_iter()
                .filter(|id| !self.registry.contains(id))
                .collect();
            if !missing.is_empty() {
                debug!(
                    "deferring `{}`: {} entities not registered yet",
                    feature.name(),
                    missing.len()
                );
                still_unbound.push(index);
                continue;
            }

            for name in feature.required_anchors() {
                self.anchor_names.insert(name);
            }
            for timeline in feature.build(&mut self.rng) {
                for anchor in timeline.required_anchors() {
                    self.anchor_names.insert(anchor.to_string());
                }
                if let Err(e) = self.timelines.bind(timeline) {
                    warn!("{e}");
                }
            }
            info!("bound choreography `{}`", feature.name());
            self.anchors_stale = true;
        }
        self.unbound = still_unbound;
    }

    fn apply_debounced_resize(&mut self, now: f64) {
        let Some(mut pending) = self.pending_resize else {
            return;
        };
        let observed = *pending.observed_at.get_or_insert(now);
        self.pending_resize = Some(pending);

        if now - observed < self.config.resize_debounce_ms as f64 / 1000.0 {
            return;
        }
        self.pending_resize = None;
        self.viewport = Vec2::new(pending.width, pending.height);
        self.pixel_ratio = pending.pixel_ratio;

        // Everything measured against the old layout is now stale:
        // trigger ranges, cube rest centers, the star bounds
        self.starfield.resize(pending.width, pending.height);
        self.timelines.invalidate_all();
        self.anchors_stale = true;
        info!(
            "resized to {:.0}x{:.0}@{}x, measurements invalidated",
            pending.width, pending.height, pending.pixel_ratio
        );
    }

    /// Re-measure every known anchor from the host. Anchors that cannot
    /// be measured yet stay absent and are retried next frame; timelines
    /// needing them defer on their own.
    fn refresh_anchors(&mut self, host: &dyn Host) {
        self.anchors.clear();
        let mut missing = 0usize;
        for name in &self.anchor_names {
            match host.anchor_rect(name) {
                Some(rect) => {
                    self.anchors.insert(name.clone(), rect);
                }
                None => missing += 1,
            }
        }
        self.anchors_stale = missing > 0;
        if missing > 0 {
            debug!("{missing} anchors not measurable yet");
        }
    }
}
