//! Scroll-driven timelines.
//!
//! A trigger is a scroll interval (resolved from named anchors) plus a
//! scrub policy; a timeline binds that trigger to an ordered set of
//! phases. Scrub timelines map scroll position to progress statelessly in
//! both directions; one-shot timelines arm when scroll enters the range
//! and then play a time-based clip once, settling at completion.

pub mod phase;

use log::{debug, warn};

use crate::error::EngineError;
use crate::gfx::anim::{clamp01, Clip};
use crate::gfx::math::{Rect, Vec2};
use phase::{AnchorMap, EvalCtx, Phase};

/// A point in document scroll space, expressed relative to a named
/// anchor: "element_fraction of the way down anchor X reaches
/// viewport_fraction of the viewport height".
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollMarker {
    pub anchor: String,
    /// 0.0 = anchor top, 1.0 = anchor bottom.
    pub element_fraction: f32,
    /// 0.0 = viewport top, 1.0 = viewport bottom.
    pub viewport_fraction: f32,
}

impl ScrollMarker {
    pub fn new(anchor: impl Into<String>, element_fraction: f32, viewport_fraction: f32) -> Self {
        Self {
            anchor: anchor.into(),
            element_fraction,
            viewport_fraction,
        }
    }

    /// "top of anchor meets top of viewport"
    pub fn top_top(anchor: impl Into<String>) -> Self {
        Self::new(anchor, 0.0, 0.0)
    }

    /// "bottom of anchor meets top of viewport"
    pub fn bottom_top(anchor: impl Into<String>) -> Self {
        Self::new(anchor, 1.0, 0.0)
    }

    /// "bottom of anchor meets bottom of viewport"
    pub fn bottom_bottom(anchor: impl Into<String>) -> Self {
        Self::new(anchor, 1.0, 1.0)
    }

    /// Absolute scroll offset at which this marker is met.
    pub fn resolve(&self, anchors: &AnchorMap, viewport: Vec2) -> Result<f32, EngineError> {
        let rect: &Rect = anchors
            .get(&self.anchor)
            .ok_or_else(|| EngineError::ReferenceNotReady(self.anchor.clone()))?;
        Ok(rect.y + rect.height * self.element_fraction - viewport.y * self.viewport_fraction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubMode {
    /// Progress follows scroll exactly; reversible and stateless.
    Scrub,
    /// Progress eases toward the scroll-derived target with the given
    /// time-constant in seconds.
    Smooth(f32),
    /// Entering the range starts a clip of the given duration (seconds)
    /// that plays once and settles.
    OneShot(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub range_start: ScrollMarker,
    pub range_end: ScrollMarker,
    pub scrub: ScrubMode,
}

impl Trigger {
    pub fn new(range_start: ScrollMarker, range_end: ScrollMarker, scrub: ScrubMode) -> Self {
        Self {
            range_start,
            range_end,
            scrub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    /// Not yet resolvable against layout.
    Idle,
    /// Resolved; waiting for scroll to enter the range.
    Armed,
    /// Actively mapping scroll (or clip time) to outputs.
    Scrubbing,
    /// One-shot finished; terminal.
    Settled,
}

/// Progress of an offset through a resolved scroll range, clamped to
/// exactly [0, 1].
pub fn clamped_progress(offset: f32, range: (f32, f32)) -> f32 {
    let span = range.1 - range.0;
    if span.abs() < f32::EPSILON {
        return if offset >= range.0 { 1.0 } else { 0.0 };
    }
    clamp01((offset - range.0) / span)
}

pub struct Timeline {
    name: String,
    trigger: Trigger,
    phases: Vec<Phase>,
    state: TimelineState,
    resolved: Option<(f32, f32)>,
    /// Displayed progress; equals the raw target except under Smooth.
    shown: f32,
    /// Progress at the last phase write. Phases only re-evaluate when
    /// progress moves, so a timeline parked at a boundary does not keep
    /// overwriting properties that another timeline is animating.
    last_written: Option<f32>,
    clip: Option<Clip>,
}

impl Timeline {
    pub fn new(name: impl Into<String>, trigger: Trigger, phases: Vec<Phase>) -> Self {
        let name = name.into();
        for (i, phase) in phases.iter().enumerate() {
            if phase.end() > 1.0 + 1e-4 {
                // Accepted, but visible: the tail compresses or never fires
                warn!(
                    "timeline `{name}` phase {i} ends at {:.3}, past the trigger range; \
                     it will be truncated",
                    phase.end()
                );
            }
        }
        Self {
            name,
            trigger,
            phases,
            state: TimelineState::Idle,
            resolved: None,
            shown: 0.0,
            last_written: None,
            clip: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn shown_progress(&self) -> f32 {
        self.shown
    }

    /// Anchors this timeline needs measured before it can resolve.
    pub fn required_anchors(&self) -> [&str; 2] {
        [
            self.trigger.range_start.anchor.as_str(),
            self.trigger.range_end.anchor.as_str(),
        ]
    }

    /// Drop resolved ranges and cached phase measurements. Settled
    /// one-shots stay settled; everything else re-resolves next frame.
    pub fn invalidate(&mut self) {
        self.resolved = None;
        self.last_written = None;
        for phase in &mut self.phases {
            phase.invalidate();
        }
        if self.state != TimelineState::Settled {
            self.state = TimelineState::Idle;
        }
    }

    fn ensure_resolved(&mut self, anchors: &AnchorMap, viewport: Vec2) -> bool {
        if self.resolved.is_some() {
            return true;
        }
        let start = self.trigger.range_start.resolve(anchors, viewport);
        let end = self.trigger.range_end.resolve(anchors, viewport);
        match (start, end) {
            (Ok(s), Ok(e)) => {
                debug!("timeline `{}` resolved to [{s:.1}, {e:.1}]px", self.name);
                self.resolved = Some((s, e));
                if self.state == TimelineState::Idle {
                    self.state = TimelineState::Armed;
                }
                true
            }
            // Anchor not measurable yet: stay idle, retry next frame
            _ => false,
        }
    }

    /// Advance one frame and write outputs. `dt` is the frame delta in
    /// seconds, `now` the frame timestamp.
    pub fn evaluate(&mut self, ctx: &mut EvalCtx<'_>, dt: f32, now: f32) {
        if self.state == TimelineState::Settled {
            return;
        }
        if !self.ensure_resolved(ctx.anchors, ctx.viewport) {
            return;
        }
        let Some(range) = self.resolved else { return };
        let target = clamped_progress(ctx.scroll, range);

        match self.trigger.scrub {
            ScrubMode::Scrub => {
                self.shown = target;
                self.state = if target > 0.0 && target < 1.0 {
                    TimelineState::Scrubbing
                } else if target == 0.0 {
                    TimelineState::Armed
                } else {
                    // Fully past the range; still live, scroll can reverse
                    TimelineState::Scrubbing
                };
            }
            ScrubMode::Smooth(tau) => {
                let k = 1.0 - (-dt / tau.max(1e-3)).exp();
                self.shown += (target - self.shown) * k;
                if (target - self.shown).abs() < 1e-4 {
                    self.shown = target;
                }
                self.state = if self.shown == 0.0 {
                    TimelineState::Armed
                } else {
                    TimelineState::Scrubbing
                };
            }
            ScrubMode::OneShot(duration) => {
                if self.clip.is_none() {
                    if target <= 0.0 {
                        self.state = TimelineState::Armed;
                        return;
                    }
                    let mut clip = Clip::new(duration);
                    clip.start(now);
                    self.clip = Some(clip);
                    self.state = TimelineState::Scrubbing;
                }
                if let Some(clip) = self.clip.as_mut() {
                    clip.update(now);
                    self.shown = clip.progress();
                }
            }
        }

        // First evaluation renders immediately (establishing start
        // state); afterwards only progress movement triggers writes.
        if self.last_written == Some(self.shown) {
            return;
        }
        self.last_written = Some(self.shown);

        for phase in &mut self.phases {
            phase.evaluate(ctx, self.shown);
        }

        if let ScrubMode::OneShot(_) = self.trigger.scrub {
            if self.clip.as_ref().is_some_and(|c| c.is_complete()) {
                debug!("timeline `{}` settled", self.name);
                self.state = TimelineState::Settled;
            }
        }
    }
}

/// The set of bound timelines, evaluated in bind order every frame.
#[derive(Default)]
pub struct TimelineSet {
    timelines: Vec<Timeline>,
}

impl TimelineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a timeline. Binding the same name twice is rejected so a
    /// repeated ready signal cannot double up property writes.
    pub fn bind(&mut self, timeline: Timeline) -> Result<(), EngineError> {
        if self.timelines.iter().any(|t| t.name() == timeline.name()) {
            warn!("timeline `{}` already bound, ignoring rebind", timeline.name());
            return Err(EngineError::AlreadyBound(timeline.name().to_string()));
        }
        self.timelines.push(timeline);
        Ok(())
    }

    /// Drop a timeline by name, releasing its trigger. Used when a
    /// group is rebuilt (e.g. the reduced-motion variant swaps in).
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.timelines.len();
        self.timelines.retain(|t| t.name() != name);
        before != self.timelines.len()
    }

    pub fn evaluate_all(&mut self, ctx: &mut EvalCtx<'_>, dt: f32, now: f32) {
        for timeline in &mut self.timelines {
            timeline.evaluate(ctx, dt, now);
        }
    }

    pub fn invalidate_all(&mut self) {
        for timeline in &mut self.timelines {
            timeline.invalidate();
        }
    }

    pub fn required_anchors(&self) -> impl Iterator<Item = &str> {
        self.timelines
            .iter()
            .flat_map(|t| t.required_anchors())
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timeline> {
        self.timelines.iter()
    }

    /// Release every trigger. Teardown only.
    pub fn clear(&mut self) {
        self.timelines.clear();
    }
}
