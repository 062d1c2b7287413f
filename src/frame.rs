//! Frame scheduler.
//!
//! One driver owns the per-frame stage order so "scroll sample → all
//! timeline evaluations → render → scene sync" is enforced here rather
//! than by incidental call order. Stages are registered at start in
//! canonical order and fanned out in registration order every frame.
//! Teardown clears the stage list synchronously; a stopped scheduler
//! yields no frames and therefore no further mutation anywhere.

use log::{debug, info};

/// Maximum believable frame delta; longer gaps (tab hidden, debugger)
/// are clamped so damped scrubs don't leap.
const MAX_DT: f32 = 0.1;
const FALLBACK_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SampleScroll,
    EvaluateTimelines,
    RenderStarfield,
    SyncScene,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    stages: Vec<Stage>,
    running: bool,
    last_tick: Option<f64>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the canonical stage order and start yielding frames.
    pub fn start(&mut self) {
        self.stages = vec![
            Stage::SampleScroll,
            Stage::EvaluateTimelines,
            Stage::RenderStarfield,
            Stage::SyncScene,
        ];
        self.running = true;
        self.last_tick = None;
        info!("frame scheduler started with {} stages", self.stages.len());
    }

    /// Halt synchronously and drop every registered stage.
    pub fn stop(&mut self) {
        if self.running {
            info!("frame scheduler stopped");
        }
        self.running = false;
        self.stages.clear();
        self.last_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Begin a frame at `now` (seconds). Returns the clamped frame delta,
    /// or `None` when stopped.
    pub fn begin_frame(&mut self, now: f64) -> Option<f32> {
        if !self.running {
            debug!("frame requested on stopped scheduler");
            return None;
        }
        let dt = match self.last_tick {
            Some(last) => ((now - last) as f32).clamp(0.0, MAX_DT),
            None => FALLBACK_DT,
        };
        self.last_tick = Some(now);
        Some(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_keep_canonical_order() {
        let mut sched = FrameScheduler::new();
        sched.start();
        assert_eq!(
            sched.stages(),
            [
                Stage::SampleScroll,
                Stage::EvaluateTimelines,
                Stage::RenderStarfield,
                Stage::SyncScene,
            ]
        );
    }

    #[test]
    fn stopped_scheduler_yields_no_frames() {
        let mut sched = FrameScheduler::new();
        sched.start();
        assert!(sched.begin_frame(0.0).is_some());

        sched.stop();
        assert!(sched.begin_frame(1.0).is_none());
        assert!(sched.stages().is_empty());
    }

    #[test]
    fn dt_is_clamped_and_defaults_on_first_frame() {
        let mut sched = FrameScheduler::new();
        sched.start();
        assert_eq!(sched.begin_frame(10.0), Some(FALLBACK_DT));
        let dt = sched.begin_frame(10.016).unwrap();
        assert!((dt - 0.016).abs() < 1e-4);
        // A five-second stall clamps
        assert_eq!(sched.begin_frame(15.0), Some(MAX_DT));
    }
}
