pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Easing curves used by the choreography. Power1/Power2 follow the
/// quad/cubic family; OutExpo is the inertial-scroll ease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    Power1Out,
    Power1InOut,
    Power2Out,
    Power2InOut,
    OutExpo,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    (1.001 - 2f32.powf(-10.0 * t)).min(1.0)
                }
            }
        }
    }
}

/// A time-based clip: fixed duration, progress driven by the frame clock.
/// One-shot entrance timelines run a clip once their trigger arms; scrub
/// timelines never touch this.
#[derive(Debug, Clone)]
pub struct Clip {
    pub start_time: f32,
    pub duration: f32,
    pub current_time: f32,
}

impl Clip {
    pub fn new(duration: f32) -> Self {
        Self {
            start_time: 0.0,
            duration,
            current_time: 0.0,
        }
    }

    pub fn start(&mut self, now: f32) {
        self.start_time = now;
        self.current_time = now;
    }

    pub fn update(&mut self, now: f32) {
        self.current_time = now;
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let elapsed = self.current_time - self.start_time;
        (elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_hit_endpoints() {
        for ease in [
            Ease::Linear,
            Ease::Power1Out,
            Ease::Power1InOut,
            Ease::Power2Out,
            Ease::Power2InOut,
            Ease::OutExpo,
        ] {
            assert!(ease.apply(0.0).abs() < 1e-2, "{ease:?} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-2, "{ease:?} at 1");
        }
    }

    #[test]
    fn eases_are_monotonic() {
        for ease in [
            Ease::Linear,
            Ease::Power1Out,
            Ease::Power1InOut,
            Ease::Power2Out,
            Ease::Power2InOut,
        ] {
            let mut prev = ease.apply(0.0);
            for i in 1..=100 {
                let v = ease.apply(i as f32 / 100.0);
                assert!(v >= prev - 1e-6, "{ease:?} dipped at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn clip_progress_clamps() {
        let mut clip = Clip::new(2.0);
        clip.start(10.0);
        clip.update(9.0);
        assert_eq!(clip.progress(), 0.0);
        clip.update(11.0);
        assert!((clip.progress() - 0.5).abs() < 1e-6);
        clip.update(13.0);
        assert_eq!(clip.progress(), 1.0);
        assert!(clip.is_complete());
    }
}
