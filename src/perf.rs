//! Frame-rate bookkeeping, logged once per second.

use log::{debug, warn};

pub struct FpsMonitor {
    frames: u32,
    window_start: Option<f64>,
    fps: u32,
}

impl FpsMonitor {
    pub fn new() -> Self {
        Self {
            frames: 0,
            window_start: None,
            fps: 0,
        }
    }

    pub fn tick(&mut self, now_s: f64) {
        // The first tick only opens the window
        let Some(start) = self.window_start else {
            self.window_start = Some(now_s);
            return;
        };
        self.frames += 1;

        let elapsed = now_s - start;
        if elapsed >= 1.0 {
            self.fps = (self.frames as f64 / elapsed).round() as u32;
            self.frames = 0;
            self.window_start = Some(now_s);

            if self.fps < 30 {
                warn!("low frame rate: {} fps", self.fps);
            } else {
                debug!("{} fps", self.fps);
            }
        }
    }

    pub fn current_fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FpsMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_settles_after_a_full_window() {
        let mut monitor = FpsMonitor::new();
        for i in 0..=60 {
            monitor.tick(i as f64 / 60.0);
        }
        assert_eq!(monitor.current_fps(), 60);
    }

    #[test]
    fn fps_is_zero_before_first_window() {
        let mut monitor = FpsMonitor::new();
        monitor.tick(0.0);
        monitor.tick(0.5);
        assert_eq!(monitor.current_fps(), 0);
    }
}
