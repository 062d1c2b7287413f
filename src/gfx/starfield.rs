//! Parallax starfield.
//!
//! A fixed set of stars with per-star depth, size and twinkle phase.
//! Every tick recomputes visible positions from the scroll offset
//! (parallax) and elapsed time (twinkle) and paints discs to a
//! [`Surface`]. All positions are logical pixels; the surface applies the
//! device pixel ratio at draw time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gfx::math::Vec2;
use crate::gfx::surface::Surface;

/// Scales per-star twinkle speeds into the elapsed-seconds domain.
const TWINKLE_RATE: f32 = 0.6;
/// Scroll-to-parallax multiplier, further scaled by star depth.
const PARALLAX_FACTOR: f32 = 0.12;
/// Recycle band below the viewport so stars wrap instead of popping.
const WRAP_MARGIN: f32 = 100.0;
/// Stars above this radius get a halo disc.
const HALO_RADIUS: f32 = 1.0;
/// Below this viewport width halos are skipped.
const HALO_MIN_VIEWPORT: f32 = 768.0;

#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub base_position: Vec2,
    pub radius: f32,
    pub base_opacity: f32,
    pub twinkle_speed: f32,
    pub twinkle_phase: f32,
    /// Parallax sensitivity in [0.5, 1.0]; lower reads as farther away.
    pub depth: f32,
}

pub struct Starfield {
    stars: Vec<Star>,
    width: f32,
    height: f32,
    rng: StdRng,
}

impl Starfield {
    pub fn new(count: usize, width: f32, height: f32) -> Self {
        Self::with_rng(count, width, height, StdRng::from_entropy())
    }

    /// Seeded constructor; tests use this for reproducible fields.
    pub fn with_rng(count: usize, width: f32, height: f32, mut rng: StdRng) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let stars = (0..count)
            .map(|_| Star {
                base_position: Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
                radius: rng.gen_range(0.5..2.0),
                base_opacity: rng.gen_range(0.3..0.8),
                twinkle_speed: rng.gen_range(0.01..0.03),
                twinkle_phase: rng.gen_range(0.0..std::f32::consts::TAU),
                depth: rng.gen_range(0.5..1.0),
            })
            .collect();
        Self {
            stars,
            width,
            height,
            rng,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Regenerate every base position uniformly over the new bounds.
    /// Star count and per-star character (size, speed, depth) survive.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        let (width, height) = (self.width, self.height);
        for star in &mut self.stars {
            star.base_position =
                Vec2::new(self.rng.gen_range(0.0..width), self.rng.gen_range(0.0..height));
        }
    }

    /// Recompute and paint every star.
    pub fn tick(&self, scroll_offset: f32, elapsed_s: f32, surface: &mut dyn Surface) {
        surface.clear();
        let halos = self.width > HALO_MIN_VIEWPORT;

        for star in &self.stars {
            let twinkle =
                (elapsed_s * star.twinkle_speed * TWINKLE_RATE + star.twinkle_phase).sin();
            let opacity = (star.base_opacity + twinkle * 0.2).clamp(0.2, 1.0);

            let parallax_y = scroll_offset * star.depth * PARALLAX_FACTOR;
            let y = wrap_y(star.base_position.y - parallax_y, self.height);
            let pos = Vec2::new(star.base_position.x, y);

            surface.fill_circle(pos, star.radius, opacity);
            if halos && star.radius > HALO_RADIUS {
                surface.fill_circle(pos, star.radius * 2.0, opacity * 0.2);
            }
        }
    }
}

/// Wrap a vertical position into the recycle band [0, height + margin).
fn wrap_y(y: f32, height: f32) -> f32 {
    let band = height + WRAP_MARGIN;
    let wrapped = y % band;
    if wrapped < 0.0 {
        wrapped + band
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::surface::SoftwareSurface;
    use rand::SeedableRng;

    fn field(count: usize, w: f32, h: f32) -> Starfield {
        Starfield::with_rng(count, w, h, StdRng::seed_from_u64(7))
    }

    #[test]
    fn resize_keeps_count_and_rebounds_positions() {
        let mut sf = field(250, 375.0, 812.0);
        sf.resize(768.0, 1024.0);

        assert_eq!(sf.stars().len(), 250);
        for star in sf.stars() {
            assert!(star.base_position.x >= 0.0 && star.base_position.x < 768.0);
            assert!(star.base_position.y >= 0.0 && star.base_position.y < 1024.0);
        }
    }

    #[test]
    fn wrap_never_goes_negative() {
        let height = 800.0;
        let band = height + WRAP_MARGIN;
        // Parallax large enough to push far below the band several times over
        for base in [0.0f32, 350.0, 799.0] {
            for parallax in [900.0f32, 2700.0, 123456.0] {
                let y = wrap_y(base - parallax, height);
                assert!(y >= 0.0, "wrapped y {y} negative");
                assert!(y < band, "wrapped y {y} outside band");
            }
        }
    }

    #[test]
    fn wrap_is_identity_inside_viewport() {
        assert_eq!(wrap_y(350.0, 800.0), 350.0);
    }

    #[test]
    fn twinkle_opacity_stays_clamped() {
        let sf = field(100, 800.0, 600.0);
        for star in sf.stars() {
            for t in 0..200 {
                let twinkle =
                    (t as f32 * 0.3 * star.twinkle_speed * TWINKLE_RATE + star.twinkle_phase).sin();
                let opacity = (star.base_opacity + twinkle * 0.2).clamp(0.2, 1.0);
                assert!((0.2..=1.0).contains(&opacity));
            }
        }
    }

    #[test]
    fn tick_paints_onto_cleared_surface() {
        let sf = field(40, 64.0, 64.0);
        let mut surface = SoftwareSurface::new(64.0, 64.0, 1.0);
        sf.tick(0.0, 0.5, &mut surface);
        let lit = surface.pixels().iter().filter(|p| p.a > 0).count();
        assert!(lit > 0, "no star pixels drawn");
    }
}
