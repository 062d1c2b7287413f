//! Raster surface abstraction for the starfield.
//!
//! The engine draws in logical pixels; a surface applies the device pixel
//! ratio exactly once when rasterizing. `SoftwareSurface` is the built-in
//! CPU target; a host may implement [`Surface`] over its own canvas
//! instead and blit however it likes.

use crate::gfx::math::Vec2;

pub trait Surface {
    fn logical_size(&self) -> Vec2;

    /// Reallocate for a new logical size and pixel ratio.
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32);

    /// Clear to fully transparent.
    fn clear(&mut self);

    /// Fill an antialiased white disc at a logical-pixel position.
    fn fill_circle(&mut self, center: Vec2, radius: f32, opacity: f32);
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// CPU rasterizer over an RGBA8 buffer sized in physical pixels.
pub struct SoftwareSurface {
    logical: Vec2,
    pixel_ratio: f32,
    phys_width: usize,
    phys_height: usize,
    pixels: Vec<Pixel>,
}

impl SoftwareSurface {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let mut surface = Self {
            logical: Vec2::ZERO,
            pixel_ratio: 1.0,
            phys_width: 0,
            phys_height: 0,
            pixels: Vec::new(),
        };
        surface.resize(width, height, pixel_ratio);
        surface
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn physical_size(&self) -> (usize, usize) {
        (self.phys_width, self.phys_height)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Raw RGBA bytes, for handing to whatever presents the buffer.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn blend(&mut self, x: usize, y: usize, coverage: f32) {
        let px = &mut self.pixels[y * self.phys_width + x];
        // White source over dst: out = dst + (255 - dst) * a, per channel
        let over = |dst: u8| -> u8 { (dst as f32 + (255.0 - dst as f32) * coverage).round() as u8 };
        px.r = over(px.r);
        px.g = over(px.g);
        px.b = over(px.b);
        px.a = over(px.a);
    }
}

impl Surface for SoftwareSurface {
    fn logical_size(&self) -> Vec2 {
        self.logical
    }

    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.logical = Vec2::new(width.max(0.0), height.max(0.0));
        self.pixel_ratio = pixel_ratio.max(0.1);
        self.phys_width = (self.logical.x * self.pixel_ratio).round() as usize;
        self.phys_height = (self.logical.y * self.pixel_ratio).round() as usize;
        self.pixels = vec![Pixel::default(); self.phys_width * self.phys_height];
    }

    fn clear(&mut self) {
        self.pixels.fill(Pixel::default());
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, opacity: f32) {
        if self.phys_width == 0 || self.phys_height == 0 || radius <= 0.0 {
            return;
        }
        // Logical -> physical happens here and nowhere else
        let cx = center.x * self.pixel_ratio;
        let cy = center.y * self.pixel_ratio;
        let r = radius * self.pixel_ratio;
        let opacity = opacity.clamp(0.0, 1.0);

        let x0 = ((cx - r - 1.0).floor().max(0.0)) as usize;
        let y0 = ((cy - r - 1.0).floor().max(0.0)) as usize;
        let x1 = ((cx + r + 1.0).ceil() as usize).min(self.phys_width.saturating_sub(1));
        let y1 = ((cy + r + 1.0).ceil() as usize).min(self.phys_height.saturating_sub(1));

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                // One-pixel antialias band at the rim
                let coverage = (r - dist + 0.5).clamp(0.0, 1.0) * opacity;
                if coverage > 0.0 {
                    self.blend(x, y, coverage);
                }
            }
        }
    }
}
