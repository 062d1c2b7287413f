//! Conversions between screen pixels and perspective world space.
//!
//! The camera sits at (0, 0, z) looking down -Z with no rotation, so the
//! projection reduces to similar triangles against the vertical FOV. Both
//! conversions are pure and must be re-invoked with a fresh viewport every
//! evaluation; nothing here is cached.

use crate::gfx::math::{Vec2, Vec3};

/// Minimum camera-relative depth. Anything at or behind the camera is
/// clamped here instead of dividing by zero.
const MIN_DEPTH: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Camera distance from the z=0 plane, in world units.
    pub z: f32,
    /// Vertical field of view, degrees.
    pub fov_deg: f32,
}

impl Camera {
    pub fn new(z: f32, fov_deg: f32) -> Self {
        Self { z, fov_deg }
    }

    fn half_fov_tan(&self) -> f32 {
        (self.fov_deg.to_radians() * 0.5).tan()
    }

    /// Visible world-plane extents at z=0 for the given viewport.
    pub fn world_extents(&self, viewport: Vec2) -> Vec2 {
        let aspect = viewport.x / viewport.y;
        let height = 2.0 * self.half_fov_tan() * self.z;
        Vec2::new(height * aspect, height)
    }

    /// Map a screen-pixel position onto the z=0 world plane.
    pub fn screen_to_world_at_zero_depth(&self, px: Vec2, viewport: Vec2) -> Vec2 {
        let extents = self.world_extents(viewport);

        // NDC in [-1, 1], y up
        let ndc_x = (px.x / viewport.x) * 2.0 - 1.0;
        let ndc_y = -((px.y / viewport.y) * 2.0 - 1.0);

        Vec2::new(ndc_x * extents.x * 0.5, ndc_y * extents.y * 0.5)
    }

    /// Project a world position to screen pixels.
    pub fn world_to_screen(&self, position: Vec3, viewport: Vec2) -> Vec2 {
        let aspect = viewport.x / viewport.y;
        let tan = self.half_fov_tan();

        // Camera-relative depth; guard against objects at/behind the camera
        let depth = (self.z - position.z).max(MIN_DEPTH);

        let ndc_x = (position.x / depth) / (tan * aspect);
        let ndc_y = (position.y / depth) / tan;

        Vec2::new(
            (ndc_x + 1.0) * 0.5 * viewport.x,
            (1.0 - (ndc_y + 1.0) * 0.5) * viewport.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2 { x: 1280.0, y: 800.0 };

    fn camera() -> Camera {
        Camera::new(5.0, 50.0)
    }

    #[test]
    fn viewport_center_maps_to_world_origin() {
        let w = camera().screen_to_world_at_zero_depth(Vec2::new(640.0, 400.0), VIEWPORT);
        assert!(w.x.abs() < 1e-5, "x = {}", w.x);
        assert!(w.y.abs() < 1e-5, "y = {}", w.y);
    }

    #[test]
    fn top_left_maps_to_world_corner() {
        let cam = camera();
        let extents = cam.world_extents(VIEWPORT);
        let w = cam.screen_to_world_at_zero_depth(Vec2::ZERO, VIEWPORT);
        assert!((w.x - (-extents.x * 0.5)).abs() < 1e-4);
        assert!((w.y - (extents.y * 0.5)).abs() < 1e-4);
    }

    #[test]
    fn behind_camera_depth_is_guarded() {
        let cam = camera();
        let px = cam.world_to_screen(Vec3::new(1.0, 1.0, 6.0), VIEWPORT);
        assert!(px.x.is_finite());
        assert!(px.y.is_finite());
    }

    proptest! {
        #[test]
        fn screen_world_round_trip(
            x in 0.0f32..1280.0,
            y in 0.0f32..800.0,
        ) {
            let cam = camera();
            let world = cam.screen_to_world_at_zero_depth(Vec2::new(x, y), VIEWPORT);
            let back = cam.world_to_screen(Vec3::new(world.x, world.y, 0.0), VIEWPORT);
            prop_assert!((back.x - x).abs() < 1e-2, "x: {} -> {}", x, back.x);
            prop_assert!((back.y - y).abs() < 1e-2, "y: {} -> {}", y, back.y);
        }
    }
}
