pub mod celestial;
pub mod cubes;
pub mod glyphs;
pub mod sections;

use rand::rngs::StdRng;

use crate::registry::EntityId;
use crate::timeline::Timeline;

/// Well-known anchor names the composition layer must expose. Cube rest
/// anchors use the cube entity-id strings directly.
pub mod anchors {
    pub const BODY: &str = "body";
    pub const LANDING: &str = "landing";
    pub const PORTFOLIO: &str = "portfolio";
    pub const ABOUT: &str = "about";
    pub const ABOUT_IMAGE: &str = "about-image";
    pub const CONTACT: &str = "contact";
}

/// A choreography group: owns the recipe for one set of timelines.
/// The engine builds each group once its required entities exist and
/// binds the result; rebuilding (reduced-motion toggle) goes through the
/// same seam.
pub trait Choreography {
    fn name(&self) -> &'static str;

    /// Entities that must be registered before this group can bind.
    fn required_entities(&self) -> Vec<EntityId>;

    /// Anchors whose rects must be measured for triggers and targets.
    fn required_anchors(&self) -> Vec<String>;

    fn build(&self, rng: &mut StdRng) -> Vec<Timeline>;
}
