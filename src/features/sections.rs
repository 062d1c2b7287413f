//! Section entrance timelines: the about image and the contact card.

use rand::rngs::StdRng;

use crate::features::{anchors, Choreography};
use crate::gfx::anim::Ease;
use crate::registry::EntityId;
use crate::timeline::phase::{Phase, Property, PropertyCurve};
use crate::timeline::{ScrollMarker, ScrubMode, Timeline, Trigger};

pub const ABOUT_IMAGE_ENTITY: &str = "about-image";
pub const CONTACT_CARD_ENTITY: &str = "contact-card";

pub struct Sections;

impl Choreography for Sections {
    fn name(&self) -> &'static str {
        "sections"
    }

    fn required_entities(&self) -> Vec<EntityId> {
        vec![
            EntityId::new(ABOUT_IMAGE_ENTITY),
            EntityId::new(CONTACT_CARD_ENTITY),
        ]
    }

    fn required_anchors(&self) -> Vec<String> {
        vec![anchors::ABOUT.to_string(), anchors::CONTACT.to_string()]
    }

    fn build(&self, _rng: &mut StdRng) -> Vec<Timeline> {
        vec![about_image_timeline(), contact_timeline()]
    }
}

fn about_image_timeline() -> Timeline {
    let trigger = Trigger::new(
        ScrollMarker::new(anchors::ABOUT, 0.0, 0.6),
        ScrollMarker::new(anchors::ABOUT, 0.0, 0.3),
        ScrubMode::Scrub,
    );
    let deg20 = 20f32.to_radians();
    let phases = vec![Phase::curves(
        0.0,
        1.0,
        vec![EntityId::new(ABOUT_IMAGE_ENTITY)],
        vec![
            PropertyCurve::new(Property::Scale, 0.8, 1.0, Ease::Power2Out),
            PropertyCurve::new(Property::Opacity, 0.0, 1.0, Ease::Power2Out),
            PropertyCurve::new(Property::RotationY, -deg20, 0.0, Ease::Power2Out),
        ],
    )];
    Timeline::new("about-image-enter", trigger, phases)
}

fn contact_timeline() -> Timeline {
    let trigger = Trigger::new(
        ScrollMarker::new(anchors::CONTACT, 0.0, 0.8),
        ScrollMarker::new(anchors::CONTACT, 0.0, 0.5),
        ScrubMode::Scrub,
    );
    let phases = vec![Phase::curves(
        0.0,
        1.0,
        vec![EntityId::new(CONTACT_CARD_ENTITY)],
        vec![
            PropertyCurve::new(Property::PositionY, 50.0, 0.0, Ease::Power2Out),
            PropertyCurve::new(Property::Opacity, 0.0, 1.0, Ease::Power2Out),
        ],
    )];
    Timeline::new("contact-enter", trigger, phases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn both_entrances_build() {
        let mut rng = StdRng::seed_from_u64(1);
        let timelines = Sections.build(&mut rng);
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].name(), "about-image-enter");
        assert_eq!(timelines[1].name(), "contact-enter");
    }

    #[test]
    fn about_trigger_resolves_above_contact_trigger() {
        use crate::gfx::math::{Rect, Vec2};
        use crate::timeline::phase::AnchorMap;

        let mut map = AnchorMap::new();
        map.insert(anchors::ABOUT.to_string(), Rect::new(0.0, 2400.0, 1280.0, 900.0));
        map.insert(anchors::CONTACT.to_string(), Rect::new(0.0, 3300.0, 1280.0, 700.0));
        let viewport = Vec2::new(1280.0, 800.0);

        let about_start = ScrollMarker::new(anchors::ABOUT, 0.0, 0.6)
            .resolve(&map, viewport)
            .unwrap();
        let contact_start = ScrollMarker::new(anchors::CONTACT, 0.0, 0.8)
            .resolve(&map, viewport)
            .unwrap();
        assert!(about_start < contact_start);
    }
}
