//! Headless demo driver: runs the engine against a synthetic page for a
//! scripted scroll-through and reports what the choreography did.

use std::collections::HashMap;

use anyhow::Result;
use log::info;

use nocturne::features::sections::{ABOUT_IMAGE_ENTITY, CONTACT_CARD_ENTITY};
use nocturne::gfx::math::{Rect, Vec2};
use nocturne::{
    Config, Engine, EntityId, EntityKind, Event, Host, Registry, Side, SoftwareSurface, Surface,
    Transform,
};

const VIEWPORT: Vec2 = Vec2 { x: 1280.0, y: 800.0 };

/// A synthetic page laid out like the real site: landing, portfolio with
/// a 6-row cube grid, about with an image, contact.
struct DemoPage {
    anchors: HashMap<String, Rect>,
    surface: SoftwareSurface,
}

impl DemoPage {
    fn new() -> Self {
        let mut anchors = HashMap::new();
        anchors.insert("landing".to_string(), Rect::new(0.0, 0.0, VIEWPORT.x, 800.0));
        anchors.insert("portfolio".to_string(), Rect::new(0.0, 800.0, VIEWPORT.x, 1800.0));
        anchors.insert("about".to_string(), Rect::new(0.0, 2600.0, VIEWPORT.x, 900.0));
        anchors.insert("about-image".to_string(), Rect::new(400.0, 2800.0, 480.0, 360.0));
        anchors.insert("contact".to_string(), Rect::new(0.0, 3500.0, VIEWPORT.x, 700.0));
        anchors.insert("body".to_string(), Rect::new(0.0, 0.0, VIEWPORT.x, 4200.0));
        for row in 0..6 {
            for (side, x) in [(Side::Left, 380.0), (Side::Right, 740.0)] {
                anchors.insert(
                    EntityId::cube(side, row).as_str().to_string(),
                    Rect::new(x, 1000.0 + row as f32 * 220.0, 160.0, 160.0),
                );
            }
        }
        Self {
            anchors,
            surface: SoftwareSurface::new(VIEWPORT.x, VIEWPORT.y, 1.0),
        }
    }
}

impl Host for DemoPage {
    fn viewport(&self) -> Vec2 {
        VIEWPORT
    }

    fn anchor_rect(&self, name: &str) -> Option<Rect> {
        self.anchors.get(name).copied()
    }

    fn surface(&mut self) -> Option<&mut dyn Surface> {
        Some(&mut self.surface)
    }

    fn sync_scene(&mut self, _registry: &Registry) -> Result<()> {
        Ok(())
    }
}

fn register_entities(engine: &mut Engine, config: &Config) -> Result<()> {
    for (id, x) in [(EntityId::sun(), -2.0), (EntityId::moon(), 2.0)] {
        engine.register_entity(
            id,
            EntityKind::Object3D,
            Transform {
                position: nocturne::gfx::math::Vec3::new(x, 3.0, 0.0),
                ..Transform::default()
            },
        )?;
    }
    for row in 0..config.cubes.rows {
        for side in [Side::Left, Side::Right] {
            engine.register_entity(
                EntityId::cube(side, row),
                EntityKind::DomElement,
                Transform::default(),
            )?;
        }
    }
    for i in 0..config.glyphs.count {
        engine.register_entity(EntityId::glyph(i), EntityKind::DomElement, Transform::default())?;
    }
    for id in [ABOUT_IMAGE_ENTITY, CONTACT_CARD_ENTITY] {
        engine.register_entity(EntityId::new(id), EntityKind::DomElement, Transform::default())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    println!("Starting nocturne demo...");

    let config = Config::load().unwrap_or_default();
    let mut page = DemoPage::new();
    let mut engine = Engine::new(config.clone());

    register_entities(&mut engine, &config)?;
    engine.start(&mut page);
    engine.entities_ready();

    // Scripted scroll-through: ease down the whole document over ten
    // seconds at 60 fps, then scrub back up to the portfolio section.
    let document_height = 4200.0 - VIEWPORT.y;
    let frames = 600usize;
    for i in 0..=frames {
        let now = i as f64 / 60.0;
        let t = i as f32 / frames as f32;
        let offset = document_height * nocturne::gfx::anim::Ease::Power1InOut.apply(t);
        engine.handle_event(Event::Scroll { offset });
        engine.frame(now, &mut page);

        if i % 120 == 0 {
            let sample = engine.last_sample();
            let sun = engine
                .registry()
                .get(&EntityId::sun())
                .map(|e| e.transform.position);
            info!(
                "t={now:5.2}s scroll={:7.1}px sun={sun:?}",
                sample.smoothed_offset
            );
        }
    }
    for i in 0..=120 {
        let now = 10.0 + i as f64 / 60.0;
        let offset = document_height * (1.0 - 0.6 * i as f32 / 120.0);
        engine.handle_event(Event::Scroll { offset });
        engine.frame(now, &mut page);
    }

    let lit = page
        .surface
        .pixels()
        .iter()
        .filter(|p| p.a > 0)
        .count();
    println!(
        "Done: {} star pixels lit, {} fps, sun at {:?}",
        lit,
        engine.current_fps(),
        engine
            .registry()
            .get(&EntityId::sun())
            .map(|e| e.transform.position)
    );

    engine.stop();
    Ok(())
}
