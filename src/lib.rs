//! Scroll-driven celestial animation engine.
//!
//! `nocturne` maps a smoothed scroll offset onto multi-phase timelines
//! that write transforms for a fixed set of animatable entities (sun,
//! moon, project cubes, heading glyphs), paints a parallax starfield to a
//! raster surface, and converts between screen pixels and a
//! perspective-projected world. The page-composition layer sits behind
//! the [`engine::Host`] trait: it supplies viewport geometry, named
//! anchor rects and a drawing surface, registers entities, feeds
//! scroll/resize events, and reads transforms back after every frame.
//!
//! ```no_run
//! use nocturne::{Config, Engine, EntityId, EntityKind, Event, Transform};
//! # struct Page;
//! # impl nocturne::Host for Page {
//! #     fn viewport(&self) -> nocturne::gfx::math::Vec2 { nocturne::gfx::math::Vec2::new(1280.0, 800.0) }
//! #     fn anchor_rect(&self, _: &str) -> Option<nocturne::gfx::math::Rect> { None }
//! #     fn surface(&mut self) -> Option<&mut dyn nocturne::Surface> { None }
//! #     fn sync_scene(&mut self, _: &nocturne::Registry) -> anyhow::Result<()> { Ok(()) }
//! # }
//!
//! let mut page = Page;
//! let mut engine = Engine::new(Config::default());
//! engine.register_entity(EntityId::sun(), EntityKind::Object3D, Transform::default())?;
//! // ... register moon, cubes, glyphs ...
//! engine.start(&mut page);
//! engine.entities_ready();
//!
//! // per display refresh:
//! engine.handle_event(Event::Scroll { offset: 640.0 });
//! engine.frame(0.016, &mut page);
//! # Ok::<(), nocturne::EngineError>(())
//! ```

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod frame;
pub mod gfx;
pub mod perf;
pub mod registry;
pub mod scroll;
pub mod timeline;

pub use camera::Camera;
pub use config::Config;
pub use engine::{Engine, Event, Host};
pub use error::EngineError;
pub use gfx::starfield::Starfield;
pub use gfx::surface::{SoftwareSurface, Surface};
pub use registry::{EntityId, EntityKind, Registry, Side, Transform};
pub use scroll::{ScrollSample, ScrollSource};
pub use timeline::{ScrollMarker, ScrubMode, Timeline, TimelineState, Trigger};
