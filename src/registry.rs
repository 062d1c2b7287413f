//! Registry of animatable targets.
//!
//! The registry is the single owner of entity transform state: timelines
//! write through it, the renderer and the host scene read from it, and
//! nothing holds parallel copies. Ids are stable well-known names the
//! composition layer registers before signalling readiness.

use std::collections::HashMap;
use std::fmt;

use log::warn;

use crate::error::EngineError;
use crate::gfx::math::Vec3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn sun() -> Self {
        Self::new("sun")
    }

    pub fn moon() -> Self {
        Self::new("moon")
    }

    pub fn cube(side: Side, index: usize) -> Self {
        Self::new(format!("cube-{}-{index}", side.name()))
    }

    pub fn glyph(index: usize) -> Self {
        Self::new(format!("glyph-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Orbit/yaw direction: right-side entities turn positive.
    pub fn direction(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A scene object; position/rotation/scale are world units.
    Object3D,
    /// A DOM element; position is a CSS translate offset in logical px.
    DomElement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler rotation, radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimatableEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub transform: Transform,
}

#[derive(Debug, Default)]
pub struct Registry {
    entities: HashMap<EntityId, AnimatableEntity>,
    writes: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity. Re-registering a live id signals a
    /// lifecycle bug upstream and is rejected.
    pub fn register(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        initial: Transform,
    ) -> Result<(), EngineError> {
        if self.entities.contains_key(&id) {
            warn!("rejecting duplicate registration of entity `{id}`");
            return Err(EngineError::DuplicateRegistration(id.as_str().to_string()));
        }
        self.entities.insert(
            id.clone(),
            AnimatableEntity {
                id,
                kind,
                transform: initial,
            },
        );
        Ok(())
    }

    pub fn unregister(&mut self, id: &EntityId) -> Option<AnimatableEntity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&AnimatableEntity> {
        self.entities.get(id)
    }

    /// Mutable access to a transform. Every call counts as one write;
    /// the counter backs bind-idempotence checks and frame diagnostics.
    pub fn transform_mut(&mut self, id: &EntityId) -> Option<&mut Transform> {
        let entity = self.entities.get_mut(id)?;
        self.writes += 1;
        Some(&mut entity.transform)
    }

    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimatableEntity> {
        self.entities.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = Registry::new();
        reg.register(EntityId::sun(), EntityKind::Object3D, Transform::default())
            .unwrap();

        let err = reg
            .register(EntityId::sun(), EntityKind::Object3D, Transform::default())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateRegistration("sun".to_string())
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_then_register_is_fine() {
        let mut reg = Registry::new();
        let id = EntityId::cube(Side::Left, 0);
        reg.register(id.clone(), EntityKind::DomElement, Transform::default())
            .unwrap();
        assert!(reg.unregister(&id).is_some());
        assert!(reg
            .register(id, EntityKind::DomElement, Transform::default())
            .is_ok());
    }

    #[test]
    fn writes_are_counted() {
        let mut reg = Registry::new();
        reg.register(EntityId::moon(), EntityKind::Object3D, Transform::default())
            .unwrap();
        assert_eq!(reg.write_count(), 0);

        reg.transform_mut(&EntityId::moon()).unwrap().opacity = 0.5;
        reg.transform_mut(&EntityId::moon()).unwrap().opacity = 0.25;
        assert_eq!(reg.write_count(), 2);
        assert!(reg.transform_mut(&EntityId::sun()).is_none());
        assert_eq!(reg.write_count(), 2);
    }

    #[test]
    fn well_known_ids_format() {
        assert_eq!(EntityId::cube(Side::Right, 3).as_str(), "cube-right-3");
        assert_eq!(EntityId::glyph(11).as_str(), "glyph-11");
    }
}
