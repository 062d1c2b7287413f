use thiserror::Error;

/// Errors raised at the engine's seams. None of these are fatal to the
/// page: callers either defer and retry (`ReferenceNotReady`), remeasure
/// (`LayoutStale`), or degrade a single subsystem and keep going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A named anchor or entity has not materialized yet.
    #[error("reference `{0}` is not ready")]
    ReferenceNotReady(String),

    /// Cached layout measurements were invalidated by a resize and have
    /// not been refreshed yet.
    #[error("layout measurements are stale")]
    LayoutStale,

    /// An entity id was registered twice without an unregister in
    /// between. This is a lifecycle bug upstream and is rejected.
    #[error("entity `{0}` is already registered")]
    DuplicateRegistration(String),

    /// A timeline name was bound twice.
    #[error("timeline `{0}` is already bound")]
    AlreadyBound(String),

    /// No raster surface is available; the starfield disables itself.
    #[error("render surface unavailable")]
    SurfaceUnavailable,
}
