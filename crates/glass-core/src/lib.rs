//! Liquid glass effect engine.
//!
//! Generates displacement fields from a rounded-rectangle SDF, memoizes them,
//! composes the filter graph and backdrop filter string, and keeps a surface
//! in sync with config and drag input through a one-task-per-frame scheduler.
//! Platform code lives in the host crates; everything here is pure Rust.

pub mod cache;
pub mod config;
pub mod constants;
pub mod drag;
pub mod effect;
pub mod error;
pub mod field;
pub mod filter;
pub mod fragment;
pub mod layout;
pub mod scheduler;
pub mod sdf;
pub mod surface;

pub use cache::{CacheStats, CpuRasterizer, Eviction, FieldCache, Rasterizer};
pub use config::{GlassConfig, ShapeParams, StyleParams};
pub use drag::{
    DragBounds, DragEvent, DragMachine, DragSession, DragState, ExclusiveSession, InputCapture,
    PointerId, PointerInput,
};
pub use effect::{Applied, EffectStats, GlassEffect};
pub use error::{GlassError, Result};
pub use field::{Field, FieldKey};
pub use filter::{compose_filter, ComposedFilter, FilterGraph, FilterPrimitive};
pub use layout::{BoundingBox, Cursor, EffectBox, OverlayLayout, Position};
pub use scheduler::{FrameSource, FrameToken, ManualFrames, UpdateScheduler};
pub use surface::{MeasureMode, Surface};

/// Rasterize a field without caching. Deterministic for equal inputs.
pub fn generate_field(width: f64, height: f64, shape: &ShapeParams) -> Field {
    field::rasterize(width, height, shape)
}
