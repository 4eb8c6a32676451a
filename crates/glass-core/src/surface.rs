//! The rendering surface the engine drives.

use crate::error::Result;
use crate::filter::FilterGraph;
use crate::layout::{BoundingBox, OverlayLayout};

/// What to measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureMode {
    /// Bounding box of the host content the overlay sits on.
    Inline,
    /// Natural size of the content of a floating (draggable) overlay.
    Floating,
}

/// Host rendering surface.
///
/// `measure` returning `None` means the target is not mounted yet; the engine
/// skips that cycle silently. Every setter may fail, in which case the engine
/// logs the error and leaves whatever state the surface already shows.
pub trait Surface {
    fn measure(&self, mode: MeasureMode) -> Option<BoundingBox>;

    /// Register (or rebuild) the named filter graph.
    fn attach_filter(&mut self, graph: &FilterGraph) -> Result<()>;

    /// Point the graph's image stage at an encoded bitmap drawn at `width` x `height`.
    fn set_displacement_source(&mut self, data_uri: &str, width: f64, height: f64) -> Result<()>;

    fn set_displacement_scale(&mut self, scale: f64) -> Result<()>;

    fn apply_layout(&mut self, layout: &OverlayLayout) -> Result<()>;

    fn apply_backdrop_filter(&mut self, filter: &str) -> Result<()>;
}
