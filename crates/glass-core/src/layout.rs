//! Overlay geometry derived from measurements and config.

use crate::config::GlassConfig;
use crate::constants::{
    AUTO_SIZE_FALLBACK, DEVICE_SAMPLE_SCALE, SHADOW_SPAN_MAX, SHADOW_SPAN_MIN, SHADOW_SPAN_UNIT,
};
use glam::DVec2;

/// Effect position in surface coordinates (the overlay centre when draggable).
pub type Position = DVec2;

/// Host measurement of the content the effect wraps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl BoundingBox {
    #[inline]
    pub fn center(&self) -> Position {
        DVec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Grab,
    Grabbing,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
        }
    }
}

/// Sizes for one recompute: the overlay box and the bitmap behind it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectBox {
    pub width: f64,
    pub height: f64,
    pub raster_width: u32,
    pub raster_height: u32,
}

impl EffectBox {
    /// Overlay box from content size and padding, at least 1x1.
    pub fn new(content_width: f64, content_height: f64, px: f64, py: f64) -> Self {
        let width = (content_width + 2.0 * px).max(1.0);
        let height = (content_height + 2.0 * py).max(1.0);
        Self {
            width,
            height,
            raster_width: ((width * DEVICE_SAMPLE_SCALE).floor() as u32).max(1),
            raster_height: ((height * DEVICE_SAMPLE_SCALE).floor() as u32).max(1),
        }
    }

    /// Resolve content size: explicit config wins, then the measurement.
    ///
    /// Draggable effects float free of their host, so a zero measurement falls
    /// back to a fixed size instead of collapsing the overlay.
    pub fn resolve(config: &GlassConfig, measured: &BoundingBox) -> Self {
        let pick = |explicit: Option<f64>, measured: f64| match explicit {
            Some(v) if v > 0.0 => v,
            _ if config.draggable && !(measured > 0.0) => AUTO_SIZE_FALLBACK,
            _ => measured,
        };
        let width = pick(config.width, measured.width);
        let height = pick(config.height, measured.height);
        Self::new(width, height, config.px, config.py)
    }
}

/// How the overlay element is placed and dressed.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayout {
    pub width: f64,
    pub height: f64,
    /// Top-left corner. Fixed-positioned in surface coordinates when
    /// draggable, otherwise relative to the host content.
    pub left: f64,
    pub top: f64,
    pub fixed: bool,
    pub border_radius: f64,
    pub box_shadow: String,
    pub cursor: Cursor,
}

impl OverlayLayout {
    pub fn new(config: &GlassConfig, effect_box: &EffectBox, position: Position, cursor: Cursor) -> Self {
        let (left, top) = if config.draggable {
            (
                position.x - effect_box.width / 2.0,
                position.y - effect_box.height / 2.0,
            )
        } else {
            (-config.px, -config.py)
        };
        Self {
            width: effect_box.width,
            height: effect_box.height,
            left,
            top,
            fixed: config.draggable,
            border_radius: config.border_radius,
            box_shadow: config
                .box_shadow
                .clone()
                .unwrap_or_else(|| box_shadow(effect_box.width, effect_box.height)),
            cursor,
        }
    }

    /// CSS `touch-action`. A floating overlay takes touch gestures itself so
    /// the browser does not pan the page and cancel the drag.
    pub fn touch_action(&self) -> &'static str {
        if self.fixed {
            "none"
        } else {
            "auto"
        }
    }
}

/// Drop shadow plus inner shade, scaled with the overlay size.
pub fn box_shadow(width: f64, height: f64) -> String {
    let k = (width + height).clamp(SHADOW_SPAN_MIN, SHADOW_SPAN_MAX) / SHADOW_SPAN_UNIT;
    let blur = round_half_up(4.0 * k);
    let spread = round_half_up(8.0 * k);
    let inset_blur = round_half_up(20.0 * k);
    let inset_offset = round_half_up(-10.0 * k);
    format!(
        "0 {blur}px {spread}px rgba(0, 0, 0, 0.25), 0 {inset_offset}px {inset_blur}px inset rgba(0, 0, 0, 0.15)"
    )
}

// Halves go towards +inf, so -2.5 becomes -2.
#[inline]
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
