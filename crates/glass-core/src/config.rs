//! Typed per-instance configuration.
//!
//! Every option has a compile-time default and a documented range. Values
//! outside the range are clamped and non-finite values fall back to the
//! default; nothing is ever rejected. Negative shape values are meaningful
//! (see [`crate::fragment`]) and are preserved.

use crate::constants::MAX_EXPLICIT_SIZE;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive numeric range with its default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        }
    }
}

pub const PADDING: Range = Range::new(0.0, 100.0, 0.0);
pub const BORDER_RADIUS: Range = Range::new(0.0, f64::MAX, 0.0);
pub const DEPTH: Range = Range::new(-5.0, 5.0, 0.0);
pub const BLUR: Range = Range::new(0.0, 10.0, 0.25);
pub const CONTRAST: Range = Range::new(0.0, 2.0, 1.0);
pub const BRIGHTNESS: Range = Range::new(0.0, 2.0, 1.0);
pub const SATURATION: Range = Range::new(0.0, 2.0, 1.0);
pub const DISPERSION: Range = Range::new(0.0, 3.0, 0.5);
pub const DISTORTION_INTENSITY: Range = Range::new(-1.0, 1.0, 0.15);
pub const ROUNDNESS: Range = Range::new(-1.0, 1.0, 0.6);
pub const SHAPE_WIDTH: Range = Range::new(-1.0, 1.0, 0.3);
pub const SHAPE_HEIGHT: Range = Range::new(-1.0, 1.0, 0.2);
pub const EXPLICIT_SIZE: Range = Range::new(0.0, MAX_EXPLICIT_SIZE, 0.0);
pub const MAX_POSITIONING_DURATION_MS: u64 = 10_000;

/// Options for one glass effect instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlassConfig {
    /// Explicit content width in px, at most 10000. `None` measures the host content.
    pub width: Option<f64>,
    /// Explicit content height in px, at most 10000. `None` measures the host content.
    pub height: Option<f64>,
    /// Horizontal padding around the content, 0 to 100 px.
    pub px: f64,
    /// Vertical padding around the content, 0 to 100 px.
    pub py: f64,
    /// Overlay corner radius in px, ≥ 0.
    pub border_radius: f64,
    /// Displacement strength, −5…5. Negative values compress.
    pub depth: f64,
    /// Backdrop blur in px, 0 to 10.
    pub blur: f64,
    /// Backdrop contrast multiplier, 0 to 2.
    pub contrast: f64,
    /// Backdrop brightness multiplier, 0 to 2.
    pub brightness: f64,
    /// Backdrop saturation multiplier, 0 to 2.
    pub saturation: f64,
    /// Chromatic dispersion offset in px, 0 to 3. Zero disables the sub-chain.
    pub dispersion: f64,
    /// Falloff offset, −1…1. Negative values compress.
    pub distortion_intensity: f64,
    /// Corner radius of the distortion shape, −1…1. Negative inverts.
    pub roundness: f64,
    /// Half width of the distortion shape in UV, −1…1. Negative mirrors x.
    pub shape_width: f64,
    /// Half height of the distortion shape in UV, −1…1. Negative mirrors y.
    pub shape_height: f64,
    /// Whether pointer drags move the effect.
    pub draggable: bool,
    /// Delay before a settled position is reported, 0 to 10000 ms.
    pub positioning_duration: u64,
    /// CSS box shadow. `None` derives one from the overlay size.
    pub box_shadow: Option<String>,
}

impl Default for GlassConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            px: PADDING.default,
            py: PADDING.default,
            border_radius: BORDER_RADIUS.default,
            depth: DEPTH.default,
            blur: BLUR.default,
            contrast: CONTRAST.default,
            brightness: BRIGHTNESS.default,
            saturation: SATURATION.default,
            dispersion: DISPERSION.default,
            distortion_intensity: DISTORTION_INTENSITY.default,
            roundness: ROUNDNESS.default,
            shape_width: SHAPE_WIDTH.default,
            shape_height: SHAPE_HEIGHT.default,
            draggable: false,
            positioning_duration: 0,
            box_shadow: None,
        }
    }
}

impl GlassConfig {
    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GlassConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Copy with every numeric option forced into its documented range.
    pub fn sanitized(&self) -> Self {
        let explicit = |v: Option<f64>| v.filter(|v| v.is_finite()).map(|v| EXPLICIT_SIZE.clamp(v));
        Self {
            width: explicit(self.width),
            height: explicit(self.height),
            px: PADDING.clamp(self.px),
            py: PADDING.clamp(self.py),
            border_radius: BORDER_RADIUS.clamp(self.border_radius),
            depth: DEPTH.clamp(self.depth),
            blur: BLUR.clamp(self.blur),
            contrast: CONTRAST.clamp(self.contrast),
            brightness: BRIGHTNESS.clamp(self.brightness),
            saturation: SATURATION.clamp(self.saturation),
            dispersion: DISPERSION.clamp(self.dispersion),
            distortion_intensity: DISTORTION_INTENSITY.clamp(self.distortion_intensity),
            roundness: ROUNDNESS.clamp(self.roundness),
            shape_width: SHAPE_WIDTH.clamp(self.shape_width),
            shape_height: SHAPE_HEIGHT.clamp(self.shape_height),
            draggable: self.draggable,
            positioning_duration: self.positioning_duration.min(MAX_POSITIONING_DURATION_MS),
            box_shadow: self.box_shadow.clone().filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn shape(&self) -> ShapeParams {
        ShapeParams {
            intensity: self.distortion_intensity,
            roundness: self.roundness,
            shape_width: self.shape_width,
            shape_height: self.shape_height,
            depth: self.depth,
        }
    }

    pub fn style(&self) -> StyleParams {
        StyleParams {
            blur: self.blur,
            depth: self.depth,
            dispersion: self.dispersion,
            contrast: Some(self.contrast),
            brightness: Some(self.brightness),
            saturation: Some(self.saturation),
        }
    }

    pub fn positioning_delay(&self) -> Duration {
        Duration::from_millis(self.positioning_duration)
    }
}

/// The parameters that change the displacement field. All are sign-significant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeParams {
    pub intensity: f64,
    pub roundness: f64,
    pub shape_width: f64,
    pub shape_height: f64,
    pub depth: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        GlassConfig::default().shape()
    }
}

/// Presentation parameters consumed by the filter composer only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleParams {
    pub blur: f64,
    pub depth: f64,
    pub dispersion: f64,
    pub contrast: Option<f64>,
    pub brightness: Option<f64>,
    pub saturation: Option<f64>,
}

impl Default for StyleParams {
    fn default() -> Self {
        GlassConfig::default().style()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let config =
            GlassConfig::from_json(r#"{"shapeWidth": -0.4, "draggable": true, "positioningDuration": 30}"#)
                .unwrap();
        assert_eq!(config.shape_width, -0.4);
        assert!(config.draggable);
        assert_eq!(config.positioning_duration, 30);
        assert_eq!(config.blur, 0.25);
        assert_eq!(config.dispersion, 0.5);
        assert_eq!(config.width, None);
    }

    #[test]
    fn out_of_range_values_are_clamped_not_rejected() {
        let config = GlassConfig {
            px: 500.0,
            depth: -12.0,
            roundness: 3.0,
            blur: f64::NAN,
            dispersion: -1.0,
            width: Some(f64::INFINITY),
            positioning_duration: 1_000_000,
            ..GlassConfig::default()
        }
        .sanitized();
        assert_eq!(config.px, 100.0);
        assert_eq!(config.depth, -5.0);
        assert_eq!(config.roundness, 1.0);
        assert_eq!(config.blur, 0.25);
        assert_eq!(config.dispersion, 0.0);
        assert_eq!(config.width, None);
        assert_eq!(config.positioning_duration, MAX_POSITIONING_DURATION_MS);
    }

    #[test]
    fn huge_explicit_size_is_clamped() {
        let config = GlassConfig {
            width: Some(1e10),
            height: Some(-3.0),
            ..GlassConfig::default()
        }
        .sanitized();
        assert_eq!(config.width, Some(MAX_EXPLICIT_SIZE));
        assert_eq!(config.height, Some(0.0));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GlassConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn shape_projection_keeps_signs() {
        let config = GlassConfig {
            distortion_intensity: -0.2,
            shape_height: -0.1,
            ..GlassConfig::default()
        };
        let shape = config.shape();
        assert_eq!(shape.intensity, -0.2);
        assert_eq!(shape.shape_height, -0.1);
        assert_eq!(shape.roundness, 0.6);
    }
}
