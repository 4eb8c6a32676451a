//! Per-pixel warp: maps a UV coordinate to the UV it should sample from.
//!
//! The sign of every shape parameter is meaningful. Rather than a cascade of
//! flag checks, the signs are resolved once into a [`WarpVariant`] which the
//! per-pixel code then applies without further branching on parameters.

use crate::config::ShapeParams;
use crate::constants::{COMPRESSION_STRENGTH, FALLOFF_BAND};
use crate::sdf::{rounded_rect_sdf, smoothstep};
use glam::DVec2;

/// How the falloff value becomes the effect multiplier.
///
/// | depth<0 or intensity<0 | roundness<0 | variant              | multiplier        |
/// |------------------------|-------------|----------------------|-------------------|
/// | no                     | no          | `Magnify`            | `s`               |
/// | yes                    | no          | `Compress`           | `1 - 0.7s`        |
/// | no                     | yes         | `InvertedMagnify`    | `1 - s`           |
/// | yes                    | yes         | `InvertedCompress`   | `1 - (1 - 0.7s)`  |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplier {
    Magnify,
    Compress,
    InvertedMagnify,
    InvertedCompress,
}

impl Multiplier {
    #[inline]
    pub fn apply(self, scaled: f64) -> f64 {
        match self {
            Multiplier::Magnify => scaled,
            Multiplier::Compress => 1.0 - scaled * COMPRESSION_STRENGTH,
            Multiplier::InvertedMagnify => 1.0 - scaled,
            Multiplier::InvertedCompress => 1.0 - (1.0 - scaled * COMPRESSION_STRENGTH),
        }
    }
}

/// Per-axis mapping from centred coordinate to target coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisWarp {
    /// `i * m + 0.5`
    Direct,
    /// `i * (2 - m) + 0.5`, chosen by a negative shape extent on that axis.
    Reversed,
}

impl AxisWarp {
    #[inline]
    fn from_extent(extent: f64) -> Self {
        if extent < 0.0 {
            AxisWarp::Reversed
        } else {
            AxisWarp::Direct
        }
    }

    #[inline]
    pub fn apply(self, centred: f64, multiplier: f64) -> f64 {
        match self {
            AxisWarp::Direct => centred * multiplier + 0.5,
            AxisWarp::Reversed => centred * (2.0 - multiplier) + 0.5,
        }
    }
}

/// Resolved sign decisions for one parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarpVariant {
    pub multiplier: Multiplier,
    pub x: AxisWarp,
    pub y: AxisWarp,
}

impl WarpVariant {
    pub fn from_params(params: &ShapeParams) -> Self {
        let compress = params.depth < 0.0 || params.intensity < 0.0;
        let invert = params.roundness < 0.0;
        let multiplier = match (compress, invert) {
            (false, false) => Multiplier::Magnify,
            (true, false) => Multiplier::Compress,
            (false, true) => Multiplier::InvertedMagnify,
            (true, true) => Multiplier::InvertedCompress,
        };
        Self {
            multiplier,
            x: AxisWarp::from_extent(params.shape_width),
            y: AxisWarp::from_extent(params.shape_height),
        }
    }
}

/// Sign-independent shape data plus the resolved variant.
///
/// Built once per rasterization so the inner loop only does arithmetic.
#[derive(Clone, Copy, Debug)]
pub struct Warp {
    half_extents: DVec2,
    radius: f64,
    intensity: f64,
    variant: WarpVariant,
}

impl Warp {
    pub fn new(params: &ShapeParams) -> Self {
        Self {
            half_extents: DVec2::new(params.shape_width.abs(), params.shape_height.abs()),
            radius: params.roundness.abs(),
            intensity: params.intensity.abs(),
            variant: WarpVariant::from_params(params),
        }
    }

    #[inline]
    pub fn variant(&self) -> WarpVariant {
        self.variant
    }

    /// Target UV for the source UV `uv`.
    #[inline]
    pub fn displace(&self, uv: DVec2) -> DVec2 {
        let centred = uv - DVec2::splat(0.5);
        let distance = rounded_rect_sdf(centred, self.half_extents, self.radius);
        let raw = smoothstep(FALLOFF_BAND, 0.0, distance - self.intensity);
        let scaled = smoothstep(0.0, 1.0, raw);
        let m = self.variant.multiplier.apply(scaled);
        DVec2::new(
            self.variant.x.apply(centred.x, m),
            self.variant.y.apply(centred.y, m),
        )
    }
}

/// One-shot form of [`Warp::displace`].
pub fn fragment(uv: DVec2, params: &ShapeParams) -> DVec2 {
    Warp::new(params).displace(uv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(intensity: f64, roundness: f64, w: f64, h: f64, depth: f64) -> ShapeParams {
        ShapeParams {
            intensity,
            roundness,
            shape_width: w,
            shape_height: h,
            depth,
        }
    }

    #[test]
    fn decision_table_covers_sign_combinations() {
        let v = WarpVariant::from_params(&params(0.15, 0.6, 0.3, 0.2, 1.0));
        assert_eq!(v.multiplier, Multiplier::Magnify);
        assert_eq!((v.x, v.y), (AxisWarp::Direct, AxisWarp::Direct));

        let v = WarpVariant::from_params(&params(0.15, 0.6, 0.3, 0.2, -1.0));
        assert_eq!(v.multiplier, Multiplier::Compress);

        let v = WarpVariant::from_params(&params(-0.15, 0.6, 0.3, 0.2, 1.0));
        assert_eq!(v.multiplier, Multiplier::Compress);

        let v = WarpVariant::from_params(&params(0.15, -0.6, 0.3, 0.2, 1.0));
        assert_eq!(v.multiplier, Multiplier::InvertedMagnify);

        let v = WarpVariant::from_params(&params(-0.15, -0.6, -0.3, 0.2, 1.0));
        assert_eq!(v.multiplier, Multiplier::InvertedCompress);
        assert_eq!((v.x, v.y), (AxisWarp::Reversed, AxisWarp::Direct));

        let v = WarpVariant::from_params(&params(0.15, 0.6, 0.3, -0.2, 0.0));
        assert_eq!((v.x, v.y), (AxisWarp::Direct, AxisWarp::Reversed));
    }

    #[test]
    fn multiplier_table_values() {
        assert_eq!(Multiplier::Magnify.apply(0.5), 0.5);
        assert!((Multiplier::Compress.apply(1.0) - 0.3).abs() < 1e-12);
        assert_eq!(Multiplier::InvertedMagnify.apply(0.25), 0.75);
        assert!((Multiplier::InvertedCompress.apply(1.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn centre_maps_to_centre() {
        for p in [
            params(0.15, 0.6, 0.3, 0.2, 0.0),
            params(-0.5, -0.2, -0.3, -0.4, -2.0),
        ] {
            let out = fragment(DVec2::splat(0.5), &p);
            assert_eq!(out, DVec2::splat(0.5));
        }
    }

    #[test]
    fn inside_shape_is_identity_for_default_params() {
        // Deep inside the shape the falloff saturates at 1, so the multiplier is
        // 1 and the warp leaves the coordinate untouched.
        let p = params(0.15, 0.6, 0.3, 0.2, 0.0);
        let uv = DVec2::new(0.45, 0.55);
        let out = fragment(uv, &p);
        assert!((out - uv).length() < 1e-12);
    }

    #[test]
    fn outside_shape_pulls_towards_centre() {
        // Tiny shape with no intensity: the corner sits near the outer edge of
        // the falloff band, so the multiplier is close to 0 and the corner
        // samples from just short of the centre.
        let p = params(0.0, 0.0, 0.01, 0.01, 0.0);
        let out = fragment(DVec2::new(0.0, 0.0), &p);
        assert!(out.x > 0.45 && out.x < 0.5, "x = {}", out.x);
        assert!(out.y > 0.45 && out.y < 0.5, "y = {}", out.y);
    }

    #[test]
    fn reversed_axis_pushes_outward() {
        let p = params(0.0, 0.0, -0.01, 0.01, 0.0);
        let out = fragment(DVec2::new(0.0, 0.0), &p);
        // x uses (2 - m) and lands beyond the opposite edge, y is pulled in.
        assert!(out.x < -0.45, "x = {}", out.x);
        assert!(out.y > 0.45 && out.y < 0.5, "y = {}", out.y);
    }
}
