//! Displacement field rasterization and bitmap encoding.

use crate::config::ShapeParams;
use crate::constants::{MAX_RASTER_PIXELS, MAX_SCALE_NORMALIZATION, NEUTRAL_BYTE};
use crate::error::{GlassError, Result};
use crate::fragment::Warp;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use glam::DVec2;
use image::{ImageFormat, RgbaImage};
use std::hash::{Hash, Hasher};
use std::io::Cursor;

/// An encoded displacement bitmap.
///
/// `data` is RGBA, `width * height * 4` bytes. Red and green carry the x and
/// y displacement, blue is zero and alpha is fully opaque. `max_scale` is the
/// factor a consumer multiplies the decoded `[-0.5, 0.5]` range by.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub max_scale: f64,
}

impl Field {
    /// The 1x1 transparent, zero-displacement field used for degenerate input.
    pub fn neutral() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![0; 4],
            max_scale: 0.0,
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.max_scale == 0.0 && self.data.len() == 4 && self.data[3] == 0
    }

    /// RGBA bytes at `(x, y)`, `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// PNG encoding of `data`.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let image = RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            GlassError::InvalidGeometry {
                width: self.width as f64,
                height: self.height as f64,
            },
        )?;
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// `data:` URI suitable for an image-source filter primitive.
    pub fn to_data_uri(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

/// Cache key: rasterized size plus every shape-affecting parameter.
///
/// Floats are compared by bit pattern, so `0.0` and `-0.0` are distinct keys;
/// they also produce different warps once a sign flag is involved.
#[derive(Clone, Copy, Debug)]
pub struct FieldKey {
    pub width: u32,
    pub height: u32,
    pub shape: ShapeParams,
}

impl FieldKey {
    pub fn new(width: u32, height: u32, shape: ShapeParams) -> Self {
        Self {
            width,
            height,
            shape,
        }
    }

    fn bits(&self) -> (u32, u32, [u64; 5]) {
        let s = &self.shape;
        (
            self.width,
            self.height,
            [
                s.intensity.to_bits(),
                s.roundness.to_bits(),
                s.shape_width.to_bits(),
                s.shape_height.to_bits(),
                s.depth.to_bits(),
            ],
        )
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for FieldKey {}

impl Hash for FieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

#[inline]
fn within_budget(width: u32, height: u32) -> bool {
    (width as usize)
        .checked_mul(height as usize)
        .map_or(false, |area| area <= MAX_RASTER_PIXELS)
}

/// Rasterized size for a requested size, or `None` if it is unusable or
/// larger than [`MAX_RASTER_PIXELS`].
pub fn raster_size(width: f64, height: f64) -> Option<(u32, u32)> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    let w = width.floor();
    let h = height.floor();
    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return None;
    }
    let (w, h) = (w as u32, h as u32);
    within_budget(w, h).then_some((w, h))
}

/// Rasterize the warp over a `width` x `height` grid.
///
/// Non-positive or non-finite sizes yield [`Field::neutral`] and a warning.
pub fn rasterize(width: f64, height: f64, shape: &ShapeParams) -> Field {
    match raster_size(width, height) {
        Some((w, h)) => rasterize_key(&FieldKey::new(w, h, *shape)),
        None => {
            log::warn!("[field] invalid dimensions {}x{}; using neutral field", width, height);
            Field::neutral()
        }
    }
}

/// Rasterize an already validated key.
pub fn rasterize_key(key: &FieldKey) -> Field {
    let (w, h) = (key.width, key.height);
    if w == 0 || h == 0 || !within_budget(w, h) {
        log::warn!("[field] {}x{} is outside the raster budget; using neutral field", w, h);
        return Field::neutral();
    }
    let warp = Warp::new(&key.shape);
    let size = DVec2::new(w as f64, h as f64);

    let mut raw = Vec::with_capacity(w as usize * h as usize);
    let mut max_scale = 0.0_f64;
    for y in 0..h {
        for x in 0..w {
            let source = DVec2::new(x as f64, y as f64);
            let target = warp.displace(source / size) * size;
            let d = target - source;
            max_scale = max_scale.max(d.x.abs()).max(d.y.abs());
            raw.push(d);
        }
    }
    max_scale *= MAX_SCALE_NORMALIZATION;

    let mut data = Vec::with_capacity(raw.len() * 4);
    for d in raw {
        let (r, g) = if max_scale > 0.0 {
            (encode_channel(d.x, max_scale), encode_channel(d.y, max_scale))
        } else {
            (NEUTRAL_BYTE, NEUTRAL_BYTE)
        };
        data.extend_from_slice(&[r, g, 0, 255]);
    }

    log::trace!("[field] rasterized {}x{} max_scale={:.4}", w, h, max_scale);
    Field {
        width: w,
        height: h,
        data,
        max_scale,
    }
}

#[inline]
fn encode_channel(value: f64, max_scale: f64) -> u8 {
    ((value / max_scale + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8
}
