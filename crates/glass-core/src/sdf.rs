//! Rounded-rectangle signed distance with sign-carrying extents.

use glam::DVec2;

/// Hermite interpolation between `edge0` and `edge1`, clamped to `[0, 1]`.
///
/// `edge0 > edge1` is allowed and yields a falling curve.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Distance from `p` to a rounded rectangle centred at the origin.
///
/// Every geometric input is taken by magnitude. If either half extent was
/// negative the result is negated, which turns the inside of the shape into
/// the outside; all "negative dimension" effects build on this rule.
pub fn rounded_rect_sdf(p: DVec2, half_extents: DVec2, corner_radius: f64) -> f64 {
    let half = half_extents.abs();
    let radius = corner_radius.abs();

    let q = p.abs() - half + DVec2::splat(radius);
    let distance = q.max_element().min(0.0) + q.max(DVec2::ZERO).length() - radius;

    if half_extents.x < 0.0 || half_extents.y < 0.0 {
        -distance
    } else {
        distance
    }
}

/// Scalar convenience form of [`rounded_rect_sdf`].
#[inline]
pub fn sdf(x: f64, y: f64, half_width: f64, half_height: f64, corner_radius: f64) -> f64 {
    rounded_rect_sdf(
        DVec2::new(x, y),
        DVec2::new(half_width, half_height),
        corner_radius,
    )
}
