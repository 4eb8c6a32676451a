// Host-side laws for the evaluator, rasterizer and cache.

use glass_core::cache::{Eviction, FieldCache, Rasterizer};
use glass_core::field::{rasterize_key, Field, FieldKey};
use glass_core::sdf::sdf;
use glass_core::{generate_field, ShapeParams};
use proptest::prelude::*;
use std::cell::Cell;

fn shape_strategy() -> impl Strategy<Value = ShapeParams> {
    (-1.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64, -5.0..5.0f64).prop_map(
        |(intensity, roundness, shape_width, shape_height, depth)| ShapeParams {
            intensity,
            roundness,
            shape_width,
            shape_height,
            depth,
        },
    )
}

proptest! {
    #[test]
    fn centre_is_inside(w in 0.001..10.0f64, h in 0.001..10.0f64, frac in 0.0..1.0f64) {
        // Corner radius up to the smaller half extent.
        let r = frac * w.min(h);
        prop_assert!(sdf(0.0, 0.0, w, h, r) < 0.0);
    }

    #[test]
    fn negative_width_negates_distance(
        x in -2.0..2.0f64,
        y in -2.0..2.0f64,
        magnitude in 0.001..2.0f64,
        negative in any::<bool>(),
        h in 0.0..2.0f64,
        r in -1.0..1.0f64,
    ) {
        // Holds whenever the height is not itself negative; a negative height
        // already flips both sides.
        let w = if negative { -magnitude } else { magnitude };
        prop_assert_eq!(sdf(x, y, -w, h, r), -sdf(x, y, w, h, r));
    }

    #[test]
    fn sdf_is_total(
        x in proptest::num::f64::NORMAL,
        y in proptest::num::f64::NORMAL,
        w in -1e6..1e6f64,
        h in -1e6..1e6f64,
        r in -1e6..1e6f64,
    ) {
        let _ = sdf(x, y, w, h, r);
    }

    #[test]
    fn rasterization_is_deterministic(shape in shape_strategy(), w in 1u32..24, h in 1u32..24) {
        let a = generate_field(w as f64, h as f64, &shape);
        let b = generate_field(w as f64, h as f64, &shape);
        prop_assert_eq!(&a.data, &b.data);
        prop_assert_eq!(a.max_scale.to_bits(), b.max_scale.to_bits());
    }

    #[test]
    fn encoded_pixels_are_well_formed(shape in shape_strategy(), w in 1u32..24, h in 1u32..24) {
        let field = generate_field(w as f64, h as f64, &shape);
        prop_assert_eq!(field.data.len(), (w * h * 4) as usize);
        prop_assert!(field.max_scale >= 0.0 && field.max_scale.is_finite());
        for px in field.data.chunks_exact(4) {
            prop_assert_eq!(px[2], 0);
            prop_assert_eq!(px[3], 255);
        }
    }
}

#[test]
fn zero_width_is_degenerate_without_panicking() {
    let field = generate_field(0.0, 40.0, &ShapeParams::default());
    assert_eq!(field.max_scale, 0.0);
    assert_eq!(field.data.len(), 4);
    assert_eq!(field, Field::neutral());
}

#[test]
fn default_field_has_positive_scale() {
    let field = generate_field(60.0, 40.0, &ShapeParams::default());
    assert!(field.max_scale > 0.0);
    // The centre pixel is not displaced.
    let [r, g, _, _] = field.pixel(30, 20).unwrap();
    assert_eq!((r, g), (128, 128));
}

#[derive(Default)]
struct Counting {
    calls: Cell<usize>,
}

impl Rasterizer for Counting {
    fn rasterize(&self, key: &FieldKey) -> Field {
        self.calls.set(self.calls.get() + 1);
        rasterize_key(key)
    }
}

#[test]
fn fresh_cache_rasterizes_once_per_key() {
    let mut cache = FieldCache::with_rasterizer(Counting::default(), 10, Eviction::Fifo);
    let shape = ShapeParams::default();
    let first = cache.field(30.0, 20.0, &shape);
    let second = cache.field(30.0, 20.0, &shape);
    assert_eq!(cache.rasterizer().calls.get(), 1);
    assert_eq!(first.data, second.data);
}

#[test]
fn eleventh_key_evicts_the_first() {
    let mut cache = FieldCache::default();
    let keys: Vec<FieldKey> = (0..11)
        .map(|i| FieldKey::new(2 + i, 2, ShapeParams::default()))
        .collect();
    for key in &keys {
        cache.get_or_rasterize(*key);
    }
    assert_eq!(cache.len(), 10);
    assert!(!cache.contains(&keys[0]));
    for key in &keys[1..] {
        assert!(cache.contains(key));
    }
}

#[test]
fn fifo_eviction_ignores_recent_hits() {
    let mut cache = FieldCache::default();
    let keys: Vec<FieldKey> = (0..11)
        .map(|i| FieldKey::new(2 + i, 3, ShapeParams::default()))
        .collect();
    for key in &keys[..10] {
        cache.get_or_rasterize(*key);
    }
    // Re-requesting the oldest key does not move it to the back.
    cache.get_or_rasterize(keys[0]);
    cache.get_or_rasterize(keys[10]);
    assert!(!cache.contains(&keys[0]));
}

#[test]
fn cache_and_direct_rasterization_agree() {
    let mut cache = FieldCache::default();
    let shape = ShapeParams {
        depth: -1.0,
        shape_width: -0.4,
        ..ShapeParams::default()
    };
    let cached = cache.field(25.0, 18.0, &shape);
    let direct = generate_field(25.0, 18.0, &shape);
    assert_eq!(*cached, direct);
}
