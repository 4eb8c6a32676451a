//! Bounded memo of rasterized fields.
//!
//! The cache is an explicit object rather than module state so hosts can share
//! one across instances (wrap it in `Rc<RefCell<_>>`) and tests can build a
//! fresh one. Entries are `Rc<Field>`, which keeps the cache single-threaded;
//! a multi-threaded host needs its own lock around lookup-then-insert.

use crate::config::ShapeParams;
use crate::constants::FIELD_CACHE_CAPACITY;
use crate::field::{self, raster_size, Field, FieldKey};
use fnv::FnvHashMap;
use std::collections::VecDeque;
use std::rc::Rc;

/// Produces a field for a validated key.
pub trait Rasterizer {
    fn rasterize(&self, key: &FieldKey) -> Field;
}

/// The CPU rasterizer from [`crate::field`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuRasterizer;

impl Rasterizer for CpuRasterizer {
    fn rasterize(&self, key: &FieldKey) -> Field {
        field::rasterize_key(key)
    }
}

/// Which entry leaves first when the cache is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Eviction {
    /// Oldest insertion leaves first; hits do not refresh an entry.
    #[default]
    Fifo,
    /// Least recently requested leaves first.
    Lru,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct FieldCache<R: Rasterizer = CpuRasterizer> {
    rasterizer: R,
    capacity: usize,
    eviction: Eviction,
    entries: FnvHashMap<FieldKey, Rc<Field>>,
    order: VecDeque<FieldKey>,
    stats: CacheStats,
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(FIELD_CACHE_CAPACITY, Eviction::Fifo)
    }
}

impl FieldCache {
    pub fn new(capacity: usize, eviction: Eviction) -> Self {
        Self::with_rasterizer(CpuRasterizer, capacity, eviction)
    }
}

impl<R: Rasterizer> FieldCache<R> {
    pub fn with_rasterizer(rasterizer: R, capacity: usize, eviction: Eviction) -> Self {
        Self {
            rasterizer,
            capacity: capacity.max(1),
            eviction,
            entries: FnvHashMap::default(),
            order: VecDeque::with_capacity(capacity.max(1)),
            stats: CacheStats::default(),
        }
    }

    /// Field for the given size and shape, rasterizing on a miss.
    ///
    /// Invalid sizes return the neutral field and are never stored.
    pub fn field(&mut self, width: f64, height: f64, shape: &ShapeParams) -> Rc<Field> {
        match raster_size(width, height) {
            Some((w, h)) => self.get_or_rasterize(FieldKey::new(w, h, *shape)),
            None => {
                log::warn!("[cache] invalid dimensions {}x{}; using neutral field", width, height);
                Rc::new(Field::neutral())
            }
        }
    }

    pub fn get_or_rasterize(&mut self, key: FieldKey) -> Rc<Field> {
        if let Some(hit) = self.entries.get(&key).cloned() {
            self.stats.hits += 1;
            if self.eviction == Eviction::Lru {
                self.touch(&key);
            }
            log::trace!("[cache] hit {}x{}", key.width, key.height);
            return hit;
        }

        self.stats.misses += 1;
        log::debug!("[cache] miss {}x{} ({} entries)", key.width, key.height, self.entries.len());
        let field = Rc::new(self.rasterizer.rasterize(&key));
        while self.entries.len() >= self.capacity {
            self.evict_one();
        }
        self.entries.insert(key, field.clone());
        self.order.push_back(key);
        field
    }

    #[inline]
    pub fn contains(&self, key: &FieldKey) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &FieldKey) {
        if let Some(i) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(i) {
                self.order.push_back(k);
            }
        }
    }

    fn evict_one(&mut self) {
        match self.order.pop_front() {
            Some(oldest) => {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
            }
            None => self.entries.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl Rasterizer for Counting {
        fn rasterize(&self, key: &FieldKey) -> Field {
            self.calls.set(self.calls.get() + 1);
            field::rasterize_key(key)
        }
    }

    fn key(i: u32) -> FieldKey {
        FieldKey::new(4 + i, 4, ShapeParams::default())
    }

    #[test]
    fn hit_skips_rasterizer() {
        let mut cache = FieldCache::with_rasterizer(Counting::default(), 10, Eviction::Fifo);
        let a = cache.field(20.0, 10.0, &ShapeParams::default());
        let b = cache.field(20.0, 10.0, &ShapeParams::default());
        assert_eq!(cache.rasterizer().calls.get(), 1);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, evictions: 0 });
    }

    #[test]
    fn invalid_sizes_bypass_storage() {
        let mut cache = FieldCache::with_rasterizer(Counting::default(), 10, Eviction::Fifo);
        let field = cache.field(0.0, 10.0, &ShapeParams::default());
        assert!(field.is_degenerate());
        assert!(cache.is_empty());
        assert_eq!(cache.rasterizer().calls.get(), 0);
    }

    #[test]
    fn fifo_does_not_refresh_on_hit() {
        let mut cache = FieldCache::new(3, Eviction::Fifo);
        for i in 0..3 {
            cache.get_or_rasterize(key(i));
        }
        cache.get_or_rasterize(key(0));
        cache.get_or_rasterize(key(3));
        assert!(!cache.contains(&key(0)));
        assert!(cache.contains(&key(1)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn lru_refreshes_on_hit() {
        let mut cache = FieldCache::new(3, Eviction::Lru);
        for i in 0..3 {
            cache.get_or_rasterize(key(i));
        }
        cache.get_or_rasterize(key(0));
        cache.get_or_rasterize(key(3));
        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = FieldCache::new(0, Eviction::Fifo);
        cache.get_or_rasterize(key(0));
        cache.get_or_rasterize(key(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(1)));
    }
}
