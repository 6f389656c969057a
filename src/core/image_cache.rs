//! Per-scene decoded image cache.
//!
//! Structure: `HashMap<String, Image>` keyed by source URL.
//! - One cache per scene build; a room switch replaces it wholesale
//! - `resolve()` memoizes loader calls so layers sharing an image decode once
//! - Every cache carries the scene generation it was created for; inserts
//!   tagged with another generation are stale loads and get dropped

use std::collections::HashMap;

use log::{debug, trace};

use crate::entities::error::AssetError;
use crate::entities::image::Image;
use crate::entities::loader::AssetLoader;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Inserts dropped because their generation was stale
    pub stale: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

/// Decoded images of one scene generation.
#[derive(Debug, Default)]
pub struct ImageCache {
    generation: u64,
    images: HashMap<String, Image>,
    stats: CacheStats,
}

impl ImageCache {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            images: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: &str) -> Option<&Image> {
        self.images.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Store a finished load. Returns false (and drops the image) when the
    /// load belongs to another scene generation.
    pub fn insert(&mut self, generation: u64, key: impl Into<String>, image: Image) -> bool {
        let key = key.into();
        if generation != self.generation {
            debug!(
                "Dropping stale image '{}' (generation {} != {})",
                key, generation, self.generation
            );
            self.stats.stale += 1;
            return false;
        }
        self.images.insert(key, image);
        true
    }

    /// Cached image for `key`, loading it on first use.
    pub fn resolve<L: AssetLoader + ?Sized>(&mut self, key: &str, loader: &L) -> Result<Image, AssetError> {
        if let Some(img) = self.images.get(key) {
            self.stats.hits += 1;
            trace!("ImageCache hit: {}", key);
            return Ok(img.clone());
        }
        self.stats.misses += 1;
        let img = loader.load_image(key)?;
        debug!("ImageCache loaded '{}' ({}x{})", key, img.width(), img.height());
        self.images.insert(key.to_string(), img.clone());
        Ok(img)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::loader::MemoryLoader;

    #[test]
    fn test_resolve_memoized() {
        let loader = MemoryLoader::new().with_image("a.png", Image::solid(2, 2, [1, 1, 1, 255]));
        let mut cache = ImageCache::new(1);
        let first = cache.resolve("a.png", &loader).unwrap();
        let second = cache.resolve("a.png", &loader).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(loader.image_loads(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, stale: 0 });
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_failed_resolve_not_cached() {
        let loader = MemoryLoader::new();
        let mut cache = ImageCache::new(1);
        assert!(cache.resolve("missing.png", &loader).is_err());
        assert!(cache.resolve("missing.png", &loader).is_err());
        assert_eq!(loader.image_loads(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_insert_dropped() {
        let mut cache = ImageCache::new(3);
        assert!(!cache.insert(2, "old.png", Image::solid(1, 1, [0; 4])));
        assert!(cache.insert(3, "new.png", Image::solid(1, 1, [0; 4])));
        assert!(!cache.contains("old.png"));
        assert!(cache.contains("new.png"));
        assert_eq!(cache.stats().stale, 1);
    }
}
