//! In-memory storage of loaded tiles.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use quick_cache::sync::Cache;

use crate::decoded_image::TileImage;
use crate::tile_schema::TileKey;

/// Storage of already loaded tile images, shared between the redraw scheduler and the tile loading
/// tasks.
///
/// By default the cache is unbounded: tiles are never evicted during the life of the map. A
/// cache created with [`TileCache::bounded`] keeps at most the given number of tiles, evicting the
/// least valuable ones.
///
/// All methods take `&self` and are safe to call from concurrent tasks. Inserting a tile with a key
/// that is already present replaces the previous value.
pub struct TileCache {
    storage: Storage,
}

enum Storage {
    Unbounded(RwLock<AHashMap<TileKey, Arc<TileImage>>>),
    Bounded(Cache<TileKey, Arc<TileImage>>),
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.storage {
            Storage::Unbounded(_) => "unbounded",
            Storage::Bounded(_) => "bounded",
        };
        f.debug_struct("TileCache")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCache {
    /// Creates a new unbounded cache.
    pub fn new() -> Self {
        Self {
            storage: Storage::Unbounded(RwLock::new(AHashMap::new())),
        }
    }

    /// Creates a cache that holds at most `capacity` tiles.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            storage: Storage::Bounded(Cache::new(capacity.max(1))),
        }
    }

    /// Returns the tile with the given key if it is loaded.
    pub fn get(&self, key: &TileKey) -> Option<Arc<TileImage>> {
        match &self.storage {
            Storage::Unbounded(map) => map.read().get(key).cloned(),
            Storage::Bounded(cache) => cache.get(key),
        }
    }

    /// Returns true if the tile with the given key is loaded.
    pub fn contains(&self, key: &TileKey) -> bool {
        match &self.storage {
            Storage::Unbounded(map) => map.read().contains_key(key),
            Storage::Bounded(cache) => cache.get(key).is_some(),
        }
    }

    /// Stores the tile.
    pub fn insert(&self, key: TileKey, tile: Arc<TileImage>) {
        if tile.key() != key {
            log::warn!("Tile {} is stored under a different key {key}", tile.key());
        }

        match &self.storage {
            Storage::Unbounded(map) => {
                map.write().insert(key, tile);
            }
            Storage::Bounded(cache) => cache.insert(key, tile),
        }
    }

    /// Number of stored tiles.
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Unbounded(map) => map.read().len(),
            Storage::Bounded(cache) => cache.len(),
        }
    }

    /// Returns true if no tiles are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use tilemap_types::Size;

    use super::*;
    use crate::decoded_image::DecodedImage;
    use crate::style::StyleId;
    use crate::tile_schema::TileIndex;

    fn tile(key: TileKey, color: u8) -> Arc<TileImage> {
        let image = DecodedImage::from_raw(vec![color; 4], Size::new(1, 1)).unwrap();
        Arc::new(TileImage::new(key, image))
    }

    fn key(x: i32) -> TileKey {
        TileKey::new(TileIndex::new(x, 0, 5), StyleId::Osm)
    }

    #[test]
    fn get_returns_inserted_tile() {
        for cache in [TileCache::new(), TileCache::bounded(100)] {
            let value = tile(key(1), 1);
            cache.insert(key(1), value.clone());
            assert!(Arc::ptr_eq(&cache.get(&key(1)).unwrap(), &value));
            assert!(cache.contains(&key(1)));
            assert!(cache.get(&key(2)).is_none());
        }
    }

    #[test]
    fn insert_replaces_value() {
        for cache in [TileCache::new(), TileCache::bounded(100)] {
            cache.insert(key(1), tile(key(1), 1));
            let second = tile(key(1), 2);
            cache.insert(key(1), second.clone());

            assert_eq!(cache.len(), 1);
            assert!(Arc::ptr_eq(&cache.get(&key(1)).unwrap(), &second));
        }
    }

    #[test]
    fn style_is_part_of_the_key() {
        let cache = TileCache::new();
        let osm = key(1);
        let ocm = TileKey::new(osm.index, StyleId::Ocm);
        cache.insert(osm, tile(osm, 1));

        assert!(cache.contains(&osm));
        assert!(!cache.contains(&ocm));
    }

    #[test]
    fn unbounded_cache_never_evicts() {
        let cache = TileCache::new();
        for x in 0..10_000 {
            cache.insert(key(x), tile(key(x), 0));
        }

        assert_eq!(cache.len(), 10_000);
        assert!(cache.contains(&key(0)));
    }

    #[test]
    fn bounded_cache_keeps_capacity() {
        let cache = TileCache::bounded(10);
        for x in 0..100 {
            cache.insert(key(x), tile(key(x), 0));
        }

        assert!(cache.len() < 100);
    }

    #[test]
    fn concurrent_inserts() {
        let cache = Arc::new(TileCache::new());
        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for x in 0..100 {
                        cache.insert(key(x), tile(key(x), thread));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 100);
    }
}
