use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::decode::{BaseTexture, decode_image};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{SparkreelError, SparkreelResult};
use crate::render::surface::Surface;

/// Cache of decoded base sprites and their memoized tinted variants.
///
/// The cache is explicitly constructed and explicitly owned; share it via
/// `Arc` where loader threads or a renderer need it. State is exactly three
/// maps: decoded base textures, tinted surfaces keyed by `(name, color)`,
/// and per-name in-flight markers that deduplicate concurrent loads.
///
/// Nothing is ever evicted; entries live until [`TextureCache::clear`] or
/// drop.
#[derive(Default)]
pub struct TextureCache {
    images: RwLock<HashMap<String, BaseTexture>>,
    tinted: RwLock<HashMap<(String, Rgba8), Arc<Surface>>>,
    in_flight: Mutex<HashMap<String, Arc<LoadGate>>>,
    decodes: AtomicU64,
}

/// Counters describing the cache contents, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Decoded base textures currently stored.
    pub base_textures: usize,
    /// Tinted surfaces currently memoized.
    pub tinted_surfaces: usize,
    /// Decode operations performed over the cache lifetime.
    pub decodes_performed: u64,
}

impl TextureCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and decode the sprite at `path` under `name`. Idempotent.
    ///
    /// If `name` is already decoded this returns immediately. If a load for
    /// `name` is in flight, this blocks on that load and observes its
    /// outcome, and no duplicate decode is issued. A failed load clears the
    /// in-flight marker, so a later call may retry.
    pub fn load_texture(&self, name: &str, path: impl AsRef<Path>) -> SparkreelResult<()> {
        if read(&self.images).contains_key(name) {
            return Ok(());
        }

        // Claim leadership or pick up the existing gate; the marker lock is
        // released before any waiting happens.
        let claim = {
            let mut in_flight = lock(&self.in_flight);
            // Re-check under the marker lock: the leader publishes the image
            // before removing its marker, so missing both means no load.
            if read(&self.images).contains_key(name) {
                return Ok(());
            }
            match in_flight.get(name) {
                Some(gate) => Claim::Waiter(gate.clone()),
                None => {
                    let gate = Arc::new(LoadGate::default());
                    in_flight.insert(name.to_owned(), gate.clone());
                    Claim::Leader(gate)
                }
            }
        };
        let gate = match claim {
            Claim::Waiter(gate) => return gate.wait(),
            Claim::Leader(gate) => gate,
        };

        let outcome = self.fetch_and_store(name, path.as_ref());
        let shared = match &outcome {
            Ok(()) => Ok(()),
            Err(e) => Err(e.to_string()),
        };
        lock(&self.in_flight).remove(name);
        gate.complete(shared);
        outcome
    }

    /// Load every `name -> path` entry of `manifest` concurrently and wait
    /// for all of them. Fails as a whole on the first load failure; sibling
    /// loads that succeeded stay cached.
    #[tracing::instrument(skip(self, manifest), fields(count = manifest.len()))]
    pub fn load_textures(&self, manifest: &BTreeMap<String, PathBuf>) -> SparkreelResult<()> {
        manifest
            .par_iter()
            .map(|(name, path)| self.load_texture(name, path))
            .collect()
    }

    /// Look up (or lazily compute) the tinted variant of `name`. Never
    /// triggers a load.
    ///
    /// Returns `None` while the base sprite is missing or still loading,
    /// a normal outcome the renderer handles by skipping the particle.
    /// The computed surface keeps the sprite's alpha silhouette exactly and
    /// carries `color` in every covered pixel; it is memoized forever under
    /// `(name, color)`.
    pub fn tinted_texture(&self, name: &str, color: Rgba8) -> Option<Arc<Surface>> {
        let key = (name.to_owned(), color);
        if let Some(hit) = read(&self.tinted).get(&key) {
            return Some(hit.clone());
        }

        let base = read(&self.images).get(name)?.clone();
        // Tinting runs outside any lock: two concurrent first lookups for
        // one key may both compute, and the later insert wins.
        let surface = Arc::new(Surface::tinted(&base, color));
        write(&self.tinted).insert(key, surface.clone());
        Some(surface)
    }

    /// Whether the base sprite for `name` is decoded and ready.
    pub fn is_loaded(&self, name: &str) -> bool {
        read(&self.images).contains_key(name)
    }

    /// Borrow-clone the decoded base sprite for `name`, if present.
    pub fn base_texture(&self, name: &str) -> Option<BaseTexture> {
        read(&self.images).get(name).cloned()
    }

    /// Current cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            base_textures: read(&self.images).len(),
            tinted_surfaces: read(&self.tinted).len(),
            decodes_performed: self.decodes.load(Ordering::Relaxed),
        }
    }

    /// Drop every decoded sprite and tinted surface. Loads already in
    /// flight complete normally and repopulate the cache.
    pub fn clear(&self) {
        write(&self.images).clear();
        write(&self.tinted).clear();
    }

    fn fetch_and_store(&self, name: &str, path: &Path) -> SparkreelResult<()> {
        let result = (|| -> SparkreelResult<BaseTexture> {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read texture file '{}'", path.display()))?;
            self.decodes.fetch_add(1, Ordering::Relaxed);
            decode_image(&bytes)
        })();

        match result {
            Ok(texture) => {
                tracing::debug!(name, width = texture.width, height = texture.height, "texture decoded");
                write(&self.images).insert(name.to_owned(), texture);
                Ok(())
            }
            Err(e) => Err(SparkreelError::texture(format!("load '{name}': {e}"))),
        }
    }
}

enum Claim {
    Leader(Arc<LoadGate>),
    Waiter(Arc<LoadGate>),
}

/// One-shot completion gate shared by every caller waiting on one load.
#[derive(Default)]
struct LoadGate {
    outcome: Mutex<Option<Result<(), String>>>,
    ready: Condvar,
}

impl LoadGate {
    fn wait(&self) -> SparkreelResult<()> {
        let mut guard = lock(&self.outcome);
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone().map_err(SparkreelError::texture);
            }
            guard = self
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn complete(&self, outcome: Result<(), String>) {
        *lock(&self.outcome) = Some(outcome);
        self.ready.notify_all();
    }
}

// The maps are never left half-written across an unwind, so poisoned guards
// are safe to recover.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(l: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(l: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
