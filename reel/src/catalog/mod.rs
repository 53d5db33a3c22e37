// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod error;
mod film;
mod index;
pub mod loader;
mod scan;
pub mod slug;

pub use error::{CatalogError, CatalogResult};
pub use film::{Film, FilmRecord, Home, Tag};
pub use loader::{DescriptorDecoder, TomlDecoder};
pub use scan::ScanPolicy;

use index::CatalogData;
use log::{error, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory film catalog and tag index, built from the films directory.
///
/// The first call to any of [`Catalog::get_film`], [`Catalog::get_home`] or
/// [`Catalog::get_tag`] scans the whole directory once; concurrent callers
/// wait for that scan. Paths missing after the scan are loaded on demand,
/// one load per path at a time.
pub struct Catalog {
    films_dir: PathBuf,
    decoder: Arc<dyn DescriptorDecoder>,
    policy: ScanPolicy,
    data: RwLock<CatalogData>,
    populated: AtomicBool,
    populate_lock: Mutex<()>,
    scans: AtomicUsize,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Catalog {
    pub fn new(films_dir: PathBuf, policy: ScanPolicy) -> Self {
        Self::with_decoder(films_dir, policy, Arc::new(TomlDecoder))
    }

    pub fn with_decoder(
        films_dir: PathBuf,
        policy: ScanPolicy,
        decoder: Arc<dyn DescriptorDecoder>,
    ) -> Self {
        Self {
            films_dir,
            decoder,
            policy,
            data: RwLock::new(CatalogData::new()),
            populated: AtomicBool::new(false),
            populate_lock: Mutex::new(()),
            scans: AtomicUsize::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn films_dir(&self) -> &Path {
        &self.films_dir
    }

    pub fn is_populated(&self) -> bool {
        self.populated.load(Ordering::Acquire)
    }

    /// Number of full scans that completed and were published.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Acquire)
    }

    /// Scan the films directory unless a previous scan already succeeded.
    ///
    /// A failed scan publishes nothing, so the next caller tries again.
    pub fn populate(&self) -> CatalogResult<()> {
        if self.is_populated() {
            return Ok(());
        }

        let _guard = lock_or_internal(&self.populate_lock, "populate")?;
        if self.is_populated() {
            return Ok(());
        }

        // Films loaded on demand before the scan keep their identity.
        let seed = self.read_data("populate")?.clone();
        let mut fresh =
            scan::scan_films(&self.films_dir, self.decoder.as_ref(), self.policy, seed)?;

        let mut data = self.write_data("populate")?;
        for film in data.films_by_path.values() {
            if !fresh.contains(&film.path) {
                fresh.register(Arc::clone(film));
            }
        }
        let (films, tags) = (fresh.film_count(), fresh.tag_count());
        *data = fresh;
        drop(data);

        self.populated.store(true, Ordering::Release);
        self.scans.fetch_add(1, Ordering::AcqRel);
        info!(
            "Film catalog populated from {}: {} films, {} tags",
            self.films_dir.display(),
            films,
            tags
        );
        Ok(())
    }

    /// Read one descriptor and register it, unless it is already cached.
    ///
    /// Population runs first so a film registered here is never replaced by the
    /// scan's own copy.
    pub fn load_film(&self, path: &str) -> CatalogResult<Arc<Film>> {
        self.populate()?;
        let key =
            loader::catalog_key(path).ok_or_else(|| CatalogError::NotFound(path.to_string()))?;
        self.load_key(&key)
    }

    pub fn get_film(&self, path: &str) -> CatalogResult<Arc<Film>> {
        self.populate()?;
        let key =
            loader::catalog_key(path).ok_or_else(|| CatalogError::NotFound(path.to_string()))?;
        if let Some(film) = self.read_data("get_film")?.film(&key) {
            return Ok(film);
        }
        self.load_key(&key)
    }

    pub fn get_home(&self) -> CatalogResult<Home> {
        self.populate()?;
        Ok(self.read_data("get_home")?.home())
    }

    pub fn get_tag(&self, slug: &str) -> CatalogResult<Tag> {
        self.populate()?;
        self.read_data("get_tag")?
            .tag(slug)
            .ok_or_else(|| CatalogError::TagNotFound(slug.to_string()))
    }

    fn load_key(&self, key: &str) -> CatalogResult<Arc<Film>> {
        let gate = self.acquire_gate(key)?;
        let result = self.load_key_gated(key, &gate);
        self.release_gate(key, gate);
        result
    }

    fn load_key_gated(&self, key: &str, gate: &Mutex<()>) -> CatalogResult<Arc<Film>> {
        let _held = lock_or_internal(gate, "load_film")?;

        // Another request may have finished this load while we waited.
        if let Some(film) = self.read_data("load_film")?.film(key) {
            return Ok(film);
        }

        let film = Arc::new(loader::read_film(
            &self.films_dir,
            key,
            self.decoder.as_ref(),
        )?);
        self.write_data("load_film")?.register(Arc::clone(&film));
        Ok(film)
    }

    fn acquire_gate(&self, key: &str) -> CatalogResult<Arc<Mutex<()>>> {
        let mut in_flight = lock_or_internal(&self.in_flight, "acquire_gate")?;
        Ok(Arc::clone(
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    fn release_gate(&self, key: &str, gate: Arc<Mutex<()>>) {
        let mut in_flight = match self.in_flight.lock() {
            Ok(in_flight) => in_flight,
            Err(_) => {
                error!("🚨 CRITICAL: Catalog in-flight lock poisoned in release_gate");
                return;
            }
        };
        drop(gate);
        // Only the map still holding the gate means nobody is waiting on this path.
        if in_flight
            .get(key)
            .is_some_and(|shared| Arc::strong_count(shared) == 1)
        {
            in_flight.remove(key);
        }
    }

    fn read_data(&self, context: &str) -> CatalogResult<RwLockReadGuard<'_, CatalogData>> {
        self.data.read().map_err(|_| {
            error!("🚨 CRITICAL: Catalog read lock poisoned in {}", context);
            CatalogError::Internal("catalog read lock poisoned".to_string())
        })
    }

    fn write_data(&self, context: &str) -> CatalogResult<RwLockWriteGuard<'_, CatalogData>> {
        self.data.write().map_err(|_| {
            error!("🚨 CRITICAL: Catalog write lock poisoned in {}", context);
            CatalogError::Internal("catalog write lock poisoned".to_string())
        })
    }
}

fn lock_or_internal<'a, T>(lock: &'a Mutex<T>, context: &str) -> CatalogResult<MutexGuard<'a, T>> {
    lock.lock().map_err(|_| {
        error!("🚨 CRITICAL: Catalog mutex poisoned in {}", context);
        CatalogError::Internal("catalog mutex poisoned".to_string())
    })
}
