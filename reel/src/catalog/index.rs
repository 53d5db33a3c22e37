// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::film::{Film, Home, Tag};
use super::slug;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub(super) struct CatalogData {
    pub(super) films_by_path: HashMap<String, Arc<Film>>,
    pub(super) tags_by_slug: HashMap<String, Tag>,
}

impl CatalogData {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Insert a film and append it to every tag it declares. A tag listed
    /// twice on one film still yields a single entry in that tag.
    pub(super) fn register(&mut self, film: Arc<Film>) {
        self.films_by_path
            .insert(film.path.clone(), Arc::clone(&film));

        for display in &film.tags {
            let tag = self
                .tags_by_slug
                .entry(slug::encode(display))
                .or_insert_with(|| Tag::new(display));
            if !tag.films.iter().any(|known| Arc::ptr_eq(known, &film)) {
                tag.films.push(Arc::clone(&film));
            }
        }
    }

    pub(super) fn contains(&self, path: &str) -> bool {
        self.films_by_path.contains_key(path)
    }

    pub(super) fn film(&self, path: &str) -> Option<Arc<Film>> {
        self.films_by_path.get(path).cloned()
    }

    pub(super) fn tag(&self, slug: &str) -> Option<Tag> {
        self.tags_by_slug.get(slug).cloned()
    }

    pub(super) fn home(&self) -> Home {
        Home {
            films: self
                .films_by_path
                .iter()
                .map(|(path, film)| (path.clone(), Arc::clone(film)))
                .collect(),
            tags: self
                .tags_by_slug
                .iter()
                .map(|(slug, tag)| (slug.clone(), tag.clone()))
                .collect(),
        }
    }

    pub(super) fn film_count(&self) -> usize {
        self.films_by_path.len()
    }

    pub(super) fn tag_count(&self) -> usize {
        self.tags_by_slug.len()
    }
}
