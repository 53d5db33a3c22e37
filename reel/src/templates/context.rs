// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::catalog::{Film, Home, Tag};
use minijinja::{Value, context};

/// `films` and `tags` maps, keyed by path and slug.
#[derive(Debug, Clone)]
pub struct HomePageContext<'a> {
    home: &'a Home,
}

impl<'a> HomePageContext<'a> {
    pub fn new(home: &'a Home) -> Self {
        Self { home }
    }

    pub fn to_value(&self) -> Value {
        context! {
            films => &self.home.films,
            tags => &self.home.tags
        }
    }
}

/// The film's own fields at the top level.
#[derive(Debug, Clone)]
pub struct FilmPageContext<'a> {
    film: &'a Film,
}

impl<'a> FilmPageContext<'a> {
    pub fn new(film: &'a Film) -> Self {
        Self { film }
    }

    pub fn to_value(&self) -> Value {
        Value::from_serialize(self.film)
    }
}

#[derive(Debug, Clone)]
pub struct TagPageContext<'a> {
    slug: &'a str,
    tag: &'a Tag,
}

impl<'a> TagPageContext<'a> {
    pub fn new(slug: &'a str, tag: &'a Tag) -> Self {
        Self { slug, tag }
    }

    pub fn to_value(&self) -> Value {
        context! {
            slug => self.slug,
            name => &self.tag.name,
            films => &self.tag.films
        }
    }
}
