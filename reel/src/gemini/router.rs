// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::response::Response;
use super::static_files::StaticFiles;
use crate::catalog::{Catalog, CatalogError};
use crate::templates::{FilmTemplates, TemplateError};
use log::{debug, error};
use std::sync::Arc;

const FILMS_PREFIX: &str = "/films";
const TAG_PREFIX: &str = "/films/tag/";

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Home,
    Film(&'a str),
    Tag(&'a str),
    Static(&'a str),
}

fn route(path: &str) -> Route<'_> {
    if let Some(slug) = path.strip_prefix(TAG_PREFIX) {
        return Route::Tag(slug);
    }
    match path {
        "/films/" | "/films/index.gmi" | "/film" | "/films" => Route::Home,
        _ if path.starts_with("/films/") => Route::Film(&path[FILMS_PREFIX.len()..]),
        _ => Route::Static(path),
    }
}

/// Maps request paths onto catalog pages and the public directory.
pub struct Router {
    catalog: Arc<Catalog>,
    templates: FilmTemplates,
    static_files: StaticFiles,
}

impl Router {
    pub fn new(catalog: Arc<Catalog>, templates: FilmTemplates, static_files: StaticFiles) -> Self {
        Self {
            catalog,
            templates,
            static_files,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Blocking: may scan the films directory on first use.
    pub fn respond(&self, path: &str) -> Response {
        match route(path) {
            Route::Home => self.home_page(path),
            Route::Film(film_path) => self.film_page(path, film_path),
            Route::Tag(slug) => self.tag_page(path, slug),
            Route::Static(static_path) => self.static_files.serve(static_path),
        }
    }

    fn home_page(&self, path: &str) -> Response {
        match self.catalog.get_home() {
            Ok(home) => render_page(path, self.templates.render_home(&home)),
            Err(err) => catalog_failure(path, err),
        }
    }

    fn film_page(&self, path: &str, film_path: &str) -> Response {
        match self.catalog.get_film(film_path) {
            Ok(film) => render_page(path, self.templates.render_film(&film)),
            Err(err) => catalog_failure(path, err),
        }
    }

    fn tag_page(&self, path: &str, slug: &str) -> Response {
        match self.catalog.get_tag(slug) {
            Ok(tag) => render_page(path, self.templates.render_tag(slug, &tag)),
            Err(err) => catalog_failure(path, err),
        }
    }
}

fn render_page(path: &str, rendered: Result<String, TemplateError>) -> Response {
    match rendered {
        Ok(body) => Response::gemtext(body),
        Err(err) => {
            error!("Error while rendering {}: {}", path, err);
            Response::internal_error()
        }
    }
}

fn catalog_failure(path: &str, err: CatalogError) -> Response {
    if err.is_not_found() {
        debug!("Not found {}: {}", path, err);
        Response::not_found()
    } else {
        error!("Error while loading film catalog for {}: {}", path, err);
        Response::internal_error()
    }
}
