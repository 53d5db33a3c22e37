// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::catalog::{Film, Home, Tag};
use crate::config::FilmTemplatesConfig;
use minijinja::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

mod context;
mod engine;

pub use context::{FilmPageContext, HomePageContext, TagPageContext};
pub use engine::{MiniJinjaEngine, TemplateEngine};

pub const INDEX_TEMPLATE: &str = "films/index";
pub const DISPLAY_TEMPLATE: &str = "films/display";
pub const TAG_TEMPLATE: &str = "films/tag";

#[derive(Debug)]
pub struct TemplateError {
    template: &'static str,
    source: minijinja::Error,
}

impl TemplateError {
    fn new(template: &'static str, source: minijinja::Error) -> Self {
        Self { template, source }
    }

    pub fn template(&self) -> &str {
        self.template
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Template '{}' failed: {}", self.template, self.source)
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// The three catalog page templates, compiled once at startup.
#[derive(Clone)]
pub struct FilmTemplates {
    engine: Arc<dyn TemplateEngine>,
}

impl FilmTemplates {
    pub fn from_config(films: &FilmTemplatesConfig) -> Result<Self, TemplateError> {
        let mut engine = MiniJinjaEngine::new();
        for (name, source) in [
            (INDEX_TEMPLATE, &films.index),
            (DISPLAY_TEMPLATE, &films.display),
            (TAG_TEMPLATE, &films.tag),
        ] {
            engine
                .add_template(name, source)
                .map_err(|err| TemplateError::new(name, err))?;
        }
        Ok(Self::with_engine(Arc::new(engine)))
    }

    pub fn with_engine(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    pub fn render_home(&self, home: &Home) -> Result<String, TemplateError> {
        self.render(INDEX_TEMPLATE, HomePageContext::new(home).to_value())
    }

    pub fn render_film(&self, film: &Film) -> Result<String, TemplateError> {
        self.render(DISPLAY_TEMPLATE, FilmPageContext::new(film).to_value())
    }

    pub fn render_tag(&self, slug: &str, tag: &Tag) -> Result<String, TemplateError> {
        self.render(TAG_TEMPLATE, TagPageContext::new(slug, tag).to_value())
    }

    fn render(&self, name: &'static str, context: Value) -> Result<String, TemplateError> {
        self.engine
            .render(name, context)
            .map_err(|err| TemplateError::new(name, err))
    }
}
