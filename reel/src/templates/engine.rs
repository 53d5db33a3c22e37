// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::catalog::slug;
use minijinja::{AutoEscape, Environment, Value};

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

/// Gemtext is line oriented, so block tags swallow their own line and
/// nothing is HTML-escaped.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_function("escape", slugify);
        env.add_filter("slug", slugify);
        Self { env }
    }

    /// Compile a user-supplied template. Surrounding whitespace is dropped.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), minijinja::Error> {
        self.env
            .add_template_owned(name.to_string(), source.trim().to_string())
    }
}

fn slugify(value: String) -> String {
    slug::encode(&value)
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template_name)?;
        tmpl.render(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn escape_function_builds_slugs() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_template("link", "=> /films/tag/{{ escape(name) }} {{ name }}")
            .unwrap();
        let out = engine
            .render("link", context! { name => "Film Noir" })
            .unwrap();
        assert_eq!(out, "=> /films/tag/film-noir Film Noir");
    }

    #[test]
    fn slug_filter_matches_escape_function() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_template("both", "{{ escape(t) }} {{ t|slug }}")
            .unwrap();
        let out = engine.render("both", context! { t => "Amélie" }).unwrap();
        assert_eq!(out, "amelie amelie");
    }

    #[test]
    fn templates_are_trimmed_and_not_html_escaped() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_template("raw", "\n\n  # {{ title }}\n\n")
            .unwrap();
        let out = engine
            .render("raw", context! { title => "Tom & Jerry <3" })
            .unwrap();
        assert_eq!(out, "# Tom & Jerry <3");
    }

    #[test]
    fn block_tags_do_not_leave_blank_lines() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_template("list", "{% for x in items %}\n* {{ x }}\n{% endfor %}\nend")
            .unwrap();
        let out = engine
            .render("list", context! { items => vec!["a", "b"] })
            .unwrap();
        assert_eq!(out, "* a\n* b\nend");
    }

    #[test]
    fn invalid_template_is_rejected() {
        let mut engine = MiniJinjaEngine::new();
        assert!(engine.add_template("bad", "{% for x in %}").is_err());
    }
}
