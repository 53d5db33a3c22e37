// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use crate::config::DEFAULT_GEMINI_PORT;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_CONFIG_YAML: &str = r#"server:
  host: "0.0.0.0"
  port: 1965
  read_timeout_secs: 30
  write_timeout_secs: 60
  shutdown_timeout_secs: 30

tls:
  domain: "localhost"
  duration_days: 365

logging:
  level: "info"

catalog:
  eager: false
  on_scan_error: "abort"

films:
  index: |
    # Films

    {% for path, film in films|items %}
    => /films/{{ path }} {{ film.title }}{{ " (" ~ film.year ~ ")" if film.year else "" }}
    {% endfor %}

    ## Tags

    {% for slug, tag in tags|items %}
    => /films/tag/{{ slug }} {{ tag.name }} ({{ tag.films|length }})
    {% endfor %}
  display: |
    # {{ title }}
    {% if author %}
    {{ author }}{{ ", " ~ year if year else "" }}
    {% elif year %}
    {{ year }}
    {% endif %}
    {% if image %}

    => {{ image }} Poster
    {% endif %}

    {% for paragraph in description %}
    {{ paragraph }}

    {% endfor %}
    {% for tag in tags %}
    => /films/tag/{{ escape(tag) }} #{{ tag }}
    {% endfor %}

    => /films/ All films
  tag: |
    # {{ name }}

    {% for film in films %}
    => /films/{{ film.path }} {{ film.title }}
    {% endfor %}

    => /films/ All films
"#;

pub fn ensure_config(config_path: &Path) -> Result<bool, BootstrapError> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(default_config_yaml().as_bytes())?;
    file.sync_all()?;

    log_action(format!(
        "created {} with a self-signed certificate for localhost on port {}",
        config_path.display(),
        DEFAULT_GEMINI_PORT
    ));

    Ok(true)
}

pub(crate) fn default_config_yaml() -> &'static str {
    DEFAULT_CONFIG_YAML
}
