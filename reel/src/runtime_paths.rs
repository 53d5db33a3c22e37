// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{CONFIG_FILE_NAME, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Command-line replacements for the default locations under the runtime root.
/// Relative values are resolved against the root.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub config_file: Option<PathBuf>,
    pub certs_dir: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
    pub films_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub certs_dir: PathBuf,
    pub public_dir: PathBuf,
    pub films_dir: PathBuf,
}

impl RuntimePaths {
    /// Resolve every runtime location, creating missing directories.
    pub fn from_root(root: &Path, overrides: &PathOverrides) -> Result<Self, ConfigError> {
        let root_canonical = canonical_root(root)?;

        let resolve = |value: &Option<PathBuf>, default: &str| match value {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root_canonical.join(path),
            None => root_canonical.join(default),
        };

        let config_file = resolve(&overrides.config_file, CONFIG_FILE_NAME);
        let certs_dir = resolve(&overrides.certs_dir, "certs");
        let public_dir = resolve(&overrides.public_dir, "public");
        let films_dir = resolve(&overrides.films_dir, "films");

        ensure_dir_exists(&certs_dir)?;
        ensure_dir_writable(&certs_dir, "Certificates directory must be writable")?;
        ensure_dir_exists(&public_dir)?;
        ensure_dir_exists(&films_dir)?;

        Ok(Self {
            root: root_canonical,
            config_file,
            certs_dir: canonicalize_dir(&certs_dir, "certificates")?,
            public_dir: canonicalize_dir(&public_dir, "public")?,
            films_dir: canonicalize_dir(&films_dir, "films")?,
        })
    }
}

/// Resolve the runtime root, creating it when missing.
pub fn canonical_root(root: &Path) -> Result<PathBuf, ConfigError> {
    let root_path = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if !root_path.exists() {
        fs::create_dir_all(&root_path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;
    }

    root_path.canonicalize().map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to canonicalize runtime root '{}': {}",
            root_path.display(),
            e
        ))
    })
}

fn canonicalize_dir(path: &Path, label: &str) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to canonicalize {} directory '{}': {}",
            label,
            path.display(),
            e
        ))
    })
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "Expected a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

fn ensure_dir_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    let probe_path = path.join(format!(".reel-write-check-{}", Uuid::new_v4()));

    let probe_result = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path);

    match probe_result {
        Ok(_) => fs::remove_file(&probe_path).map_err(|err| {
            ConfigError::ValidationError(format!(
                "{} (unable to clean probe file {}): {}",
                context,
                probe_path.display(),
                err
            ))
        }),
        Err(err) => Err(ConfigError::ValidationError(format!(
            "{} ({}): {}",
            context,
            path.display(),
            err
        ))),
    }
}
