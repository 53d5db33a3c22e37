// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{CONFIG_FILE_NAME, Config, ConfigError, ValidatedConfig};
use crate::runtime_paths::{PathOverrides, RuntimePaths, canonical_root};
use std::error::Error;
use std::fmt;
use std::path::Path;

pub mod config;
pub mod paths;

#[derive(Debug)]
pub struct BootstrapResult {
    pub validated_config: ValidatedConfig,
    pub runtime_paths: RuntimePaths,
    pub created_config: bool,
}

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Io(std::io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::Config(err) => write!(f, "{}", err),
            BootstrapError::Io(err) => write!(f, "Bootstrap I/O error: {}", err),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapError::Config(err) => Some(err),
            BootstrapError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(err: ConfigError) -> Self {
        BootstrapError::Config(err)
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::Io(err)
    }
}

/// Prepare a runtime root: default config, folders, welcome page.
pub fn bootstrap_runtime(
    root: &Path,
    overrides: &PathOverrides,
) -> Result<BootstrapResult, BootstrapError> {
    let root_path = canonical_root(root)?;

    let config_path = match &overrides.config_file {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => root_path.join(path),
        None => root_path.join(CONFIG_FILE_NAME),
    };
    let created_config = config::ensure_config(&config_path)?;

    let validated_config = Config::load_and_validate(&config_path)?;

    let runtime_paths = paths::ensure_paths(&root_path, overrides)?;

    Ok(BootstrapResult {
        validated_config,
        runtime_paths,
        created_config,
    })
}

pub(crate) fn log_action(message: impl AsRef<str>) {
    eprintln!("[bootstrap] {}", message.as_ref());
}
