// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use crate::runtime_paths::{PathOverrides, RuntimePaths};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

pub(super) const DEFAULT_INDEX_GMI: &str =
    "# Welcome\n\nThis capsule was generated to get you started.\n\n=> /films/ Film catalog\n";

pub fn ensure_paths(root: &Path, overrides: &PathOverrides) -> Result<RuntimePaths, BootstrapError> {
    let runtime_paths =
        RuntimePaths::from_root(root, overrides).map_err(BootstrapError::Config)?;

    ensure_default_index(&runtime_paths)?;

    Ok(runtime_paths)
}

fn ensure_default_index(runtime_paths: &RuntimePaths) -> Result<(), BootstrapError> {
    if fs::read_dir(&runtime_paths.public_dir)?.next().is_some() {
        return Ok(());
    }

    let index_path = runtime_paths.public_dir.join("index.gmi");
    if write_new_file(&index_path, DEFAULT_INDEX_GMI)? {
        log_action(format!("created {}", index_path.display()));
    }
    Ok(())
}

fn write_new_file(path: &Path, contents: &str) -> Result<bool, BootstrapError> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(true)
}
