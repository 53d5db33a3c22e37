// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::runtime_paths::RuntimePaths;

/// Scratch runtime root under `target/test-fixtures`, removed on drop.
#[derive(Debug)]
pub struct TestFixtureRoot {
    path: PathBuf,
}

impl TestFixtureRoot {
    pub fn new_fixed(name: &str) -> std::io::Result<Self> {
        let root = fixtures_root().join(name);
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self { path: root })
    }

    pub fn new_unique(prefix: &str) -> std::io::Result<Self> {
        let name = format!("{}-{}", prefix, Uuid::new_v4());
        Self::new_fixed(&name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn films_dir(&self) -> PathBuf {
        self.path.join("films")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.path.join("public")
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.path.join("certs")
    }

    pub fn init_runtime_layout(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.films_dir())?;
        fs::create_dir_all(self.public_dir())?;
        fs::create_dir_all(self.certs_dir())?;
        Ok(())
    }

    /// Write `<films>/<key>.toml`, creating intermediate directories.
    pub fn write_film(&self, key: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.films_dir().join(format!("{}.toml", key));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a file relative to the public directory.
    pub fn write_public(&self, relative: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.public_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn runtime_paths(&self) -> std::io::Result<RuntimePaths> {
        self.init_runtime_layout()?;
        Ok(RuntimePaths {
            root: self.path.canonicalize()?,
            config_file: self.path.join("config.yaml"),
            films_dir: self.films_dir().canonicalize()?,
            public_dir: self.public_dir().canonicalize()?,
            certs_dir: self.certs_dir().canonicalize()?,
        })
    }
}

impl Drop for TestFixtureRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixtures_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    repo_root.join("target").join("test-fixtures")
}
