// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{CatalogError, CatalogResult};
use super::film::{Film, FilmRecord};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DESCRIPTOR_EXTENSION: &str = "toml";

/// Turns raw descriptor bytes into a film record.
pub trait DescriptorDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<FilmRecord, String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

impl DescriptorDecoder for TomlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<FilmRecord, String> {
        let text = std::str::from_utf8(bytes).map_err(|err| err.to_string())?;
        toml::from_str(text).map_err(|err| err.message().to_string())
    }
}

/// Normalize a request path into a catalog key: the leading '/' is dropped
/// and anything that could step outside the films directory is refused.
pub fn catalog_key(path: &str) -> Option<String> {
    let key = path.strip_prefix('/').unwrap_or(path);
    if key.is_empty() || key.contains('\\') {
        return None;
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment.starts_with('.'))
    {
        return None;
    }
    Some(key.to_string())
}

pub fn descriptor_path(films_dir: &Path, key: &str) -> PathBuf {
    films_dir.join(format!("{}.{}", key, DESCRIPTOR_EXTENSION))
}

/// Read and decode the descriptor behind `key` without touching any index.
pub fn read_film(
    films_dir: &Path,
    key: &str,
    decoder: &dyn DescriptorDecoder,
) -> CatalogResult<Film> {
    let file_path = descriptor_path(films_dir, key);
    let bytes = match fs::read(&file_path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CatalogError::NotFound(key.to_string()));
        }
        Err(err) => {
            return Err(CatalogError::Io {
                path: key.to_string(),
                source: err,
            });
        }
    };

    let record = decoder
        .decode(&bytes)
        .map_err(|message| CatalogError::Decode {
            path: key.to_string(),
            message,
        })?;

    Ok(Film::from_record(record, key))
}
