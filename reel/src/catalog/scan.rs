// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{CatalogError, CatalogResult};
use super::index::CatalogData;
use super::loader::{DESCRIPTOR_EXTENSION, DescriptorDecoder, read_film};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a full scan does when one entry cannot be read or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPolicy {
    /// The first failure ends the scan and nothing is published.
    #[default]
    Abort,
    /// Log the failing entry and keep going.
    Skip,
}

enum Pending {
    Dir { path: PathBuf, key: String },
    Descriptor { key: String },
}

/// Walk the films directory depth first, visiting siblings in name order,
/// and register every descriptor found into `data`. Paths already present
/// in `data` are not decoded again.
pub(super) fn scan_films(
    films_dir: &Path,
    decoder: &dyn DescriptorDecoder,
    policy: ScanPolicy,
    mut data: CatalogData,
) -> CatalogResult<CatalogData> {
    let mut stack = vec![Pending::Dir {
        path: films_dir.to_path_buf(),
        key: String::new(),
    }];

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Dir { path, key } => {
                let children = match list_dir(&path, &key) {
                    Ok(children) => children,
                    Err(err) => match policy {
                        ScanPolicy::Abort => return Err(err),
                        ScanPolicy::Skip => {
                            warn!("Skipping unreadable films directory '{}': {}", key, err);
                            continue;
                        }
                    },
                };
                // Reversed so the smallest name is popped first.
                stack.extend(children.into_iter().rev());
            }
            Pending::Descriptor { key } if data.contains(&key) => {
                debug!("Film '{}' already loaded, not decoding again", key);
            }
            Pending::Descriptor { key } => match read_film(films_dir, &key, decoder) {
                Ok(film) => data.register(Arc::new(film)),
                Err(err) => match policy {
                    ScanPolicy::Abort => return Err(err),
                    ScanPolicy::Skip => warn!("Skipping film descriptor '{}': {}", key, err),
                },
            },
        }
    }

    Ok(data)
}

fn list_dir(dir: &Path, key: &str) -> CatalogResult<Vec<Pending>> {
    let io_error = |source| CatalogError::Io {
        path: if key.is_empty() {
            "/".to_string()
        } else {
            key.to_string()
        },
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        entries.push(entry);
    }
    entries.sort_by_key(|entry| entry.file_name());

    let mut children = Vec::new();
    for entry in entries {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            warn!(
                "Skipping film entry with non UTF-8 name: {}",
                entry.path().display()
            );
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let child_key = |segment: &str| {
            if key.is_empty() {
                segment.to_string()
            } else {
                format!("{}/{}", key, segment)
            }
        };

        // Follows symlinks so linked directories and descriptors are included.
        let metadata = fs::metadata(entry.path()).map_err(io_error)?;
        if metadata.is_dir() {
            children.push(Pending::Dir {
                path: entry.path(),
                key: child_key(name),
            });
            continue;
        }

        match name
            .strip_suffix(DESCRIPTOR_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
        {
            Some(stem) if !stem.is_empty() && metadata.is_file() => {
                children.push(Pending::Descriptor {
                    key: child_key(stem),
                });
            }
            _ => debug!("Ignoring non-descriptor file in films directory: {}", name),
        }
    }

    Ok(children)
}
