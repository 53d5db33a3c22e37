// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::response::Response;
use crate::util::detect_mime_type;
use log::{debug, error, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DIRECTORY_INDEX: &str = "index.gmi";

/// Serves files below the public directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn serve(&self, request_path: &str) -> Response {
        let relative = request_path.trim_start_matches('/');
        if relative
            .split('/')
            .any(|segment| segment == ".." || segment.contains('\\'))
        {
            warn!(
                "🚨 SECURITY: Rejected traversal in static request: {}",
                request_path
            );
            return Response::not_found();
        }

        let candidate = self.root.join(relative);
        let resolved = match self.contained(&candidate) {
            Ok(Some(path)) => path,
            Ok(None) => return Response::not_found(),
            Err(err) => {
                error!("Failed to resolve public directory {:?}: {}", self.root, err);
                return Response::internal_error();
            }
        };

        if resolved.is_dir() {
            if !request_path.ends_with('/') {
                return Response::redirect(format!("{}/", encode_path(request_path)));
            }
            let index = resolved.join(DIRECTORY_INDEX);
            if index.is_file() {
                return self.read_file(&index, request_path);
            }
            return self.list_directory(&resolved, request_path);
        }

        self.read_file(&resolved, request_path)
    }

    /// Canonical form of `path` when it exists inside the public directory.
    fn contained(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        let canonical_root = self.root.canonicalize()?;
        let canonical = match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                debug!("Cannot canonicalize {:?}: {}", path, err);
                return Ok(None);
            }
        };

        if canonical.strip_prefix(&canonical_root).is_err() {
            warn!(
                "🚨 SECURITY: Path traversal attempt - file outside public directory: {:?} not in {:?}",
                canonical, canonical_root
            );
            return Ok(None);
        }
        Ok(Some(canonical))
    }

    fn read_file(&self, path: &Path, request_path: &str) -> Response {
        match fs::read(path) {
            Ok(content) => {
                let mime = detect_mime_type(path, &content);
                Response::success(mime, content)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Response::not_found(),
            Err(err) => {
                error!("Failed to read static file for {}: {}", request_path, err);
                Response::internal_error()
            }
        }
    }

    fn list_directory(&self, dir: &Path, request_path: &str) -> Response {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                error!("Failed to list directory for {}: {}", request_path, err);
                return Response::internal_error();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if name.starts_with('.') {
                    return None;
                }
                let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
                Some(if is_dir { format!("{}/", name) } else { name })
            })
            .collect();
        names.sort();

        let mut body = format!("# Index of {}\n\n", request_path);
        for name in names {
            let link = encode_path(&name);
            body.push_str(&format!("=> {} {}\n", link, name));
        }
        Response::gemtext(body)
    }
}

/// Percent-encode each segment of a decoded path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
