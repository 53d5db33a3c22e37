// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CatalogError {
    /// No descriptor backs the requested path.
    NotFound(String),
    /// The descriptor exists but is not a valid film record.
    Decode { path: String, message: String },
    /// Any filesystem failure other than a missing descriptor.
    Io { path: String, source: io::Error },
    TagNotFound(String),
    /// A catalog lock was poisoned by a panicking thread.
    Internal(String),
}

impl CatalogError {
    /// Expected outcomes that map to a "not found" response rather than a server failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_) | CatalogError::TagNotFound(_))
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(path) => write!(f, "Film not found: {}", path),
            CatalogError::Decode { path, message } => {
                write!(f, "Failed to decode film descriptor '{}': {}", path, message)
            }
            CatalogError::Io { path, source } => {
                write!(f, "Failed to read film descriptor '{}': {}", path, source)
            }
            CatalogError::TagNotFound(slug) => write!(f, "Tag not found: {}", slug),
            CatalogError::Internal(message) => write!(f, "Catalog internal error: {}", message),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
