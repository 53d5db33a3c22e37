// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// On-disk shape of a film descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct FilmRecord {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A catalog entry. Shared between the path map and every tag that lists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Film {
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i64>,
    pub description: Vec<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,
    /// Position in the films directory, without extension or leading '/'.
    pub path: String,
}

impl Film {
    pub fn from_record(record: FilmRecord, path: &str) -> Self {
        Self {
            title: record.title,
            author: record.author,
            year: record.year,
            description: record.description,
            tags: record.tags,
            image: record.image,
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    /// Display name as spelled by the first film carrying this tag.
    pub name: String,
    pub films: Vec<Arc<Film>>,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            films: Vec::new(),
        }
    }
}

/// Snapshot of both indices, ordered by key for stable listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Home {
    pub films: BTreeMap<String, Arc<Film>>,
    pub tags: BTreeMap<String, Tag>,
}
