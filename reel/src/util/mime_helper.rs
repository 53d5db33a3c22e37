// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::path::Path;

pub const GEMINI_MIME: &str = "text/gemini";

/// Detect the MIME type served for a static file.
///
/// Gemtext is recognised by extension first since neither content sniffing
/// nor the system MIME table knows about it.
pub fn detect_mime_type(file_path: &Path, file_content: &[u8]) -> String {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    if matches!(extension.as_deref(), Some("gmi") | Some("gemini")) {
        return GEMINI_MIME.to_string();
    }

    if let Some(mime_type) = infer::get(file_content) {
        return mime_type.mime_type().to_string();
    }

    let mime_guess = mime_guess::from_path(file_path);
    if let Some(mime_type) = mime_guess.first() {
        return mime_type.to_string();
    }

    "application/octet-stream".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemtext_wins_over_sniffing() {
        assert_eq!(
            detect_mime_type(Path::new("index.gmi"), b"# Hello"),
            "text/gemini"
        );
        assert_eq!(
            detect_mime_type(Path::new("NOTES.GMI"), b"\x89PNG\r\n\x1a\n"),
            "text/gemini"
        );
    }

    #[test]
    fn sniffs_content_then_falls_back_to_extension() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(detect_mime_type(Path::new("poster"), png), "image/png");
        assert_eq!(detect_mime_type(Path::new("style.css"), b"body {}"), "text/css");
        assert_eq!(
            detect_mime_type(Path::new("blob"), b"plain bytes"),
            "application/octet-stream"
        );
    }
}
