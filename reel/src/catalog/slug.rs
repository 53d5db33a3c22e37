// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use log::error;
use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]+"));

/// Accented letters folded to their ASCII base. Every replacement is itself
/// in the allowed alphabet, which keeps `encode` idempotent.
fn fold_accent(c: char) -> Option<char> {
    match c {
        'é' | 'è' | 'ê' | 'ë' => Some('e'),
        'à' | 'â' | 'ä' => Some('a'),
        'ô' | 'ö' => Some('o'),
        'ç' => Some('c'),
        'ù' | 'û' | 'ü' => Some('u'),
        'ï' | 'î' => Some('i'),
        _ => None,
    }
}

/// Turn a display string (usually a tag name) into a URL-safe slug.
///
/// Consecutive spaces become consecutive hyphens; they are not collapsed.
pub fn encode(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' => '-',
            other => fold_accent(other).unwrap_or(other),
        })
        .collect();

    match DISALLOWED_RE.as_ref() {
        Ok(re) => re.replace_all(&folded, "").into_owned(),
        Err(err) => {
            error!("🚨 CRITICAL: slug pattern failed to compile: {}", err);
            folded
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::encode;

    fn in_alphabet(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn folds_accents() {
        assert_eq!(encode("Amélie"), "amelie");
        assert_eq!(encode("Garçon"), "garcon");
        assert_eq!(encode("Où est la Fête"), "ou-est-la-fete");
    }

    #[test]
    fn strips_punctuation_and_hyphenates_spaces() {
        assert_eq!(
            encode("Le Fabuleux Destin d'Amélie Poulain"),
            "le-fabuleux-destin-damelie-poulain"
        );
        assert_eq!(encode("Sci-Fi"), "sci-fi");
        assert_eq!(encode("2001: A Space Odyssey"), "2001-a-space-odyssey");
    }

    #[test]
    fn uppercase_accents_are_lowered_then_folded() {
        assert_eq!(encode("ÉTÉ"), "ete");
    }

    #[test]
    fn keeps_repeated_hyphens() {
        assert_eq!(encode("film  noir"), "film--noir");
        assert_eq!(encode(" lead"), "-lead");
    }

    #[test]
    fn drops_characters_outside_the_table() {
        assert_eq!(encode("Ñandú"), "and");
        assert_eq!(encode("日本"), "");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn idempotent_and_closed_over_alphabet() {
        let samples = [
            "Amélie",
            "Le Fabuleux Destin d'Amélie Poulain",
            "  spaced   out  ",
            "Crème brûlée!",
            "Noir / Néo-Noir",
            "Ïle de Ré",
            "tabs\tand\nnewlines",
            "already-a-slug-42",
            "ÀÂÄ ÔÖ ÙÛÜ",
            "emoji 🎬 tag",
        ];
        for sample in samples {
            let once = encode(sample);
            assert!(in_alphabet(&once), "{:?} produced {:?}", sample, once);
            assert_eq!(encode(&once), once, "not idempotent for {:?}", sample);
            assert_eq!(encode(sample), once, "not deterministic for {:?}", sample);
        }
    }
}
