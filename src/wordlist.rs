// This file is part of passforge.
//
// Copyright (c) 2026  The passforge contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const WORDLIST_DATA: &str = include_str!("../assets/default_wordlist.txt");

#[cfg(test)]
const EXPECTED_SHA256: &str = "fe46872742f2b241b450949d679a6b31a5101b4c63b1b00c417479e2504df0f2";

const DEFAULT_WORDLIST_SIZE: usize = 69;

/// Custom lists smaller than this get an advisory note.
pub const SMALL_CUSTOM_LIST: usize = 20;

static WORDLIST: OnceLock<Vec<&'static str>> = OnceLock::new();

pub fn default_wordlist() -> &'static [&'static str] {
    WORDLIST.get_or_init(|| {
        let words: Vec<&'static str> = WORDLIST_DATA
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                line.split_once('\t')
                    .or_else(|| line.split_once(' '))
                    .map(|(_, word)| word.trim())
            })
            .collect();

        debug_assert_eq!(words.len(), DEFAULT_WORDLIST_SIZE);
        words
    })
}

/// Splits user text on newlines and commas, trims and NFC-normalizes each
/// entry, and drops empties and case-insensitive duplicates. The first
/// spelling of a word wins.
pub fn parse_custom_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.split(['\n', ','])
        .map(|raw| raw.trim().nfc().collect::<String>())
        .filter(|word| !word.is_empty())
        .filter(|word| seen.insert(word.to_lowercase()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    Custom,
    BuiltIn,
}

impl WordSource {
    pub fn name(self) -> &'static str {
        match self {
            WordSource::Custom => "custom",
            WordSource::BuiltIn => "built-in",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
    source: WordSource,
}

impl WordList {
    /// Resolves the effective list: the parsed custom words when there are
    /// any, otherwise the bundled default unless `custom_only` is set.
    pub fn resolve(
        custom_text: Option<&str>,
        custom_only: bool,
        word_count: usize,
        allow_repeats: bool,
    ) -> Result<Self> {
        let custom = custom_text.map(parse_custom_words).unwrap_or_default();

        let list = if !custom.is_empty() {
            Self {
                words: custom,
                source: WordSource::Custom,
            }
        } else if custom_only {
            return Err(Error::config(
                "Custom words only was requested but no words were provided",
            ));
        } else {
            Self {
                words: default_wordlist().iter().map(|w| w.to_string()).collect(),
                source: WordSource::BuiltIn,
            }
        };

        if list.len() < 2 {
            return Err(Error::config("Wordlist is too small; add more words"));
        }

        if !allow_repeats && word_count > list.len() {
            return Err(Error::config(format!(
                "Not enough unique words for {} words ({} available); allow repeats or add more words",
                word_count,
                list.len()
            )));
        }

        Ok(list)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn source(&self) -> WordSource {
        self.source
    }

    /// Human-readable note on which list is in use.
    pub fn note(&self) -> String {
        match self.source {
            WordSource::Custom if self.len() < SMALL_CUSTOM_LIST => format!(
                "Using your custom list ({} unique words). Add more words for stronger passphrases.",
                self.len()
            ),
            WordSource::Custom => {
                format!("Using your custom list ({} unique words).", self.len())
            }
            WordSource::BuiltIn => format!("Using built-in list ({} words).", self.len()),
        }
    }
}
