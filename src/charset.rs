use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>?";

/// Characters easily confused with one another in common fonts.
pub const AMBIGUOUS: &[char] = &['O', '0', 'I', '1', 'l'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
}

impl CharClass {
    pub const ALL: [CharClass; 4] = [
        CharClass::Lower,
        CharClass::Upper,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    pub fn alphabet(self) -> &'static str {
        match self {
            CharClass::Lower => LOWER,
            CharClass::Upper => UPPER,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS,
        }
    }

    /// Class of `c` by the default alphabets; `None` for anything else
    /// (whitespace, letters outside ASCII, symbols not in [`SYMBOLS`]).
    pub fn of(c: char) -> Option<CharClass> {
        if c.is_ascii_lowercase() {
            Some(CharClass::Lower)
        } else if c.is_ascii_uppercase() {
            Some(CharClass::Upper)
        } else if c.is_ascii_digit() {
            Some(CharClass::Digit)
        } else if SYMBOLS.contains(c) {
            Some(CharClass::Symbol)
        } else {
            None
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CharClass::Lower => "lowercase",
            CharClass::Upper => "uppercase",
            CharClass::Digit => "digits",
            CharClass::Symbol => "symbols",
        };
        f.write_str(name)
    }
}

/// Distinct classes that occur in `s`.
pub fn classes_present(s: &str) -> BTreeSet<CharClass> {
    s.chars().filter_map(CharClass::of).collect()
}

#[derive(Debug, Clone)]
pub struct CharGroup {
    pub class: CharClass,
    pub chars: Vec<char>,
}

/// Every character eligible for a password draw, split by class.
///
/// Each group is non-empty and every group is mandatory: a password drawn
/// from this pool carries at least one character of each.
#[derive(Debug, Clone)]
pub struct CharacterPool {
    groups: Vec<CharGroup>,
    all: Vec<char>,
}

impl CharacterPool {
    /// Builds the pool for `classes`, dropping excluded characters and,
    /// when `no_ambiguous` is set, the [`AMBIGUOUS`] ones.
    ///
    /// A class emptied by exclusions contributes nothing and is not
    /// mandatory.
    pub fn build(
        classes: &[CharClass],
        exclude: &str,
        no_ambiguous: bool,
        length: usize,
    ) -> Result<Self> {
        let excluded: BTreeSet<char> = exclude.chars().collect();
        let keep = |c: &char| !excluded.contains(c) && !(no_ambiguous && AMBIGUOUS.contains(c));

        let mut groups = Vec::new();
        let mut all = Vec::new();

        for class in CharClass::ALL {
            if !classes.contains(&class) {
                continue;
            }
            let chars: Vec<char> = class.alphabet().chars().filter(keep).collect();
            if chars.is_empty() {
                continue;
            }
            all.extend_from_slice(&chars);
            groups.push(CharGroup { class, chars });
        }

        if groups.is_empty() {
            return Err(Error::config(
                "Select at least one character set (and ensure exclusions don't remove all chars)",
            ));
        }

        if length < groups.len() {
            return Err(Error::config(format!(
                "Length {} too short for {} selected character sets",
                length,
                groups.len()
            )));
        }

        Ok(Self { groups, all })
    }

    pub fn groups(&self) -> &[CharGroup] {
        &self.groups
    }

    pub fn chars(&self) -> &[char] {
        &self.all
    }

    pub fn size(&self) -> usize {
        self.all.len()
    }

    pub fn contains(&self, c: char) -> bool {
        self.all.contains(&c)
    }
}
