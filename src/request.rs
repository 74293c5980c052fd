//! Generation requests.
//!
//! A [`GenerationRequest`] is built once at the boundary (command-line
//! flags or a JSON file), validated, and then passed by reference into the
//! generation engine.

use crate::charset::CharClass;
use crate::error::{Error, Result};
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LENGTH: usize = 16;
pub const DEFAULT_WORD_COUNT: usize = 5;
pub const DEFAULT_SEPARATOR: &str = "-";
pub const DEFAULT_SENTENCE_SEPARATOR: &str = " ";

pub const MAX_LENGTH: usize = 256;
pub const MAX_WORD_COUNT: usize = 32;

/// Sentence templates consume this many drawn words before the tail.
pub const SENTENCE_TEMPLATE_WORDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordOptions {
    pub length: usize,
    pub classes: Vec<CharClass>,
    pub exclude: String,
    pub no_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            classes: CharClass::ALL.to_vec(),
            exclude: String::new(),
            no_ambiguous: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordOptions {
    pub word_count: usize,
    /// Raw user text, split on newlines and commas.
    pub custom_words: Option<String>,
    pub custom_only: bool,
    pub separator: String,
    pub capitalize: bool,
    pub append_digit: bool,
    pub append_symbol: bool,
    pub allow_repeats: bool,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            word_count: DEFAULT_WORD_COUNT,
            custom_words: None,
            custom_only: false,
            separator: DEFAULT_SEPARATOR.to_string(),
            capitalize: false,
            append_digit: false,
            append_symbol: false,
            allow_repeats: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModeOptions {
    Password(PasswordOptions),
    Passphrase(WordOptions),
    Sentence(WordOptions),
}

impl ModeOptions {
    pub fn name(&self) -> &'static str {
        match self {
            ModeOptions::Password(_) => "password",
            ModeOptions::Passphrase(_) => "passphrase",
            ModeOptions::Sentence(_) => "sentence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub mode: ModeOptions,
    #[serde(default)]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub no_repeat: bool,
}

impl GenerationRequest {
    pub fn password(options: PasswordOptions) -> Self {
        Self {
            mode: ModeOptions::Password(options),
            policy: None,
            no_repeat: false,
        }
    }

    pub fn passphrase(options: WordOptions) -> Self {
        Self {
            mode: ModeOptions::Passphrase(options),
            policy: None,
            no_repeat: false,
        }
    }

    pub fn sentence(options: WordOptions) -> Self {
        Self {
            mode: ModeOptions::Sentence(options),
            policy: None,
            no_repeat: false,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_no_repeat(mut self, no_repeat: bool) -> Self {
        self.no_repeat = no_repeat;
        self
    }

    /// Loads and validates a request serialized as JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let request: Self = serde_json::from_str(&data)?;
        request.validate()?;
        Ok(request)
    }

    /// Range checks that do not depend on pool or wordlist contents.
    pub fn validate(&self) -> Result<()> {
        match &self.mode {
            ModeOptions::Password(options) => {
                if options.length == 0 || options.length > MAX_LENGTH {
                    return Err(Error::config(format!(
                        "Length must be between 1 and {}",
                        MAX_LENGTH
                    )));
                }
            }
            ModeOptions::Passphrase(options) => {
                if options.word_count == 0 || options.word_count > MAX_WORD_COUNT {
                    return Err(Error::config(format!(
                        "Word count must be between 1 and {}",
                        MAX_WORD_COUNT
                    )));
                }
            }
            ModeOptions::Sentence(options) => {
                if options.word_count < SENTENCE_TEMPLATE_WORDS
                    || options.word_count > MAX_WORD_COUNT
                {
                    return Err(Error::config(format!(
                        "Sentence mode needs between {} and {} words",
                        SENTENCE_TEMPLATE_WORDS, MAX_WORD_COUNT
                    )));
                }
            }
        }

        if let Some(policy) = &self.policy {
            policy.check()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PasswordOptions::default();
        assert_eq!(options.length, 16);
        assert_eq!(options.classes.len(), 4);

        let words = WordOptions::default();
        assert_eq!(words.word_count, 5);
        assert_eq!(words.separator, "-");
        assert!(!words.allow_repeats);
    }

    #[test]
    fn test_validate_length_bounds() {
        let zero = GenerationRequest::password(PasswordOptions {
            length: 0,
            ..Default::default()
        });
        assert!(zero.validate().is_err());

        let huge = GenerationRequest::password(PasswordOptions {
            length: MAX_LENGTH + 1,
            ..Default::default()
        });
        assert!(huge.validate().is_err());

        assert!(GenerationRequest::password(PasswordOptions::default())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_sentence_minimum() {
        let short = GenerationRequest::sentence(WordOptions {
            word_count: 3,
            ..Default::default()
        });
        assert!(matches!(short.validate(), Err(Error::Configuration(_))));

        let ok = GenerationRequest::sentence(WordOptions {
            word_count: 4,
            ..Default::default()
        });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let json = r#"{
            "mode": { "kind": "passphrase", "word_count": 4, "separator": "." },
            "no_repeat": true
        }"#;

        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert!(request.no_repeat);
        assert!(request.policy.is_none());
        match request.mode {
            ModeOptions::Passphrase(options) => {
                assert_eq!(options.word_count, 4);
                assert_eq!(options.separator, ".");
                assert!(!options.capitalize);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_json_password_classes() {
        let json = r#"{ "mode": { "kind": "password", "classes": ["lower", "digit"] } }"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        match request.mode {
            ModeOptions::Password(options) => {
                assert_eq!(options.classes, vec![CharClass::Lower, CharClass::Digit]);
                assert_eq!(options.length, DEFAULT_LENGTH);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{ "mode": { "kind": "password", "length": 24 } }"#).unwrap();

        let request = GenerationRequest::from_json_file(&path).unwrap();
        assert_eq!(request.mode.name(), "password");
    }
}
