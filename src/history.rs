//! No-repeat history.
//!
//! Generated values are never stored, only keyed BLAKE2b digests. Each
//! [`ScopeKey`] is a fingerprint of the generation settings, so changing a
//! setting starts a fresh uniqueness space.

use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::request::{GenerationRequest, ModeOptions};
use crate::wordlist::parse_custom_words;
use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::Path;

pub const DEFAULT_SCOPE_CAPACITY: usize = 4000;

const SCOPE_DOMAIN: &[u8] = b"passforge/scope/v1";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Fingerprints the mode options and policy. Personal-info tokens and
    /// the no-repeat flag do not take part, and settings that only differ
    /// in ordering or formatting share a scope.
    pub fn derive(request: &GenerationRequest) -> Result<Self> {
        let mode = canonical_mode(&request.mode);
        let policy = request.policy.as_ref().map(canonical_policy);
        let material = serde_json::to_vec(&(&mode, &policy))?;

        let mut hasher = Blake2b512::new();
        hasher.update(SCOPE_DOMAIN);
        hasher.update(&material);
        let digest = format!("{:x}", hasher.finalize());

        Ok(Self(digest[..32].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical_mode(mode: &ModeOptions) -> ModeOptions {
    let mut mode = mode.clone();

    match &mut mode {
        ModeOptions::Password(options) => {
            options.classes.sort_unstable();
            options.classes.dedup();

            let mut exclude: Vec<char> = options.exclude.chars().collect();
            exclude.sort_unstable();
            exclude.dedup();
            options.exclude = exclude.into_iter().collect();
        }
        ModeOptions::Passphrase(options) | ModeOptions::Sentence(options) => {
            options.custom_words = options
                .custom_words
                .as_deref()
                .map(parse_custom_words)
                .filter(|words| !words.is_empty())
                .map(|mut words| {
                    words.sort_unstable();
                    words.join("\n")
                });
        }
    }

    mode
}

fn canonical_policy(policy: &Policy) -> Policy {
    let mut banned: Vec<String> = policy
        .banned_substrings
        .iter()
        .map(|b| b.trim().to_lowercase())
        .filter(|b| !b.is_empty())
        .collect();
    banned.sort_unstable();
    banned.dedup();

    Policy {
        banned_substrings: banned,
        personal_info: Vec::new(),
        ..policy.clone()
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateHash(String);

impl CandidateHash {
    /// Digest of `value` bound to `scope`.
    pub fn of(scope: &ScopeKey, value: &str) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(scope.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Record of previously issued candidates.
///
/// `has` followed by `remember` is not atomic; a store shared between
/// threads must be locked around the pair.
pub trait HistoryStore {
    fn has(&self, scope: &ScopeKey, hash: &CandidateHash) -> bool;
    fn remember(&mut self, scope: &ScopeKey, hash: &CandidateHash);
}

#[derive(Debug, Default)]
struct ScopeEntries {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

/// In-memory history, capped per scope with oldest-first eviction.
#[derive(Debug)]
pub struct MemoryHistory {
    capacity: usize,
    scopes: HashMap<ScopeKey, ScopeEntries>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SCOPE_CAPACITY)
    }
}

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    capacity: usize,
    scopes: HashMap<String, Vec<String>>,
}

impl MemoryHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            scopes: HashMap::new(),
        }
    }

    pub fn len(&self, scope: &ScopeKey) -> usize {
        self.scopes.get(scope).map_or(0, |entries| entries.order.len())
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.values().all(|entries| entries.order.is_empty())
    }

    /// Loads a history saved by [`MemoryHistory::save`]. A missing file
    /// yields an empty history with the default capacity.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)?;
        let file: HistoryFile = serde_json::from_str(&data)
            .map_err(|e| Error::History(format!("{}: {}", path.display(), e)))?;

        let mut history = Self::with_capacity(file.capacity);
        for (scope, hashes) in file.scopes {
            let scope = ScopeKey(scope);
            for hash in hashes {
                history.remember(&scope, &CandidateHash(hash));
            }
        }

        log::debug!("Loaded history for {} scopes", history.scopes.len());
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = HistoryFile {
            capacity: self.capacity,
            scopes: self
                .scopes
                .iter()
                .map(|(scope, entries)| {
                    (scope.0.clone(), entries.order.iter().cloned().collect())
                })
                .collect(),
        };

        std::fs::write(path, serde_json::to_vec(&file)?)?;
        Ok(())
    }
}

impl HistoryStore for MemoryHistory {
    fn has(&self, scope: &ScopeKey, hash: &CandidateHash) -> bool {
        self.scopes
            .get(scope)
            .is_some_and(|entries| entries.seen.contains(&hash.0))
    }

    fn remember(&mut self, scope: &ScopeKey, hash: &CandidateHash) {
        let capacity = self.capacity;
        let entries = self.scopes.entry(scope.clone()).or_default();

        if !entries.seen.insert(hash.0.clone()) {
            return;
        }
        entries.order.push_back(hash.0.clone());

        while entries.order.len() > capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.seen.remove(&oldest);
                log::debug!("Evicted oldest history entry in scope {}", scope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharClass;
    use crate::request::{PasswordOptions, WordOptions};

    fn scope(name: &str) -> ScopeKey {
        ScopeKey(name.to_string())
    }

    #[test]
    fn test_remember_and_has() {
        let mut history = MemoryHistory::default();
        let s = scope("a");
        let hash = CandidateHash::of(&s, "secret");

        assert!(!history.has(&s, &hash));
        history.remember(&s, &hash);
        assert!(history.has(&s, &hash));
        assert!(!history.has(&scope("b"), &hash));
    }

    #[test]
    fn test_remember_is_idempotent() {
        let mut history = MemoryHistory::default();
        let s = scope("a");
        let hash = CandidateHash::of(&s, "secret");
        history.remember(&s, &hash);
        history.remember(&s, &hash);
        assert_eq!(history.len(&s), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = MemoryHistory::with_capacity(3);
        let s = scope("a");
        let hashes: Vec<CandidateHash> = (0..4)
            .map(|i| CandidateHash::of(&s, &format!("value-{}", i)))
            .collect();

        for hash in &hashes {
            history.remember(&s, hash);
        }

        assert_eq!(history.len(&s), 3);
        assert!(!history.has(&s, &hashes[0]));
        assert!(history.has(&s, &hashes[3]));
    }

    #[test]
    fn test_capacity_is_per_scope() {
        let mut history = MemoryHistory::with_capacity(1);
        let a = scope("a");
        let b = scope("b");
        history.remember(&a, &CandidateHash::of(&a, "x"));
        history.remember(&b, &CandidateHash::of(&b, "x"));
        assert_eq!(history.len(&a), 1);
        assert_eq!(history.len(&b), 1);
    }

    #[test]
    fn test_hash_depends_on_scope() {
        let a = CandidateHash::of(&scope("a"), "same");
        let b = CandidateHash::of(&scope("b"), "same");
        assert_ne!(a, b);
        assert!(!a.as_str().contains("same"));
    }

    #[test]
    fn test_scope_key_changes_with_settings() {
        let short = GenerationRequest::password(PasswordOptions {
            length: 12,
            ..Default::default()
        });
        let long = GenerationRequest::password(PasswordOptions {
            length: 13,
            ..Default::default()
        });

        let a = ScopeKey::derive(&short).unwrap();
        assert_eq!(a, ScopeKey::derive(&short.clone()).unwrap());
        assert_ne!(a, ScopeKey::derive(&long).unwrap());
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_scope_key_ignores_personal_info_and_flag() {
        let base = GenerationRequest::passphrase(WordOptions::default()).with_policy(Policy {
            min_length: Some(12),
            ..Default::default()
        });
        let personal = base.clone().with_no_repeat(true).with_policy(Policy {
            min_length: Some(12),
            personal_info: vec!["Ada".into()],
            ..Default::default()
        });

        assert_eq!(
            ScopeKey::derive(&base).unwrap(),
            ScopeKey::derive(&personal).unwrap()
        );
    }

    #[test]
    fn test_equivalent_settings_share_scope() {
        let ordered = GenerationRequest::password(PasswordOptions {
            classes: vec![CharClass::Lower, CharClass::Digit],
            exclude: "abc".to_string(),
            ..Default::default()
        });
        let reordered = GenerationRequest::password(PasswordOptions {
            classes: vec![CharClass::Digit, CharClass::Lower, CharClass::Digit],
            exclude: "cbaa".to_string(),
            ..Default::default()
        });
        assert_eq!(
            ScopeKey::derive(&ordered).unwrap(),
            ScopeKey::derive(&reordered).unwrap()
        );

        let words = |text: &str| {
            GenerationRequest::passphrase(WordOptions {
                custom_words: Some(text.to_string()),
                ..Default::default()
            })
        };
        assert_eq!(
            ScopeKey::derive(&words("a,b")).unwrap(),
            ScopeKey::derive(&words("b, a\n")).unwrap()
        );
        assert_ne!(
            ScopeKey::derive(&words("a,b")).unwrap(),
            ScopeKey::derive(&words("a,c")).unwrap()
        );

        let banned = |list: &[&str]| {
            GenerationRequest::passphrase(WordOptions::default()).with_policy(Policy {
                banned_substrings: list.iter().map(|b| b.to_string()).collect(),
                ..Default::default()
            })
        };
        assert_eq!(
            ScopeKey::derive(&banned(&["Admin", "pass"])).unwrap(),
            ScopeKey::derive(&banned(&["pass ", "admin"])).unwrap()
        );
    }

    #[test]
    fn test_blank_custom_words_match_built_in_scope() {
        let built_in = GenerationRequest::passphrase(WordOptions::default());
        let blank = GenerationRequest::passphrase(WordOptions {
            custom_words: Some(" ,\n".to_string()),
            ..Default::default()
        });
        assert_eq!(
            ScopeKey::derive(&built_in).unwrap(),
            ScopeKey::derive(&blank).unwrap()
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = MemoryHistory::with_capacity(10);
        let s = scope("persisted");
        let hash = CandidateHash::of(&s, "value");
        history.remember(&s, &hash);
        history.save(&path).unwrap();

        let loaded = MemoryHistory::load(&path).unwrap();
        assert!(loaded.has(&s, &hash));
        assert_eq!(loaded.capacity, 10);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = MemoryHistory::load(&dir.path().join("absent.json")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(MemoryHistory::load(&path), Err(Error::History(_))));
    }
}
