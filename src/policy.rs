//! Credential policy checks.
//!
//! [`Policy::validate`] is a pure function of the candidate text and
//! reports every violated rule. [`Policy::repair`] applies the few edge
//! fixes that are allowed instead of a retry; the caller re-validates
//! afterwards.

use crate::charset::{self, CharClass};
use crate::error::{Error, Result};
use crate::generator::Candidate;
use crate::rng::KeystreamRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Personal-info fragments shorter than this are not matched.
pub const MIN_PERSONAL_TOKEN_CHARS: usize = 3;

/// Upper limit for either length bound.
pub const MAX_POLICY_LENGTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Minimum number of distinct character classes present, 0 to disable.
    pub required_groups: usize,
    pub forbid_boundary_whitespace: bool,
    pub banned_substrings: Vec<String>,
    /// Caller identifiers such as a name or birth year.
    pub personal_info: Vec<String>,
    /// Allow padding, truncation and boundary swaps before rejecting.
    pub repair: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_length: None,
            max_length: None,
            required_groups: 0,
            forbid_boundary_whitespace: true,
            banned_substrings: Vec::new(),
            personal_info: Vec::new(),
            repair: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    TooShort { length: usize, min: usize },
    TooLong { length: usize, max: usize },
    InsufficientGroups { present: usize, required: usize },
    BoundaryWhitespace,
    BannedSubstring(String),
    PersonalInfo(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::TooShort { length, min } => {
                write!(f, "too short ({} chars, minimum {})", length, min)
            }
            Violation::TooLong { length, max } => {
                write!(f, "too long ({} chars, maximum {})", length, max)
            }
            Violation::InsufficientGroups { present, required } => write!(
                f,
                "insufficient group coverage ({} of {} required classes)",
                present, required
            ),
            Violation::BoundaryWhitespace => f.write_str("leading or trailing whitespace"),
            Violation::BannedSubstring(s) => write!(f, "contains banned text \"{}\"", s),
            // The token itself is left out so it never reaches logs.
            Violation::PersonalInfo(_) => f.write_str("contains personal information"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyResult {
    pub violations: Vec<Violation>,
}

impl PolicyResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// One line of the rendered policy checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub rule: String,
    pub passed: bool,
}

impl Policy {
    /// Rejects policies that can never be satisfied.
    pub fn check(&self) -> Result<()> {
        if self.max_length == Some(0) {
            return Err(Error::config("Maximum length must be at least 1"));
        }

        for bound in [self.min_length, self.max_length].into_iter().flatten() {
            if bound > MAX_POLICY_LENGTH {
                return Err(Error::config(format!(
                    "Length bound {} exceeds the limit of {}",
                    bound, MAX_POLICY_LENGTH
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(Error::config(format!(
                    "Minimum length {} exceeds maximum length {}",
                    min, max
                )));
            }
        }

        if self.required_groups > CharClass::ALL.len() {
            return Err(Error::config(format!(
                "Cannot require {} character classes, only {} exist",
                self.required_groups,
                CharClass::ALL.len()
            )));
        }

        Ok(())
    }

    pub fn validate(&self, value: &str) -> PolicyResult {
        let mut violations = Vec::new();
        let length = value.chars().count();

        if let Some(min) = self.min_length {
            if length < min {
                violations.push(Violation::TooShort { length, min });
            }
        }

        if let Some(max) = self.max_length {
            if length > max {
                violations.push(Violation::TooLong { length, max });
            }
        }

        if self.required_groups > 0 {
            let present = charset::classes_present(value).len();
            if present < self.required_groups {
                violations.push(Violation::InsufficientGroups {
                    present,
                    required: self.required_groups,
                });
            }
        }

        if self.forbid_boundary_whitespace && value.trim() != value {
            violations.push(Violation::BoundaryWhitespace);
        }

        let lowered = value.to_lowercase();

        for banned in &self.banned_substrings {
            let needle = banned.trim().to_lowercase();
            if !needle.is_empty() && lowered.contains(&needle) {
                violations.push(Violation::BannedSubstring(banned.clone()));
            }
        }

        for token in self.personal_tokens() {
            if lowered.contains(&token) {
                violations.push(Violation::PersonalInfo(token));
            }
        }

        PolicyResult { violations }
    }

    /// Lower-cased personal-info fragments: every identifier as a whole
    /// plus each of its whitespace-separated parts.
    fn personal_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();

        for info in &self.personal_info {
            let whole = info.trim().to_lowercase();
            let parts = whole.split_whitespace().map(str::to_string);

            for token in std::iter::once(whole.clone()).chain(parts) {
                if token.chars().count() >= MIN_PERSONAL_TOKEN_CHARS && !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }

        tokens
    }

    /// Every active rule with its pass/fail state, in a stable order.
    pub fn checklist(&self, result: &PolicyResult) -> Vec<ChecklistItem> {
        let mut items = Vec::new();
        let failed = |pred: fn(&Violation) -> bool| result.violations.iter().any(pred);

        if let Some(min) = self.min_length {
            items.push(ChecklistItem {
                rule: format!("at least {} chars", min),
                passed: !failed(|v| matches!(v, Violation::TooShort { .. })),
            });
        }

        if let Some(max) = self.max_length {
            items.push(ChecklistItem {
                rule: format!("at most {} chars", max),
                passed: !failed(|v| matches!(v, Violation::TooLong { .. })),
            });
        }

        if self.required_groups > 0 {
            items.push(ChecklistItem {
                rule: format!(
                    "{} of {} character classes",
                    self.required_groups,
                    CharClass::ALL.len()
                ),
                passed: !failed(|v| matches!(v, Violation::InsufficientGroups { .. })),
            });
        }

        if self.forbid_boundary_whitespace {
            items.push(ChecklistItem {
                rule: "no leading or trailing whitespace".to_string(),
                passed: !failed(|v| matches!(v, Violation::BoundaryWhitespace)),
            });
        }

        if !self.banned_substrings.is_empty() {
            items.push(ChecklistItem {
                rule: "no banned text".to_string(),
                passed: !failed(|v| matches!(v, Violation::BannedSubstring(_))),
            });
        }

        if !self.personal_info.is_empty() {
            items.push(ChecklistItem {
                rule: "no personal information".to_string(),
                passed: !failed(|v| matches!(v, Violation::PersonalInfo(_))),
            });
        }

        items
    }

    /// Applies the allowed edge repairs in place: truncation to the
    /// maximum length, digit padding up to the minimum, then swapping
    /// boundary whitespace with a random interior non-space character.
    ///
    /// Does nothing when `repair` is off. The result must be validated
    /// again; truncation in particular can drop a required class.
    pub fn repair(&self, candidate: &mut Candidate, rng: &mut KeystreamRng) {
        if !self.repair {
            return;
        }

        let mut chars: Zeroizing<Vec<char>> =
            Zeroizing::new(candidate.value().chars().collect());
        let original_len = chars.len();
        let mut padded = 0;

        if let Some(max) = self.max_length {
            if chars.len() > max {
                chars.truncate(max);
            }
        }

        if let Some(min) = self.min_length {
            let digits: Vec<char> = charset::DIGITS.chars().collect();
            while chars.len() < min {
                chars.push(*rng.pick(&digits));
                padded += 1;
            }
        }

        if self.forbid_boundary_whitespace {
            swap_boundary_whitespace(&mut chars, rng);
        }

        let truncated_from = (chars.len() - padded < original_len).then_some(original_len);
        candidate.replace_value(chars.iter().collect(), padded, truncated_from);
    }
}

fn swap_boundary_whitespace(chars: &mut [char], rng: &mut KeystreamRng) {
    let len = chars.len();
    if len < 3 {
        return;
    }

    for edge in [0, len - 1] {
        if !chars[edge].is_whitespace() {
            continue;
        }
        let interior: Vec<usize> = (1..len - 1)
            .filter(|&i| !chars[i].is_whitespace())
            .collect();
        if interior.is_empty() {
            return;
        }
        let target = *rng.pick(&interior);
        chars.swap(edge, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Provenance;

    fn strict() -> Policy {
        Policy {
            min_length: Some(12),
            max_length: Some(32),
            required_groups: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_short_candidate_reports_every_violation() {
        let result = strict().validate("ab");
        assert_eq!(
            result.violations,
            vec![
                Violation::TooShort { length: 2, min: 12 },
                Violation::InsufficientGroups {
                    present: 1,
                    required: 3
                },
            ]
        );
        assert!(!result.passed());
    }

    #[test]
    fn test_compliant_candidate_passes() {
        let result = strict().validate("Correct9Horse!");
        assert!(result.passed(), "{:?}", result.violations);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let policy = Policy {
            banned_substrings: vec!["horse".into()],
            personal_info: vec!["Ada Lovelace".into()],
            ..strict()
        };
        let first = policy.validate(" lovelaceHorse ");
        let second = policy.validate(" lovelaceHorse ");
        assert_eq!(first, second);
        assert_eq!(first.violations.len(), 4);
    }

    #[test]
    fn test_boundary_whitespace() {
        let policy = Policy::default();
        assert!(policy.validate("inner space").passed());
        assert_eq!(
            policy.validate(" lead").violations,
            vec![Violation::BoundaryWhitespace]
        );
        assert_eq!(
            policy.validate("trail\t").violations,
            vec![Violation::BoundaryWhitespace]
        );
    }

    #[test]
    fn test_banned_substrings_case_insensitive() {
        let policy = Policy {
            banned_substrings: vec!["Password".into(), "  ".into()],
            ..Default::default()
        };
        let result = policy.validate("myPASSWORD1");
        assert_eq!(
            result.violations,
            vec![Violation::BannedSubstring("Password".into())]
        );
    }

    #[test]
    fn test_personal_info_parts_and_short_tokens() {
        let policy = Policy {
            personal_info: vec!["Grace Hopper".into(), "06".into(), "1906".into()],
            ..Default::default()
        };

        assert!(!policy.validate("hopper-rocket").passed());
        assert!(!policy.validate("x1906y").passed());
        assert!(policy.validate("06-orbit").passed());
    }

    #[test]
    fn test_personal_info_message_hides_token() {
        let violation = Violation::PersonalInfo("hopper".into());
        assert!(!violation.to_string().contains("hopper"));
    }

    #[test]
    fn test_check_rejects_impossible_bounds() {
        let policy = Policy {
            min_length: Some(20),
            max_length: Some(10),
            ..Default::default()
        };
        assert!(policy.check().is_err());

        let groups = Policy {
            required_groups: 5,
            ..Default::default()
        };
        assert!(groups.check().is_err());
    }

    #[test]
    fn test_check_rejects_zero_and_oversized_bounds() {
        let zero = Policy {
            max_length: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero.check(), Err(Error::Configuration(_))));

        let huge_min = Policy {
            min_length: Some(4_000_000_000),
            ..Default::default()
        };
        assert!(matches!(huge_min.check(), Err(Error::Configuration(_))));

        let huge_max = Policy {
            max_length: Some(MAX_POLICY_LENGTH + 1),
            ..Default::default()
        };
        assert!(huge_max.check().is_err());

        let at_limit = Policy {
            min_length: Some(1),
            max_length: Some(MAX_POLICY_LENGTH),
            ..Default::default()
        };
        assert!(at_limit.check().is_ok());
    }

    #[test]
    fn test_checklist_marks_failures() {
        let policy = strict();
        let result = policy.validate("ab");
        let items = policy.checklist(&result);

        assert_eq!(items.len(), 4);
        assert!(!items[0].passed);
        assert!(items[1].passed);
        assert!(!items[2].passed);
        assert!(items[3].passed);
    }

    #[test]
    fn test_repair_pads_with_digits() {
        let mut rng = KeystreamRng::from_key(&[42u8; 32]);
        let policy = Policy {
            min_length: Some(10),
            ..Default::default()
        };
        let mut candidate = Candidate::new(
            "orbit".to_string(),
            Provenance::Words {
                word_count: 1,
                list_size: 69,
                digit: false,
                symbol: false,
            },
        );

        policy.repair(&mut candidate, &mut rng);

        assert_eq!(candidate.value().len(), 10);
        assert!(candidate.value().starts_with("orbit"));
        assert!(candidate.value()[5..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(candidate.padding_digits(), 5);
        assert!(policy.validate(candidate.value()).passed());
    }

    #[test]
    fn test_repair_truncates_and_revalidation_catches_lost_class() {
        let mut rng = KeystreamRng::from_key(&[42u8; 32]);
        let policy = Policy {
            max_length: Some(6),
            required_groups: 2,
            ..Default::default()
        };
        let mut candidate = Candidate::new(
            "abcdefgh7".to_string(),
            Provenance::Pool { pool_size: 36 },
        );
        assert!(policy.validate(candidate.value()).violations.len() == 1);

        policy.repair(&mut candidate, &mut rng);

        assert_eq!(candidate.value(), "abcdef");
        assert_eq!(candidate.truncated_from(), Some(9));
        assert_eq!(
            policy.validate(candidate.value()).violations,
            vec![Violation::InsufficientGroups {
                present: 1,
                required: 2
            }]
        );
    }

    #[test]
    fn test_repair_swaps_boundary_space_inward() {
        let mut rng = KeystreamRng::from_key(&[42u8; 32]);
        let policy = Policy::default();
        let mut candidate = Candidate::new(
            " alpha bravo ".to_string(),
            Provenance::Pool { pool_size: 27 },
        );

        policy.repair(&mut candidate, &mut rng);

        let value = candidate.value();
        assert!(!value.starts_with(char::is_whitespace));
        assert!(!value.ends_with(char::is_whitespace));
        assert_eq!(value.chars().count(), 13);
        assert_eq!(value.chars().filter(|c| *c == ' ').count(), 3);
    }

    #[test]
    fn test_repair_disabled_leaves_candidate() {
        let mut rng = KeystreamRng::from_key(&[42u8; 32]);
        let policy = Policy {
            min_length: Some(10),
            repair: false,
            ..Default::default()
        };
        let mut candidate = Candidate::new("short".to_string(), Provenance::Pool { pool_size: 26 });
        policy.repair(&mut candidate, &mut rng);
        assert_eq!(candidate.value(), "short");
    }
}
