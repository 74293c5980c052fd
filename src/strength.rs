use crate::charset;
use crate::generator::{Candidate, Provenance};
use std::fmt;

/// Fast offline attacker, guesses per second.
pub const OFFLINE_GUESSES_PER_SEC: f64 = 1e10;
/// Throttled online attacker, guesses per second.
pub const ONLINE_GUESSES_PER_SEC: f64 = 10.0;

pub fn password_entropy(length: usize, pool_size: usize) -> f64 {
    length as f64 * (pool_size as f64).log2()
}

pub fn passphrase_entropy(word_count: usize, list_size: usize, digit: bool, symbol: bool) -> f64 {
    let mut bits = word_count as f64 * (list_size as f64).log2();
    if digit {
        bits += (charset::DIGITS.len() as f64).log2();
    }
    if symbol {
        bits += (charset::SYMBOLS.len() as f64).log2();
    }
    bits
}

/// Entropy of a candidate from its provenance, including policy repairs.
pub fn candidate_entropy(candidate: &Candidate) -> f64 {
    let length = candidate.value().chars().count();
    let padded = candidate.padding_digits();
    let padding_bits = padded as f64 * (charset::DIGITS.len() as f64).log2();

    let base = match candidate.provenance() {
        Provenance::Pool { pool_size } => password_entropy(length - padded, pool_size),
        Provenance::Words {
            word_count,
            list_size,
            digit,
            symbol,
        } => {
            let bits = passphrase_entropy(word_count, list_size, digit, symbol);
            match candidate.truncated_from() {
                Some(original) if original > 0 => {
                    bits * (length - padded) as f64 / original as f64
                }
                _ => bits,
            }
        }
    };

    base + padding_bits
}

/// Expected seconds to find a secret of `bits` entropy: half the space
/// divided by the guess rate.
pub fn crack_seconds(bits: f64, rate: f64) -> f64 {
    2f64.powf(bits) / 2.0 / rate
}

pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "—".to_string();
    }
    if seconds < 60.0 {
        format!("{:.1} sec", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1} min", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1} hr", seconds / 3600.0)
    } else {
        format!("{:.1} days", seconds / 86400.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl StrengthLabel {
    pub fn from_bits(bits: f64) -> Self {
        if bits < 35.0 {
            StrengthLabel::Weak
        } else if bits < 55.0 {
            StrengthLabel::Fair
        } else if bits < 75.0 {
            StrengthLabel::Strong
        } else {
            StrengthLabel::VeryStrong
        }
    }

    /// Fill level for a strength meter, in percent.
    pub fn meter_percent(self) -> u8 {
        match self {
            StrengthLabel::Weak => 20,
            StrengthLabel::Fair => 45,
            StrengthLabel::Strong => 70,
            StrengthLabel::VeryStrong => 90,
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrengthLabel::Weak => "Weak",
            StrengthLabel::Fair => "Fair",
            StrengthLabel::Strong => "Strong",
            StrengthLabel::VeryStrong => "Very Strong",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrengthEstimate {
    pub bits: f64,
    pub label: StrengthLabel,
    pub offline_seconds: f64,
    pub online_seconds: f64,
}

impl StrengthEstimate {
    pub fn from_bits(bits: f64) -> Self {
        Self {
            bits,
            label: StrengthLabel::from_bits(bits),
            offline_seconds: crack_seconds(bits, OFFLINE_GUESSES_PER_SEC),
            online_seconds: crack_seconds(bits, ONLINE_GUESSES_PER_SEC),
        }
    }

    pub fn for_candidate(candidate: &Candidate) -> Self {
        Self::from_bits(candidate_entropy(candidate))
    }

    pub fn offline_display(&self) -> String {
        format_duration(self.offline_seconds)
    }

    pub fn online_display(&self) -> String {
        format_duration(self.online_seconds)
    }
}
