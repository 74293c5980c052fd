use crate::charset::{self, CharacterPool};
use crate::error::Result;
use crate::request::{ModeOptions, PasswordOptions, SENTENCE_TEMPLATE_WORDS, WordOptions};
use crate::rng::KeystreamRng;
use crate::wordlist::WordList;
use std::fmt;
use zeroize::Zeroizing;

const DETERMINERS: &[&str] = &["the", "my", "your", "our", "every", "this", "that", "one"];
const VERBS: &[&str] = &[
    "guards", "chases", "builds", "paints", "follows", "carries", "watches", "finds", "lifts",
    "hides", "breaks", "signals",
];
const ADVERBS: &[&str] = &[
    "quietly", "boldly", "swiftly", "gently", "calmly", "bravely", "slowly", "brightly",
];
const PREPOSITIONS: &[&str] = &[
    "under", "over", "beside", "behind", "beyond", "near", "inside", "across",
];

/// Where a candidate's randomness came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provenance {
    Pool {
        pool_size: usize,
    },
    Words {
        word_count: usize,
        list_size: usize,
        digit: bool,
        symbol: bool,
    },
}

/// A generated value with the provenance needed to estimate its entropy.
#[derive(Clone)]
pub struct Candidate {
    value: Zeroizing<String>,
    provenance: Provenance,
    padding_digits: usize,
    truncated_from: Option<usize>,
}

impl Candidate {
    pub fn new(value: String, provenance: Provenance) -> Self {
        Self {
            value: Zeroizing::new(value),
            provenance,
            padding_digits: 0,
            truncated_from: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_value(self) -> Zeroizing<String> {
        self.value
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Random digits appended by policy repair.
    pub fn padding_digits(&self) -> usize {
        self.padding_digits
    }

    /// Character count before policy repair truncated the value.
    pub fn truncated_from(&self) -> Option<usize> {
        self.truncated_from
    }

    pub(crate) fn replace_value(
        &mut self,
        value: String,
        padded: usize,
        truncated_from: Option<usize>,
    ) {
        self.value = Zeroizing::new(value);
        self.padding_digits += padded;
        self.truncated_from = self.truncated_from.or(truncated_from);
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("value", &"[redacted]")
            .field("provenance", &self.provenance)
            .field("padding_digits", &self.padding_digits)
            .field("truncated_from", &self.truncated_from)
            .finish()
    }
}

/// One way of producing candidates from an already validated pool or list.
pub trait CandidateStrategy {
    fn generate(&self, rng: &mut KeystreamRng) -> Candidate;

    /// Advisory text for the caller, such as which wordlist is in use.
    fn note(&self) -> Option<String> {
        None
    }

    /// Number of mandatory character groups, for pool-based strategies.
    fn group_count(&self) -> Option<usize> {
        None
    }
}

/// Builds the strategy for a request. Pool and wordlist problems surface
/// here as configuration errors, before any candidate is drawn.
pub fn strategy_for(mode: &ModeOptions) -> Result<Box<dyn CandidateStrategy>> {
    Ok(match mode {
        ModeOptions::Password(options) => Box::new(PoolStrategy::new(options)?),
        ModeOptions::Passphrase(options) => Box::new(WordlistStrategy::new(options)?),
        ModeOptions::Sentence(options) => Box::new(SentenceStrategy::new(options)?),
    })
}

pub struct PoolStrategy {
    pool: CharacterPool,
    length: usize,
}

impl PoolStrategy {
    pub fn new(options: &PasswordOptions) -> Result<Self> {
        let pool = CharacterPool::build(
            &options.classes,
            &options.exclude,
            options.no_ambiguous,
            options.length,
        )?;
        Ok(Self {
            pool,
            length: options.length,
        })
    }
}

impl CandidateStrategy for PoolStrategy {
    /// One character from every group first, the rest from the whole
    /// pool, then a shuffle so the guaranteed characters land anywhere.
    fn generate(&self, rng: &mut KeystreamRng) -> Candidate {
        let mut out: Zeroizing<Vec<char>> = Zeroizing::new(Vec::with_capacity(self.length));

        for group in self.pool.groups() {
            out.push(*rng.pick(&group.chars));
        }
        while out.len() < self.length {
            out.push(*rng.pick(self.pool.chars()));
        }

        rng.shuffle(out.as_mut_slice());

        Candidate::new(
            out.iter().collect(),
            Provenance::Pool {
                pool_size: self.pool.size(),
            },
        )
    }

    fn group_count(&self) -> Option<usize> {
        Some(self.pool.groups().len())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Draws `count` words, without replacement unless `allow_repeats`.
fn draw_words<'a>(
    rng: &mut KeystreamRng,
    list: &'a WordList,
    count: usize,
    allow_repeats: bool,
) -> Vec<&'a str> {
    let mut available: Vec<&str> = list.words().iter().map(String::as_str).collect();
    let mut chosen = Vec::with_capacity(count);

    for _ in 0..count {
        if allow_repeats {
            chosen.push(*rng.pick(&available));
        } else {
            let index = rng.below(available.len());
            chosen.push(available.swap_remove(index));
        }
    }

    chosen
}

fn append_extras(value: &mut String, options: &WordOptions, rng: &mut KeystreamRng) {
    if options.append_digit {
        let digits: Vec<char> = charset::DIGITS.chars().collect();
        value.push(*rng.pick(&digits));
    }
    if options.append_symbol {
        let symbols: Vec<char> = charset::SYMBOLS.chars().collect();
        value.push(*rng.pick(&symbols));
    }
}

fn word_provenance(options: &WordOptions, list: &WordList) -> Provenance {
    Provenance::Words {
        word_count: options.word_count,
        list_size: list.len(),
        digit: options.append_digit,
        symbol: options.append_symbol,
    }
}

pub struct WordlistStrategy {
    list: WordList,
    options: WordOptions,
}

impl WordlistStrategy {
    pub fn new(options: &WordOptions) -> Result<Self> {
        let list = WordList::resolve(
            options.custom_words.as_deref(),
            options.custom_only,
            options.word_count,
            options.allow_repeats,
        )?;
        Ok(Self {
            list,
            options: options.clone(),
        })
    }
}

impl CandidateStrategy for WordlistStrategy {
    fn generate(&self, rng: &mut KeystreamRng) -> Candidate {
        let words = draw_words(
            rng,
            &self.list,
            self.options.word_count,
            self.options.allow_repeats,
        );

        let rendered: Zeroizing<Vec<String>> = Zeroizing::new(
            words
                .into_iter()
                .map(|w| {
                    if self.options.capitalize {
                        capitalize(w)
                    } else {
                        w.to_string()
                    }
                })
                .collect(),
        );

        let mut value = rendered.join(self.options.separator.as_str());
        append_extras(&mut value, &self.options, rng);

        Candidate::new(value, word_provenance(&self.options, &self.list))
    }

    fn note(&self) -> Option<String> {
        Some(self.list.note())
    }
}

/// Renders drawn words into
/// determiner word word verb adverb preposition determiner word word,
/// followed by any leftover words. The first token is always capitalized.
pub struct SentenceStrategy {
    inner: WordlistStrategy,
}

impl SentenceStrategy {
    pub fn new(options: &WordOptions) -> Result<Self> {
        Ok(Self {
            inner: WordlistStrategy::new(options)?,
        })
    }
}

impl CandidateStrategy for SentenceStrategy {
    fn generate(&self, rng: &mut KeystreamRng) -> Candidate {
        let options = &self.inner.options;
        let drawn = draw_words(
            rng,
            &self.inner.list,
            options.word_count,
            options.allow_repeats,
        );

        let mut words: Vec<String> = drawn
            .into_iter()
            .map(|w| {
                if options.capitalize {
                    capitalize(w)
                } else {
                    w.to_string()
                }
            })
            .collect();
        let tail = words.split_off(SENTENCE_TEMPLATE_WORDS.min(words.len()));
        let mut slots = words.into_iter();

        let mut tokens: Zeroizing<Vec<String>> = Zeroizing::new(Vec::new());
        tokens.push(capitalize(*rng.pick(DETERMINERS)));
        tokens.extend(slots.by_ref().take(2));
        tokens.push(rng.pick(VERBS).to_string());
        tokens.push(rng.pick(ADVERBS).to_string());
        tokens.push(rng.pick(PREPOSITIONS).to_string());
        tokens.push(rng.pick(DETERMINERS).to_string());
        tokens.extend(slots);
        tokens.extend(tail);

        let mut value = tokens.join(options.separator.as_str());
        append_extras(&mut value, options, rng);

        Candidate::new(value, word_provenance(options, &self.inner.list))
    }

    fn note(&self) -> Option<String> {
        self.inner.note()
    }
}
