mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use passforge::charset::CharClass;
use passforge::engine;
use passforge::history::MemoryHistory;
use passforge::policy::Policy;
use passforge::request::{
    DEFAULT_LENGTH, DEFAULT_SENTENCE_SEPARATOR, DEFAULT_SEPARATOR, DEFAULT_WORD_COUNT,
    GenerationRequest, PasswordOptions, WordOptions,
};
use passforge::rng::KeystreamRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "passforge",
    version,
    about = "Password, passphrase and sentence mnemonic generator"
)]
struct Cli {
    #[arg(short, long, value_enum, default_value = "password")]
    mode: Mode,

    /// Password length in characters
    #[arg(short, long, default_value_t = DEFAULT_LENGTH)]
    length: usize,

    #[arg(long)]
    no_lower: bool,

    #[arg(long)]
    no_upper: bool,

    #[arg(long)]
    no_digits: bool,

    #[arg(long)]
    no_symbols: bool,

    /// Characters never to use
    #[arg(short = 'x', long, default_value = "")]
    exclude: String,

    /// Drop look-alike characters (O 0 I 1 l)
    #[arg(long)]
    no_ambiguous: bool,

    /// Number of words in passphrase and sentence modes
    #[arg(short, long, default_value_t = DEFAULT_WORD_COUNT)]
    words: usize,

    /// File of custom words, separated by newlines or commas
    #[arg(long)]
    wordlist: Option<PathBuf>,

    /// Custom words inline, separated by commas
    #[arg(long)]
    custom_words: Option<String>,

    /// Fail instead of falling back to the built-in list
    #[arg(long)]
    custom_only: bool,

    /// Word separator (default "-", or a space in sentence mode)
    #[arg(short, long)]
    separator: Option<String>,

    #[arg(long)]
    capitalize: bool,

    #[arg(long)]
    append_digit: bool,

    #[arg(long)]
    append_symbol: bool,

    #[arg(long)]
    allow_repeats: bool,

    #[arg(long)]
    min_length: Option<usize>,

    #[arg(long)]
    max_length: Option<usize>,

    /// Minimum number of character classes present (0-4)
    #[arg(long)]
    require_groups: Option<usize>,

    /// Substring that must not appear; repeatable
    #[arg(long = "ban")]
    banned: Vec<String>,

    /// Prompt for personal info (hidden input) that must not appear
    #[arg(long)]
    personal: bool,

    /// Reject policy failures instead of padding or truncating
    #[arg(long)]
    no_repair: bool,

    /// Never issue the same value twice for the same settings
    #[arg(long)]
    no_repeat: bool,

    /// History file for no-repeat across runs
    #[arg(long)]
    history: Option<PathBuf>,

    /// Load the whole request from a JSON file; generation flags are ignored
    #[arg(long)]
    request: Option<PathBuf>,

    /// How many values to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum Mode {
    Password,
    Passphrase,
    Sentence,
}

impl Cli {
    fn classes(&self) -> Vec<CharClass> {
        [
            (CharClass::Lower, self.no_lower),
            (CharClass::Upper, self.no_upper),
            (CharClass::Digit, self.no_digits),
            (CharClass::Symbol, self.no_symbols),
        ]
        .into_iter()
        .filter(|(_, disabled)| !disabled)
        .map(|(class, _)| class)
        .collect()
    }

    fn word_options(&self) -> Result<WordOptions> {
        let custom_words = match &self.wordlist {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read wordlist {}", path.display()))?,
            ),
            None => self.custom_words.clone(),
        };

        let default_separator = match self.mode {
            Mode::Sentence => DEFAULT_SENTENCE_SEPARATOR,
            _ => DEFAULT_SEPARATOR,
        };

        Ok(WordOptions {
            word_count: self.words,
            custom_words,
            custom_only: self.custom_only,
            separator: self
                .separator
                .clone()
                .unwrap_or_else(|| default_separator.to_string()),
            capitalize: self.capitalize,
            append_digit: self.append_digit,
            append_symbol: self.append_symbol,
            allow_repeats: self.allow_repeats,
        })
    }

    fn policy(&self) -> Result<Option<Policy>> {
        let wanted = self.min_length.is_some()
            || self.max_length.is_some()
            || self.require_groups.is_some()
            || !self.banned.is_empty()
            || self.personal;

        if !wanted {
            return Ok(None);
        }

        let personal_info = if self.personal {
            ui::prompt_personal_info()?
        } else {
            Vec::new()
        };

        Ok(Some(Policy {
            min_length: self.min_length,
            max_length: self.max_length,
            required_groups: self.require_groups.unwrap_or(0),
            banned_substrings: self.banned.clone(),
            personal_info,
            repair: !self.no_repair,
            ..Default::default()
        }))
    }

    fn build_request(&self) -> Result<GenerationRequest> {
        if let Some(path) = &self.request {
            let mut request = GenerationRequest::from_json_file(path)
                .with_context(|| format!("Failed to load request {}", path.display()))?;
            request.no_repeat |= self.no_repeat;
            return Ok(request);
        }

        let request = match self.mode {
            Mode::Password => GenerationRequest::password(PasswordOptions {
                length: self.length,
                classes: self.classes(),
                exclude: self.exclude.clone(),
                no_ambiguous: self.no_ambiguous,
            }),
            Mode::Passphrase => GenerationRequest::passphrase(self.word_options()?),
            Mode::Sentence => GenerationRequest::sentence(self.word_options()?),
        };

        let request = match self.policy()? {
            Some(policy) => request.with_policy(policy),
            None => request,
        };

        Ok(request.with_no_repeat(self.no_repeat))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.count == 0 {
        anyhow::bail!("Count must be at least 1");
    }

    let request = cli.build_request()?;

    let mut history = match &cli.history {
        Some(path) => MemoryHistory::load(path)
            .with_context(|| format!("Failed to load history {}", path.display()))?,
        None => MemoryHistory::default(),
    };

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet || cli.count > 1,
    };

    let mut rng = KeystreamRng::from_entropy();
    let progress = ui::batch_progress(cli.count, options.unicode_support);

    for index in 0..cli.count {
        let generated = engine::generate(&request, &mut rng, Some(&mut history))?;
        progress.suspend(|| ui::display_output(index, &generated, &request, &options));
        progress.inc(1);
    }

    progress.finish_and_clear();

    if let Some(path) = &cli.history {
        history
            .save(path)
            .with_context(|| format!("Failed to save history {}", path.display()))?;
    }

    Ok(())
}
