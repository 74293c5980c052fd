use anyhow::{Context, Result};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use passforge::engine::Generated;
use passforge::generator::Provenance;
use passforge::policy::Policy;
use passforge::request::GenerationRequest;
use passforge::strength::{self, StrengthLabel};
use rpassword::read_password;
use std::io::{self, Write};
use unicode_normalization::UnicodeNormalization;

pub const MAX_PERSONAL_ENTRIES: usize = 16;

/// Batches at least this large get a progress bar.
pub const PROGRESS_THRESHOLD: usize = 100;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn branch(unicode_support: bool, last: bool) -> &'static str {
    match (unicode_support, last) {
        (true, false) => "├─",
        (true, true) => "└─",
        (false, false) => "|-",
        (false, true) => "`-",
    }
}

fn styled(options: &DisplayOptions, style: Style) -> Style {
    if options.color_support {
        style
    } else {
        Style::new()
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn normalize_and_validate(s: &str, input_name: &str) -> Result<String> {
    let normalized: String = s.trim().nfc().collect();

    let control_positions: Vec<String> = normalized
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos.to_string())
        .collect();

    if !control_positions.is_empty() {
        anyhow::bail!(
            "{} contains {} control character(s) at position(s): {}",
            input_name,
            control_positions.len(),
            control_positions.join(", ")
        );
    }

    Ok(normalized)
}

/// Reads personal identifiers (name, birth year, ...) without echo, one per
/// line, until an empty line.
pub fn prompt_personal_info() -> Result<Vec<String>> {
    let term = Term::stderr();
    term.write_line("Personal info to keep out of the result (empty line to finish):")?;

    let mut entries = Vec::new();

    loop {
        if entries.len() >= MAX_PERSONAL_ENTRIES {
            anyhow::bail!(
                "Too many personal entries ({} maximum allowed)",
                MAX_PERSONAL_ENTRIES
            );
        }

        eprint!("In [{}]: ", entries.len());
        io::stderr().flush()?;

        let input = read_password().context("Failed to read personal info")?;
        let normalized =
            normalize_and_validate(&input, &format!("Personal entry {}", entries.len()))?;

        if normalized.is_empty() {
            break;
        }
        entries.push(normalized);
    }

    Ok(entries)
}

pub fn batch_progress(count: usize, unicode_support: bool) -> ProgressBar {
    if count < PROGRESS_THRESHOLD {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(count as u64);
    let bar_chars = if unicode_support { "█▓░" } else { "#>-" };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(bar_chars),
    );
    pb.set_message("generating");
    pb
}

pub fn display_output(
    index: usize,
    generated: &Generated,
    request: &GenerationRequest,
    options: &DisplayOptions,
) {
    let value = generated.candidate.value();

    if options.quiet {
        println!("{}", value);
        return;
    }

    println!("Out[{}]:\n{}\n", index, value);

    display_settings(generated, request, options);
    if let (Some(policy), Some(result)) = (&request.policy, &generated.policy_result) {
        display_policy(policy, &policy.checklist(result), options);
    }
    display_stats(generated, options);

    if let Some(note) = &generated.note {
        let (_, check_warn) = get_status_symbols(options.unicode_support);
        println!("\n[{}] {}", check_warn, note);
    }
}

fn display_settings(generated: &Generated, request: &GenerationRequest, options: &DisplayOptions) {
    let u = options.unicode_support;

    println!("Settings:");
    println!("  {} Mode       {}", branch(u, false), request.mode.name());

    match generated.candidate.provenance() {
        Provenance::Pool { pool_size } => {
            println!("  {} Pool       {} chars", branch(u, false), pool_size);
        }
        Provenance::Words {
            list_size,
            digit,
            symbol,
            ..
        } => {
            println!("  {} Wordlist   {} words", branch(u, false), list_size);
            if digit || symbol {
                let extras = match (digit, symbol) {
                    (true, true) => "digit + symbol",
                    (true, false) => "digit",
                    _ => "symbol",
                };
                println!("  {} Extras     {}", branch(u, false), extras);
            }
        }
    }

    println!("  {} Keystream  ChaCha20 (256-bit)", branch(u, false));
    println!("  {} Sampling   Unbiased rejection", branch(u, false));
    println!(
        "  {} No-repeat  {}",
        branch(u, false),
        if request.no_repeat { "on" } else { "off" }
    );

    let length = generated.candidate.value().chars().count();
    println!(
        "  {} Output     {} {}",
        branch(u, true),
        length,
        plural(length, "char", "chars")
    );

    println!();
}

fn display_policy(
    policy: &Policy,
    items: &[passforge::policy::ChecklistItem],
    options: &DisplayOptions,
) {
    if items.is_empty() {
        return;
    }

    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);

    println!("Policy:");
    for (i, item) in items.iter().enumerate() {
        let last = i == items.len() - 1;
        let (symbol, style) = if item.passed {
            (check_ok, styled(options, Style::new().green()))
        } else {
            (check_warn, styled(options, Style::new().yellow()))
        };
        println!(
            "  {} {} {}",
            branch(options.unicode_support, last),
            style.apply_to(format!("[{}]", symbol)),
            item.rule
        );
    }

    if policy.repair {
        println!("  (edge repairs enabled)");
    }

    println!();
}

fn display_stats(generated: &Generated, options: &DisplayOptions) {
    let u = options.unicode_support;
    let (check_ok, check_warn) = get_status_symbols(u);
    let estimate = &generated.strength;

    let (status_icon, entropy_style) = match estimate.label {
        StrengthLabel::VeryStrong | StrengthLabel::Strong => {
            (check_ok, styled(options, Style::new().green()))
        }
        StrengthLabel::Fair => (check_warn, styled(options, Style::new().yellow())),
        StrengthLabel::Weak => (check_warn, styled(options, Style::new().red())),
    };

    println!("Stats:");

    print!(
        "  {} Entropy    {} ",
        branch(u, false),
        entropy_style.apply_to(format!("[{}]", status_icon))
    );
    print!("{}", entropy_style.apply_to(format!("{:.1}", estimate.bits)));
    print!(" bits ({})", entropy_style.apply_to(estimate.label));
    println!();

    println!(
        "  {} Offline    {} at {:e} guesses/s",
        branch(u, false),
        estimate.offline_display(),
        strength::OFFLINE_GUESSES_PER_SEC
    );
    println!(
        "  {} Online     {} at {} guesses/s",
        branch(u, false),
        estimate.online_display(),
        strength::ONLINE_GUESSES_PER_SEC
    );

    let padded = generated.candidate.padding_digits();
    if padded > 0 {
        println!(
            "  {} Padding    {} {}",
            branch(u, false),
            padded,
            plural(padded, "digit", "digits")
        );
    }

    println!(
        "  {} Attempts   {}",
        branch(u, true),
        generated.attempts
    );

    println!(
        "\n{} Strength: {} ({}%)",
        entropy_style.apply_to(format!("[{}]", status_icon)),
        entropy_style.apply_to(estimate.label),
        estimate.label.meter_percent()
    );
}
