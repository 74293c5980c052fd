use crate::error::{Error, Result};
use crate::generator::{Candidate, strategy_for};
use crate::history::{CandidateHash, HistoryStore, ScopeKey};
use crate::policy::{PolicyResult, Violation};
use crate::request::{GenerationRequest, ModeOptions};
use crate::rng::KeystreamRng;
use crate::strength::StrengthEstimate;

/// Attempts per generation call before giving up.
pub const MAX_ATTEMPTS: usize = 400;

/// An accepted candidate and what is known about it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub candidate: Candidate,
    pub strength: StrengthEstimate,
    /// Present when the request carries a policy; always passing.
    pub policy_result: Option<PolicyResult>,
    pub note: Option<String>,
    pub attempts: usize,
}

/// Generates one candidate that satisfies the request's policy and, with
/// no-repeat enabled, has not been issued before under the request's
/// scope. The accepted candidate is recorded in `history` before it is
/// returned.
///
/// Configuration problems fail immediately. Policy rejections and repeats
/// are retried up to [`MAX_ATTEMPTS`] times.
pub fn generate(
    request: &GenerationRequest,
    rng: &mut KeystreamRng,
    history: Option<&mut dyn HistoryStore>,
) -> Result<Generated> {
    generate_with_limit(request, rng, history, MAX_ATTEMPTS)
}

pub fn generate_with_limit(
    request: &GenerationRequest,
    rng: &mut KeystreamRng,
    mut history: Option<&mut dyn HistoryStore>,
    max_attempts: usize,
) -> Result<Generated> {
    request.validate()?;

    if request.no_repeat && history.is_none() {
        return Err(Error::config("No-repeat generation needs a history store"));
    }

    let strategy = strategy_for(&request.mode)?;

    if let (Some(policy), Some(groups)) = (&request.policy, strategy.group_count()) {
        if policy.required_groups > groups {
            return Err(Error::config(format!(
                "Policy requires {} character classes but only {} are available",
                policy.required_groups, groups
            )));
        }
    }

    // Repairs must never resize a password: the pool guarantees the exact
    // length and one character per group.
    if let (ModeOptions::Password(options), Some(policy)) = (&request.mode, &request.policy) {
        if let Some(max) = policy.max_length.filter(|&max| max < options.length) {
            return Err(Error::config(format!(
                "Policy maximum length {} is shorter than the requested length {}",
                max, options.length
            )));
        }
        if let Some(min) = policy.min_length.filter(|&min| min > options.length) {
            return Err(Error::config(format!(
                "Policy minimum length {} exceeds the requested length {}",
                min, options.length
            )));
        }
    }

    let scope = if request.no_repeat {
        Some(ScopeKey::derive(request)?)
    } else {
        None
    };

    let mut last_violations: Vec<Violation> = Vec::new();
    let mut repeats = 0;

    for attempt in 1..=max_attempts {
        let mut candidate = strategy.generate(rng);

        let policy_result = match &request.policy {
            Some(policy) => {
                let mut result = policy.validate(candidate.value());
                if !result.passed() && policy.repair {
                    policy.repair(&mut candidate, rng);
                    result = policy.validate(candidate.value());
                }
                if !result.passed() {
                    log::debug!(
                        "Attempt {} rejected: {}",
                        attempt,
                        result
                            .violations
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    last_violations = result.violations;
                    continue;
                }
                last_violations.clear();
                Some(result)
            }
            None => None,
        };

        if let (Some(scope), Some(store)) = (&scope, history.as_deref_mut()) {
            let hash = CandidateHash::of(scope, candidate.value());
            if store.has(scope, &hash) {
                repeats += 1;
                log::debug!("Attempt {} repeats an earlier value in scope {}", attempt, scope);
                continue;
            }
            store.remember(scope, &hash);
        }

        log::info!(
            "Accepted {} candidate after {} attempt(s)",
            request.mode.name(),
            attempt
        );

        return Ok(Generated {
            strength: StrengthEstimate::for_candidate(&candidate),
            candidate,
            policy_result,
            note: strategy.note(),
            attempts: attempt,
        });
    }

    log::warn!(
        "Search space exhausted after {} attempts ({} repeats)",
        max_attempts,
        repeats
    );

    Err(Error::ExhaustedSearchSpace {
        attempts: max_attempts,
        repeats,
        last_violations,
    })
}
