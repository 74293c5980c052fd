pub mod charset;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod image;
pub mod policy;
pub mod request;
pub mod rng;
pub mod strength;
pub mod wordlist;

pub use charset::{CharClass, CharacterPool};
pub use engine::{Generated, MAX_ATTEMPTS, generate};
pub use error::{Error, Result};
pub use generator::{Candidate, CandidateStrategy, Provenance};
pub use history::{CandidateHash, HistoryStore, MemoryHistory, ScopeKey};
pub use policy::{Policy, PolicyResult, Violation};
pub use request::{GenerationRequest, ModeOptions, PasswordOptions, WordOptions};
pub use rng::KeystreamRng;
pub use strength::{StrengthEstimate, StrengthLabel};
pub use wordlist::{WordList, default_wordlist};
