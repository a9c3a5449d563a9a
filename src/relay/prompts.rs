//! System instructions for each conversational domain.
//!
//! The built-in templates live in `prompts/` and are compiled in. A prompts
//! directory may override either one with a file of the same name.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::relay::router::ConversationDomain;

const CRYPTO_PROMPT: &str = include_str!("../../prompts/crypto.txt");
const CONFERENCE_PROMPT: &str = include_str!("../../prompts/conference.txt");

#[derive(Debug)]
pub struct PromptError {
    path: PathBuf,
    source: std::io::Error,
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read prompt '{}': {}", self.path.display(), self.source)
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone)]
pub struct Prompts {
    crypto: String,
    conference: String,
}

impl Prompts {
    pub fn builtin() -> Self {
        Self {
            crypto: CRYPTO_PROMPT.to_string(),
            conference: CONFERENCE_PROMPT.to_string(),
        }
    }

    /// Built-in templates, with `crypto.txt` / `conference.txt` from `dir` taking precedence.
    pub fn load(dir: Option<&Path>) -> Result<Self, PromptError> {
        let mut prompts = Self::builtin();
        let Some(dir) = dir else {
            return Ok(prompts);
        };

        for domain in [ConversationDomain::Crypto, ConversationDomain::Conference] {
            let path = dir.join(format!("{}.txt", domain.as_str()));
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|source| PromptError { path: path.clone(), source })?;
            info!("Loaded {} prompt from {}", domain.as_str(), path.display());
            match domain {
                ConversationDomain::Crypto => prompts.crypto = text,
                ConversationDomain::Conference => prompts.conference = text,
            }
        }

        Ok(prompts)
    }

    pub fn system_for(&self, domain: ConversationDomain) -> &str {
        match domain {
            ConversationDomain::Crypto => &self.crypto,
            ConversationDomain::Conference => &self.conference,
        }
    }
}
