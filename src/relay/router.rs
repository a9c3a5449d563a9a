//! Domain classification and prompt assembly.
//!
//! Every text message is classified on its own: menu buttons pressed earlier
//! have no effect on routing.

use std::sync::Arc;

use tracing::info;

use crate::relay::completion::PromptMessage;
use crate::relay::prompts::Prompts;
use crate::relay::search::{SearchProvider, SearchResult};

/// Lowercase stem of "конференция" and its inflections.
const CONFERENCE_KEYWORD: &str = "конференц";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationDomain {
    Crypto,
    Conference,
}

impl ConversationDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationDomain::Crypto => "crypto",
            ConversationDomain::Conference => "conference",
        }
    }
}

/// Conference if the text mentions the conference (case-insensitive), Crypto otherwise.
pub fn route(text: &str) -> ConversationDomain {
    if text.to_lowercase().contains(CONFERENCE_KEYWORD) {
        ConversationDomain::Conference
    } else {
        ConversationDomain::Crypto
    }
}

pub fn render_search_context(results: &[SearchResult]) -> String {
    let mut context = String::from("Based on latest search results:\n");
    for result in results {
        context.push_str(&format!(
            "- {}\n{}\nSource: {}\n\n",
            result.title, result.snippet, result.link
        ));
    }
    context
}

/// System message for `domain`, then the user message.
///
/// Search results only ever decorate Crypto questions.
pub fn assemble(
    prompts: &Prompts,
    domain: ConversationDomain,
    text: &str,
    results: &[SearchResult],
) -> Vec<PromptMessage> {
    let user = if domain == ConversationDomain::Crypto && !results.is_empty() {
        format!(
            "Search results: {}\n\nUser question: {}",
            render_search_context(results),
            text
        )
    } else {
        text.to_string()
    };

    vec![
        PromptMessage::system(prompts.system_for(domain)),
        PromptMessage::user(user),
    ]
}

pub struct PromptRouter {
    search: Arc<dyn SearchProvider>,
    prompts: Prompts,
}

impl PromptRouter {
    pub fn new(search: Arc<dyn SearchProvider>, prompts: Prompts) -> Self {
        Self { search, prompts }
    }

    /// Classify `text`, search if it is a Crypto question, and build the request.
    pub async fn prepare(&self, text: &str) -> (ConversationDomain, Vec<PromptMessage>) {
        let domain = route(text);
        let results = match domain {
            ConversationDomain::Crypto => self.search.search(text).await,
            ConversationDomain::Conference => Vec::new(),
        };
        info!("Routed to {} ({} search results)", domain.as_str(), results.len());
        (domain, assemble(&self.prompts, domain, text, &results))
    }
}
