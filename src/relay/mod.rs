//! Relay between Telegram users, web search and the completion API.

pub mod completion;
pub mod controller;
pub mod menu;
pub mod prompts;
pub mod router;
pub mod search;
pub mod users;

#[cfg(test)]
mod tests;

pub use completion::OpenAiClient;
pub use controller::{schema, Relay};
pub use prompts::Prompts;
pub use router::PromptRouter;
pub use search::SerperClient;
pub use users::UserLogger;
