//! End-to-end tests of the relay with in-memory search and completion doubles.
//!
//! Run with: cargo test relay

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use teloxide::types::{InlineKeyboardButtonKind, User};

use super::completion::{CompletionProvider, FALLBACK_REPLY, PromptMessage, Role};
use super::menu::{self, MenuAction};
use super::router::{ConversationDomain, PromptRouter};
use super::search::{SearchProvider, SearchResult};
use super::*;

/// Returns `count` canned results and remembers every query.
struct RecordingSearch {
    count: usize,
    queries: Mutex<Vec<String>>,
}

impl RecordingSearch {
    fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            count,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for RecordingSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.queries.lock().unwrap().push(query.to_string());
        (1..=self.count)
            .map(|n| SearchResult {
                title: format!("DeFi news {n}"),
                snippet: format!("Snippet {n}"),
                link: format!("https://news.example/{n}"),
                date: Some("2 hours ago".to_string()),
            })
            .collect()
    }
}

/// Replies with a fixed text and remembers every request.
struct RecordingCompletion {
    reply: String,
    requests: Mutex<Vec<Vec<PromptMessage>>>,
}

impl RecordingCompletion {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Vec<PromptMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, messages: &[PromptMessage]) -> String {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.reply.clone()
    }
}

struct Harness {
    relay: Relay,
    search: Arc<RecordingSearch>,
    completion: Arc<RecordingCompletion>,
    log_path: PathBuf,
    dir: tempfile::TempDir,
}

fn harness(results: usize, reply: &str) -> Harness {
    harness_logging_to(results, reply, |dir| dir.join("users_data.csv"))
}

fn harness_logging_to(results: usize, reply: &str, log_path: impl FnOnce(&Path) -> PathBuf) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let log_path = log_path(dir.path());
    let search = RecordingSearch::new(results);
    let completion = RecordingCompletion::new(reply);
    let router = PromptRouter::new(search.clone(), Prompts::builtin());
    let users = UserLogger::new(log_path.clone());
    let relay = Relay::new(router, completion.clone(), users);
    Harness {
        relay,
        search,
        completion,
        log_path,
        dir,
    }
}

/// A Telegram user as the Bot API would deliver it.
fn telegram_user(value: serde_json::Value) -> User {
    serde_json::from_value(value).expect("valid Telegram user")
}

fn callback_data(reply: &menu::Reply) -> Vec<String> {
    reply
        .keyboard
        .as_ref()
        .map(|k| {
            k.inline_keyboard
                .iter()
                .flatten()
                .filter_map(|b| match &b.kind {
                    InlineKeyboardButtonKind::CallbackData(d) => Some(d.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// FREE-TEXT ROUTING
// =============================================================================

mod free_text {
    use super::*;

    #[tokio::test]
    async fn test_crypto_question_searches_and_replies() {
        let h = harness(2, "DeFi это децентрализованные финансы.");

        let reply = h.relay.answer("Привет, что такое DeFi?").await.expect("reply");

        assert_eq!(h.search.queries(), vec!["Привет, что такое DeFi?"]);
        assert_eq!(reply.text, "DeFi это децентрализованные финансы.");
        assert_eq!(callback_data(&reply), vec!["back_to_main"]);
        assert_eq!(reply.keyboard.unwrap().inline_keyboard.len(), 1);

        let requests = h.completion.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[0].content,
            Prompts::builtin().system_for(ConversationDomain::Crypto)
        );
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content.matches("Source: ").count(), 2);
        assert!(messages[1].content.contains("- DeFi news 1\nSnippet 1\nSource: https://news.example/1"));
        assert!(messages[1].content.ends_with("User question: Привет, что такое DeFi?"));
    }

    #[tokio::test]
    async fn test_crypto_question_without_results_is_sent_raw() {
        let h = harness(0, "ok");

        h.relay.answer("btc to the moon?").await.unwrap();

        assert_eq!(h.search.queries(), vec!["btc to the moon?"]);
        let requests = h.completion.requests();
        assert_eq!(requests[0][1].content, "btc to the moon?");
    }

    #[tokio::test]
    async fn test_conference_question_skips_search() {
        let h = harness(3, "Начало в 10:00!");

        let reply = h.relay.answer("Когда начинается КОНФЕРЕНЦИЯ?").await.unwrap();

        assert!(h.search.queries().is_empty());
        assert_eq!(reply.text, "Начало в 10:00!");
        let requests = h.completion.requests();
        assert_eq!(
            requests[0][0].content,
            Prompts::builtin().system_for(ConversationDomain::Conference)
        );
        assert_eq!(requests[0][1].content, "Когда начинается КОНФЕРЕНЦИЯ?");
    }

    #[tokio::test]
    async fn test_empty_text_is_dropped() {
        let h = harness(3, "unused");

        assert!(h.relay.answer("").await.is_none());
        assert!(h.search.queries().is_empty());
        assert!(h.completion.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_is_delivered_like_any_reply() {
        let h = harness(1, FALLBACK_REPLY);

        let reply = h.relay.answer("что с эфиром?").await.unwrap();

        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(callback_data(&reply), vec!["back_to_main"]);
    }
}

// =============================================================================
// STATELESS ROUTING
// =============================================================================

mod stateless_routing {
    use super::*;

    #[tokio::test]
    async fn test_button_presses_do_not_change_routing() {
        let h = harness(1, "ok");

        // Pressing "conference info" only produces a canned acknowledgement.
        let ack = menu::callback_reply(MenuAction::ConferenceInfo);
        assert!(ack.keyboard.is_none());

        h.relay.answer("какой курс биткоина?").await.unwrap();
        assert_eq!(h.search.queries().len(), 1);

        // And "crypto chat" does not stop a conference question from routing there.
        let _ = menu::callback_reply(MenuAction::CryptoChat);
        h.relay.answer("расписание конференции").await.unwrap();
        assert_eq!(h.search.queries().len(), 1);

        let requests = h.completion.requests();
        let prompts = Prompts::builtin();
        assert_eq!(requests[0][0].content, prompts.system_for(ConversationDomain::Crypto));
        assert_eq!(requests[1][0].content, prompts.system_for(ConversationDomain::Conference));
    }

    #[test]
    fn test_contact_us_regardless_of_prior_state() {
        for before in [MenuAction::CryptoChat, MenuAction::BackToMain, MenuAction::ContactUs] {
            let _ = menu::callback_reply(before);
            let reply = menu::callback_reply(MenuAction::ContactUs);
            assert_eq!(callback_data(&reply), vec!["back_to_main"]);
            let has_link = reply
                .keyboard
                .unwrap()
                .inline_keyboard
                .iter()
                .flatten()
                .any(|b| matches!(b.kind, InlineKeyboardButtonKind::Url(_)));
            assert!(has_link);
        }
    }
}

// =============================================================================
// /START USER LOGGING
// =============================================================================

mod start_logging {
    use super::*;

    #[tokio::test]
    async fn test_start_records_user_with_sentinels() {
        let h = harness(1, "DeFi!");
        let user = telegram_user(serde_json::json!({
            "id": 424242,
            "is_bot": false,
            "first_name": ""
        }));

        h.relay.record_user(&user).await;

        let content = std::fs::read_to_string(&h.log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Date,User ID,Username,First Name,Last Name,Language Code,Is Bot,Timestamp"
        );
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[1], "424242");
        assert_eq!(&fields[2..6], ["Not provided"; 4]);
        assert_eq!(fields[6], "False");

        // The free-text half of the /start scenario still goes through search.
        let reply = h.relay.answer("Привет, что такое DeFi?").await.unwrap();
        assert_eq!(h.search.queries(), vec!["Привет, что такое DeFi?"]);
        assert_eq!(reply.text, "DeFi!");
    }

    #[tokio::test]
    async fn test_start_records_full_profile() {
        let h = harness(0, "ok");
        let user = telegram_user(serde_json::json!({
            "id": 7,
            "is_bot": true,
            "first_name": "Vitalik",
            "last_name": "B",
            "username": "vbuterin",
            "language_code": "ru"
        }));

        h.relay.record_user(&user).await;

        let content = std::fs::read_to_string(&h.log_path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.contains(",7,vbuterin,Vitalik,B,ru,True,"));
    }

    #[tokio::test]
    async fn test_log_failure_does_not_block_start() {
        let h = harness_logging_to(0, "ok", |dir| dir.join("missing").join("users_data.csv"));
        let user = telegram_user(serde_json::json!({
            "id": 1,
            "is_bot": false,
            "first_name": "Anon"
        }));

        // Returns normally; the welcome reply is sent regardless.
        h.relay.record_user(&user).await;

        assert!(!h.log_path.exists());
        assert!(!h.dir.path().join("missing").exists());
        assert!(menu::welcome().keyboard.is_some());
    }
}
