//! Fixed UI: texts, callback identifiers and inline keyboards.

use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const SITE_URL: &str = "https://blockchainworld.by/";
pub const CONTACT_URL: &str = "https://t.me/dmitryutlik";

pub const WELCOME_TEXT: &str = "👋 Йоу! Я твой криптобот с характером!\n\
                                Выбирай, что тебя интересует, и погнали 🚀";
pub const CRYPTO_CHAT_TEXT: &str = "Режим криптоэксперта активирован! 🤖\n\
                                    Давай обсудим крипту, блокчейн или как очередной токен полетел на луну! 🚀";
pub const CONFERENCE_INFO_TEXT: &str = "О да, наша конференция! 📅\n\
                                        Спрашивай все, что хочешь знать о самом крутом крипто-событии!";
pub const CONTACT_TEXT: &str = "Выберите способ связи с нами:";
pub const BACK_TO_MAIN_TEXT: &str = "Вернулись в главное меню! Что тебя интересует?";

/// Callback buttons the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CryptoChat,
    ConferenceInfo,
    ContactUs,
    BackToMain,
}

impl MenuAction {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "crypto_chat" => Some(MenuAction::CryptoChat),
            "conference_info" => Some(MenuAction::ConferenceInfo),
            "contact_us" => Some(MenuAction::ContactUs),
            "back_to_main" => Some(MenuAction::BackToMain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuAction::CryptoChat => "crypto_chat",
            MenuAction::ConferenceInfo => "conference_info",
            MenuAction::ContactUs => "contact_us",
            MenuAction::BackToMain => "back_to_main",
        }
    }
}

/// A message to send: text plus optional inline keyboard.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn new(text: &str, keyboard: Option<InlineKeyboardMarkup>) -> Self {
        Self {
            text: text.to_string(),
            keyboard,
        }
    }
}

fn callback_button(text: &str, action: MenuAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.as_str())
}

fn url_button(text: &str, url: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::url(text, Url::parse(url).expect("menu URLs are valid"))
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button("💬 Общение с криптоботом", MenuAction::CryptoChat)],
        vec![callback_button("ℹ️ Информация про конференцию", MenuAction::ConferenceInfo)],
        vec![url_button("🌐 Перейти на сайт", SITE_URL)],
        vec![callback_button("📞 Связаться с нами", MenuAction::ContactUs)],
    ])
}

pub fn contact_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![url_button("📱 Telegram", CONTACT_URL)],
        vec![callback_button("↩️ Назад", MenuAction::BackToMain)],
    ])
}

/// Attached to every generated answer.
pub fn return_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![callback_button(
        "↩️ Вернуться в меню",
        MenuAction::BackToMain,
    )]])
}

pub fn welcome() -> Reply {
    Reply::new(WELCOME_TEXT, Some(main_menu()))
}

/// What to send for a button press. Mode buttons only acknowledge; nothing is remembered.
pub fn callback_reply(action: MenuAction) -> Reply {
    match action {
        MenuAction::CryptoChat => Reply::new(CRYPTO_CHAT_TEXT, None),
        MenuAction::ConferenceInfo => Reply::new(CONFERENCE_INFO_TEXT, None),
        MenuAction::ContactUs => Reply::new(CONTACT_TEXT, Some(contact_menu())),
        MenuAction::BackToMain => Reply::new(BACK_TO_MAIN_TEXT, Some(main_menu())),
    }
}
