mod config;
mod relay;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;

use config::Config;
use relay::{OpenAiClient, PromptRouter, Prompts, Relay, SerperClient, UserLogger};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("cryptobot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting cryptobot...");

    let prompts = match Prompts::load(config.prompts_dir.as_deref()) {
        Ok(prompts) => prompts,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let users = UserLogger::new(config.users_log_path());
    info!("Recording users to {}", users.path().display());

    let search = Arc::new(SerperClient::new(config.serper_api_key.clone()));
    let completion = Arc::new(OpenAiClient::new(config.openai_api_key.clone()));
    let router = PromptRouter::new(search, prompts);
    let state = Arc::new(Relay::new(router, completion, users));

    let bot = Bot::new(&config.telegram_token);

    Dispatcher::builder(bot, relay::schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
