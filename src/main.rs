use std::{cmp::max, env, path::PathBuf};

use anyhow::Context;
use teloxide_core::{
    RequestError,
    prelude::*,
    types::{Update, UpdateKind},
};

mod config;
mod handlers;
mod leaderboard;
mod questions;
mod round;
mod scoring;
mod state;
mod utils;

use crate::{state::SessionStore, utils::ResultExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().context("'.env' file with 'TELOXIDE_TOKEN' should be present")?;
    pretty_env_logger::init();
    let bot = Bot::from_env();

    let bank_path = PathBuf::from(
        env::var(config::QUESTIONS_ENV)
            .unwrap_or_else(|_| config::DEFAULT_QUESTIONS_FILE.to_owned()),
    );
    let bank = questions::load(&bank_path)?;
    let flagged = questions::audit(&bank);
    if flagged > 0 {
        log::warn!("{flagged} question(s) can never be answered correctly");
    }
    log::info!(
        "Loaded {} questions from '{}'",
        bank.len(),
        bank_path.display()
    );

    let store: &'static SessionStore = Box::leak(Box::new(SessionStore::new(bank)));

    log::info!("Bot started");

    let mut offset = 0;
    loop {
        let updates = bot
            .get_updates()
            .offset((offset + 1).try_into().unwrap())
            .timeout(30)
            .send()
            .await;
        let updates = match updates {
            Ok(updates) => updates,
            Err(err) => match err {
                RequestError::Network(error) if error.is_timeout() => {
                    log::trace!("Telegram connection timed out.");
                    continue;
                }
                other_error => {
                    log::error!(
                        "Error while connecting to telegram to receive updates: {other_error}."
                    );
                    continue;
                }
            },
        };
        for update in updates {
            offset = max(offset, update.id.0);

            let bot = bot.clone();
            tokio::spawn(update_handler(bot, update, store));
        }
    }
}

async fn update_handler(bot: Bot, update: Update, store: &'static SessionStore) {
    match update.kind {
        UpdateKind::Message(message) => {
            handlers::message_handler(bot, store, message).await.log_err();
        }
        UpdateKind::CallbackQuery(query) => {
            handlers::callback_handler(bot, store, query).await.log_err();
        }
        _ => {
            log::trace!("ignoring unsupported update {}", update.id.0);
        }
    }
}
