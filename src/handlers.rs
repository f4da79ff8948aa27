use anyhow::Context;
use teloxide_core::{
    Bot,
    payloads::AnswerCallbackQuerySetters,
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::{
    round,
    state::{AnswerOutcome, SessionStore},
    utils::ResultExt,
};

const HELP_MESSAGE: &str = "
/start - Start a quiz in this chat (replaces a running one)
/help - Display all commands
";

pub async fn message_handler(
    bot: Bot,
    store: &'static SessionStore,
    message: Message,
) -> anyhow::Result<()> {
    let Some(text) = message.text() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let first_word = text.trim().split_whitespace().next().unwrap_or("");
    // Group chats address commands as /start@BotName.
    let command = first_word.split('@').next().unwrap_or(first_word);
    match command {
        "/start" => {
            log::info!("starting a quiz session in chat {chat_id}");
            let epoch = store.start(chat_id);
            bot.send_message(chat_id, "🎯 The quiz has started! Press a button to answer!")
                .await
                .context("failed to announce quiz start")
                .log_err();
            tokio::spawn(round::drive_session(bot, store, chat_id, epoch));
        }
        "/help" => {
            bot.send_message(chat_id, HELP_MESSAGE)
                .await
                .context("failed to send help message")?;
        }
        _ => {}
    }
    Ok(())
}

pub async fn callback_handler(
    bot: Bot,
    store: &'static SessionStore,
    query: CallbackQuery,
) -> anyhow::Result<()> {
    let Some(chat_id) = query.regular_message().map(|message| message.chat.id) else {
        log::debug!("callback query without an accessible message");
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };
    let Some(data) = query.data.as_deref() else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    let (question_index, option_index) = match round::parse_answer_payload(data) {
        Ok(indices) => indices,
        Err(error) => {
            // A payload we never produced. Drop it without bothering the
            // user, but dismiss the button spinner.
            log::debug!("dropping callback payload {data:?}: {error}");
            bot.answer_callback_query(query.id.clone()).await?;
            return Ok(());
        }
    };

    let outcome = store.submit_answer(
        chat_id,
        query.from.id,
        &query.from.first_name,
        question_index,
        option_index,
    );
    let ack = bot.answer_callback_query(query.id.clone());
    match outcome {
        AnswerOutcome::Accepted => ack.text("✅ Answer accepted!").await,
        AnswerOutcome::DuplicateAnswer => {
            ack.text("You already answered this question!")
                .show_alert(true)
                .await
        }
        AnswerOutcome::StaleRound => {
            log::debug!(
                "stale answer for question {question_index} in chat {chat_id}, open round: {:?}",
                store.active_round(chat_id),
            );
            ack.text("⏰ This question is already closed!")
                .show_alert(true)
                .await
        }
        AnswerOutcome::Ignored => ack.await,
    }
    .context("failed to acknowledge answer")?;
    Ok(())
}
