use teloxide_core::{
    Bot,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, UserId},
};
use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::{
    config,
    leaderboard::{self, Standings},
    questions::QuestionRecord,
    scoring::{self, RoundSummary},
    state::{Advance, Epoch, RoundState, SessionStore},
    utils::ResultExt,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload has no question tag")]
    MissingTag,
    #[error("payload is not two ':'-separated integers")]
    Malformed,
}

// Wire format of every answer button: a 'Q' tag, the question index, a
// ':' and the option index. Buttons rendered long ago still come back in
// exactly this shape, so it must stay stable.
fn answer_payload(question: usize, option: usize) -> String {
    format!("Q{question}:{option}")
}

pub fn parse_answer_payload(data: &str) -> Result<(usize, usize), PayloadError> {
    let body = data.strip_prefix('Q').ok_or(PayloadError::MissingTag)?;
    let (question, option) = body.split_once(':').ok_or(PayloadError::Malformed)?;
    Ok((
        question.parse().map_err(|_| PayloadError::Malformed)?,
        option.parse().map_err(|_| PayloadError::Malformed)?,
    ))
}

fn answer_keyboard(index: usize, options: &[String]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(options.iter().enumerate().map(|(i, label)| {
        [InlineKeyboardButton::callback(
            label.clone(),
            answer_payload(index, i),
        )]
    }))
}

fn countdown_text(index: usize, total: usize, question: &str, remaining_secs: u64) -> String {
    format!(
        "❓ Question {}/{}\n\n{}\n\n⏳ {} seconds left.",
        index + 1,
        total,
        question,
        remaining_secs,
    )
}

fn results_text(round: &RoundState, question: &QuestionRecord, summary: &RoundSummary) -> String {
    let mut text = format!(
        "⏰ *Time's up!*\n\n✅ Correct answer: *{}*\n\n👥 Participants: {}\n\n📊 *Votes by option:*\n",
        question.correct, summary.total_answers,
    );
    for option in &round.options {
        let count = summary.vote_counts.get(option).copied().unwrap_or(0);
        let percent = scoring::percentage(count, summary.total_answers);
        text.push_str(&format!("{option} — {count} ({percent:.1}%)\n"));
    }
    text.push('\n');

    if !summary.correct.is_empty() {
        let names: Vec<&str> = summary
            .correct
            .iter()
            .map(|responder| responder.name.as_str())
            .collect();
        text.push_str("✅ Answered correctly:\n");
        text.push_str(&names.join(", "));
        text.push_str("\n\n");
    }
    if !summary.incorrect.is_empty() {
        text.push_str("❌ Wrong answers:\n");
        for (name, choice) in &summary.incorrect {
            text.push_str(&format!("{name} ({choice})\n"));
        }
    }
    text
}

/// Runs one session to completion, one round per question. Stops
/// silently as soon as the store reports the epoch superseded.
/// Transport failures are logged and never stop the loop.
pub async fn drive_session(bot: Bot, store: &'static SessionStore, chat: ChatId, epoch: Epoch) {
    while let Some(prompt) = store.begin_round(chat, epoch) {
        let message = bot
            .send_message(
                chat,
                countdown_text(
                    prompt.index,
                    prompt.total,
                    &prompt.question,
                    config::QUESTION_TIME_LIMIT.as_secs(),
                ),
            )
            .reply_markup(answer_keyboard(prompt.index, &prompt.options))
            .await
            .log_err();
        if let Some(message) = message {
            store.attach_round_message(chat, epoch, message.id);
        }

        run_countdown(&bot, store, chat, epoch).await;

        let Some((round, question)) = store.close_round(chat, epoch) else {
            return;
        };
        let summary = scoring::score_round(&round, &question);
        store.award_points(chat, epoch, &summary.correct_ids());

        if let Some(message) = round.message {
            bot.edit_message_text(chat, message, results_text(&round, &question, &summary))
                .parse_mode(ParseMode::Markdown)
                .await
                .log_err();
        }

        sleep(config::RESULT_PAUSE).await;

        match store.advance(chat, epoch) {
            Some(Advance::Next) => {}
            Some(Advance::Finished(scores)) => {
                announce_standings(&bot, chat, &scores).await;
                return;
            }
            None => return,
        }
    }

    // No round could open, which happens with an empty question bank.
    if let Some(scores) = store.finish(chat, epoch) {
        announce_standings(&bot, chat, &scores).await;
    }
}

/// Re-renders the countdown in place every tick until the deadline. Each
/// resumption re-validates the round against the store and goes quiet if
/// the round was superseded meanwhile.
async fn run_countdown(bot: &Bot, store: &'static SessionStore, chat: ChatId, epoch: Epoch) {
    let deadline = Instant::now() + config::QUESTION_TIME_LIMIT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        sleep(left.min(config::COUNTDOWN_TICK)).await;

        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        let Some(view) = store.round_view(chat, epoch) else {
            return;
        };
        if let Some(message) = view.message {
            bot.edit_message_text(
                chat,
                message,
                countdown_text(view.index, view.total, &view.question, left.as_secs()),
            )
            .reply_markup(answer_keyboard(view.index, &view.options))
            .await
            .log_err();
        }
    }
}

async fn announce_standings(bot: &Bot, chat: ChatId, scores: &[(UserId, u32)]) {
    match leaderboard::build(scores) {
        Standings::NoCorrectAnswers => {
            bot.send_message(chat, "Nobody answered correctly this time.")
                .await
                .log_err();
        }
        Standings::Ranked(rows) => {
            let mut text = String::from("🏁 *Quiz finished!*\n\n🏆 *Standings:*\n");
            for row in rows {
                let name = resolve_display_name(bot, chat, row.user).await;
                text.push_str(&format!(
                    "{} {}. {} — {} points\n",
                    leaderboard::rank_marker(row.rank),
                    row.rank,
                    name,
                    row.score,
                ));
            }
            bot.send_message(chat, text)
                .parse_mode(ParseMode::Markdown)
                .await
                .log_err();
        }
    }
}

// Falls back to the raw id so a departed member still shows up ranked.
async fn resolve_display_name(bot: &Bot, chat: ChatId, user: UserId) -> String {
    match bot.get_chat_member(chat, user).await {
        Ok(member) => member.user.first_name.clone(),
        Err(error) => {
            log::warn!("failed to resolve display name of {user}: {error}");
            user.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        assert_eq!(answer_payload(3, 1), "Q3:1");
        assert_eq!(parse_answer_payload("Q3:1"), Ok((3, 1)));
        assert_eq!(parse_answer_payload("Q12:0"), Ok((12, 0)));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert_eq!(parse_answer_payload("3:1"), Err(PayloadError::MissingTag));
        assert_eq!(parse_answer_payload("Q3"), Err(PayloadError::Malformed));
        assert_eq!(parse_answer_payload("Qx:1"), Err(PayloadError::Malformed));
        assert_eq!(parse_answer_payload("Q3:"), Err(PayloadError::Malformed));
        assert_eq!(parse_answer_payload("Q-1:2"), Err(PayloadError::Malformed));
    }

    #[test]
    fn results_render_zero_answer_rounds() {
        let round = RoundState {
            index: 0,
            options: vec!["Paris".into(), "London".into()],
            answers: Vec::new(),
            message: None,
        };
        let question = QuestionRecord {
            text: "Capital of France?".into(),
            options: vec!["Paris".into(), "London".into(), "".into(), "".into()],
            correct: "Paris".into(),
        };
        let summary = scoring::score_round(&round, &question);
        let text = results_text(&round, &question, &summary);
        assert!(text.contains("Paris — 0 (0.0%)"));
        assert!(text.contains("London — 0 (0.0%)"));
        assert!(!text.contains("Answered correctly"));
    }
}
