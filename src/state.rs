use dashmap::DashMap;
use rand::seq::SliceRandom;
use teloxide_core::types::{ChatId, MessageId, UserId};

use crate::{config, questions::QuestionRecord};

/// Identity of one session start. Timer tasks carry it and every store
/// call re-validates it, so callbacks of a superseded session degrade to
/// no-ops instead of racing the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

/// One recorded answer. The round keeps them in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub user: UserId,
    pub name: String,
    pub choice: String,
}

/// State of the question currently open for answers.
#[derive(Debug, Clone)]
pub struct RoundState {
    pub index: usize,
    /// Options as displayed, shuffled per round, empty cells dropped.
    pub options: Vec<String>,
    pub answers: Vec<Answer>,
    pub message: Option<MessageId>,
}

struct Session {
    epoch: Epoch,
    order: Vec<QuestionRecord>,
    limit: usize,
    current_index: usize,
    /// Insertion-ordered: whoever scores first stays first. Leaderboard
    /// ties break on this order.
    scores: Vec<(UserId, u32)>,
    round: Option<RoundState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Accepted,
    DuplicateAnswer,
    StaleRound,
    /// Option index out of bounds, e.g. a button from a stale render.
    /// Dropped without an acknowledgment text.
    Ignored,
}

/// Everything needed to display a freshly opened round.
#[derive(Debug, Clone)]
pub struct RoundPrompt {
    pub index: usize,
    pub total: usize,
    pub question: String,
    pub options: Vec<String>,
}

/// Snapshot of the open round, taken by countdown ticks.
#[derive(Debug, Clone)]
pub struct RoundView {
    pub index: usize,
    pub total: usize,
    pub question: String,
    pub options: Vec<String>,
    pub message: Option<MessageId>,
}

pub enum Advance {
    Next,
    Finished(Vec<(UserId, u32)>),
}

/// Owns every chat's session. All methods are synchronous and lock at
/// most one map entry, never across a suspension point.
pub struct SessionStore {
    bank: Vec<QuestionRecord>,
    sessions: DashMap<ChatId, Session>,
}

impl SessionStore {
    pub fn new(bank: Vec<QuestionRecord>) -> Self {
        Self {
            bank,
            sessions: DashMap::new(),
        }
    }

    /// Creates the chat's session, replacing any running one. The old
    /// session's driver and timer notice the epoch change on their next
    /// store call and stop.
    pub fn start(&self, chat: ChatId) -> Epoch {
        let mut order = self.bank.clone();
        order.shuffle(&mut rand::rng());
        let limit = order.len().min(config::MAX_QUESTIONS);
        let epoch = Epoch(rand::random());
        self.sessions.insert(
            chat,
            Session {
                epoch,
                order,
                limit,
                current_index: 0,
                scores: Vec::new(),
                round: None,
            },
        );
        epoch
    }

    /// Opens a round for the current question and returns what to
    /// display, or `None` when superseded or out of questions.
    pub fn begin_round(&self, chat: ChatId, epoch: Epoch) -> Option<RoundPrompt> {
        let mut session = self.sessions.get_mut(&chat)?;
        if session.epoch != epoch || session.current_index >= session.limit {
            return None;
        }
        let question = &session.order[session.current_index];
        let mut options: Vec<String> = question
            .options
            .iter()
            .filter(|option| !option.is_empty())
            .cloned()
            .collect();
        options.shuffle(&mut rand::rng());
        let prompt = RoundPrompt {
            index: session.current_index,
            total: session.limit,
            question: question.text.clone(),
            options: options.clone(),
        };
        session.round = Some(RoundState {
            index: session.current_index,
            options,
            answers: Vec::new(),
            message: None,
        });
        Some(prompt)
    }

    /// Records which message renders the open round, for in-place edits.
    pub fn attach_round_message(&self, chat: ChatId, epoch: Epoch, message: MessageId) {
        let Some(mut session) = self.sessions.get_mut(&chat) else {
            return;
        };
        if session.epoch != epoch {
            return;
        }
        if let Some(round) = session.round.as_mut() {
            round.message = Some(message);
        }
    }

    pub fn round_view(&self, chat: ChatId, epoch: Epoch) -> Option<RoundView> {
        let session = self.sessions.get(&chat)?;
        if session.epoch != epoch {
            return None;
        }
        let round = session.round.as_ref()?;
        Some(RoundView {
            index: round.index,
            total: session.limit,
            question: session.order[round.index].text.clone(),
            options: round.options.clone(),
            message: round.message,
        })
    }

    /// Index of the question currently open for answers, if any.
    pub fn active_round(&self, chat: ChatId) -> Option<usize> {
        let session = self.sessions.get(&chat)?;
        session.round.as_ref().map(|round| round.index)
    }

    /// Admits an answer to the chat's open round. First answer per user
    /// wins; later attempts do not overwrite it.
    pub fn submit_answer(
        &self,
        chat: ChatId,
        user: UserId,
        name: &str,
        index: usize,
        option: usize,
    ) -> AnswerOutcome {
        let Some(mut session) = self.sessions.get_mut(&chat) else {
            return AnswerOutcome::StaleRound;
        };
        let Some(round) = session.round.as_mut() else {
            return AnswerOutcome::StaleRound;
        };
        if round.index != index {
            return AnswerOutcome::StaleRound;
        }
        if round.answers.iter().any(|answer| answer.user == user) {
            return AnswerOutcome::DuplicateAnswer;
        }
        let Some(choice) = round.options.get(option) else {
            return AnswerOutcome::Ignored;
        };
        let choice = choice.clone();
        round.answers.push(Answer {
            user,
            name: name.to_owned(),
            choice,
        });
        AnswerOutcome::Accepted
    }

    /// Freezes the open round and hands it over for scoring, together
    /// with the question it was asked for.
    pub fn close_round(&self, chat: ChatId, epoch: Epoch) -> Option<(RoundState, QuestionRecord)> {
        let mut session = self.sessions.get_mut(&chat)?;
        if session.epoch != epoch {
            return None;
        }
        let round = session.round.take()?;
        let question = session.order[round.index].clone();
        Some((round, question))
    }

    /// One point per correct responder. Entries appear on first score.
    pub fn award_points(&self, chat: ChatId, epoch: Epoch, users: &[UserId]) {
        let Some(mut session) = self.sessions.get_mut(&chat) else {
            return;
        };
        if session.epoch != epoch {
            return;
        }
        for user in users {
            match session.scores.iter_mut().find(|(scored, _)| scored == user) {
                Some((_, score)) => *score += 1,
                None => session.scores.push((*user, 1)),
            }
        }
    }

    /// Moves to the next question, or ends the session and yields the
    /// final scores. `None` means the session was superseded.
    pub fn advance(&self, chat: ChatId, epoch: Epoch) -> Option<Advance> {
        {
            let mut session = self.sessions.get_mut(&chat)?;
            if session.epoch != epoch {
                return None;
            }
            session.current_index += 1;
            if session.current_index < session.limit {
                return Some(Advance::Next);
            }
        }
        self.finish(chat, epoch).map(Advance::Finished)
    }

    /// Removes an exhausted session and returns its scores. Covers the
    /// empty-bank case where no round ever opens.
    pub fn finish(&self, chat: ChatId, epoch: Epoch) -> Option<Vec<(UserId, u32)>> {
        let (_, session) = self.sessions.remove_if(&chat, |_, session| {
            session.epoch == epoch && session.current_index >= session.limit
        })?;
        Some(session.scores)
    }
}
