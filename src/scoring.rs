use std::collections::HashMap;

use teloxide_core::types::UserId;

use crate::{questions::QuestionRecord, state::RoundState};

#[derive(Debug, Clone, PartialEq)]
pub struct Responder {
    pub user: UserId,
    pub name: String,
}

/// Outcome of one closed round. Responder lists keep answer arrival
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub total_answers: usize,
    /// Votes per chosen option text. Options sharing the same text share
    /// one bucket.
    pub vote_counts: HashMap<String, usize>,
    pub correct: Vec<Responder>,
    /// Name and choice of everyone who picked a wrong option.
    pub incorrect: Vec<(String, String)>,
}

impl RoundSummary {
    pub fn correct_ids(&self) -> Vec<UserId> {
        self.correct.iter().map(|responder| responder.user).collect()
    }
}

/// Tallies a closed round. Pure: scores are applied by the store, so
/// calling this twice on the same round yields the same summary.
pub fn score_round(round: &RoundState, question: &QuestionRecord) -> RoundSummary {
    let mut vote_counts = HashMap::new();
    let mut correct = Vec::new();
    let mut incorrect = Vec::new();
    for answer in &round.answers {
        *vote_counts.entry(answer.choice.clone()).or_insert(0) += 1;
        // Exact match, case and whitespace included.
        if answer.choice == question.correct {
            correct.push(Responder {
                user: answer.user,
                name: answer.name.clone(),
            });
        } else {
            incorrect.push((answer.name.clone(), answer.choice.clone()));
        }
    }
    RoundSummary {
        total_answers: round.answers.len(),
        vote_counts,
        correct,
        incorrect,
    }
}

/// Share of `total` as a percentage with one decimal, `0` for an empty
/// round.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Answer;

    fn round_with(answers: Vec<Answer>) -> RoundState {
        RoundState {
            index: 0,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answers,
            message: None,
        }
    }

    fn answer(user: u64, name: &str, choice: &str) -> Answer {
        Answer {
            user: UserId(user),
            name: name.to_owned(),
            choice: choice.to_owned(),
        }
    }

    fn question(correct: &str) -> QuestionRecord {
        QuestionRecord {
            text: "q".to_owned(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: correct.to_owned(),
        }
    }

    #[test]
    fn tallies_in_arrival_order() {
        let round = round_with(vec![
            answer(1, "Alice", "a"),
            answer(2, "Bob", "b"),
            answer(3, "Carol", "a"),
            answer(4, "Dan", "c"),
        ]);
        let summary = score_round(&round, &question("a"));

        assert_eq!(summary.total_answers, 4);
        assert_eq!(summary.vote_counts.values().sum::<usize>(), 4);
        assert_eq!(summary.vote_counts["a"], 2);
        assert_eq!(
            summary.correct_ids(),
            vec![UserId(1), UserId(3)],
            "correct responders follow arrival order",
        );
        assert_eq!(
            summary.incorrect,
            vec![
                ("Bob".to_owned(), "b".to_owned()),
                ("Dan".to_owned(), "c".to_owned()),
            ],
        );
    }

    #[test]
    fn scoring_is_idempotent() {
        let round = round_with(vec![answer(1, "Alice", "a"), answer(2, "Bob", "b")]);
        let q = question("a");
        assert_eq!(score_round(&round, &q), score_round(&round, &q));
    }

    #[test]
    fn matching_is_exact() {
        let round = round_with(vec![answer(1, "Alice", "paris"), answer(2, "Bob", "Paris ")]);
        let summary = score_round(&round, &question("Paris"));
        assert!(summary.correct.is_empty());
        assert_eq!(summary.incorrect.len(), 2);
    }

    #[test]
    fn duplicate_option_texts_share_a_bucket() {
        let mut round = round_with(vec![answer(1, "Alice", "a"), answer(2, "Bob", "a")]);
        round.options = vec!["a".into(), "a".into(), "b".into(), "c".into()];
        let summary = score_round(&round, &question("b"));
        assert_eq!(summary.vote_counts["a"], 2);
        assert_eq!(summary.vote_counts.len(), 1);
    }

    #[test]
    fn percentages_survive_an_empty_round() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
    }
}
