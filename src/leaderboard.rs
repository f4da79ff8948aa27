use teloxide_core::types::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub rank: usize,
    pub user: UserId,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Standings {
    /// Nobody scored a single point all session.
    NoCorrectAnswers,
    Ranked(Vec<Row>),
}

/// Ranks final scores in descending order. The sort is stable over the
/// insertion-ordered score entries, so ties go to whoever scored first.
pub fn build(scores: &[(UserId, u32)]) -> Standings {
    if scores.is_empty() {
        return Standings::NoCorrectAnswers;
    }
    let mut entries = scores.to_vec();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Standings::Ranked(
        entries
            .into_iter()
            .enumerate()
            .map(|(position, (user, score))| Row {
                rank: position + 1,
                user,
                score,
            })
            .collect(),
    )
}

/// Medals for the podium, a generic marker below it.
pub fn rank_marker(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🎯",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_break_on_first_to_score() {
        let scores = [
            (UserId(1), 3), // A
            (UserId(2), 5), // B
            (UserId(3), 5), // C
            (UserId(4), 0), // D
        ];
        let Standings::Ranked(rows) = build(&scores) else {
            panic!("expected ranked standings");
        };
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows,
            vec![
                Row { rank: 1, user: UserId(2), score: 5 },
                Row { rank: 2, user: UserId(3), score: 5 },
                Row { rank: 3, user: UserId(1), score: 3 },
                Row { rank: 4, user: UserId(4), score: 0 },
            ],
        );
    }

    #[test]
    fn empty_scores_are_not_an_empty_list() {
        assert_eq!(build(&[]), Standings::NoCorrectAnswers);
    }

    #[test]
    fn only_the_podium_gets_medals() {
        assert_eq!(rank_marker(1), "🥇");
        assert_eq!(rank_marker(2), "🥈");
        assert_eq!(rank_marker(3), "🥉");
        assert_eq!(rank_marker(4), "🎯");
        assert_eq!(rank_marker(17), "🎯");
    }
}
