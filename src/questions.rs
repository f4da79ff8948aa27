use std::{io, path::Path};

use anyhow::Context;
use serde::Deserialize;

/// One entry of the question bank, immutable once loaded.
///
/// `correct` should match one of `options` verbatim. A mismatch is a
/// data-entry problem, not a fatal one: the question is still asked, it
/// just never produces correct responders. `audit` reports these at
/// startup.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
}

#[derive(Debug, Deserialize)]
struct BankRow {
    #[serde(rename = "Question", default)]
    question: String,
    #[serde(rename = "Option 1", default)]
    option_1: String,
    #[serde(rename = "Option 2", default)]
    option_2: String,
    #[serde(rename = "Option 3", default)]
    option_3: String,
    #[serde(rename = "Option 4", default)]
    option_4: String,
    #[serde(rename = "Correct Answer", default)]
    correct: String,
}

impl From<BankRow> for QuestionRecord {
    fn from(row: BankRow) -> Self {
        QuestionRecord {
            text: row.question,
            options: vec![row.option_1, row.option_2, row.option_3, row.option_4],
            correct: row.correct,
        }
    }
}

pub fn load(path: &Path) -> anyhow::Result<Vec<QuestionRecord>> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open question bank '{}'", path.display()))?;
    read_from(reader)
}

// Missing cells become empty strings rather than errors, so a sloppily
// exported sheet still loads.
fn read_from<R: io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<QuestionRecord>> {
    let mut questions = Vec::new();
    for row in reader.deserialize() {
        let row: BankRow = row.context("malformed question bank row")?;
        questions.push(row.into());
    }
    Ok(questions)
}

/// Reports questions whose correct answer matches none of their options.
/// Returns how many were flagged.
pub fn audit(questions: &[QuestionRecord]) -> usize {
    let mut flagged = 0;
    for question in questions {
        if !question.options.contains(&question.correct) {
            log::warn!(
                "correct answer {:?} matches no option of question {:?}; nobody can score on it",
                question.correct,
                question.text,
            );
            flagged += 1;
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv_text: &str) -> Vec<QuestionRecord> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        read_from(reader).unwrap()
    }

    #[test]
    fn loads_full_rows() {
        let questions = parse(
            "Question,Option 1,Option 2,Option 3,Option 4,Correct Answer\n\
             Capital of France?,Paris,London,Berlin,Rome,Paris\n",
        );
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Capital of France?");
        assert_eq!(questions[0].options, ["Paris", "London", "Berlin", "Rome"]);
        assert_eq!(questions[0].correct, "Paris");
    }

    #[test]
    fn missing_cells_become_empty_strings() {
        let questions = parse(
            "Question,Option 1,Option 2,Correct Answer\n\
             Two plus two?,4,5,4\n",
        );
        assert_eq!(questions[0].options, ["4", "5", "", ""]);

        let questions = parse(
            "Question,Option 1,Option 2,Option 3,Option 4,Correct Answer\n\
             Short row?,yes\n",
        );
        assert_eq!(questions[0].options, ["yes", "", "", ""]);
        assert_eq!(questions[0].correct, "");
    }

    #[test]
    fn audit_flags_unanswerable_questions() {
        let questions = parse(
            "Question,Option 1,Option 2,Option 3,Option 4,Correct Answer\n\
             Fine,a,b,c,d,a\n\
             Typo,a,b,c,d,A\n",
        );
        assert_eq!(audit(&questions), 1);
    }
}
