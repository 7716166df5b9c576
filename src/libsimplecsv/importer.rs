use crate::libsimplecsv::error::Result;
use crate::libsimplecsv::reader::{self, CsvOptions};
use crate::libsimplecsv::record::{Answer, Question, Record};
use crate::libsimplecsv::sanitize::{default_question_name, sanitize};
use log::{debug, info};
use std::collections::VecDeque;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// The first column of every row names the question's category.
    pub category_from_file: bool,
    pub csv: CsvOptions,
}

/// Remembers the last category seen during one import run.
#[derive(Debug, Default)]
struct CategoryTracker {
    last: Option<String>,
}

impl CategoryTracker {
    /// Consumes the leading cell and returns a marker when it starts a new category.
    fn check(&mut self, row: &mut VecDeque<String>) -> Option<Record> {
        let candidate = sanitize(&row.pop_front()?);
        if self.last.as_ref() == Some(&candidate) {
            return None;
        }
        self.last = Some(candidate.clone());
        Some(Record::Category { name: candidate })
    }
}

/// Splits the cells after the stem at the first empty one.
/// Returns the correct answers and the wrong answers, both in row order.
fn split_answers<I, S>(cells: I) -> (Vec<S>, Vec<S>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut correct = Vec::new();
    let mut wrong = Vec::new();
    let mut collecting_wrong = false;
    for cell in cells {
        if cell.as_ref().is_empty() {
            collecting_wrong = true;
            continue;
        }
        if collecting_wrong {
            wrong.push(cell);
        } else {
            correct.push(cell);
        }
    }
    (correct, wrong)
}

fn assemble_answers<S: AsRef<str>>(correct: &[S], wrong: &[S]) -> (bool, Vec<Answer>) {
    let single_answer = correct.len() == 1;
    let fraction = 1.0 / correct.len() as f64;

    let mut answers = Vec::with_capacity(correct.len() + wrong.len());
    answers.extend(correct.iter().map(|text| Answer {
        text: sanitize(text.as_ref()),
        weight: fraction,
    }));
    answers.extend(wrong.iter().map(|text| Answer {
        text: sanitize(text.as_ref()),
        weight: 0.0,
    }));
    (single_answer, answers)
}

/// Builds the question for what is left of a row once the category is gone.
fn build_question(mut row: VecDeque<String>) -> Option<Question> {
    let text = sanitize(&row.pop_front().unwrap_or_default());
    if text.is_empty() {
        debug!("[Import] Skipping row without question text");
        return None;
    }

    let (correct, wrong) = split_answers(row);
    if correct.is_empty() || wrong.is_empty() {
        debug!(
            "[Import] Skipping {:?}: {} correct and {} wrong answers",
            text,
            correct.len(),
            wrong.len()
        );
        return None;
    }

    let (single_answer, answers) = assemble_answers(&correct, &wrong);
    Some(Question {
        name: default_question_name(&text),
        text,
        single_answer,
        answers,
    })
}

pub struct Importer {
    options: ImportOptions,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Importer {
        Importer { options }
    }

    /// Reads `path` and turns its rows into records.
    pub fn import_file(&self, path: &Path) -> Result<Vec<Record>> {
        let rows = reader::read_rows(path, &self.options.csv)?;
        Ok(self.read_questions(rows))
    }

    /// Turns rows into category markers and questions, in row order.
    /// Rows that do not make a complete question produce nothing.
    pub fn read_questions<I>(&self, rows: I) -> Vec<Record>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut records = Vec::new();
        let mut tracker = CategoryTracker::default();
        let mut skipped = 0;

        for (idx, row) in rows.into_iter().enumerate() {
            let malformed = match row.first() {
                None => true,
                Some(cell) if self.options.category_from_file => sanitize(cell).is_empty(),
                Some(cell) => cell.is_empty(),
            };
            if malformed {
                debug!("[Import] Row {} is malformed, skipping", idx + 1);
                skipped += 1;
                continue;
            }
            let mut row = VecDeque::from(row);

            let checkpoint = records.len();
            if self.options.category_from_file {
                if let Some(marker) = tracker.check(&mut row) {
                    debug!("[Import] Row {} starts {:?}", idx + 1, marker);
                    records.push(marker);
                }
            }

            match build_question(row) {
                Some(question) => records.push(Record::Question(question)),
                None => {
                    // the marker only stands if its question does
                    records.truncate(checkpoint);
                    skipped += 1;
                }
            }
        }

        info!(
            "[Import] Built {} records, skipped {} rows",
            records.len(),
            skipped
        );
        records
    }
}
