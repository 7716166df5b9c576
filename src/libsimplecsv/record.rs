use crate::libsimplecsv::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    pub text: String,
    pub single_answer: bool,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn correct_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|answer| answer.weight > 0.0)
    }

    pub fn wrong_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|answer| answer.weight == 0.0)
    }
}

/// One entry of an import run, in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    /// Every question after this one belongs to `name`.
    Category { name: String },
    Question(Question),
}

impl Record {
    #[cfg(test)]
    pub fn as_question(&self) -> Option<&Question> {
        match self {
            Record::Question(question) => Some(question),
            Record::Category { .. } => None,
        }
    }
}

/// Pretty JSON of a whole import run.
pub fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_tagged_by_kind() {
        let category = Record::Category {
            name: "Math".to_string(),
        };
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["kind"], "category");
        assert_eq!(json["name"], "Math");

        let question = Record::Question(Question {
            name: "Q".to_string(),
            text: "Q".to_string(),
            single_answer: true,
            answers: vec![Answer {
                text: "A".to_string(),
                weight: 1.0,
            }],
        });
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["kind"], "question");
        assert_eq!(json["single_answer"], true);
        assert_eq!(json["answers"][0]["weight"], 1.0);
    }

    #[test]
    fn run_is_a_json_array() {
        let records = vec![
            Record::Category {
                name: "Cat".to_string(),
            },
            Record::Question(Question {
                name: "Q".to_string(),
                text: "Q".to_string(),
                single_answer: true,
                answers: vec![],
            }),
        ];
        let text = to_json(&records).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json[0]["kind"], "category");
        assert_eq!(json[1]["kind"], "question");
    }

    #[test]
    fn splits_answers_by_weight() {
        let question = Question {
            name: "Q".to_string(),
            text: "Q".to_string(),
            single_answer: false,
            answers: vec![
                Answer {
                    text: "a".to_string(),
                    weight: 0.5,
                },
                Answer {
                    text: "b".to_string(),
                    weight: 0.5,
                },
                Answer {
                    text: "c".to_string(),
                    weight: 0.0,
                },
            ],
        };
        assert_eq!(question.correct_answers().count(), 2);
        assert_eq!(question.wrong_answers().count(), 1);
    }
}
