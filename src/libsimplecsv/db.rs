use crate::libsimplecsv::grade::{match_grade, MatchGrades};
use crate::libsimplecsv::record::{self, Record};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, DatabaseName, Result};
use std::path::Path;
use std::time::Instant;

/// Category questions are filed under until the file names one.
pub const DEFAULT_CATEGORY: &str = "Default";

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
}
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Option<i64>,
    pub name: String,
    pub text: String,
    pub single: bool,
    pub category_name: String,
}
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: Option<i64>,
    pub question_id: i64,
    pub position: i64,
    pub text: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: usize,
    pub questions: usize,
}

impl Category {
    /// Creates the category unless it exists. Returns whether it was created.
    pub fn ensure(connection: &Connection, src: &Category) -> Result<bool> {
        match connection.execute(
            "INSERT OR IGNORE INTO Category(name) VALUES (?1)",
            params![src.name],
        ) {
            Ok(0) => Ok(false),
            Ok(_) => {
                debug!("[DB] Created new Category '{}'", src.name);
                Ok(true)
            }
            Err(err) => {
                error!("[DB] Error while creating new Category: {:?}", err);
                Err(err)
            }
        }
    }
}

impl Question {
    /// Inserts the question and returns the id it was stored under.
    pub fn add(connection: &Connection, src: Question) -> Result<i64> {
        match connection.execute(
            "INSERT INTO Question(id, name, text, single, categoryName) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![src.id, src.name, src.text, src.single, src.category_name],
        ) {
            Ok(_) => {
                let id = connection.last_insert_rowid();
                debug!(
                    "[DB] Created new Question {} in Category {}",
                    id, src.category_name
                );
                Ok(id)
            }
            Err(err) => {
                error!(
                    "[DB] Error while creating Question {:?}: {:?}",
                    src.name, err
                );
                Err(err)
            }
        }
    }
}

impl Answer {
    pub fn add(connection: &Connection, src: Answer) -> Result<()> {
        match connection.execute(
            "INSERT INTO Answer(id, questionId, position, text, fraction) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![src.id, src.question_id, src.position, src.text, src.fraction],
        ) {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(
                    "[DB] Error while creating Answer for Question {}: {:?}",
                    src.question_id, err
                );
                Err(err)
            }
        }
    }
}

fn add_question(
    connection: &Connection,
    question: &record::Question,
    category_name: &str,
    match_grades: MatchGrades,
) -> crate::libsimplecsv::Result<()> {
    let question_id = Question::add(
        connection,
        Question {
            id: None,
            name: question.name.clone(),
            text: question.text.clone(),
            single: question.single_answer,
            category_name: category_name.to_string(),
        },
    )?;
    for (position, answer) in question.answers.iter().enumerate() {
        Answer::add(
            connection,
            Answer {
                id: None,
                question_id,
                position: position as i64,
                text: answer.text.clone(),
                fraction: match_grade(answer.weight, match_grades)?,
            },
        )?;
    }
    Ok(())
}

/// Files `records` into the bank in one transaction. Nothing is kept if any of them fails.
pub fn store(
    connection: &mut Connection,
    records: &[Record],
    match_grades: MatchGrades,
) -> crate::libsimplecsv::Result<ImportSummary> {
    let now = Instant::now();
    let transaction = connection.transaction()?;
    let mut summary = ImportSummary::default();
    let mut category = Category {
        name: DEFAULT_CATEGORY.to_string(),
    };
    let mut category_ready = false;

    for record in records {
        match record {
            Record::Category { name } => {
                category = Category { name: name.clone() };
                category_ready = false;
            }
            Record::Question(question) => {
                if !category_ready {
                    if Category::ensure(&transaction, &category)? {
                        summary.categories += 1;
                    }
                    category_ready = true;
                }
                add_question(&transaction, question, &category.name, match_grades)?;
                summary.questions += 1;
            }
        }
    }

    transaction.commit()?;
    debug!(
        "[DB] Storing {} questions took {} ms.",
        summary.questions,
        now.elapsed().as_millis()
    );
    Ok(summary)
}


pub fn create_or_open(src: &Path) -> Result<Connection> {
    if src.exists() {
        info!("[DB] Opening existing Database");
        open_db(src)
    } else {
        info!("[DB] Creating new Database");
        create_db(src)
    }
}

pub fn create_db(dest: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = init_db(Connection::open_in_memory()?)?;
    match db.backup(DatabaseName::Main, dest, None) {
        Ok(_) => {
            debug!(
                "[DB] Creating and Saving took {} ms.",
                now.elapsed().as_millis()
            );
            close_db(db)?;
            open_db(dest)
        }
        Err(err) => {
            warn!("Failed to create database file: {}", err);
            close_db(db)?;
            Err(err)
        }
    }
}

pub fn open_db(src: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = Connection::open(src)?;
    db.execute_batch("PRAGMA foreign_keys = ON")?;
    debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

pub fn close_db(connection: Connection) -> Result<()> {
    info!("[DB] Closing Database");
    let mut connection = connection;
    for attempt in 1..=2 {
        match connection.close() {
            Ok(_) => return Ok(()),
            Err((conn, _)) => {
                error!("[DB] Cannot close connection. Retrying {}/2...", attempt);
                connection = conn;
            }
        }
    }
    connection.close().map_err(|(_, err)| {
        error!("[DB] Cannot close connection! Giving up.");
        err
    })
}

pub(crate) fn init_db(conn: Connection) -> Result<Connection> {
    info!("[DB INIT] Creating tables");
    conn.execute(
        "CREATE TABLE Category (
              name TEXT NOT NULL,
              PRIMARY KEY (name)
            )",
        (),
    )?;
    info!("[DB INIT] Created table Category");
    conn.execute(
        "CREATE TABLE Question (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              text TEXT NOT NULL,
              single INTEGER NOT NULL,
              categoryName TEXT NOT NULL,
              FOREIGN KEY (categoryName) REFERENCES Category(name)
                ON DELETE CASCADE ON UPDATE CASCADE
            )",
        (),
    )?;
    info!("[DB INIT] Created table Question");
    conn.execute(
        "CREATE TABLE Answer (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              questionId INTEGER NOT NULL,
              position INTEGER NOT NULL,
              text TEXT NOT NULL,
              fraction REAL NOT NULL,
              FOREIGN KEY (questionId) REFERENCES Question(id) ON DELETE CASCADE
            )",
        (),
    )?;
    info!("[DB INIT] Created table Answer");
    conn.execute(
        "CREATE INDEX Question_categoryName_idx ON Question(categoryName)",
        (),
    )?;
    info!("[DB INIT] Created index Question_categoryName_idx");
    conn.execute("CREATE INDEX Answer_questionId_idx ON Answer(questionId)", ())?;
    info!("[DB INIT] Created index Answer_questionId_idx");
    info!("[DB INIT] Database Creation Successful!");

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libsimplecsv::error::Error;
    use rusqlite::{OptionalExtension, Row};

    impl Category {
        fn get_all(connection: &Connection) -> Result<Vec<Category>> {
            let mut statement = connection.prepare("SELECT name FROM Category ORDER BY name")?;
            let rows = statement.query_map([], |row| Ok(Category { name: row.get(0)? }))?;

            rows.collect()
        }

        fn get_one(connection: &Connection, name: &str) -> Result<Option<Category>> {
            let mut statement =
                connection.prepare("SELECT name FROM Category WHERE name = :name LIMIT 1")?;
            statement
                .query_row(&[(":name", name)], |row| Ok(Category { name: row.get(0)? }))
                .optional()
        }
    }

    impl Question {
        fn from_row(row: &Row) -> Result<Question> {
            Ok(Question {
                id: row.get(0)?,
                name: row.get(1)?,
                text: row.get(2)?,
                single: row.get(3)?,
                category_name: row.get(4)?,
            })
        }

        fn get_all(connection: &Connection) -> Result<Vec<Question>> {
            let mut statement = connection
                .prepare("SELECT id, name, text, single, categoryName FROM Question ORDER BY id")?;
            let rows = statement.query_map([], |row| Self::from_row(row))?;

            rows.collect()
        }

        fn get_in_category(connection: &Connection, category_name: &str) -> Result<Vec<Question>> {
            let mut statement = connection.prepare(
                "SELECT id, name, text, single, categoryName FROM Question \
                 WHERE categoryName = :categoryName ORDER BY id",
            )?;
            let rows = statement
                .query_map(&[(":categoryName", category_name)], |row| Self::from_row(row))?;

            rows.collect()
        }
    }

    impl Answer {
        fn get_for_question(connection: &Connection, question_id: i64) -> Result<Vec<Answer>> {
            let mut statement = connection.prepare(
                "SELECT id, questionId, position, text, fraction FROM Answer \
                 WHERE questionId = :questionId ORDER BY position",
            )?;
            let rows = statement.query_map(&[(":questionId", &question_id)], |row| {
                Ok(Answer {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    position: row.get(2)?,
                    text: row.get(3)?,
                    fraction: row.get(4)?,
                })
            })?;

            rows.collect()
        }
    }

    fn memory_db() -> Connection {
        let conn = init_db(Connection::open_in_memory().unwrap()).unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        conn
    }

    fn question(text: &str, correct: &[&str], wrong: &[&str]) -> Record {
        let fraction = 1.0 / correct.len() as f64;
        let answer = |text: &&str, weight: f64| record::Answer {
            text: text.to_string(),
            weight,
        };
        let answers = correct
            .iter()
            .map(|text| answer(text, fraction))
            .chain(wrong.iter().map(|text| answer(text, 0.0)))
            .collect();
        Record::Question(record::Question {
            name: text.to_string(),
            text: text.to_string(),
            single_answer: correct.len() == 1,
            answers,
        })
    }

    fn category(name: &str) -> Record {
        Record::Category {
            name: name.to_string(),
        }
    }

    #[test]
    fn questions_follow_their_category() {
        let mut conn = memory_db();
        let records = vec![
            question("Q0", &["A"], &["B"]),
            category("Cat1"),
            question("Q1", &["A"], &["B"]),
            question("Q2", &["A", "B"], &["C"]),
            category("Cat2"),
            question("Q3", &["A"], &["B"]),
        ];
        let summary = store(&mut conn, &records, MatchGrades::Nearest).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                categories: 3,
                questions: 4
            }
        );

        let names: Vec<String> = Category::get_all(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Cat1", "Cat2", DEFAULT_CATEGORY]);

        let cat1 = Question::get_in_category(&conn, "Cat1").unwrap();
        assert_eq!(cat1.len(), 2);
        assert_eq!(cat1[0].text, "Q1");
        assert!(cat1[0].single);
        assert!(!cat1[1].single);
        let default = Question::get_in_category(&conn, DEFAULT_CATEGORY).unwrap();
        assert_eq!(default[0].text, "Q0");
    }

    #[test]
    fn answers_keep_their_order_and_grades() {
        let mut conn = memory_db();
        let records = [question("Q", &["A", "B", "C"], &["D"])];
        store(&mut conn, &records, MatchGrades::Nearest).unwrap();

        let stored = &Question::get_all(&conn).unwrap()[0];
        let answers = Answer::get_for_question(&conn, stored.id.unwrap()).unwrap();
        let texts: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C", "D"]);
        assert_eq!(answers[0].fraction, 0.3333333);
        assert_eq!(answers[3].fraction, 0.0);
    }

    #[test]
    fn existing_categories_are_reused() {
        let mut conn = memory_db();
        let first = [category("Cat"), question("Q1", &["A"], &["B"])];
        let second = [category("Cat"), question("Q2", &["A"], &["B"])];
        store(&mut conn, &first, MatchGrades::Nearest).unwrap();
        let summary = store(&mut conn, &second, MatchGrades::Nearest).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                categories: 0,
                questions: 1
            }
        );
        assert_eq!(Question::get_in_category(&conn, "Cat").unwrap().len(), 2);
        assert!(Category::get_one(&conn, "Cat").unwrap().is_some());
        assert!(Category::get_one(&conn, "Other").unwrap().is_none());
    }

    #[test]
    fn empty_categories_are_not_created() {
        let mut conn = memory_db();
        let summary = store(&mut conn, &[category("Empty")], MatchGrades::Nearest).unwrap();
        assert_eq!(summary, ImportSummary::default());
        assert!(Category::get_all(&conn).unwrap().is_empty());
    }

    #[test]
    fn failed_store_keeps_nothing() {
        let mut conn = memory_db();
        let eleven = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"];
        let records = vec![
            question("Q1", &["A"], &["B"]),
            question("Q2", &eleven, &["L"]),
        ];
        match store(&mut conn, &records, MatchGrades::Error) {
            Err(Error::InvalidGrade(_)) => {}
            other => panic!("expected InvalidGrade, got {:?}", other),
        }
        assert!(Question::get_all(&conn).unwrap().is_empty());
    }

    #[test]
    fn creates_and_reopens_file() {
        let path = std::env::temp_dir().join(format!("simplecsv-db-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut conn = create_or_open(&path).unwrap();
        store(
            &mut conn,
            &[question("Q", &["A"], &["B"])],
            MatchGrades::Nearest,
        )
        .unwrap();
        close_db(conn).unwrap();

        let conn = create_or_open(&path).unwrap();
        assert_eq!(Question::get_all(&conn).unwrap().len(), 1);
        close_db(conn).unwrap();
        std::fs::remove_file(&path).unwrap();
    }
}
