use colored::Colorize;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
mod libsimplecsv;
use crate::libsimplecsv::db;
use crate::libsimplecsv::grade::MatchGrades;
use crate::libsimplecsv::record;
use crate::libsimplecsv::{CsvOptions, ImportOptions, Importer, Record};

#[derive(Parser, Debug)]
#[command(name = "Simple CSV")]
#[command(
    version,
    about = "Imports multiple choice questions with an optional category from CSV files.",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "info")]
    log_level: String,
    /// Read the question category from the first column
    #[arg(short, long, default_value = "false")]
    category_from_file: bool,
    #[arg(long, default_value = ",", value_parser = ascii_char)]
    delimiter: u8,
    #[arg(long, default_value = "\"", value_parser = ascii_char)]
    quote: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store the questions in a question bank
    Import {
        csv: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "questions.db")]
        db: PathBuf,
        #[arg(short, long, value_enum, default_value_t = MatchGrades::Nearest)]
        match_grades: MatchGrades,
    },
    /// Print the questions as JSON
    Dump { csv: PathBuf },
}

fn ascii_char(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [c] if c.is_ascii() => Ok(*c),
        _ => Err(format!("expected a single ASCII character, got {:?}", value)),
    }
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    let csv = match &args.command {
        Commands::Import { csv, .. } | Commands::Dump { csv } => csv.clone(),
    };
    let importer = Importer::new(ImportOptions {
        category_from_file: args.category_from_file,
        csv: CsvOptions {
            delimiter: args.delimiter,
            quote: args.quote,
        },
    });
    info!("{}", format!("Reading questions from {:?}", csv).cyan());
    let records = match importer.import_file(&csv) {
        Ok(records) => records,
        Err(e) => {
            error!("{}{}", "Unable to read questions: ".red(), e);
            std::process::exit(1);
        }
    };

    match args.command {
        Commands::Import { db, match_grades, .. } => import(&records, db, match_grades),
        Commands::Dump { .. } => match record::to_json(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("{}{}", "Unable to write JSON: ".red(), e);
                std::process::exit(1);
            }
        },
    }
}

fn import(records: &[Record], db_path: PathBuf, match_grades: MatchGrades) {
    info!(
        "{}",
        format!("Importing {} records into {:?}", records.len(), db_path).blue()
    );
    let mut db = match db::create_or_open(&db_path) {
        Ok(d) => d,
        Err(e) => {
            error!("{}{}", "Unable to open Database: ".red(), e);
            std::process::exit(1);
        }
    };

    for record in records {
        match record {
            Record::Category { name } => info!("{}", format!("├ Category: {}", name).blue()),
            Record::Question(question) => info!(
                "{} {}",
                "│".blue(),
                format!(
                    "├ Question: {} ({} correct, {} wrong)",
                    question.name,
                    question.correct_answers().count(),
                    question.wrong_answers().count()
                )
                .green()
            ),
        }
    }

    let result = db::store(&mut db, records, match_grades);
    if let Err(e) = db::close_db(db) {
        error!("{}{}", "Unable to close Database: ".red(), e);
    }
    match result {
        Ok(summary) => println!(
            "{}",
            format!(
                "Imported {} questions ({} new categories).",
                summary.questions, summary.categories
            )
            .green()
        ),
        Err(e) => {
            error!("{}{}", "Import failed, nothing was stored: ".red(), e);
            std::process::exit(1);
        }
    }
}
