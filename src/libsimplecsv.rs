pub mod db;
pub mod error;
pub mod grade;
pub mod importer;
pub mod reader;
pub mod record;
pub mod sanitize;

pub use error::Result;
pub use importer::{ImportOptions, Importer};
pub use reader::CsvOptions;
pub use record::Record;
