use crate::libsimplecsv::error::{Error, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
        }
    }
}

pub fn read_rows(path: &Path, options: &CsvOptions) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("[CSV] Opened {:?}", path);
    read_rows_from(file, options)
}

/// Reads every row of `source`. Rows the tokenizer cannot decode are skipped.
pub fn read_rows_from<R: Read>(source: R, options: &CsvOptions) -> Result<Vec<Vec<String>>> {
    let now = Instant::now();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .from_reader(source);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(record.iter().map(String::from).collect()),
            Err(err) => match err.kind() {
                csv::ErrorKind::Io(_) => return Err(Error::Csv(err)),
                _ => warn!("[CSV] Skipping malformed row {}: {}", line + 1, err),
            },
        }
    }

    debug!(
        "[CSV] Read {} rows in {} ms.",
        rows.len(),
        now.elapsed().as_millis()
    );
    Ok(rows)
}
