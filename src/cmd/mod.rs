pub mod report;
pub mod summary;

use crate::transaction::{self, Transaction};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read transactions from a CSV or JSON file (or stdin with "-").
/// JSON is detected by file extension, or a leading '{' on stdin.
pub fn read_transactions(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "json") {
        transaction::read_json(reader)
    } else {
        transaction::read_csv(reader)
    }
}

fn read_from_stdin() -> anyhow::Result<Vec<Transaction>> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    let cursor = io::Cursor::new(&buffer);
    if buffer.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
        transaction::read_json(cursor)
    } else {
        transaction::read_csv(cursor)
    }
}
