use crate::domain::transaction::Transaction;
use crate::error::{CostError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Ledger CSV reader. Headers are matched by name, so column order is free;
/// cells are trimmed and short rows surface as per-row errors.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl TransactionReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> TransactionReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .flexible(true)
                .from_reader(source),
        }
    }

    /// Rows are decoded on demand. A bad or out-of-range row yields its own
    /// `Err` and does not stop the ones after it.
    pub fn transactions(self) -> impl Iterator<Item = Result<Transaction>> {
        self.reader.into_deserialize().map(|row| {
            let tx: Transaction = row.map_err(CostError::Csv)?;
            tx.validate()?;
            Ok(tx)
        })
    }
}
