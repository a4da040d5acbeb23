//! Output sinks for the user and product tables.

use std::path::{Path, PathBuf};

use shop_ledger_core::{Cell, Table};
use thiserror::Error;
use tracing::info;

/// File name of the reconciled user table.
pub const USERS_FILE: &str = "combined_user_data.csv";
/// File name of the product sales table.
pub const PRODUCTS_FILE: &str = "product_data.csv";

/// Errors raised while persisting or reloading tables.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error on {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// Destination for the two output tables.
pub trait Sink {
    /// Persist the reconciled user table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn write_users(&mut self, table: &Table) -> Result<(), SinkError>;

    /// Persist the product sales table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn write_products(&mut self, table: &Table) -> Result<(), SinkError>;
}

/// Writes each table to its own CSV file in one directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    #[must_use]
    pub fn products_path(&self) -> PathBuf {
        self.dir.join(PRODUCTS_FILE)
    }

    fn write(&self, path: &Path, table: &Table) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        write_table(path, table)?;
        info!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers().len(),
            "Wrote table"
        );
        Ok(())
    }
}

impl Sink for CsvSink {
    fn write_users(&mut self, table: &Table) -> Result<(), SinkError> {
        self.write(&self.users_path(), table)
    }

    fn write_products(&mut self, table: &Table) -> Result<(), SinkError> {
        self.write(&self.products_path(), table)
    }
}

/// Write a header row followed by one record per table row.
///
/// Empty cells become empty fields, strings are written verbatim and any
/// other value as compact JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_table(path: &Path, table: &Table) -> Result<(), SinkError> {
    let csv_err = |source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.headers()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(Cell::to_field))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a table previously written by [`write_table`].
///
/// Every non-empty field comes back as a string cell; empty fields as
/// [`Cell::Empty`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid CSV.
pub fn read_table(path: &Path) -> Result<Table, SinkError> {
    let csv_err = |source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.push_row(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::from(field)
                    }
                })
                .collect(),
        );
    }
    Ok(table)
}
