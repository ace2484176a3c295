// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Warehouse gateway: datasets, table loads and parameterized statements.

pub mod credentials;
pub mod duck;
pub mod error;
pub mod statement;
pub mod upload;

pub use credentials::{CREDENTIALS_ENV, Credentials, DEFAULT_DATASET};
pub use duck::DuckDbWarehouse;
pub use error::{Result, WarehouseError};
pub use statement::{
    DatasetStatus, Param, QueryResult, Statement, StatementKind, quote_ident, quote_literal,
};
pub use upload::{UploadReport, upload_directory};

use arrow::record_batch::RecordBatch;

/// An SQL-executing store.
///
/// Every call is a blocking round trip. Statements are executed as given:
/// building them safely is the caller's job.
pub trait Warehouse {
    /// Create the dataset unless it exists. Losing a creation race counts as
    /// success.
    fn ensure_dataset(&self, name: &str) -> Result<DatasetStatus>;

    /// Replace `dataset.table` with `batch`, taking the schema from the
    /// batch. Returns the number of rows loaded.
    fn load_table(&self, dataset: &str, table: &str, batch: &RecordBatch) -> Result<usize>;

    fn execute(&self, statement: &Statement, kind: StatementKind) -> Result<QueryResult>;
}
