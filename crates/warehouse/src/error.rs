// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Warehouse gateway error types
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("Credential variable {var} is not set")]
    MissingCredentials { var: &'static str },

    #[error("Credential file {} could not be read: {source}", path.display())]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {} is invalid: {source}", path.display())]
    InvalidCredentials {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to open warehouse at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    #[error("Statement failed: {sql}: {source}")]
    Statement {
        sql: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Warehouse connection lock poisoned")]
    LockPoisoned,

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for warehouse operations
pub type Result<T> = std::result::Result<T, WarehouseError>;
