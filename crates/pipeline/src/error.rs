// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Transform pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A raw source is absent. Fatal: nothing has been read yet.
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A required column is absent from a source or intermediate table
    #[error("Column '{column}' not found in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    #[error("Invalid null pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
