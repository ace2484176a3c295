// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

/// Query builder error types
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Column '{column}' not found in {table}")]
    UnknownColumn { table: String, column: String },

    /// A value that cannot be written as a literal of the column's type
    #[error("Invalid value '{value}' for {column} ({column_type})")]
    InvalidLiteral {
        column: String,
        value: String,
        column_type: String,
    },

    #[error("Table {table} has no columns")]
    NoColumns { table: String },

    #[error("Nothing to write to {table}")]
    EmptyWrite { table: String },

    #[error("Unexpected introspection result: {0}")]
    Introspection(String),

    #[error("Unsupported bind value: {0}")]
    UnsupportedValue(String),

    #[error("Statement build error: {0}")]
    Build(#[from] sea_query::error::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] warehouse::WarehouseError),
}

/// Result type for query builder operations
pub type Result<T> = std::result::Result<T, QueryError>;
