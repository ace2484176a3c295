// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::auth::Role;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid username or password")]
    InvalidLogin,

    #[error("{action} requires the admin role, session has {role}")]
    NotAuthorized { action: &'static str, role: Role },

    #[error("Record writes are disabled for table {table}")]
    WritesDisabled { table: String },

    #[error("Table {table} has no numeric columns to chart")]
    NoNumericColumns { table: String },

    #[error("Table {table} has no categorical columns to chart")]
    NoCategoricalColumns { table: String },

    #[error("Column {column} is not a {expected} column")]
    ChartColumn {
        column: String,
        expected: &'static str,
    },

    #[error("No data for the current selection: {message}")]
    NoRows { message: String },

    #[error("Unknown dataset {0}")]
    UnknownDataset(String),

    #[error("Query error: {0}")]
    Query(#[from] query::QueryError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] warehouse::WarehouseError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
