// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use arrow::record_batch::RecordBatch;
use diagnostics::*;
use warehouse::{QueryResult, Statement, StatementKind, Warehouse};

/// Outcome of a data query. Failures are values here, not errors: the
/// statement and message are already logged.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Rows(RecordBatch),
    Failed { statement: String, message: String },
}

impl Fetched {
    pub fn rows(&self) -> Option<&RecordBatch> {
        match self {
            Self::Rows(batch) => Some(batch),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

fn failed(statement: &Statement, message: String) -> Fetched {
    log_error!("Query execution failed: {sql}: {error}", sql: statement.display.as_str(), error: message.as_str());
    Fetched::Failed {
        statement: statement.display.clone(),
        message,
    }
}

/// A data query that never ran because a schema lookup for `table` failed.
pub fn lookup_failed(table: &str, message: String) -> Fetched {
    log_error!("Schema lookup failed for {table}: {error}", table: table, error: message.as_str());
    Fetched::Failed {
        statement: format!("schema lookup for {table}"),
        message,
    }
}

/// Run a read statement, converting any failure into [`Fetched::Failed`].
pub fn fetch(warehouse: &dyn Warehouse, statement: &Statement) -> Fetched {
    match warehouse.execute(statement, StatementKind::Query) {
        Ok(QueryResult::Rows(batch)) => Fetched::Rows(batch),
        Ok(QueryResult::Ack { .. }) => failed(statement, "statement returned no rows".to_string()),
        Err(e) => failed(statement, e.to_string()),
    }
}
