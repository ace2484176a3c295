// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Statements sent to the warehouse and what comes back

use arrow::record_batch::RecordBatch;
use std::fmt;

/// A bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// SQL text with `?` placeholders, its parameters, and an inline rendering
/// for logs.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
    pub display: String,
}

impl Statement {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self {
            display: sql.clone(),
            sql,
            params: Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows
    Query,
    /// Returns an affected row count
    Write,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(RecordBatch),
    Ack { affected: usize },
}

impl QueryResult {
    pub fn into_rows(self) -> Option<RecordBatch> {
        match self {
            Self::Rows(batch) => Some(batch),
            Self::Ack { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetStatus {
    Existed,
    Created,
}

/// Quote an identifier for the warehouse, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("Facility ID"), "\"Facility ID\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_raw_statement_displays_sql() {
        let stmt = Statement::raw("SELECT 1");
        assert_eq!(stmt.to_string(), "SELECT 1");
        assert!(stmt.params.is_empty());
    }
}
