// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Schema introspection and its session cache
//!
//! Column lists and types come from `information_schema.columns`. Lookups are
//! cached per (table, column); switching tables drops everything cached, and a
//! lookup that fails leaves the cache untouched.

use crate::statement::{into_statement, table_ref};
use crate::{QueryError, Result};
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use diagnostics::*;
use sea_query::{Alias, Expr, Order, Query};
use std::collections::HashMap;
use std::fmt;
use warehouse::{StatementKind, Warehouse};

/// Declared type of a warehouse column, as far as literals care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Temporal,
    Other(String),
}

impl ColumnType {
    /// Classify a DuckDB `data_type` string.
    pub fn from_sql(data_type: &str) -> Self {
        let upper = data_type.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        match base {
            "TINYINT" | "SMALLINT" | "INTEGER" | "INT" | "BIGINT" | "HUGEINT" | "UTINYINT"
            | "USMALLINT" | "UINTEGER" | "UBIGINT" | "UHUGEINT" | "INT64" => Self::Integer,
            "FLOAT" | "REAL" | "DOUBLE" | "FLOAT64" => Self::Float,
            "DECIMAL" | "NUMERIC" => Self::Decimal,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" => Self::Text,
            _ if base.starts_with("DATE") || base.starts_with("TIME") => Self::Temporal,
            _ => Self::Other(upper),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Decimal => f.write_str("decimal"),
            Self::Boolean => f.write_str("boolean"),
            Self::Text => f.write_str("text"),
            Self::Temporal => f.write_str("temporal"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
}

/// Per-session introspection cache.
#[derive(Debug, Default)]
pub struct SchemaCache {
    table: Option<String>,
    types: HashMap<(String, String), ColumnType>,
    listings: HashMap<String, Vec<ColumnInfo>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `table` current. Anything cached for another table is dropped.
    pub fn switch_table(&mut self, table: &str) {
        if self.table.as_deref() != Some(table) {
            self.invalidate();
            self.table = Some(table.to_string());
        }
    }

    pub fn invalidate(&mut self) {
        if !self.types.is_empty() || !self.listings.is_empty() {
            log_debug!("Schema cache invalidated");
        }
        self.table = None;
        self.types.clear();
        self.listings.clear();
    }

    pub fn current_table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn cached_type(&self, table: &str, column: &str) -> Option<&ColumnType> {
        self.types.get(&(table.to_string(), column.to_string()))
    }

    fn remember_type(&mut self, table: &str, info: &ColumnInfo) {
        let _ = self.types.insert(
            (table.to_string(), info.name.clone()),
            info.column_type.clone(),
        );
    }

    fn remember_listing(&mut self, table: &str, columns: &[ColumnInfo]) {
        for info in columns {
            self.remember_type(table, info);
        }
        let _ = self.listings.insert(table.to_string(), columns.to_vec());
    }
}

/// Render every value of a column as text, skipping nulls.
pub(crate) fn column_strings(batch: &RecordBatch, index: usize) -> Result<Vec<String>> {
    if index >= batch.num_columns() {
        return Err(QueryError::Introspection(format!(
            "expected at least {} columns, got {}",
            index + 1,
            batch.num_columns()
        )));
    }
    let array = batch.column(index);
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    Ok((0..array.len())
        .filter(|i| array.is_valid(*i))
        .map(|i| formatter.value(i).to_string())
        .collect())
}

/// Introspection against one dataset of a warehouse.
pub struct Catalog<'a> {
    warehouse: &'a dyn Warehouse,
    dataset: &'a str,
}

impl<'a> Catalog<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, dataset: &'a str) -> Self {
        Self { warehouse, dataset }
    }

    pub fn dataset(&self) -> &str {
        self.dataset
    }

    fn rows(&self, query: &sea_query::SelectStatement) -> Result<RecordBatch> {
        let statement = into_statement(query)?;
        self.warehouse
            .execute(&statement, StatementKind::Query)?
            .into_rows()
            .ok_or_else(|| QueryError::Introspection("write acknowledgement for a query".into()))
    }

    fn column_rows(&self, table: &str, column: Option<&str>) -> Result<Vec<ColumnInfo>> {
        let mut query = Query::select();
        let _ = query
            .columns([Alias::new("column_name"), Alias::new("data_type")])
            .from((Alias::new("information_schema"), Alias::new("columns")))
            .and_where(Expr::col(Alias::new("table_schema")).eq(self.dataset))
            .and_where(Expr::col(Alias::new("table_name")).eq(table));
        if let Some(column) = column {
            let _ = query.and_where(Expr::col(Alias::new("column_name")).eq(column));
        }
        let _ = query.order_by(Alias::new("ordinal_position"), Order::Asc);

        let batch = self.rows(&query)?;
        let names = column_strings(&batch, 0)?;
        let types = column_strings(&batch, 1)?;
        if names.len() != types.len() {
            return Err(QueryError::Introspection(
                "null column name or type".to_string(),
            ));
        }
        Ok(names
            .into_iter()
            .zip(types)
            .map(|(name, data_type)| ColumnInfo {
                name,
                column_type: ColumnType::from_sql(&data_type),
            })
            .collect())
    }

    /// All columns of `table` in declaration order.
    pub fn columns(&self, cache: &mut SchemaCache, table: &str) -> Result<Vec<ColumnInfo>> {
        cache.switch_table(table);
        if let Some(listed) = cache.listings.get(table) {
            return Ok(listed.clone());
        }
        let columns = self.column_rows(table, None)?;
        cache.remember_listing(table, &columns);
        Ok(columns)
    }

    pub fn column_names(&self, cache: &mut SchemaCache, table: &str) -> Result<Vec<String>> {
        Ok(self
            .columns(cache, table)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Look up one column, consulting the cache first.
    fn lookup(&self, cache: &mut SchemaCache, table: &str, column: &str) -> Result<Option<ColumnType>> {
        cache.switch_table(table);
        if let Some(found) = cache.cached_type(table, column) {
            log_debug!("Schema cache hit for {table}.{column}", table: table, column: column);
            return Ok(Some(found.clone()));
        }
        match self.column_rows(table, Some(column))?.into_iter().next() {
            Some(info) => {
                cache.remember_type(table, &info);
                Ok(Some(info.column_type))
            }
            None => Ok(None),
        }
    }

    pub fn column_exists(&self, cache: &mut SchemaCache, table: &str, column: &str) -> Result<bool> {
        Ok(self.lookup(cache, table, column)?.is_some())
    }

    pub fn column_type(&self, cache: &mut SchemaCache, table: &str, column: &str) -> Result<ColumnType> {
        self.lookup(cache, table, column)?
            .ok_or_else(|| QueryError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Columns with a numeric declared type.
    pub fn numeric_columns(&self, cache: &mut SchemaCache, table: &str) -> Result<Vec<String>> {
        Ok(self
            .columns(cache, table)?
            .into_iter()
            .filter(|c| c.column_type.is_numeric())
            .map(|c| c.name)
            .collect())
    }

    /// Columns with a string declared type.
    pub fn string_columns(&self, cache: &mut SchemaCache, table: &str) -> Result<Vec<String>> {
        Ok(self
            .columns(cache, table)?
            .into_iter()
            .filter(|c| c.column_type.is_string())
            .map(|c| c.name)
            .collect())
    }

    /// Distinct non-null values of `column`, ordered, rendered as text.
    pub fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let query = Query::select()
            .distinct()
            .column(Alias::new(column))
            .from(table_ref(self.dataset, table))
            .order_by(Alias::new(column), Order::Asc)
            .to_owned();
        let batch = self.rows(&query)?;
        column_strings(&batch, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_classification() {
        assert_eq!(ColumnType::from_sql("BIGINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql("DOUBLE"), ColumnType::Float);
        assert_eq!(ColumnType::from_sql("DECIMAL(18,3)"), ColumnType::Decimal);
        assert_eq!(ColumnType::from_sql("varchar"), ColumnType::Text);
        assert_eq!(ColumnType::from_sql("TIMESTAMP WITH TIME ZONE"), ColumnType::Temporal);
        assert_eq!(ColumnType::from_sql("DATE"), ColumnType::Temporal);
        assert_eq!(ColumnType::from_sql("BLOB"), ColumnType::Other("BLOB".into()));
        assert!(ColumnType::Decimal.is_numeric());
        assert!(!ColumnType::Text.is_numeric());
        assert!(ColumnType::Text.is_string());
    }

    #[test]
    fn test_switch_table_drops_previous_entries() {
        let mut cache = SchemaCache::new();
        cache.switch_table("a");
        cache.remember_type(
            "a",
            &ColumnInfo {
                name: "x".into(),
                column_type: ColumnType::Integer,
            },
        );
        assert!(cache.cached_type("a", "x").is_some());

        cache.switch_table("a");
        assert!(cache.cached_type("a", "x").is_some());

        cache.switch_table("b");
        assert_eq!(cache.current_table(), Some("b"));
        assert!(cache.cached_type("a", "x").is_none());
    }
}
