// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Statement construction from table selections and admin forms
//!
//! Every user-supplied value goes through [`literal`] and is bound as a
//! parameter. Column types are resolved through the [`Catalog`] before a
//! value is converted.

use crate::literal::literal;
use crate::schema::{Catalog, SchemaCache};
use crate::statement::{into_statement, table_ref};
use crate::{QueryError, Result};
use diagnostics::*;
use sea_query::{Alias, Asterisk, Cond, Expr, Order, Query, SelectStatement, SimpleExpr};
use warehouse::Statement;

/// Rows kept by the top-N chart query.
pub const CHART_LIMIT: u64 = 10;

/// Identifier columns tried in order when a table needs a row key.
pub const KEY_CANDIDATES: &[&str] = &[
    "PATIENT_ID",
    "PatientID",
    "patient_id",
    "PATIENTID",
    "Patient ID",
    "id",
    "ID",
    "Id",
    "PROVIDER",
    "Facility ID",
];

/// Keep rows whose `column` is one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(column: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            column: column.into(),
            values,
        }
    }
}

/// A table plus the predicates narrowing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub table: String,
    pub filters: Vec<Filter>,
    pub search: Option<String>,
}

impl Selection {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }
}

/// Row key of a table: the first candidate present, else the first column.
pub fn resolve_primary_key(columns: &[String]) -> Option<String> {
    KEY_CANDIDATES
        .iter()
        .find(|candidate| columns.iter().any(|c| c == *candidate))
        .map(|c| c.to_string())
        .or_else(|| columns.first().cloned())
}

/// Builds statements against one dataset.
pub struct QueryBuilder<'a> {
    catalog: Catalog<'a>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(catalog: Catalog<'a>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// The WHERE condition for `selection`, or `None` when nothing narrows it.
    fn condition(&self, cache: &mut SchemaCache, selection: &Selection) -> Result<Option<Cond>> {
        let table = selection.table.as_str();
        let mut all = Cond::all();
        let mut narrowed = false;

        for filter in selection.filters.iter().filter(|f| !f.values.is_empty()) {
            let column_type = self.catalog.column_type(cache, table, &filter.column)?;
            let values = filter
                .values
                .iter()
                .map(|raw| literal(&filter.column, raw, &column_type))
                .collect::<Result<Vec<_>>>()?;
            all = all.add(Expr::col(Alias::new(&filter.column)).is_in(values));
            narrowed = true;
        }

        if let Some(term) = selection.search.as_deref().filter(|t| !t.is_empty()) {
            let columns = self.catalog.string_columns(cache, table)?;
            if columns.is_empty() {
                log_debug!("No text columns in {table}, ignoring search", table: table);
            } else {
                let mut any = Cond::any();
                for column in columns {
                    any = any.add(Expr::col(Alias::new(column)).like(format!("%{term}%")));
                }
                all = all.add(any);
                narrowed = true;
            }
        }

        Ok(narrowed.then_some(all))
    }

    fn narrowed(&self, cache: &mut SchemaCache, selection: &Selection, mut query: SelectStatement) -> Result<SelectStatement> {
        if let Some(cond) = self.condition(cache, selection)? {
            let _ = query.cond_where(cond);
        }
        Ok(query)
    }

    /// `SELECT * FROM dataset.table [WHERE ...]`
    pub fn select(&self, cache: &mut SchemaCache, selection: &Selection) -> Result<Statement> {
        let query = Query::select()
            .column(Asterisk)
            .from(table_ref(self.catalog.dataset(), &selection.table))
            .to_owned();
        into_statement(&self.narrowed(cache, selection, query)?)
    }

    /// Top rows of `metric` with their `category`, under the same predicates.
    pub fn top_n(
        &self,
        cache: &mut SchemaCache,
        selection: &Selection,
        category: &str,
        metric: &str,
    ) -> Result<Statement> {
        for column in [category, metric] {
            if !self.catalog.column_exists(cache, &selection.table, column)? {
                return Err(QueryError::UnknownColumn {
                    table: selection.table.clone(),
                    column: column.to_string(),
                });
            }
        }
        let query = Query::select()
            .columns([Alias::new(category), Alias::new(metric)])
            .from(table_ref(self.catalog.dataset(), &selection.table))
            .to_owned();
        let mut query = self.narrowed(cache, selection, query)?;
        let _ = query
            .order_by(Alias::new(metric), Order::Desc)
            .limit(CHART_LIMIT);
        into_statement(&query)
    }

    /// Typed value for `column` of `table`.
    fn value(&self, cache: &mut SchemaCache, table: &str, column: &str, raw: &str) -> Result<SimpleExpr> {
        let column_type = self.catalog.column_type(cache, table, column)?;
        Ok(SimpleExpr::from(literal(column, raw, &column_type)?))
    }

    /// Row key of `table`, failing when the table has no columns.
    pub fn primary_key(&self, cache: &mut SchemaCache, table: &str) -> Result<String> {
        let columns = self.catalog.column_names(cache, table)?;
        resolve_primary_key(&columns).ok_or_else(|| QueryError::NoColumns {
            table: table.to_string(),
        })
    }

    pub fn insert(&self, cache: &mut SchemaCache, table: &str, row: &[(String, String)]) -> Result<Statement> {
        if row.is_empty() {
            return Err(QueryError::EmptyWrite {
                table: table.to_string(),
            });
        }
        let mut values = Vec::with_capacity(row.len());
        for (column, raw) in row {
            values.push(self.value(cache, table, column, raw)?);
        }
        let query = Query::insert()
            .into_table(table_ref(self.catalog.dataset(), table))
            .columns(row.iter().map(|(column, _)| Alias::new(column)))
            .values(values)?
            .to_owned();
        into_statement(&query)
    }

    /// Update the row whose key equals `key`.
    pub fn update(
        &self,
        cache: &mut SchemaCache,
        table: &str,
        key: &str,
        changes: &[(String, String)],
    ) -> Result<Statement> {
        if changes.is_empty() {
            return Err(QueryError::EmptyWrite {
                table: table.to_string(),
            });
        }
        let pk = self.primary_key(cache, table)?;
        let key_value = self.value(cache, table, &pk, key)?;
        let mut assignments = Vec::with_capacity(changes.len());
        for (column, raw) in changes {
            assignments.push((Alias::new(column), self.value(cache, table, column, raw)?));
        }
        let query = Query::update()
            .table(table_ref(self.catalog.dataset(), table))
            .values(assignments)
            .and_where(Expr::col(Alias::new(pk)).eq(key_value))
            .to_owned();
        into_statement(&query)
    }

    /// Delete the row whose key equals `key`.
    pub fn delete(&self, cache: &mut SchemaCache, table: &str, key: &str) -> Result<Statement> {
        let pk = self.primary_key(cache, table)?;
        let key_value = self.value(cache, table, &pk, key)?;
        let query = Query::delete()
            .from_table(table_ref(self.catalog.dataset(), table))
            .and_where(Expr::col(Alias::new(pk)).eq(key_value))
            .to_owned();
        into_statement(&query)
    }
}
