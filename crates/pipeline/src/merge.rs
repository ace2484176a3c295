// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Joins and SQL aggregation over in-memory tables
//!
//! Tables are registered in a DataFusion `SessionContext` with a single target
//! partition and every query orders its output, so repeated runs produce the
//! same rows in the same order.

use crate::Result;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::{SessionConfig, SessionContext};
use diagnostics::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// In-memory tables plus the context that queries them.
pub struct TableSession {
    ctx: SessionContext,
}

impl Default for TableSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSession {
    pub fn new() -> Self {
        let config = SessionConfig::new().with_target_partitions(1);
        Self {
            ctx: SessionContext::new_with_config(config),
        }
    }

    /// Register (or replace) `batch` under `name`.
    pub fn register(&self, name: &str, batch: &RecordBatch) -> Result<()> {
        let table = MemTable::try_new(batch.schema(), vec![vec![batch.clone()]])?;
        let _ = self.ctx.deregister_table(name)?;
        let _ = self.ctx.register_table(name, Arc::new(table))?;
        Ok(())
    }

    /// Run `sql` and collect the result into one batch.
    pub async fn query(&self, sql: &str) -> Result<RecordBatch> {
        log_debug!("Pipeline SQL: {sql}", sql: sql);
        let df = self.ctx.sql(sql).await?;
        let schema: SchemaRef = Arc::new(df.schema().as_arrow().clone());
        let batches = df.collect().await?;
        let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
        Ok(concat_batches(&schema, &batches)?)
    }

    /// Inner join of two registered tables on `key`.
    ///
    /// The key appears once. Other columns present on both sides get the
    /// suffixes `_x` (left) and `_y` (right). Rows are ordered by key, then by
    /// their position in each input.
    pub async fn inner_join(
        &self,
        left: (&str, &RecordBatch),
        right: (&str, &RecordBatch),
        key: &str,
    ) -> Result<RecordBatch> {
        let (left_name, left_batch) = left;
        let (right_name, right_batch) = right;

        let left_schema = left_batch.schema();
        let right_schema = right_batch.schema();
        let left_cols: Vec<&str> = left_schema.fields().iter().map(|f| f.name().as_str()).collect();
        let right_cols: Vec<&str> = right_schema.fields().iter().map(|f| f.name().as_str()).collect();
        let left_set: HashSet<&str> = left_cols.iter().copied().collect();
        let right_set: HashSet<&str> = right_cols.iter().copied().collect();

        let mut projection = vec![format!("l.{0} AS {0}", quote_ident(key))];
        for col in left_cols.iter().filter(|c| **c != key) {
            let alias = if right_set.contains(col) {
                format!("{col}_x")
            } else {
                col.to_string()
            };
            projection.push(format!("l.{} AS {}", quote_ident(col), quote_ident(&alias)));
        }
        for col in right_cols.iter().filter(|c| **c != key) {
            let alias = if left_set.contains(col) {
                format!("{col}_y")
            } else {
                col.to_string()
            };
            projection.push(format!("r.{} AS {}", quote_ident(col), quote_ident(&alias)));
        }

        // Row ordinals keep the order of duplicate keys stable.
        let key = quote_ident(key);
        let sql = format!(
            "SELECT {projection} \
             FROM (SELECT *, ROW_NUMBER() OVER () AS __l_ord FROM {left}) l \
             INNER JOIN (SELECT *, ROW_NUMBER() OVER () AS __r_ord FROM {right}) r \
             ON l.{key} = r.{key} \
             ORDER BY l.{key}, l.__l_ord, r.__r_ord",
            projection = projection.join(", "),
            left = quote_ident(left_name),
            right = quote_ident(right_name),
        );

        let joined = self.query(&sql).await?;
        let rows = joined.num_rows();
        log_debug!("Joined {left} with {right}: {rows} rows", left: left_name, right: right_name, rows: rows);
        Ok(joined)
    }
}
