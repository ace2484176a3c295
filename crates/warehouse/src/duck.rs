// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! DuckDB-backed warehouse
//!
//! Datasets are DuckDB schemas. Tables are loaded by staging the batch as a
//! Parquet file and replacing the table with `read_parquet` over it.

use crate::statement::{DatasetStatus, Param, QueryResult, Statement, StatementKind, quote_ident};
use crate::{Credentials, Result, Warehouse, WarehouseError};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use diagnostics::*;
use duckdb::types::Value;
use duckdb::{Connection, params_from_iter};
use parquet::arrow::ArrowWriter;
use sea_query::{Alias, Asterisk, Expr, Func, Iden, Query, SqliteQueryBuilder};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Iden)]
enum DuckFunc {
    ReadParquet,
}

pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for DuckDbWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbWarehouse").finish_non_exhaustive()
    }
}

fn to_value(param: &Param) -> Value {
    match param {
        Param::Null => Value::Null,
        Param::Bool(b) => Value::Boolean(*b),
        Param::Int(i) => Value::BigInt(*i),
        Param::Float(f) => Value::Double(*f),
        Param::Text(s) => Value::Text(s.clone()),
    }
}

impl DuckDbWarehouse {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| WarehouseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let path_str = path.display().to_string();
        log_info!("Opened warehouse {path}", path: path_str.as_str());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_credentials(creds: &Credentials) -> Result<Self> {
        Self::open(&creds.database)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| WarehouseError::LockPoisoned)
    }

    fn run(&self, statement: &Statement, kind: StatementKind) -> Result<QueryResult> {
        let failed = |source| WarehouseError::Statement {
            sql: statement.display.clone(),
            source,
        };

        let conn = self.lock()?;
        let values: Vec<Value> = statement.params.iter().map(to_value).collect();
        let mut stmt = conn.prepare(&statement.sql).map_err(failed)?;

        match kind {
            StatementKind::Query => {
                let arrow = stmt
                    .query_arrow(params_from_iter(values.iter()))
                    .map_err(failed)?;
                let schema = arrow.get_schema();
                let batches: Vec<RecordBatch> = arrow.collect();
                Ok(QueryResult::Rows(concat_batches(&schema, &batches)?))
            }
            StatementKind::Write => {
                let affected = stmt
                    .execute(params_from_iter(values.iter()))
                    .map_err(failed)?;
                Ok(QueryResult::Ack { affected })
            }
        }
    }
}

impl Warehouse for DuckDbWarehouse {
    fn ensure_dataset(&self, name: &str) -> Result<DatasetStatus> {
        let conn = self.lock()?;
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?",
            [name],
            |row| row.get(0),
        )?;
        if found > 0 {
            log_info!("Dataset {dataset} already exists", dataset: name);
            return Ok(DatasetStatus::Existed);
        }

        match conn.execute_batch(&format!("CREATE SCHEMA {}", quote_ident(name))) {
            Ok(()) => {
                log_info!("Created dataset {dataset}", dataset: name);
                Ok(DatasetStatus::Created)
            }
            // Another writer created it between the check and the create.
            Err(e) if e.to_string().contains("already exists") => {
                log_info!("Dataset {dataset} appeared concurrently", dataset: name);
                Ok(DatasetStatus::Existed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load_table(&self, dataset: &str, table: &str, batch: &RecordBatch) -> Result<usize> {
        let staged = tempfile::Builder::new()
            .prefix(table)
            .suffix(".parquet")
            .tempfile()?;
        let mut writer = ArrowWriter::try_new(staged.reopen()?, batch.schema(), None)?;
        writer.write(batch)?;
        let _ = writer.close()?;

        let source = Query::select()
            .column(Asterisk)
            .from_function(
                Func::cust(DuckFunc::ReadParquet)
                    .arg(Expr::val(staged.path().display().to_string())),
                Alias::new("staged"),
            )
            .to_string(SqliteQueryBuilder);
        let sql = format!(
            "CREATE OR REPLACE TABLE {}.{} AS {source}",
            quote_ident(dataset),
            quote_ident(table)
        );
        let _ = self.execute(&Statement::raw(sql), StatementKind::Write)?;

        let rows = batch.num_rows();
        log_info!("Loaded {rows} rows into {dataset}.{table}", rows: rows, dataset: dataset, table: table);
        Ok(rows)
    }

    fn execute(&self, statement: &Statement, kind: StatementKind) -> Result<QueryResult> {
        let kind_str = kind.to_string();
        log_info!("Executing {kind}: {sql}", kind: kind_str.as_str(), sql: statement.display.as_str());

        let result = self.run(statement, kind);
        match &result {
            Ok(QueryResult::Rows(batch)) => {
                let rows = batch.num_rows();
                log_info!("Query returned {rows} rows", rows: rows);
            }
            Ok(QueryResult::Ack { affected }) => {
                let affected = *affected;
                log_info!("Write affected {affected} rows", affected: affected);
            }
            Err(e) => {
                let error = e.to_string();
                log_error!("Statement failed: {sql}: {error}", sql: statement.display.as_str(), error: error.as_str());
            }
        }
        result
    }
}
