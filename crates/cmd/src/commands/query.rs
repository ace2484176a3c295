// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::ShipContext;
use anyhow::{Context, Result, anyhow};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use arrow_csv::WriterBuilder;
use clap::ValueEnum;
use diagnostics::*;
use std::io::Write;
use warehouse::{QueryResult, Statement, StatementKind, Warehouse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Count,
}

/// Print a result batch in `format`.
pub fn print_batch(batch: &RecordBatch, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if batch.num_rows() == 0 {
                writeln!(out, "No results found.")?;
            } else {
                let formatted = pretty_format_batches(std::slice::from_ref(batch))
                    .context("Failed to format results as table")?;
                writeln!(out, "{formatted}")?;
            }
        }
        OutputFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(&mut *out);
            writer.write(batch).context("Failed to write CSV")?;
        }
        OutputFormat::Count => writeln!(out, "{}", batch.num_rows())?,
    }
    Ok(())
}

/// Execute ad-hoc SQL against `warehouse`.
pub fn execute_sql(
    warehouse: &dyn Warehouse,
    sql: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    log_debug!("query_command called with sql: {sql}", sql: sql);
    let statement = Statement::raw(sql);
    let kind = if returns_rows(sql) {
        StatementKind::Query
    } else {
        StatementKind::Write
    };
    match warehouse
        .execute(&statement, kind)
        .map_err(|e| anyhow!("Query failed: {e}"))?
    {
        QueryResult::Rows(batch) => print_batch(&batch, format, out),
        QueryResult::Ack { affected } => {
            writeln!(out, "{affected} rows affected")?;
            Ok(())
        }
    }
}

/// Whether `sql` reads rather than writes.
fn returns_rows(sql: &str) -> bool {
    let first = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first.as_str(),
        "SELECT" | "WITH" | "SHOW" | "DESCRIBE" | "EXPLAIN" | "PRAGMA" | "VALUES" | "FROM" | "SUMMARIZE"
    )
}

pub fn query_command(
    ctx: &ShipContext,
    sql: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let (warehouse, _) = ctx.open_warehouse()?;
    execute_sql(&warehouse, sql, format, out)
}
