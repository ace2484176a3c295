// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Derived per-entity metric tables

use crate::config::{GapFill, SourceColumns};
use crate::frame::{column_index, select_columns};
use crate::merge::{TableSession, quote_ident};
use crate::{PATIENT_ID, Result};
use arrow::array::{ArrayRef, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::compute::kernels::arity::binary;
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

pub const ENCOUNTER_COUNT: &str = "encounter_count";
pub const AVG_DAYS_BETWEEN: &str = "avg_days_between_appointments";
pub const READMISSION_RATE: &str = "Readmission Rate";

const NANOS_PER_DAY: &str = "86400000000000.0";

/// Count encounters per provider. `table` must be registered in `session`.
pub async fn provider_productivity(
    session: &TableSession,
    table: &str,
    batch: &RecordBatch,
    columns: &SourceColumns,
) -> Result<RecordBatch> {
    let _ = column_index(batch, table, &columns.provider)?;
    let provider = quote_ident(&columns.provider);
    let sql = format!(
        "SELECT {provider}, COUNT(*) AS {count} FROM {table} \
         WHERE {provider} IS NOT NULL GROUP BY {provider} ORDER BY {provider}",
        count = quote_ident(ENCOUNTER_COUNT),
        table = quote_ident(table),
    );
    session.query(&sql).await
}

/// Mean whole-day gap between consecutive encounters of each patient.
///
/// `table` is a registered patients-with-encounters merge keyed by
/// `patient_id`. Gaps are floored to whole days; a patient's first encounter
/// and encounters with unparseable start times have no gap.
pub async fn appointment_analytics(
    session: &TableSession,
    table: &str,
    batch: &RecordBatch,
    columns: &SourceColumns,
    gap_fill: GapFill,
) -> Result<RecordBatch> {
    let _ = column_index(batch, table, PATIENT_ID)?;
    let _ = column_index(batch, table, &columns.encounter_start)?;

    let patient = quote_ident(PATIENT_ID);
    let start = quote_ident(&columns.encounter_start);
    let avg = match gap_fill {
        GapFill::AfterMean => "COALESCE(AVG(gap_days), 0.0)",
        GapFill::BeforeMean => "AVG(COALESCE(gap_days, 0.0))",
    };

    let sql = format!(
        "SELECT {patient}, {avg} AS {out} FROM ( \
           SELECT {patient}, FLOOR(CAST(CAST(start_ts AS BIGINT) - CAST(prev_ts AS BIGINT) AS DOUBLE) / {NANOS_PER_DAY}) AS gap_days FROM ( \
             SELECT {patient}, start_ts, LAG(start_ts) OVER (PARTITION BY {patient} ORDER BY start_ts) AS prev_ts FROM ( \
               SELECT {patient}, TRY_CAST(CAST({start} AS VARCHAR) AS TIMESTAMP) AS start_ts FROM {table} \
             ) starts \
           ) ordered \
         ) gaps GROUP BY {patient} ORDER BY {patient}",
        out = quote_ident(AVG_DAYS_BETWEEN),
        table = quote_ident(table),
    );
    session.query(&sql).await
}

fn as_float(column: &ArrayRef) -> Result<ArrayRef> {
    // Non-numeric text becomes null rather than an error.
    Ok(cast(column, &DataType::Float64)?)
}

/// Readmissions as a percentage of discharges per facility.
///
/// The count columns are coerced to Float64 first. Division by zero yields
/// infinity or NaN and is kept.
pub fn readmission_rates(cms: &RecordBatch, columns: &SourceColumns) -> Result<RecordBatch> {
    let picked = select_columns(
        cms,
        "cms_data",
        &[
            columns.facility_id.as_str(),
            columns.excess_ratio.as_str(),
            columns.readmissions.as_str(),
            columns.discharges.as_str(),
        ],
    )?;

    let readmissions = as_float(picked.column(2))?;
    let discharges = as_float(picked.column(3))?;
    let rate: Float64Array = binary(
        readmissions.as_primitive::<Float64Type>(),
        discharges.as_primitive::<Float64Type>(),
        |r, d| r / d * 100.0,
    )?;

    let schema = picked.schema();
    let fields = vec![
        schema.field(0).clone(),
        schema.field(1).clone(),
        Field::new(columns.readmissions.as_str(), DataType::Float64, true),
        Field::new(columns.discharges.as_str(), DataType::Float64, true),
        Field::new(READMISSION_RATE, DataType::Float64, true),
    ];

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        vec![
            picked.column(0).clone(),
            picked.column(1).clone(),
            readmissions,
            discharges,
            Arc::new(rate),
        ],
    )?)
}
