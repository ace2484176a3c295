// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Column-level helpers over record batches

use crate::{PipelineError, Result};
use arrow::array::{Array, ArrayRef, Int64Array};
use arrow::compute::kernels::zip::zip;
use arrow::compute::{can_cast_types, cast, is_not_null};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use diagnostics::*;
use std::sync::Arc;

/// Index of `column` in `batch`, or a `MissingColumn` error naming `table`.
pub fn column_index(batch: &RecordBatch, table: &str, column: &str) -> Result<usize> {
    batch
        .schema()
        .index_of(column)
        .map_err(|_| PipelineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

/// Rename one column, keeping its data and position.
pub fn rename_column(batch: &RecordBatch, table: &str, from: &str, to: &str) -> Result<RecordBatch> {
    let index = column_index(batch, table, from)?;
    let schema = batch.schema();

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            if i == index {
                field.as_ref().clone().with_name(to)
            } else {
                field.as_ref().clone()
            }
        })
        .collect();

    let renamed = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(renamed, batch.columns().to_vec())?)
}

/// Keep only the named columns, in the given order.
pub fn select_columns(batch: &RecordBatch, table: &str, columns: &[&str]) -> Result<RecordBatch> {
    let indices = columns
        .iter()
        .map(|c| column_index(batch, table, c))
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// An all-zero array of `data_type`, if zero is representable in it.
///
/// Zero is produced by casting Int64 zeros, so strings get "0", booleans
/// `false` and timestamps the epoch.
fn zeros(data_type: &DataType, len: usize) -> Result<Option<ArrayRef>> {
    if !can_cast_types(&DataType::Int64, data_type) {
        return Ok(None);
    }
    let zeros = Int64Array::from(vec![0i64; len]);
    Ok(Some(cast(&zeros, data_type)?))
}

/// Replace every null with the zero of its column type.
///
/// Columns whose type has no zero are left as they are.
pub fn fill_zero(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    let mut fields = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if column.null_count() == 0 {
            columns.push(column.clone());
            fields.push(field.as_ref().clone());
            continue;
        }

        match zeros(column.data_type(), column.len())? {
            Some(zero) => {
                let mask = is_not_null(column.as_ref())?;
                columns.push(zip(&mask, column, &zero)?);
                fields.push(field.as_ref().clone().with_nullable(false));
            }
            None => {
                let name = field.name().as_str();
                let data_type = field.data_type().to_string();
                log_debug!("Column {name} of type {data_type} has no zero, leaving nulls", name: name, data_type: data_type.as_str());
                columns.push(column.clone());
                fields.push(field.as_ref().clone());
            }
        }
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(schema, columns)?)
}
