// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use arrow::array::{AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use pipeline::{CleanedTable, OutputFormat, write_table};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use warehouse::{
    DEFAULT_DATASET, DuckDbWarehouse, Statement, StatementKind, Warehouse, WarehouseError,
    upload_directory,
};

fn two_columns(name: &str, rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(name, DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let keys: Vec<String> = (0..rows).map(|i| format!("K{i}")).collect();
    let values: Vec<f64> = (0..rows).map(|i| i as f64).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(keys)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .expect("batch")
}

fn write_all(dir: &Path, rows: usize, format: OutputFormat) {
    for table in CleanedTable::ALL {
        let path = dir.join(table.file_name(format));
        write_table(&path, &two_columns("key", rows), format).expect("write table");
    }
}

fn row_count(wh: &DuckDbWarehouse, table: &str) -> i64 {
    let stmt = Statement::raw(format!(
        "SELECT COUNT(*) FROM \"{DEFAULT_DATASET}\".\"{table}\""
    ));
    let rows = wh
        .execute(&stmt, StatementKind::Query)
        .expect("count")
        .into_rows()
        .expect("rows");
    rows.column(0).as_primitive::<Int64Type>().value(0)
}

#[test]
fn test_upload_directory_loads_all_tables() {
    let tmp = tempdir().expect("tempdir");
    write_all(tmp.path(), 5, OutputFormat::Csv);

    let wh = DuckDbWarehouse::open_in_memory().expect("open");
    let reports = upload_directory(&wh, DEFAULT_DATASET, tmp.path()).expect("upload");

    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert_eq!(report.rows, 5);
        assert_eq!(row_count(&wh, report.table.name()), 5);
    }
}

#[test]
fn test_reupload_replaces_rows() {
    let tmp = tempdir().expect("tempdir");
    let wh = DuckDbWarehouse::open_in_memory().expect("open");

    write_all(tmp.path(), 5, OutputFormat::Parquet);
    let _ = upload_directory(&wh, DEFAULT_DATASET, tmp.path()).expect("first upload");

    write_all(tmp.path(), 2, OutputFormat::Parquet);
    let _ = upload_directory(&wh, DEFAULT_DATASET, tmp.path()).expect("second upload");

    assert_eq!(row_count(&wh, "cms_data"), 2);
}

#[test]
fn test_missing_table_file_uploads_nothing() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(CleanedTable::CmsData.file_name(OutputFormat::Csv));
    write_table(&path, &two_columns("key", 1), OutputFormat::Csv).expect("write");

    let wh = DuckDbWarehouse::open_in_memory().expect("open");
    let err = upload_directory(&wh, DEFAULT_DATASET, tmp.path()).expect_err("incomplete");
    assert!(matches!(err, WarehouseError::Pipeline(_)));

    let check = Statement::raw(format!(
        "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = '{DEFAULT_DATASET}'"
    ));
    let rows = wh
        .execute(&check, StatementKind::Query)
        .expect("schemata")
        .into_rows()
        .expect("rows");
    assert_eq!(rows.column(0).as_primitive::<Int64Type>().value(0), 0);
}

#[test]
fn test_integer_columns_survive_upload() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("PROVIDER", DataType::Utf8, false),
        Field::new("encounter_count", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["DR1", "DR2"])),
            Arc::new(Int64Array::from(vec![3, 1])),
        ],
    )
    .expect("batch");

    let wh = DuckDbWarehouse::open_in_memory().expect("open");
    let _ = wh.ensure_dataset(DEFAULT_DATASET).expect("dataset");
    let rows = wh
        .load_table(DEFAULT_DATASET, "provider_productivity", &batch)
        .expect("load");
    assert_eq!(rows, 2);

    let stmt = Statement::raw(format!(
        "SELECT data_type FROM information_schema.columns \
         WHERE table_schema = '{DEFAULT_DATASET}' AND table_name = 'provider_productivity' \
         ORDER BY ordinal_position"
    ));
    let types = wh
        .execute(&stmt, StatementKind::Query)
        .expect("introspect")
        .into_rows()
        .expect("rows");
    let types = types.column(0).as_string::<i32>();
    assert_eq!(types.value(0), "VARCHAR");
    assert_eq!(types.value(1), "BIGINT");
}

#[test]
fn test_zero_discharge_rate_uploads_as_nan() {
    let tmp = tempdir().expect("tempdir");
    write_all(tmp.path(), 1, OutputFormat::Csv);

    let schema = Arc::new(Schema::new(vec![
        Field::new("Facility ID", DataType::Int64, false),
        Field::new("Readmission Rate", DataType::Float64, true),
    ]));
    let rates = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10001, 10002, 10003])),
            Arc::new(Float64Array::from(vec![Some(15.0), Some(f64::NAN), None])),
        ],
    )
    .expect("batch");
    let path = tmp
        .path()
        .join(CleanedTable::ReadmissionRates.file_name(OutputFormat::Csv));
    write_table(&path, &rates, OutputFormat::Csv).expect("write");

    let wh = DuckDbWarehouse::open_in_memory().expect("open");
    let _ = upload_directory(&wh, DEFAULT_DATASET, tmp.path()).expect("upload");

    let stmt = Statement::raw(format!(
        "SELECT COUNT(*) FILTER (WHERE isnan(\"Readmission Rate\")), \
         COUNT(*) FILTER (WHERE \"Readmission Rate\" IS NULL) \
         FROM \"{DEFAULT_DATASET}\".\"readmission_rates\""
    ));
    let rows = wh
        .execute(&stmt, StatementKind::Query)
        .expect("count")
        .into_rows()
        .expect("rows");
    assert_eq!(rows.column(0).as_primitive::<Int64Type>().value(0), 1);
    assert_eq!(rows.column(1).as_primitive::<Int64Type>().value(0), 1);
}
