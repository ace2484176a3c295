// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use arrow::array::{AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use query::{
    Catalog, ColumnType, Fetched, Filter, QueryBuilder, QueryError, SchemaCache, Selection, fetch,
};
use std::cell::Cell;
use std::sync::Arc;
use warehouse::{
    DatasetStatus, DuckDbWarehouse, QueryResult, Statement, StatementKind, Warehouse,
    WarehouseError,
};

const DATASET: &str = "healthcare_analytics";

fn providers() -> RecordBatch {
    let names: Vec<String> = (0..12).map(|i| format!("DR{i:02}")).collect();
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.push("O'Brien");
    let counts: Vec<i64> = (0..13).collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("PROVIDER", DataType::Utf8, false),
        Field::new("encounter_count", DataType::Int64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(names)),
            Arc::new(Int64Array::from(counts)),
        ],
    )
    .expect("batch")
}

fn numbers_only() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::Int64, false),
        Field::new("y", DataType::Float64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Float64Array::from(vec![0.5, 1.5])),
        ],
    )
    .expect("batch")
}

fn text_x() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Utf8, false)]));
    RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a", "b"]))])
        .expect("batch")
}

fn warehouse() -> DuckDbWarehouse {
    let wh = DuckDbWarehouse::open_in_memory().expect("open");
    let _ = wh.ensure_dataset(DATASET).expect("dataset");
    let _ = wh
        .load_table(DATASET, "provider_productivity", &providers())
        .expect("providers");
    let _ = wh
        .load_table(DATASET, "numbers", &numbers_only())
        .expect("numbers");
    let _ = wh.load_table(DATASET, "letters", &text_x()).expect("letters");
    wh
}

fn rows(wh: &dyn Warehouse, stmt: &Statement) -> RecordBatch {
    match fetch(wh, stmt) {
        Fetched::Rows(batch) => batch,
        Fetched::Failed { statement, message } => panic!("{statement}: {message}"),
    }
}

#[test]
fn test_quoted_filter_value_is_escaped_and_bound() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let selection = Selection {
        table: "provider_productivity".into(),
        filters: vec![Filter::new("PROVIDER", vec!["O'Brien".into()])],
        search: None,
    };
    let stmt = builder.select(&mut cache, &selection).expect("build");

    assert_eq!(
        stmt.display,
        r#"SELECT * FROM "healthcare_analytics"."provider_productivity" WHERE "PROVIDER" IN ('O''Brien')"#
    );
    assert_eq!(rows(&wh, &stmt).num_rows(), 1);
}

#[test]
fn test_numeric_filter_is_unquoted() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let selection = Selection {
        table: "provider_productivity".into(),
        filters: vec![Filter::new("encounter_count", vec!["3".into(), "4".into()])],
        search: None,
    };
    let stmt = builder.select(&mut cache, &selection).expect("build");
    assert!(stmt.display.ends_with(r#"WHERE "encounter_count" IN (3, 4)"#));
    assert_eq!(rows(&wh, &stmt).num_rows(), 2);
}

#[test]
fn test_non_numeric_value_for_numeric_column_is_build_error() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let selection = Selection {
        table: "provider_productivity".into(),
        filters: vec![Filter::new("encounter_count", vec!["many".into()])],
        search: None,
    };
    let err = builder.select(&mut cache, &selection).expect_err("invalid");
    assert!(matches!(err, QueryError::InvalidLiteral { .. }));
}

#[test]
fn test_search_spans_text_columns() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let selection = Selection {
        table: "provider_productivity".into(),
        filters: vec![],
        search: Some("Brien".into()),
    };
    let stmt = builder.select(&mut cache, &selection).expect("build");
    assert!(stmt.display.contains(r#""PROVIDER" LIKE '%Brien%'"#));
    assert!(!stmt.display.contains("encounter_count"));
    assert_eq!(rows(&wh, &stmt).num_rows(), 1);
}

#[test]
fn test_search_without_text_columns_is_ignored() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let selection = Selection {
        table: "numbers".into(),
        filters: vec![],
        search: Some("anything".into()),
    };
    let stmt = builder.select(&mut cache, &selection).expect("build");
    assert!(!stmt.display.contains("WHERE"));
    assert_eq!(rows(&wh, &stmt).num_rows(), 2);
}

#[test]
fn test_switching_tables_never_reuses_types() {
    let wh = warehouse();
    let catalog = Catalog::new(&wh, DATASET);
    let mut cache = SchemaCache::new();

    assert_eq!(
        catalog.column_type(&mut cache, "numbers", "x").expect("numbers.x"),
        ColumnType::Integer
    );
    assert_eq!(
        catalog.column_type(&mut cache, "letters", "x").expect("letters.x"),
        ColumnType::Text
    );
    assert!(cache.cached_type("numbers", "x").is_none());
}

#[test]
fn test_introspection_helpers() {
    let wh = warehouse();
    let catalog = Catalog::new(&wh, DATASET);
    let mut cache = SchemaCache::new();

    assert!(catalog.column_exists(&mut cache, "provider_productivity", "PROVIDER").expect("exists"));
    assert!(!catalog.column_exists(&mut cache, "provider_productivity", "PATIENT_ID").expect("absent"));
    assert_eq!(
        catalog.column_names(&mut cache, "provider_productivity").expect("names"),
        vec!["PROVIDER", "encounter_count"]
    );
    assert_eq!(
        catalog.numeric_columns(&mut cache, "numbers").expect("numeric"),
        vec!["x", "y"]
    );

    let values = catalog.distinct_values("letters", "x").expect("distinct");
    assert_eq!(values, vec!["a", "b"]);
}

/// Fails the first `failures` statements, then delegates.
struct Flaky {
    inner: DuckDbWarehouse,
    failures: Cell<usize>,
    executed: Cell<usize>,
}

impl Warehouse for Flaky {
    fn ensure_dataset(&self, name: &str) -> warehouse::Result<DatasetStatus> {
        self.inner.ensure_dataset(name)
    }

    fn load_table(&self, dataset: &str, table: &str, batch: &RecordBatch) -> warehouse::Result<usize> {
        self.inner.load_table(dataset, table, batch)
    }

    fn execute(&self, statement: &Statement, kind: StatementKind) -> warehouse::Result<QueryResult> {
        self.executed.set(self.executed.get() + 1);
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(WarehouseError::Io(std::io::Error::other("connection reset")));
        }
        self.inner.execute(statement, kind)
    }
}

#[test]
fn test_failed_lookup_is_not_cached() {
    let flaky = Flaky {
        inner: warehouse(),
        failures: Cell::new(1),
        executed: Cell::new(0),
    };
    let catalog = Catalog::new(&flaky, DATASET);
    let mut cache = SchemaCache::new();

    assert!(catalog.column_type(&mut cache, "numbers", "x").is_err());
    assert_eq!(
        catalog.column_type(&mut cache, "numbers", "x").expect("retry"),
        ColumnType::Integer
    );
    assert_eq!(flaky.executed.get(), 2);

    // Now cached: no further statement.
    let _ = catalog.column_type(&mut cache, "numbers", "x").expect("cached");
    assert_eq!(flaky.executed.get(), 2);
}

#[test]
fn test_top_n_orders_and_limits() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();

    let stmt = builder
        .top_n(&mut cache, &Selection::table("provider_productivity"), "PROVIDER", "encounter_count")
        .expect("build");
    assert!(stmt.display.ends_with(r#"ORDER BY "encounter_count" DESC LIMIT 10"#));

    let batch = rows(&wh, &stmt);
    assert_eq!(batch.num_rows(), 10);
    assert_eq!(batch.column(1).as_primitive::<Int64Type>().value(0), 12);
    assert_eq!(batch.column(0).as_string::<i32>().value(0), "O'Brien");
}

#[test]
fn test_admin_writes() {
    let wh = warehouse();
    let builder = QueryBuilder::new(Catalog::new(&wh, DATASET));
    let mut cache = SchemaCache::new();
    let table = "provider_productivity";

    let insert = builder
        .insert(
            &mut cache,
            table,
            &[
                ("PROVIDER".into(), "D'Arcy".into()),
                ("encounter_count".into(), "7".into()),
            ],
        )
        .expect("insert");
    assert_eq!(
        wh.execute(&insert, StatementKind::Write).expect("run insert"),
        QueryResult::Ack { affected: 1 }
    );

    let update = builder
        .update(&mut cache, table, "D'Arcy", &[("encounter_count".into(), "8".into())])
        .expect("update");
    assert!(update.display.contains(r#"WHERE "PROVIDER" = 'D''Arcy'"#));
    assert_eq!(
        wh.execute(&update, StatementKind::Write).expect("run update"),
        QueryResult::Ack { affected: 1 }
    );

    let delete = builder.delete(&mut cache, table, "D'Arcy").expect("delete");
    assert_eq!(
        wh.execute(&delete, StatementKind::Write).expect("run delete"),
        QueryResult::Ack { affected: 1 }
    );

    let bad = builder.update(&mut cache, table, "DR01", &[("encounter_count".into(), "lots".into())]);
    assert!(matches!(bad, Err(QueryError::InvalidLiteral { .. })));
}

#[test]
fn test_fetch_failure_is_sentinel() {
    let wh = warehouse();
    let stmt = Statement::raw("SELECT * FROM healthcare_analytics.missing_table");
    match fetch(&wh, &stmt) {
        Fetched::Failed { statement, message } => {
            assert_eq!(statement, stmt.display);
            assert!(!message.is_empty());
        }
        Fetched::Rows(_) => panic!("query against a missing table succeeded"),
    }
}
