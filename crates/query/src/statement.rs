// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! From sea-query statements to warehouse statements

use crate::{QueryError, Result};
use sea_query::{Alias, QueryStatementWriter, SqliteQueryBuilder, TableRef, Value};
use warehouse::{Param, Statement};

/// `"dataset"."table"`
pub fn table_ref(dataset: &str, table: &str) -> TableRef {
    TableRef::SchemaTable(
        sea_query::SeaRc::new(Alias::new(dataset)),
        sea_query::SeaRc::new(Alias::new(table)),
    )
}

fn to_param(value: Value) -> Result<Param> {
    Ok(match value {
        Value::Bool(Some(b)) => Param::Bool(b),
        Value::TinyInt(Some(i)) => Param::Int(i64::from(i)),
        Value::SmallInt(Some(i)) => Param::Int(i64::from(i)),
        Value::Int(Some(i)) => Param::Int(i64::from(i)),
        Value::BigInt(Some(i)) => Param::Int(i),
        Value::TinyUnsigned(Some(i)) => Param::Int(i64::from(i)),
        Value::SmallUnsigned(Some(i)) => Param::Int(i64::from(i)),
        Value::Unsigned(Some(i)) => Param::Int(i64::from(i)),
        Value::BigUnsigned(Some(i)) => Param::Int(
            i64::try_from(i).map_err(|_| QueryError::UnsupportedValue(i.to_string()))?,
        ),
        Value::Float(Some(f)) => Param::Float(f64::from(f)),
        Value::Double(Some(f)) => Param::Float(f),
        Value::String(Some(s)) => Param::Text(*s),
        Value::Char(Some(c)) => Param::Text(c.to_string()),
        Value::Bool(None)
        | Value::TinyInt(None)
        | Value::SmallInt(None)
        | Value::Int(None)
        | Value::BigInt(None)
        | Value::TinyUnsigned(None)
        | Value::SmallUnsigned(None)
        | Value::Unsigned(None)
        | Value::BigUnsigned(None)
        | Value::Float(None)
        | Value::Double(None)
        | Value::String(None)
        | Value::Char(None) => Param::Null,
        other => return Err(QueryError::UnsupportedValue(format!("{other:?}"))),
    })
}

/// Render `query` with `?` placeholders plus bind values, and inline for
/// display. Inline string literals double embedded quotes.
pub fn into_statement<S: QueryStatementWriter>(query: &S) -> Result<Statement> {
    let (sql, values) = query.build(SqliteQueryBuilder);
    let params = values
        .0
        .into_iter()
        .map(to_param)
        .collect::<Result<Vec<_>>>()?;
    Ok(Statement {
        sql,
        params,
        display: query.to_string(SqliteQueryBuilder),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Asterisk, Expr, Query};

    #[test]
    fn test_params_and_display_agree() {
        let query = Query::select()
            .column(Asterisk)
            .from(table_ref("healthcare_analytics", "cms_data"))
            .and_where(Expr::col(Alias::new("State")).eq("O'Brien"))
            .and_where(Expr::col(Alias::new("Facility ID")).eq(10001i64))
            .to_owned();

        let stmt = into_statement(&query).expect("statement");
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "healthcare_analytics"."cms_data" WHERE "State" = ? AND "Facility ID" = ?"#
        );
        assert_eq!(
            stmt.params,
            vec![Param::Text("O'Brien".into()), Param::Int(10001)]
        );
        assert_eq!(
            stmt.display,
            r#"SELECT * FROM "healthcare_analytics"."cms_data" WHERE "State" = 'O''Brien' AND "Facility ID" = 10001"#
        );
    }
}
