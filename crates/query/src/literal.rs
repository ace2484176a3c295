// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::schema::ColumnType;
use crate::{QueryError, Result};
use sea_query::Value;

/// Turn user-supplied text into a typed SQL value for `column`.
///
/// Numeric columns take unquoted numbers and reject anything else. Boolean
/// columns take `true`/`false`. Every other type gets a string literal.
/// Blank input for a non-text column is NULL.
pub fn literal(column: &str, raw: &str, column_type: &ColumnType) -> Result<Value> {
    let invalid = || QueryError::InvalidLiteral {
        column: column.to_string(),
        value: raw.to_string(),
        column_type: column_type.to_string(),
    };
    let trimmed = raw.trim();

    match column_type {
        ColumnType::Text => Ok(Value::from(raw.to_string())),
        _ if trimmed.is_empty() => Ok(Value::String(None)),
        ColumnType::Integer => match trimmed.parse::<i64>() {
            Ok(i) => Ok(Value::BigInt(Some(i))),
            Err(_) => trimmed
                .parse::<f64>()
                .ok()
                // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
                .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| Value::BigInt(Some(f as i64)))
                .ok_or_else(invalid),
        },
        ColumnType::Float | ColumnType::Decimal => trimmed
            .parse::<f64>()
            .map(|f| Value::Double(Some(f)))
            .map_err(|_| invalid()),
        ColumnType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(Some(true))),
            "false" => Ok(Value::Bool(Some(false))),
            _ => Err(invalid()),
        },
        ColumnType::Temporal | ColumnType::Other(_) => Ok(Value::from(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_columns_take_numbers() {
        assert_eq!(
            literal("n", "42", &ColumnType::Integer).expect("int"),
            Value::BigInt(Some(42))
        );
        assert_eq!(
            literal("n", "3.0", &ColumnType::Integer).expect("whole float"),
            Value::BigInt(Some(3))
        );
        assert_eq!(
            literal("r", " 1.25 ", &ColumnType::Float).expect("float"),
            Value::Double(Some(1.25))
        );
    }

    #[test]
    fn test_non_numeric_value_for_numeric_column_fails() {
        let err = literal("Number of Discharges", "Too Few", &ColumnType::Integer)
            .expect_err("not a number");
        assert!(matches!(err, QueryError::InvalidLiteral { .. }));
        assert!(literal("r", "1.5", &ColumnType::Integer).is_err());
        assert!(literal("r", "abc", &ColumnType::Decimal).is_err());
    }

    #[test]
    fn test_out_of_range_integer_fails() {
        for raw in ["1e30", "-1e30", "99999999999999999999", "9223372036854775808"] {
            let err = literal("n", raw, &ColumnType::Integer).expect_err(raw);
            assert!(matches!(err, QueryError::InvalidLiteral { .. }));
        }
        assert_eq!(
            literal("n", "9223372036854775807", &ColumnType::Integer).expect("max"),
            Value::BigInt(Some(i64::MAX))
        );
        assert_eq!(
            literal("n", "-9.2e18", &ColumnType::Integer).expect("in range"),
            Value::BigInt(Some(-9_200_000_000_000_000_000))
        );
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        assert_eq!(
            literal("LAST", "O'Brien", &ColumnType::Text).expect("text"),
            Value::from("O'Brien".to_string())
        );
        assert_eq!(
            literal("LAST", "", &ColumnType::Text).expect("empty text"),
            Value::from(String::new())
        );
    }

    #[test]
    fn test_blank_non_text_is_null() {
        assert_eq!(
            literal("n", "  ", &ColumnType::Integer).expect("blank"),
            Value::String(None)
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            literal("b", "TRUE", &ColumnType::Boolean).expect("bool"),
            Value::Bool(Some(true))
        );
        assert!(literal("b", "yes", &ColumnType::Boolean).is_err());
    }
}
