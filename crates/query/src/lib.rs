// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Query builder and filter engine: selections, searches and admin writes
//! become parameterized statements, checked against the warehouse schema.

pub mod builder;
pub mod error;
pub mod fetch;
pub mod literal;
pub mod schema;
pub mod statement;

pub use builder::{
    CHART_LIMIT, Filter, KEY_CANDIDATES, QueryBuilder, Selection, resolve_primary_key,
};
pub use error::{QueryError, Result};
pub use fetch::{Fetched, fetch, lookup_failed};
pub use literal::literal;
pub use schema::{Catalog, ColumnInfo, ColumnType, SchemaCache};
pub use statement::{into_statement, table_ref};
