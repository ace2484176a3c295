// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dashboard controller
//!
//! Turns session events into warehouse traffic. Reads go through
//! [`query::fetch`], so a failing query shows up as a notice instead of an
//! error. Writes are gated on the admin role before any statement exists.

use crate::auth::{Authenticator, Role};
use crate::chart::{self, ChartColumns, ChartData, ChartRequest};
use crate::dataset::{Dataset, FilterChoice};
use crate::pager::total_pages;
use crate::session::Session;
use crate::{DashboardError, Result};
use arrow::record_batch::RecordBatch;
use diagnostics::*;
use query::{Catalog, Fetched, QueryBuilder, QueryError, fetch, lookup_failed};
use warehouse::{QueryResult, Statement, StatementKind, Warehouse};

/// Why the view has no rows to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The query ran and matched nothing.
    NoData,
    /// The query failed; the message is for display.
    QueryFailed { message: String },
}

/// One render of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub dataset: Dataset,
    /// Rows of the current page, absent when the query failed.
    pub rows: Option<RecordBatch>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub admin_controls: bool,
    pub writes_enabled: bool,
    pub notice: Option<Notice>,
}

pub struct Controller<'a> {
    warehouse: &'a dyn Warehouse,
    dataset: String,
    authenticator: Box<dyn Authenticator + 'a>,
}

fn row_count(session: &Session) -> usize {
    session
        .result
        .as_ref()
        .and_then(Fetched::rows)
        .map_or(0, RecordBatch::num_rows)
}

impl<'a> Controller<'a> {
    pub fn new(
        warehouse: &'a dyn Warehouse,
        dataset: impl Into<String>,
        authenticator: Box<dyn Authenticator + 'a>,
    ) -> Self {
        Self {
            warehouse,
            dataset: dataset.into(),
            authenticator,
        }
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(Catalog::new(self.warehouse, &self.dataset))
    }

    pub fn login(&self, session: &mut Session, username: &str, password: &str) -> Result<Role> {
        let Some(role) = self.authenticator.authenticate(username, password) else {
            log_warn!("Rejected login for {username}", username: username);
            return Err(DashboardError::InvalidLogin);
        };
        session.sign_in(username, role);
        let role_name = role.to_string();
        log_info!("User {username} logged in as {role}", username: username, role: role_name.as_str());
        Ok(role)
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(username) = session.username.take() {
            log_info!("User {username} logged out", username: username.as_str());
        }
        session.sign_out();
    }

    fn reader(session: &Session) -> Result<Role> {
        session.role.ok_or(DashboardError::NotLoggedIn)
    }

    fn admin(session: &Session, action: &'static str) -> Result<()> {
        let role = Self::reader(session)?;
        if !role.is_admin() {
            let role_name = role.to_string();
            log_warn!("Refused {action} for role {role}", action: action, role: role_name.as_str());
            return Err(DashboardError::NotAuthorized { action, role });
        }
        Ok(())
    }

    pub fn select_dataset(&self, session: &mut Session, dataset: Dataset) {
        if session.dataset != dataset {
            log_info!("Selected dataset {dataset}", dataset: dataset.label());
        }
        session.select_dataset(dataset);
    }

    /// The filter column offered for the session's dataset.
    pub fn filter_choice(&self, session: &mut Session) -> Result<FilterChoice> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        let catalog = Catalog::new(self.warehouse, &self.dataset);
        let candidates = session.dataset.filter_candidates();
        if candidates.is_empty() {
            return Ok(FilterChoice::AnyColumn(
                catalog.column_names(&mut session.schema, table)?,
            ));
        }
        for column in candidates {
            if catalog.column_exists(&mut session.schema, table, column)? {
                return Ok(FilterChoice::Column(column.to_string()));
            }
        }
        Ok(FilterChoice::Unavailable)
    }

    /// Distinct values of `column`, for the filter picker.
    pub fn filter_values(&self, session: &mut Session, column: &str) -> Result<Vec<String>> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        let catalog = Catalog::new(self.warehouse, &self.dataset);
        if !catalog.column_exists(&mut session.schema, table, column)? {
            return Err(QueryError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            }
            .into());
        }
        Ok(catalog.distinct_values(table, column)?)
    }

    pub fn columns(&self, session: &mut Session) -> Result<Vec<String>> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        Ok(Catalog::new(self.warehouse, &self.dataset).column_names(&mut session.schema, table)?)
    }

    /// Filter on an existing column of the current dataset.
    pub fn set_filter(&self, session: &mut Session, column: &str, values: Vec<String>) -> Result<()> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        let catalog = Catalog::new(self.warehouse, &self.dataset);
        if !catalog.column_exists(&mut session.schema, table, column)? {
            return Err(QueryError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            }
            .into());
        }
        session.set_filter(column, values);
        Ok(())
    }

    /// Run the data query unless a valid result is cached.
    fn ensure_result(&self, session: &mut Session) -> Result<()> {
        if session.result.is_some() {
            return Ok(());
        }
        let selection = session.selection();
        let statement = match self.builder().select(&mut session.schema, &selection) {
            Ok(statement) => statement,
            Err(e @ (QueryError::Warehouse(_) | QueryError::Introspection(_))) => {
                session.result = Some(lookup_failed(session.dataset.table(), e.to_string()));
                session.pager.clamp(0);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        log_info!("Executing query: {sql}", sql: statement.display.as_str());
        session.result = Some(fetch(self.warehouse, &statement));
        let rows = row_count(session);
        session.pager.clamp(rows);
        Ok(())
    }

    /// One render cycle: at most one data query, then the current page.
    pub fn render(&self, session: &mut Session) -> Result<View> {
        let role = Self::reader(session)?;
        self.ensure_result(session)?;

        let total_rows = row_count(session);
        let (rows, notice) = match &session.result {
            Some(Fetched::Rows(batch)) => {
                let range = session.pager.range(batch.num_rows());
                let page = batch.slice(range.start, range.len());
                let notice = (batch.num_rows() == 0).then_some(Notice::NoData);
                (Some(page), notice)
            }
            Some(Fetched::Failed { message, .. }) => (
                None,
                Some(Notice::QueryFailed {
                    message: message.clone(),
                }),
            ),
            None => (None, None),
        };

        let writes_enabled = role.is_admin() && self.writes_enabled(session);
        Ok(View {
            dataset: session.dataset,
            rows,
            page: session.pager.page(),
            total_pages: total_pages(total_rows),
            total_rows,
            admin_controls: role.is_admin(),
            writes_enabled,
            notice,
        })
    }

    fn writes_enabled(&self, session: &mut Session) -> bool {
        let table = session.dataset.table();
        match self.builder().primary_key(&mut session.schema, table) {
            Ok(_) => true,
            Err(e) => {
                let message = e.to_string();
                log_warn!("Record writes disabled for {table}: {error}", table: table, error: message.as_str());
                false
            }
        }
    }

    pub fn next_page(&self, session: &mut Session) -> bool {
        let rows = row_count(session);
        session.pager.next(rows)
    }

    pub fn prev_page(&self, session: &mut Session) -> bool {
        session.pager.prev()
    }

    /// Primary key of the current table; fails when writes are disabled.
    pub fn primary_key(&self, session: &mut Session) -> Result<String> {
        let table = session.dataset.table();
        self.builder()
            .primary_key(&mut session.schema, table)
            .map_err(|e| match e {
                QueryError::NoColumns { table } => DashboardError::WritesDisabled { table },
                other => other.into(),
            })
    }

    fn write(&self, session: &mut Session, statement: Statement) -> Result<usize> {
        match self.warehouse.execute(&statement, StatementKind::Write) {
            Ok(result) => {
                session.invalidate_result();
                let affected = match result {
                    QueryResult::Ack { affected } => affected,
                    QueryResult::Rows(batch) => batch.num_rows(),
                };
                log_info!("Write affected {affected} rows: {sql}", affected: affected, sql: statement.display.as_str());
                Ok(affected)
            }
            Err(e) => {
                let message = e.to_string();
                log_error!("Write failed: {sql}: {error}", sql: statement.display.as_str(), error: message.as_str());
                Err(e.into())
            }
        }
    }

    pub fn insert(&self, session: &mut Session, row: &[(String, String)]) -> Result<usize> {
        Self::admin(session, "insert")?;
        let table = session.dataset.table();
        let statement = self.builder().insert(&mut session.schema, table, row)?;
        self.write(session, statement)
    }

    pub fn update(&self, session: &mut Session, key: &str, changes: &[(String, String)]) -> Result<usize> {
        Self::admin(session, "update")?;
        let _ = self.primary_key(session)?;
        let table = session.dataset.table();
        let statement = self.builder().update(&mut session.schema, table, key, changes)?;
        self.write(session, statement)
    }

    pub fn delete(&self, session: &mut Session, key: &str) -> Result<usize> {
        Self::admin(session, "delete")?;
        let _ = self.primary_key(session)?;
        let table = session.dataset.table();
        let statement = self.builder().delete(&mut session.schema, table, key)?;
        self.write(session, statement)
    }

    /// Numeric and categorical columns of the current dataset.
    pub fn chart_columns(&self, session: &mut Session) -> Result<ChartColumns> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        let catalog = Catalog::new(self.warehouse, &self.dataset);
        let mut columns = ChartColumns::default();
        for info in catalog.columns(&mut session.schema, table)? {
            if info.column_type.is_numeric() {
                columns.numeric.push(info.name);
            } else {
                columns.categorical.push(info.name);
            }
        }
        Ok(columns)
    }

    /// Chart data for the current selection.
    pub fn chart(&self, session: &mut Session, request: &ChartRequest) -> Result<ChartData> {
        let _ = Self::reader(session)?;
        let table = session.dataset.table();
        let columns = self.chart_columns(session)?;
        if columns.numeric.is_empty() {
            return Err(DashboardError::NoNumericColumns {
                table: table.to_string(),
            });
        }
        let numeric = |column: &str| -> Result<()> {
            if columns.numeric.iter().any(|c| c == column) {
                Ok(())
            } else {
                Err(DashboardError::ChartColumn {
                    column: column.to_string(),
                    expected: "numeric",
                })
            }
        };
        let categorical = |column: &str| -> Result<()> {
            if columns.categorical.iter().any(|c| c == column) {
                Ok(())
            } else {
                Err(DashboardError::ChartColumn {
                    column: column.to_string(),
                    expected: "categorical",
                })
            }
        };

        match request {
            ChartRequest::Bar { category, metric } => {
                categorical(category)?;
                numeric(metric)?;
                let selection = session.selection();
                let statement = self
                    .builder()
                    .top_n(&mut session.schema, &selection, category, metric)?;
                let batch = match fetch(self.warehouse, &statement) {
                    Fetched::Rows(batch) => batch,
                    Fetched::Failed { message, .. } => return Err(DashboardError::NoRows { message }),
                };
                Ok(ChartData::Bar {
                    title: format!("Top {} by {metric}", query::CHART_LIMIT),
                    bars: chart::bars(&chart::labels(&batch, 0)?, &chart::numbers(&batch, 1)?),
                })
            }
            ChartRequest::Line { metric, group } => {
                numeric(metric)?;
                if let Some(group) = group {
                    categorical(group)?;
                }
                let batch = self.result_batch(session)?;
                let values = chart::numbers(&batch, index_of(&batch, metric)?)?;
                Ok(match group {
                    Some(group) => ChartData::Line {
                        title: format!("{metric} by {group}"),
                        points: chart::mean_by_group(&chart::labels(&batch, index_of(&batch, group)?)?, &values),
                    },
                    None => ChartData::Line {
                        title: format!("Trend of {metric}"),
                        points: chart::trend(&values),
                    },
                })
            }
            ChartRequest::Scatter { x, y, color } => {
                numeric(x)?;
                numeric(y)?;
                if let Some(color) = color {
                    categorical(color)?;
                }
                let batch = self.result_batch(session)?;
                let xs = chart::numbers(&batch, index_of(&batch, x)?)?;
                let ys = chart::numbers(&batch, index_of(&batch, y)?)?;
                let colors = match color {
                    Some(color) => Some(chart::labels(&batch, index_of(&batch, color)?)?),
                    None => None,
                };
                Ok(ChartData::Scatter {
                    title: format!("{x} vs {y}"),
                    points: chart::scatter(&xs, &ys, colors.as_deref()),
                })
            }
            ChartRequest::Histogram { column, bins } => {
                numeric(column)?;
                let batch = self.result_batch(session)?;
                let values = chart::numbers(&batch, index_of(&batch, column)?)?;
                Ok(ChartData::Histogram {
                    title: format!("Distribution of {column}"),
                    bins: chart::histogram(&values, chart::bin_count(*bins)),
                })
            }
            ChartRequest::Pie { category, value } => {
                if columns.categorical.is_empty() {
                    return Err(DashboardError::NoCategoricalColumns {
                        table: table.to_string(),
                    });
                }
                categorical(category)?;
                numeric(value)?;
                let batch = self.result_batch(session)?;
                let labels = chart::labels(&batch, index_of(&batch, category)?)?;
                let values = chart::numbers(&batch, index_of(&batch, value)?)?;
                Ok(ChartData::Pie {
                    title: format!("Composition by {category}"),
                    slices: chart::sum_by_category(&labels, &values),
                })
            }
        }
    }

    /// The whole filtered result, fetching it if needed.
    fn result_batch(&self, session: &mut Session) -> Result<RecordBatch> {
        self.ensure_result(session)?;
        match &session.result {
            Some(Fetched::Rows(batch)) => Ok(batch.clone()),
            Some(Fetched::Failed { message, .. }) => Err(DashboardError::NoRows {
                message: message.clone(),
            }),
            None => Err(DashboardError::NoRows {
                message: "no result".to_string(),
            }),
        }
    }
}

fn index_of(batch: &RecordBatch, column: &str) -> Result<usize> {
    Ok(batch.schema().index_of(column)?)
}
