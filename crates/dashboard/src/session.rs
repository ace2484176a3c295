// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-user dashboard state
//!
//! Filters, search, page cursor and the cached result live here and change
//! only through the methods below, each of which applies its reset rule.

use crate::auth::Role;
use crate::dataset::Dataset;
use crate::pager::Pager;
use query::{Fetched, Filter, SchemaCache, Selection};

#[derive(Debug, Default)]
pub struct Session {
    pub(crate) username: Option<String>,
    pub(crate) role: Option<Role>,
    pub(crate) dataset: Dataset,
    pub(crate) filters: Vec<Filter>,
    pub(crate) search: Option<String>,
    pub(crate) pager: Pager,
    pub(crate) result: Option<Fetched>,
    pub(crate) schema: SchemaCache,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn page(&self) -> usize {
        self.pager.page()
    }

    /// Result of the last render, if still valid.
    pub fn cached_result(&self) -> Option<&Fetched> {
        self.result.as_ref()
    }

    /// Drop the cached result so the next render queries again.
    pub fn invalidate_result(&mut self) {
        self.result = None;
    }

    /// Switch datasets. Anything tied to the previous one is reset.
    pub fn select_dataset(&mut self, dataset: Dataset) {
        if dataset == self.dataset {
            return;
        }
        self.dataset = dataset;
        self.filters.clear();
        self.search = None;
        self.pager.reset();
        self.result = None;
        self.schema.invalidate();
    }

    /// Replace the filter on `column`. No values removes it.
    pub fn set_filter(&mut self, column: &str, values: Vec<String>) {
        self.filters.retain(|f| f.column != column);
        if !values.is_empty() {
            self.filters.push(Filter::new(column, values));
        }
        self.narrowed();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.narrowed();
    }

    pub fn set_search(&mut self, term: Option<String>) {
        self.search = term.filter(|t| !t.trim().is_empty());
        self.narrowed();
    }

    fn narrowed(&mut self) {
        self.pager.reset();
        self.result = None;
    }

    pub(crate) fn sign_in(&mut self, username: &str, role: Role) {
        self.username = Some(username.to_string());
        self.role = Some(role);
    }

    pub(crate) fn sign_out(&mut self) {
        self.username = None;
        self.role = None;
        self.result = None;
    }

    pub fn selection(&self) -> Selection {
        Selection {
            table: self.dataset.table().to_string(),
            filters: self.filters.clone(),
            search: self.search.clone(),
        }
    }
}
