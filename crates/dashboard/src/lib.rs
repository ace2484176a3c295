// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dashboard and admin controller: sessions, login, pagination, record
//! writes and chart data over the warehouse tables.

pub mod auth;
pub mod chart;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod pager;
pub mod session;

pub use auth::{Authenticator, Role, StaticAuthenticator};
pub use chart::{Bin, ChartColumns, ChartData, ChartKind, ChartRequest, Point, ScatterPoint};
pub use controller::{Controller, Notice, View};
pub use dataset::{Dataset, FilterChoice, PATIENT_COLUMNS, PROVIDER_COLUMN};
pub use error::{DashboardError, Result};
pub use pager::{PAGE_SIZE, Pager, total_pages};
pub use session::Session;
