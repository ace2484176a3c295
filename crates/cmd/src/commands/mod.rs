// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod clean;
pub mod dashboard;
pub mod query;
pub mod run;
pub mod upload;

pub use clean::clean_command;
pub use dashboard::{dashboard_command, run_session};
pub use query::{OutputFormat, execute_sql, query_command};
pub use run::run_command;
pub use upload::upload_command;
