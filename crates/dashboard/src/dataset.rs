// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::{DashboardError, Result};
use std::fmt;
use std::str::FromStr;

/// Patient identifier spellings, tried in order.
pub const PATIENT_COLUMNS: &[&str] = &["PATIENT_ID", "PatientID", "patient_id", "PATIENTID", "Patient ID"];

pub const PROVIDER_COLUMN: &str = "PROVIDER";

/// Tables the dashboard can browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dataset {
    #[default]
    ProviderProductivity,
    AppointmentAnalytics,
    CmsData,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [
        Self::ProviderProductivity,
        Self::AppointmentAnalytics,
        Self::CmsData,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ProviderProductivity => "Provider Productivity",
            Self::AppointmentAnalytics => "Appointment Analytics",
            Self::CmsData => "CMS Data",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::ProviderProductivity => "provider_productivity",
            Self::AppointmentAnalytics => "appointment_analytics",
            Self::CmsData => "cms_data",
        }
    }

    /// Columns that may carry this dataset's fixed filter, in preference
    /// order. Empty means any column may be chosen.
    pub fn filter_candidates(self) -> &'static [&'static str] {
        match self {
            Self::ProviderProductivity => &[PROVIDER_COLUMN],
            Self::AppointmentAnalytics => PATIENT_COLUMNS,
            Self::CmsData => &[],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Dataset {
    type Err = DashboardError;

    /// Accepts either the label or the table name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(wanted) || d.table().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DashboardError::UnknownDataset(wanted.to_string()))
    }
}

/// Which column the filter panel offers for the current dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChoice {
    /// One fixed column.
    Column(String),
    /// The user picks among these columns.
    AnyColumn(Vec<String>),
    /// The table lacks every candidate column.
    Unavailable,
}
