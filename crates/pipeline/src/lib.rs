// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Transform pipeline: raw patient, encounter, procedure and CMS readmission
//! files in, four cleaned analytics tables out.

pub mod config;
pub mod error;
pub mod frame;
pub mod merge;
pub mod metrics;
pub mod output;
pub mod source;

pub use config::{GapFill, InputPaths, OutputFormat, PipelineConfig, SourceColumns};
pub use error::{PipelineError, Result};
pub use output::{CleanedTable, find_table, read_table, write_table};
pub use source::RawSources;

use arrow::record_batch::RecordBatch;
use diagnostics::*;
use frame::{fill_zero, rename_column};
use merge::TableSession;
use std::path::{Path, PathBuf};

/// Canonical patient key after renaming.
pub const PATIENT_ID: &str = "patient_id";

/// Output of [`clean`].
#[derive(Debug, Clone)]
pub struct CleanedTables {
    pub provider_productivity: RecordBatch,
    pub appointment_analytics: RecordBatch,
    pub cms_data: RecordBatch,
    pub readmission_rates: RecordBatch,
    /// Patients joined with encounters and procedures, zero-filled.
    /// Kept for inspection; not written.
    pub patient_procedures: RecordBatch,
}

impl CleanedTables {
    pub fn get(&self, table: CleanedTable) -> &RecordBatch {
        match table {
            CleanedTable::ProviderProductivity => &self.provider_productivity,
            CleanedTable::AppointmentAnalytics => &self.appointment_analytics,
            CleanedTable::CmsData => &self.cms_data,
            CleanedTable::ReadmissionRates => &self.readmission_rates,
        }
    }

    /// Write the four tables into `dir`, creating it if needed.
    pub fn write(&self, dir: &Path, format: OutputFormat) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        CleanedTable::ALL
            .iter()
            .map(|table| {
                let path = dir.join(table.file_name(format));
                write_table(&path, self.get(*table), format)?;
                Ok(path)
            })
            .collect()
    }
}

/// Produce the cleaned tables from the raw sources.
pub async fn clean(
    raw: &RawSources,
    columns: &SourceColumns,
    gap_fill: GapFill,
) -> Result<CleanedTables> {
    let patients = rename_column(&raw.patients, "patients", &columns.patient_key, PATIENT_ID)?;
    let encounters =
        rename_column(&raw.encounters, "encounters", &columns.patient_ref, PATIENT_ID)?;
    let procedures =
        rename_column(&raw.procedures, "procedures", &columns.patient_ref, PATIENT_ID)?;

    let session = TableSession::new();
    session.register("patients", &patients)?;
    session.register("encounters", &encounters)?;
    session.register("procedures", &procedures)?;

    let patient_encounters = fill_zero(
        &session
            .inner_join(("patients", &patients), ("encounters", &encounters), PATIENT_ID)
            .await?,
    )?;
    session.register("patient_encounters", &patient_encounters)?;

    let patient_procedures = fill_zero(
        &session
            .inner_join(
                ("patient_encounters", &patient_encounters),
                ("procedures", &procedures),
                PATIENT_ID,
            )
            .await?,
    )?;

    let provider_productivity =
        metrics::provider_productivity(&session, "encounters", &encounters, columns).await?;
    let appointment_analytics = metrics::appointment_analytics(
        &session,
        "patient_encounters",
        &patient_encounters,
        columns,
        gap_fill,
    )
    .await?;

    let cms_data = fill_zero(&raw.readmissions)?;
    let readmission_rates = metrics::readmission_rates(&cms_data, columns)?;

    let providers = provider_productivity.num_rows();
    let patient_count = appointment_analytics.num_rows();
    let facilities = readmission_rates.num_rows();
    log_info!("Cleaned tables: {providers} providers, {patients} patients, {facilities} facilities", providers: providers, patients: patient_count, facilities: facilities);

    Ok(CleanedTables {
        provider_productivity,
        appointment_analytics,
        cms_data,
        readmission_rates,
        patient_procedures,
    })
}

/// Read the configured inputs, clean them and write the outputs.
///
/// Relative paths in `config` resolve against `base`.
pub async fn run(config: &PipelineConfig, base: &Path) -> Result<Vec<PathBuf>> {
    let inputs = config.inputs.rebased(base);
    let output_dir = config.output_path(base);

    let raw = RawSources::read(&inputs)?;
    let tables = clean(&raw, &config.columns, config.gap_fill).await?;
    let written = tables.write(&output_dir, config.output_format)?;

    let count = written.len();
    let dir = output_dir.display().to_string();
    log_info!("Wrote {count} tables to {dir}", count: count, dir: dir.as_str());
    Ok(written)
}
