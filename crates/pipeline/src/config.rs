// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Pipeline configuration
//!
//! Every field has a default matching the conventional project layout, so an
//! empty YAML document (or no file at all) is a valid configuration.
//!
//! ```yaml
//! inputs:
//!   patients: data/synthea/patients.csv
//! output_dir: data/transformed
//! output_format: parquet
//! gap_fill: before_mean
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the four raw sources live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InputPaths {
    #[serde(default = "default_patients")]
    pub patients: PathBuf,
    #[serde(default = "default_encounters")]
    pub encounters: PathBuf,
    #[serde(default = "default_procedures")]
    pub procedures: PathBuf,
    #[serde(default = "default_readmissions")]
    pub readmissions: PathBuf,
}

fn default_patients() -> PathBuf {
    PathBuf::from("data/synthea/patients.csv")
}
fn default_encounters() -> PathBuf {
    PathBuf::from("data/synthea/encounters.csv")
}
fn default_procedures() -> PathBuf {
    PathBuf::from("data/synthea/procedures.csv")
}
fn default_readmissions() -> PathBuf {
    PathBuf::from("data/cms/FY_2025_Hospital_Readmissions_Reduction_Program_Hospital.csv")
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            patients: default_patients(),
            encounters: default_encounters(),
            procedures: default_procedures(),
            readmissions: default_readmissions(),
        }
    }
}

impl InputPaths {
    /// Resolve every relative path against `base`.
    pub fn rebased(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base.join(p) };
        Self {
            patients: join(&self.patients),
            encounters: join(&self.encounters),
            procedures: join(&self.procedures),
            readmissions: join(&self.readmissions),
        }
    }

    /// All four paths in reading order.
    pub fn all(&self) -> [&Path; 4] {
        [
            self.patients.as_path(),
            self.encounters.as_path(),
            self.procedures.as_path(),
            self.readmissions.as_path(),
        ]
    }
}

/// Native column names in the raw sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceColumns {
    /// Patient identifier in the patients file, renamed to `patient_id`
    #[serde(default = "default_patient_key")]
    pub patient_key: String,
    /// Patient reference in encounters and procedures, renamed to `patient_id`
    #[serde(default = "default_patient_ref")]
    pub patient_ref: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_start")]
    pub encounter_start: String,
    #[serde(default = "default_facility")]
    pub facility_id: String,
    #[serde(default = "default_excess_ratio")]
    pub excess_ratio: String,
    #[serde(default = "default_readmissions_col")]
    pub readmissions: String,
    #[serde(default = "default_discharges")]
    pub discharges: String,
}

fn default_patient_key() -> String {
    "Id".to_string()
}
fn default_patient_ref() -> String {
    "PATIENT".to_string()
}
fn default_provider() -> String {
    "PROVIDER".to_string()
}
fn default_start() -> String {
    "START".to_string()
}
fn default_facility() -> String {
    "Facility ID".to_string()
}
fn default_excess_ratio() -> String {
    "Excess Readmission Ratio".to_string()
}
fn default_readmissions_col() -> String {
    "Number of Readmissions".to_string()
}
fn default_discharges() -> String {
    "Number of Discharges".to_string()
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            patient_key: default_patient_key(),
            patient_ref: default_patient_ref(),
            provider: default_provider(),
            encounter_start: default_start(),
            facility_id: default_facility(),
            excess_ratio: default_excess_ratio(),
            readmissions: default_readmissions_col(),
            discharges: default_discharges(),
        }
    }
}

/// File format of the cleaned tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// When undefined inter-visit gaps become zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Average the defined gaps, then replace an undefined average with 0.
    /// A patient with a single visit averages to 0.
    #[default]
    AfterMean,
    /// Replace undefined gaps with 0, then average. The first visit of every
    /// patient contributes a 0 to the mean.
    BeforeMean,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub inputs: InputPaths,
    #[serde(default)]
    pub columns: SourceColumns,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub gap_fill: GapFill,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/transformed")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            columns: SourceColumns::default(),
            output_dir: default_output_dir(),
            output_format: OutputFormat::default(),
            gap_fill: GapFill::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Output directory, resolved against `base` when relative.
    pub fn output_path(&self, base: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            base.join(&self.output_dir)
        }
    }

    /// Load a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}
