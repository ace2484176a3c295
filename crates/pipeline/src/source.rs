// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Raw source loading
//!
//! CSV files are decoded with arrow_csv. The schema is inferred from the whole
//! file, and the usual spreadsheet spellings of "missing" decode as null so the
//! zero-fill and numeric coercion rules see them as missing values.

use crate::config::InputPaths;
use crate::{PipelineError, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use arrow_csv::ReaderBuilder;
use arrow_csv::reader::Format;
use diagnostics::*;
use regex::Regex;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// Cell contents that decode as null.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn missing_regex() -> Result<Regex> {
    let alternatives: Vec<String> = MISSING_TOKENS.iter().map(|t| regex::escape(t)).collect();
    Ok(Regex::new(&format!("^(?:{})$", alternatives.join("|")))?)
}

/// Read a raw source CSV file into a single batch. Conventional missing-value
/// tokens decode as null.
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    read_csv_with_nulls(path, missing_regex()?)
}

/// Read a headed CSV file, decoding cells that match `nulls` as null.
pub(crate) fn read_csv_with_nulls(path: &Path, nulls: Regex) -> Result<RecordBatch> {
    let read_err = |source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path)?;
    let format = Format::default()
        .with_header(true)
        .with_null_regex(nulls);

    let (schema, records) = format.infer_schema(&mut file, None).map_err(read_err)?;
    let schema = Arc::new(schema);
    let _ = file.seek(SeekFrom::Start(0))?;

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)
        .map_err(read_err)?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(read_err)?;

    let path_str = path.display().to_string();
    log_debug!("Read {records} records from {path}", records: records, path: path_str.as_str());

    Ok(concat_batches(&schema, &batches)?)
}

/// Every input path must exist before anything is read.
pub fn check_inputs(inputs: &InputPaths) -> Result<()> {
    for path in inputs.all() {
        if !path.is_file() {
            let path_str = path.display().to_string();
            log_error!("Input file not found: {path}", path: path_str.as_str());
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// The four raw tables, read once per pipeline run.
#[derive(Debug, Clone)]
pub struct RawSources {
    pub patients: RecordBatch,
    pub encounters: RecordBatch,
    pub procedures: RecordBatch,
    pub readmissions: RecordBatch,
}

impl RawSources {
    pub fn read(inputs: &InputPaths) -> Result<Self> {
        check_inputs(inputs)?;
        Ok(Self {
            patients: read_csv(&inputs.patients)?,
            encounters: read_csv(&inputs.encounters)?,
            procedures: read_csv(&inputs.procedures)?,
            readmissions: read_csv(&inputs.readmissions)?,
        })
    }
}
