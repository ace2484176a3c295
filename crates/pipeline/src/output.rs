// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Writing and reading cleaned table files

use crate::config::OutputFormat;
use crate::source::read_csv_with_nulls;
use crate::{PipelineError, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use arrow_csv::WriterBuilder;
use diagnostics::*;
use parquet::arrow::ArrowWriter;
use regex::Regex;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The four tables the pipeline writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanedTable {
    ProviderProductivity,
    AppointmentAnalytics,
    CmsData,
    ReadmissionRates,
}

impl CleanedTable {
    pub const ALL: [CleanedTable; 4] = [
        Self::ProviderProductivity,
        Self::AppointmentAnalytics,
        Self::CmsData,
        Self::ReadmissionRates,
    ];

    /// Table name, used for files and warehouse tables alike.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProviderProductivity => "provider_productivity",
            Self::AppointmentAnalytics => "appointment_analytics",
            Self::CmsData => "cms_data",
            Self::ReadmissionRates => "readmission_rates",
        }
    }

    pub fn file_name(self, format: OutputFormat) -> String {
        format!("{}.{}", self.name(), format.extension())
    }
}

impl std::fmt::Display for CleanedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Write `batch` to `path` in `format`.
pub fn write_table(path: &Path, batch: &RecordBatch, format: OutputFormat) -> Result<()> {
    let file = File::create(path)?;
    match format {
        OutputFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(file);
            writer.write(batch)?;
        }
        OutputFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
            writer.write(batch)?;
            let _ = writer.close()?;
        }
    }

    let rows = batch.num_rows();
    let path_str = path.display().to_string();
    log_debug!("Wrote {rows} rows to {path}", rows: rows, path: path_str.as_str());
    Ok(())
}

/// Read a table file written by [`write_table`], choosing the decoder by
/// extension.
pub fn read_table(path: &Path) -> Result<RecordBatch> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => {
            let file = File::open(path)?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
            let schema = builder.schema().clone();
            let batches = builder
                .build()?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(concat_batches(&schema, &batches)?)
        }
        // Only empty cells are null; written NaN and inf stay floats.
        _ => read_csv_with_nulls(path, Regex::new("^$")?),
    }
}

/// Locate the file for `table` in `dir`, preferring Parquet over CSV.
pub fn find_table(dir: &Path, table: CleanedTable) -> Result<PathBuf> {
    for format in [OutputFormat::Parquet, OutputFormat::Csv] {
        let path = dir.join(table.file_name(format));
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(PipelineError::MissingInput {
        path: dir.join(table.file_name(OutputFormat::Csv)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("PROVIDER", DataType::Utf8, false),
            Field::new("score", DataType::Float64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(Float64Array::from(vec![1.5, 2.5])),
            ],
        )
        .expect("batch")
    }

    #[test]
    fn test_csv_has_header_row() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("t.csv");
        write_table(&path, &sample(), OutputFormat::Csv).expect("write");

        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().next(), Some("PROVIDER,score"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_parquet_reads_back() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("t.parquet");
        write_table(&path, &sample(), OutputFormat::Parquet).expect("write");

        let batch = read_table(&path).expect("read");
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.columns(), sample().columns());
    }

    #[test]
    fn test_csv_keeps_non_finite_rates() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("readmission_rates.csv");
        let schema = Arc::new(Schema::new(vec![Field::new("rate", DataType::Float64, true)]));
        let rates = Float64Array::from(vec![Some(15.0), Some(f64::INFINITY), Some(f64::NAN), None]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(rates)]).expect("batch");
        write_table(&path, &batch, OutputFormat::Csv).expect("write");

        let back = read_table(&path).expect("read");
        assert_eq!(back.schema().field(0).data_type(), &DataType::Float64);
        let rates = back.column(0).as_any().downcast_ref::<Float64Array>().expect("floats");
        assert_eq!(rates.null_count(), 1);
        assert_eq!(rates.value(0), 15.0);
        assert!(rates.value(1).is_infinite());
        assert!(rates.value(2).is_nan());
        assert!(rates.is_null(3));
    }

    #[test]
    fn test_find_table_prefers_parquet() {
        let tmp = tempdir().expect("tempdir");
        let table = CleanedTable::CmsData;
        write_table(&tmp.path().join("cms_data.csv"), &sample(), OutputFormat::Csv).expect("csv");
        assert_eq!(
            find_table(tmp.path(), table).expect("csv present"),
            tmp.path().join("cms_data.csv")
        );

        write_table(&tmp.path().join("cms_data.parquet"), &sample(), OutputFormat::Parquet)
            .expect("parquet");
        assert_eq!(
            find_table(tmp.path(), table).expect("parquet present"),
            tmp.path().join("cms_data.parquet")
        );

        assert!(find_table(tmp.path(), CleanedTable::ReadmissionRates).is_err());
    }
}
