// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::{Result, Warehouse};
use diagnostics::*;
use pipeline::{CleanedTable, find_table, read_table};
use std::path::{Path, PathBuf};

/// One uploaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub table: CleanedTable,
    pub source: PathBuf,
    pub rows: usize,
}

/// Upload every cleaned table in `dir` into `dataset`, replacing what was
/// there. All four table files must be present.
pub fn upload_directory(
    warehouse: &dyn Warehouse,
    dataset: &str,
    dir: &Path,
) -> Result<Vec<UploadReport>> {
    let mut sources = Vec::with_capacity(CleanedTable::ALL.len());
    for table in CleanedTable::ALL {
        sources.push((table, find_table(dir, table)?));
    }

    let _ = warehouse.ensure_dataset(dataset)?;

    let mut reports = Vec::with_capacity(sources.len());
    for (table, source) in sources {
        let batch = read_table(&source)?;
        let rows = warehouse.load_table(dataset, table.name(), &batch)?;
        reports.push(UploadReport { table, source, rows });
    }

    let count = reports.len();
    log_info!("Uploaded {count} tables into {dataset}", count: count, dataset: dataset);
    Ok(reports)
}
