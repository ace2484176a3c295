// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::ShipContext;
use anyhow::{Context, Result};
use std::io::Write;
use warehouse::{UploadReport, upload_directory};

/// Load the cleaned tables from the configured output directory.
pub fn upload_command(ctx: &ShipContext, out: &mut impl Write) -> Result<Vec<UploadReport>> {
    let (config, base) = ctx.pipeline_config()?;
    let (warehouse, dataset) = ctx.open_warehouse()?;
    let dir = config.output_path(&base);

    let reports = upload_directory(&warehouse, &dataset, &dir)
        .with_context(|| format!("Failed to upload {}", dir.display()))?;

    for report in &reports {
        writeln!(
            out,
            "{dataset}.{} <- {} ({} rows)",
            report.table,
            report.source.display(),
            report.rows
        )?;
    }
    Ok(reports)
}
