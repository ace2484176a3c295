// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::ShipContext;
use anyhow::{Context, Result};
use diagnostics::*;
use std::io::Write;
use std::path::PathBuf;

/// Run the transform pipeline and report the files written.
pub async fn clean_command(ctx: &ShipContext, out: &mut impl Write) -> Result<Vec<PathBuf>> {
    let (config, base) = ctx.pipeline_config()?;
    log_info!("Starting pipeline");

    let written = pipeline::run(&config, &base)
        .await
        .context("Pipeline failed")?;

    for path in &written {
        writeln!(out, "wrote {}", path.display())?;
    }
    Ok(written)
}
