// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Clean then upload.

use crate::commands::{clean_command, upload_command};
use crate::common::ShipContext;
use anyhow::Result;
use std::io::Write;

pub async fn run_command(ctx: &ShipContext, out: &mut impl Write) -> Result<()> {
    let _ = clean_command(ctx, out).await?;
    let _ = upload_command(ctx, out)?;
    Ok(())
}
