// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use diagnostics::*;
use pipeline::PipelineConfig;
use std::path::{Path, PathBuf};
use warehouse::{Credentials, DuckDbWarehouse};

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct ShipContext {
    /// Pipeline configuration file; defaults apply when absent.
    pub config: Option<PathBuf>,
    /// Credential file, overriding `CAREPOND_CREDENTIALS`.
    pub credentials: Option<PathBuf>,
}

impl ShipContext {
    pub fn new(config: Option<PathBuf>, credentials: Option<PathBuf>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Load the pipeline configuration and the directory its relative
    /// paths resolve against.
    pub fn pipeline_config(&self) -> Result<(PipelineConfig, PathBuf)> {
        match &self.config {
            Some(path) => {
                let config = PipelineConfig::load(path)
                    .with_context(|| format!("Failed to load configuration {}", path.display()))?;
                let base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Ok((config, base))
            }
            None => {
                let base = std::env::current_dir().context("Failed to read current directory")?;
                Ok((PipelineConfig::default(), base))
            }
        }
    }

    pub fn load_credentials(&self) -> Result<Credentials> {
        let creds = match &self.credentials {
            Some(path) => Credentials::load(path),
            None => Credentials::from_env(),
        };
        creds.context("Failed to load warehouse credentials")
    }

    /// Open the warehouse named by the credentials, with its dataset.
    pub fn open_warehouse(&self) -> Result<(DuckDbWarehouse, String)> {
        let creds = self.load_credentials()?;
        let warehouse = DuckDbWarehouse::from_credentials(&creds)
            .with_context(|| format!("Failed to open warehouse {}", creds.database.display()))?;
        let dataset = creds.dataset.as_str();
        log_debug!("Using dataset {dataset}", dataset: dataset);
        Ok((warehouse, creds.dataset))
    }
}
