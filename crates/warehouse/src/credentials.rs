// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Warehouse credentials
//!
//! `CAREPOND_CREDENTIALS` names a JSON file:
//!
//! ```json
//! { "database": "warehouse.duckdb", "dataset": "healthcare_analytics" }
//! ```
//!
//! A relative `database` path is resolved against the file's directory.

use crate::{Result, WarehouseError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CREDENTIALS_ENV: &str = "CAREPOND_CREDENTIALS";

/// Dataset holding the analytics tables.
pub const DEFAULT_DATASET: &str = "healthcare_analytics";

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    pub database: PathBuf,
    #[serde(default = "default_dataset")]
    pub dataset: String,
}

impl Credentials {
    /// Load the file named by `CAREPOND_CREDENTIALS`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CREDENTIALS_ENV).ok_or(WarehouseError::MissingCredentials {
            var: CREDENTIALS_ENV,
        })?;
        Self::load(Path::new(&path))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| WarehouseError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut creds: Self =
            serde_json::from_str(&text).map_err(|source| WarehouseError::InvalidCredentials {
                path: path.to_path_buf(),
                source,
            })?;

        if creds.database.is_relative() {
            if let Some(dir) = path.parent() {
                creds.database = dir.join(&creds.database);
            }
        }
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_database_resolves_against_file() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("creds.json");
        std::fs::write(&path, r#"{"database": "wh.duckdb"}"#).expect("write");

        let creds = Credentials::load(&path).expect("load");
        assert_eq!(creds.database, tmp.path().join("wh.duckdb"));
        assert_eq!(creds.dataset, DEFAULT_DATASET);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("creds.json");
        std::fs::write(&path, "not json").expect("write");

        let err = Credentials::load(&path).expect_err("invalid");
        assert!(matches!(err, WarehouseError::InvalidCredentials { .. }));
        assert!(err.to_string().contains("creds.json"));
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempdir().expect("tempdir");
        let err = Credentials::load(&tmp.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, WarehouseError::CredentialsFile { .. }));
    }
}
