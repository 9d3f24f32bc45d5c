//! Offline staging files
//!
//! `cleaned-database.json` holds a bare array of call centers;
//! `import-ready-data.json` is that array wrapped as the body of
//! `POST /api/external-crm/import`.

use anyhow::{bail, Context, Result};
use ccrm_common::models::NewCallCenter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CLEANED_FILE: &str = "cleaned-database.json";
pub const IMPORT_READY_FILE: &str = "import-ready-data.json";
pub const SINGLE_FILE: &str = "test-single-call-center.json";

/// Body accepted by the bulk import endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    pub call_centers: Vec<NewCallCenter>,
    #[serde(default)]
    pub skip_duplicates: bool,
}

/// Wrap cleaned records for the import endpoint
pub fn prepare_import(records: Vec<NewCallCenter>) -> ImportBody {
    ImportBody {
        call_centers: records,
        skip_duplicates: false,
    }
}

/// Body holding only the first record, for a dry run against a live server
pub fn extract_single(body: &ImportBody) -> Result<ImportBody> {
    let Some(first) = body.call_centers.first() else {
        bail!("No call centers to extract");
    };
    Ok(ImportBody {
        call_centers: vec![first.clone()],
        skip_duplicates: body.skip_duplicates,
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pretty-printed, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}
