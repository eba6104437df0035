//! Finalization of a reviewed result table.
//!
//! After manual review the CSV is copied into a delivery folder next to a
//! JSON rendering of the same rows.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::error::{ExportError, Result};

/// Files produced by [`finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedReview {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub rows: usize,
}

/// Header → cell, in column order. Short rows leave trailing columns `null`.
pub type ReviewRow = IndexMap<String, Option<String>>;

/// Read a reviewed CSV as ordered maps. Rows may be ragged.
pub fn read_rows(path: &Path) -> Result<Vec<ReviewRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    reader
        .records()
        .map(|record| -> Result<ReviewRow> {
            let record = record?;
            Ok(headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.to_string(), record.get(i).map(str::to_string)))
                .collect())
        })
        .collect()
}

/// Copy `csv_path` into `out_dir` and write a same-stem `.json` beside it.
pub fn finalize(csv_path: &Path, out_dir: &Path) -> Result<FinalizedReview> {
    let file_name = csv_path
        .file_name()
        .ok_or_else(|| ExportError::InvalidPath(csv_path.display().to_string()))?;

    let rows = read_rows(csv_path)?;

    fs::create_dir_all(out_dir).map_err(|e| ExportError::file(out_dir, e))?;
    let target = out_dir.join(file_name);
    if !same_file(csv_path, &target) {
        fs::copy(csv_path, &target).map_err(|e| ExportError::file(&target, e))?;
    }

    let json_path = target.with_extension("json");
    fs::write(&json_path, serde_json::to_string_pretty(&rows)?)
        .map_err(|e| ExportError::file(&json_path, e))?;

    info!(
        csv = %target.display(),
        json = %json_path.display(),
        rows = rows.len(),
        "finalized review"
    );

    Ok(FinalizedReview {
        csv_path: target,
        json_path,
        rows: rows.len(),
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
