//! CSV Data Loader Module
//! Reads the case export with Polars and applies the declared column types.

use crate::data::schema::Field;
use crate::data::table::CaseTable;
use crate::error::{InStage, ReportError, Result, Stage};
use log::{debug, info};
use polars::prelude::*;
use std::path::Path;

/// Loads the case export into a typed [`CaseTable`].
pub struct CaseLoader;

impl CaseLoader {
    /// Load a comma-separated file. See [`CaseLoader::load_delimited`].
    pub fn load_csv(path: &Path) -> Result<CaseTable> {
        Self::load_delimited(path, b',')
    }

    /// Load a delimited file, check the required header names and cast each
    /// required column to its declared dtype.
    ///
    /// Every column is read as text first, so a malformed cell anywhere in
    /// the file becomes null instead of failing the read.
    pub fn load_delimited(path: &Path, separator: u8) -> Result<CaseTable> {
        if !path.is_file() {
            let reason = if path.exists() {
                "path is not a file"
            } else {
                "file not found"
            };
            return Err(Self::input_error(path, reason));
        }

        info!(
            "Loading cases from {} (separator {:?})",
            path.display(),
            separator as char
        );

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_separator(separator)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|e| Self::input_error(path, &e.to_string()))?;

        let missing: Vec<&str> = Field::ALL
            .iter()
            .map(|f| f.name())
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(Self::input_error(
                path,
                &format!("header is missing required columns: {}", missing.join(", ")),
            ));
        }

        let table = Self::apply_schema(df)?;
        info!(
            "Loaded {} rows x {} columns",
            table.height(),
            table.width()
        );
        Ok(table)
    }

    /// Cast required columns to their declared dtypes and read blank text as missing.
    ///
    /// Cells that cannot be parsed as the declared type become null.
    pub fn apply_schema(df: DataFrame) -> Result<CaseTable> {
        let exprs: Vec<Expr> = Field::ALL
            .iter()
            .filter(|f| df.column(f.name()).is_ok())
            .map(|f| {
                let typed = col(f.name()).cast(f.dtype());
                if f.is_text() {
                    when(typed.clone().eq(lit("")))
                        .then(lit(NULL))
                        .otherwise(typed)
                        .alias(f.name())
                } else {
                    typed.alias(f.name())
                }
            })
            .collect();
        debug!("Applying declared types to {} columns", exprs.len());

        if exprs.is_empty() {
            return Ok(CaseTable::new(df));
        }

        let typed = df
            .lazy()
            .with_columns(exprs)
            .collect()
            .in_stage(Stage::Load)?;
        Ok(CaseTable::new(typed))
    }

    fn input_error(path: &Path, reason: &str) -> ReportError {
        ReportError::Input {
            stage: Stage::Load,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
