//! Case Table Module
//! Immutable wrapper around the polars frame passed between pipeline stages.

use crate::data::schema::Field;
use crate::error::{ReportError, Result, Stage};
use polars::prelude::*;

/// A table of case records. Each stage takes one by reference and returns a new one.
#[derive(Debug, Clone)]
pub struct CaseTable {
    df: DataFrame,
}

impl CaseTable {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Fail with a schema error naming `field` if it is not a column of this table.
    pub fn require(&self, field: Field, stage: Stage) -> Result<()> {
        if self.has_column(field.name()) {
            Ok(())
        } else {
            Err(ReportError::Schema {
                stage,
                column: field.name().to_string(),
            })
        }
    }

    /// Number of non-null cells in a column.
    pub fn non_null_count(&self, field: Field) -> usize {
        self.df
            .column(field.name())
            .map(|c| c.len() - c.null_count())
            .unwrap_or(0)
    }
}

impl From<DataFrame> for CaseTable {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}
