//! Data Processor Module
//! Projection to the report's columns and sentinel cleaning.

use crate::config::MissingGenderPolicy;
use crate::data::schema::{Field, SENTINEL, SENTINEL_TEXT, UNKNOWN_GENDER};
use crate::data::table::CaseTable;
use crate::error::{InStage, Result, Stage};
use log::{debug, info};
use polars::prelude::*;

/// Stateless cleaning and projection operations. Every call returns a new table.
pub struct DataProcessor;

impl DataProcessor {
    /// Keep exactly `fields`, in that order. Rows and row order are unchanged.
    pub fn project(table: &CaseTable, fields: &[Field]) -> Result<CaseTable> {
        for field in fields {
            table.require(*field, Stage::Project)?;
        }
        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        let df = table
            .dataframe()
            .select(names)
            .in_stage(Stage::Project)?;
        debug!("Projected {} columns", df.width());
        Ok(CaseTable::new(df))
    }

    /// Replace every sentinel cell with null.
    ///
    /// Integer columns compare against -99, float columns against -99.0 and
    /// text columns against "-99". Columns of other dtypes are left alone.
    pub fn clean(table: &CaseTable) -> Result<CaseTable> {
        let df = table.dataframe();
        let before = Self::sentinel_count(table)?;

        let exprs: Vec<Expr> = df
            .get_columns()
            .iter()
            .filter_map(|column| {
                let name = column.name().as_str();
                let sentinel = Self::sentinel_literal(column.dtype())?;
                Some(
                    when(col(name).eq(sentinel))
                        .then(lit(NULL))
                        .otherwise(col(name))
                        .alias(name),
                )
            })
            .collect();

        if exprs.is_empty() {
            return Ok(table.clone());
        }

        let cleaned = df
            .clone()
            .lazy()
            .with_columns(exprs)
            .collect()
            .in_stage(Stage::Clean)?;
        info!("Recoded {} sentinel cells to missing", before);
        Ok(CaseTable::new(cleaned))
    }

    /// Number of cells holding the sentinel, across all columns.
    pub fn sentinel_count(table: &CaseTable) -> Result<usize> {
        let mut total = 0;
        for column in table.dataframe().get_columns() {
            let dtype = column.dtype();
            if dtype.is_integer() {
                let values = column.cast(&DataType::Int64).in_stage(Stage::Clean)?;
                total += values
                    .i64()
                    .in_stage(Stage::Clean)?
                    .into_iter()
                    .filter(|v| *v == Some(SENTINEL))
                    .count();
            } else if dtype.is_float() {
                let values = column.cast(&DataType::Float64).in_stage(Stage::Clean)?;
                total += values
                    .f64()
                    .in_stage(Stage::Clean)?
                    .into_iter()
                    .filter(|v| *v == Some(SENTINEL as f64))
                    .count();
            } else if dtype == &DataType::String {
                total += column
                    .str()
                    .in_stage(Stage::Clean)?
                    .into_iter()
                    .filter(|v| *v == Some(SENTINEL_TEXT))
                    .count();
            }
        }
        Ok(total)
    }

    /// Resolve missing gender according to `policy`.
    pub fn apply_gender_policy(
        table: &CaseTable,
        policy: MissingGenderPolicy,
    ) -> Result<CaseTable> {
        match policy {
            MissingGenderPolicy::Exclude => Ok(table.clone()),
            MissingGenderPolicy::Keep => {
                table.require(Field::Gender, Stage::Clean)?;
                let relabelled = table.non_null_count(Field::Gender);
                let df = table
                    .dataframe()
                    .clone()
                    .lazy()
                    .with_columns([col(Field::Gender.name())
                        .fill_null(lit(UNKNOWN_GENDER))
                        .alias(Field::Gender.name())])
                    .collect()
                    .in_stage(Stage::Clean)?;
                debug!(
                    "Relabelled {} missing genders as {}",
                    table.height() - relabelled,
                    UNKNOWN_GENDER
                );
                Ok(CaseTable::new(df))
            }
        }
    }

    fn sentinel_literal(dtype: &DataType) -> Option<Expr> {
        if dtype.is_integer() {
            Some(lit(SENTINEL))
        } else if dtype.is_float() {
            Some(lit(SENTINEL as f64))
        } else if dtype == &DataType::String {
            Some(lit(SENTINEL_TEXT))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::LabourSector;
    use pretty_assertions::assert_eq;

    fn raw_table() -> CaseTable {
        let df = df!(
            "yearOfRegistration" => [2015i64, 2016, -99, 2017],
            "gender" => [Some("Male"), Some("-99"), None, Some("Female")],
            "ageBroad" => [Some("9--17"), Some("30--38"), Some("-99"), None],
            "typeOfLabourBegging" => [1i64, -99, 0, 1],
            "score" => [1.5f64, -99.0, 2.0, 3.0]
        )
        .unwrap();
        CaseTable::new(df)
    }

    fn column_i64(table: &CaseTable, name: &str) -> Vec<Option<i64>> {
        table
            .dataframe()
            .column(name)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    fn column_str(table: &CaseTable, name: &str) -> Vec<Option<String>> {
        table
            .dataframe()
            .column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn project_keeps_order_and_rows() {
        let table = raw_table();
        let projected =
            DataProcessor::project(&table, &[Field::Gender, Field::Year]).unwrap();
        assert_eq!(projected.column_names(), vec!["gender", "yearOfRegistration"]);
        assert_eq!(projected.height(), table.height());
        assert_eq!(
            column_i64(&projected, "yearOfRegistration"),
            vec![Some(2015), Some(2016), Some(-99), Some(2017)]
        );
    }

    #[test]
    fn project_missing_column_is_schema_error() {
        let table = raw_table();
        let err = DataProcessor::project(
            &table,
            &[Field::Year, Field::Labour(LabourSector::Peddling)],
        )
        .unwrap_err();
        match err {
            crate::error::ReportError::Schema { stage, column } => {
                assert_eq!(stage, Stage::Project);
                assert_eq!(column, "typeOfLabourPeddling");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn clean_recodes_only_sentinels() {
        let table = raw_table();
        assert_eq!(DataProcessor::sentinel_count(&table).unwrap(), 5);

        let cleaned = DataProcessor::clean(&table).unwrap();
        assert_eq!(cleaned.height(), 4);
        assert_eq!(DataProcessor::sentinel_count(&cleaned).unwrap(), 0);
        assert_eq!(
            column_i64(&cleaned, "yearOfRegistration"),
            vec![Some(2015), Some(2016), None, Some(2017)]
        );
        assert_eq!(
            column_i64(&cleaned, "typeOfLabourBegging"),
            vec![Some(1), None, Some(0), Some(1)]
        );
        assert_eq!(
            column_str(&cleaned, "gender"),
            vec![Some("Male".to_string()), None, None, Some("Female".to_string())]
        );
        assert_eq!(
            column_str(&cleaned, "ageBroad"),
            vec![Some("9--17".to_string()), Some("30--38".to_string()), None, None]
        );
        let score: Vec<Option<f64>> = cleaned
            .dataframe()
            .column("score")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(score, vec![Some(1.5), None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn clean_is_idempotent() {
        let once = DataProcessor::clean(&raw_table()).unwrap();
        let twice = DataProcessor::clean(&once).unwrap();
        assert!(once.dataframe().equals_missing(twice.dataframe()));
    }

    #[test]
    fn keep_policy_labels_missing_gender() {
        let cleaned = DataProcessor::clean(&raw_table()).unwrap();
        let kept = DataProcessor::apply_gender_policy(&cleaned, MissingGenderPolicy::Keep)
            .unwrap();
        assert_eq!(
            column_str(&kept, "gender"),
            vec![
                Some("Male".to_string()),
                Some("Unknown".to_string()),
                Some("Unknown".to_string()),
                Some("Female".to_string())
            ]
        );

        let excluded =
            DataProcessor::apply_gender_policy(&cleaned, MissingGenderPolicy::Exclude).unwrap();
        assert_eq!(excluded.dataframe().column("gender").unwrap().null_count(), 2);
    }
}
