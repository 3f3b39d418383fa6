//! Aggregator Module
//! Group-counts over one or two key columns, and the per-sector gender breakdown.

use crate::data::schema::{Field, LabourSector};
use crate::data::table::CaseTable;
use crate::error::{InStage, Result, Stage};
use log::debug;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

const COUNT_COLUMN: &str = "__count";

/// One value of a group key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl KeyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyValue::Int(v) => Some(*v),
            KeyValue::Text(_) => None,
        }
    }

    fn from_any(value: AnyValue<'_>) -> Option<KeyValue> {
        match value {
            AnyValue::Null => None,
            AnyValue::Int64(v) => Some(KeyValue::Int(v)),
            AnyValue::Int32(v) => Some(KeyValue::Int(v as i64)),
            AnyValue::String(s) => Some(KeyValue::Text(s.to_string())),
            AnyValue::StringOwned(s) => Some(KeyValue::Text(s.to_string())),
            other => Some(KeyValue::Text(other.to_string().trim_matches('"').to_string())),
        }
    }

    /// Order two values of `field` for display.
    pub fn compare(field: Field, a: &KeyValue, b: &KeyValue) -> Ordering {
        match (a, b) {
            (KeyValue::Int(x), KeyValue::Int(y)) => x.cmp(y),
            (KeyValue::Text(x), KeyValue::Text(y)) => field.compare_values(x, y),
            (KeyValue::Int(_), KeyValue::Text(_)) => Ordering::Less,
            (KeyValue::Text(_), KeyValue::Int(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int(v)
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Text(s.to_string())
    }
}

/// Key columns of a group-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKeys {
    Single(Field),
    Pair(Field, Field),
}

impl GroupKeys {
    pub fn fields(&self) -> Vec<Field> {
        match *self {
            GroupKeys::Single(a) => vec![a],
            GroupKeys::Pair(a, b) => vec![a, b],
        }
    }
}

/// One row of an aggregated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub keys: Vec<KeyValue>,
    pub count: u64,
}

/// Aggregated table: unique composite keys with their counts, sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCounts {
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<Field>,
    pub rows: Vec<CountRow>,
}

#[allow(clippy::ptr_arg)]
fn serialize_fields<S: serde::Serializer>(
    fields: &Vec<Field>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(fields.iter().map(|f| f.name()))
}

/// Cases registered in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i64,
    pub count: u64,
}

impl GroupCounts {
    /// Build from rows, merging duplicate keys and sorting by key.
    pub fn from_rows(fields: Vec<Field>, rows: Vec<CountRow>) -> Self {
        let mut rows = rows;
        rows.sort_by(|a, b| Self::compare_keys(&fields, &a.keys, &b.keys));
        let mut merged: Vec<CountRow> = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(last) = merged.last_mut() {
                if last.keys == row.keys {
                    last.count += row.count;
                    continue;
                }
            }
            merged.push(row);
        }
        Self {
            fields,
            rows: merged,
        }
    }

    fn compare_keys(fields: &[Field], a: &[KeyValue], b: &[KeyValue]) -> Ordering {
        fields
            .iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(field, (x, y))| KeyValue::compare(*field, x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn get(&self, keys: &[KeyValue]) -> Option<u64> {
        self.rows.iter().find(|r| r.keys == keys).map(|r| r.count)
    }

    /// Distinct values of key column `position`, in display order.
    pub fn distinct_keys(&self, position: usize) -> Vec<KeyValue> {
        let Some(field) = self.fields.get(position).copied() else {
            return Vec::new();
        };
        let mut values: Vec<KeyValue> = Vec::new();
        for row in &self.rows {
            if let Some(v) = row.keys.get(position) {
                if !values.contains(v) {
                    values.push(v.clone());
                }
            }
        }
        values.sort_by(|a, b| KeyValue::compare(field, a, b));
        values
    }

    /// Yearly series for each value of the second key of a (year, category) table.
    ///
    /// Returns an empty list unless the first key is the registration year.
    pub fn series_by_category(&self) -> Vec<(KeyValue, Vec<YearCount>)> {
        if self.fields.first() != Some(&Field::Year) || self.fields.len() != 2 {
            return Vec::new();
        }
        self.distinct_keys(1)
            .into_iter()
            .map(|category| {
                let points = self
                    .rows
                    .iter()
                    .filter(|r| r.keys[1] == category)
                    .filter_map(|r| {
                        r.keys[0].as_int().map(|year| YearCount {
                            year,
                            count: r.count,
                        })
                    })
                    .collect();
                (category, points)
            })
            .collect()
    }
}

/// Sector flag counts split by gender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorCounts {
    #[serde(serialize_with = "serialize_sector")]
    pub sector: LabourSector,
    pub counts: GroupCounts,
}

fn serialize_sector<S: serde::Serializer>(
    sector: &LabourSector,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(sector.slug())
}

/// Group-count operations over a [`CaseTable`].
pub struct Aggregator;

impl Aggregator {
    /// Count rows per distinct combination of key values.
    ///
    /// Rows with a null in any key column are not counted.
    pub fn group_count(table: &CaseTable, keys: GroupKeys) -> Result<GroupCounts> {
        let fields = keys.fields();
        for field in &fields {
            table.require(*field, Stage::Aggregate)?;
        }

        let mut lazy = table.dataframe().clone().lazy();
        for field in &fields {
            lazy = lazy.filter(col(field.name()).is_not_null());
        }
        let key_exprs: Vec<Expr> = fields.iter().map(|f| col(f.name())).collect();
        let grouped = lazy
            .group_by(key_exprs)
            .agg([len().alias(COUNT_COLUMN)])
            .collect()
            .in_stage(Stage::Aggregate)?;

        let counts_column = grouped
            .column(COUNT_COLUMN)
            .in_stage(Stage::Aggregate)?
            .cast(&DataType::UInt64)
            .in_stage(Stage::Aggregate)?;
        let counts = counts_column.u64().in_stage(Stage::Aggregate)?;
        let key_columns: Vec<&Column> = fields
            .iter()
            .map(|f| grouped.column(f.name()))
            .collect::<PolarsResult<_>>()
            .in_stage(Stage::Aggregate)?;

        let mut rows = Vec::with_capacity(grouped.height());
        for i in 0..grouped.height() {
            let mut row_keys = Vec::with_capacity(key_columns.len());
            for column in &key_columns {
                let value = column.get(i).in_stage(Stage::Aggregate)?;
                if let Some(key) = KeyValue::from_any(value) {
                    row_keys.push(key);
                }
            }
            if row_keys.len() != fields.len() {
                continue;
            }
            if let Some(count) = counts.get(i) {
                rows.push(CountRow {
                    keys: row_keys,
                    count,
                });
            }
        }

        let result = GroupCounts::from_rows(fields, rows);
        debug!(
            "Grouped {:?}: {} groups, {} rows counted",
            keys,
            result.len(),
            result.total()
        );
        Ok(result)
    }

    /// Gender breakdown of the cases whose `sector` flag is exactly 1.
    pub fn count_flag_by_gender(table: &CaseTable, sector: LabourSector) -> Result<GroupCounts> {
        let flag = Field::Labour(sector);
        table.require(flag, Stage::Aggregate)?;
        table.require(Field::Gender, Stage::Aggregate)?;

        let flagged = table
            .dataframe()
            .clone()
            .lazy()
            .filter(col(flag.name()).eq(lit(1i64)))
            .collect()
            .in_stage(Stage::Aggregate)?;

        Self::group_count(&CaseTable::new(flagged), GroupKeys::Single(Field::Gender))
    }

    /// [`Aggregator::count_flag_by_gender`] for every labour sector.
    pub fn sector_breakdown(table: &CaseTable) -> Result<Vec<SectorCounts>> {
        LabourSector::ALL
            .iter()
            .map(|&sector| {
                Ok(SectorCounts {
                    sector,
                    counts: Self::count_flag_by_gender(table, sector)?,
                })
            })
            .collect()
    }

    /// Total cases per registration year, chronological.
    pub fn year_totals(table: &CaseTable) -> Result<Vec<YearCount>> {
        let counts = Self::group_count(table, GroupKeys::Single(Field::Year))?;
        Ok(counts
            .rows
            .iter()
            .filter_map(|r| {
                r.keys[0].as_int().map(|year| YearCount {
                    year,
                    count: r.count,
                })
            })
            .collect())
    }
}
