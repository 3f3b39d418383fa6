//! Chart Series Module
//! Maps aggregated tables onto the values each chart draws.

use crate::data::{Field, GroupCounts, KeyValue, YearCount};
use crate::stats::{TrendEstimator, TrendFit};
use log::warn;
use serde::Serialize;

/// Category name used when a table has a single key.
pub const SINGLE_CATEGORY: &str = "cases";

/// Dense bucket x category grid for bar charts.
///
/// Buckets come from the first key, categories from the second. A table with
/// one key has a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub bucket_field: Option<Field>,
    pub category_field: Option<Field>,
    pub buckets: Vec<KeyValue>,
    pub categories: Vec<KeyValue>,
    /// `values[bucket][category]`
    pub values: Vec<Vec<f64>>,
}

impl BarSeries {
    pub fn from_counts(counts: &GroupCounts) -> Self {
        let buckets = counts.distinct_keys(0);
        let categories = if counts.fields.len() > 1 {
            counts.distinct_keys(1)
        } else {
            vec![KeyValue::from(SINGLE_CATEGORY)]
        };

        let mut values = vec![vec![0.0; categories.len()]; buckets.len()];
        for row in &counts.rows {
            let Some(b) = buckets.iter().position(|k| Some(k) == row.keys.first()) else {
                continue;
            };
            let c = match row.keys.get(1) {
                Some(key) => categories.iter().position(|k| k == key),
                None => Some(0),
            };
            if let Some(c) = c {
                values[b][c] += row.count as f64;
            }
        }

        Self {
            bucket_field: counts.fields.first().copied(),
            category_field: counts.fields.get(1).copied(),
            buckets,
            categories,
            values,
        }
    }

    pub fn bucket_totals(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn total(&self) -> f64 {
        self.bucket_totals().iter().sum()
    }

    /// Height of the tallest stacked bar.
    pub fn max_stack(&self) -> f64 {
        self.bucket_totals().into_iter().fold(0.0, f64::max)
    }

    /// Each bucket divided by its total. An empty bucket stays all zero.
    pub fn normalized(&self) -> Self {
        let values = self
            .values
            .iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    row.iter().map(|v| v / total).collect()
                } else {
                    vec![0.0; row.len()]
                }
            })
            .collect();
        Self {
            values,
            ..self.clone()
        }
    }
}

/// Yearly points of one category and their fitted line, if one could be fitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub category: KeyValue,
    pub points: Vec<YearCount>,
    pub fit: Option<TrendFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub categories: Vec<CategoryTrend>,
}

impl ScatterSeries {
    /// One point per (year, count) per category with a per-category fit.
    ///
    /// Categories with fewer than three distinct years get no line.
    pub fn from_counts(counts: &GroupCounts) -> Self {
        let categories = counts
            .series_by_category()
            .into_iter()
            .map(|(category, points)| {
                let fit = match TrendEstimator::fit(&points) {
                    Ok(fit) => Some(fit),
                    Err(e) => {
                        warn!("No trend line for {}: {}", category, e);
                        None
                    }
                };
                CategoryTrend {
                    category,
                    points,
                    fit,
                }
            })
            .collect();
        Self { categories }
    }

    pub fn point_count(&self) -> usize {
        self.categories.iter().map(|c| c.points.len()).sum()
    }

    /// Smallest and largest year across all categories.
    pub fn year_range(&self) -> Option<(i64, i64)> {
        let years = self
            .categories
            .iter()
            .flat_map(|c| c.points.iter().map(|p| p.year));
        let min = years.clone().min()?;
        let max = years.max()?;
        Some((min, max))
    }

    pub fn max_count(&self) -> u64 {
        self.categories
            .iter()
            .flat_map(|c| c.points.iter().map(|p| p.count))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CountRow;
    use pretty_assertions::assert_eq;

    fn row(year: i64, gender: &str, count: u64) -> CountRow {
        CountRow {
            keys: vec![KeyValue::Int(year), KeyValue::from(gender)],
            count,
        }
    }

    fn year_gender() -> GroupCounts {
        GroupCounts::from_rows(
            vec![Field::Year, Field::Gender],
            vec![
                row(2015, "Female", 30),
                row(2015, "Male", 10),
                row(2016, "Female", 5),
                row(2017, "Male", 7),
                row(2017, "Female", 14),
            ],
        )
    }

    #[test]
    fn grid_fills_absent_combinations_with_zero() {
        let series = BarSeries::from_counts(&year_gender());
        assert_eq!(
            series.buckets,
            vec![KeyValue::Int(2015), KeyValue::Int(2016), KeyValue::Int(2017)]
        );
        assert_eq!(
            series.categories,
            vec![KeyValue::from("Female"), KeyValue::from("Male")]
        );
        assert_eq!(
            series.values,
            vec![vec![30.0, 10.0], vec![5.0, 0.0], vec![14.0, 7.0]]
        );
        assert_eq!(series.total(), year_gender().total() as f64);
        assert_eq!(series.max_stack(), 40.0);
    }

    #[test]
    fn normalized_buckets_sum_to_one() {
        let series = BarSeries::from_counts(&year_gender()).normalized();
        for total in series.bucket_totals() {
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert_eq!(series.values[0], vec![0.75, 0.25]);
    }

    #[test]
    fn empty_bucket_normalizes_to_zero() {
        let series = BarSeries {
            bucket_field: Some(Field::Year),
            category_field: Some(Field::Gender),
            buckets: vec![KeyValue::Int(2015), KeyValue::Int(2016)],
            categories: vec![KeyValue::from("Female"), KeyValue::from("Male")],
            values: vec![vec![0.0, 0.0], vec![1.0, 3.0]],
        };
        let normalized = series.normalized();
        assert_eq!(normalized.values[0], vec![0.0, 0.0]);
        assert_eq!(normalized.bucket_totals(), vec![0.0, 1.0]);
    }

    #[test]
    fn single_key_table_has_one_category() {
        let counts = GroupCounts::from_rows(
            vec![Field::Gender],
            vec![
                CountRow {
                    keys: vec![KeyValue::from("Male")],
                    count: 4,
                },
                CountRow {
                    keys: vec![KeyValue::from("Female")],
                    count: 9,
                },
            ],
        );
        let series = BarSeries::from_counts(&counts);
        assert_eq!(series.categories, vec![KeyValue::from(SINGLE_CATEGORY)]);
        assert_eq!(series.values, vec![vec![9.0], vec![4.0]]);
        assert_eq!(series.category_field, None);
    }

    #[test]
    fn scatter_fits_only_categories_with_three_years() {
        let scatter = ScatterSeries::from_counts(&year_gender());
        assert_eq!(scatter.point_count(), 5);
        assert_eq!(scatter.year_range(), Some((2015, 2017)));
        assert_eq!(scatter.max_count(), 30);

        let female = &scatter.categories[0];
        assert_eq!(female.category, KeyValue::from("Female"));
        assert!(female.fit.is_some());

        let male = &scatter.categories[1];
        assert_eq!(male.points.len(), 2);
        assert!(male.fit.is_none());
    }
}
