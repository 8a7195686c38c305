//! One-hot encoding of the categorical fields.
//!
//! Encoding is split in two: [`EncodingPlan::discover`] scans the table once
//! and fixes which indicator columns exist, [`EncodingPlan::apply`] turns any
//! table with the same fields into indicators. The plan serializes to JSON so
//! two runs can be diffed.

use std::collections::BTreeSet;

use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepareError, Result};

/// One indicator column and the category it flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub category: String,
    pub column: String,
}

/// Encoding of a single categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEncoding {
    pub field: String,
    /// Category represented by all indicators being zero. `None` when the
    /// field had no values at discovery time.
    pub reference: Option<String>,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingPlan {
    pub fields: Vec<FieldEncoding>,
}

impl EncodingPlan {
    /// Build a plan from the categories observed in `df`. Categories are
    /// sorted, the first becomes the reference and is dropped.
    pub fn discover(df: &DataFrame, fields: &[&str]) -> Result<Self> {
        let mut plan = Self::default();

        for field in fields {
            let column = df
                .column(field)
                .map_err(|_| PrepareError::ColumnNotFound(field.to_string()))?;
            let categories: BTreeSet<&str> = column.utf8()?.into_iter().flatten().collect();

            let mut categories = categories.into_iter();
            let reference = categories.next().map(str::to_string);
            let indicators = categories
                .map(|category| Indicator {
                    category: category.to_string(),
                    column: format!("{field}_{category}"),
                })
                .collect::<Vec<_>>();

            debug!(
                "Field {} encodes as {} indicator(s), reference {:?}",
                field,
                indicators.len(),
                reference
            );
            plan.fields.push(FieldEncoding {
                field: field.to_string(),
                reference,
                indicators,
            });
        }

        Ok(plan)
    }

    /// Replace every planned field with its indicator columns, appended after
    /// the remaining columns in plan order. Values the plan does not know
    /// produce all-zero indicators.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut indicators = Vec::with_capacity(self.width());
        let mut result = df.clone();

        for encoding in &self.fields {
            let column = df
                .column(&encoding.field)
                .map_err(|_| PrepareError::ColumnNotFound(encoding.field.clone()))?;
            let values = column.utf8()?;

            for indicator in &encoding.indicators {
                let flags: Vec<u32> = values
                    .into_iter()
                    .map(|value| u32::from(value == Some(indicator.category.as_str())))
                    .collect();
                indicators.push(Series::new(&indicator.column, flags));
            }
            result = result.drop(&encoding.field)?;
        }

        for indicator in indicators {
            result.with_column(indicator)?;
        }
        Ok(result)
    }

    /// Number of indicator columns the plan produces.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.indicators.len()).sum()
    }

    /// All indicator column names, in the order `apply` appends them.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .flat_map(|f| f.indicators.iter().map(|i| i.column.as_str()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldEncoding> {
        self.fields.iter().find(|f| f.field == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(work: &[&str], age: &[f64]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("work_type", work),
            Series::new("age", age),
        ])
        .unwrap()
    }

    #[test]
    fn drops_the_smallest_category_as_reference() {
        let df = frame(&["children", "Private", "Self-employed", "Private"], &[1.0, 2.0, 3.0, 4.0]);
        let plan = EncodingPlan::discover(&df, &["work_type"]).unwrap();
        let field = plan.field("work_type").unwrap();

        assert_eq!(field.reference.as_deref(), Some("Private"));
        assert_eq!(
            plan.columns().collect::<Vec<_>>(),
            vec!["work_type_Self-employed", "work_type_children"]
        );
    }

    #[test]
    fn apply_keeps_rows_and_numeric_columns() {
        let df = frame(&["children", "Private", "Self-employed", "Private"], &[1.0, 2.0, 3.0, 4.0]);
        let plan = EncodingPlan::discover(&df, &["work_type"]).unwrap();
        let encoded = plan.apply(&df).unwrap();

        assert_eq!(encoded.height(), df.height());
        assert_eq!(
            encoded.get_column_names(),
            vec!["age", "work_type_Self-employed", "work_type_children"]
        );
        assert!(encoded.column("age").unwrap().series_equal(df.column("age").unwrap()));

        let children: Vec<u32> = encoded
            .column("work_type_children")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(children, vec![1, 0, 0, 0]);
    }

    #[test]
    fn plan_is_independent_of_row_order() {
        let a = frame(&["Private", "children", "Govt_job"], &[1.0, 2.0, 3.0]);
        let b = frame(&["children", "Govt_job", "Private"], &[1.0, 2.0, 3.0]);
        assert_eq!(
            EncodingPlan::discover(&a, &["work_type"]).unwrap(),
            EncodingPlan::discover(&b, &["work_type"]).unwrap()
        );
    }

    #[test]
    fn unseen_category_encodes_as_zeros() {
        let seen = frame(&["Private", "children"], &[1.0, 2.0]);
        let plan = EncodingPlan::discover(&seen, &["work_type"]).unwrap();

        let later = frame(&["Never_worked", "children"], &[3.0, 4.0]);
        let encoded = plan.apply(&later).unwrap();
        let children: Vec<u32> = encoded
            .column("work_type_children")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(children, vec![0, 1]);
        assert!(encoded.column("work_type_Never_worked").is_err());
    }

    #[test]
    fn single_category_field_has_no_indicators() {
        let df = frame(&["Private", "Private"], &[1.0, 2.0]);
        let plan = EncodingPlan::discover(&df, &["work_type"]).unwrap();
        assert_eq!(plan.width(), 0);
        assert_eq!(plan.apply(&df).unwrap().get_column_names(), vec!["age"]);
    }

    #[test]
    fn plan_round_trips_through_json() {
        let df = frame(&["Private", "children"], &[1.0, 2.0]);
        let plan = EncodingPlan::discover(&df, &["work_type"]).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(serde_json::from_str::<EncodingPlan>(&json).unwrap(), plan);
    }

    #[test]
    fn unknown_field_is_reported() {
        let df = frame(&["Private"], &[1.0]);
        assert!(matches!(
            EncodingPlan::discover(&df, &["gender"]),
            Err(PrepareError::ColumnNotFound(field)) if field == "gender"
        ));
    }
}
