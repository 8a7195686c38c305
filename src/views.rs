//! The six canned views. Each variant of [`View`] maps to a pure function
//! over the raw and cleaned tables that produces the data a chart is drawn
//! from.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::prepare::{float_column, Quartiles};
use crate::records::{CATEGORICAL_COLUMNS, CONTINUOUS_COLUMNS, NUMERIC_COLUMNS, STROKE};

pub const HISTOGRAM_BINS: usize = 30;
const WHISKER_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum View {
    /// Histograms of the standardized continuous columns
    ContinuousDistribution,
    /// Pearson correlation between the raw numeric columns
    CorrelationMatrix,
    /// Raw continuous columns summarized per stroke outcome
    ContinuousByStroke,
    /// Category counts per stroke outcome
    CategoricalBreakdown,
    /// Box summaries of the standardized continuous columns
    ContinuousBoxplots,
    /// Histograms of the standardized continuous columns split by stroke outcome
    DistributionByStroke,
}

impl View {
    pub const ALL: [View; 6] = [
        View::ContinuousDistribution,
        View::CorrelationMatrix,
        View::ContinuousByStroke,
        View::CategoricalBreakdown,
        View::ContinuousBoxplots,
        View::DistributionByStroke,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::ContinuousDistribution => "Distribution of continuous variables",
            View::CorrelationMatrix => "Correlation matrix",
            View::ContinuousByStroke => "Continuous variables by stroke outcome",
            View::CategoricalBreakdown => "Categorical variables by stroke outcome",
            View::ContinuousBoxplots => "Boxplots of continuous variables",
            View::DistributionByStroke => "Distribution of variables by stroke outcome",
        }
    }

    /// Compute the view's data. Neither table is modified.
    pub fn render(&self, raw: &DataFrame, cleaned: &DataFrame) -> Result<ViewData> {
        match self {
            View::ContinuousDistribution => continuous_distribution(cleaned),
            View::CorrelationMatrix => correlation_matrix(raw),
            View::ContinuousByStroke => continuous_by_stroke(raw),
            View::CategoricalBreakdown => categorical_breakdown(raw),
            View::ContinuousBoxplots => continuous_boxplots(cleaned),
            View::DistributionByStroke => distribution_by_stroke(cleaned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    /// Stroke outcome the rows were restricted to, if any.
    pub stroke: Option<i32>,
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub column: String,
    pub stroke: Option<i32>,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Most extreme values still inside the 1.5 IQR fences.
    pub whisker_low: f64,
    pub whisker_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub field: String,
    pub category: String,
    pub stroke: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewData {
    Histograms {
        title: String,
        histograms: Vec<Histogram>,
    },
    Correlation {
        title: String,
        columns: Vec<String>,
        /// Row-major, `columns.len()` squared; `None` where undefined.
        matrix: Vec<Vec<Option<f64>>>,
    },
    Boxes {
        title: String,
        boxes: Vec<BoxSummary>,
    },
    Counts {
        title: String,
        counts: Vec<CategoryCount>,
    },
}

fn continuous_distribution(cleaned: &DataFrame) -> Result<ViewData> {
    let histograms = CONTINUOUS_COLUMNS
        .iter()
        .map(|column| Ok(histogram(column, None, &values(cleaned, column)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ViewData::Histograms {
        title: View::ContinuousDistribution.title().to_string(),
        histograms,
    })
}

fn correlation_matrix(raw: &DataFrame) -> Result<ViewData> {
    let columns = NUMERIC_COLUMNS
        .iter()
        .map(|column| Ok(float_column(raw, column)?.f64()?.into_iter().collect::<Vec<_>>()))
        .collect::<Result<Vec<Vec<Option<f64>>>>>()?;

    let matrix = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Ok(ViewData::Correlation {
        title: View::CorrelationMatrix.title().to_string(),
        columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        matrix,
    })
}

fn continuous_by_stroke(raw: &DataFrame) -> Result<ViewData> {
    let mut boxes = Vec::new();
    for outcome in stroke_outcomes(raw)? {
        let subset = with_stroke(raw, outcome)?;
        for column in CONTINUOUS_COLUMNS {
            if let Some(summary) = box_summary(column, Some(outcome), &values(&subset, column)?)? {
                boxes.push(summary);
            }
        }
    }
    Ok(ViewData::Boxes {
        title: View::ContinuousByStroke.title().to_string(),
        boxes,
    })
}

fn categorical_breakdown(raw: &DataFrame) -> Result<ViewData> {
    let strokes = raw.column(STROKE)?.cast(&DataType::Int32)?;
    let strokes = strokes.i32()?;

    let mut counts = Vec::new();
    for field in CATEGORICAL_COLUMNS {
        let mut tally: BTreeMap<(&str, i32), usize> = BTreeMap::new();
        for (category, stroke) in raw.column(field)?.utf8()?.into_iter().zip(strokes) {
            if let (Some(category), Some(stroke)) = (category, stroke) {
                *tally.entry((category, stroke)).or_default() += 1;
            }
        }
        counts.extend(tally.into_iter().map(|((category, stroke), count)| CategoryCount {
            field: field.to_string(),
            category: category.to_string(),
            stroke,
            count,
        }));
    }
    Ok(ViewData::Counts {
        title: View::CategoricalBreakdown.title().to_string(),
        counts,
    })
}

fn continuous_boxplots(cleaned: &DataFrame) -> Result<ViewData> {
    let mut boxes = Vec::new();
    for column in CONTINUOUS_COLUMNS {
        if let Some(summary) = box_summary(column, None, &values(cleaned, column)?)? {
            boxes.push(summary);
        }
    }
    Ok(ViewData::Boxes {
        title: View::ContinuousBoxplots.title().to_string(),
        boxes,
    })
}

fn distribution_by_stroke(cleaned: &DataFrame) -> Result<ViewData> {
    let mut histograms = Vec::new();
    for column in CONTINUOUS_COLUMNS {
        for outcome in [1, 0] {
            let subset = with_stroke(cleaned, outcome)?;
            histograms.push(histogram(column, Some(outcome), &values(&subset, column)?));
        }
    }
    Ok(ViewData::Histograms {
        title: View::DistributionByStroke.title().to_string(),
        histograms,
    })
}

/// Non-missing values of `column`.
fn values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    Ok(float_column(df, column)?.f64()?.into_iter().flatten().collect())
}

fn with_stroke(df: &DataFrame, outcome: i32) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(STROKE).cast(DataType::Int32).eq(lit(outcome)))
        .collect()?)
}

/// Distinct stroke outcomes, ascending.
fn stroke_outcomes(df: &DataFrame) -> Result<Vec<i32>> {
    let strokes = df.column(STROKE)?.cast(&DataType::Int32)?;
    let outcomes: std::collections::BTreeSet<i32> = strokes.i32()?.into_iter().flatten().collect();
    Ok(outcomes.into_iter().collect())
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
pub fn histogram(column: &str, stroke: Option<i32>, values: &[f64]) -> Histogram {
    let mut bins = Vec::new();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if !values.is_empty() {
        let width = (max - min) / HISTOGRAM_BINS as f64;
        if width == 0.0 {
            bins.push(Bin {
                lower: min,
                upper: max,
                count: values.len(),
            });
        } else {
            let mut counts = vec![0usize; HISTOGRAM_BINS];
            for value in values {
                let index = (((value - min) / width) as usize).min(HISTOGRAM_BINS - 1);
                counts[index] += 1;
            }
            bins = counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| Bin {
                    lower: min + width * i as f64,
                    upper: min + width * (i + 1) as f64,
                    count,
                })
                .collect();
        }
    }

    Histogram {
        column: column.to_string(),
        stroke,
        bins,
    }
}

/// Five-number summary plus whiskers, or `None` for an empty column.
pub fn box_summary(column: &str, stroke: Option<i32>, values: &[f64]) -> Result<Option<BoxSummary>> {
    let chunked = Float64Chunked::from_slice(column, values);
    let (Some(quartiles), Some(median)) = (Quartiles::of(&chunked)?, chunked.median()) else {
        return Ok(None);
    };

    let (low_fence, high_fence) = quartiles.bounds(WHISKER_FACTOR);
    let inside = || values.iter().copied().filter(move |v| (low_fence..=high_fence).contains(v));

    Ok(Some(BoxSummary {
        column: column.to_string(),
        stroke,
        count: values.len(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        q1: quartiles.q1,
        median,
        q3: quartiles.q3,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        whisker_low: inside().fold(f64::INFINITY, f64::min),
        whisker_high: inside().fold(f64::NEG_INFINITY, f64::max),
    }))
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| x.zip(*y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    let denominator = (var_x * var_y).sqrt();
    (denominator > 0.0).then(|| cov / denominator)
}

impl fmt::Display for ViewData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewData::Histograms { title, histograms } => {
                writeln!(f, "{title}")?;
                for histogram in histograms {
                    match histogram.stroke {
                        Some(stroke) => writeln!(f, "\n{} (stroke = {stroke})", histogram.column)?,
                        None => writeln!(f, "\n{}", histogram.column)?,
                    }
                    for bin in &histogram.bins {
                        writeln!(f, "  [{:>9.3}, {:>9.3}) {:>6}", bin.lower, bin.upper, bin.count)?;
                    }
                }
            }
            ViewData::Correlation { title, columns, matrix } => {
                writeln!(f, "{title}\n")?;
                write!(f, "{:>18}", "")?;
                for column in columns {
                    write!(f, "{column:>18}")?;
                }
                writeln!(f)?;
                for (column, row) in columns.iter().zip(matrix) {
                    write!(f, "{column:>18}")?;
                    for value in row {
                        match value {
                            Some(value) => write!(f, "{value:>18.2}")?,
                            None => write!(f, "{:>18}", "-")?,
                        }
                    }
                    writeln!(f)?;
                }
            }
            ViewData::Boxes { title, boxes } => {
                writeln!(f, "{title}\n")?;
                for b in boxes {
                    let group = b.stroke.map(|s| format!(" (stroke = {s})")).unwrap_or_default();
                    writeln!(
                        f,
                        "{}{group}: n={} min={:.3} q1={:.3} median={:.3} q3={:.3} max={:.3} whiskers=[{:.3}, {:.3}]",
                        b.column, b.count, b.min, b.q1, b.median, b.q3, b.max, b.whisker_low, b.whisker_high
                    )?;
                }
            }
            ViewData::Counts { title, counts } => {
                writeln!(f, "{title}\n")?;
                for c in counts {
                    writeln!(f, "{:<16} {:<18} stroke={} {:>6}", c.field, c.category, c.stroke, c.count)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::read_csv;
    use crate::prepare::{impute, run_pipeline, PipelineOptions};
    use crate::records::{AGE, GENDER};

    const SAMPLE: &str = "\
,gender,age,ever_married,work_type,Residence_type,avg_glucose_level,bmi,smoking_status,stroke
0,Male,67,Yes,Private,Urban,228.69,36.6,formerly smoked,1
1,Female,61,Yes,Self-employed,Rural,202.21,N/A,never smoked,1
2,Male,80,Yes,Private,Rural,105.92,32.5,never smoked,1
3,Female,49,Yes,Private,Urban,171.23,34.4,smokes,1
4,Female,3,No,children,Rural,95.12,18.0,Unknown,0
5,Male,58,Yes,Private,Urban,87.96,39.2,never smoked,0
6,Female,8,No,Private,Urban,110.89,17.6,Unknown,0
7,Female,70,Yes,Private,Rural,69.04,35.9,formerly smoked,0
";

    fn tables() -> (DataFrame, DataFrame) {
        let raw = impute(&read_csv(SAMPLE.as_bytes()).unwrap()).unwrap();
        let cleaned = run_pipeline(&raw, &PipelineOptions::default()).unwrap().cleaned;
        (raw, cleaned)
    }

    #[test]
    fn every_view_renders_without_touching_the_tables() {
        let (raw, cleaned) = tables();
        let (raw_before, cleaned_before) = (raw.clone(), cleaned.clone());
        for view in View::ALL {
            view.render(&raw, &cleaned).unwrap();
        }
        assert!(raw.frame_equal(&raw_before));
        assert!(cleaned.frame_equal(&cleaned_before));
    }

    #[test]
    fn histogram_counts_every_value() {
        let (_, cleaned) = tables();
        let ViewData::Histograms { histograms, .. } =
            View::ContinuousDistribution.render(&cleaned, &cleaned).unwrap()
        else {
            panic!("expected histograms");
        };
        assert_eq!(histograms.len(), 3);
        for histogram in histograms {
            assert_eq!(histogram.bins.len(), HISTOGRAM_BINS);
            let total: usize = histogram.bins.iter().map(|b| b.count).sum();
            assert_eq!(total, cleaned.height());
        }
    }

    #[test]
    fn constant_values_fall_in_a_single_bin() {
        let histogram = histogram(AGE, None, &[2.0, 2.0, 2.0]);
        assert_eq!(histogram.bins, vec![Bin { lower: 2.0, upper: 2.0, count: 3 }]);
        assert!(super::histogram(AGE, None, &[]).bins.is_empty());
    }

    #[test]
    fn correlation_diagonal_is_one() {
        let (raw, cleaned) = tables();
        let ViewData::Correlation { columns, matrix, .. } =
            View::CorrelationMatrix.render(&raw, &cleaned).unwrap()
        else {
            panic!("expected a correlation matrix");
        };
        assert_eq!(columns, NUMERIC_COLUMNS.to_vec());
        for (i, row) in matrix.iter().enumerate() {
            assert!((row[i].unwrap() - 1.0).abs() < 1e-12);
            for (j, value) in row.iter().enumerate() {
                assert_eq!(*value, matrix[j][i]);
            }
        }
    }

    #[test]
    fn pearson_handles_missing_and_flat_inputs() {
        let a = [Some(1.0), Some(2.0), None, Some(4.0)];
        let b = [Some(2.0), Some(4.0), Some(5.0), Some(8.0)];
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&a, &[Some(3.0); 4]), None);
    }

    #[test]
    fn category_counts_add_up_to_rows() {
        let (raw, cleaned) = tables();
        let ViewData::Counts { counts, .. } = View::CategoricalBreakdown.render(&raw, &cleaned).unwrap()
        else {
            panic!("expected counts");
        };
        for field in CATEGORICAL_COLUMNS {
            let total: usize = counts.iter().filter(|c| c.field == field).map(|c| c.count).sum();
            assert_eq!(total, raw.height());
        }
        let female_stroke = counts
            .iter()
            .find(|c| c.field == GENDER && c.category == "Female" && c.stroke == 1)
            .unwrap();
        assert_eq!(female_stroke.count, 2);
    }

    #[test]
    fn boxes_are_split_by_stroke_outcome() {
        let (raw, cleaned) = tables();
        let ViewData::Boxes { boxes, .. } = View::ContinuousByStroke.render(&raw, &cleaned).unwrap()
        else {
            panic!("expected boxes");
        };
        assert_eq!(boxes.len(), 6);
        let age_stroke = boxes
            .iter()
            .find(|b| b.column == AGE && b.stroke == Some(1))
            .unwrap();
        assert_eq!(age_stroke.count, 4);
        assert_eq!(age_stroke.median, 64.0);
        assert!(age_stroke.whisker_low >= age_stroke.min);
        assert!(age_stroke.whisker_high <= age_stroke.max);
    }

    #[test]
    fn box_summary_whiskers_exclude_outliers() {
        let summary = box_summary(AGE, None, &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap().unwrap();
        assert_eq!(summary.max, 100.0);
        assert_eq!(summary.whisker_high, 4.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert!(box_summary(AGE, None, &[]).unwrap().is_none());
    }

    #[test]
    fn view_data_serializes_with_a_kind_tag() {
        let (raw, cleaned) = tables();
        let json = serde_json::to_value(View::ContinuousBoxplots.render(&raw, &cleaned).unwrap()).unwrap();
        assert_eq!(json["kind"], "boxes");
        assert_eq!(json["boxes"].as_array().unwrap().len(), 3);
    }
}
