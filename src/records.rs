use polars::prelude::{DataFrame, NamedFrom, PolarsResult, Series};
use serde::{Deserialize, Deserializer};

pub const GENDER: &str = "gender";
pub const AGE: &str = "age";
pub const EVER_MARRIED: &str = "ever_married";
pub const WORK_TYPE: &str = "work_type";
pub const RESIDENCE_TYPE: &str = "Residence_type";
pub const AVG_GLUCOSE_LEVEL: &str = "avg_glucose_level";
pub const BMI: &str = "bmi";
pub const SMOKING_STATUS: &str = "smoking_status";
pub const STROKE: &str = "stroke";

/// Columns an input file must carry, in the order the raw table exposes them.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    GENDER,
    AGE,
    EVER_MARRIED,
    WORK_TYPE,
    RESIDENCE_TYPE,
    AVG_GLUCOSE_LEVEL,
    BMI,
    SMOKING_STATUS,
    STROKE,
];

pub const CATEGORICAL_COLUMNS: [&str; 5] =
    [GENDER, EVER_MARRIED, WORK_TYPE, RESIDENCE_TYPE, SMOKING_STATUS];

/// Continuous measurements, in the order they are filtered for outliers.
pub const OUTLIER_ORDER: [&str; 3] = [BMI, AVG_GLUCOSE_LEVEL, AGE];

pub const CONTINUOUS_COLUMNS: [&str; 3] = [AGE, AVG_GLUCOSE_LEVEL, BMI];

pub const NUMERIC_COLUMNS: [&str; 4] = [AGE, AVG_GLUCOSE_LEVEL, BMI, STROKE];

/// Cell contents read as a missing categorical value.
const MISSING_MARKERS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// One subject. Columns not listed here (the leading index, `id`,
/// `hypertension`, ...) are ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrokeRecord {
    #[serde(deserialize_with = "category")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "measurement")]
    pub age: Option<f64>,
    #[serde(deserialize_with = "category")]
    pub ever_married: Option<String>,
    #[serde(deserialize_with = "category")]
    pub work_type: Option<String>,
    #[serde(rename = "Residence_type", deserialize_with = "category")]
    pub residence_type: Option<String>,
    #[serde(deserialize_with = "measurement")]
    pub avg_glucose_level: Option<f64>,
    #[serde(deserialize_with = "measurement")]
    pub bmi: Option<f64>,
    #[serde(deserialize_with = "category")]
    pub smoking_status: Option<String>,
    pub stroke: i32,
}

/// A number, or `None` for an empty, unparsable or non-finite cell.
fn measurement<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = csv::invalid_option(deserializer)?;
    Ok(value.filter(|v| v.is_finite()))
}

/// A category, or `None` for an empty cell or a missing marker.
fn category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !MISSING_MARKERS.contains(&v.trim())))
}

impl StrokeRecord {
    /// Names from `REQUIRED_COLUMNS` absent from a header row.
    pub fn missing_columns<'a, I>(header: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: Vec<&str> = header.into_iter().map(str::trim).collect();
        REQUIRED_COLUMNS
            .iter()
            .filter(|required| !present.contains(*required))
            .map(|required| required.to_string())
            .collect()
    }

    /// Columnar frame of the records, one column per required field.
    pub fn into_frame(records: &[StrokeRecord]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new(GENDER, column(records, |r| r.gender.clone())),
            Series::new(AGE, column(records, |r| r.age)),
            Series::new(EVER_MARRIED, column(records, |r| r.ever_married.clone())),
            Series::new(WORK_TYPE, column(records, |r| r.work_type.clone())),
            Series::new(RESIDENCE_TYPE, column(records, |r| r.residence_type.clone())),
            Series::new(AVG_GLUCOSE_LEVEL, column(records, |r| r.avg_glucose_level)),
            Series::new(BMI, column(records, |r| r.bmi)),
            Series::new(SMOKING_STATUS, column(records, |r| r.smoking_status.clone())),
            Series::new(STROKE, column(records, |r| r.stroke)),
        ])
    }
}

fn column<T, F>(records: &[StrokeRecord], field: F) -> Vec<T>
where
    F: Fn(&StrokeRecord) -> T,
{
    records.iter().map(field).collect()
}
