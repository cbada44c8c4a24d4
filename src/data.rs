use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// The tips dataset shipped with the binary.
const BUNDLED_TIPS: &str = include_str!("../data/tips.csv");

/// A column of the tips dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TotalBill,
    Tip,
    Sex,
    Smoker,
    Day,
    Time,
    Size,
}

impl Field {
    /// Columns in dataset order.
    pub const ALL: [Field; 7] = [
        Field::TotalBill,
        Field::Tip,
        Field::Sex,
        Field::Smoker,
        Field::Day,
        Field::Time,
        Field::Size,
    ];

    pub const CATEGORICAL: [Field; 4] = [Field::Sex, Field::Smoker, Field::Day, Field::Time];

    /// Column name as it appears in the CSV header.
    pub fn name(self) -> &'static str {
        match self {
            Field::TotalBill => "total_bill",
            Field::Tip => "tip",
            Field::Sex => "sex",
            Field::Smoker => "smoker",
            Field::Day => "day",
            Field::Time => "time",
            Field::Size => "size",
        }
    }

    /// Human label used by dropdown options.
    pub fn label(self) -> &'static str {
        match self {
            Field::TotalBill => "Total Bill",
            Field::Tip => "Tip",
            Field::Sex => "Sex",
            Field::Smoker => "Smoker",
            Field::Day => "Day",
            Field::Time => "Time",
            Field::Size => "Size",
        }
    }

    pub fn is_categorical(self) -> bool {
        Field::CATEGORICAL.contains(&self)
    }

    /// Parse a column name, rejecting anything outside the fixed column set.
    pub fn parse(name: &str) -> Result<Field> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| DashError::InvalidField(name.to_string()))
    }
}

impl FromStr for Field {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        Field::parse(s)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper-case the first character and lower-case the rest ("day" -> "Day").
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// A single cell value, serialized untagged so charts receive plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datum {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Datum {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Integer(i) => Some(*i as f64),
            Datum::Number(n) => Some(*n),
            Datum::Text(_) => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Integer(i) => write!(f, "{}", i),
            // Whole floats keep one decimal so "2.0" reads as a price, not a count.
            Datum::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            Datum::Number(n) => write!(f, "{}", n),
            Datum::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the tips dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub total_bill: f64,
    pub tip: f64,
    pub sex: String,
    pub smoker: String,
    pub day: String,
    pub time: String,
    pub size: u32,
}

impl Record {
    pub fn value(&self, field: Field) -> Datum {
        match field {
            Field::TotalBill => Datum::Number(self.total_bill),
            Field::Tip => Datum::Number(self.tip),
            Field::Sex => Datum::Text(self.sex.clone()),
            Field::Smoker => Datum::Text(self.smoker.clone()),
            Field::Day => Datum::Text(self.day.clone()),
            Field::Time => Datum::Text(self.time.clone()),
            Field::Size => Datum::Integer(i64::from(self.size)),
        }
    }

    /// Text of a categorical column without cloning; `None` for numeric columns.
    pub fn category(&self, field: Field) -> Option<&str> {
        match field {
            Field::Sex => Some(&self.sex),
            Field::Smoker => Some(&self.smoker),
            Field::Day => Some(&self.day),
            Field::Time => Some(&self.time),
            _ => None,
        }
    }

    fn validate(&self, row: usize) -> std::result::Result<(), String> {
        if !(self.total_bill > 0.0) {
            return Err(format!("row {}: total_bill must be positive, got {}", row, self.total_bill));
        }
        if !(self.tip >= 0.0) {
            return Err(format!("row {}: tip must be non-negative, got {}", row, self.tip));
        }
        if self.size == 0 {
            return Err(format!("row {}: size must be positive", row));
        }
        Ok(())
    }
}

/// Immutable, cheaply cloneable table of records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[Record]>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// The bundled copy of the seaborn `tips` dataset.
    pub fn bundled() -> Result<Self> {
        Self::from_csv_reader(BUNDLED_TIPS.as_bytes(), "bundled tips.csv")
    }

    /// Load from a file; `.json` files are read as an array of objects, anything else as CSV.
    pub fn from_path(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|e| DashError::dataset_load(&origin, e))?;
        let reader = BufReader::new(file);

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_reader(reader, &origin)
        } else {
            Self::from_csv_reader(reader, &origin)
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R, origin: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| DashError::dataset_load(origin, e))?
            .clone();
        for field in Field::ALL {
            if !headers.iter().any(|h| h == field.name()) {
                return Err(DashError::dataset_load(
                    origin,
                    format!("missing column '{}'", field.name()),
                ));
            }
        }

        let records = csv_reader
            .deserialize::<Record>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DashError::dataset_load(origin, e))?;

        Self::validated(records, origin)
    }

    pub fn from_json_reader<R: Read>(reader: R, origin: &str) -> Result<Self> {
        let records: Vec<Record> =
            serde_json::from_reader(reader).map_err(|e| DashError::dataset_load(origin, e))?;
        Self::validated(records, origin)
    }

    fn validated(records: Vec<Record>, origin: &str) -> Result<Self> {
        if records.is_empty() {
            return Err(DashError::dataset_load(origin, "dataset contains no records"));
        }
        for (idx, record) in records.iter().enumerate() {
            record
                .validate(idx + 1)
                .map_err(|reason| DashError::dataset_load(origin, reason))?;
        }
        tracing::debug!(origin, rows = records.len(), "dataset loaded");
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column list in dataset order.
    pub fn columns(&self) -> &'static [Field] {
        &Field::ALL
    }
}
