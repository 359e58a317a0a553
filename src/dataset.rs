use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{DupcheckError, DupcheckResult};

/// Tokens read as a missing value, whatever the column type.
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_TOKENS: &[&str] = &["True", "TRUE", "true"];
const FALSE_TOKENS: &[&str] = &["False", "FALSE", "false"];

/// A single scalar value after type coercion.
#[derive(Debug, Clone)]
pub enum Cell {
    Empty,
    Integer(i64),
    /// Integer literal above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl Cell {
    // -0.0 and 0.0 compare equal, as do all NaN payloads
    fn float_key(value: f64) -> u64 {
        if value == 0.0 {
            0.0f64.to_bits()
        } else if value.is_nan() {
            f64::NAN.to_bits()
        } else {
            value.to_bits()
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => true,
            (Cell::Integer(a), Cell::Integer(b)) => a == b,
            (Cell::Unsigned(a), Cell::Unsigned(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => Cell::float_key(*a) == Cell::float_key(*b),
            (Cell::Boolean(a), Cell::Boolean(b)) => a == b,
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Empty => {}
            Cell::Integer(v) => v.hash(state),
            Cell::Unsigned(v) => v.hash(state),
            Cell::Float(v) => Cell::float_key(*v).hash(state),
            Cell::Boolean(v) => v.hash(state),
            Cell::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Unsigned(v) => write!(f, "{}", v),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Boolean(true) => f.write_str("True"),
            Cell::Boolean(false) => f.write_str("False"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

pub type Row = Vec<Cell>;

/// Type inferred for a column from all of its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Empty,
    Integer,
    Unsigned,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    fn infer<'a>(values: impl Iterator<Item = &'a str> + Clone) -> Self {
        if values.clone().next().is_none() {
            return ColumnKind::Empty;
        }
        if values.clone().all(|v| v.parse::<i64>().is_ok()) {
            ColumnKind::Integer
        } else if values.clone().all(|v| v.parse::<u64>().is_ok()) {
            ColumnKind::Unsigned
        } else if values.clone().all(is_exact_float) {
            ColumnKind::Float
        } else if values.clone().all(|v| parse_bool(v).is_some()) {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    fn coerce(self, raw: Option<&str>) -> Cell {
        let Some(raw) = raw else {
            return Cell::Empty;
        };
        match self {
            ColumnKind::Empty => Cell::Empty,
            ColumnKind::Integer => raw
                .parse()
                .map(Cell::Integer)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
            ColumnKind::Unsigned => raw
                .parse()
                .map(Cell::Unsigned)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
            ColumnKind::Float => raw
                .parse()
                .map(Cell::Float)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
            ColumnKind::Boolean => parse_bool(raw)
                .map(Cell::Boolean)
                .unwrap_or_else(|| Cell::Text(raw.to_string())),
            ColumnKind::Text => Cell::Text(raw.to_string()),
        }
    }
}

/// Largest integer every smaller magnitude of which has an exact `f64`
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// Parses as `f64` without collapsing distinct integer literals.
fn is_exact_float(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits
            .parse::<u64>()
            .map_or(false, |v| v <= MAX_EXACT_FLOAT_INT);
    }
    raw.parse::<f64>().is_ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    if TRUE_TOKENS.contains(&raw) {
        Some(true)
    } else if FALSE_TOKENS.contains(&raw) {
        Some(false)
    } else {
        None
    }
}

fn is_missing(raw: &str) -> bool {
    MISSING_VALUE_TOKENS.contains(&raw)
}

/// Tabular data read from an uploaded CSV.
///
/// Every row holds exactly one cell per column, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse comma-separated bytes with a header row.
    pub fn from_csv(bytes: &[u8]) -> DupcheckResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers().map_err(parse_error)?.clone();
        if headers.is_empty() || is_blank(&headers) {
            return Err(DupcheckError::Parse(
                "No columns to parse from file".to_string(),
            ));
        }
        let columns = unique_columns(&headers);
        let width = columns.len();

        let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(parse_error)?;
            if is_blank(&record) {
                continue;
            }
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(DupcheckError::Parse(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                )));
            }
            let mut raw: Vec<Option<String>> = record
                .iter()
                .map(|field| (!is_missing(field)).then(|| field.to_string()))
                .collect();
            raw.resize(width, None);
            raw_rows.push(raw);
        }

        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| {
                ColumnKind::infer(
                    raw_rows
                        .iter()
                        .filter_map(move |row| row[col].as_deref()),
                )
            })
            .collect();

        let rows: Vec<Row> = raw_rows
            .iter()
            .map(|raw| {
                raw.iter()
                    .zip(&kinds)
                    .map(|(value, kind)| kind.coerce(value.as_deref()))
                    .collect::<Row>()
            })
            .collect();

        Ok(Self { columns, rows })
    }
}

fn parse_error(err: csv::Error) -> DupcheckError {
    DupcheckError::Parse(err.to_string())
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).map_or(true, str::is_empty)
}

/// Make header names unique: later repeats of `a` become `a.1`, `a.2`, and
/// blank names become `Unnamed: <position>`.
fn unique_columns(headers: &StringRecord) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (position, header) in headers.iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", position)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 0;
        while used.contains(&name) {
            suffix += 1;
            name = format!("{}.{}", base, suffix);
        }
        used.insert(name.clone());
        columns.push(name);
    }

    columns
}
