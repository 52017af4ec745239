use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Number of evaluated items per unit offering (`I1` through `I13`).
pub const ITEM_COUNT: usize = 13;

/// One score summarised two ways. Deserialised from the `[mean, median]`
/// pairs of the dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ScorePair {
    pub mean: f64,
    pub median: f64,
}

impl ScorePair {
    pub fn new(mean: f64, median: f64) -> Self {
        Self { mean, median }
    }
}

impl From<[f64; 2]> for ScorePair {
    fn from([mean, median]: [f64; 2]) -> Self {
        Self::new(mean, median)
    }
}

impl From<ScorePair> for [f64; 2] {
    fn from(pair: ScorePair) -> Self {
        [pair.mean, pair.median]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Mean,
    Median,
}

impl AggregationMode {
    pub fn pick(self, pair: ScorePair) -> f64 {
        match self {
            AggregationMode::Mean => pair.mean,
            AggregationMode::Median => pair.median,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AggregationMode::Mean => "mean",
            AggregationMode::Median => "median",
        }
    }
}

impl FromStr for AggregationMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(AggregationMode::Mean),
            "median" => Ok(AggregationMode::Median),
            other => Err(EngineError::InvalidCommand(format!(
                "unknown aggregation '{other}' (expected mean or median)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "^",
            SortDirection::Descending => "v",
        }
    }
}

/// Active sort column and direction. `key: None` keeps dataset order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: Option<Column>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn by(key: Column, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(self, column: Column) -> Self {
        let direction = match (self.key, self.direction) {
            (Some(current), SortDirection::Ascending) if current == column => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        Self {
            key: Some(column),
            direction,
        }
    }
}

/// Dataset columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    UnitName,
    UnitCode,
    Season,
    Level,
    Responses,
    Invited,
    ResponseRate,
    /// Item score `I1..=I13`.
    Item(u8),
    AggScore,
}

impl Column {
    pub fn all() -> Vec<Column> {
        let mut columns = vec![
            Column::UnitName,
            Column::UnitCode,
            Column::Season,
            Column::Level,
            Column::Responses,
            Column::Invited,
            Column::ResponseRate,
        ];
        columns.extend((1..=ITEM_COUNT as u8).map(Column::Item));
        columns.push(Column::AggScore);
        columns
    }

    /// Columns shown before the user toggles any.
    pub fn default_visible() -> Vec<Column> {
        Column::all()
            .into_iter()
            .filter(|column| *column != Column::ResponseRate)
            .collect()
    }

    pub fn name(self) -> String {
        match self {
            Column::UnitName => "unit_name".to_string(),
            Column::UnitCode => "unit_code".to_string(),
            Column::Season => "Season".to_string(),
            Column::Level => "Level".to_string(),
            Column::Responses => "Responses".to_string(),
            Column::Invited => "Invited".to_string(),
            Column::ResponseRate => "Response Rate".to_string(),
            Column::Item(index) => format!("I{index}"),
            Column::AggScore => "agg_score".to_string(),
        }
    }

    pub fn is_score(self) -> bool {
        matches!(self, Column::Item(_) | Column::AggScore)
    }

    pub fn score_columns() -> Vec<Column> {
        Column::all().into_iter().filter(|c| c.is_score()).collect()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Column {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let normalized = wanted.replace('_', " ");
        Column::all()
            .into_iter()
            .find(|column| {
                let name = column.name();
                name.eq_ignore_ascii_case(wanted)
                    || name.replace('_', " ").eq_ignore_ascii_case(&normalized)
            })
            .ok_or_else(|| EngineError::UnknownColumn(wanted.to_string()))
    }
}

/// Natural key of a row: unit code plus teaching season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub unit_code: String,
    pub season: String,
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.unit_code, self.season)
    }
}

impl FromStr for RowKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('@') {
            Some((code, season)) if !code.trim().is_empty() && !season.trim().is_empty() => {
                Ok(RowKey {
                    unit_code: code.trim().to_string(),
                    season: season.trim().to_string(),
                })
            }
            _ => Err(EngineError::InvalidRowKey(s.to_string())),
        }
    }
}

/// Raw shape of one dataset element.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Responses")]
    responses: u32,
    #[serde(rename = "Invited")]
    invited: u32,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "Response Rate", default)]
    response_rate: Option<f64>,
    unit_name: String,
    unit_code: String,
    #[serde(rename = "Level")]
    level: f64,
    #[serde(rename = "I1")]
    i1: ScorePair,
    #[serde(rename = "I2")]
    i2: ScorePair,
    #[serde(rename = "I3")]
    i3: ScorePair,
    #[serde(rename = "I4")]
    i4: ScorePair,
    #[serde(rename = "I5")]
    i5: ScorePair,
    #[serde(rename = "I6")]
    i6: ScorePair,
    #[serde(rename = "I7")]
    i7: ScorePair,
    #[serde(rename = "I8")]
    i8: ScorePair,
    #[serde(rename = "I9")]
    i9: ScorePair,
    #[serde(rename = "I10")]
    i10: ScorePair,
    #[serde(rename = "I11")]
    i11: ScorePair,
    #[serde(rename = "I12")]
    i12: ScorePair,
    #[serde(rename = "I13")]
    i13: ScorePair,
    agg_score: ScorePair,
}

impl From<RawRow> for Row {
    fn from(raw: RawRow) -> Self {
        let response_rate = raw.response_rate.unwrap_or_else(|| {
            if raw.invited == 0 {
                0.0
            } else {
                raw.responses as f64 / raw.invited as f64
            }
        });
        Row {
            unit_code: raw.unit_code,
            unit_name: raw.unit_name,
            season: raw.season,
            level: raw.level,
            responses: raw.responses,
            invited: raw.invited,
            response_rate,
            items: [
                raw.i1, raw.i2, raw.i3, raw.i4, raw.i5, raw.i6, raw.i7, raw.i8, raw.i9, raw.i10,
                raw.i11, raw.i12, raw.i13,
            ],
            agg_score: raw.agg_score,
        }
    }
}

/// One unit-offering evaluation record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawRow")]
pub struct Row {
    pub unit_code: String,
    pub unit_name: String,
    pub season: String,
    pub level: f64,
    pub responses: u32,
    pub invited: u32,
    pub response_rate: f64,
    pub items: [ScorePair; ITEM_COUNT],
    pub agg_score: ScorePair,
}

impl Row {
    pub fn key(&self) -> RowKey {
        RowKey {
            unit_code: self.unit_code.clone(),
            season: self.season.clone(),
        }
    }

    pub fn cell(&self, column: Column) -> CellValue<'_> {
        match column {
            Column::UnitName => CellValue::Text(&self.unit_name),
            Column::UnitCode => CellValue::Text(&self.unit_code),
            Column::Season => CellValue::Text(&self.season),
            Column::Level => CellValue::Number(self.level),
            Column::Responses => CellValue::Number(self.responses as f64),
            Column::Invited => CellValue::Number(self.invited as f64),
            Column::ResponseRate => CellValue::Number(self.response_rate),
            Column::Item(index) => {
                let slot = (index as usize).clamp(1, ITEM_COUNT) - 1;
                CellValue::Score(self.items[slot])
            }
            Column::AggScore => CellValue::Score(self.agg_score),
        }
    }
}

/// Borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
    Score(ScorePair),
}

impl CellValue<'_> {
    /// Numeric value under the given mode; `None` for text cells.
    pub fn scalar(&self, mode: AggregationMode) -> Option<f64> {
        match self {
            CellValue::Text(_) => None,
            CellValue::Number(value) => Some(*value),
            CellValue::Score(pair) => Some(mode.pick(*pair)),
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Score(pair) => write!(f, "{},{}", pair.mean, pair.median),
        }
    }
}
