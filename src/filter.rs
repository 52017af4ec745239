//! Per-column filter expressions: parsing, evaluation against a cell, and
//! dataset-level filtering.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{AggregationMode, CellValue, Column, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterOrEqual,
    LessOrEqual,
    NotEqual,
    Greater,
    Less,
    Equal,
}

impl Comparison {
    /// Match order when scanning a filter string: `>=` before `>`, and `!=`
    /// before `=`.
    pub const PRIORITY: [Comparison; 6] = [
        Comparison::GreaterOrEqual,
        Comparison::LessOrEqual,
        Comparison::Greater,
        Comparison::Less,
        Comparison::NotEqual,
        Comparison::Equal,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::NotEqual => "!=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "=",
        }
    }

    pub fn compare_numbers(self, cell: f64, operand: f64) -> bool {
        match self {
            Comparison::GreaterOrEqual => cell >= operand,
            Comparison::LessOrEqual => cell <= operand,
            Comparison::NotEqual => cell != operand,
            Comparison::Greater => cell > operand,
            Comparison::Less => cell < operand,
            Comparison::Equal => cell == operand,
        }
    }

    pub fn compare_text(self, cell: &str, operand: &str) -> bool {
        match self {
            Comparison::GreaterOrEqual => cell >= operand,
            Comparison::LessOrEqual => cell <= operand,
            Comparison::NotEqual => cell != operand,
            Comparison::Greater => cell > operand,
            Comparison::Less => cell < operand,
            Comparison::Equal => cell == operand,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Operand::Number(value),
            _ => Operand::Text(trimmed.to_string()),
        }
    }
}

/// Parsed form of one column's filter string.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Contains(String),
    Compare { op: Comparison, operand: Operand },
}

/// Parses a filter string. Blank input means "no filter".
pub fn parse_filter(input: &str) -> Option<FilterSpec> {
    if input.trim().is_empty() {
        return None;
    }

    let matched = Comparison::PRIORITY
        .iter()
        .find_map(|op| input.find(op.token()).map(|at| (*op, at)));

    let spec = match matched {
        Some((op, at)) => FilterSpec::Compare {
            op,
            operand: Operand::parse(&input[at + op.token().len()..]),
        },
        None => FilterSpec::Contains(input.trim().to_string()),
    };
    Some(spec)
}

/// Evaluates a filter against one cell.
///
/// A text operand against a numeric cell is an error; callers decide how to
/// treat it (the row filter fails closed). A numeric operand against a text
/// cell is never equal to it; ordering comparisons read the cell as a number
/// and are false when it is not one.
pub fn evaluate(cell: CellValue<'_>, spec: &FilterSpec, mode: AggregationMode) -> Result<bool> {
    match spec {
        FilterSpec::Contains(needle) => Ok(cell
            .to_string()
            .to_lowercase()
            .contains(&needle.to_lowercase())),
        FilterSpec::Compare { op, operand } => match (cell, operand) {
            (CellValue::Text(text), Operand::Text(value)) => Ok(op.compare_text(text, value)),
            (CellValue::Text(text), Operand::Number(value)) => Ok(match op {
                Comparison::Equal => false,
                Comparison::NotEqual => true,
                _ => text
                    .trim()
                    .parse::<f64>()
                    .is_ok_and(|number| op.compare_numbers(number, *value)),
            }),
            (CellValue::Number(number), Operand::Number(value)) => {
                Ok(op.compare_numbers(number, *value))
            }
            (CellValue::Score(pair), Operand::Number(value)) => {
                Ok(op.compare_numbers(mode.pick(pair), *value))
            }
            (CellValue::Number(_) | CellValue::Score(_), Operand::Text(value)) => {
                Err(EngineError::NonNumericOperand(value.clone()))
            }
        },
    }
}

/// Non-blank filters, parsed, in column order.
pub fn active_filters(filters: &BTreeMap<Column, String>) -> Vec<(Column, FilterSpec)> {
    filters
        .iter()
        .filter_map(|(column, raw)| parse_filter(raw).map(|spec| (*column, spec)))
        .collect()
}

/// Rows satisfying every active filter. With no active filter the result is
/// empty: the view only shows data once the user asks for some.
pub fn filter_rows<'a>(
    rows: &'a [Row],
    filters: &BTreeMap<Column, String>,
    mode: AggregationMode,
) -> Vec<&'a Row> {
    let active = active_filters(filters);
    if active.is_empty() {
        debug!("no active filters, view is empty");
        return Vec::new();
    }

    let mut rejected = 0usize;
    let matched: Vec<&Row> = rows
        .iter()
        .filter(|row| {
            active.iter().all(|(column, spec)| {
                match evaluate(row.cell(*column), spec, mode) {
                    Ok(keep) => keep,
                    Err(err) => {
                        rejected += 1;
                        debug!(column = %column, error = %err, "filter failed closed");
                        false
                    }
                }
            })
        })
        .collect();

    debug!(
        filters = active.len(),
        matched = matched.len(),
        failed_closed = rejected,
        mode = mode.label(),
        "filtered rows"
    );
    matched
}
