use std::cmp::Ordering;

use crate::error::{EngineError, Result};
use crate::models::{AggregationMode, Column, Row};

/// Reduces a sequence of values to one scalar.
///
/// The median takes the element at `floor(n / 2)` of the sorted values, so
/// even-length input yields the upper middle element rather than an average.
pub fn reduce(values: &[f64], mode: AggregationMode) -> Result<f64> {
    if values.is_empty() {
        return Err(EngineError::EmptyAggregation);
    }

    match mode {
        AggregationMode::Mean => Ok(values.iter().sum::<f64>() / values.len() as f64),
        AggregationMode::Median => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            Ok(sorted[sorted.len() / 2])
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: Column,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

/// Summarises every score column over `rows`, reading each cell under `mode`.
/// Returns nothing for an empty row set.
pub fn summarize_scores(rows: &[&Row], mode: AggregationMode) -> Result<Vec<ColumnSummary>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    Column::score_columns()
        .into_iter()
        .map(|column| -> Result<ColumnSummary> {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.cell(column).scalar(mode))
                .collect();
            Ok(ColumnSummary {
                column,
                mean: reduce(&values, AggregationMode::Mean)?,
                median: reduce(&values, AggregationMode::Median)?,
                count: values.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_row;

    #[test]
    fn mean_is_arithmetic_average() {
        let mean = reduce(&[4.2, 4.0], AggregationMode::Mean).unwrap();
        assert!((mean - 4.1).abs() < 1e-9);
    }

    #[test]
    fn median_takes_upper_middle_for_even_input() {
        assert_eq!(reduce(&[4.0, 1.0, 3.0, 2.0], AggregationMode::Median).unwrap(), 3.0);
        assert_eq!(reduce(&[5.0, 1.0, 3.0], AggregationMode::Median).unwrap(), 3.0);
        assert_eq!(reduce(&[2.5], AggregationMode::Median).unwrap(), 2.5);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            reduce(&[], AggregationMode::Mean),
            Err(EngineError::EmptyAggregation)
        ));
        assert!(matches!(
            reduce(&[], AggregationMode::Median),
            Err(EngineError::EmptyAggregation)
        ));
    }

    #[test]
    fn summaries_follow_selected_mode() {
        let a = sample_row("A", "S1", (3.0, 2.0));
        let b = sample_row("B", "S1", (5.0, 4.0));
        let rows = vec![&a, &b];

        let by_mean = summarize_scores(&rows, AggregationMode::Mean).unwrap();
        let agg = by_mean
            .iter()
            .find(|s| s.column == Column::AggScore)
            .unwrap();
        assert_eq!(agg.count, 2);
        assert!((agg.mean - 4.0).abs() < 1e-9);
        assert_eq!(agg.median, 5.0);

        let by_median = summarize_scores(&rows, AggregationMode::Median).unwrap();
        let agg = by_median
            .iter()
            .find(|s| s.column == Column::AggScore)
            .unwrap();
        assert!((agg.mean - 3.0).abs() < 1e-9);
        assert_eq!(by_median.len(), 14);
        assert!(summarize_scores(&[], AggregationMode::Mean).unwrap().is_empty());
    }
}
