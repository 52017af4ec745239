use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::models::{CellValue, Column, Row, RowKey};

/// The evaluation rows, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    /// Builds a dataset, rejecting rows that repeat a `(unit_code, Season)`
    /// pair or carry a negative score.
    pub fn new(rows: Vec<Row>) -> Result<Self> {
        let mut seen: HashSet<RowKey> = HashSet::with_capacity(rows.len());
        for row in &rows {
            check_scores(row)?;
            let key = row.key();
            if !seen.insert(key.clone()) {
                return Err(EngineError::DuplicateRow {
                    unit_code: key.unit_code,
                    season: key.season,
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Row> = serde_json::from_str(json)?;
        Self::new(rows)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading dataset");
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&json)?;
        info!(rows = dataset.len(), path = %path.display(), "dataset loaded");
        Ok(dataset)
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

    pub fn find(&self, key: &RowKey) -> Option<&Row> {
        self.rows
            .iter()
            .find(|row| row.unit_code == key.unit_code && row.season == key.season)
    }
}

fn check_scores(row: &Row) -> Result<()> {
    for column in Column::score_columns() {
        if let CellValue::Score(pair) = row.cell(column) {
            if pair.mean < 0.0 || pair.median < 0.0 {
                return Err(EngineError::InvalidScore {
                    unit_code: row.unit_code.clone(),
                    season: row.season.clone(),
                    column: column.name(),
                });
            }
        }
    }
    Ok(())
}
