use std::cmp::Ordering;

use crate::models::{AggregationMode, CellValue, Row, SortDirection, SortSpec};

/// Three-way comparison of two rows under the active sort and mode.
pub fn compare_rows(a: &Row, b: &Row, sort: SortSpec, mode: AggregationMode) -> Ordering {
    let Some(column) = sort.key else {
        return Ordering::Equal;
    };

    let ordering = compare_cells(a.cell(column), b.cell(column), mode);
    match sort.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn compare_cells(a: CellValue<'_>, b: CellValue<'_>, mode: AggregationMode) -> Ordering {
    match (a, b) {
        (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        (a, b) => match (a.scalar(mode), b.scalar(mode)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

/// Sorts a filtered sequence. The sort is stable, so ties keep their order.
pub fn sort_rows<'a>(
    mut rows: Vec<&'a Row>,
    sort: SortSpec,
    mode: AggregationMode,
) -> Vec<&'a Row> {
    if sort.key.is_some() {
        rows.sort_by(|a, b| compare_rows(a, b, sort, mode));
    }
    rows
}
