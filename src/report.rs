use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::aggregate;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::{AggregationMode, CellValue, Column, Row, SortSpec};
use crate::state::{DashboardState, View};

const EMPTY_HINT: &str = "Enter filters above to view data";
const REPORT_TOP_ROWS: usize = 10;

/// Display text for one cell. Zero scores mark "no data" and render as `-`.
pub fn format_cell(row: &Row, column: Column, mode: AggregationMode) -> String {
    match row.cell(column) {
        CellValue::Text(text) => text.to_string(),
        CellValue::Score(pair) => {
            let value = mode.pick(pair);
            if value == 0.0 {
                "-".to_string()
            } else {
                format!("{value:.2}")
            }
        }
        CellValue::Number(value) if column == Column::ResponseRate => format!("{value:.2}"),
        CellValue::Number(value) => format!("{value}"),
    }
}

fn header_label(column: Column, sort: SortSpec) -> String {
    match sort.key {
        Some(key) if key == column => format!("{} {}", column, sort.direction.arrow()),
        _ => column.to_string(),
    }
}

/// Renders rows as an aligned plain-text table.
pub fn render_table(
    columns: &[Column],
    rows: &[&Row],
    sort: SortSpec,
    mode: AggregationMode,
) -> String {
    let headers: Vec<String> = columns.iter().map(|c| header_label(*c, sort)).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| format_cell(row, *c, mode)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|line| line[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(&headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", rule.join("  "));
    for line in &cells {
        let _ = writeln!(output, "{}", join_padded(line, &widths));
    }
    output
}

fn join_padded(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Renders the current page of a view with its pagination footer.
pub fn render_view(view: &View<'_>) -> String {
    if !view.has_filters {
        return format!("{EMPTY_HINT}\n");
    }

    let page = view.current_page();
    let mut output = String::new();
    if page.items.is_empty() {
        let _ = writeln!(output, "No rows match the active filters.");
    } else {
        output.push_str(&render_table(
            &view.columns,
            page.items,
            view.sort,
            view.aggregation,
        ));
    }
    let _ = writeln!(
        output,
        "Page {} of {} ({} rows, {})",
        page.number,
        page.total_pages,
        page.total_items,
        view.aggregation.label()
    );
    output
}

pub fn render_comparison(columns: &[Column], rows: &[&Row], mode: AggregationMode) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = writeln!(output, "No rows selected for comparison.");
        return output;
    }
    let _ = writeln!(output, "Comparison Table ({} items)", rows.len());
    output.push_str(&render_table(columns, rows, SortSpec::default(), mode));
    output
}

fn markdown_table(output: &mut String, columns: &[Column], rows: &[&Row], mode: AggregationMode) {
    let headers: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let _ = writeln!(output, "| {} |", headers.join(" | "));
    let _ = writeln!(output, "|{}", "---|".repeat(columns.len()));
    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| format_cell(row, *c, mode)).collect();
        let _ = writeln!(output, "| {} |", values.join(" | "));
    }
}

/// Builds a markdown report of the view, score summaries and comparison set.
pub fn build_report(
    state: &DashboardState,
    dataset: &Dataset,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let view = state.view(dataset);
    let mode = view.aggregation;
    let summaries = aggregate::summarize_scores(&view.rows, mode)?;
    let compared = state.comparison(dataset);

    let mut output = String::new();
    let _ = writeln!(output, "# Unit Scores Report");
    let _ = writeln!(
        output,
        "Generated {} over {} rows using {} scores",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        dataset.len(),
        mode.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Filters");

    if state.filters().is_empty() {
        let _ = writeln!(output, "No filters applied.");
    } else {
        for (column, raw) in state.filters() {
            let _ = writeln!(output, "- {column}: `{raw}`");
        }
    }
    let _ = writeln!(output, "{} matching rows.", view.rows.len());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Summary");

    if summaries.is_empty() {
        let _ = writeln!(output, "No rows to summarise.");
    } else {
        let _ = writeln!(output, "| column | mean | median | rows |");
        let _ = writeln!(output, "|---|---|---|---|");
        for summary in &summaries {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {} |",
                summary.column, summary.mean, summary.median, summary.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Rows");

    if view.rows.is_empty() {
        let _ = writeln!(output, "{EMPTY_HINT}.");
    } else {
        let top: Vec<&Row> = view.rows.iter().take(REPORT_TOP_ROWS).copied().collect();
        markdown_table(&mut output, &view.columns, &top, mode);
    }

    if !compared.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Comparison");
        markdown_table(&mut output, &view.columns, &compared, mode);
    }

    Ok(output)
}

/// Writes every row of the view (all pages) as CSV. Returns the row count.
pub fn export_csv(view: &View<'_>, path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(view.columns.iter().map(|c| c.name()))?;

    for row in &view.rows {
        let record: Vec<String> = view
            .columns
            .iter()
            .map(|column| match row.cell(*column) {
                CellValue::Text(text) => text.to_string(),
                CellValue::Number(value) => value.to_string(),
                CellValue::Score(pair) => view.aggregation.pick(pair).to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(rows = view.rows.len(), path = %path.display(), "exported csv");
    Ok(view.rows.len())
}
