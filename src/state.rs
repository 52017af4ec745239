//! Dashboard state and the views derived from it.
//!
//! `DashboardState` is an immutable value: every transition consumes the old
//! state and returns a new one. Views are recomputed from the dataset and the
//! current state on demand (filter, then sort, then paginate) and borrow the
//! dataset rows rather than copying them.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::dataset::Dataset;
use crate::filter;
use crate::models::{AggregationMode, Column, Row, RowKey, SortSpec};
use crate::page::{self, Page};
use crate::sort;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    filters: BTreeMap<Column, String>,
    sort: SortSpec,
    aggregation: AggregationMode,
    page: usize,
    visible: BTreeSet<Column>,
    selected: BTreeSet<RowKey>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            sort: SortSpec::default(),
            aggregation: AggregationMode::default(),
            page: 1,
            visible: Column::default_visible().into_iter().collect(),
            selected: BTreeSet::new(),
        }
    }
}

impl DashboardState {
    pub fn filters(&self) -> &BTreeMap<Column, String> {
        &self.filters
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn aggregation(&self) -> AggregationMode {
        self.aggregation
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> Vec<Column> {
        self.visible.iter().copied().collect()
    }

    /// Sets (or, when blank, removes) a column filter and returns to page 1.
    pub fn with_filter(mut self, column: Column, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.trim().is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, raw);
        }
        self.page = 1;
        self
    }

    pub fn clear_filters(mut self) -> Self {
        self.filters.clear();
        self.page = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn toggle_sort(mut self, column: Column) -> Self {
        self.sort = self.sort.toggle(column);
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Moves to `page`, clamped to the pages the current filters produce.
    pub fn go_to_page(mut self, page: usize, dataset: &Dataset) -> Self {
        let len = self.matching(dataset).len();
        self.page = page::clamp_page(page, len);
        self
    }

    pub fn next_page(self, dataset: &Dataset) -> Self {
        let target = self.page.saturating_add(1);
        self.go_to_page(target, dataset)
    }

    pub fn prev_page(self, dataset: &Dataset) -> Self {
        let target = self.page.saturating_sub(1);
        self.go_to_page(target, dataset)
    }

    pub fn toggle_column(mut self, column: Column) -> Self {
        if !self.visible.remove(&column) {
            self.visible.insert(column);
        }
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.visible = columns.into_iter().collect();
        self
    }

    pub fn select(mut self, key: RowKey) -> Self {
        self.selected.insert(key);
        self
    }

    pub fn deselect(mut self, key: &RowKey) -> Self {
        self.selected.remove(key);
        self
    }

    pub fn clear_selection(mut self) -> Self {
        self.selected.clear();
        self
    }

    fn matching<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Row> {
        filter::filter_rows(dataset.rows(), &self.filters, self.aggregation)
    }

    /// Filters and sorts the dataset under this state.
    pub fn view<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        let rows = sort::sort_rows(self.matching(dataset), self.sort, self.aggregation);
        let page = page::clamp_page(self.page, rows.len());
        debug!(rows = rows.len(), page, "view recomputed");
        View {
            rows,
            page,
            aggregation: self.aggregation,
            sort: self.sort,
            columns: self.visible_columns(),
            has_filters: !filter::active_filters(&self.filters).is_empty(),
        }
    }

    /// Selected rows in dataset order, regardless of the current filters.
    pub fn comparison<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Row> {
        dataset
            .rows()
            .iter()
            .filter(|row| self.selected.contains(&row.key()))
            .collect()
    }
}

/// Filtered and sorted rows plus the settings they were produced under.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub rows: Vec<&'a Row>,
    pub page: usize,
    pub aggregation: AggregationMode,
    pub sort: SortSpec,
    pub columns: Vec<Column>,
    pub has_filters: bool,
}

impl<'a> View<'a> {
    pub fn current_page(&self) -> Page<'_, &'a Row> {
        page::paginate(&self.rows, self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_row;
    use crate::models::SortDirection;

    fn scenario() -> Dataset {
        Dataset::new(vec![
            sample_row("FIT1045", "S1", (3.0, 3.0)),
            sample_row("FIT2004", "S1", (4.5, 4.0)),
            sample_row("FIT3155", "S1", (2.0, 2.5)),
        ])
        .unwrap()
    }

    fn large(count: usize) -> Dataset {
        Dataset::new(
            (0..count)
                .map(|i| sample_row(&format!("UNIT{i:04}"), "S1", (4.0, 4.0)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn unfiltered_view_is_empty() {
        let dataset = scenario();
        let view = DashboardState::default().view(&dataset);
        assert!(view.rows.is_empty());
        assert!(!view.has_filters);
        assert_eq!(view.current_page().total_pages, 1);
        assert!(view.current_page().items.is_empty());
    }

    #[test]
    fn filter_then_sort_end_to_end() {
        let dataset = scenario();
        let state = DashboardState::default().with_filter(Column::AggScore, ">=3");

        let view = state.view(&dataset);
        let codes: Vec<&str> = view.rows.iter().map(|r| r.unit_code.as_str()).collect();
        assert_eq!(codes, vec!["FIT1045", "FIT2004"]);

        let sorted = state
            .with_sort(SortSpec::by(Column::AggScore, SortDirection::Descending))
            .view(&dataset);
        let scores: Vec<f64> = sorted.rows.iter().map(|r| r.agg_score.mean).collect();
        assert_eq!(scores, vec![4.5, 3.0]);
    }

    #[test]
    fn median_mode_changes_score_filter_only() {
        let dataset = scenario();
        let state = DashboardState::default()
            .with_filter(Column::AggScore, ">=2.5")
            .with_aggregation(AggregationMode::Median);
        assert_eq!(state.view(&dataset).rows.len(), 3);

        let by_code = DashboardState::default().with_filter(Column::UnitCode, "fit");
        assert_eq!(by_code.clone().view(&dataset).rows.len(), 3);
        assert_eq!(
            by_code
                .with_aggregation(AggregationMode::Median)
                .view(&dataset)
                .rows
                .len(),
            3
        );
    }

    #[test]
    fn page_navigation_is_clamped() {
        let dataset = large(120);
        let state = DashboardState::default().with_filter(Column::UnitCode, "unit");
        assert_eq!(state.view(&dataset).current_page().total_pages, 3);

        let state = state.go_to_page(4, &dataset);
        assert_eq!(state.page(), 3);
        let state = state.next_page(&dataset);
        assert_eq!(state.page(), 3);
        let view = state.view(&dataset);
        assert_eq!(view.current_page().items.len(), 20);

        let state = state.go_to_page(1, &dataset).prev_page(&dataset);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn changing_a_filter_resets_page() {
        let dataset = large(120);
        let state = DashboardState::default()
            .with_filter(Column::UnitCode, "unit")
            .go_to_page(3, &dataset);
        assert_eq!(state.page(), 3);

        let state = state.with_filter(Column::Season, "s1");
        assert_eq!(state.page(), 1);

        let state = state.go_to_page(2, &dataset).clear_filters();
        assert_eq!(state.page(), 1);
        assert!(state.filters().is_empty());
    }

    #[test]
    fn blank_filter_removes_column() {
        let state = DashboardState::default()
            .with_filter(Column::UnitCode, "fit")
            .with_filter(Column::UnitCode, "");
        assert!(state.filters().is_empty());
    }

    #[test]
    fn selection_survives_other_transitions() {
        let dataset = scenario();
        let key: RowKey = "FIT3155@S1".parse().unwrap();
        let state = DashboardState::default()
            .select(key.clone())
            .select("FIT1045@S1".parse().unwrap())
            .with_filter(Column::AggScore, ">=4")
            .toggle_sort(Column::AggScore)
            .next_page(&dataset)
            .with_aggregation(AggregationMode::Median);

        let compared: Vec<&str> = state
            .comparison(&dataset)
            .iter()
            .map(|r| r.unit_code.as_str())
            .collect();
        assert_eq!(compared, vec!["FIT1045", "FIT3155"]);

        let state = state.deselect(&key);
        assert_eq!(state.comparison(&dataset).len(), 1);
        assert!(state.clear_selection().comparison(&dataset).is_empty());
    }

    #[test]
    fn column_toggle_keeps_display_order() {
        let state = DashboardState::default()
            .toggle_column(Column::ResponseRate)
            .toggle_column(Column::UnitName);
        let columns = state.visible_columns();
        assert_eq!(columns[0], Column::UnitCode);
        assert_eq!(columns[5], Column::ResponseRate);
        assert_eq!(*columns.last().unwrap(), Column::AggScore);
    }
}
