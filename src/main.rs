use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod dataset;
mod error;
mod filter;
mod models;
mod page;
mod report;
mod shell;
mod sort;
mod state;

use dataset::Dataset;
use error::EngineError;
use models::{AggregationMode, Column, RowKey, SortDirection, SortSpec};
use state::DashboardState;

#[derive(Parser)]
#[command(name = "unit-scores")]
#[command(about = "Filter, sort and compare unit evaluation scores", long_about = None)]
struct Cli {
    /// JSON dataset of unit evaluation rows
    #[arg(long, global = true, env = "UNIT_SCORES_DATA", default_value = "public/data.json")]
    data: PathBuf,
    /// How score pairs are read for filtering, sorting and display
    #[arg(long, global = true, value_enum, default_value = "mean")]
    agg: AggregationMode,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Column filter, e.g. agg_score:>=4.2 or unit_name:engineering (repeatable)
    #[arg(long = "filter", value_name = "COLUMN:EXPR", value_parser = parse_filter_arg)]
    filters: Vec<(Column, String)>,
    /// Column to sort by
    #[arg(long)]
    sort: Option<Column>,
    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    desc: bool,
    /// Comma-separated columns to show instead of the default set
    #[arg(long, value_delimiter = ',')]
    columns: Vec<Column>,
}

impl ViewArgs {
    fn state(&self, agg: AggregationMode) -> DashboardState {
        let mut state = DashboardState::default().with_aggregation(agg);
        for (column, expr) in &self.filters {
            state = state.with_filter(*column, expr.as_str());
        }
        if let Some(column) = self.sort {
            let direction = if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            state = state.with_sort(SortSpec::by(column, direction));
        }
        if !self.columns.is_empty() {
            state = state.with_columns(self.columns.iter().copied());
        }
        state
    }
}

fn parse_filter_arg(raw: &str) -> Result<(Column, String), EngineError> {
    let (column, expr) = raw.split_once(':').ok_or_else(|| {
        EngineError::InvalidCommand(format!("filter '{raw}' must look like COLUMN:EXPR"))
    })?;
    Ok((column.parse()?, expr.to_string()))
}

#[derive(Subcommand)]
enum Commands {
    /// Print one page of the filtered, sorted rows
    Query {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Print selected rows side by side
    Compare {
        /// Row to compare as CODE@SEASON (repeatable)
        #[arg(long = "row", required = true)]
        rows: Vec<RowKey>,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<Column>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        /// Rows to include in the comparison section (CODE@SEASON)
        #[arg(long = "row")]
        rows: Vec<RowKey>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export every filtered, sorted row as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long)]
        out: PathBuf,
    },
    /// Explore the dataset interactively
    Shell {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the column identifiers
    Columns,
}

fn select_rows(mut state: DashboardState, rows: &[RowKey], dataset: &Dataset) -> DashboardState {
    for key in rows {
        if dataset.find(key).is_none() {
            warn!(row = %key, "row not found in dataset");
        }
        state = state.select(key.clone());
    }
    state
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unit_scores=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::Columns = cli.command {
        for column in Column::all() {
            println!("{column}");
        }
        return Ok(());
    }

    let dataset = Dataset::load(&cli.data)
        .with_context(|| format!("failed to load dataset from {}", cli.data.display()))?;
    if dataset.is_empty() {
        warn!(path = %cli.data.display(), "dataset has no rows");
    }

    match cli.command {
        Commands::Query { view, page } => {
            let state = view.state(cli.agg).go_to_page(page, &dataset);
            print!("{}", report::render_view(&state.view(&dataset)));
        }
        Commands::Compare { rows, columns } => {
            let mut state = DashboardState::default().with_aggregation(cli.agg);
            if !columns.is_empty() {
                state = state.with_columns(columns);
            }
            let state = select_rows(state, &rows, &dataset);
            print!(
                "{}",
                report::render_comparison(
                    &state.visible_columns(),
                    &state.comparison(&dataset),
                    state.aggregation(),
                )
            );
        }
        Commands::Report { view, rows, out } => {
            let state = select_rows(view.state(cli.agg), &rows, &dataset);
            let markdown = report::build_report(&state, &dataset, chrono::Utc::now())?;
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
        Commands::Export { view, out } => {
            let state = view.state(cli.agg);
            let written = report::export_csv(&state.view(&dataset), &out)
                .with_context(|| format!("failed to export to {}", out.display()))?;
            println!("Exported {written} rows to {}.", out.display());
        }
        Commands::Shell { view } => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            shell::run(&dataset, view.state(cli.agg), stdin.lock(), stdout.lock())?;
        }
        Commands::Columns => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_arguments_split_on_first_colon() {
        let (column, expr) = parse_filter_arg("Season:!=S1:extra").unwrap();
        assert_eq!(column, Column::Season);
        assert_eq!(expr, "!=S1:extra");
        assert!(parse_filter_arg("agg_score>=3").is_err());
        assert!(parse_filter_arg("nope:>=3").is_err());
    }

    #[test]
    fn view_arguments_build_state() {
        let cli = Cli::try_parse_from([
            "unit-scores",
            "--agg",
            "median",
            "query",
            "--filter",
            "agg_score:>=3",
            "--sort",
            "agg_score",
            "--desc",
            "--columns",
            "unit_code,agg_score",
            "--page",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.agg, AggregationMode::Median);

        let Commands::Query { view, page } = cli.command else {
            panic!("expected query");
        };
        assert_eq!(page, 2);
        let state = view.state(cli.agg);
        assert_eq!(state.aggregation(), AggregationMode::Median);
        assert_eq!(state.filters().get(&Column::AggScore).unwrap(), ">=3");
        assert_eq!(
            state.sort(),
            SortSpec::by(Column::AggScore, SortDirection::Descending)
        );
        assert_eq!(state.visible_columns(), vec![Column::UnitCode, Column::AggScore]);
    }
}
