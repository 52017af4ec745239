//! Line-oriented interactive session over the dashboard state.

use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::error::{EngineError, Result};
use crate::models::{AggregationMode, Column, RowKey};
use crate::report;
use crate::state::DashboardState;

const HELP: &str = "\
commands:
  filter COLUMN [EXPR]   set a filter (no EXPR removes it), e.g. filter agg_score >=4.2
  clear                  remove every filter
  sort COLUMN            sort by COLUMN, again to flip direction
  agg mean|median        choose how score pairs are read
  page N|next|prev       move between pages
  select CODE@SEASON     add a row to the comparison set
  unselect CODE@SEASON   remove a row from the comparison set
  unselect-all           empty the comparison set
  toggle COLUMN          show or hide a column
  compare                show the comparison table
  show                   show the current page
  help                   show this text
  quit                   leave the session
multi-word columns use underscores (response_rate)";

#[derive(Debug, Clone, PartialEq)]
pub enum PageMove {
    To(usize),
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Filter { column: Column, expr: String },
    Clear,
    Sort(Column),
    Aggregate(AggregationMode),
    Page(PageMove),
    Select(RowKey),
    Unselect(RowKey),
    UnselectAll,
    Toggle(Column),
    Compare,
    Show,
    Help,
    Quit,
}

fn required<'a>(arg: Option<&'a str>, usage: &str) -> Result<&'a str> {
    match arg.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(EngineError::InvalidCommand(format!("usage: {usage}"))),
    }
}

impl FromStr for ShellCommand {
    type Err = EngineError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim())),
            None => (line, None),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "filter" => {
                let rest = required(rest, "filter COLUMN [EXPR]")?;
                let (column, expr) = match rest.split_once(char::is_whitespace) {
                    Some((column, expr)) => (column, expr.trim()),
                    None => (rest, ""),
                };
                ShellCommand::Filter {
                    column: column.parse()?,
                    expr: expr.to_string(),
                }
            }
            "clear" => ShellCommand::Clear,
            "sort" => ShellCommand::Sort(required(rest, "sort COLUMN")?.parse()?),
            "agg" => ShellCommand::Aggregate(required(rest, "agg mean|median")?.parse()?),
            "page" => {
                let target = required(rest, "page N|next|prev")?;
                let step = match target.to_ascii_lowercase().as_str() {
                    "next" => PageMove::Next,
                    "prev" => PageMove::Prev,
                    number => PageMove::To(number.parse().map_err(|_| {
                        EngineError::InvalidCommand(format!("'{target}' is not a page number"))
                    })?),
                };
                ShellCommand::Page(step)
            }
            "select" => ShellCommand::Select(required(rest, "select CODE@SEASON")?.parse()?),
            "unselect" => ShellCommand::Unselect(required(rest, "unselect CODE@SEASON")?.parse()?),
            "unselect-all" => ShellCommand::UnselectAll,
            "toggle" => ShellCommand::Toggle(required(rest, "toggle COLUMN")?.parse()?),
            "compare" => ShellCommand::Compare,
            "show" => ShellCommand::Show,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => {
                return Err(EngineError::InvalidCommand(format!(
                    "unknown command '{other}', try help"
                )))
            }
        };
        Ok(command)
    }
}

/// Applies one command to the state.
pub fn apply(state: DashboardState, command: &ShellCommand, dataset: &Dataset) -> DashboardState {
    match command {
        ShellCommand::Filter { column, expr } => state.with_filter(*column, expr.as_str()),
        ShellCommand::Clear => state.clear_filters(),
        ShellCommand::Sort(column) => state.toggle_sort(*column),
        ShellCommand::Aggregate(mode) => state.with_aggregation(*mode),
        ShellCommand::Page(PageMove::To(page)) => state.go_to_page(*page, dataset),
        ShellCommand::Page(PageMove::Next) => state.next_page(dataset),
        ShellCommand::Page(PageMove::Prev) => state.prev_page(dataset),
        ShellCommand::Select(key) => {
            if dataset.find(key).is_none() {
                warn!(row = %key, "selected row is not in the dataset");
            }
            state.select(key.clone())
        }
        ShellCommand::Unselect(key) => state.deselect(key),
        ShellCommand::UnselectAll => state.clear_selection(),
        ShellCommand::Toggle(column) => state.toggle_column(*column),
        ShellCommand::Compare | ShellCommand::Show | ShellCommand::Help | ShellCommand::Quit => {
            state
        }
    }
}

/// Reads commands from `input` until `quit` or end of input, writing each
/// re-rendered view to `out`. Returns the final state.
pub fn run<R: BufRead, W: Write>(
    dataset: &Dataset,
    initial: DashboardState,
    input: R,
    mut out: W,
) -> Result<DashboardState> {
    let mut state = initial;
    write!(out, "{}", report::render_view(&state.view(dataset)))?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        debug!(?command, page = state.page(), "shell command");

        state = apply(state, &command, dataset);
        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Compare => write!(
                out,
                "{}",
                report::render_comparison(
                    &state.visible_columns(),
                    &state.comparison(dataset),
                    state.aggregation(),
                )
            )?,
            _ => write!(out, "{}", report::render_view(&state.view(dataset)))?,
        }
        out.flush()?;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_row;
    use crate::models::{SortDirection, SortSpec};

    fn dataset() -> Dataset {
        Dataset::new(vec![
            sample_row("FIT1045", "S1", (3.0, 3.0)),
            sample_row("FIT2004", "S1", (4.5, 4.0)),
            sample_row("FIT3155", "S1", (2.0, 2.5)),
        ])
        .unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            "filter agg_score >= 4.2".parse::<ShellCommand>().unwrap(),
            ShellCommand::Filter {
                column: Column::AggScore,
                expr: ">= 4.2".to_string(),
            }
        );
        assert_eq!(
            "filter unit_name".parse::<ShellCommand>().unwrap(),
            ShellCommand::Filter {
                column: Column::UnitName,
                expr: String::new(),
            }
        );
        assert_eq!(
            "page next".parse::<ShellCommand>().unwrap(),
            ShellCommand::Page(PageMove::Next)
        );
        assert_eq!(
            "PAGE 3".parse::<ShellCommand>().unwrap(),
            ShellCommand::Page(PageMove::To(3))
        );
        assert_eq!(
            "agg median".parse::<ShellCommand>().unwrap(),
            ShellCommand::Aggregate(AggregationMode::Median)
        );
        assert_eq!(
            "toggle response_rate".parse::<ShellCommand>().unwrap(),
            ShellCommand::Toggle(Column::ResponseRate)
        );
    }

    #[test]
    fn rejects_bad_commands() {
        assert!("launch".parse::<ShellCommand>().is_err());
        assert!("sort".parse::<ShellCommand>().is_err());
        assert!("sort I99".parse::<ShellCommand>().is_err());
        assert!("page soon".parse::<ShellCommand>().is_err());
        assert!("select FIT1045".parse::<ShellCommand>().is_err());
    }

    #[test]
    fn sort_command_cycles_direction() {
        let dataset = dataset();
        let sort = ShellCommand::Sort(Column::AggScore);
        let state = apply(DashboardState::default(), &sort, &dataset);
        assert_eq!(
            state.sort(),
            SortSpec::by(Column::AggScore, SortDirection::Ascending)
        );
        let state = apply(state, &sort, &dataset);
        assert_eq!(state.sort().direction, SortDirection::Descending);
    }

    #[test]
    fn session_runs_script() {
        let dataset = dataset();
        let script = "\
filter agg_score >=3
sort agg_score
sort agg_score
bogus
select FIT3155@S1
compare
quit
filter unit_code fit
";
        let mut out = Vec::new();
        let state = run(&dataset, DashboardState::default(), script.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Enter filters above to view data"));
        assert!(text.contains("error: Invalid command: unknown command 'bogus', try help"));
        assert!(text.contains("Comparison Table (1 items)"));
        assert_eq!(state.filters().len(), 1);
        assert_eq!(state.sort().direction, SortDirection::Descending);

        let view = state.view(&dataset);
        let codes: Vec<&str> = view.rows.iter().map(|r| r.unit_code.as_str()).collect();
        assert_eq!(codes, vec!["FIT2004", "FIT1045"]);
    }
}
