// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Line-oriented dashboard front end
//!
//! Each input line is one event for the controller. Words may be
//! double-quoted to include spaces, e.g. `filter "Facility ID" 10001,10002`.

use crate::commands::query::{OutputFormat, print_batch};
use crate::common::ShipContext;
use anyhow::{Result, anyhow, bail};
use dashboard::{
    ChartData, ChartKind, ChartRequest, Controller, Dataset, FilterChoice, Notice, Session,
    StaticAuthenticator, View,
};
use diagnostics::*;
use std::io::{BufRead, Write};
use warehouse::Warehouse;

const HELP: &str = "\
commands:
  login <user> <password>     logout
  datasets                    use <dataset>
  columns                     choices
  values <column>             filter <column> <v1,v2,...>
  clear                       search [term]
  show                        next | prev
  chart bar <category> <metric>
  chart line <metric> [group]
  chart scatter <x> <y> [color]
  chart histogram <column> [bins]
  chart pie <category> <value>
  insert <col=value>...       update <key> <col=value>...
  delete <key>                quit";

/// Split a line into words, honouring double quotes.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if quoted {
        bail!("unterminated quote");
    }
    if started {
        words.push(current);
    }
    Ok(words)
}

fn assignments(words: &[String]) -> Result<Vec<(String, String)>> {
    words
        .iter()
        .map(|w| {
            w.split_once('=')
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected column=value, got {w}"))
        })
        .collect()
}

fn write_view(view: &View, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} | page {}/{} | {} rows{}",
        view.dataset,
        view.page,
        view.total_pages,
        view.total_rows,
        if view.writes_enabled {
            " | admin"
        } else if view.admin_controls {
            " | admin (writes disabled)"
        } else {
            ""
        }
    )?;
    match &view.notice {
        Some(Notice::NoData) => writeln!(out, "No data available for this filter combination.")?,
        Some(Notice::QueryFailed { message }) => writeln!(out, "Error executing query: {message}")?,
        None => {}
    }
    if let Some(rows) = view.rows.as_ref().filter(|r| r.num_rows() > 0) {
        print_batch(rows, OutputFormat::Table, out)?;
    }
    Ok(())
}

fn write_chart(chart: &ChartData, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", chart.title())?;
    match chart {
        ChartData::Bar { bars: points, .. }
        | ChartData::Line { points, .. }
        | ChartData::Pie { slices: points, .. } => {
            for p in points {
                writeln!(out, "  {}\t{}", p.label, p.value)?;
            }
        }
        ChartData::Scatter { points, .. } => {
            for p in points {
                match &p.group {
                    Some(g) => writeln!(out, "  {}\t{}\t{g}", p.x, p.y)?,
                    None => writeln!(out, "  {}\t{}", p.x, p.y)?,
                }
            }
        }
        ChartData::Histogram { bins, .. } => {
            for b in bins {
                writeln!(out, "  [{}, {})\t{}", b.lower, b.upper, b.count)?;
            }
        }
    }
    Ok(())
}

fn chart_request(words: &[String]) -> Result<ChartRequest> {
    let arg = |i: usize| -> Result<String> {
        words
            .get(i)
            .cloned()
            .ok_or_else(|| anyhow!("missing chart argument {i}"))
    };
    let opt = |i: usize| words.get(i).cloned();
    let kind = words.first().map(|w| w.to_ascii_lowercase()).unwrap_or_default();
    let kind = ChartKind::ALL
        .into_iter()
        .find(|k| k.label().to_ascii_lowercase().starts_with(&kind) && !kind.is_empty())
        .ok_or_else(|| anyhow!("unknown chart kind {kind}"))?;
    Ok(match kind {
        ChartKind::Bar => ChartRequest::Bar {
            category: arg(1)?,
            metric: arg(2)?,
        },
        ChartKind::Line => ChartRequest::Line {
            metric: arg(1)?,
            group: opt(2),
        },
        ChartKind::Scatter => ChartRequest::Scatter {
            x: arg(1)?,
            y: arg(2)?,
            color: opt(3),
        },
        ChartKind::Histogram => ChartRequest::Histogram {
            column: arg(1)?,
            bins: opt(2).map(|b| b.parse()).transpose()?,
        },
        ChartKind::Pie => ChartRequest::Pie {
            category: arg(1)?,
            value: arg(2)?,
        },
    })
}

/// Handle one line. Returns false when the session should end.
fn dispatch(
    controller: &Controller<'_>,
    session: &mut Session,
    words: &[String],
    out: &mut impl Write,
) -> Result<bool> {
    let Some((command, args)) = words.split_first() else {
        return Ok(true);
    };
    let arg = |i: usize| -> Result<&str> {
        args.get(i)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("{command}: missing argument"))
    };

    match command.as_str() {
        "quit" | "exit" => return Ok(false),
        "help" => writeln!(out, "{HELP}")?,
        "login" => {
            let role = controller.login(session, arg(0)?, arg(1)?)?;
            writeln!(out, "logged in as {role}")?;
        }
        "logout" => {
            controller.logout(session);
            writeln!(out, "logged out")?;
        }
        "datasets" => {
            for dataset in Dataset::ALL {
                let marker = if dataset == session.dataset() { "*" } else { " " };
                writeln!(out, "{marker} {} ({})", dataset.label(), dataset.table())?;
            }
        }
        "use" => {
            let dataset: Dataset = args.join(" ").parse()?;
            controller.select_dataset(session, dataset);
            writeln!(out, "dataset {dataset}")?;
        }
        "columns" => {
            for column in controller.columns(session)? {
                writeln!(out, "{column}")?;
            }
        }
        "choices" => match controller.filter_choice(session)? {
            FilterChoice::Column(column) => writeln!(out, "filter by {column}")?,
            FilterChoice::AnyColumn(columns) => writeln!(out, "filter by any of: {}", columns.join(", "))?,
            FilterChoice::Unavailable => writeln!(out, "no filter column available")?,
        },
        "values" => {
            for value in controller.filter_values(session, arg(0)?)? {
                writeln!(out, "{value}")?;
            }
        }
        "filter" => {
            let values = args
                .get(1)
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            controller.set_filter(session, arg(0)?, values)?;
        }
        "clear" => session.clear_filters(),
        "search" => session.set_search((!args.is_empty()).then(|| args.join(" "))),
        "show" => write_view(&controller.render(session)?, out)?,
        "next" => {
            if controller.next_page(session) {
                write_view(&controller.render(session)?, out)?;
            } else {
                writeln!(out, "already on the last page")?;
            }
        }
        "prev" => {
            if controller.prev_page(session) {
                write_view(&controller.render(session)?, out)?;
            } else {
                writeln!(out, "already on the first page")?;
            }
        }
        "chart" => write_chart(&controller.chart(session, &chart_request(args)?)?, out)?,
        "insert" => {
            let affected = controller.insert(session, &assignments(args)?)?;
            writeln!(out, "{affected} rows inserted")?;
        }
        "update" => {
            let affected = controller.update(session, arg(0)?, &assignments(args.get(1..).unwrap_or_default())?)?;
            writeln!(out, "{affected} rows updated")?;
        }
        "delete" => {
            let affected = controller.delete(session, arg(0)?)?;
            writeln!(out, "{affected} rows deleted")?;
        }
        other => writeln!(out, "unknown command {other}, try help")?,
    }
    Ok(true)
}

/// Drive a dashboard session from `input` until it ends.
pub fn run_session(
    warehouse: &dyn Warehouse,
    dataset: &str,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let controller = Controller::new(warehouse, dataset, Box::new(StaticAuthenticator));
    let mut session = Session::new();
    log_info!("Dashboard session started on {dataset}", dataset: dataset);

    for line in input.lines() {
        let line = line?;
        let result = split_words(&line).and_then(|words| dispatch(&controller, &mut session, &words, out));
        match result {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => writeln!(out, "error: {e}")?,
        }
    }

    controller.logout(&mut session);
    log_info!("Dashboard session ended");
    Ok(())
}

pub fn dashboard_command(ctx: &ShipContext, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    let (warehouse, dataset) = ctx.open_warehouse()?;
    run_session(&warehouse, &dataset, input, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() -> Result<()> {
        assert_eq!(
            split_words(r#"filter "Facility ID" 10001,10002"#)?,
            vec!["filter", "Facility ID", "10001,10002"]
        );
        assert_eq!(split_words("  show  ")?, vec!["show"]);
        assert_eq!(split_words(r#"update "O'Brien" n="""#)?, vec!["update", "O'Brien", "n="]);
        assert!(split_words(r#"use "CMS Data"#).is_err());
        Ok(())
    }

    #[test]
    fn test_chart_request_parsing() -> Result<()> {
        let words = split_words("histogram score 500")?;
        assert_eq!(
            chart_request(&words)?,
            ChartRequest::Histogram {
                column: "score".into(),
                bins: Some(500)
            }
        );
        assert!(chart_request(&split_words("bar only_one")?).is_err());
        assert!(chart_request(&split_words("radar a b")?).is_err());
        Ok(())
    }
}
