//! # tabstate
//!
//! A CLI that renders a JSON dataset as a table, driven by tabstatelib.
//!
//! ## Overview
//!
//! tabstate loads an array of JSON records, builds a table from a column
//! configuration (or from the keys of the first record), applies sorting and
//! column hiding through the table's plugins, and prints the derived header
//! and body rows.
//!
//! ## Features
//!
//! - **Grouped headers**: nested column groups from a JSON config
//! - **Multi-key sorting**: `--sort age:desc --sort name`
//! - **Header toggles**: `--toggle age` cycles a column's sort like a click
//! - **Column hiding**: by id or glob pattern with `--hide`
//! - **Multiple output formats**: styled terminal table, plain text, JSON
//!
//! ## Usage
//!
//! ```bash
//! # Columns inferred from the first record
//! tabstate people.json
//!
//! # Grouped columns from a config file, sorted by age then name
//! tabstate people.json --config table.json --sort age:desc --sort name
//!
//! # Hide columns and print JSON
//! tabstate people.json --hide 'visit*' --output json
//! ```

mod render;

use std::fs;
use std::io::Read;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use render::OutputMode;
use serde_json::Value;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use tabstatelib::{
    batch, SortHeaderProps, Table, TableConfig, TableError, TableView, SORT_PLUGIN,
};

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("tabstate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render a JSON dataset as a sorted, column-filtered table")
        .arg(
            Arg::new("data")
                .help("JSON file holding an array of records ('-' for stdin)")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("JSON table configuration (columns, sort, multi_sort, hidden)"),
        )
        .arg(
            Arg::new("sort")
                .short('s')
                .long("sort")
                .action(ArgAction::Append)
                .help("Sort key as id, id:asc or id:desc (repeatable, replaces configured sort)"),
        )
        .arg(
            Arg::new("toggle")
                .short('t')
                .long("toggle")
                .action(ArgAction::Append)
                .help("Toggle a column's sort as a header click would (repeatable)"),
        )
        .arg(
            Arg::new("hide")
                .long("hide")
                .action(ArgAction::Append)
                .help("Hide columns by id or glob pattern (repeatable)"),
        )
        .arg(
            Arg::new("single-sort")
                .long("single-sort")
                .action(ArgAction::SetTrue)
                .help("Header toggles replace the sort instead of adding to it"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .help("Title printed above the table"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(["auto", "term", "text", "term-debug", "json"])
                .default_value("auto")
                .help("Output mode (auto styles the table only on a terminal)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Log to stderr (-v info, -vv debug, -vvv trace)"),
        )
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("failed to initialise logging")
}

fn output_mode(matches: &ArgMatches) -> OutputMode {
    matches
        .get_one::<String>("output")
        .map(|s| match s.as_str() {
            "json" => OutputMode::Json,
            "text" => OutputMode::Text,
            "term-debug" => OutputMode::TermDebug,
            "term" => OutputMode::Term,
            _ => OutputMode::Auto,
        })
        .unwrap_or(OutputMode::Auto)
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn load_records(path: &str) -> anyhow::Result<Vec<Value>> {
    let text = read_source(path)?;
    let parsed: Value =
        serde_json::from_str(&text).with_context(|| format!("{path} is not valid JSON"))?;
    match parsed {
        Value::Array(records) => Ok(records),
        _ => bail!("{path} must contain a JSON array of records"),
    }
}

fn load_config(matches: &ArgMatches, records: &[Value]) -> anyhow::Result<TableConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let text = read_source(path)?;
            serde_json::from_str(&text)
                .with_context(|| format!("{path} is not a valid table configuration"))?
        }
        None => {
            debug!("no config given, inferring columns from the first record");
            TableConfig::infer(records)
        }
    };

    if let Some(keys) = matches.get_many::<String>("sort") {
        config.sort = keys.cloned().collect();
    }
    if let Some(entries) = matches.get_many::<String>("hide") {
        config = config.hidden(entries.cloned());
    }
    if matches.get_flag("single-sort") {
        config = config.multi_sort(false);
    }
    Ok(config)
}

/// Toggle sorting through the header cells' sort props, one batch for all.
fn apply_toggles(table: &Table<Value>, ids: &[String]) -> anyhow::Result<()> {
    let headers = table.header_rows().get();
    let mut toggles = Vec::with_capacity(ids.len());
    for id in ids {
        let props = headers
            .last()
            .and_then(|row| row.cells().iter().find(|c| c.is_data() && c.id() == id))
            .and_then(|cell| cell.props::<SortHeaderProps>(SORT_PLUGIN))
            .ok_or_else(|| TableError::UnknownColumn(id.clone()))?;
        toggles.push(props);
    }

    batch(|| {
        for props in &toggles {
            props.toggle();
        }
    });
    Ok(())
}

fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    init_logging(matches.get_count("verbose"))?;

    let data_path = matches
        .get_one::<String>("data")
        .context("missing data path")?;
    let records = load_records(data_path)?;
    info!("loaded {} records from {}", records.len(), data_path);

    let config = load_config(matches, &records)?;
    let table = config.build(records)?;

    let toggles: Vec<String> = matches
        .get_many::<String>("toggle")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default();
    apply_toggles(&table, &toggles)?;

    let mut view = TableView::from_table(&table, Some(SORT_PLUGIN));
    if let Some(title) = matches.get_one::<String>("title") {
        view = view.with_title(title.as_str());
    }

    let mut output =
        render::render_table(&view, output_mode(matches)).map_err(|e| anyhow!("{e}"))?;
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();

    match run(&matches) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_args() {
        let matches = build_command().get_matches_from(["tabstate", "data.json", "-o", "json"]);
        assert!(matches!(output_mode(&matches), OutputMode::Json));

        let matches = build_command().get_matches_from(["tabstate", "data.json"]);
        assert!(matches!(output_mode(&matches), OutputMode::Auto));
    }

    #[test]
    fn test_second_logger_init_is_reported() {
        let _ = init_logging(0);
        let err = init_logging(0).unwrap_err();
        assert!(err.to_string().contains("failed to initialise logging"));
    }
}
