//! Template rendering of a `TableView` using outstanding

use console::{measure_text_width, pad_str, Alignment, Style};
use outstanding::{render_auto, render_with_output, Theme};
use serde::Serialize;
use tabstatelib::{HeaderKind, HeaderView, SortOrder, TableView};

/// Re-export OutputMode for callers
pub use outstanding::OutputMode;

/// Include template at compile time
const TABLE_TEMPLATE: &str = include_str!("../templates/table.jinja");

const SEPARATOR: &str = "  ";

/// One pre-padded header cell and the theme style it is drawn with
#[derive(Debug, Serialize)]
struct TemplateCell {
    text: String,
    style: &'static str,
}

/// Data context for the table template; every line is pre-formatted
#[derive(Debug, Serialize)]
struct TableContext {
    title: Option<String>,
    separator: &'static str,
    headers: Vec<Vec<TemplateCell>>,
    /// Rule under the headers and above the footers
    rule: String,
    rows: Vec<String>,
    footers: Vec<String>,
}

/// Create the theme with styles
fn create_theme() -> Theme {
    Theme::new()
        .add("title", Style::new().bold())
        .add("group", Style::new().bold().underlined())
        .add("header", Style::new().bold())
        .add("rule", Style::new().dim())
        .add("footer", Style::new().dim())
}

fn sort_indicator(order: Option<SortOrder>) -> &'static str {
    match order {
        Some(SortOrder::Asc) => " ▲",
        Some(SortOrder::Desc) => " ▼",
        None => "",
    }
}

fn header_text(cell: &HeaderView) -> String {
    format!("{}{}", cell.label, sort_indicator(cell.sort))
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

/// Width of `span` columns starting at `start`, separators included
fn span_width(widths: &[usize], start: usize, span: usize) -> usize {
    let end = (start + span).min(widths.len());
    let cols = &widths[start..end];
    cols.iter().sum::<usize>() + SEPARATOR.len() * cols.len().saturating_sub(1)
}

/// Column widths wide enough for every header, value and footer label
fn column_widths(view: &TableView) -> Vec<usize> {
    let mut widths = vec![0; view.width()];

    for row in &view.rows {
        for (w, value) in widths.iter_mut().zip(&row.values) {
            *w = (*w).max(measure_text_width(value));
        }
    }

    // Spanning cells last: a label wider than its span widens the span's last column.
    for span_row in view.headers.iter().chain(&view.footers) {
        let mut start = 0;
        for cell in span_row {
            let needed = measure_text_width(&header_text(cell));
            let available = span_width(&widths, start, cell.colspan);
            if needed > available {
                let last = (start + cell.colspan).min(widths.len()).saturating_sub(1);
                if let Some(w) = widths.get_mut(last) {
                    *w += needed - available;
                }
            }
            start += cell.colspan;
        }
    }

    widths
}

/// Pad every cell of a header or footer row to the width of its span.
fn span_cells(row: &[HeaderView], widths: &[usize]) -> Vec<TemplateCell> {
    let mut start = 0;
    let mut cells = Vec::with_capacity(row.len());
    for cell in row {
        let width = span_width(widths, start, cell.colspan);
        let text = header_text(cell);
        cells.push(match cell.kind {
            HeaderKind::Group => TemplateCell {
                text: pad_str(&text, width, Alignment::Center, None).to_string(),
                style: "group",
            },
            HeaderKind::Data => TemplateCell {
                text: pad_str(&text, width, Alignment::Left, None).to_string(),
                style: "header",
            },
            HeaderKind::Display => TemplateCell {
                text: " ".repeat(width),
                style: "header",
            },
        });
        start += cell.colspan;
    }

    while cells.last().is_some_and(|c| c.text.trim().is_empty()) {
        cells.pop();
    }
    if let Some(last) = cells.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
    }
    cells
}

fn footer_line(row: &[HeaderView], widths: &[usize]) -> String {
    span_cells(row, widths)
        .into_iter()
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn body_line(values: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| {
            let align = if is_numeric(value) {
                Alignment::Right
            } else {
                Alignment::Left
            };
            pad_str(value, width, align, None).to_string()
        })
        .collect();
    parts.join(SEPARATOR).trim_end().to_string()
}

fn table_context(view: &TableView) -> TableContext {
    let widths = column_widths(view);
    let total_width = span_width(&widths, 0, widths.len());

    TableContext {
        title: view.title.clone(),
        separator: SEPARATOR,
        headers: view
            .headers
            .iter()
            .map(|row| span_cells(row, &widths))
            .collect(),
        rule: "─".repeat(total_width),
        rows: view
            .rows
            .iter()
            .map(|row| body_line(&row.values, &widths))
            .collect(),
        footers: view
            .footers
            .iter()
            .map(|row| footer_line(row, &widths))
            .collect(),
    }
}

/// Render a table view using outstanding's auto dispatch: structured modes
/// serialize the view itself, terminal and text modes fill the template.
pub fn render_table(
    view: &TableView,
    output_mode: OutputMode,
) -> Result<String, Box<dyn std::error::Error>> {
    let theme = create_theme();

    if output_mode.is_structured() {
        return Ok(render_auto(TABLE_TEMPLATE, view, &theme, output_mode)?);
    }

    let context = table_context(view);
    Ok(render_with_output(
        TABLE_TEMPLATE,
        &context,
        &theme,
        output_mode,
    )?)
}
