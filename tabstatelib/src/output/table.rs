//! Presentation snapshot of a table.
//!
//! `TableView` is the last step before display: header rows with colspans and
//! sort indicators, body rows as rendered strings, and footer rows laid out
//! like the header rows.
//! Renderers iterate over it and apply styling; no computation happens there.

use serde::{Deserialize, Serialize};

use crate::model::{HeaderCell, HeaderKind, Record};
use crate::plugin::{SortHeaderProps, SortOrder};
use crate::table::Table;

/// One header or footer cell, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderView {
    /// Header label (empty for placeholders)
    pub label: String,
    /// Number of columns spanned
    pub colspan: usize,
    /// Data, group or placeholder
    pub kind: HeaderKind,
    /// Current sort direction of the column underneath, if sorted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

/// One body row, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowView {
    /// Row id (position of the record in the dataset)
    pub id: String,
    /// Rendered cells, one per visible column
    pub values: Vec<String>,
}

/// Table-ready snapshot of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    /// Optional title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Visible column ids, left to right
    pub columns: Vec<String>,
    /// Header rows, outermost group level first
    pub headers: Vec<Vec<HeaderView>>,
    /// Body rows in final order
    pub rows: Vec<RowView>,
    /// Footer rows, column footers first, then enclosing group levels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footers: Vec<Vec<HeaderView>>,
}

fn footer_view<R>(cell: &HeaderCell<R>) -> HeaderView {
    HeaderView {
        label: cell.footer().unwrap_or_default().to_string(),
        colspan: cell.colspan(),
        kind: cell.kind(),
        sort: None,
    }
}

impl TableView {
    /// Snapshot `table`. Sort indicators are read from the header props of
    /// the sort plugin registered as `sort_plugin`, if given.
    pub fn from_table<R: Record + Clone + 'static>(
        table: &Table<R>,
        sort_plugin: Option<&str>,
    ) -> Self {
        let columns = table
            .visible_columns()
            .with(|cols| cols.iter().map(|c| c.id().to_string()).collect());

        let headers = table.header_rows().with(|header_rows| {
            header_rows
                .iter()
                .map(|row| {
                    row.cells()
                        .iter()
                        .map(|cell| HeaderView {
                            label: cell.label().to_string(),
                            colspan: cell.colspan(),
                            kind: cell.kind(),
                            sort: sort_plugin
                                .and_then(|name| cell.props::<SortHeaderProps>(name))
                                .and_then(|props| props.order()),
                        })
                        .collect()
                })
                .collect()
        });

        let rows = table.rows().with(|rows| {
            rows.iter()
                .map(|row| RowView {
                    id: row.id().to_string(),
                    values: row.cells().iter().map(|c| c.render()).collect(),
                })
                .collect()
        });

        let footers = table
            .footer_rows()
            .iter()
            .map(|row| row.cells().iter().map(footer_view).collect())
            .collect();

        TableView {
            title: None,
            columns,
            headers,
            rows,
            footers,
        }
    }

    /// Builder: set a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Number of visible columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
