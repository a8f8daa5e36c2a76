//! Output formatting: present a table for display.
//!
//! - **TableView**: header rows, body rows and footer rows as plain strings
//! - **HeaderView** / **RowView**: the individual pieces
//!
//! TableView is a pure presentation layer: it only formats what the table has
//! already derived. Sorting and column visibility happen in the plugins.
//!
//! ## Example
//!
//! ```rust
//! use tabstatelib::output::TableView;
//! use tabstatelib::{column, ColumnDef, Table};
//! use serde_json::json;
//!
//! let table = Table::new(
//!     vec![json!({"n": 1})],
//!     vec![column(ColumnDef::new("N").accessor("n")).unwrap()],
//! )
//! .unwrap();
//! let view = TableView::from_table(&table, None);
//! assert_eq!(view.rows[0].values, ["1"]);
//! ```

pub mod table;

pub use table::{HeaderView, RowView, TableView};
