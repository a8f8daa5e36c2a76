//! # tabstatelib
//!
//! Headless table state: columns, body rows and header rows derived
//! reactively from a dataset, extended through plugins.
//!
//! ## Overview
//!
//! A table is declared once from three inputs:
//!
//! - **Dataset**: an ordered list of records (anything implementing [`Record`])
//! - **Column tree**: data columns bound to accessors, optionally nested in
//!   header groups
//! - **Plugins**: named extensions contributing state, column transforms, row
//!   transforms and header-cell props
//!
//! The table then keeps every derived stage current. Replacing the dataset or
//! changing any plugin state (toggling a sort key, hiding a column) re-runs
//! only the stages that depend on what changed, synchronously and once per
//! [`batch`](reactive::batch).
//!
//! ## Features
//!
//! - **Grouped headers**: one header row per nesting level with colspans
//! - **Multi-key sorting**: stable, toggleable, with custom sort-key extractors
//! - **Column hiding**: by id or glob pattern
//! - **Plain data out**: rows and headers are immutable values; no rendering
//!
//! ## Example
//!
//! ```rust
//! use tabstatelib::{column, group, ColumnDef, SortBy, SortByState, Table};
//! use serde_json::{json, Value};
//!
//! let columns = vec![
//!     group("Name", vec![column(ColumnDef::new("First Name").accessor("firstName")).unwrap()]),
//!     group(
//!         "Info",
//!         vec![
//!             column(ColumnDef::new("Age").accessor("age")).unwrap(),
//!             column(ColumnDef::new("Visits").accessor("visits")).unwrap(),
//!         ],
//!     ),
//! ];
//! let data = vec![
//!     json!({"firstName": "b", "age": 30, "visits": 4}),
//!     json!({"firstName": "a", "age": 30, "visits": 9}),
//!     json!({"firstName": "c", "age": 20, "visits": 1}),
//! ];
//!
//! let table = Table::builder(data)
//!     .plugin("sort", SortBy::new())
//!     .build(columns)
//!     .unwrap();
//!
//! // Header rows: groups on top, data columns below
//! let headers = table.header_rows().get();
//! assert_eq!(headers[0].cells()[1].label(), "Info");
//! assert_eq!(headers[0].cells()[1].colspan(), 2);
//!
//! // Drive the sort plugin's state; rows follow
//! let sort = table.plugin_state::<SortByState<Value>>("sort").unwrap();
//! sort.sort_keys.toggle("age", true);
//! sort.sort_keys.toggle("firstName", true);
//!
//! let names: Vec<String> = table
//!     .rows()
//!     .get()
//!     .iter()
//!     .map(|r| r.value("firstName").unwrap().to_string())
//!     .collect();
//! assert_eq!(names, ["c", "a", "b"]);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod plugin;
pub mod reactive;
pub mod table;

pub use config::{ColumnSpec, TableConfig, HIDE_PLUGIN, SORT_PLUGIN};
pub use error::TableError;
pub use model::{
    column, create_columns, flatten_columns, group, group_with_footer, validate_unique_ids,
    Accessor, BodyCell, BodyRow, CellKind, CellValue, Column, ColumnDef, DataColumn,
    GroupColumn, HeaderCell, HeaderKind, HeaderRow, Record,
};
pub use output::{HeaderView, RowView, TableView};
pub use plugin::{
    plugin_fn, ColumnsTransform, HiddenColumns, HiddenColumnsState, Plugin, PluginContext,
    PluginInstance, RowsTransform, SortBy, SortByState, SortColumnOptions, SortHeaderProps,
    SortKey, SortKeys, SortOrder,
};
pub use reactive::{batch, Readable, Writable};
pub use table::{Table, TableBuilder, TableState};

/// Result type for tabstatelib operations
pub type Result<T> = std::result::Result<T, TableError>;
