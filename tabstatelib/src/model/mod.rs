//! Table data model: values, columns, rows and header rows.
//!
//! Everything in this module is plain data. Reactivity lives in
//! [`crate::table`], which rebuilds these values whenever its inputs change.

pub mod column;
pub mod header;
pub mod row;
pub mod value;

pub use column::{
    column, create_columns, flatten_columns, group, group_with_footer, validate_unique_ids,
    Accessor, CellRenderer, Column, ColumnDef, ColumnOptions, DataColumn, GroupColumn,
};
pub use header::{build_header_rows, HeaderCell, HeaderKind, HeaderRow};
pub use row::{build_row, build_rows, select_columns, BodyCell, BodyRow, CellKind};
pub use value::{CellValue, Record};
