//! Body rows and cells.
//!
//! Rows are immutable. Deriving a new row (for instance projecting it onto the
//! visible columns) shares the existing `Rc<BodyCell>`s instead of recomputing
//! values, so a cell keeps its identity across column-visibility changes.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::model::column::DataColumn;
use crate::model::value::{CellValue, Record};

/// Distinguishes cells read from the record from synthetic ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Value produced by the column's accessor
    Data,
    /// Placeholder contributed by a plugin; not backed by the record
    Display,
}

/// One cell of a body row.
pub struct BodyCell<R> {
    value: CellValue,
    column: Rc<DataColumn<R>>,
    kind: CellKind,
}

impl<R> BodyCell<R> {
    /// Create a data cell for `column`.
    pub fn data(column: Rc<DataColumn<R>>, value: CellValue) -> Self {
        Self {
            value,
            column,
            kind: CellKind::Data,
        }
    }

    /// Create a synthetic placeholder cell for `column`.
    pub fn display(column: Rc<DataColumn<R>>, value: CellValue) -> Self {
        Self {
            value,
            column,
            kind: CellKind::Display,
        }
    }

    /// The cell value
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// The column this cell belongs to
    pub fn column(&self) -> &Rc<DataColumn<R>> {
        &self.column
    }

    /// Id of the owning column
    pub fn column_id(&self) -> &str {
        self.column.id()
    }

    /// Whether the value was read from the record
    pub fn is_data(&self) -> bool {
        self.kind == CellKind::Data
    }

    /// The cell kind
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Render the cell with the column's renderer, or the value's `Display`.
    pub fn render(&self) -> String {
        match self.column.cell_renderer() {
            Some(render) => render(self),
            None => self.value.to_string(),
        }
    }
}

impl<R> PartialEq for BodyCell<R> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.column.id() == other.column.id()
            && self.value == other.value
    }
}

impl<R> fmt::Debug for BodyCell<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyCell")
            .field("column", &self.column.id())
            .field("value", &self.value)
            .field("kind", &self.kind)
            .finish()
    }
}

/// One body row: the source record and its cells in column order.
pub struct BodyRow<R> {
    id: String,
    original: Rc<R>,
    cells: Vec<Rc<BodyCell<R>>>,
    cell_index: HashMap<String, usize>,
}

impl<R> BodyRow<R> {
    /// Assemble a row from prepared cells.
    pub fn new(id: impl Into<String>, original: Rc<R>, cells: Vec<Rc<BodyCell<R>>>) -> Self {
        let cell_index = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.column_id().to_string(), i))
            .collect();
        Self {
            id: id.into(),
            original,
            cells,
            cell_index,
        }
    }

    /// Row id (the record's position in the dataset)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record this row was built from
    pub fn original(&self) -> &Rc<R> {
        &self.original
    }

    /// Cells in column order
    pub fn cells(&self) -> &[Rc<BodyCell<R>>] {
        &self.cells
    }

    /// Look up a cell by column id
    pub fn cell(&self, column_id: &str) -> Option<&Rc<BodyCell<R>>> {
        self.cell_index.get(column_id).map(|&i| &self.cells[i])
    }

    /// Look up a cell value by column id
    pub fn value(&self, column_id: &str) -> Option<&CellValue> {
        self.cell(column_id).map(|c| c.value())
    }

    /// Column ids present in this row, in order
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.column_id())
    }
}

impl<R> Clone for BodyRow<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            original: Rc::clone(&self.original),
            cells: self.cells.clone(),
            cell_index: self.cell_index.clone(),
        }
    }
}

impl<R> PartialEq for BodyRow<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.cells == other.cells
    }
}

impl<R> fmt::Debug for BodyRow<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyRow")
            .field("id", &self.id)
            .field("cells", &self.cells)
            .finish()
    }
}

/// Build a row by applying every column's accessor to `record`.
pub fn build_row<R: Record>(
    id: impl Into<String>,
    record: Rc<R>,
    columns: &[Rc<DataColumn<R>>],
) -> BodyRow<R> {
    let cells = columns
        .iter()
        .map(|c| Rc::new(BodyCell::data(Rc::clone(c), c.value_of(&record))))
        .collect();
    BodyRow::new(id, record, cells)
}

/// Build one row per record; row ids are record positions.
pub fn build_rows<R: Record + Clone>(
    records: &[R],
    columns: &[Rc<DataColumn<R>>],
) -> Vec<BodyRow<R>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| build_row(i.to_string(), Rc::new(record.clone()), columns))
        .collect()
}

/// Project a row onto `column_ids`, in that order, sharing the original cells.
///
/// Ids the row does not have are skipped.
pub fn select_columns<R, S: AsRef<str>>(row: &BodyRow<R>, column_ids: &[S]) -> BodyRow<R> {
    let cells = column_ids
        .iter()
        .filter_map(|id| row.cell(id.as_ref()).cloned())
        .collect();
    BodyRow::new(row.id.clone(), Rc::clone(&row.original), cells)
}
