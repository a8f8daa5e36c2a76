//! Column definitions: data columns, header groups and the flat column list.
//!
//! A table is declared as a tree of [`Column`]s. Leaves are [`DataColumn`]s,
//! which read one value per record through an [`Accessor`]; inner nodes are
//! [`GroupColumn`]s, which only exist to span several leaves in the header.
//!
//! ```rust
//! use tabstatelib::{column, create_columns, flatten_columns, group, ColumnDef};
//!
//! let columns = create_columns::<serde_json::Value>(vec![
//!     group("Name", vec![
//!         column(ColumnDef::new("First Name").accessor("firstName")).unwrap(),
//!         column(ColumnDef::new("Last Name").accessor("lastName")).unwrap(),
//!     ]),
//!     column(ColumnDef::new("Age").accessor("age")).unwrap(),
//! ])
//! .unwrap();
//!
//! let ids: Vec<_> = flatten_columns(&columns).iter().map(|c| c.id().to_string()).collect();
//! assert_eq!(ids, ["firstName", "lastName", "age"]);
//! ```

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::error::TableError;
use crate::model::row::BodyCell;
use crate::model::value::{CellValue, Record};
use crate::Result;

/// How a data column reads its value from a record.
pub enum Accessor<R> {
    /// Read a field path through [`Record::field`]; doubles as the column id.
    Field(String),
    /// Compute the value with a function.
    Func(Rc<dyn Fn(&R) -> CellValue>),
}

impl<R> Accessor<R> {
    /// Create a function accessor.
    pub fn func(f: impl Fn(&R) -> CellValue + 'static) -> Self {
        Accessor::Func(Rc::new(f))
    }

    /// The field path, if this is a string accessor.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Accessor::Field(path) => Some(path),
            Accessor::Func(_) => None,
        }
    }
}

impl<R: Record> Accessor<R> {
    /// Apply the accessor to a record.
    pub fn get(&self, record: &R) -> CellValue {
        match self {
            Accessor::Field(path) => record.field(path),
            Accessor::Func(f) => f(record),
        }
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Field(path) => Accessor::Field(path.clone()),
            Accessor::Func(f) => Accessor::Func(Rc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Accessor::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<R> From<&str> for Accessor<R> {
    fn from(path: &str) -> Self {
        Accessor::Field(path.to_string())
    }
}

impl<R> From<String> for Accessor<R> {
    fn from(path: String) -> Self {
        Accessor::Field(path)
    }
}

/// Renders a body cell to display text.
pub type CellRenderer<R> = Rc<dyn Fn(&BodyCell<R>) -> String>;

/// Per-plugin column options, keyed by option type.
///
/// Plugins define their own option structs (for example the sort plugin's
/// `SortColumnOptions`) and look them up by type, so the column model never
/// needs to know which plugins exist.
#[derive(Clone, Default)]
pub struct ColumnOptions {
    entries: HashMap<TypeId, Rc<dyn Any>>,
}

impl ColumnOptions {
    /// Store an options value, replacing any previous value of the same type.
    pub fn insert<T: 'static>(&mut self, options: T) {
        self.entries.insert(TypeId::of::<T>(), Rc::new(options));
    }

    /// Look up the options value of type `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|opts| opts.downcast_ref::<T>())
    }

    /// Number of option values stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no options are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ColumnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnOptions")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// A leaf column bound to an accessor.
pub struct DataColumn<R> {
    id: String,
    header: String,
    footer: Option<String>,
    accessor: Accessor<R>,
    cell: Option<CellRenderer<R>>,
    options: ColumnOptions,
}

impl<R> DataColumn<R> {
    /// Stable, table-unique column id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header label
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Footer label, if any
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// The accessor reading this column's value
    pub fn accessor(&self) -> &Accessor<R> {
        &self.accessor
    }

    /// Custom cell renderer, if any
    pub fn cell_renderer(&self) -> Option<&CellRenderer<R>> {
        self.cell.as_ref()
    }

    /// Plugin options of type `T` attached to this column
    pub fn option<T: 'static>(&self) -> Option<&T> {
        self.options.get::<T>()
    }

    /// All plugin options attached to this column
    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }
}

impl<R: Record> DataColumn<R> {
    /// Read this column's value from `record`.
    pub fn value_of(&self, record: &R) -> CellValue {
        self.accessor.get(record)
    }
}

impl<R> fmt::Debug for DataColumn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataColumn")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("accessor", &self.accessor)
            .field("options", &self.options)
            .finish()
    }
}

/// A header group spanning its child columns.
pub struct GroupColumn<R> {
    header: String,
    footer: Option<String>,
    columns: Vec<Column<R>>,
}

impl<R> GroupColumn<R> {
    /// Header label
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Footer label, if any
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// Child columns in declared order
    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }
}

impl<R> Clone for GroupColumn<R> {
    fn clone(&self) -> Self {
        Self {
            header: self.header.clone(),
            footer: self.footer.clone(),
            columns: self.columns.clone(),
        }
    }
}

impl<R> fmt::Debug for GroupColumn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupColumn")
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("columns", &self.columns)
            .finish()
    }
}

/// A node in the column tree.
pub enum Column<R> {
    /// A data-bearing leaf
    Data(Rc<DataColumn<R>>),
    /// A header group
    Group(GroupColumn<R>),
}

impl<R> Column<R> {
    /// Header label of either variant
    pub fn header(&self) -> &str {
        match self {
            Column::Data(c) => c.header(),
            Column::Group(g) => g.header(),
        }
    }

    /// Column id; groups have none
    pub fn id(&self) -> Option<&str> {
        match self {
            Column::Data(c) => Some(c.id()),
            Column::Group(_) => None,
        }
    }

    /// Check if this is a data column
    pub fn is_data(&self) -> bool {
        matches!(self, Column::Data(_))
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        match self {
            Column::Data(c) => Column::Data(Rc::clone(c)),
            Column::Group(g) => Column::Group(g.clone()),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Data(c) => fmt::Debug::fmt(c, f),
            Column::Group(g) => fmt::Debug::fmt(g, f),
        }
    }
}

/// Declaration of a data column, validated by [`column`].
pub struct ColumnDef<R> {
    header: String,
    footer: Option<String>,
    id: Option<String>,
    accessor: Option<Accessor<R>>,
    cell: Option<CellRenderer<R>>,
    options: ColumnOptions,
}

impl<R> ColumnDef<R> {
    /// Start a column declaration with a header label.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            footer: None,
            id: None,
            accessor: None,
            cell: None,
            options: ColumnOptions::default(),
        }
    }

    /// Builder: set the accessor (a field path or an [`Accessor`])
    pub fn accessor(mut self, accessor: impl Into<Accessor<R>>) -> Self {
        self.accessor = Some(accessor.into());
        self
    }

    /// Builder: compute the value with a function
    pub fn accessor_fn(mut self, f: impl Fn(&R) -> CellValue + 'static) -> Self {
        self.accessor = Some(Accessor::func(f));
        self
    }

    /// Builder: set an explicit id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: set the footer label
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Builder: render cells with a custom function
    pub fn cell(mut self, render: impl Fn(&BodyCell<R>) -> String + 'static) -> Self {
        self.cell = Some(Rc::new(render));
        self
    }

    /// Builder: attach plugin options
    pub fn option<T: 'static>(mut self, options: T) -> Self {
        self.options.insert(options);
        self
    }
}

/// Validate a column declaration and build a data column.
///
/// The id is the explicit id when given, otherwise the field-path accessor.
/// A function accessor without an id is rejected. A declaration without any
/// accessor reads the field named by its id.
pub fn column<R>(def: ColumnDef<R>) -> Result<Column<R>> {
    let id = match (&def.id, def.accessor.as_ref().and_then(|a| a.field_path())) {
        (Some(id), _) => id.clone(),
        (None, Some(path)) => path.to_string(),
        (None, None) => return Err(TableError::MissingColumnId),
    };
    let accessor = def
        .accessor
        .unwrap_or_else(|| Accessor::Field(id.clone()));

    Ok(Column::Data(Rc::new(DataColumn {
        id,
        header: def.header,
        footer: def.footer,
        accessor,
        cell: def.cell,
        options: def.options,
    })))
}

/// Build a header group over `columns`.
pub fn group<R>(header: impl Into<String>, columns: Vec<Column<R>>) -> Column<R> {
    Column::Group(GroupColumn {
        header: header.into(),
        footer: None,
        columns,
    })
}

/// Build a header group with a footer label.
pub fn group_with_footer<R>(
    header: impl Into<String>,
    footer: impl Into<String>,
    columns: Vec<Column<R>>,
) -> Column<R> {
    Column::Group(GroupColumn {
        header: header.into(),
        footer: Some(footer.into()),
        columns,
    })
}

/// Validate a column tree, returning it unchanged on success.
pub fn create_columns<R>(columns: Vec<Column<R>>) -> Result<Vec<Column<R>>> {
    validate_unique_ids(&columns)?;
    Ok(columns)
}

/// Check that every data-column id in the whole tree is unique.
///
/// Reports the first id seen twice in pre-order declaration order.
pub fn validate_unique_ids<R>(columns: &[Column<R>]) -> Result<()> {
    let mut seen = HashSet::new();
    for c in flatten_columns(columns) {
        if !seen.insert(c.id().to_string()) {
            return Err(TableError::DuplicateColumnId(c.id().to_string()));
        }
    }
    Ok(())
}

/// Flatten a column tree into its data columns, depth-first, in declared order.
pub fn flatten_columns<R>(columns: &[Column<R>]) -> Vec<Rc<DataColumn<R>>> {
    let mut out = Vec::new();
    collect_data_columns(columns, &mut out);
    out
}

fn collect_data_columns<R>(columns: &[Column<R>], out: &mut Vec<Rc<DataColumn<R>>>) {
    for c in columns {
        match c {
            Column::Data(data) => out.push(Rc::clone(data)),
            Column::Group(g) => collect_data_columns(&g.columns, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn data(header: &str, accessor: &str) -> Column<Value> {
        column(ColumnDef::new(header).accessor(accessor)).unwrap()
    }

    fn ids(columns: &[Rc<DataColumn<Value>>]) -> Vec<&str> {
        columns.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_explicit_id_wins() {
        let c = column::<Value>(ColumnDef::new("First Name").accessor("firstName").id("name"))
            .unwrap();
        assert_eq!(c.id(), Some("name"));
    }

    #[test]
    fn test_string_accessor_as_id() {
        let c = data("First Name", "firstName");
        assert_eq!(c.id(), Some("firstName"));
    }

    #[test]
    fn test_fn_accessor_without_id_fails() {
        let err = column::<Value>(
            ColumnDef::new("First Name").accessor_fn(|r: &Value| r.field("firstName")),
        )
        .unwrap_err();
        assert_eq!(err, TableError::MissingColumnId);
        assert_eq!(err.to_string(), "A column id or string accessor is required");
    }

    #[test]
    fn test_id_without_accessor_reads_field() {
        let c = column::<Value>(ColumnDef::new("Age").id("age")).unwrap();
        let Column::Data(c) = c else {
            panic!("expected a data column");
        };
        assert_eq!(c.value_of(&json!({"age": 3})), CellValue::from(3));
    }

    #[test]
    fn test_create_columns_passes_without_duplicates() {
        let result = create_columns(vec![data("First Name", "firstName"), data("Age", "age")]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = create_columns(vec![
            data("First Name", "firstName"),
            data("Age", "firstName"),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate column ids not allowed: \"firstName\""
        );
    }

    #[test]
    fn test_duplicate_ids_rejected_across_groups() {
        let err = create_columns(vec![
            group("Name", vec![data("First Name", "firstName")]),
            group(
                "Info",
                vec![group("Nested", vec![data("Again", "firstName")])],
            ),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumnId("firstName".to_string()));
    }

    #[test]
    fn test_first_duplicate_reported_in_declaration_order() {
        let err = create_columns(vec![
            data("A", "a"),
            data("B", "b"),
            data("B2", "b"),
            data("A2", "a"),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumnId("b".to_string()));
    }

    #[test]
    fn test_flatten_columns() {
        let columns = create_columns(vec![
            group(
                "ID",
                vec![
                    group("Name", vec![data("First Name", "firstName")]),
                    data("Last Name", "lastName"),
                ],
            ),
            group(
                "Info",
                vec![
                    data("Age", "age"),
                    data("Status", "status"),
                    data("Visits", "visits"),
                    data("Profile Progress", "progress"),
                ],
            ),
        ])
        .unwrap();

        let flat = flatten_columns(&columns);

        assert_eq!(
            ids(&flat),
            ["firstName", "lastName", "age", "status", "visits", "progress"]
        );
        assert_eq!(flat[5].header(), "Profile Progress");
    }

    #[test]
    fn test_column_options_by_type() {
        #[derive(Debug, PartialEq)]
        struct Marker(u8);

        let c = column::<Value>(ColumnDef::new("A").accessor("a").option(Marker(7))).unwrap();
        let Column::Data(c) = c else {
            panic!("expected a data column");
        };
        assert_eq!(c.option::<Marker>(), Some(&Marker(7)));
        assert_eq!(c.option::<String>(), None);
    }
}
