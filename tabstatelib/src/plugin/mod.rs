//! The plugin contract.
//!
//! A plugin is registered on a table under a name. When the table is built,
//! each plugin is initialised with a [`PluginContext`] (its name and the
//! shared [`TableState`]) and returns a [`PluginInstance`]:
//!
//! - **state**: any value, exposed to the outside under the plugin's name
//! - **columns transform**: folded over the visible columns
//! - **rows transform**: folded over the body rows
//! - **header cell hook**: produces per-cell props stored under the plugin's name
//!
//! Transforms are folded in registration order. A transform declares the
//! observable stores it reads through [`Dependency`] handles; when any of them
//! changes the table re-runs that fold. Transforms receive owned inputs and
//! return new values; cells and columns are shared, never mutated.

pub mod hidden;
pub mod sort;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::model::{BodyRow, DataColumn, HeaderCell};
use crate::reactive::Dependency;
use crate::table::TableState;

pub use hidden::{HiddenColumns, HiddenColumnsState};
pub use sort::{
    sort_rows, toggled_sort_keys, SortBy, SortByState, SortColumnOptions, SortHeaderProps,
    SortKey, SortKeys, SortOrder,
};

/// What a plugin receives when the table initialises it.
pub struct PluginContext<R> {
    /// Name the plugin was registered under
    pub name: String,
    /// Shared table state
    pub table_state: TableState<R>,
}

/// A table plugin.
///
/// Implemented by plugin configuration types such as [`SortBy`]; closures can
/// be used through [`plugin_fn`].
pub trait Plugin<R> {
    /// Initialise the plugin for one table.
    fn init(self: Box<Self>, cx: &PluginContext<R>) -> PluginInstance<R>;
}

/// A plugin defined by a closure.
pub struct FnPlugin<F>(F);

/// Wrap a closure as a [`Plugin`].
pub fn plugin_fn<R, F>(f: F) -> FnPlugin<F>
where
    F: FnOnce(&PluginContext<R>) -> PluginInstance<R>,
{
    FnPlugin(f)
}

impl<R, F> Plugin<R> for FnPlugin<F>
where
    F: FnOnce(&PluginContext<R>) -> PluginInstance<R>,
{
    fn init(self: Box<Self>, cx: &PluginContext<R>) -> PluginInstance<R> {
        (self.0)(cx)
    }
}

impl<F> fmt::Debug for FnPlugin<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnPlugin(..)")
    }
}

/// Visible columns, as passed through column transforms.
pub type Columns<R> = Vec<Rc<DataColumn<R>>>;

/// Body rows, as passed through row transforms.
pub type Rows<R> = Vec<BodyRow<R>>;

/// A column transform with the stores it reads.
pub struct ColumnsTransform<R> {
    deps: Vec<Dependency>,
    apply: Box<dyn Fn(Columns<R>) -> Columns<R>>,
}

impl<R> ColumnsTransform<R> {
    /// Create a transform from a function.
    pub fn new(apply: impl Fn(Columns<R>) -> Columns<R> + 'static) -> Self {
        Self {
            deps: Vec::new(),
            apply: Box::new(apply),
        }
    }

    /// Builder: re-run the fold whenever `dep` changes
    pub fn depends_on(mut self, dep: Dependency) -> Self {
        self.deps.push(dep);
        self
    }

    /// Stores this transform reads
    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    /// Apply the transform.
    pub fn apply(&self, columns: Columns<R>) -> Columns<R> {
        (self.apply)(columns)
    }
}

impl<R> fmt::Debug for ColumnsTransform<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnsTransform")
            .field("deps", &self.deps.len())
            .finish()
    }
}

/// A row transform with the stores it reads.
pub struct RowsTransform<R> {
    deps: Vec<Dependency>,
    apply: Box<dyn Fn(Rows<R>) -> Rows<R>>,
}

impl<R> RowsTransform<R> {
    /// Create a transform from a function.
    pub fn new(apply: impl Fn(Rows<R>) -> Rows<R> + 'static) -> Self {
        Self {
            deps: Vec::new(),
            apply: Box::new(apply),
        }
    }

    /// Builder: re-run the fold whenever `dep` changes
    pub fn depends_on(mut self, dep: Dependency) -> Self {
        self.deps.push(dep);
        self
    }

    /// Stores this transform reads
    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    /// Apply the transform.
    pub fn apply(&self, rows: Rows<R>) -> Rows<R> {
        (self.apply)(rows)
    }
}

impl<R> fmt::Debug for RowsTransform<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowsTransform")
            .field("deps", &self.deps.len())
            .finish()
    }
}

/// Produces the props a plugin attaches to one header cell.
pub type HeaderCellHook<R> = Rc<dyn Fn(&HeaderCell<R>) -> Rc<dyn Any>>;

/// UI hooks contributed by a plugin.
pub struct PluginHooks<R> {
    /// Hook run on every header cell
    pub header_cell: Option<HeaderCellHook<R>>,
}

impl<R> Default for PluginHooks<R> {
    fn default() -> Self {
        Self { header_cell: None }
    }
}

/// What an initialised plugin contributes to the table.
pub struct PluginInstance<R> {
    /// State exposed under the plugin's name
    pub state: Rc<dyn Any>,
    /// Optional column transform
    pub columns_transform: Option<ColumnsTransform<R>>,
    /// Optional row transform
    pub rows_transform: Option<RowsTransform<R>>,
    /// UI hooks
    pub hooks: PluginHooks<R>,
}

impl<R: 'static> PluginInstance<R> {
    /// Create an instance exposing `state` and contributing nothing else yet.
    pub fn new<S: 'static>(state: S) -> Self {
        Self {
            state: Rc::new(state),
            columns_transform: None,
            rows_transform: None,
            hooks: PluginHooks::default(),
        }
    }

    /// Builder: contribute a column transform
    pub fn columns_transform(mut self, transform: ColumnsTransform<R>) -> Self {
        self.columns_transform = Some(transform);
        self
    }

    /// Builder: contribute a row transform
    pub fn rows_transform(mut self, transform: RowsTransform<R>) -> Self {
        self.rows_transform = Some(transform);
        self
    }

    /// Builder: contribute a header cell hook
    pub fn header_cell_hook<P: 'static>(
        mut self,
        hook: impl Fn(&HeaderCell<R>) -> P + 'static,
    ) -> Self {
        self.hooks.header_cell = Some(Rc::new(move |cell: &HeaderCell<R>| -> Rc<dyn Any> {
            Rc::new(hook(cell))
        }));
        self
    }
}

impl<R> fmt::Debug for PluginInstance<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("columns_transform", &self.columns_transform)
            .field("rows_transform", &self.rows_transform)
            .field("header_cell_hook", &self.hooks.header_cell.is_some())
            .finish()
    }
}

/// Plugin states keyed by plugin name, in registration order.
#[derive(Clone, Default)]
pub struct PluginStates {
    entries: Vec<(String, Rc<dyn Any>)>,
}

impl PluginStates {
    pub(crate) fn push(&mut self, name: String, state: Rc<dyn Any>) {
        self.entries.push((name, state));
    }

    /// State of the plugin registered as `name`, if it is an `S`.
    pub fn get<S: 'static>(&self, name: &str) -> Option<Rc<S>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, state)| Rc::clone(state).downcast::<S>().ok())
    }

    /// Registered plugin names, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no plugins are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PluginStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
