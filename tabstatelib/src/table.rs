//! The table: plugins wired into a reactive derivation pipeline.
//!
//! The data flow is:
//! 1. Column tree, flattened once into data columns
//! 2. Visible columns (data columns folded through the plugins' column transforms)
//! 3. Original rows (one row per record, every data column)
//! 4. Columned rows (original rows projected onto the visible columns)
//! 5. Rows (columned rows folded through the plugins' row transforms)
//! 6. Header rows (built from the column tree and the visible columns, then
//!    decorated with every plugin's header-cell props)
//!
//! Each stage remembers the versions of the stores it read. When the dataset
//! or any store a transform depends on changes, the table re-runs the
//! pipeline; stages whose inputs did not move keep their previous output.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace};

use crate::error::TableError;
use crate::model::{
    build_header_rows, build_row, flatten_columns, select_columns, validate_unique_ids, BodyRow,
    Column, DataColumn, HeaderRow, Record,
};
use crate::plugin::{
    ColumnsTransform, HeaderCellHook, Plugin, PluginContext, PluginStates, RowsTransform,
};
use crate::reactive::{batch, Dependency, Readable, SubscriptionId, Writable};
use crate::Result;

/// Shared, read-mostly view of a table's inputs and derived stages.
///
/// Handed to every plugin at initialisation and attached to every header
/// cell. Cloning is cheap; all clones observe the same stores.
pub struct TableState<R> {
    /// The dataset
    pub data: Writable<Vec<R>>,
    /// The column tree as declared
    pub columns: Rc<[Column<R>]>,
    /// All data columns in declaration order
    pub flat_columns: Rc<[Rc<DataColumn<R>>]>,
    /// Data columns left after the column transforms
    pub visible_columns: Readable<Vec<Rc<DataColumn<R>>>>,
    /// One row per record over every data column, before any transform
    pub original_rows: Readable<Vec<BodyRow<R>>>,
    /// Final body rows
    pub rows: Readable<Vec<BodyRow<R>>>,
}

impl<R> Clone for TableState<R> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            columns: Rc::clone(&self.columns),
            flat_columns: Rc::clone(&self.flat_columns),
            visible_columns: self.visible_columns.clone(),
            original_rows: self.original_rows.clone(),
            rows: self.rows.clone(),
        }
    }
}

impl<R> fmt::Debug for TableState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableState")
            .field(
                "flat_columns",
                &self.flat_columns.iter().map(|c| c.id()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

trait Refresh {
    /// Recompute if any dependency moved; returns whether it did.
    fn refresh(&self) -> bool;

    /// Forget the recorded dependency versions.
    fn invalidate(&self);
}

struct Stage<T> {
    name: &'static str,
    output: Writable<Vec<T>>,
    deps: Vec<Dependency>,
    seen: RefCell<Option<Vec<u64>>>,
    compute: Box<dyn Fn() -> Vec<T>>,
}

impl<T: 'static> Stage<T> {
    fn new(
        name: &'static str,
        output: Writable<Vec<T>>,
        deps: Vec<Dependency>,
        compute: impl Fn() -> Vec<T> + 'static,
    ) -> Self {
        Self {
            name,
            output,
            deps,
            seen: RefCell::new(None),
            compute: Box::new(compute),
        }
    }
}

impl<T: 'static> Refresh for Stage<T> {
    fn refresh(&self) -> bool {
        let versions: Vec<u64> = self.deps.iter().map(|d| d.version()).collect();
        if self.seen.borrow().as_ref() == Some(&versions) {
            trace!("{}: inputs unchanged", self.name);
            return false;
        }

        let value = (self.compute)();
        debug!("{}: recomputed ({} items)", self.name, value.len());
        *self.seen.borrow_mut() = Some(versions);
        self.output.set(value);
        true
    }

    fn invalidate(&self) {
        self.seen.borrow_mut().take();
    }
}

struct Pipeline {
    stages: Vec<Box<dyn Refresh>>,
}

impl Pipeline {
    fn run(&self) -> usize {
        batch(|| self.stages.iter().filter(|s| s.refresh()).count())
    }

    fn rerun_all(&self) -> usize {
        for stage in &self.stages {
            stage.invalidate();
        }
        self.run()
    }
}

/// Builds a [`Table`] from a dataset, a column tree and plugins.
pub struct TableBuilder<R> {
    data: Vec<R>,
    plugins: Vec<(String, Box<dyn Plugin<R>>)>,
}

impl<R: Record + Clone + 'static> TableBuilder<R> {
    /// Register a plugin under `name`. Plugins run in registration order.
    pub fn plugin(mut self, name: impl Into<String>, plugin: impl Plugin<R> + 'static) -> Self {
        self.plugins.push((name.into(), Box::new(plugin)));
        self
    }

    /// Validate the columns, initialise the plugins and run the pipeline once.
    pub fn build(self, columns: Vec<Column<R>>) -> Result<Table<R>> {
        validate_unique_ids(&columns)?;
        let mut names = HashSet::new();
        for (name, _) in &self.plugins {
            if !names.insert(name.as_str()) {
                return Err(TableError::DuplicatePlugin(name.clone()));
            }
        }

        let flat_columns: Rc<[Rc<DataColumn<R>>]> = flatten_columns(&columns).into();
        let columns: Rc<[Column<R>]> = columns.into();

        let data = Writable::new(self.data);
        let visible_columns = Writable::new(Vec::new());
        let original_rows = Writable::new(Vec::new());
        let columned_rows = Writable::new(Vec::new());
        let rows = Writable::new(Vec::new());
        let header_rows = Writable::new(Vec::new());

        let state = TableState {
            data: data.clone(),
            columns: Rc::clone(&columns),
            flat_columns: Rc::clone(&flat_columns),
            visible_columns: visible_columns.readable(),
            original_rows: original_rows.readable(),
            rows: rows.readable(),
        };

        let mut plugin_states = PluginStates::default();
        let mut column_transforms: Vec<ColumnsTransform<R>> = Vec::new();
        let mut row_transforms: Vec<RowsTransform<R>> = Vec::new();
        let mut header_hooks: Vec<(String, HeaderCellHook<R>)> = Vec::new();

        for (name, plugin) in self.plugins {
            debug!("initialising plugin \"{}\"", name);
            let cx = PluginContext {
                name: name.clone(),
                table_state: state.clone(),
            };
            let instance = plugin.init(&cx);
            column_transforms.extend(instance.columns_transform);
            row_transforms.extend(instance.rows_transform);
            if let Some(hook) = instance.hooks.header_cell {
                header_hooks.push((name.clone(), hook));
            }
            plugin_states.push(name, instance.state);
        }

        let column_deps: Vec<Dependency> = column_transforms
            .iter()
            .flat_map(|t| t.deps().iter().cloned())
            .collect();
        let row_deps: Vec<Dependency> = row_transforms
            .iter()
            .flat_map(|t| t.deps().iter().cloned())
            .collect();

        let visible_stage = {
            let flat_columns = Rc::clone(&flat_columns);
            Stage::new("visible_columns", visible_columns.clone(), column_deps.clone(), move || {
                column_transforms
                    .iter()
                    .fold(flat_columns.to_vec(), |cols, t| t.apply(cols))
            })
        };

        let original_stage = {
            let data = data.clone();
            let flat_columns = Rc::clone(&flat_columns);
            Stage::new("original_rows", original_rows.clone(), vec![data.dependency()], move || {
                data.with(|records| {
                    records
                        .iter()
                        .enumerate()
                        .map(|(i, r)| build_row(i.to_string(), Rc::new(r.clone()), &flat_columns))
                        .collect()
                })
            })
        };

        let columned_stage = {
            let original = original_rows.readable();
            let visible = visible_columns.readable();
            Stage::new(
                "columned_rows",
                columned_rows.clone(),
                vec![original.dependency(), visible.dependency()],
                move || {
                    let ids: Vec<String> =
                        visible.with(|cols| cols.iter().map(|c| c.id().to_string()).collect());
                    original.with(|rows| rows.iter().map(|r| select_columns(r, &ids)).collect())
                },
            )
        };

        let rows_stage = {
            let columned = columned_rows.readable();
            let mut deps = vec![columned.dependency()];
            deps.extend(row_deps.iter().cloned());
            Stage::new("rows", rows.clone(), deps, move || {
                row_transforms
                    .iter()
                    .fold(columned.get(), |rows, t| t.apply(rows))
            })
        };

        let headers_stage = {
            let visible = visible_columns.readable();
            let columns = Rc::clone(&columns);
            let state = state.clone();
            Stage::new(
                "header_rows",
                header_rows.clone(),
                vec![visible.dependency()],
                move || {
                    let ids: Vec<String> =
                        visible.with(|cols| cols.iter().map(|c| c.id().to_string()).collect());
                    let mut header_rows = build_header_rows(&columns, &ids);
                    for cell in header_rows.iter_mut().flat_map(|r| r.cells_mut()) {
                        cell.inject_state(state.clone());
                        for (name, hook) in &header_hooks {
                            let props = hook(&*cell);
                            cell.apply_hook(name.clone(), props);
                        }
                    }
                    header_rows
                },
            )
        };

        let pipeline = Rc::new(Pipeline {
            stages: vec![
                Box::new(visible_stage),
                Box::new(original_stage),
                Box::new(columned_stage),
                Box::new(rows_stage),
                Box::new(headers_stage),
            ],
        });

        let weak: Weak<Pipeline> = Rc::downgrade(&pipeline);
        let on_change: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(pipeline) = weak.upgrade() {
                trace!("input changed, re-running pipeline");
                pipeline.run();
            }
        });

        let mut subscriptions = Vec::new();
        let inputs = std::iter::once(data.dependency())
            .chain(column_deps)
            .chain(row_deps);
        for dep in inputs {
            let id = dep.subscribe_callback(Rc::clone(&on_change));
            subscriptions.push((dep, id));
        }

        let recomputed = pipeline.run();
        debug!(
            "table built: {} columns, {} plugins, {} stages computed",
            flat_columns.len(),
            plugin_states.len(),
            recomputed
        );

        Ok(Table {
            state,
            header_rows: header_rows.readable(),
            plugins: plugin_states,
            pipeline,
            subscriptions,
        })
    }
}

/// A table: dataset, columns and plugins, with every derived stage kept
/// current as inputs change.
///
/// ```rust
/// use tabstatelib::{column, group, ColumnDef, HiddenColumns, HiddenColumnsState, Table};
/// use serde_json::json;
///
/// let columns = vec![group(
///     "Person",
///     vec![
///         column(ColumnDef::new("Name").accessor("name")).unwrap(),
///         column(ColumnDef::new("Age").accessor("age")).unwrap(),
///     ],
/// )];
/// let table = Table::builder(vec![json!({"name": "Ada", "age": 36})])
///     .plugin("hide", HiddenColumns::new())
///     .build(columns)
///     .unwrap();
///
/// assert_eq!(table.header_rows().get()[0].cells()[0].colspan(), 2);
///
/// let hide = table.plugin_state::<HiddenColumnsState>("hide").unwrap();
/// hide.hide("age");
/// assert_eq!(table.header_rows().get()[0].cells()[0].colspan(), 1);
/// assert!(table.rows().get()[0].cell("age").is_none());
/// ```
pub struct Table<R> {
    state: TableState<R>,
    header_rows: Readable<Vec<HeaderRow<R>>>,
    plugins: PluginStates,
    pipeline: Rc<Pipeline>,
    subscriptions: Vec<(Dependency, SubscriptionId)>,
}

impl<R: Record + Clone + 'static> Table<R> {
    /// Start building a table over `data`.
    pub fn builder(data: Vec<R>) -> TableBuilder<R> {
        TableBuilder {
            data,
            plugins: Vec::new(),
        }
    }

    /// Build a table without plugins.
    pub fn new(data: Vec<R>, columns: Vec<Column<R>>) -> Result<Self> {
        Self::builder(data).build(columns)
    }

    /// Shared state handle
    pub fn state(&self) -> &TableState<R> {
        &self.state
    }

    /// The dataset store
    pub fn data(&self) -> &Writable<Vec<R>> {
        &self.state.data
    }

    /// Replace the dataset; every stage downstream of it recomputes.
    pub fn set_data(&self, data: Vec<R>) {
        self.state.data.set(data);
    }

    /// The column tree as declared
    pub fn columns(&self) -> &[Column<R>] {
        &self.state.columns
    }

    /// All data columns in declaration order
    pub fn flat_columns(&self) -> &[Rc<DataColumn<R>>] {
        &self.state.flat_columns
    }

    /// Visible data columns
    pub fn visible_columns(&self) -> &Readable<Vec<Rc<DataColumn<R>>>> {
        &self.state.visible_columns
    }

    /// Rows before any transform
    pub fn original_rows(&self) -> &Readable<Vec<BodyRow<R>>> {
        &self.state.original_rows
    }

    /// Final body rows
    pub fn rows(&self) -> &Readable<Vec<BodyRow<R>>> {
        &self.state.rows
    }

    /// Header rows, one per nesting level
    pub fn header_rows(&self) -> &Readable<Vec<HeaderRow<R>>> {
        &self.header_rows
    }

    /// Footer rows: the header rows in reverse order (column footers first,
    /// then each enclosing group level), keeping only levels where some
    /// visible column or group has a footer. Read labels with
    /// [`HeaderCell::footer`](crate::model::HeaderCell::footer).
    pub fn footer_rows(&self) -> Vec<HeaderRow<R>> {
        self.header_rows.with(|rows| {
            rows.iter()
                .rev()
                .filter(|row| row.cells().iter().any(|c| c.footer().is_some()))
                .cloned()
                .collect()
        })
    }

    /// All plugin states, keyed by plugin name
    pub fn plugin_states(&self) -> &PluginStates {
        &self.plugins
    }

    /// State of the plugin registered as `name`, if it is an `S`.
    pub fn plugin_state<S: 'static>(&self, name: &str) -> Option<Rc<S>> {
        self.plugins.get(name)
    }

    /// Recompute every stage from scratch, ignoring cached outputs.
    ///
    /// Returns the number of stages recomputed.
    pub fn recompute(&self) -> usize {
        self.pipeline.rerun_all()
    }
}

impl<R> Drop for Table<R> {
    fn drop(&mut self) {
        for (dep, id) in self.subscriptions.drain(..) {
            dep.unsubscribe(id);
        }
    }
}

impl<R> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("state", &self.state)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{column, group, group_with_footer, CellValue, ColumnDef, HeaderKind};
    use crate::plugin::{
        plugin_fn, HiddenColumns, HiddenColumnsState, PluginInstance, SortBy, SortByState,
        SortHeaderProps, SortKey, SortOrder,
    };
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn data(header: &str, accessor: &str) -> Column<Value> {
        column(ColumnDef::new(header).accessor(accessor)).unwrap()
    }

    fn people() -> Vec<Value> {
        vec![
            json!({"firstName": "b", "age": 30, "visits": 1}),
            json!({"firstName": "a", "age": 30, "visits": 2}),
            json!({"firstName": "c", "age": 20, "visits": 3}),
        ]
    }

    fn tree() -> Vec<Column<Value>> {
        vec![
            group("Name", vec![data("First Name", "firstName")]),
            group(
                "Info",
                vec![data("Age", "age"), data("Visits", "visits")],
            ),
        ]
    }

    fn table() -> Table<Value> {
        Table::builder(people())
            .plugin("hide", HiddenColumns::new())
            .plugin("sort", SortBy::new())
            .build(tree())
            .unwrap()
    }

    fn first_names(table: &Table<Value>) -> Vec<String> {
        table
            .rows()
            .get()
            .iter()
            .map(|r| r.value("firstName").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_initial_derivation() {
        let t = table();
        assert_eq!(t.visible_columns().get().len(), 3);
        assert_eq!(t.rows().get().len(), 3);
        assert_eq!(t.original_rows().get().len(), 3);
        assert_eq!(t.header_rows().get().len(), 2);
        assert_eq!(first_names(&t), ["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_column_ids_rejected() {
        let columns = vec![
            group("A", vec![data("First", "firstName")]),
            group("B", vec![data("Again", "firstName")]),
        ];
        let err = Table::new(people(), columns).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumnId("firstName".into()));
    }

    #[test]
    fn test_duplicate_plugin_names_rejected() {
        let err = Table::builder(people())
            .plugin("sort", SortBy::new())
            .plugin("sort", SortBy::new())
            .build(tree())
            .unwrap_err();
        assert_eq!(err, TableError::DuplicatePlugin("sort".into()));
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let t = table();
        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();
        sort.sort_keys.set(vec![SortKey::desc("visits")]);

        let before = t.rows().get();
        assert_eq!(t.recompute(), 5);
        let after = t.rows().get();

        assert_eq!(before, after);
        assert!(!Rc::ptr_eq(&before[0].cells()[0], &after[0].cells()[0]));
    }

    #[test]
    fn test_unchanged_inputs_skip_recompute() {
        let t = table();
        assert_eq!(t.pipeline.run(), 0);
    }

    #[test]
    fn test_hiding_column_projects_rows_and_headers() {
        let t = table();
        let before = t.rows().get();
        let hide = t.plugin_state::<HiddenColumnsState>("hide").unwrap();

        hide.hide("age");

        let rows = t.rows().get();
        for (row, old) in rows.iter().zip(&before) {
            assert!(row.cell("age").is_none());
            assert_eq!(row.value("firstName"), old.value("firstName"));
            assert_eq!(row.value("visits"), old.value("visits"));
            assert!(Rc::ptr_eq(
                row.cell("visits").unwrap(),
                old.cell("visits").unwrap()
            ));
        }

        let headers = t.header_rows().get();
        let info = &headers[0].cells()[1];
        assert_eq!(info.label(), "Info");
        assert_eq!(info.colspan(), 1);
        assert!(headers.iter().all(|r| r.width() == 2));

        // Original rows are not projected.
        assert!(t.original_rows().get()[0].cell("age").is_some());
    }

    #[test]
    fn test_sort_toggle_reorders_rows() {
        let t = table();
        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();

        sort.sort_keys.toggle("age", true);
        assert_eq!(first_names(&t), ["c", "b", "a"]);

        sort.sort_keys.toggle("firstName", true);
        assert_eq!(first_names(&t), ["c", "a", "b"]);

        let pre_sorted: Vec<_> = sort
            .pre_sorted_rows
            .get()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(pre_sorted, ["0", "1", "2"]);
    }

    #[test]
    fn test_toggle_sort_while_reading_rows() {
        let t = table();
        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();

        let seen = t.rows().with(|rows| {
            sort.sort_keys.toggle("age", true);
            rows.iter().map(|r| r.id().to_string()).collect::<Vec<_>>()
        });

        assert_eq!(seen, ["0", "1", "2"]);
        assert_eq!(sort.sort_keys.get(), vec![SortKey::asc("age")]);
        assert_eq!(first_names(&t), ["c", "b", "a"]);
    }

    #[test]
    fn test_hide_column_while_reading_visible_columns() {
        let t = table();
        let hide = t.plugin_state::<HiddenColumnsState>("hide").unwrap();

        t.visible_columns().with(|cols| {
            for c in cols.iter().filter(|c| c.id() != "firstName") {
                hide.hide(c.id());
            }
        });

        assert_eq!(t.visible_columns().get().len(), 1);
        assert!(t.rows().get()[0].cell("age").is_none());
        assert_eq!(t.header_rows().get()[0].cells()[0].label(), "Name");
    }

    #[test]
    fn test_header_props_toggle_sort() {
        let t = table();
        let headers = t.header_rows().get();
        let age = headers[1]
            .cells()
            .iter()
            .find(|c| c.id() == "age")
            .unwrap();
        let props = age.props::<SortHeaderProps>("sort").unwrap();
        assert_eq!(props.order(), None);

        props.toggle();
        assert_eq!(props.order(), Some(SortOrder::Asc));
        assert_eq!(first_names(&t), ["c", "b", "a"]);

        props.toggle();
        assert_eq!(props.order(), Some(SortOrder::Desc));
        assert_eq!(first_names(&t), ["b", "a", "c"]);
    }

    #[test]
    fn test_group_header_toggle_is_noop() {
        let t = table();
        let headers = t.header_rows().get();
        let group = &headers[0].cells()[0];
        assert_eq!(group.kind(), HeaderKind::Group);

        let props = group.props::<SortHeaderProps>("sort").unwrap();
        props.toggle();
        assert_eq!(props.order(), None);

        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();
        assert!(sort.sort_keys.get().is_empty());
    }

    #[test]
    fn test_header_cells_carry_table_state() {
        let t = table();
        let headers = t.header_rows().get();
        let state = headers[1].cells()[0].state().unwrap();
        assert_eq!(state.rows.get().len(), 3);
    }

    #[test]
    fn test_batch_recomputes_each_stage_once() {
        let t = table();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        t.rows().subscribe(move || counter.set(counter.get() + 1));

        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();
        let hide = t.plugin_state::<HiddenColumnsState>("hide").unwrap();
        batch(|| {
            t.set_data(people());
            sort.sort_keys.toggle("age", true);
            hide.hide("visits");
        });

        assert_eq!(runs.get(), 1);
        assert_eq!(first_names(&t), ["c", "b", "a"]);
        assert!(t.rows().get()[0].cell("visits").is_none());
    }

    #[test]
    fn test_set_data_rebuilds_rows() {
        let t = table();
        t.set_data(vec![json!({"firstName": "z", "age": 1, "visits": 0})]);
        assert_eq!(first_names(&t), ["z"]);
        assert_eq!(t.original_rows().get().len(), 1);
    }

    #[test]
    fn test_sort_by_hidden_column_keeps_order() {
        let t = table();
        let hide = t.plugin_state::<HiddenColumnsState>("hide").unwrap();
        let sort = t.plugin_state::<SortByState<Value>>("sort").unwrap();
        hide.hide("visits");
        sort.sort_keys.set(vec![SortKey::desc("visits")]);
        assert_eq!(first_names(&t), ["b", "a", "c"]);
    }

    #[test]
    fn test_custom_plugin_reads_table_state() {
        let t = Table::builder(people())
            .plugin(
                "count",
                plugin_fn(|cx: &PluginContext<Value>| {
                    PluginInstance::new(cx.table_state.flat_columns.len())
                }),
            )
            .build(tree())
            .unwrap();
        assert_eq!(t.plugin_state::<usize>("count").as_deref(), Some(&3));
        assert!(t.plugin_state::<String>("count").is_none());
    }

    #[test]
    fn test_row_transforms_fold_in_registration_order() {
        let take_two = plugin_fn(|_: &PluginContext<Value>| {
            PluginInstance::new(()).rows_transform(RowsTransform::new(|rows: Vec<BodyRow<Value>>| {
                rows.into_iter().take(2).collect()
            }))
        });
        let t = Table::builder(people())
            .plugin("sort", SortBy::new().initial_keys(vec![SortKey::asc("age")]))
            .plugin("take", take_two)
            .build(tree())
            .unwrap();
        assert_eq!(first_names(&t), ["c", "b"]);
    }

    #[test]
    #[should_panic(expected = "transform failed")]
    fn test_transform_panic_propagates() {
        let failing = plugin_fn(|_: &PluginContext<Value>| {
            let armed = Writable::new(false);
            let flag = armed.clone();
            let transform = RowsTransform::new(move |rows: Vec<BodyRow<Value>>| {
                if flag.get() {
                    panic!("transform failed");
                }
                rows
            })
            .depends_on(armed.dependency());
            PluginInstance::new(armed).rows_transform(transform)
        });
        let t = Table::builder(people())
            .plugin("fail", failing)
            .build(tree())
            .unwrap();
        let armed = t.plugin_state::<Writable<bool>>("fail").unwrap();
        armed.set(true);
    }

    fn footer_labels(table: &Table<Value>) -> Vec<Vec<(String, usize)>> {
        table
            .footer_rows()
            .iter()
            .map(|row| {
                row.cells()
                    .iter()
                    .map(|c| (c.footer().unwrap_or_default().to_string(), c.colspan()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_footer_rows() {
        let columns = vec![
            column(ColumnDef::new("Age").accessor("age").footer("avg")).unwrap(),
            data("Visits", "visits"),
        ];
        let t = Table::new(people(), columns).unwrap();
        assert_eq!(
            footer_labels(&t),
            [[("avg".to_string(), 1), (String::new(), 1)]]
        );

        let t = Table::new(people(), tree()).unwrap();
        assert!(t.footer_rows().is_empty());
    }

    #[test]
    fn test_group_footer_mirrors_header_grouping() {
        let columns = vec![
            group("Name", vec![data("First Name", "firstName")]),
            group_with_footer(
                "Info",
                "per visit",
                vec![
                    column(ColumnDef::new("Age").accessor("age").footer("years")).unwrap(),
                    data("Visits", "visits"),
                ],
            ),
        ];
        let t = Table::builder(people())
            .plugin("hide", HiddenColumns::new())
            .build(columns)
            .unwrap();

        assert_eq!(
            footer_labels(&t),
            [
                vec![
                    (String::new(), 1),
                    ("years".to_string(), 1),
                    (String::new(), 1)
                ],
                vec![(String::new(), 1), ("per visit".to_string(), 2)],
            ]
        );

        let hide = t.plugin_state::<HiddenColumnsState>("hide").unwrap();
        hide.hide("age");
        assert_eq!(
            footer_labels(&t),
            [vec![(String::new(), 1), ("per visit".to_string(), 1)]]
        );
    }

    #[test]
    fn test_dropped_table_stops_listening() {
        let t = table();
        let data = t.data().clone();
        let rows = t.rows().clone();
        drop(t);

        data.set(vec![json!({"firstName": "z"})]);
        assert_eq!(rows.get().len(), 3);
        assert_eq!(data.get()[0]["firstName"], json!("z"));
    }

    #[test]
    fn test_cell_values_follow_accessors() {
        let t = table();
        let row = &t.rows().get()[2];
        assert_eq!(row.value("age"), Some(&CellValue::from(20)));
    }
}
