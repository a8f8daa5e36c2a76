//! Header rows derived from the column tree and the visible columns.
//!
//! One header row is produced per nesting level. Groups sit on the row of
//! their depth; data column headers always sit on the last row. A data column
//! that is shallower than the deepest visible column gets empty placeholder
//! cells above it. Adjacent cells of the same group merge into one cell whose
//! colspan counts the visible leaves beneath it, so a group whose leaves are
//! all hidden produces nothing at all.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::model::column::{Column, DataColumn};
use crate::table::TableState;

/// What a header cell stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderKind {
    /// Header of a data column
    Data,
    /// Header of a column group
    Group,
    /// Empty filler above a shallow data column
    Display,
}

/// A cell in a header row.
pub struct HeaderCell<R> {
    id: String,
    label: String,
    colspan: usize,
    kind: HeaderKind,
    footer: Option<String>,
    props: BTreeMap<String, Rc<dyn Any>>,
    state: Option<TableState<R>>,
}

impl<R> HeaderCell<R> {
    fn new(id: impl Into<String>, label: impl Into<String>, colspan: usize, kind: HeaderKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            colspan,
            kind,
            footer: None,
            props: BTreeMap::new(),
            state: None,
        }
    }

    fn with_footer(mut self, footer: Option<&str>) -> Self {
        self.footer = footer.map(str::to_string);
        self
    }

    /// Cell id. For data and placeholder cells this is the column id
    /// underneath; for groups it is `group-<n>` in declaration order.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of visible data columns spanned
    pub fn colspan(&self) -> usize {
        self.colspan
    }

    /// The cell kind
    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    /// Footer label of the column or group under this cell
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// Whether this is the header of a real data column
    pub fn is_data(&self) -> bool {
        self.kind == HeaderKind::Data
    }

    /// Props contributed by the plugin registered as `plugin`, if they are a `T`.
    pub fn props<T: 'static>(&self, plugin: &str) -> Option<Rc<T>> {
        self.props
            .get(plugin)
            .and_then(|p| Rc::clone(p).downcast::<T>().ok())
    }

    /// Names of the plugins that contributed props to this cell
    pub fn prop_plugins(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    /// Attach props under a plugin name.
    pub fn apply_hook(&mut self, plugin: impl Into<String>, props: Rc<dyn Any>) {
        self.props.insert(plugin.into(), props);
    }

    /// The shared table state, once the cell belongs to a table.
    pub fn state(&self) -> Option<&TableState<R>> {
        self.state.as_ref()
    }

    /// Attach the shared table state.
    pub fn inject_state(&mut self, state: TableState<R>) {
        self.state = Some(state);
    }
}

impl<R> Clone for HeaderCell<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            colspan: self.colspan,
            kind: self.kind,
            footer: self.footer.clone(),
            props: self.props.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R> fmt::Debug for HeaderCell<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderCell")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("colspan", &self.colspan)
            .field("kind", &self.kind)
            .field("footer", &self.footer)
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One row of header cells.
pub struct HeaderRow<R> {
    id: String,
    cells: Vec<HeaderCell<R>>,
}

impl<R> HeaderRow<R> {
    /// Row id (its depth)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cells left to right
    pub fn cells(&self) -> &[HeaderCell<R>] {
        &self.cells
    }

    /// Mutable access to the cells, used while decorating
    pub fn cells_mut(&mut self) -> &mut [HeaderCell<R>] {
        &mut self.cells
    }

    /// Sum of colspans; equals the number of visible columns
    pub fn width(&self) -> usize {
        self.cells.iter().map(|c| c.colspan).sum()
    }
}

impl<R> Clone for HeaderRow<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            cells: self.cells.clone(),
        }
    }
}

impl<R> fmt::Debug for HeaderRow<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderRow")
            .field("id", &self.id)
            .field("cells", &self.cells)
            .finish()
    }
}

#[derive(Clone, Copy)]
struct GroupRef<'a> {
    index: usize,
    label: &'a str,
    footer: Option<&'a str>,
}

enum Slot<'a, R> {
    Group(GroupRef<'a>),
    Placeholder(&'a str),
    Data(&'a DataColumn<R>),
}

fn collect_leaf_paths<'a, R>(
    columns: &'a [Column<R>],
    path: &mut Vec<GroupRef<'a>>,
    next_group: &mut usize,
    out: &mut HashMap<&'a str, (&'a DataColumn<R>, Vec<GroupRef<'a>>)>,
) {
    for c in columns {
        match c {
            Column::Data(data) => {
                out.insert(data.id(), (data.as_ref(), path.clone()));
            }
            Column::Group(g) => {
                path.push(GroupRef {
                    index: *next_group,
                    label: g.header(),
                    footer: g.footer(),
                });
                *next_group += 1;
                collect_leaf_paths(g.columns(), path, next_group, out);
                path.pop();
            }
        }
    }
}

/// Build header rows for the visible columns, in visible order.
///
/// Ids in `visible_column_ids` that are not in the tree are ignored.
pub fn build_header_rows<R, S: AsRef<str>>(
    columns: &[Column<R>],
    visible_column_ids: &[S],
) -> Vec<HeaderRow<R>> {
    let mut paths = HashMap::new();
    collect_leaf_paths(columns, &mut Vec::new(), &mut 0, &mut paths);

    let leaves: Vec<_> = visible_column_ids
        .iter()
        .filter_map(|id| paths.get(id.as_ref()))
        .collect();
    let Some(height) = leaves.iter().map(|(_, path)| path.len() + 1).max() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<Slot<'_, R>>> = (0..height).map(|_| Vec::new()).collect();
    for (data, path) in &leaves {
        for (depth, row) in grid.iter_mut().enumerate().take(height - 1) {
            match path.get(depth) {
                Some(group) => row.push(Slot::Group(*group)),
                None => row.push(Slot::Placeholder(data.id())),
            }
        }
        grid[height - 1].push(Slot::Data(data));
    }

    grid.into_iter()
        .enumerate()
        .map(|(depth, slots)| HeaderRow {
            id: depth.to_string(),
            cells: merge_slots(slots),
        })
        .collect()
}

fn merge_slots<R>(slots: Vec<Slot<'_, R>>) -> Vec<HeaderCell<R>> {
    let mut cells: Vec<HeaderCell<R>> = Vec::new();
    let mut last_group: Option<usize> = None;

    for slot in slots {
        match slot {
            Slot::Group(group) => {
                if last_group == Some(group.index) {
                    if let Some(cell) = cells.last_mut() {
                        cell.colspan += 1;
                        continue;
                    }
                }
                cells.push(
                    HeaderCell::new(
                        format!("group-{}", group.index),
                        group.label,
                        1,
                        HeaderKind::Group,
                    )
                    .with_footer(group.footer),
                );
                last_group = Some(group.index);
            }
            Slot::Placeholder(id) => {
                cells.push(HeaderCell::new(id, "", 1, HeaderKind::Display));
                last_group = None;
            }
            Slot::Data(data) => {
                cells.push(
                    HeaderCell::new(data.id(), data.header(), 1, HeaderKind::Data)
                        .with_footer(data.footer()),
                );
                last_group = None;
            }
        }
    }

    cells
}
