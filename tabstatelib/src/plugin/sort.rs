//! Sort plugin: multi-key, toggleable row sorting.
//!
//! The plugin keeps an ordered list of [`SortKey`]s (first key = highest
//! priority) and contributes a row transform that stably sorts rows by those
//! keys. Header cells get [`SortHeaderProps`] with the column's current order
//! and a `toggle` bound to that column.
//!
//! ```rust
//! use tabstatelib::{column, ColumnDef, SortBy, SortByState, SortOrder, Table};
//! use serde_json::json;
//!
//! let table = Table::builder(vec![json!({"age": 30}), json!({"age": 20})])
//!     .plugin("sort", SortBy::new())
//!     .build(vec![column(ColumnDef::new("Age").accessor("age")).unwrap()])
//!     .unwrap();
//!
//! let sort = table.plugin_state::<SortByState<serde_json::Value>>("sort").unwrap();
//! sort.sort_keys.toggle("age", false);
//! assert_eq!(sort.sort_keys.get()[0].order, SortOrder::Asc);
//! assert_eq!(table.rows().get()[0].id(), "1");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::TableError;
use crate::model::{BodyRow, CellValue, HeaderCell};
use crate::plugin::{Plugin, PluginContext, PluginInstance, RowsTransform};
use crate::reactive::{Dependency, Readable, SubscriptionId, Writable};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (A-Z, smallest first)
    #[default]
    Asc,
    /// Descending (Z-A, largest first)
    Desc,
}

impl SortOrder {
    /// Apply this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// One sort criterion: a column id and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Column to sort by
    pub id: String,
    /// Direction
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    /// Ascending key on `id`
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending key on `id`
    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Parses `id`, `id:asc` or `id:desc`.
///
/// A suffix after the last `:` is a direction only when it parses as one;
/// otherwise the whole text is the id, so `time:stamp` sorts ascending by the
/// column `time:stamp`.
impl FromStr for SortKey {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, order) = s
            .rsplit_once(':')
            .and_then(|(id, order)| order.parse::<SortOrder>().ok().map(|o| (id, o)))
            .unwrap_or((s, SortOrder::Asc));
        if id.is_empty() {
            return Err(TableError::InvalidSortKey(s.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            order,
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.order)
    }
}

/// Compute the sort keys after toggling `id`.
///
/// Single-sort cycles the column through asc, desc and unsorted, replacing any
/// other key. Multi-sort appends new columns at the lowest priority, flips an
/// ascending key in place and removes a descending one, leaving the rest in
/// their order.
pub fn toggled_sort_keys(keys: &[SortKey], id: &str, multi_sort: bool) -> Vec<SortKey> {
    let position = keys.iter().position(|k| k.id == id);

    if !multi_sort {
        return match position.map(|i| keys[i].order) {
            None => vec![SortKey::asc(id)],
            Some(SortOrder::Asc) => vec![SortKey::desc(id)],
            Some(SortOrder::Desc) => Vec::new(),
        };
    }

    let mut next = keys.to_vec();
    match position {
        None => next.push(SortKey::asc(id)),
        Some(i) if next[i].order == SortOrder::Asc => next[i].order = SortOrder::Desc,
        Some(i) => {
            next.remove(i);
        }
    }
    next
}

/// Observable, ordered sort keys.
#[derive(Clone, Debug)]
pub struct SortKeys {
    keys: Writable<Vec<SortKey>>,
}

impl SortKeys {
    /// Create with initial keys.
    pub fn new(initial: Vec<SortKey>) -> Self {
        Self {
            keys: Writable::new(initial),
        }
    }

    /// Current keys, highest priority first
    pub fn get(&self) -> Vec<SortKey> {
        self.keys.get()
    }

    /// Borrow the current keys
    pub fn with<U>(&self, f: impl FnOnce(&[SortKey]) -> U) -> U {
        self.keys.with(|k| f(k))
    }

    /// Replace all keys
    pub fn set(&self, keys: Vec<SortKey>) {
        self.keys.set(keys);
    }

    /// Remove all keys
    pub fn clear(&self) {
        self.keys.set(Vec::new());
    }

    /// Toggle the key for `id`; see [`toggled_sort_keys`].
    pub fn toggle(&self, id: &str, multi_sort: bool) {
        let next = self.keys.with(|keys| toggled_sort_keys(keys, id, multi_sort));
        self.keys.set(next);
    }

    /// Current order for `id`, if it is sorted
    pub fn order_of(&self, id: &str) -> Option<SortOrder> {
        self.keys
            .with(|keys| keys.iter().find(|k| k.id == id).map(|k| k.order))
    }

    /// Call `f` after every change
    pub fn subscribe(&self, f: impl Fn() + 'static) -> SubscriptionId {
        self.keys.subscribe(f)
    }

    /// Remove a subscription
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.keys.unsubscribe(id);
    }

    /// Dependency handle for transforms that read the keys
    pub fn dependency(&self) -> Dependency {
        self.keys.dependency()
    }
}

/// Per-column sort options.
#[derive(Clone, Default)]
pub struct SortColumnOptions {
    sort_on: Option<Rc<dyn Fn(&CellValue) -> CellValue>>,
}

impl SortColumnOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: compare cells by the value `f` extracts instead of the raw value
    pub fn sort_on(mut self, f: impl Fn(&CellValue) -> CellValue + 'static) -> Self {
        self.sort_on = Some(Rc::new(f));
        self
    }

    /// The extractor, if any
    pub fn sort_key_fn(&self) -> Option<&Rc<dyn Fn(&CellValue) -> CellValue>> {
        self.sort_on.as_ref()
    }
}

impl fmt::Debug for SortColumnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortColumnOptions")
            .field("sort_on", &self.sort_on.is_some())
            .finish()
    }
}

fn compare_by_key<R>(a: &BodyRow<R>, b: &BodyRow<R>, key: &SortKey) -> Ordering {
    let (Some(cell_a), Some(cell_b)) = (a.cell(&key.id), b.cell(&key.id)) else {
        return Ordering::Equal;
    };
    let extract = cell_a
        .column()
        .option::<SortColumnOptions>()
        .and_then(|o| o.sort_key_fn());
    match extract {
        Some(f) => CellValue::compare(&f(cell_a.value()), &f(cell_b.value())),
        None => CellValue::compare(cell_a.value(), cell_b.value()),
    }
}

fn compare_rows<R>(a: &BodyRow<R>, b: &BodyRow<R>, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .map(|key| key.order.apply(compare_by_key(a, b, key)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Stably sort `rows` by `keys`, first key first.
///
/// Rows lacking a key's column (for instance because it is hidden) compare
/// equal on that key.
pub fn sort_rows<R>(mut rows: Vec<BodyRow<R>>, keys: &[SortKey]) -> Vec<BodyRow<R>> {
    if !keys.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, keys));
    }
    rows
}

/// State exposed by the sort plugin.
pub struct SortByState<R> {
    /// The sort keys; drive these to change the sort
    pub sort_keys: SortKeys,
    /// Rows as they entered the sort transform
    pub pre_sorted_rows: Readable<Vec<BodyRow<R>>>,
    /// Whether header toggles add to the existing keys
    pub multi_sort: bool,
}

impl<R: 'static> fmt::Debug for SortByState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortByState")
            .field("sort_keys", &self.sort_keys.get())
            .field("multi_sort", &self.multi_sort)
            .finish()
    }
}

/// Props the sort plugin attaches to each header cell.
#[derive(Debug, Clone)]
pub struct SortHeaderProps {
    column_id: String,
    is_data: bool,
    multi_sort: bool,
    keys: SortKeys,
}

impl SortHeaderProps {
    /// Current order of this cell's column, or `None` when unsorted
    pub fn order(&self) -> Option<SortOrder> {
        if self.is_data {
            self.keys.order_of(&self.column_id)
        } else {
            None
        }
    }

    /// Toggle sorting on this cell's column; no-op for non-data cells
    pub fn toggle(&self) {
        if self.is_data {
            self.keys.toggle(&self.column_id, self.multi_sort);
        }
    }
}

/// Sort plugin configuration.
#[derive(Debug, Clone)]
pub struct SortBy {
    multi_sort: bool,
    initial_keys: Vec<SortKey>,
}

impl Default for SortBy {
    fn default() -> Self {
        Self {
            multi_sort: true,
            initial_keys: Vec::new(),
        }
    }
}

impl SortBy {
    /// Multi-sort enabled, no initial keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: whether header toggles add to the existing keys
    pub fn multi_sort(mut self, multi_sort: bool) -> Self {
        self.multi_sort = multi_sort;
        self
    }

    /// Builder: start with these keys
    pub fn initial_keys(mut self, keys: Vec<SortKey>) -> Self {
        self.initial_keys = keys;
        self
    }
}

impl<R: 'static> Plugin<R> for SortBy {
    fn init(self: Box<Self>, _cx: &PluginContext<R>) -> PluginInstance<R> {
        let sort_keys = SortKeys::new(self.initial_keys);
        let pre_sorted_rows = Writable::new(Vec::new());
        let multi_sort = self.multi_sort;

        let transform = {
            let keys = sort_keys.clone();
            let pre_sorted_rows = pre_sorted_rows.clone();
            RowsTransform::new(move |rows: Vec<BodyRow<R>>| {
                pre_sorted_rows.set(rows.clone());
                keys.with(|keys| sort_rows(rows, keys))
            })
            .depends_on(sort_keys.dependency())
        };

        let hook_keys = sort_keys.clone();
        let state = SortByState {
            sort_keys,
            pre_sorted_rows: pre_sorted_rows.readable(),
            multi_sort,
        };

        PluginInstance::new(state)
            .rows_transform(transform)
            .header_cell_hook(move |cell: &HeaderCell<R>| SortHeaderProps {
                column_id: cell.id().to_string(),
                is_data: cell.is_data(),
                multi_sort,
                keys: hook_keys.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_rows, column, flatten_columns, ColumnDef};
    use serde_json::{json, Value};

    fn keys(pairs: &[(&str, SortOrder)]) -> Vec<SortKey> {
        pairs
            .iter()
            .map(|(id, order)| SortKey {
                id: id.to_string(),
                order: *order,
            })
            .collect()
    }

    fn people() -> Vec<BodyRow<Value>> {
        let columns = vec![
            column(ColumnDef::new("Age").accessor("age")).unwrap(),
            column(ColumnDef::new("Name").accessor("name")).unwrap(),
        ];
        let records = vec![
            json!({"age": 30, "name": "b"}),
            json!({"age": 30, "name": "a"}),
            json!({"age": 20, "name": "c"}),
        ];
        build_rows(&records, &flatten_columns(&columns))
    }

    fn names(rows: &[BodyRow<Value>]) -> Vec<String> {
        rows.iter()
            .map(|r| r.value("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_toggle_single_sort_cycle() {
        let k0 = Vec::new();
        let k1 = toggled_sort_keys(&k0, "age", false);
        assert_eq!(k1, keys(&[("age", SortOrder::Asc)]));
        let k2 = toggled_sort_keys(&k1, "age", false);
        assert_eq!(k2, keys(&[("age", SortOrder::Desc)]));
        let k3 = toggled_sort_keys(&k2, "age", false);
        assert!(k3.is_empty());
    }

    #[test]
    fn test_toggle_single_sort_replaces_other_keys() {
        let start = keys(&[("age", SortOrder::Asc), ("name", SortOrder::Desc)]);
        assert_eq!(
            toggled_sort_keys(&start, "status", false),
            keys(&[("status", SortOrder::Asc)])
        );
        assert_eq!(
            toggled_sort_keys(&start, "name", false),
            Vec::<SortKey>::new()
        );
    }

    #[test]
    fn test_toggle_multi_sort_cycle() {
        let k1 = toggled_sort_keys(&[], "age", true);
        assert_eq!(k1, keys(&[("age", SortOrder::Asc)]));
        let k2 = toggled_sort_keys(&k1, "name", true);
        assert_eq!(
            k2,
            keys(&[("age", SortOrder::Asc), ("name", SortOrder::Asc)])
        );
        let k3 = toggled_sort_keys(&k2, "age", true);
        assert_eq!(
            k3,
            keys(&[("age", SortOrder::Desc), ("name", SortOrder::Asc)])
        );
        let k4 = toggled_sort_keys(&k3, "age", true);
        assert_eq!(k4, keys(&[("name", SortOrder::Asc)]));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let sorted = sort_rows(people(), &[SortKey::asc("age")]);
        assert_eq!(names(&sorted), ["c", "b", "a"]);
    }

    #[test]
    fn test_multi_key_sort() {
        let sorted = sort_rows(people(), &[SortKey::asc("age"), SortKey::asc("name")]);
        assert_eq!(names(&sorted), ["c", "a", "b"]);
    }

    #[test]
    fn test_descending_primary_key() {
        let sorted = sort_rows(people(), &[SortKey::desc("age"), SortKey::asc("name")]);
        assert_eq!(names(&sorted), ["a", "b", "c"]);
    }

    #[test]
    fn test_no_keys_keeps_order() {
        let sorted = sort_rows(people(), &[]);
        assert_eq!(names(&sorted), ["b", "a", "c"]);
    }

    #[test]
    fn test_missing_column_compares_equal() {
        let sorted = sort_rows(people(), &[SortKey::asc("nope")]);
        assert_eq!(names(&sorted), ["b", "a", "c"]);
    }

    #[test]
    fn test_mixed_values_compare_equal() {
        let columns = vec![column(ColumnDef::new("V").accessor("v")).unwrap()];
        let records = vec![json!({"v": "x"}), json!({"v": 1}), json!({"v": null})];
        let rows = build_rows(&records, &flatten_columns(&columns));
        let sorted = sort_rows(rows, &[SortKey::asc("v")]);
        let ids: Vec<_> = sorted.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
    }

    #[test]
    fn test_custom_sort_key_extractor() {
        let columns = vec![column(
            ColumnDef::new("Name").accessor("name").option(
                SortColumnOptions::new()
                    .sort_on(|v| v.as_str().map(|s| s.len() as f64).into()),
            ),
        )
        .unwrap()];
        let records = vec![
            json!({"name": "ccc"}),
            json!({"name": "a"}),
            json!({"name": "bb"}),
        ];
        let rows = build_rows(&records, &flatten_columns(&columns));
        let sorted = sort_rows(rows, &[SortKey::asc("name")]);
        assert_eq!(names(&sorted), ["a", "bb", "ccc"]);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("age".parse::<SortKey>().unwrap(), SortKey::asc("age"));
        assert_eq!("age:desc".parse::<SortKey>().unwrap(), SortKey::desc("age"));
        assert_eq!(
            "a:b:asc".parse::<SortKey>().unwrap(),
            SortKey::asc("a:b")
        );
        assert_eq!(
            "time:stamp".parse::<SortKey>().unwrap(),
            SortKey::asc("time:stamp")
        );
        assert_eq!(
            "time:stamp:desc".parse::<SortKey>().unwrap(),
            SortKey::desc("time:stamp")
        );
        assert!(":asc".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_sort_keys_store_toggle() {
        let store = SortKeys::new(Vec::new());
        store.toggle("age", true);
        store.toggle("name", true);
        assert_eq!(store.order_of("age"), Some(SortOrder::Asc));
        assert_eq!(store.order_of("name"), Some(SortOrder::Asc));
        store.clear();
        assert!(store.get().is_empty());
    }
}
