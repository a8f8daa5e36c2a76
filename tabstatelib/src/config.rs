//! Declarative table configuration for JSON datasets.
//!
//! A `TableConfig` describes the column tree, the initial sort and the hidden
//! columns, and builds a [`Table`] over `serde_json::Value` records with the
//! sort and hidden-columns plugins registered under [`SORT_PLUGIN`] and
//! [`HIDE_PLUGIN`].
//!
//! ```json
//! {
//!   "columns": [
//!     {"header": "Name", "columns": [{"header": "First", "accessor": "firstName"}]},
//!     {"header": "Age", "accessor": "age"}
//!   ],
//!   "sort": ["age:desc"],
//!   "hidden": ["visits", "progress*"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TableError;
use crate::model::{column, flatten_columns, group, group_with_footer, Column, ColumnDef};
use crate::plugin::{HiddenColumns, SortBy, SortKey};
use crate::table::Table;
use crate::Result;

/// Name the sort plugin is registered under
pub const SORT_PLUGIN: &str = "sort";

/// Name the hidden-columns plugin is registered under
pub const HIDE_PLUGIN: &str = "hide";

/// One node of a configured column tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    /// A header group
    Group {
        header: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        footer: Option<String>,
        columns: Vec<ColumnSpec>,
    },
    /// A data column reading a field path
    Data {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessor: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        footer: Option<String>,
    },
}

impl ColumnSpec {
    /// A data column whose id, header and accessor are all `field`
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        ColumnSpec::Data {
            header: Some(field.clone()),
            accessor: Some(field),
            id: None,
            footer: None,
        }
    }

    fn to_column(&self) -> Result<Column<Value>> {
        match self {
            ColumnSpec::Group {
                header,
                footer,
                columns,
            } => {
                let children = columns
                    .iter()
                    .map(ColumnSpec::to_column)
                    .collect::<Result<Vec<_>>>()?;
                Ok(match footer {
                    Some(footer) => group_with_footer(header.as_str(), footer.as_str(), children),
                    None => group(header.as_str(), children),
                })
            }
            ColumnSpec::Data {
                header,
                accessor,
                id,
                footer,
            } => {
                let label = header
                    .as_deref()
                    .or(id.as_deref())
                    .or(accessor.as_deref())
                    .unwrap_or_default();
                let mut def = ColumnDef::new(label);
                if let Some(accessor) = accessor {
                    def = def.accessor(accessor.as_str());
                }
                if let Some(id) = id {
                    def = def.id(id.as_str());
                }
                if let Some(footer) = footer {
                    def = def.footer(footer.as_str());
                }
                column(def)
            }
        }
    }
}

fn default_multi_sort() -> bool {
    true
}

/// Table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Column tree
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// Initial sort keys as `id`, `id:asc` or `id:desc`, highest priority first
    #[serde(default)]
    pub sort: Vec<String>,
    /// Whether header toggles add to the existing keys
    #[serde(default = "default_multi_sort")]
    pub multi_sort: bool,
    /// Hidden column ids or glob patterns
    #[serde(default)]
    pub hidden: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            sort: Vec::new(),
            multi_sort: true,
            hidden: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a flat column list from the keys of the first object record.
    pub fn infer(records: &[Value]) -> Self {
        let columns = records
            .iter()
            .find_map(Value::as_object)
            .map(|obj| obj.keys().map(ColumnSpec::field).collect())
            .unwrap_or_default();
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Builder: append initial sort keys
    pub fn sort(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sort.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Builder: enable or disable multi-sort
    pub fn multi_sort(mut self, multi_sort: bool) -> Self {
        self.multi_sort = multi_sort;
        self
    }

    /// Builder: append hidden ids or patterns
    pub fn hidden(mut self, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hidden.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Build the column tree.
    pub fn build_columns(&self) -> Result<Vec<Column<Value>>> {
        self.columns.iter().map(ColumnSpec::to_column).collect()
    }

    /// Parse the configured sort keys.
    pub fn sort_keys(&self) -> Result<Vec<SortKey>> {
        self.sort.iter().map(|s| s.parse()).collect()
    }

    /// Build a table over `records`.
    ///
    /// Fails on invalid columns, unparsable sort keys, sort keys or plain
    /// hidden ids naming columns that do not exist, and bad glob patterns.
    pub fn build(&self, records: Vec<Value>) -> Result<Table<Value>> {
        let columns = self.build_columns()?;
        let flat = flatten_columns(&columns);
        let known = |id: &str| flat.iter().any(|c| c.id() == id);

        let sort_keys = self.sort_keys()?;
        if let Some(key) = sort_keys.iter().find(|k| !known(k.id.as_str())) {
            return Err(TableError::UnknownColumn(key.id.clone()));
        }

        let hidden = HiddenColumns::new().hide_many(self.hidden.as_slice())?;
        if let Some(id) = hidden.ids.iter().find(|id| !known(id.as_str())) {
            return Err(TableError::UnknownColumn(id.clone()));
        }

        Table::builder(records)
            .plugin(HIDE_PLUGIN, hidden)
            .plugin(
                SORT_PLUGIN,
                SortBy::new()
                    .multi_sort(self.multi_sort)
                    .initial_keys(sort_keys),
            )
            .build(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{HiddenColumnsState, SortByState, SortOrder};
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"firstName": "b", "age": 30, "visits": 1}),
            json!({"firstName": "a", "age": 30, "visits": 2}),
            json!({"firstName": "c", "age": 20, "visits": 3}),
        ]
    }

    fn parse(text: &str) -> TableConfig {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_deserialize_nested_columns() {
        let config = parse(
            r#"{
                "columns": [
                    {"header": "Name", "footer": "names", "columns": [
                        {"header": "First", "accessor": "firstName"}
                    ]},
                    {"accessor": "age"}
                ]
            }"#,
        );

        assert!(matches!(config.columns[0], ColumnSpec::Group { .. }));
        assert_eq!(
            config.columns[1],
            ColumnSpec::Data {
                header: None,
                accessor: Some("age".into()),
                id: None,
                footer: None,
            }
        );
        assert!(config.multi_sort);
        assert!(config.sort.is_empty());

        let columns = config.build_columns().unwrap();
        let flat = flatten_columns(&columns);
        assert_eq!(flat[0].id(), "firstName");
        assert_eq!(flat[1].header(), "age");
    }

    #[test]
    fn test_missing_id_and_accessor() {
        let config = parse(r#"{"columns": [{"header": "Nothing"}]}"#);
        assert_eq!(
            config.build_columns().unwrap_err(),
            TableError::MissingColumnId
        );
    }

    #[test]
    fn test_build_applies_sort_and_hidden() {
        let table = TableConfig::infer(&records())
            .sort(["age", "firstName"])
            .hidden(["visits"])
            .build(records())
            .unwrap();

        let names: Vec<_> = table
            .rows()
            .get()
            .iter()
            .map(|r| r.value("firstName").unwrap().to_string())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(table.visible_columns().get().len(), 2);

        let sort = table
            .plugin_state::<SortByState<Value>>(SORT_PLUGIN)
            .unwrap();
        assert_eq!(sort.sort_keys.order_of("age"), Some(SortOrder::Asc));
        assert!(table
            .plugin_state::<HiddenColumnsState>(HIDE_PLUGIN)
            .unwrap()
            .is_hidden("visits"));
    }

    #[test]
    fn test_infer_keeps_key_order() {
        let config = TableConfig::infer(&records());
        let ids: Vec<_> = flatten_columns(&config.build_columns().unwrap())
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, ["firstName", "age", "visits"]);
    }

    #[test]
    fn test_infer_without_objects() {
        assert!(TableConfig::infer(&[json!(1), json!("x")]).columns.is_empty());
    }

    #[test]
    fn test_unknown_sort_column() {
        let err = TableConfig::infer(&records())
            .sort(["height"])
            .build(records())
            .unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("height".into()));
    }

    #[test]
    fn test_unknown_hidden_column() {
        let err = TableConfig::infer(&records())
            .hidden(["height"])
            .build(records())
            .unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("height".into()));
    }

    #[test]
    fn test_hidden_pattern_matching_nothing_is_allowed() {
        let table = TableConfig::infer(&records())
            .hidden(["zz*"])
            .build(records())
            .unwrap();
        assert_eq!(table.visible_columns().get().len(), 3);
    }

    #[test]
    fn test_unparsed_direction_is_part_of_the_id() {
        let err = TableConfig::infer(&records())
            .sort(["age:up"])
            .build(records())
            .unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("age:up".into()));
    }

    #[test]
    fn test_sort_by_id_containing_colon() {
        let records = vec![json!({"time:stamp": 2}), json!({"time:stamp": 1})];
        let table = TableConfig::infer(&records)
            .sort(["time:stamp"])
            .build(records)
            .unwrap();
        assert_eq!(table.rows().get()[0].id(), "1");
    }

    #[test]
    fn test_empty_sort_id_rejected() {
        let err = TableConfig::infer(&records())
            .sort([":desc"])
            .build(records())
            .unwrap_err();
        assert_eq!(err, TableError::InvalidSortKey(":desc".into()));
    }
}
