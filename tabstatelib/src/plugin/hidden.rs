//! Hidden-columns plugin.
//!
//! Removes columns from the visible set when their id is in an observable
//! hidden-id list, or matches one of the glob patterns given at configuration
//! time. Rows and header rows follow automatically.

use std::fmt;

use glob::Pattern;

use crate::error::TableError;
use crate::plugin::{Columns, ColumnsTransform, Plugin, PluginContext, PluginInstance};
use crate::reactive::{Dependency, SubscriptionId, Writable};
use crate::Result;

/// Hidden-columns plugin configuration.
#[derive(Debug, Clone, Default)]
pub struct HiddenColumns {
    /// Column ids hidden initially
    pub ids: Vec<String>,
    /// Column id patterns that are always hidden
    pub patterns: Vec<Pattern>,
}

impl HiddenColumns {
    /// Nothing hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: hide `id` initially
    pub fn hide(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    /// Builder: always hide ids matching a glob pattern.
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        let pat = Pattern::new(pattern).map_err(|e| TableError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.patterns.push(pat);
        Ok(self)
    }

    /// Builder: hide each entry, treating entries with glob metacharacters as
    /// patterns and the rest as plain ids.
    pub fn hide_many<S: AsRef<str>>(mut self, entries: &[S]) -> Result<Self> {
        for entry in entries {
            let entry = entry.as_ref();
            if entry.contains(['*', '?', '[']) {
                self = self.pattern(entry)?;
            } else {
                self = self.hide(entry);
            }
        }
        Ok(self)
    }
}

/// State exposed by the hidden-columns plugin.
#[derive(Clone)]
pub struct HiddenColumnsState {
    /// Ids hidden explicitly; drive this to show or hide columns
    pub hidden_column_ids: Writable<Vec<String>>,
    patterns: Vec<Pattern>,
}

impl HiddenColumnsState {
    /// Hide a column. No-op if already hidden.
    pub fn hide(&self, id: &str) {
        if !self.hidden_column_ids.with(|ids| ids.iter().any(|i| i == id)) {
            self.hidden_column_ids.update(|ids| ids.push(id.to_string()));
        }
    }

    /// Show a column hidden by id. Pattern matches stay hidden.
    pub fn show(&self, id: &str) {
        if self.hidden_column_ids.with(|ids| ids.iter().any(|i| i == id)) {
            self.hidden_column_ids.update(|ids| ids.retain(|i| i != id));
        }
    }

    /// Flip a column between hidden and shown.
    pub fn toggle(&self, id: &str) {
        if self.hidden_column_ids.with(|ids| ids.iter().any(|i| i == id)) {
            self.show(id);
        } else {
            self.hide(id);
        }
    }

    /// Whether `id` is currently hidden, by id or by pattern
    pub fn is_hidden(&self, id: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(id))
            || self.hidden_column_ids.with(|ids| ids.iter().any(|i| i == id))
    }

    /// Call `f` after the hidden ids change
    pub fn subscribe(&self, f: impl Fn() + 'static) -> SubscriptionId {
        self.hidden_column_ids.subscribe(f)
    }

    /// Dependency handle for the hidden ids
    pub fn dependency(&self) -> Dependency {
        self.hidden_column_ids.dependency()
    }
}

impl fmt::Debug for HiddenColumnsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiddenColumnsState")
            .field("hidden_column_ids", &self.hidden_column_ids.get())
            .field(
                "patterns",
                &self.patterns.iter().map(Pattern::as_str).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<R: 'static> Plugin<R> for HiddenColumns {
    fn init(self: Box<Self>, _cx: &PluginContext<R>) -> PluginInstance<R> {
        let state = HiddenColumnsState {
            hidden_column_ids: Writable::new(self.ids),
            patterns: self.patterns,
        };

        let transform = {
            let hidden = state.clone();
            ColumnsTransform::new(move |columns: Columns<R>| {
                columns
                    .into_iter()
                    .filter(|c| !hidden.is_hidden(c.id()))
                    .collect()
            })
            .depends_on(state.dependency())
        };

        PluginInstance::new(state).columns_transform(transform)
    }
}
