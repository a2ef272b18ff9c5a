//! Host-platform extension points.
//!
//! A registry mapping an extension-point name to an ordered list of
//! callbacks. Filters are read-modify-return functions over a JSON value;
//! actions emit markup that the host writes verbatim at that point of the
//! page. Lower priorities run first and equal priorities keep registration
//! order, so a late priority textually follows everything registered before it.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Priority used by hosts when none is given
pub const DEFAULT_PRIORITY: i32 = 10;

pub type FilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type ActionFn = Arc<dyn Fn() -> String + Send + Sync>;

struct Entry<F> {
    priority: i32,
    callback: F,
}

fn insert_ordered<F>(list: &mut Vec<Entry<F>>, priority: i32, callback: F) {
    let pos = list.partition_point(|e| e.priority <= priority);
    list.insert(pos, Entry { priority, callback });
}

/// Named filters and actions, invoked in priority order
#[derive(Default)]
pub struct HookRegistry {
    filters: HashMap<String, Vec<Entry<FilterFn>>>,
    actions: HashMap<String, Vec<Entry<ActionFn>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter on `name`
    pub fn add_filter<F>(&mut self, name: &str, priority: i32, callback: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let list = self.filters.entry(name.to_string()).or_default();
        insert_ordered(list, priority, Arc::new(callback) as FilterFn);
    }

    /// Run `value` through every filter registered on `name`
    pub fn apply_filters(&self, name: &str, value: Value) -> Value {
        match self.filters.get(name) {
            Some(list) => list.iter().fold(value, |v, e| (e.callback)(v)),
            None => value,
        }
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.get(name).is_some_and(|l| !l.is_empty())
    }

    /// Register an action on `name`
    pub fn add_action<F>(&mut self, name: &str, priority: i32, callback: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let list = self.actions.entry(name.to_string()).or_default();
        insert_ordered(list, priority, Arc::new(callback) as ActionFn);
    }

    /// Run every action on `name`, concatenating their markup
    pub fn do_action(&self, name: &str) -> String {
        match self.actions.get(name) {
            Some(list) => list.iter().map(|e| (e.callback)()).collect(),
            None => String::new(),
        }
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.get(name).is_some_and(|l| !l.is_empty())
    }

    /// Priorities registered on action `name`, in invocation order
    pub fn action_priorities(&self, name: &str) -> Vec<i32> {
        self.actions
            .get(name)
            .map(|l| l.iter().map(|e| e.priority).collect())
            .unwrap_or_default()
    }
}
