//! # JSON Path Engine
//!
//! A small dotted path dialect used to read, rewrite and redact parts of
//! request/response bodies and header maps.
//!
//! | token   | meaning                                             |
//! |---------|-----------------------------------------------------|
//! | `key`   | object member `key`                                 |
//! | `[N]`   | array index `N`                                     |
//! | `*key`  | member `key` of every object in the current array   |
//! | `*[N]`  | index `N` of every array in the current array       |
//!
//! Wildcards are only allowed in the final token. Every operation works on a
//! clone of its input and returns the new value.
//!
//! Traversal of the leading tokens is soft: a missing key, an out-of-range
//! index or the wrong container kind leaves the value unchanged. Passing
//! [`NoMatch::Raise`] turns those silent no-ops into [`PathError::NoMatch`].

mod path;

pub use path::{JsonPath, Step, Terminal};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path `{path}`: {reason}")]
    Syntax { path: String, reason: String },
    #[error("path `{path}` did not match anything")]
    NoMatch { path: String },
}

impl PathError {
    pub(crate) fn syntax(path: &str, reason: impl Into<String>) -> Self {
        PathError::Syntax {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// What to do when a path does not address anything in the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoMatch {
    #[default]
    Skip,
    Raise,
}

impl NoMatch {
    fn check(self, path: &JsonPath, touched: usize) -> Result<(), PathError> {
        if touched == 0 && self == NoMatch::Raise {
            return Err(PathError::NoMatch {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

/// Read the value addressed by `path`.
///
/// Wildcard terminals collect the addressed member of every element that has
/// it into a new array.
pub fn get(value: &Value, path: &str) -> Result<Option<Value>, PathError> {
    let path = JsonPath::parse(path)?;
    Ok(get_path(value, &path))
}

pub fn get_path(value: &Value, path: &JsonPath) -> Option<Value> {
    let container = descend(value, path.parents())?;
    match path.terminal() {
        Terminal::Key(key) => container.get(key.as_str()).cloned(),
        Terminal::Index(index) => container.get(*index).cloned(),
        Terminal::EachKey(key) => collect_each(container, |item| {
            item.as_object().and_then(|map| map.get(key.as_str()))
        }),
        Terminal::EachIndex(index) => collect_each(container, |item| {
            item.as_array().and_then(|items| items.get(*index))
        }),
    }
}

/// Return a copy of `value` with the location addressed by `path` set to
/// `new_value`.
///
/// A terminal object key is created when missing; intermediate keys never are.
pub fn update(
    value: &Value,
    path: &str,
    new_value: Value,
    no_match: NoMatch,
) -> Result<Value, PathError> {
    let path = JsonPath::parse(path)?;
    update_path(value, &path, new_value, no_match)
}

pub fn update_path(
    value: &Value,
    path: &JsonPath,
    new_value: Value,
    no_match: NoMatch,
) -> Result<Value, PathError> {
    let mut copy = value.clone();
    let touched = match descend_mut(&mut copy, path.parents()) {
        Some(container) => assign(container, path.terminal(), new_value),
        None => 0,
    };
    no_match.check(path, touched)?;
    Ok(copy)
}

/// Return a copy of `value` with the location addressed by `path` removed.
pub fn remove(value: &Value, path: &str, no_match: NoMatch) -> Result<Value, PathError> {
    let path = JsonPath::parse(path)?;
    remove_path(value, &path, no_match)
}

pub fn remove_path(value: &Value, path: &JsonPath, no_match: NoMatch) -> Result<Value, PathError> {
    let mut copy = value.clone();
    let touched = match descend_mut(&mut copy, path.parents()) {
        Some(container) => delete(container, path.terminal()),
        None => 0,
    };
    no_match.check(path, touched)?;
    Ok(copy)
}

fn descend<'a>(value: &'a Value, steps: &[Step]) -> Option<&'a Value> {
    steps.iter().try_fold(value, |current, step| match step {
        Step::Key(key) => current.get(key.as_str()),
        Step::Index(index) => current.get(*index),
    })
}

fn descend_mut<'a>(value: &'a mut Value, steps: &[Step]) -> Option<&'a mut Value> {
    let mut current = value;
    for step in steps {
        current = match step {
            Step::Key(key) => current.get_mut(key.as_str())?,
            Step::Index(index) => current.get_mut(*index)?,
        };
    }
    Some(current)
}

fn collect_each<'a, F>(container: &'a Value, pick: F) -> Option<Value>
where
    F: Fn(&'a Value) -> Option<&'a Value>,
{
    let hits: Vec<Value> = container
        .as_array()?
        .iter()
        .filter_map(pick)
        .cloned()
        .collect();
    if hits.is_empty() { None } else { Some(Value::Array(hits)) }
}

/// Returns the number of locations that were written.
fn assign(container: &mut Value, terminal: &Terminal, new_value: Value) -> usize {
    match terminal {
        Terminal::Key(key) => match container.as_object_mut() {
            Some(map) => {
                map.insert(key.clone(), new_value);
                1
            }
            None => 0,
        },
        Terminal::Index(index) => match container.as_array_mut().and_then(|items| items.get_mut(*index)) {
            Some(slot) => {
                *slot = new_value;
                1
            }
            None => 0,
        },
        Terminal::EachKey(key) => container.as_array_mut().map_or(0, |items| {
            items
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .map(|map| map.insert(key.clone(), new_value.clone()))
                .count()
        }),
        Terminal::EachIndex(index) => container.as_array_mut().map_or(0, |items| {
            items
                .iter_mut()
                .filter_map(|item| item.as_array_mut().and_then(|inner| inner.get_mut(*index)))
                .map(|slot| *slot = new_value.clone())
                .count()
        }),
    }
}

/// Returns the number of locations that were removed.
fn delete(container: &mut Value, terminal: &Terminal) -> usize {
    match terminal {
        Terminal::Key(key) => container
            .as_object_mut()
            .and_then(|map| map.shift_remove(key.as_str()))
            .map_or(0, |_| 1),
        Terminal::Index(index) => match container.as_array_mut() {
            Some(items) if *index < items.len() => {
                items.remove(*index);
                1
            }
            _ => 0,
        },
        Terminal::EachKey(key) => container.as_array_mut().map_or(0, |items| {
            items
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .filter_map(|map| map.shift_remove(key.as_str()))
                .count()
        }),
        Terminal::EachIndex(index) => container.as_array_mut().map_or(0, |items| {
            items
                .iter_mut()
                .filter_map(Value::as_array_mut)
                .filter(|inner| *index < inner.len())
                .map(|inner| inner.remove(*index))
                .count()
        }),
    }
}
