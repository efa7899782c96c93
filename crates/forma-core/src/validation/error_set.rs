//! Field-keyed validation error set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key used for errors that belong to the record as a whole.
const BASE: &str = "base";

/// Validation failures keyed by field, in the order they were first reported.
///
/// Messages for a field accumulate; adding to an existing field appends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors(IndexMap<String, Vec<String>>);

impl Errors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message under `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Append several messages under `field`. Nothing is recorded for an empty list.
    pub fn extend_field<I>(&mut self, field: &str, messages: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut messages = messages.into_iter().peekable();
        if messages.peek().is_none() {
            return;
        }
        self.0.entry(field.to_string()).or_default().extend(messages);
    }

    /// Merge another error set, re-keying each field as `<prefix>_<field>`.
    pub fn merge_namespaced(&mut self, prefix: &str, other: &Self) {
        for (field, messages) in &other.0 {
            self.extend_field(&format!("{prefix}_{field}"), messages.iter().cloned());
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Messages prefixed with their humanized field name, e.g.
    /// `"Dummy user email can't be blank"`.
    #[must_use]
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |message| {
                    if field == BASE {
                        message.clone()
                    } else {
                        format!("{} {message}", humanize(field))
                    }
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Turn a field key into a readable label: `dummy_user_email` → `Dummy user email`.
/// A trailing `_id` is dropped.
#[must_use]
pub fn humanize(field: &str) -> String {
    let field = field.strip_suffix("_id").unwrap_or(field);
    let spaced = field.replace('_', " ");
    let mut chars = spaced.trim().chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
