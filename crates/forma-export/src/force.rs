//! Caller overrides for which rules are exported.
//!
//! `false` anywhere turns rules off. `true` is needed to include conditional
//! (`if` / `unless`) rules at all; they are then still subject to their
//! predicate. Parsed from JSON as `true`, `false`, `null`, or a map of field
//! to `true` / `false` / `{ "<kind>": bool }`.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Force {
    /// No overrides: unconditional rules only.
    #[default]
    Unset,
    /// `false` exports nothing; `true` admits every conditional rule.
    All(bool),
    /// Per-field overrides. Fields not listed behave as `Unset`.
    Fields(IndexMap<String, FieldForce>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldForce {
    All(bool),
    /// Per validator kind (`presence`, `length`, ...).
    Kinds(IndexMap<String, bool>),
}

impl From<bool> for FieldForce {
    fn from(force: bool) -> Self {
        Self::All(force)
    }
}

impl Force {
    /// Add a per-field override, switching to `Fields` if needed.
    #[must_use]
    pub fn field(self, name: impl Into<String>, force: impl Into<FieldForce>) -> Self {
        let mut fields = match self {
            Self::Fields(fields) => fields,
            Self::Unset | Self::All(_) => IndexMap::new(),
        };
        fields.insert(name.into(), force.into());
        Self::Fields(fields)
    }

    /// Whether rules of `kind` on `attribute` are switched off.
    #[must_use]
    pub fn turned_off(&self, attribute: &str, kind: &str) -> bool {
        match self {
            Self::Unset | Self::All(true) => false,
            Self::All(false) => true,
            Self::Fields(fields) => match fields.get(attribute) {
                Some(FieldForce::All(force)) => !force,
                Some(FieldForce::Kinds(kinds)) => kinds.get(kind) == Some(&false),
                None => false,
            },
        }
    }

    /// Whether conditional rules of `kind` on `attribute` may be exported.
    #[must_use]
    pub fn can_force(&self, attribute: &str, kind: &str) -> bool {
        match self {
            Self::Unset => false,
            Self::All(force) => *force,
            Self::Fields(fields) => match fields.get(attribute) {
                Some(FieldForce::All(force)) => *force,
                Some(FieldForce::Kinds(kinds)) => kinds.get(kind) == Some(&true),
                None => false,
            },
        }
    }

    /// The overrides that apply inside one association: only fields starting
    /// with `prefix`, with the prefix stripped. Global settings pass through.
    #[must_use]
    pub fn scoped(&self, prefix: &str) -> Self {
        match self {
            Self::Fields(fields) => Self::Fields(
                fields
                    .iter()
                    .filter_map(|(field, force)| {
                        field
                            .strip_prefix(prefix)
                            .map(|rest| (rest.to_string(), force.clone()))
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
