//! Member forwarding.
//!
//! A member the composite does not answer itself is resolved against the
//! association names: `<association>_<rest>` is routed to that association's
//! sub-entity as `rest`. When several association names prefix the member,
//! the longest one wins; among equally long names, the first declared.

use forma_core::Value;

use crate::composite::Composite;
use crate::definition::AssociationDefinition;
use crate::error::FormError;

/// Split `member` into `(association, rest)` for the best-matching association.
///
/// `rest` is never empty: `user_` alone resolves to nothing.
#[must_use]
pub fn resolve_member<'a, 'm>(definitions: &'a [AssociationDefinition], member: &'m str) -> Option<(&'a str, &'m str)> {
    definitions
        .iter()
        .filter_map(|definition| {
            member
                .strip_prefix(definition.name())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|rest| !rest.is_empty())
                .map(|rest| (definition.name(), rest))
        })
        .fold(None, |best: Option<(&str, &str)>, candidate| match best {
            Some(current) if current.0.len() >= candidate.0.len() => Some(current),
            _ => Some(candidate),
        })
}

impl Composite {
    /// Route `member` to the owning sub-entity and invoke it there.
    ///
    /// # Errors
    ///
    /// Returns `FormError::UnknownMember` if no association prefixes
    /// `member` or its sub-entity does not answer to the remainder.
    pub fn forward(&mut self, member: &str, args: &[Value]) -> Result<Value, FormError> {
        let receiver = self.kind.name().to_string();
        let Some((association, rest)) = resolve_member(self.kind.definitions(), member) else {
            return Err(FormError::unknown_member(&receiver, member));
        };
        let association = association.to_string();

        let entity = self
            .associations
            .get_mut(&association)
            .filter(|entity| entity.responds_to(rest))
            .ok_or_else(|| FormError::unknown_member(&receiver, member))?;

        tracing::debug!(composite = %receiver, association = %association, member = rest, "forwarding member");
        Ok(entity.invoke(rest, args)?)
    }

    /// Whether [`forward`](Self::forward) would find a receiver for `member`.
    #[must_use]
    pub fn supports_member(&self, member: &str) -> bool {
        self.owning_association(member)
            .and_then(|(association, rest)| Some((self.associations.get(association)?, rest)))
            .is_some_and(|(entity, rest)| entity.responds_to(rest))
    }

    pub(crate) fn owning_association<'m>(&self, member: &'m str) -> Option<(&str, &'m str)> {
        resolve_member(self.kind.definitions(), member)
    }
}
