//! Ancestor chains resolved from positional path parameters.
//!
//! Nested routes encode every level of the resource hierarchy as a numbered
//! placeholder: `/users/{0}/clients/{1}` yields a chain of two ids where index 0
//! is the owning user and index 1 the client itself. The resolver only turns the
//! placeholders into a dense, ordered chain. How long the chain must be is a
//! property of the resource type and operation and is checked by the caller.

use std::collections::BTreeMap;
use std::num::ParseIntError;

use thiserror::Error;
use uuid::Uuid;

use super::id::{Id, IdError};

#[derive(Debug, Error)]
pub enum AncestorError {
    #[error("unable to decode path")]
    Position {
        key: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unable to decode path")]
    Gap { expected: usize, found: usize },

    #[error("id not properly formatted")]
    Id {
        position: usize,
        #[source]
        source: IdError,
    },
}

impl AncestorError {
    /// Underlying parse detail, for diagnostic error bodies only.
    pub fn detail(&self) -> String {
        match self {
            AncestorError::Position { key, source } => format!("path key {key:?}: {source}"),
            AncestorError::Gap { expected, found } => {
                format!("expected path position {expected}, found {found}")
            }
            AncestorError::Id { position, source } => format!("path position {position}: {source}"),
        }
    }
}

/// Ordered identifiers locating a resource within its nesting hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain(Vec<Uuid>);

impl AncestorChain {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self(ids)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Uuid] {
        &self.0
    }

    /// Typed view of the id at `position`.
    pub fn get<T>(&self, position: usize) -> Option<Id<T>> {
        self.0.get(position).copied().map(Id::from_uuid)
    }
}

impl<T> FromIterator<Id<T>> for AncestorChain {
    fn from_iter<I: IntoIterator<Item = Id<T>>>(iter: I) -> Self {
        Self(iter.into_iter().map(Id::into_uuid).collect())
    }
}

/// Builds the chain from `(key, value)` path parameters in any order.
///
/// Keys must be the decimal positions `0..n` with no gaps; values must be
/// well-formed ids. Any failure rejects the whole chain.
pub fn resolve_ancestors<'a, I>(params: I) -> Result<AncestorChain, AncestorError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut positions = BTreeMap::new();

    for (key, value) in params {
        let position: usize = key.parse().map_err(|source| AncestorError::Position {
            key: key.to_string(),
            source,
        })?;
        let id = Id::<()>::parse(value)
            .map_err(|source| AncestorError::Id { position, source })?;
        positions.insert(position, id.into_uuid());
    }

    let mut chain = Vec::with_capacity(positions.len());
    for (expected, (found, id)) in positions.into_iter().enumerate() {
        if expected != found {
            return Err(AncestorError::Gap { expected, found });
        }
        chain.push(id);
    }

    Ok(AncestorChain(chain))
}
