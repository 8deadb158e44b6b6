//! Typed members, resources and transport-specific wire names
//!
//! A resource is a marker type whose [`Field`] enum lists its members. Each
//! member knows its wire name per [`Transport`]; members without a mapping
//! go over the wire under their own name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Remote protocol a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// SharePoint REST (`/_api`)
    #[default]
    Rest,
    /// Microsoft Graph (`/v1.0`)
    Graph,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Rest => write!(f, "rest"),
            Transport::Graph => write!(f, "graph"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" | "sharepoint" => Ok(Transport::Rest),
            "graph" => Ok(Transport::Graph),
            other => Err(format!("unknown transport '{}', expected 'rest' or 'graph'", other)),
        }
    }
}

/// Value shape of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    Guid,
    DateTime,
    /// Related resource or collection; loaded through `$expand`
    Navigation,
}

/// A typed member of a resource
pub trait Field: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Member name as the model spells it
    fn name(self) -> &'static str;

    fn kind(self) -> FieldKind;

    /// Wire name on the given transport, `None` when it equals [`Field::name`]
    fn wire_name(self, transport: Transport) -> Option<&'static str>;

    /// Every member of the resource
    fn all() -> &'static [Self];

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|field| field.name() == name)
    }

    fn is_navigation(self) -> bool {
        self.kind() == FieldKind::Navigation
    }
}

/// A resource type that can be queried through a collection
pub trait Resource: fmt::Debug + Clone + Send + Sync + 'static {
    type Field: Field;

    /// Member whose value identifies an instance
    fn key_field() -> Self::Field;

    /// Default collection path relative to the transport's api root
    fn resource_path(transport: Transport) -> Option<&'static str>;
}

/// Map a member name to its wire name
///
/// Names that match no member of `F`, such as keys read through the dynamic
/// value accessor, are returned unchanged.
pub fn map_member<'a, F: Field>(member: &'a str, transport: Transport) -> &'a str {
    F::from_name(member)
        .and_then(|field| field.wire_name(transport))
        .unwrap_or(member)
}

/// Resolve a wire name from a response row back to the member it came from
pub fn unmap_wire<F: Field>(wire: &str, transport: Transport) -> Option<F> {
    F::all()
        .iter()
        .copied()
        .find(|field| field.wire_name(transport).unwrap_or(field.name()) == wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::ListField;

    #[test]
    fn test_mapping_per_transport() {
        assert_eq!(map_member::<ListField>("Title", Transport::Graph), "displayName");
        assert_eq!(map_member::<ListField>("Title", Transport::Rest), "Title");
        assert_eq!(map_member::<ListField>("Id", Transport::Graph), "sharepointIds");
    }

    #[test]
    fn test_unmapped_member_keeps_name() {
        assert_eq!(map_member::<ListField>("AuthorID", Transport::Graph), "AuthorID");
        assert_eq!(map_member::<ListField>("SomethingElse", Transport::Rest), "SomethingElse");
    }

    #[test]
    fn test_unmap_wire() {
        assert_eq!(
            unmap_wire::<ListField>("displayName", Transport::Graph),
            Some(ListField::Title)
        );
        assert_eq!(unmap_wire::<ListField>("Title", Transport::Rest), Some(ListField::Title));
        assert_eq!(
            unmap_wire::<ListField>("AuthorID", Transport::Graph),
            Some(ListField::AuthorId)
        );
        assert_eq!(unmap_wire::<ListField>("odata.etag", Transport::Rest), None);
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!("Graph".parse::<Transport>(), Ok(Transport::Graph));
        assert_eq!("rest".parse::<Transport>(), Ok(Transport::Rest));
        assert!("soap".parse::<Transport>().is_err());
    }
}
