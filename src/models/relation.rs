//! Typed links between work items.

use serde_json::Value;

use super::WorkItem;
use crate::error::{Result, TfsError};

/// Path segment that precedes the destination id in a work item URL.
const WORK_ITEM_MARKER: &str = "workItems/";

/// Built-in relation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    Parent,
    Child,
    Affects,
    AffectedBy,
    Related,
}

impl RelationType {
    /// Reference name of the link type as the server knows it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parent => "System.LinkTypes.Hierarchy-Reverse",
            Self::Child => "System.LinkTypes.Hierarchy-Forward",
            Self::Affects => "Microsoft.VSTS.Common.Affects-Forward",
            Self::AffectedBy => "Microsoft.VSTS.Common.Affects-Reverse",
            Self::Related => "System.LinkTypes.Related",
        }
    }

    /// Looks up a built-in relation type by its reference name.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Parent,
            Self::Child,
            Self::Affects,
            Self::AffectedBy,
            Self::Related,
        ]
        .into_iter()
        .find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A directed link from a work item to another resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    destination_id: Option<i32>,
    url: String,
    relation_name: String,
    attributes: Option<Value>,
}

impl Relation {
    /// Builds a relation as read from a work item payload.
    pub fn new(
        relation_name: impl Into<String>,
        url: impl Into<String>,
        attributes: Option<Value>,
    ) -> Self {
        let url = url.into();
        Self {
            destination_id: parse_destination_id(&url),
            url,
            relation_name: relation_name.into(),
            attributes,
        }
    }

    /// Builds a relation to `destination` before the server has echoed it back.
    pub fn create(relation_name: &str, destination: &WorkItem) -> Result<Self> {
        if relation_name.is_empty() {
            return Err(TfsError::validation("relation name can't be empty"));
        }

        Ok(Self {
            destination_id: Some(destination.id()),
            url: destination.url().to_string(),
            relation_name: relation_name.to_string(),
            attributes: None,
        })
    }

    /// Same as [`Relation::create`] for a built-in relation type.
    pub fn of_type(relation_type: RelationType, destination: &WorkItem) -> Self {
        Self {
            destination_id: Some(destination.id()),
            url: destination.url().to_string(),
            relation_name: relation_type.name().to_string(),
            attributes: None,
        }
    }

    /// Id of the destination work item, when the URL points at one.
    pub fn destination_id(&self) -> Option<i32> {
        self.destination_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Relation type reference name, e.g. `System.LinkTypes.Related`.
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Built-in relation type, if the name is one of them.
    pub fn relation_type(&self) -> Option<RelationType> {
        RelationType::from_name(&self.relation_name)
    }

    pub fn attributes(&self) -> Option<&Value> {
        self.attributes.as_ref()
    }

    /// Returns a copy carrying the given link attributes (e.g. a comment).
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Extracts the destination work item id from a relation URL.
///
/// The marker must start at byte offset 2 or later; a marker at offset 0 or 1
/// yields `None`, as does a non-numeric tail.
pub fn parse_destination_id(url: &str) -> Option<i32> {
    let start = url.find(WORK_ITEM_MARKER)?;
    if start <= 1 {
        return None;
    }
    url[start + WORK_ITEM_MARKER.len()..].parse().ok()
}
